//! File storage boundary.
//!
//! The pipeline never touches the filesystem directly: it asks a `FileStore`
//! for content and size. Size is consulted before download to decide between
//! direct and chunked processing.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only storage the job orchestrator pulls uploads from.
pub trait FileStore: Send + Sync {
    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    fn size(&self, path: &str) -> Result<u64, StorageError>;
}

/// Filesystem-backed store rooted at a directory.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl FileStore for LocalFileStore {
    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path);
        if !full.exists() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        std::fs::read(&full).map_err(|source| StorageError::Io {
            path: path.to_string(),
            source,
        })
    }

    fn size(&self, path: &str) -> Result<u64, StorageError> {
        let full = self.resolve(path);
        let meta = std::fs::metadata(&full).map_err(|_| StorageError::NotFound(path.to_string()))?;
        Ok(meta.len())
    }
}

/// In-memory store for tests and small embedded deployments.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, bytes: Vec<u8>) {
        self.files
            .lock()
            .expect("file map lock poisoned")
            .insert(path.to_string(), bytes);
    }
}

impl FileStore for MemoryFileStore {
    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.files
            .lock()
            .expect("file map lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn size(&self, path: &str) -> Result<u64, StorageError> {
        self.files
            .lock()
            .expect("file map lock poisoned")
            .get(path)
            .map(|b| b.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}
