//! Reasoning/extraction capability boundary.
//!
//! The pipeline treats the model behind this trait as a black box returning
//! text that should contain JSON. Unavailability is a fatal configuration
//! error for the job; malformed output is handled downstream and is not.

pub mod http;

pub use http::HttpCapability;

use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapabilityError {
    /// Capability unreachable or unauthenticated. Fatal for the whole job —
    /// not retryable, no partial result.
    #[error("extraction capability unavailable: {0}")]
    Unavailable(String),

    /// Transient transport problem (timeout, connection reset). Retryable.
    #[error("capability transport error: {0}")]
    Transport(String),

    /// Capability answered with a non-success status. Retryable for server
    /// errors; auth failures are mapped to `Unavailable` before this point.
    #[error("capability returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("capability response decode error: {0}")]
    ResponseDecode(String),
}

impl CapabilityError {
    /// Configuration errors abort the job; everything else may be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// One piece of a multi-modal prompt.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    /// Raw document bytes (a PDF or a single extracted page).
    Document { media_type: String, bytes: Vec<u8> },
    /// Raw image bytes (scans, photos of statements).
    Image { media_type: String, bytes: Vec<u8> },
}

impl PromptPart {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self::Document {
            media_type: "application/pdf".to_string(),
            bytes,
        }
    }
}

/// The reasoning capability used by classification, structured extraction
/// and chunked parsing. Injected at construction — no hidden global client.
pub trait ExtractionCapability: Send + Sync {
    fn generate(&self, model: &str, parts: &[PromptPart]) -> Result<String, CapabilityError>;
}

/// Mock capability for tests — always returns the configured response.
pub struct MockCapability {
    response: String,
}

impl MockCapability {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl ExtractionCapability for MockCapability {
    fn generate(&self, _model: &str, _parts: &[PromptPart]) -> Result<String, CapabilityError> {
        Ok(self.response.clone())
    }
}

/// Scripted capability — pops one canned result per call, in order.
/// Once the script runs dry it repeats the final entry.
pub struct ScriptedCapability {
    script: Mutex<VecDeque<Result<String, CapabilityError>>>,
    last: Mutex<Option<Result<String, CapabilityError>>>,
}

impl ScriptedCapability {
    pub fn new(script: Vec<Result<String, CapabilityError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
        }
    }
}

impl ExtractionCapability for ScriptedCapability {
    fn generate(&self, _model: &str, _parts: &[PromptPart]) -> Result<String, CapabilityError> {
        let mut script = self.script.lock().expect("script lock poisoned");
        if let Some(next) = script.pop_front() {
            *self.last.lock().expect("last lock poisoned") = Some(clone_result(&next));
            return next;
        }
        let last = self.last.lock().expect("last lock poisoned");
        match &*last {
            Some(result) => clone_result(result),
            None => Ok(String::new()),
        }
    }
}

fn clone_result(r: &Result<String, CapabilityError>) -> Result<String, CapabilityError> {
    match r {
        Ok(s) => Ok(s.clone()),
        Err(CapabilityError::Unavailable(m)) => Err(CapabilityError::Unavailable(m.clone())),
        Err(CapabilityError::Transport(m)) => Err(CapabilityError::Transport(m.clone())),
        Err(CapabilityError::BadStatus { status, body }) => Err(CapabilityError::BadStatus {
            status: *status,
            body: body.clone(),
        }),
        Err(CapabilityError::ResponseDecode(m)) => Err(CapabilityError::ResponseDecode(m.clone())),
    }
}
