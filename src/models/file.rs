use serde::{Deserialize, Serialize};

/// A file submitted with a parsing job. Immutable; provided by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Storage path understood by the `FileStore` boundary.
    pub path: String,
    /// Declared MIME type (may be wrong — extension is cross-checked).
    pub mime_type: String,
    /// Human-readable name for progress messages and warnings.
    pub display_name: String,
}

impl UploadedFile {
    pub fn new(path: &str, mime_type: &str, display_name: &str) -> Self {
        Self {
            path: path.to_string(),
            mime_type: mime_type.to_string(),
            display_name: display_name.to_string(),
        }
    }

    /// Coarse format family used to pick a decoder.
    ///
    /// The declared MIME type is consulted first; when it is generic
    /// (`application/octet-stream`, empty) the extension decides via
    /// `mime_guess`.
    pub fn family(&self) -> FileFamily {
        if let Some(family) = family_from_mime(&self.mime_type) {
            return family;
        }

        let guessed = mime_guess::from_path(&self.path).first_raw().unwrap_or("");
        family_from_mime(guessed).unwrap_or(FileFamily::Unknown)
    }
}

/// Decoder families. No semantic knowledge — purely "how do we read this".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFamily {
    Pdf,
    Spreadsheet,
    Image,
    PlainText,
    Unknown,
}

impl FileFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Spreadsheet => "spreadsheet",
            Self::Image => "image",
            Self::PlainText => "plain_text",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn family_from_mime(mime: &str) -> Option<FileFamily> {
    let mime = mime.trim().to_ascii_lowercase();
    if mime.is_empty() || mime == "application/octet-stream" {
        return None;
    }

    if mime == "application/pdf" {
        return Some(FileFamily::Pdf);
    }
    if mime.starts_with("image/") {
        return Some(FileFamily::Image);
    }
    if mime == "text/csv"
        || mime == "text/tab-separated-values"
        || mime == "application/vnd.ms-excel"
        || mime == "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        || mime == "application/vnd.oasis.opendocument.spreadsheet"
    {
        return Some(FileFamily::Spreadsheet);
    }
    if mime.starts_with("text/") {
        return Some(FileFamily::PlainText);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_family_from_mime() {
        let file = UploadedFile::new("docs/statement", "application/pdf", "statement");
        assert_eq!(file.family(), FileFamily::Pdf);
    }

    #[test]
    fn spreadsheet_family_from_extension_when_mime_generic() {
        let file = UploadedFile::new(
            "uploads/pricing.xlsx",
            "application/octet-stream",
            "pricing.xlsx",
        );
        assert_eq!(file.family(), FileFamily::Spreadsheet);
    }

    #[test]
    fn csv_is_spreadsheet() {
        let file = UploadedFile::new("u/rates.csv", "text/csv", "rates.csv");
        assert_eq!(file.family(), FileFamily::Spreadsheet);
    }

    #[test]
    fn image_family() {
        let file = UploadedFile::new("u/scan.png", "image/png", "scan.png");
        assert_eq!(file.family(), FileFamily::Image);
    }

    #[test]
    fn plain_text_family() {
        let file = UploadedFile::new("u/statement.txt", "text/plain", "statement.txt");
        assert_eq!(file.family(), FileFamily::PlainText);
    }

    #[test]
    fn unknown_when_nothing_matches() {
        let file = UploadedFile::new("u/blob.bin", "", "blob.bin");
        assert_eq!(file.family(), FileFamily::Unknown);
    }

    #[test]
    fn declared_mime_beats_extension() {
        // Caller says PDF even though the extension claims CSV.
        let file = UploadedFile::new("u/export.csv", "application/pdf", "export.csv");
        assert_eq!(file.family(), FileFamily::Pdf);
    }
}
