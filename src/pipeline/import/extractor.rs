use super::email::parse_email;
use super::format::{detect_format, sanitize_filename, DocumentFormat};
use super::IngestionError;

const DEFAULT_MAX_UPLOAD_MB: u64 = 20;

/// A file handed over with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Display name, already stripped of any path.
    pub name: String,
    /// Type declared by whoever uploaded it, if any.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: &str, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: sanitize_filename(name),
            mime_type: mime_type.map(str::to_string),
            bytes,
        }
    }
}

/// File blob → plain document text.
///
/// PDF and image extraction live outside this crate; plug them in by
/// implementing this trait.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, file: &UploadedFile) -> Result<String, IngestionError>;
}

/// Built-in extractor for plain text and `.eml` files.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    max_upload_mb: u64,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self {
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl TextExtractor {
    pub fn with_max_upload_mb(max_upload_mb: u64) -> Self {
        Self { max_upload_mb }
    }
}

impl DocumentExtractor for TextExtractor {
    fn extract(&self, file: &UploadedFile) -> Result<String, IngestionError> {
        let size = file.bytes.len() as u64;
        if size > self.max_upload_mb * 1024 * 1024 {
            return Err(IngestionError::FileTooLarge {
                size_bytes: size,
                max_mb: self.max_upload_mb,
            });
        }
        if file.bytes.is_empty() {
            return Err(IngestionError::Empty);
        }

        let detection = detect_format(&file.name, file.mime_type.as_deref(), &file.bytes);
        tracing::debug!(
            format = detection.format.as_str(),
            size_bytes = size,
            "Extracting uploaded document"
        );

        let text = match detection.format {
            DocumentFormat::PlainText => {
                let text = String::from_utf8_lossy(&file.bytes);
                text.trim_start_matches('\u{feff}').trim().to_string()
            }
            DocumentFormat::Email => parse_email(&file.bytes)?.to_document_text(),
            DocumentFormat::Pdf | DocumentFormat::Image | DocumentFormat::Unsupported => {
                return Err(IngestionError::UnsupportedFormat(detection.mime_type));
            }
        };

        if text.trim().is_empty() {
            return Err(IngestionError::Empty);
        }
        Ok(text)
    }
}
