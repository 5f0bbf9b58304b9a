//! Turning uploaded files into document text.

pub mod email;
pub mod extractor;
pub mod format;

pub use email::*;
pub use extractor::*;
pub use format::*;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum IngestionError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {size_bytes} bytes exceeds {max_mb}MB limit")]
    FileTooLarge { size_bytes: u64, max_mb: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Could not extract text: {0}")]
    Extraction(String),
}
