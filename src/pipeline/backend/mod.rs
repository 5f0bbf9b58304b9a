//! Generation backend contract and its implementations.
//!
//! One request shape serves both protocols: a structured call answers with a
//! complete text block, a streaming call with a lazy fragment sequence.
//! Callers must accept either shape, since a backend may ignore the hint.

pub mod types;
pub mod ollama;
pub mod mock;

pub use types::*;
pub use ollama::*;
pub use mock::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend is not reachable at {0}")]
    Connection(String),

    #[error("Backend returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Stream read failed: {0}")]
    StreamRead(String),
}

/// Anything that can answer a generation request.
pub trait GenerationBackend {
    fn invoke(&self, request: &GenerationRequest) -> Result<BackendReply<'_>, BackendError>;
}

