//! Streaming answers to follow-up questions once the card summary is done.

pub mod accumulator;
pub mod engine;
pub mod guard;
pub mod prompt;

pub use accumulator::*;
pub use engine::*;
pub use guard::*;
pub use prompt::*;

use thiserror::Error;

use crate::pipeline::backend::BackendError;

/// Any reason a follow-up answer did not finish cleanly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FollowUpError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Stream aborted: {0}")]
    Aborted(#[from] StreamAbort),

    #[error("Stream completed without content")]
    Empty,
}
