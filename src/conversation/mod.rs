//! Conversation orchestration: transcript state, mode selection, progressive
//! reveal, and the session that drives both generation protocols.

pub mod events;
pub mod gate;
pub mod mode;
pub mod reveal;
pub mod session;
pub mod state;


pub use events::*;
pub use gate::*;
pub use mode::*;
pub use reveal::*;
pub use session::*;
pub use state::*;

use thiserror::Error;

/// Shown whenever generation or streaming fails for reasons outside the person's control.
pub const GENERIC_APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// Why a requested transition was refused. Refused transitions change nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("{0} is already in progress")]
    Busy(OperationKind),

    #[error("Nothing to submit")]
    EmptySubmission,

    #[error("The appointment summary is available once a summary has been fully revealed")]
    SummaryUnavailable,
}
