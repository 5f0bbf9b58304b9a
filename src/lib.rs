pub mod appointment; // Appointment summary
pub mod config;
pub mod conversation; // Transcript, reveal, session
pub mod models;
pub mod pipeline; // Backend, cards, follow-up, import, safety

pub use conversation::{ConversationError, OperationOutcome, Session, TurnDelta};
pub use pipeline::backend::{GenerationBackend, OllamaBackend};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
