//! Structured card generation: one JSON call, schema mapping, grounding check.

pub mod orchestrator;
pub mod parser;
pub mod prompt;

pub use orchestrator::*;
pub use parser::*;
pub use prompt::*;
