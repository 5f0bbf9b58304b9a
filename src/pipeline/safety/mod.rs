//! Safety checks around generation: distress detection on user input and
//! groundedness of structured summaries against their source document.

pub mod distress;
pub mod grounding;

pub use distress::*;
pub use grounding::*;
