use crate::models::{ConversationMode, Turn};

/// Decide how the next submission is answered.
///
/// Cards mode is only available until the first card lands in the transcript;
/// after that every submission, with or without an attachment, streams.
/// Failed or rejected card rounds leave no card behind, so they do not count.
pub fn select_mode(turns: &[Turn]) -> ConversationMode {
    if turns.iter().any(Turn::carries_card) {
        ConversationMode::Stream
    } else {
        ConversationMode::Cards
    }
}
