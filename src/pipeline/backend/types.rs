use serde::{Deserialize, Serialize};

use super::BackendError;
use crate::models::{Turn, TurnRole};

/// Role of a message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl From<TurnRole> for ChatRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Self::User,
            TurnRole::Assistant => Self::Assistant,
        }
    }
}

/// A role/content pair as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    /// Strip transcript turns down to role/content pairs.
    ///
    /// Error notices and turns still streaming are local state, not conversation.
    pub fn history(turns: &[Turn]) -> Vec<ChatMessage> {
        turns
            .iter()
            .filter(|t| !t.error && !t.streaming)
            .map(|t| ChatMessage {
                role: t.role.into(),
                content: t.content.clone(),
            })
            .collect()
    }
}

/// Which of the two generation protocols a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Structured,
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub messages: Vec<ChatMessage>,
    pub mode: GenerationMode,
}

/// Ordered, lazily read text fragments. The iterator ends on completion;
/// an `Err` item is the terminal read failure.
pub type FragmentStream<'a> = Box<dyn Iterator<Item = Result<String, BackendError>> + 'a>;

/// The two transport shapes a backend can answer with.
pub enum BackendReply<'a> {
    Complete(String),
    Fragments(FragmentStream<'a>),
}

impl<'a> BackendReply<'a> {
    /// Collapse either shape into one text block. The first fragment error wins.
    pub fn into_text(self) -> Result<String, BackendError> {
        match self {
            Self::Complete(text) => Ok(text),
            Self::Fragments(fragments) => fragments.collect(),
        }
    }

    /// View either shape as a fragment sequence.
    pub fn into_fragments(self) -> FragmentStream<'a> {
        match self {
            Self::Complete(text) => Box::new(std::iter::once(Ok(text))),
            Self::Fragments(fragments) => fragments,
        }
    }
}

impl std::fmt::Debug for BackendReply<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(text) => f.debug_tuple("Complete").field(&text.len()).finish(),
            Self::Fragments(_) => f.write_str("Fragments(..)"),
        }
    }
}
