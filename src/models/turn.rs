use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::Card;
use super::enums::TurnRole;

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub role: TurnRole,
    pub content: String,
    /// File name of the document submitted with this turn.
    pub attachment: Option<String>,
    /// Card revealed by this turn, if it is a card turn.
    pub card: Option<Card>,
    /// True while a follow-up answer is still streaming into this turn.
    pub streaming: bool,
    /// Locally generated failure notice. Never sent back to the backend.
    pub error: bool,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: TurnRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            attachment: None,
            card: None,
            streaming: false,
            error: false,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>, attachment: Option<String>) -> Self {
        Self {
            attachment,
            ..Self::new(TurnRole::User, content.into())
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content.into())
    }

    /// Assistant turn revealing one card. The card body doubles as the content.
    pub fn card(card: Card) -> Self {
        Self {
            card: Some(card.clone()),
            ..Self::new(TurnRole::Assistant, card.body)
        }
    }

    /// Empty assistant turn that a follow-up stream will fill.
    pub fn in_progress() -> Self {
        Self {
            streaming: true,
            ..Self::new(TurnRole::Assistant, String::new())
        }
    }

    pub fn error_notice(message: impl Into<String>) -> Self {
        Self {
            error: true,
            ..Self::new(TurnRole::Assistant, message.into())
        }
    }

    pub fn carries_card(&self) -> bool {
        self.card.is_some()
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}
