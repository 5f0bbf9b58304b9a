use super::parser::{parse_cards_response, GeneratedCards};
use super::prompt::CARDS_SYSTEM_PROMPT;
use crate::models::{Card, CardSet, Turn};
use crate::pipeline::backend::{
    BackendError, ChatMessage, GenerationBackend, GenerationMode, GenerationRequest,
};
use crate::pipeline::safety::{check_card_grounding, ValidationOutcome};

/// Result of one card generation round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    /// Parsed and grounded in the document.
    Accepted(CardSet),
    /// Unparseable answer wrapped in one card. Never validated.
    Degraded(Card),
    /// Parsed, but shares no key term with the document.
    Rejected { reason: String },
}

/// Runs the cards pipeline: structured call → parse → grounding check.
pub struct CardGenerator<'a, B: GenerationBackend + ?Sized> {
    backend: &'a B,
    max_key_terms: usize,
}

impl<'a, B: GenerationBackend + ?Sized> CardGenerator<'a, B> {
    pub fn new(backend: &'a B, max_key_terms: usize) -> Self {
        Self {
            backend,
            max_key_terms,
        }
    }

    pub fn build_request(history: &[Turn]) -> GenerationRequest {
        GenerationRequest {
            system_instruction: CARDS_SYSTEM_PROMPT.to_string(),
            messages: ChatMessage::history(history),
            mode: GenerationMode::Structured,
        }
    }

    /// Generate cards for `document`, which must be the content of the last user turn in `history`.
    ///
    /// Only backend failures are errors; bad JSON degrades and ungrounded output is rejected in-band.
    pub fn generate(&self, history: &[Turn], document: &str) -> Result<CardOutcome, BackendError> {
        let request = Self::build_request(history);
        let response = self.backend.invoke(&request)?.into_text()?;
        tracing::debug!(response_len = response.len(), "Structured answer received");

        match parse_cards_response(&response) {
            GeneratedCards::Degraded(card) => Ok(CardOutcome::Degraded(card)),
            GeneratedCards::Structured(set) => {
                match check_card_grounding(document, &set, self.max_key_terms) {
                    ValidationOutcome::Accepted => Ok(CardOutcome::Accepted(set)),
                    ValidationOutcome::Rejected { reason } => Ok(CardOutcome::Rejected { reason }),
                }
            }
        }
    }
}
