//! One conversation: transcript snapshot, request gate, and the three
//! user-facing operations.
//!
//! Every operation takes the gate first, so at most one backend call is ever
//! outstanding for the transcript. State changes are applied as whole-snapshot
//! replacements; readers see either the old or the new transcript, never a
//! half-applied one. Failures never escape as errors: they become an error
//! turn plus an `OperationOutcome`. Only refused transitions return
//! `ConversationError`.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use uuid::Uuid;

use super::events::{ConversationEvent, EventSink, NoopSink};
use super::gate::{OperationKind, RequestGate};
use super::state::ConversationState;
use super::{ConversationError, GENERIC_APOLOGY};
use crate::appointment::AppointmentSummary;
use crate::config::SessionConfig;
use crate::models::{ConversationMode, Turn};
use crate::pipeline::backend::{BackendError, GenerationBackend};
use crate::pipeline::cards::{CardGenerator, CardOutcome};
use crate::pipeline::followup::{FollowUpEngine, FollowUpError, StreamAccumulator, StreamGuard};
use crate::pipeline::import::{DocumentExtractor, IngestionError, TextExtractor, UploadedFile};

/// How an accepted operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OperationOutcome {
    /// A validated card set arrived; its first card is shown.
    CardsRevealed { pending: usize },
    /// The structured answer was unusable and is shown as one generic card.
    Degraded,
    /// The card set did not match the document and was discarded.
    ValidationFailed,
    /// The backend call failed.
    GenerationFailed,
    /// A follow-up answer streamed to completion.
    Answered { distressed: bool },
    /// A follow-up stream broke off; its partial content was discarded.
    StreamInterrupted,
    /// "Continue" showed the next card.
    CardRevealed { pending: usize, completed: bool },
    /// "Continue" with no card pending.
    NothingToReveal,
    SummaryShown { summary: AppointmentSummary },
}

/// What an operation changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnDelta {
    /// Turns added by the operation, in their final form.
    pub turns: Vec<Turn>,
    pub outcome: OperationOutcome,
    /// Set when an attached file could not be read and a placeholder was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_error: Option<IngestionError>,
}

/// A submission as it enters the transcript.
struct Submission {
    /// Visible user turn content, including attachment markers.
    content: String,
    /// What the person actually supplied: typed text and extracted file text, no markers.
    source_text: String,
    ingestion_error: Option<IngestionError>,
}

pub struct Session<B: GenerationBackend> {
    backend: B,
    extractor: Box<dyn DocumentExtractor>,
    sink: Arc<dyn EventSink>,
    config: SessionConfig,
    state: RwLock<Arc<ConversationState>>,
    gate: RequestGate,
}

impl<B: GenerationBackend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            extractor: Box::new(TextExtractor::default()),
            sink: Arc::new(NoopSink),
            config: SessionConfig::default(),
            state: RwLock::new(Arc::new(ConversationState::new())),
            gate: RequestGate::new(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn DocumentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Current transcript. Cheap: shares the snapshot.
    pub fn snapshot(&self) -> Arc<ConversationState> {
        match self.state.read() {
            Ok(state) => Arc::clone(&state),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ═══════════════════════════════════════════════════════════
    // Operations
    // ═══════════════════════════════════════════════════════════

    /// Submit typed text, an uploaded file, or both.
    ///
    /// Until the first card lands this is a document submission answered with
    /// cards; afterwards every submission is a follow-up answered by streaming.
    pub fn submit_document(
        &self,
        text: &str,
        file: Option<UploadedFile>,
    ) -> Result<TurnDelta, ConversationError> {
        let guard = self
            .gate
            .try_acquire(OperationKind::Ingestion)
            .ok_or_else(|| self.busy(OperationKind::Ingestion))?;

        let typed = text.trim();
        let Submission {
            content,
            source_text,
            ingestion_error,
        } = self.compose(typed, file.as_ref());
        if content.trim().is_empty() {
            return Err(ConversationError::EmptySubmission);
        }

        let before = self.snapshot();
        let start = before.turns().len();
        let mode = before.mode();
        tracing::info!(
            mode = mode.as_str(),
            content_len = content.len(),
            has_file = file.is_some(),
            "Submission accepted"
        );

        let user_turn = Turn::user(content.clone(), file.map(|f| f.name));
        self.append(user_turn);

        let outcome = match mode {
            ConversationMode::Cards => {
                guard.transition(OperationKind::CardGeneration);
                self.run_cards(&source_text)
            }
            ConversationMode::Stream => {
                guard.transition(OperationKind::FollowUpStream);
                // Classify what the person typed, not the file they attached.
                let distress_input = if typed.is_empty() { source_text.as_str() } else { typed };
                self.run_followup(distress_input)
            }
        };

        let delta = self.delta_since(start, outcome, ingestion_error);
        tracing::info!(
            new_turns = delta.turns.len(),
            outcome = outcome_name(&delta.outcome),
            "Submission finished"
        );
        Ok(delta)
    }

    /// Reveal the next card of the active set.
    pub fn continue_reveal(&self) -> Result<TurnDelta, ConversationError> {
        let _guard = self
            .gate
            .try_acquire(OperationKind::Reveal)
            .ok_or_else(|| self.busy(OperationKind::Reveal))?;

        let current = self.snapshot();
        let Some((next, turn, step)) = current.advance_reveal() else {
            tracing::debug!("Continue with no card pending");
            return Ok(TurnDelta {
                turns: Vec::new(),
                outcome: OperationOutcome::NothingToReveal,
                ingestion_error: None,
            });
        };

        let pending = next.pending_reveal();
        self.publish(next);
        self.sink.emit(&ConversationEvent::TurnAppended { turn: turn.clone() });
        tracing::info!(pending, completed = step.completed, "Card revealed");

        Ok(TurnDelta {
            turns: vec![turn],
            outcome: OperationOutcome::CardRevealed {
                pending,
                completed: step.completed,
            },
            ingestion_error: None,
        })
    }

    /// Show the appointment summary. Available once a card set has been fully revealed.
    pub fn request_appointment_summary(&self) -> Result<TurnDelta, ConversationError> {
        let _guard = self
            .gate
            .try_acquire(OperationKind::Summary)
            .ok_or_else(|| self.busy(OperationKind::Summary))?;

        let current = self.snapshot();
        if !current.summary_available() {
            return Err(ConversationError::SummaryUnavailable);
        }

        let summary =
            AppointmentSummary::from_turns(current.turns(), self.config.short_question_max_chars);
        self.publish(current.as_ref().clone().show_summary());
        self.sink.emit(&ConversationEvent::SummaryShown {
            summary: summary.clone(),
        });
        tracing::info!(
            suggested = summary.suggested_questions.len(),
            own = summary.your_questions.len(),
            "Appointment summary shown"
        );

        Ok(TurnDelta {
            turns: Vec::new(),
            outcome: OperationOutcome::SummaryShown { summary },
            ingestion_error: None,
        })
    }

    // ═══════════════════════════════════════════════════════════
    // Paths
    // ═══════════════════════════════════════════════════════════

    fn run_cards(&self, document: &str) -> OperationOutcome {
        let history = self.snapshot();
        let generator = CardGenerator::new(&self.backend, self.config.max_key_terms);

        match generator.generate(history.turns(), document) {
            Ok(CardOutcome::Accepted(set)) => {
                let (next, turn) = history.as_ref().clone().begin_reveal(set);
                let pending = next.pending_reveal();
                self.publish(next);
                self.sink.emit(&ConversationEvent::TurnAppended { turn });
                OperationOutcome::CardsRevealed { pending }
            }
            Ok(CardOutcome::Degraded(card)) => {
                let (next, turn) = history.as_ref().clone().show_degraded(card);
                self.publish(next);
                self.sink.emit(&ConversationEvent::TurnAppended { turn });
                OperationOutcome::Degraded
            }
            Ok(CardOutcome::Rejected { reason }) => {
                tracing::warn!("Card set rejected as ungrounded");
                self.append(Turn::error_notice(reason));
                OperationOutcome::ValidationFailed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Card generation failed");
                self.append(Turn::error_notice(GENERIC_APOLOGY));
                OperationOutcome::GenerationFailed
            }
        }
    }

    fn run_followup(&self, distress_input: &str) -> OperationOutcome {
        let history = self.snapshot();
        let placeholder = Turn::in_progress();
        let turn_id = placeholder.id;
        self.append(placeholder);

        let engine = FollowUpEngine::new(&self.backend);
        let stream = match engine.open(history.turns(), distress_input) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Follow-up request failed");
                self.replace_with_apology(turn_id);
                return OperationOutcome::GenerationFailed;
            }
        };

        let distressed = stream.distressed;
        match self.drain(turn_id, stream.fragments) {
            Ok(fragments) => {
                self.publish(self.snapshot().as_ref().clone().finalize_turn(turn_id));
                self.sink.emit(&ConversationEvent::TurnFinalized { turn_id });
                tracing::info!(fragments, distressed, "Follow-up answer complete");
                OperationOutcome::Answered { distressed }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Follow-up stream interrupted");
                self.replace_with_apology(turn_id);
                OperationOutcome::StreamInterrupted
            }
        }
    }

    /// Apply fragments to the streaming turn in arrival order. Returns the fragment count.
    fn drain<I>(&self, turn_id: Uuid, fragments: I) -> Result<usize, FollowUpError>
    where
        I: Iterator<Item = Result<String, BackendError>>,
    {
        let mut guard = StreamGuard::new(self.config.guard.clone());
        let mut buffer = StreamAccumulator::new();

        for fragment in fragments {
            let fragment = fragment?;
            if fragment.is_empty() {
                continue;
            }
            guard.feed(&fragment)?;
            buffer.push(&fragment);

            self.publish(
                self.snapshot()
                    .as_ref()
                    .clone()
                    .update_turn_content(turn_id, buffer.as_str()),
            );
            self.sink.emit(&ConversationEvent::TurnUpdated {
                turn_id,
                content: buffer.as_str().to_string(),
            });
        }

        if buffer.is_empty() {
            return Err(FollowUpError::Empty);
        }
        tracing::debug!(fragments = buffer.fragment_count(), "Stream drained");
        Ok(buffer.fragment_count())
    }

    // ═══════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════

    /// Turn content and validation source for a submission.
    fn compose(&self, typed: &str, file: Option<&UploadedFile>) -> Submission {
        let Some(file) = file else {
            return Submission {
                content: typed.to_string(),
                source_text: typed.to_string(),
                ingestion_error: None,
            };
        };

        match self.extractor.extract(file) {
            Ok(extracted) if typed.is_empty() => Submission {
                content: extracted.clone(),
                source_text: extracted,
                ingestion_error: None,
            },
            Ok(extracted) => Submission {
                content: format!("{typed}\n\n[Attached file: {}]\n{extracted}", file.name),
                source_text: format!("{typed}\n\n{extracted}"),
                ingestion_error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Attached file could not be read");
                let marker = format!("[Unable to read file: {}]", file.name);
                let content = if typed.is_empty() {
                    marker
                } else {
                    format!("{typed}\n\n{marker}")
                };
                Submission {
                    content,
                    source_text: typed.to_string(),
                    ingestion_error: Some(e),
                }
            }
        }
    }

    fn append(&self, turn: Turn) {
        let next = self.snapshot().as_ref().clone().push_turn(turn.clone());
        self.publish(next);
        self.sink.emit(&ConversationEvent::TurnAppended { turn });
    }

    fn replace_with_apology(&self, turn_id: Uuid) {
        let apology = Turn::error_notice(GENERIC_APOLOGY);
        let next = self
            .snapshot()
            .as_ref()
            .clone()
            .replace_turn(turn_id, apology.clone());
        self.publish(next);
        self.sink.emit(&ConversationEvent::TurnReplaced {
            turn_id,
            turn: apology,
        });
    }

    fn publish(&self, next: ConversationState) {
        let next = Arc::new(next);
        match self.state.write() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn delta_since(
        &self,
        start: usize,
        outcome: OperationOutcome,
        ingestion_error: Option<IngestionError>,
    ) -> TurnDelta {
        let state = self.snapshot();
        TurnDelta {
            turns: state.turns().get(start..).unwrap_or_default().to_vec(),
            outcome,
            ingestion_error,
        }
    }

    fn busy(&self, requested: OperationKind) -> ConversationError {
        let kind = self
            .gate
            .current_operation()
            .map(|op| op.kind)
            .unwrap_or(requested);
        tracing::debug!(%kind, %requested, "Operation refused, session busy");
        ConversationError::Busy(kind)
    }
}

fn outcome_name(outcome: &OperationOutcome) -> &'static str {
    match outcome {
        OperationOutcome::CardsRevealed { .. } => "cards_revealed",
        OperationOutcome::Degraded => "degraded",
        OperationOutcome::ValidationFailed => "validation_failed",
        OperationOutcome::GenerationFailed => "generation_failed",
        OperationOutcome::Answered { .. } => "answered",
        OperationOutcome::StreamInterrupted => "stream_interrupted",
        OperationOutcome::CardRevealed { .. } => "card_revealed",
        OperationOutcome::NothingToReveal => "nothing_to_reveal",
        OperationOutcome::SummaryShown { .. } => "summary_shown",
    }
}
