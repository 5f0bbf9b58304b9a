use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

use crate::appointment::AppointmentSummary;
use crate::models::Turn;

/// Incremental transcript change pushed to observers while an operation runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    TurnAppended { turn: Turn },
    /// New content for a turn that is still streaming.
    TurnUpdated { turn_id: Uuid, content: String },
    /// A turn swapped for another, e.g. a failed stream for the apology.
    TurnReplaced { turn_id: Uuid, turn: Turn },
    TurnFinalized { turn_id: Uuid },
    SummaryShown { summary: AppointmentSummary },
}

/// Receives conversation events. Called synchronously from the operation's thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ConversationEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &ConversationEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ConversationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ConversationEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ConversationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let turn = Turn::assistant("hi");
        let id = turn.id;
        let json = serde_json::to_value(ConversationEvent::TurnFinalized { turn_id: id }).unwrap();
        assert_eq!(json["type"], "turn_finalized");
        assert_eq!(json["turn_id"], id.to_string());

        let json = serde_json::to_value(ConversationEvent::TurnAppended { turn }).unwrap();
        assert_eq!(json["type"], "turn_appended");
        assert_eq!(json["turn"]["content"], "hi");
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        let id = Uuid::new_v4();
        sink.emit(&ConversationEvent::TurnUpdated {
            turn_id: id,
            content: "a".into(),
        });
        sink.emit(&ConversationEvent::TurnFinalized { turn_id: id });
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], ConversationEvent::TurnFinalized { .. }));
    }
}
