use serde::Serialize;
use uuid::Uuid;

use super::mode::select_mode;
use super::reveal::{RevealState, RevealStep};
use crate::models::{Card, CardSet, ConversationMode, Turn};

/// Everything one conversation knows, as an immutable value.
///
/// Transitions consume the state and return the next one; `mode` is
/// recomputed from the turns after every transition that adds a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    turns: Vec<Turn>,
    mode: ConversationMode,
    reveal: RevealState,
    completed_sets: usize,
    summary_shown: bool,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            turns: Vec::new(),
            mode: select_mode(&[]),
            reveal: RevealState::Empty,
            completed_sets: 0,
            summary_shown: false,
        }
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ─────────────────────────────────────────────

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn mode(&self) -> ConversationMode {
        self.mode
    }

    pub fn reveal(&self) -> &RevealState {
        &self.reveal
    }

    /// Cards of the active set still waiting for "continue".
    pub fn pending_reveal(&self) -> usize {
        self.reveal.pending()
    }

    pub fn completed_sets(&self) -> usize {
        self.completed_sets
    }

    /// The appointment summary unlocks once any card set has been fully shown.
    pub fn summary_available(&self) -> bool {
        self.completed_sets > 0
    }

    pub fn summary_shown(&self) -> bool {
        self.summary_shown
    }

    pub fn turn(&self, id: Uuid) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    // ── Transitions ─────────────────────────────────────────

    pub fn push_turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self.mode = select_mode(&self.turns);
        self
    }

    /// Accept a validated set: its first card becomes a turn, the rest wait.
    pub fn begin_reveal(self, set: CardSet) -> (Self, Turn) {
        let (reveal, step) = RevealState::begin(set);
        let turn = Turn::card(step.card);
        let mut next = self.push_turn(turn.clone());
        next.reveal = reveal;
        (next, turn)
    }

    /// Show a degraded single card. Nothing is left to reveal, so the set is complete.
    pub fn show_degraded(self, card: Card) -> (Self, Turn) {
        let turn = Turn::card(card);
        let mut next = self.push_turn(turn.clone());
        next.reveal = RevealState::Empty;
        next.completed_sets += 1;
        (next, turn)
    }

    /// Append the next pending card. `None` when nothing is pending.
    pub fn advance_reveal(&self) -> Option<(Self, Turn, RevealStep)> {
        let (reveal, step) = self.reveal.advance()?;
        let turn = Turn::card(step.card.clone());
        let mut next = self.clone().push_turn(turn.clone());
        next.reveal = reveal;
        if step.completed {
            next.completed_sets += 1;
        }
        Some((next, turn, step))
    }

    /// New content for a streaming turn. Unknown ids leave the state unchanged.
    pub fn update_turn_content(mut self, id: Uuid, content: &str) -> Self {
        if let Some(turn) = self.turns.iter_mut().find(|t| t.id == id) {
            turn.content.clear();
            turn.content.push_str(content);
        }
        self
    }

    /// Swap a turn for another one, keeping its position.
    pub fn replace_turn(mut self, id: Uuid, replacement: Turn) -> Self {
        if let Some(turn) = self.turns.iter_mut().find(|t| t.id == id) {
            *turn = replacement;
        }
        self.mode = select_mode(&self.turns);
        self
    }

    /// Clear the streaming flag on a turn.
    pub fn finalize_turn(mut self, id: Uuid) -> Self {
        if let Some(turn) = self.turns.iter_mut().find(|t| t.id == id) {
            turn.streaming = false;
        }
        self
    }

    /// One-way: there is no transition back.
    pub fn show_summary(mut self) -> Self {
        self.summary_shown = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardField;

    fn set() -> CardSet {
        CardSet::from_bodies([
            "one".into(),
            "two".into(),
            "three".into(),
            "four".into(),
            "Q1?\nQ2?".into(),
        ])
    }

    #[test]
    fn new_state_is_empty_cards_mode() {
        let state = ConversationState::new();
        assert!(state.turns().is_empty());
        assert_eq!(state.mode(), ConversationMode::Cards);
        assert!(!state.summary_available());
    }

    #[test]
    fn begin_reveal_appends_first_card_and_switches_mode() {
        let state = ConversationState::new().push_turn(Turn::user("doc", None));
        let (state, turn) = state.begin_reveal(set());
        assert_eq!(turn.card.as_ref().and_then(|c| c.field()), Some(CardField::DocumentIdentity));
        assert_eq!(state.turns().len(), 2);
        assert_eq!(state.mode(), ConversationMode::Stream);
        assert_eq!(state.pending_reveal(), 4);
        assert!(!state.summary_available());
    }

    #[test]
    fn full_reveal_completes_the_set() {
        let (mut state, _) = ConversationState::new().begin_reveal(set());
        let mut steps = 0;
        while let Some((next, _, _)) = state.advance_reveal() {
            state = next;
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(state.turns().len(), 5);
        assert_eq!(state.completed_sets(), 1);
        assert!(state.summary_available());
        assert!(state.advance_reveal().is_none());
    }

    #[test]
    fn degraded_card_completes_immediately() {
        let (state, turn) = ConversationState::new().show_degraded(Card::degraded("raw"));
        assert!(turn.carries_card());
        assert!(state.summary_available());
        assert_eq!(state.pending_reveal(), 0);
        assert_eq!(state.mode(), ConversationMode::Stream);
    }

    #[test]
    fn streaming_turn_updates_then_finalizes() {
        let turn = Turn::in_progress();
        let id = turn.id;
        let state = ConversationState::new()
            .push_turn(turn)
            .update_turn_content(id, "Hel")
            .update_turn_content(id, "Hello");
        assert_eq!(state.turn(id).map(|t| t.content.as_str()), Some("Hello"));
        assert!(state.turn(id).is_some_and(|t| t.streaming));

        let state = state.finalize_turn(id);
        assert!(state.turn(id).is_some_and(|t| !t.streaming));
    }

    #[test]
    fn replace_keeps_position() {
        let streaming = Turn::in_progress();
        let id = streaming.id;
        let state = ConversationState::new()
            .push_turn(Turn::user("q", None))
            .push_turn(streaming)
            .replace_turn(id, Turn::error_notice("Sorry"));
        assert_eq!(state.turns().len(), 2);
        assert!(state.turns()[1].error);
        assert_eq!(state.turns()[1].content, "Sorry");
        assert!(state.turn(id).is_none());
    }

    #[test]
    fn summary_flag_is_one_way() {
        let state = ConversationState::new().show_summary();
        assert!(state.summary_shown());
        assert!(state.show_summary().summary_shown());
    }
}
