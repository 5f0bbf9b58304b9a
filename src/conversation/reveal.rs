use serde::Serialize;

use crate::models::{Card, CardSet};

/// Progressive disclosure of one card set.
///
/// `Revealing { revealed }` always satisfies `1 <= revealed < CardSet::LEN`;
/// showing the last card passes through completion straight back to `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RevealState {
    #[default]
    Empty,
    Revealing { set: CardSet, revealed: usize },
}

/// One card handed out by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealStep {
    pub card: Card,
    /// True when this was the set's last card.
    pub completed: bool,
}

impl RevealState {
    /// Start revealing `set`; its first card is shown right away.
    pub fn begin(set: CardSet) -> (Self, RevealStep) {
        let first = set.cards()[0].clone();
        let state = Self::Revealing { set, revealed: 1 };
        (
            state,
            RevealStep {
                card: first,
                completed: false,
            },
        )
    }

    /// Show the next card. `None` (and no change) when nothing is pending.
    pub fn advance(&self) -> Option<(Self, RevealStep)> {
        let Self::Revealing { set, revealed } = self else {
            return None;
        };
        let card = set.card(*revealed)?.clone();
        let shown = revealed + 1;
        if shown >= CardSet::LEN {
            Some((
                Self::Empty,
                RevealStep {
                    card,
                    completed: true,
                },
            ))
        } else {
            Some((
                Self::Revealing {
                    set: set.clone(),
                    revealed: shown,
                },
                RevealStep {
                    card,
                    completed: false,
                },
            ))
        }
    }

    pub fn revealed_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Revealing { revealed, .. } => *revealed,
        }
    }

    /// Cards of the active set not yet shown.
    pub fn pending(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Revealing { revealed, .. } => CardSet::LEN - revealed,
        }
    }

    pub fn is_revealing(&self) -> bool {
        matches!(self, Self::Revealing { .. })
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
    fn begin_shows_first_card() {
        let (state, step) = RevealState::begin(set());
        assert_eq!(step.card.field(), Some(CardField::DocumentIdentity));
        assert!(!step.completed);
        assert_eq!(state.revealed_count(), 1);
        assert_eq!(state.pending(), 4);
    }

    #[test]
    fn four_advances_complete_the_set_in_order() {
        let (mut state, _) = RevealState::begin(set());
        let mut bodies = Vec::new();
        let mut completions = Vec::new();
        while let Some((next, step)) = state.advance() {
            bodies.push(step.card.body.clone());
            completions.push(step.completed);
            assert!(next.revealed_count() <= CardSet::LEN);
            state = next;
        }
        assert_eq!(bodies, vec!["two", "three", "four", "Q1?\nQ2?"]);
        assert_eq!(completions, vec![false, false, false, true]);
        assert_eq!(state, RevealState::Empty);
    }

    #[test]
    fn advance_in_empty_is_a_no_op() {
        assert!(RevealState::Empty.advance().is_none());
        assert_eq!(RevealState::default().pending(), 0);
    }
}
