use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::enums::CardKind;

/// Label used when the backend output could not be mapped to the card schema.
pub const DEGRADED_CARD_LABEL: &str = "Summary";

/// Footnote shown under every card.
pub const CARD_FOOTNOTE: &str = "Based on your document. Always verify with your doctor.";

/// Leading bullets or numbering on a question line ("1.", "2)", "-", "•").
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-•\d.)\s]+").expect("static list marker pattern"));

/// The five sections of a card set, in reveal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardField {
    DocumentIdentity,
    MainFinding,
    TestResults,
    NextSteps,
    Questions,
}

impl CardField {
    pub const ALL: [CardField; 5] = [
        CardField::DocumentIdentity,
        CardField::MainFinding,
        CardField::TestResults,
        CardField::NextSteps,
        CardField::Questions,
    ];

    /// JSON key the backend must emit for this section.
    pub fn key(&self) -> &'static str {
        match self {
            Self::DocumentIdentity => "what_this_is",
            Self::MainFinding => "main_finding",
            Self::TestResults => "test_results",
            Self::NextSteps => "next_steps",
            Self::Questions => "questions_to_ask",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DocumentIdentity => "What this document is",
            Self::MainFinding => "The main finding",
            Self::TestResults => "Your test results",
            Self::NextSteps => "What happens next",
            Self::Questions => "Questions to ask your doctor",
        }
    }

    pub fn kind(&self) -> CardKind {
        match self {
            Self::Questions => CardKind::QuestionList,
            _ => CardKind::Narrative,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label)
    }
}

/// One labelled section of a document summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub label: String,
    pub body: String,
    pub kind: CardKind,
}

impl Card {
    pub fn for_field(field: CardField, body: impl Into<String>) -> Self {
        Self {
            label: field.label().to_string(),
            body: body.into(),
            kind: field.kind(),
        }
    }

    /// Generic card wrapping backend output that did not match the schema.
    pub fn degraded(raw: impl Into<String>) -> Self {
        Self {
            label: DEGRADED_CARD_LABEL.to_string(),
            body: raw.into(),
            kind: CardKind::Narrative,
        }
    }

    pub fn field(&self) -> Option<CardField> {
        CardField::from_label(&self.label)
    }

    /// Question lines with list markers stripped and blanks dropped.
    pub fn question_items(&self) -> Vec<String> {
        self.body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
            .filter(|q| !q.is_empty())
            .collect()
    }

    /// Display form: questions as an enumerated list, everything else as paragraphs.
    pub fn view(&self) -> CardView {
        let blocks = match self.kind {
            CardKind::QuestionList => CardBlocks::Enumerated(self.question_items()),
            CardKind::Narrative => CardBlocks::Paragraphs(
                self.body
                    .split("\n\n")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        };
        CardView {
            label: self.label.clone(),
            blocks,
            footnote: CARD_FOOTNOTE,
        }
    }
}

/// Exactly five cards in fixed order. The array type enforces the count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSet {
    cards: [Card; 5],
}

impl CardSet {
    pub const LEN: usize = 5;

    /// Build a set from section bodies given in `CardField::ALL` order.
    pub fn from_bodies(bodies: [String; 5]) -> Self {
        let [identity, finding, results, next, questions] = bodies;
        Self {
            cards: [
                Card::for_field(CardField::DocumentIdentity, identity),
                Card::for_field(CardField::MainFinding, finding),
                Card::for_field(CardField::TestResults, results),
                Card::for_field(CardField::NextSteps, next),
                Card::for_field(CardField::Questions, questions),
            ],
        }
    }

    pub fn cards(&self) -> &[Card; 5] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// All card bodies joined, case-folded. Used by the grounding check.
    pub fn combined_body_folded(&self) -> String {
        self.cards
            .iter()
            .map(|c| c.body.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Rendered card content for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub label: String,
    pub blocks: CardBlocks,
    pub footnote: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "items", rename_all = "snake_case")]
pub enum CardBlocks {
    Paragraphs(Vec<String>),
    Enumerated(Vec<String>),
}

impl CardBlocks {
    pub fn to_text(&self) -> String {
        match self {
            Self::Paragraphs(paragraphs) => paragraphs.join("\n\n"),
            Self::Enumerated(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}. {}", i + 1, item))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
