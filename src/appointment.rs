//! Appointment summary: what to bring to the next visit.
//!
//! Recombines cards already in the transcript and the person's own short
//! questions. No generation call is involved.

use serde::{Deserialize, Serialize};

use crate::models::{CardField, Turn};

pub const SUMMARY_TITLE: &str = "What to bring to your appointment";
const FINDING_HEADING: &str = "Key finding to discuss";
const NEXT_STEPS_HEADING: &str = "Next steps mentioned";
const QUESTIONS_HEADING: &str = "Questions to ask";
const OWN_QUESTIONS_HEADING: &str = "Your questions from this conversation";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSummary {
    /// Body of the latest main-finding card.
    pub main_finding: Option<String>,
    /// Body of the latest next-steps card.
    pub next_steps: Option<String>,
    /// Items of the most recent questions card.
    pub suggested_questions: Vec<String>,
    /// Short messages the person typed without an attachment.
    pub your_questions: Vec<String>,
}

impl AppointmentSummary {
    /// Assemble the summary from the whole transcript.
    ///
    /// User messages count as questions when they carry no attachment and are
    /// shorter than `short_question_max_chars` characters.
    pub fn from_turns(turns: &[Turn], short_question_max_chars: usize) -> Self {
        let latest_card = |field: CardField| {
            turns
                .iter()
                .rev()
                .filter_map(|t| t.card.as_ref())
                .find(|card| card.field() == Some(field))
        };

        let your_questions = turns
            .iter()
            .filter(|t| t.is_user() && t.attachment.is_none())
            .map(|t| t.content.trim())
            .filter(|c| !c.is_empty() && c.chars().count() < short_question_max_chars)
            .map(str::to_string)
            .collect();

        Self {
            main_finding: latest_card(CardField::MainFinding).map(|c| c.body.clone()),
            next_steps: latest_card(CardField::NextSteps).map(|c| c.body.clone()),
            suggested_questions: latest_card(CardField::Questions)
                .map(|c| c.question_items())
                .unwrap_or_default(),
            your_questions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.main_finding.is_none()
            && self.next_steps.is_none()
            && self.suggested_questions.is_empty()
            && self.your_questions.is_empty()
    }

    /// Plain-text rendering, suitable for printing or pasting. Empty sections are left out.
    pub fn render_text(&self) -> String {
        let mut sections = vec![SUMMARY_TITLE.to_string()];

        if let Some(finding) = &self.main_finding {
            sections.push(format!("{FINDING_HEADING}\n{}", finding.trim()));
        }
        if let Some(next) = &self.next_steps {
            sections.push(format!("{NEXT_STEPS_HEADING}\n{}", next.trim()));
        }
        if !self.suggested_questions.is_empty() {
            let list = self
                .suggested_questions
                .iter()
                .enumerate()
                .map(|(i, q)| format!("{}. {}", i + 1, q))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("{QUESTIONS_HEADING}\n{list}"));
        }
        if !self.your_questions.is_empty() {
            let list = self
                .your_questions
                .iter()
                .map(|q| format!("- {q}"))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("{OWN_QUESTIONS_HEADING}\n{list}"));
        }

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, CardSet};

    fn transcript() -> Vec<Turn> {
        let set = CardSet::from_bodies([
            "A blood test.".into(),
            "Your hemoglobin is a little low.".into(),
            "Hemoglobin 11.8.".into(),
            "Recheck in a month.".into(),
            "1. Why is it low?\n2. Do I need iron?".into(),
        ]);
        let mut turns = vec![Turn::user("Hemoglobin 11.8 (L)", Some("labs.txt".into()))];
        turns.extend(set.cards().iter().cloned().map(Turn::card));
        turns.push(Turn::user("Should I stop running?", None));
        turns.push(Turn::assistant("Gentle exercise is usually fine."));
        turns
    }

    #[test]
    fn summary_collects_cards_and_own_questions() {
        let summary = AppointmentSummary::from_turns(&transcript(), 500);
        assert_eq!(summary.main_finding.as_deref(), Some("Your hemoglobin is a little low."));
        assert_eq!(summary.next_steps.as_deref(), Some("Recheck in a month."));
        assert_eq!(summary.suggested_questions, vec!["Why is it low?", "Do I need iron?"]);
        assert_eq!(summary.your_questions, vec!["Should I stop running?"]);
    }

    #[test]
    fn attached_and_long_messages_are_not_questions() {
        let mut turns = transcript();
        turns.push(Turn::user("x".repeat(500), None));
        turns.push(Turn::user("short but attached", Some("more.txt".into())));
        let summary = AppointmentSummary::from_turns(&turns, 500);
        assert_eq!(summary.your_questions, vec!["Should I stop running?"]);

        turns.push(Turn::user("y".repeat(499), None));
        let summary = AppointmentSummary::from_turns(&turns, 500);
        assert_eq!(summary.your_questions.len(), 2);
    }

    #[test]
    fn latest_cards_win() {
        let mut turns = transcript();
        turns.push(Turn::card(Card::for_field(CardField::MainFinding, "Updated finding.")));
        let summary = AppointmentSummary::from_turns(&turns, 500);
        assert_eq!(summary.main_finding.as_deref(), Some("Updated finding."));
    }

    #[test]
    fn render_text_uses_fixed_headings() {
        let text = AppointmentSummary::from_turns(&transcript(), 500).render_text();
        assert_eq!(
            text,
            "What to bring to your appointment\n\n\
             Key finding to discuss\nYour hemoglobin is a little low.\n\n\
             Next steps mentioned\nRecheck in a month.\n\n\
             Questions to ask\n1. Why is it low?\n2. Do I need iron?\n\n\
             Your questions from this conversation\n- Should I stop running?"
        );
    }

    #[test]
    fn degraded_transcript_yields_only_own_questions() {
        let turns = vec![
            Turn::user("doc", Some("doc.txt".into())),
            Turn::card(Card::degraded("raw text")),
            Turn::user("What now?", None),
        ];
        let summary = AppointmentSummary::from_turns(&turns, 500);
        assert!(summary.main_finding.is_none());
        assert!(summary.suggested_questions.is_empty());
        assert_eq!(summary.render_text(), format!("{SUMMARY_TITLE}\n\nYour questions from this conversation\n- What now?"));
        assert!(!summary.is_empty());
    }
}
