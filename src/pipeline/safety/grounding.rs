use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::CardSet;

/// Shortest token (in characters) that counts as a key term.
const MIN_TERM_CHARS: usize = 5;

/// Shown to the user when a card set is rejected as ungrounded.
pub const UNGROUNDED_MESSAGE: &str =
    "This summary may not match your document. Please try submitting it again.";

/// Result of checking a card set against its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Accepted,
    Rejected { reason: String },
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Distinctive tokens of a document, in first-seen order.
///
/// A token is case-folded and stripped of punctuation; it qualifies when it is
/// at least five characters long and contains a letter. At most `max_terms`
/// distinct terms are returned.
pub fn extract_key_terms(document: &str, max_terms: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for raw in document.split_whitespace() {
        if terms.len() >= max_terms {
            break;
        }
        let token: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        if token.chars().count() < MIN_TERM_CHARS || !token.chars().any(char::is_alphabetic) {
            continue;
        }
        if seen.insert(token.clone()) {
            terms.push(token);
        }
    }

    terms
}

/// Accept the card set if its combined body mentions at least one key term of the document.
///
/// Documents without any key term are accepted as-is: there is nothing to check against.
pub fn check_card_grounding(document: &str, cards: &CardSet, max_terms: usize) -> ValidationOutcome {
    let terms = extract_key_terms(document, max_terms);
    if terms.is_empty() {
        tracing::debug!("No key terms in document, grounding check skipped");
        return ValidationOutcome::Accepted;
    }

    let combined = cards.combined_body_folded();
    match terms.iter().position(|term| combined.contains(term.as_str())) {
        Some(index) => {
            tracing::debug!(terms = terms.len(), matched_index = index, "Card set grounded");
            ValidationOutcome::Accepted
        }
        None => {
            tracing::warn!(terms = terms.len(), "Card set shares no key term with document");
            ValidationOutcome::Rejected {
                reason: UNGROUNDED_MESSAGE.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAB_REPORT: &str = "CBC panel, 2024-03-02. Hemoglobin 11.8 (L). \
        Ferritin 9 ng/mL (L). Platelets normal. Follow-up with hematology.";

    fn cards_with_finding(finding: &str) -> CardSet {
        CardSet::from_bodies([
            "A blood test.".into(),
            finding.into(),
            "Two values were low.".into(),
            "Expect a call.".into(),
            "Q1?\nQ2?".into(),
        ])
    }

    #[test]
    fn key_terms_are_folded_stripped_and_ordered() {
        let terms = extract_key_terms(LAB_REPORT, 20);
        assert_eq!(
            terms,
            vec![
                "panel",
                "hemoglobin",
                "ferritin",
                "platelets",
                "normal",
                "followup",
                "hematology",
            ]
        );
    }

    #[test]
    fn dates_without_letters_are_not_terms() {
        let terms = extract_key_terms(LAB_REPORT, 20);
        assert!(!terms.iter().any(|t| t == "20240302"));
    }

    #[test]
    fn numeric_only_tokens_are_not_terms() {
        assert!(extract_key_terms("12345 678.90 (11.8)", 20).is_empty());
    }

    #[test]
    fn key_terms_are_deduplicated_and_capped() {
        let doc = "Anemia anemia ANEMIA, ferritin; iron-deficiency";
        assert_eq!(
            extract_key_terms(doc, 20),
            vec!["anemia", "ferritin", "irondeficiency"]
        );
        assert_eq!(extract_key_terms(doc, 2), vec!["anemia", "ferritin"]);
    }

    #[test]
    fn overlapping_summary_is_accepted() {
        let cards = cards_with_finding("Your HEMOGLOBIN is a little low.");
        assert!(check_card_grounding(LAB_REPORT, &cards, 20).is_accepted());
    }

    #[test]
    fn summary_without_overlap_is_rejected() {
        let cards = cards_with_finding("Your kidneys look fine.");
        assert_eq!(
            check_card_grounding(LAB_REPORT, &cards, 20),
            ValidationOutcome::Rejected {
                reason: UNGROUNDED_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn document_without_terms_is_auto_accepted() {
        let cards = cards_with_finding("Anything at all.");
        assert!(check_card_grounding("BP 120/80 ok", &cards, 20).is_accepted());
    }

    #[test]
    fn terms_beyond_the_cap_do_not_count() {
        let doc = "alpha1 bravo2 charlie delta3 hemoglobin";
        let cards = cards_with_finding("hemoglobin only");
        assert!(!check_card_grounding(doc, &cards, 4).is_accepted());
        assert!(check_card_grounding(doc, &cards, 5).is_accepted());
    }
}
