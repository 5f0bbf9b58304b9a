use serde::Deserialize;

use crate::models::{Card, CardSet};

/// What a structured answer turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedCards {
    /// All five fields present with the right types.
    Structured(CardSet),
    /// Anything else, wrapped verbatim in one generic card.
    Degraded(Card),
}

/// Questions may arrive as one newline-separated string or as an array.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionsField {
    Text(String),
    List(Vec<String>),
}

impl QuestionsField {
    fn into_body(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::List(items) => items.join("\n"),
        }
    }
}

/// Strict schema: every key required, extra keys ignored.
#[derive(Deserialize)]
struct RawCards {
    what_this_is: String,
    main_finding: String,
    test_results: String,
    next_steps: String,
    questions_to_ask: QuestionsField,
}

/// Map a structured answer onto the card schema, degrading instead of failing.
pub fn parse_cards_response(response: &str) -> GeneratedCards {
    let json = strip_code_fences(response);
    match serde_json::from_str::<RawCards>(json) {
        Ok(raw) => GeneratedCards::Structured(CardSet::from_bodies([
            raw.what_this_is,
            raw.main_finding,
            raw.test_results,
            raw.next_steps,
            raw.questions_to_ask.into_body(),
        ])),
        Err(e) => {
            tracing::warn!(
                error = %e,
                response_len = response.len(),
                "Structured answer did not match card schema, degrading"
            );
            GeneratedCards::Degraded(Card::degraded(response.trim()))
        }
    }
}

/// Remove a surrounding ```json ... ``` (or bare ```) fence, if present.
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json"), whether or not a newline follows it.
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardKind, DEGRADED_CARD_LABEL};

    const VALID: &str = r#"{
        "what_this_is": "A blood test from March.",
        "main_finding": "It is understandable to worry. Your hemoglobin is a little low.",
        "test_results": "Hemoglobin 11.8 is just under the normal range.",
        "next_steps": "Your doctor wants to recheck in a month.",
        "questions_to_ask": "Why is it low?\nShould I take iron?\nIs this serious?\nWhen is the recheck?"
    }"#;

    fn structured(response: &str) -> CardSet {
        match parse_cards_response(response) {
            GeneratedCards::Structured(set) => set,
            GeneratedCards::Degraded(card) => panic!("unexpected degrade: {}", card.body),
        }
    }

    #[test]
    fn valid_json_maps_to_five_cards() {
        let set = structured(VALID);
        assert_eq!(set.cards()[1].body, "It is understandable to worry. Your hemoglobin is a little low.");
        assert_eq!(set.cards()[4].kind, CardKind::QuestionList);
        assert_eq!(set.cards()[4].question_items().len(), 4);
    }

    #[test]
    fn question_array_is_newline_joined() {
        let set = structured(
            r#"{"what_this_is":"a","main_finding":"b","test_results":"c","next_steps":"d",
                "questions_to_ask":["Q1?","Q2?"]}"#,
        );
        assert_eq!(set.cards()[4].body, "Q1?\nQ2?");
    }

    #[test]
    fn fenced_json_is_accepted() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(structured(&fenced), structured(VALID));
        let bare = format!("```\n{VALID}\n```\n");
        assert_eq!(structured(&bare), structured(VALID));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let set = structured(
            r#"{"what_this_is":"a","main_finding":"b","test_results":"c","next_steps":"d",
                "questions_to_ask":"q","confidence":0.9}"#,
        );
        assert_eq!(set.cards()[0].body, "a");
    }

    #[test]
    fn prose_degrades_to_one_generic_card() {
        let response = "  Here is a friendly summary of your labs.  ";
        assert_eq!(
            parse_cards_response(response),
            GeneratedCards::Degraded(Card {
                label: DEGRADED_CARD_LABEL.into(),
                body: "Here is a friendly summary of your labs.".into(),
                kind: CardKind::Narrative,
            })
        );
    }

    #[test]
    fn missing_key_degrades() {
        let response = r#"{"what_this_is":"a","main_finding":"b","test_results":"c","next_steps":"d"}"#;
        assert!(matches!(parse_cards_response(response), GeneratedCards::Degraded(_)));
    }

    #[test]
    fn wrong_type_degrades() {
        let response = r#"{"what_this_is":"a","main_finding":42,"test_results":"c","next_steps":"d",
            "questions_to_ask":"q"}"#;
        assert!(matches!(parse_cards_response(response), GeneratedCards::Degraded(_)));
        let mixed = r#"{"what_this_is":"a","main_finding":"b","test_results":"c","next_steps":"d",
            "questions_to_ask":["ok", 3]}"#;
        assert!(matches!(parse_cards_response(mixed), GeneratedCards::Degraded(_)));
    }

    #[test]
    fn single_line_fence_is_accepted() {
        let compact: String = VALID.lines().map(str::trim).collect();
        let fenced = format!("```json{compact}```");
        assert_eq!(strip_code_fences(&fenced), compact);
        assert_eq!(structured(&fenced), structured(VALID));
    }

    #[test]
    fn fence_stripping_leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }
}
