use crate::models::CardField;

pub const CARDS_SYSTEM_PROMPT: &str = r#"
You turn a medical document into a short, plain-language summary for the
patient it belongs to. Use ONLY what the document says.

OUTPUT: a single JSON object with exactly these five string fields and nothing else:
  "what_this_is"      what kind of document this is, who wrote it and when
  "main_finding"      the single most important finding
  "test_results"      the results that matter, with what each value means
  "next_steps"        what the document says will happen next
  "questions_to_ask"  exactly 4 questions, one per line

RULES:
1. Speak to the patient in the second person ("you", "your").
2. Begin "main_finding" with a short empathetic clause before the finding itself.
3. Use active voice and plain words; explain any medical term you keep.
4. Each narrative field is 3 to 5 sentences.
5. Never give survival statistics or treatment advice.
6. If the document does not mention something, say so plainly instead of guessing.
7. Output the JSON object only. No Markdown, no commentary.
"#;

/// The five keys the structured answer must carry, in card order.
pub fn required_keys() -> [&'static str; 5] {
    CardField::ALL.map(|f| f.key())
}
