/// Phrases that suggest the person writing is frightened or overwhelmed.
///
/// Deliberately broad. Substrings count, so "panic" also matches "panicked".
const DISTRESS_PHRASES: &[&str] = &[
    "scared",
    "terrified",
    "afraid",
    "frightened",
    "going to die",
    "am i dying",
    "don't want to",
    "can't do this",
    "can't handle",
    "overwhelmed",
    "hopeless",
    "no hope",
    "give up",
    "what's the point",
    "crying",
    "panic",
    "anxious",
    "depressed",
    "don't want to live",
    "end it",
    "kill myself",
];

/// Case-insensitive substring match against the distress vocabulary.
pub fn detect_distress(text: &str) -> bool {
    matched_phrase(text).is_some()
}

/// The first vocabulary phrase found in `text`, if any.
pub fn matched_phrase(text: &str) -> Option<&'static str> {
    let folded = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    DISTRESS_PHRASES
        .iter()
        .copied()
        .find(|phrase| folded.contains(phrase))
}
