use crate::pipeline::backend::ChatMessage;

pub const FOLLOWUP_SYSTEM_PROMPT: &str = r#"
You are a warm, patient medical explainer. The person you are talking with has
already received a plain-language summary of their medical document earlier in
this conversation. Answer their follow-up question using that document.

RULES:
1. Speak directly to the person ("you", "your").
2. Use plain words. When a medical term is unavoidable, explain it right after.
3. Stay with what the document says. If it does not answer the question, say so.
4. Never diagnose, never prescribe, never give survival statistics.
5. Encourage them to confirm anything important with their doctor.
6. Keep answers short: a few short paragraphs at most.
"#;

/// Sent ahead of the conversation when the latest message reads as distressed.
/// Never appears in the visible transcript.
pub const DISTRESS_PREAMBLE: &str = "The person asking may be frightened or upset. \
Before any medical explanation, briefly and sincerely acknowledge how they feel. \
Then answer gently, in plain words, and remind them that their care team is there to help.";

/// Outbound follow-up messages: visible history, with the distress preamble in front when flagged.
pub fn build_followup_messages(history: Vec<ChatMessage>, distressed: bool) -> Vec<ChatMessage> {
    if !distressed {
        return history;
    }
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::user(DISTRESS_PREAMBLE));
    messages.extend(history);
    messages
}
