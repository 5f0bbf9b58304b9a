use super::prompt::{build_followup_messages, FOLLOWUP_SYSTEM_PROMPT};
use crate::models::Turn;
use crate::pipeline::backend::{
    BackendError, ChatMessage, FragmentStream, GenerationBackend, GenerationMode, GenerationRequest,
};
use crate::pipeline::safety::detect_distress;

/// An open follow-up answer: the fragment sequence plus what was decided about the request.
pub struct FollowUpStream<'a> {
    pub fragments: FragmentStream<'a>,
    pub distressed: bool,
}

/// Opens streaming answers to follow-up questions.
pub struct FollowUpEngine<'a, B: GenerationBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: GenerationBackend + ?Sized> FollowUpEngine<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Build the outbound request for `history`, classifying `user_text` for distress.
    pub fn build_request(history: &[Turn], user_text: &str) -> (GenerationRequest, bool) {
        let distressed = detect_distress(user_text);
        let request = GenerationRequest {
            system_instruction: FOLLOWUP_SYSTEM_PROMPT.to_string(),
            messages: build_followup_messages(ChatMessage::history(history), distressed),
            mode: GenerationMode::Streaming,
        };
        (request, distressed)
    }

    /// Send the request and hand back the fragments as they arrive.
    ///
    /// A backend that answers with one complete block is viewed as a single fragment.
    pub fn open(&self, history: &[Turn], user_text: &str) -> Result<FollowUpStream<'a>, BackendError> {
        let (request, distressed) = Self::build_request(history, user_text);
        if distressed {
            tracing::info!("Distress detected, acknowledgement preamble added");
        }
        let reply = self.backend.invoke(&request)?;
        Ok(FollowUpStream {
            fragments: reply.into_fragments(),
            distressed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::backend::{ChatRole, MockBackend, MockReply};
    use crate::pipeline::followup::DISTRESS_PREAMBLE;

    fn history(question: &str) -> Vec<Turn> {
        vec![
            Turn::user("Hemoglobin 11.8 (L)", Some("labs.txt".into())),
            Turn::assistant("Your hemoglobin is a little low."),
            Turn::user(question, None),
        ]
    }

    #[test]
    fn calm_question_is_sent_as_history() {
        let (request, distressed) =
            FollowUpEngine::<MockBackend>::build_request(&history("What is hemoglobin?"), "What is hemoglobin?");
        assert!(!distressed);
        assert_eq!(request.mode, GenerationMode::Streaming);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].content, "Hemoglobin 11.8 (L)");
    }

    #[test]
    fn distressed_question_gets_preamble_in_front() {
        let text = "I'm really scared about what this means";
        let (request, distressed) = FollowUpEngine::<MockBackend>::build_request(&history(text), text);
        assert!(distressed);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.messages[0].content, DISTRESS_PREAMBLE);
        assert_eq!(request.messages.last().map(|m| m.content.as_str()), Some(text));
    }

    #[test]
    fn open_streams_fragments_in_order() {
        let backend = MockBackend::new().with_reply(MockReply::Fragments(vec![
            Ok("It ".into()),
            Ok("carries ".into()),
            Ok("oxygen.".into()),
        ]));
        let engine = FollowUpEngine::new(&backend);
        let stream = engine.open(&history("What is hemoglobin?"), "What is hemoglobin?").unwrap();
        let text: Result<String, _> = stream.fragments.collect();
        assert_eq!(text.unwrap(), "It carries oxygen.");
    }

    #[test]
    fn complete_reply_is_one_fragment() {
        let backend = MockBackend::new().with_reply(MockReply::Complete("Whole answer.".into()));
        let engine = FollowUpEngine::new(&backend);
        let stream = engine.open(&history("why?"), "why?").unwrap();
        assert_eq!(stream.fragments.count(), 1);
    }

    #[test]
    fn call_failure_propagates() {
        let backend = MockBackend::new()
            .with_reply(MockReply::Fail(BackendError::Connection("http://localhost:11434".into())));
        let engine = FollowUpEngine::new(&backend);
        assert!(matches!(
            engine.open(&history("why?"), "why?"),
            Err(BackendError::Connection(_))
        ));
    }
}
