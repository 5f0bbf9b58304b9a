use std::collections::VecDeque;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use super::types::{BackendReply, GenerationRequest};
use super::{BackendError, GenerationBackend};

/// One scripted answer for `MockBackend`.
pub enum MockReply {
    /// Answer with a complete text block.
    Complete(String),
    /// Answer with these fragments, in order.
    Fragments(Vec<Result<String, BackendError>>),
    /// Answer with fragments pushed by another thread; the stream completes
    /// when the sender is dropped.
    Channel(Receiver<Result<String, BackendError>>),
    /// Fail the call itself.
    Fail(BackendError),
}

/// Mock generation backend for testing. Replays scripted replies in order
/// and records every request it receives.
pub struct MockBackend {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.push(reply);
        self
    }

    pub fn push(&self, reply: MockReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationBackend for MockBackend {
    fn invoke(&self, request: &GenerationRequest) -> Result<BackendReply<'_>, BackendError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .ok_or_else(|| BackendError::Connection("mock backend has no scripted reply".into()))?;

        match reply {
            MockReply::Complete(text) => Ok(BackendReply::Complete(text)),
            MockReply::Fragments(fragments) => {
                Ok(BackendReply::Fragments(Box::new(fragments.into_iter())))
            }
            MockReply::Channel(rx) => Ok(BackendReply::Fragments(Box::new(rx.into_iter()))),
            MockReply::Fail(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::backend::types::{ChatMessage, GenerationMode};

    fn request() -> GenerationRequest {
        GenerationRequest {
            system_instruction: "sys".into(),
            messages: vec![ChatMessage::user("hello")],
            mode: GenerationMode::Streaming,
        }
    }

    #[test]
    fn replays_in_order_and_records_requests() {
        let mock = MockBackend::new()
            .with_reply(MockReply::Complete("first".into()))
            .with_reply(MockReply::Fail(BackendError::HttpClient("boom".into())));

        let first = mock.invoke(&request()).unwrap().into_text().unwrap();
        assert_eq!(first, "first");
        assert!(mock.invoke(&request()).is_err());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.requests()[0].messages[0].content, "hello");
    }

    #[test]
    fn exhausted_script_fails_like_an_unreachable_backend() {
        let mock = MockBackend::new();
        assert!(matches!(
            mock.invoke(&request()),
            Err(BackendError::Connection(_))
        ));
    }

    #[test]
    fn channel_reply_streams_until_sender_drops() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mock = MockBackend::new().with_reply(MockReply::Channel(rx));
        tx.send(Ok("a".to_string())).unwrap();
        tx.send(Ok("b".to_string())).unwrap();
        drop(tx);
        let text = mock.invoke(&request()).unwrap().into_text().unwrap();
        assert_eq!(text, "ab");
    }
}
