use std::io::{BufRead, BufReader};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{BackendReply, ChatMessage, ChatRole, GenerationMode, GenerationRequest};
use super::{BackendError, GenerationBackend};
use crate::config::BackendConfig;

/// Ollama HTTP client speaking `/api/chat`.
pub struct OllamaBackend {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    request_timeout_secs: u64,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        // No client-wide timeout: a follow-up stream may legitimately run for minutes.
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| BackendError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
            request_timeout_secs: config.request_timeout_secs,
        })
    }

    /// Backend configured from `CARECARDS_*` environment variables.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(&BackendConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            BackendError::HttpClient(format!(
                "Request timed out after {}s",
                self.request_timeout_secs
            ))
        } else {
            BackendError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/chat
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

impl<'a> OllamaChatRequest<'a> {
    fn from_request(model: &'a str, request: &GenerationRequest) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatMessage {
            role: ChatRole::System,
            content: request.system_instruction.clone(),
        });
        messages.extend(request.messages.iter().cloned());

        let structured = request.mode == GenerationMode::Structured;
        Self {
            model,
            messages,
            stream: !structured,
            format: structured.then_some("json"),
        }
    }
}

/// Non-streaming response body (and each NDJSON line when streaming).
#[derive(Deserialize)]
struct OllamaChatChunk {
    #[serde(default)]
    message: Option<OllamaChatMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    #[serde(default)]
    content: String,
}

impl GenerationBackend for OllamaBackend {
    fn invoke(&self, request: &GenerationRequest) -> Result<BackendReply<'_>, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest::from_request(&self.model, request);

        let mut builder = self.client.post(&url).json(&body);
        if request.mode == GenerationMode::Structured {
            builder = builder.timeout(Duration::from_secs(self.request_timeout_secs));
        }

        tracing::debug!(
            mode = ?request.mode,
            messages = body.messages.len(),
            model = %self.model,
            "Sending generation request"
        );

        let response = builder.send().map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match request.mode {
            GenerationMode::Structured => {
                let parsed: OllamaChatChunk = response
                    .json()
                    .map_err(|e| BackendError::ResponseParsing(e.to_string()))?;
                if let Some(error) = parsed.error {
                    return Err(BackendError::ResponseParsing(error));
                }
                let content = parsed.message.map(|m| m.content).unwrap_or_default();
                Ok(BackendReply::Complete(content))
            }
            GenerationMode::Streaming => Ok(BackendReply::Fragments(Box::new(
                NdjsonFragments::new(BufReader::new(response)),
            ))),
        }
    }
}

/// Lazily reads Ollama's NDJSON stream, one content fragment per line.
pub struct NdjsonFragments<R: BufRead> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> NdjsonFragments<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }

    fn fail(&mut self, error: BackendError) -> Option<Result<String, BackendError>> {
        self.finished = true;
        Some(Err(error))
    }
}

impl<R: BufRead> Iterator for NdjsonFragments<R> {
    type Item = Result<String, BackendError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    return self.fail(BackendError::StreamRead(
                        "stream ended before completion".into(),
                    ))
                }
                Ok(_) => {}
                Err(e) => return self.fail(BackendError::StreamRead(e.to_string())),
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let chunk: OllamaChatChunk = match serde_json::from_str(line) {
                Ok(chunk) => chunk,
                Err(e) => return self.fail(BackendError::ResponseParsing(e.to_string())),
            };

            if let Some(error) = chunk.error {
                return self.fail(BackendError::StreamRead(error));
            }
            if chunk.done {
                self.finished = true;
            }

            let content = chunk.message.map(|m| m.content).unwrap_or_default();
            if !content.is_empty() {
                return Some(Ok(content));
            }
        }
    }
}
