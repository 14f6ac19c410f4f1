//! OpenAI-compatible chat completions client (llama.cpp, vLLM, LM Studio, ...).

use std::env;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::LlmError;
use super::{Fragment, LlmClient, StreamEvent, TurnRequest};
use crate::constants::{API_KEY_ENV, CHAT_COMPLETIONS_PATH, FALLBACK_API_KEY};
use sage_base::state::Message;

/// API key shared between the client and the `!key` command.
pub type ApiKey = Arc<SecretBox<String>>;

/// Read the key from `.env` / the environment.
pub fn key_from_env() -> Option<ApiKey> {
    dotenvy::dotenv().ok();
    env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()).map(|k| Arc::new(SecretBox::new(Box::new(k))))
}

pub fn wrap_key(key: String) -> ApiKey {
    Arc::new(SecretBox::new(Box::new(key)))
}

pub struct OpenAiCompatClient {
    api_key: Option<ApiKey>,
}

impl OpenAiCompatClient {
    pub fn new(api_key: Option<ApiKey>) -> Self {
        Self { api_key }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// `{endpoint}/chat/completions`, tolerating a trailing slash.
pub fn completions_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), CHAT_COMPLETIONS_PATH)
}

impl LlmClient for OpenAiCompatClient {
    fn stream(&self, request: TurnRequest, tx: Sender<StreamEvent>) -> Result<(), LlmError> {
        // Generations can run for minutes; only an interrupt ends a stalled stream
        let client = Client::builder().timeout(None::<Duration>).build()?;
        let body = ChatRequest { model: &request.model, messages: &request.messages, stream: true };

        let response = client
            .post(completions_url(&request.endpoint))
            .header(
                "Authorization",
                format!(
                    "Bearer {}",
                    self.api_key.as_ref().map(|k| k.expose_secret().as_str()).unwrap_or(FALLBACK_API_KEY)
                ),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().unwrap_or_default();
            if code == 401 || code == 403 {
                return Err(LlmError::Auth(body));
            }
            return Err(LlmError::Api { status: code, body });
        }

        let reader = BufReader::new(response);
        for line in reader.lines() {
            let line = line.map_err(|e| LlmError::StreamRead(e.to_string()))?;

            match parse_sse_line(&line)? {
                SseLine::Skip => continue,
                SseLine::Done => break,
                SseLine::Chunk(resp) => {
                    if let Some(err) = resp.error {
                        return Err(LlmError::Api { status: status.as_u16(), body: err.to_string() });
                    }
                    let Some(fragment) = resp.into_fragment() else { continue };
                    // Receiver gone means the turn was canceled
                    if tx.send(StreamEvent::Fragment(fragment)).is_err() {
                        return Ok(());
                    }
                }
            }
        }

        let _ = tx.send(StreamEvent::Done);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────────
// SSE stream parsing
// ───────────────────────────────────────────────────────────────────

/// Parsed SSE streaming response (OpenAI-compatible format).
#[derive(Debug, Deserialize)]
pub struct StreamResponse {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    pub delta: Option<StreamDelta>,
}

/// Delta fields; servers disagree on where reasoning goes.
#[derive(Debug, Default, Deserialize)]
pub struct StreamDelta {
    pub content: Option<String>,
    pub refusal: Option<String>,
    pub reasoning_content: Option<String>,
    pub reasoning: Option<String>,
    pub thinking: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|t| !t.is_empty())
}

impl StreamDelta {
    pub fn into_fragment(self) -> Fragment {
        let reasoning = non_empty(self.reasoning_content)
            .or_else(|| non_empty(self.reasoning))
            .or_else(|| non_empty(self.thinking));
        let content = non_empty(self.content).or_else(|| non_empty(self.refusal));
        Fragment { reasoning, content }
    }
}

impl StreamResponse {
    /// Fragment from the first choice. A chunk with a choice but no payload
    /// still yields an empty fragment so the first arrival is observed.
    pub fn into_fragment(self) -> Option<Fragment> {
        let choice = self.choices.into_iter().next()?;
        Some(choice.delta.unwrap_or_default().into_fragment())
    }
}

#[derive(Debug)]
pub enum SseLine {
    Skip,
    Done,
    Chunk(StreamResponse),
}

/// Classify a single SSE line.
pub fn parse_sse_line(line: &str) -> Result<SseLine, LlmError> {
    let Some(json_str) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let json_str = json_str.trim();
    if json_str.is_empty() {
        return Ok(SseLine::Skip);
    }
    if json_str == "[DONE]" {
        return Ok(SseLine::Done);
    }
    serde_json::from_str(json_str).map(SseLine::Chunk).map_err(|e| LlmError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(line: &str) -> StreamResponse {
        match parse_sse_line(line).unwrap() {
            SseLine::Chunk(c) => c,
            other => panic!("expected chunk, got {:?}", other),
        }
    }

    #[test]
    fn content_delta() {
        let f = chunk(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#).into_fragment().unwrap();
        assert_eq!(f, Fragment::content("Hi"));
    }

    #[test]
    fn reasoning_field_variants() {
        for field in ["reasoning_content", "reasoning", "thinking"] {
            let line = format!(r#"data: {{"choices":[{{"delta":{{"{}":"hmm"}}}}]}}"#, field);
            let f = chunk(&line).into_fragment().unwrap();
            assert_eq!(f.reasoning.as_deref(), Some("hmm"), "field {}", field);
            assert!(f.content.is_none());
        }
    }

    #[test]
    fn empty_strings_are_absent() {
        let f = chunk(r#"data: {"choices":[{"delta":{"content":"","reasoning_content":"","reasoning":"r"}}]}"#)
            .into_fragment()
            .unwrap();
        assert_eq!(f.reasoning.as_deref(), Some("r"));
        assert!(f.content.is_none());
    }

    #[test]
    fn refusal_counts_as_content() {
        let f = chunk(r#"data: {"choices":[{"delta":{"refusal":"no"}}]}"#).into_fragment().unwrap();
        assert_eq!(f.content.as_deref(), Some("no"));
    }

    #[test]
    fn role_only_chunk_is_empty_fragment() {
        let f = chunk(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#).into_fragment().unwrap();
        assert_eq!(f, Fragment::default());
    }

    #[test]
    fn usage_only_chunk_has_no_fragment() {
        assert!(chunk(r#"data: {"choices":[],"usage":{"prompt_tokens":3}}"#).into_fragment().is_none());
    }

    #[test]
    fn done_and_comments() {
        assert!(matches!(parse_sse_line("data: [DONE]").unwrap(), SseLine::Done));
        assert!(matches!(parse_sse_line(": keep-alive").unwrap(), SseLine::Skip));
        assert!(matches!(parse_sse_line("").unwrap(), SseLine::Skip));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(parse_sse_line("data: {nope"), Err(LlmError::Parse(_))));
    }

    #[test]
    fn error_payload_is_kept() {
        let c = chunk(r#"data: {"error":{"message":"context overflow"}}"#);
        assert!(c.error.is_some());
    }

    #[test]
    fn url_joins_endpoint() {
        assert_eq!(completions_url("http://localhost:8080/v1/"), "http://localhost:8080/v1/chat/completions");
        assert_eq!(completions_url("http://h/v1"), "http://h/v1/chat/completions");
    }
}
