use std::fmt;

/// Typed error for streaming a completion.
#[derive(Debug)]
pub enum LlmError {
    /// Endpoint rejected the API key
    Auth(String),
    /// Network-level failure (DNS, connection, timeout)
    Network(String),
    /// API returned a non-success HTTP status or an error payload
    Api { status: u16, body: String },
    /// Error reading from the SSE stream
    StreamRead(String),
    /// Failed to parse response JSON
    Parse(String),
    /// The stream ended without a completion marker
    Disconnected,
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Auth(msg) => write!(f, "Auth error: {}", msg),
            LlmError::Network(msg) => write!(f, "Network error: {}", msg),
            LlmError::Api { status, body } => write!(f, "API error {}: {}", status, body),
            LlmError::StreamRead(msg) => write!(f, "Stream read error: {}", msg),
            LlmError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LlmError::Disconnected => write!(f, "Stream closed before completion"),
        }
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Network(e.to_string())
    }
}
