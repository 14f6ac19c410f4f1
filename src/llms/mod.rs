//! Completion transport.
//!
//! A client streams one completion on a worker thread and forwards fragments
//! over a channel; the stream engine drains that channel.

pub mod error;
pub mod openai_compat;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use sage_base::state::Message;

pub use error::LlmError;

/// One incremental unit of a streamed completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub reasoning: Option<String>,
    pub content: Option<String>,
}

impl Fragment {
    pub fn reasoning(text: &str) -> Self {
        Self { reasoning: Some(text.to_string()), content: None }
    }

    pub fn content(text: &str) -> Self {
        Self { reasoning: None, content: Some(text.to_string()) }
    }
}

/// Events emitted during streaming
#[derive(Debug)]
pub enum StreamEvent {
    Fragment(Fragment),
    /// Stream completed normally
    Done,
    Error(LlmError),
}

/// Everything needed to open one completion stream.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub model: String,
    pub endpoint: String,
    pub messages: Vec<Message>,
}

/// Opens a fragment stream for a request.
pub trait Transport {
    fn open(&self, request: TurnRequest) -> Result<Receiver<StreamEvent>, LlmError>;
}

/// Trait for completion providers
pub trait LlmClient: Send + Sync {
    /// Stream a response, sending fragments and a final `Done` to `tx`.
    fn stream(&self, request: TurnRequest, tx: Sender<StreamEvent>) -> Result<(), LlmError>;
}

/// Runs a client on a background thread per turn.
pub struct ThreadedTransport {
    client: Arc<dyn LlmClient>,
}

impl ThreadedTransport {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

impl Transport for ThreadedTransport {
    fn open(&self, request: TurnRequest) -> Result<Receiver<StreamEvent>, LlmError> {
        let (tx, rx) = mpsc::channel();
        let client = Arc::clone(&self.client);

        std::thread::spawn(move || {
            if let Err(e) = client.stream(request, tx.clone()) {
                let _ = tx.send(StreamEvent::Error(e));
            }
        });
        Ok(rx)
    }
}
