//! Incremental token accounting over the message history.
use std::fmt;

use sha2::{Digest, Sha256};

use super::message::Message;
use crate::config::constants::CHARS_PER_TOKEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeError(pub String);

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tokenize error: {}", self.0)
    }
}

impl std::error::Error for TokenizeError {}

/// Anything that can turn text into a token count.
pub trait Tokenizer {
    fn count(&self, text: &str) -> Result<usize, TokenizeError>;
}

/// Estimate tokens from byte length.
pub fn estimate_tokens(text: &str) -> usize {
    (text.len() as f32 / CHARS_PER_TOKEN).ceil() as usize
}

/// Character-ratio estimator; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimator;

impl Tokenizer for CharEstimator {
    fn count(&self, text: &str) -> Result<usize, TokenizeError> {
        Ok(estimate_tokens(text))
    }
}

/// Hash content for cheap change detection
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:064x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry {
    fingerprint: String,
    tokens: usize,
}

/// Per-message token cache, positionally aligned with the history.
///
/// A slot is re-tokenized only when it is empty or its fingerprint no longer
/// matches the message text.
#[derive(Debug, Default)]
pub struct TokenLedger {
    slots: Vec<Option<CacheEntry>>,
    /// Re-tokenizations performed by the most recent `count`
    recounted: usize,
    /// Token count of the last entry that had to be re-tokenized
    last_fresh: Option<usize>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total tokens across `messages`, reusing cached counts where possible.
    ///
    /// A tokenizer failure counts that entry as zero and is cached like any
    /// other result, so the same bad entry is not retried until it changes.
    pub fn count(&mut self, messages: &[Message], tokenizer: &dyn Tokenizer) -> usize {
        self.slots.resize(messages.len(), None);
        self.recounted = 0;

        let mut total = 0;
        for (slot, msg) in self.slots.iter_mut().zip(messages) {
            let text = msg.text();
            let fingerprint = hash_content(&text);
            match slot {
                Some(entry) if entry.fingerprint == fingerprint => total += entry.tokens,
                _ => {
                    let tokens = tokenizer.count(&text).unwrap_or(0);
                    *slot = Some(CacheEntry { fingerprint, tokens });
                    self.recounted += 1;
                    self.last_fresh = Some(tokens);
                    total += tokens;
                }
            }
        }
        total
    }

    /// Drop the slot at `index`, returning its cached count.
    pub fn remove(&mut self, index: usize) -> Option<usize> {
        if index >= self.slots.len() {
            return None;
        }
        self.slots.remove(index).map(|e| e.tokens)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.last_fresh = None;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn recounted(&self) -> usize {
        self.recounted
    }

    pub fn last_fresh(&self) -> Option<usize> {
        self.last_fresh
    }
}
