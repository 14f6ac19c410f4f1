//! Attachment ingestion: files, directories and web pages are wrapped in
//! the `---` header convention the history scanner recognizes.

mod files;
mod restricted;
mod web;

use std::fmt;
use std::io;
use std::path::PathBuf;

pub use files::{resolve_path, wrap_path};
pub use restricted::is_restricted;
pub use web::{fetch_page, html_to_text, wrap_page};

#[derive(Debug)]
pub enum IngestError {
    NotFound(PathBuf),
    /// Restricted extension (binary, media, archive ...)
    Unsupported(String),
    /// Nothing readable to attach
    Empty,
    Io(String),
    Fetch(String),
}

impl IngestError {
    /// Skips are reported quietly rather than as an error panel.
    pub fn is_skip(&self) -> bool {
        matches!(self, IngestError::Unsupported(_) | IngestError::Empty)
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::NotFound(path) => write!(f, "No such file or directory: {}", path.display()),
            IngestError::Unsupported(name) => write!(f, "Unsupported file type: {}", name),
            IngestError::Empty => write!(f, "Source is empty"),
            IngestError::Io(msg) => write!(f, "I/O error: {}", msg),
            IngestError::Fetch(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<io::Error> for IngestError {
    fn from(e: io::Error) -> Self {
        IngestError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        IngestError::Fetch(e.to_string())
    }
}

/// A wrapped attachment ready to append to history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapped {
    /// Name used for replacement matching (base name or URL)
    pub name: String,
    pub text: String,
}
