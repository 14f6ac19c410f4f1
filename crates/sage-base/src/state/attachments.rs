//! Attachment records recognized by their header convention inside user messages.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::message::{Message, Role};

static FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A---\nFile: `(.*?)`").expect("invalid FILE_PATTERN regex"));
static DIR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A---\nDirectory: `(.*?)`").expect("invalid DIR_PATTERN regex"));
static SITE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A---\nWebsite: `(.*?)`").expect("invalid SITE_PATTERN regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    File,
    Directory,
    Website,
}

impl AttachmentKind {
    pub fn label(&self) -> &'static str {
        match self {
            AttachmentKind::File => "File",
            AttachmentKind::Directory => "Directory",
            AttachmentKind::Website => "Website",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An attachment found at `index` in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub index: usize,
    pub kind: AttachmentKind,
    pub name: String,
}

/// Outcome of removing a single attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(AttachmentKind),
    /// No attachment lives at the requested index
    NotFound,
    /// The history holds no attachments at all
    Skipped,
}

/// Classify one message. Only plain-text user messages can be attachments.
pub fn classify(message: &Message) -> Option<(AttachmentKind, String)> {
    if message.role != Role::User {
        return None;
    }
    let text = message.content.as_text()?;
    let patterns: [(&Regex, AttachmentKind); 3] = [
        (&FILE_PATTERN, AttachmentKind::File),
        (&DIR_PATTERN, AttachmentKind::Directory),
        (&SITE_PATTERN, AttachmentKind::Website),
    ];
    patterns
        .iter()
        .find_map(|(re, kind)| re.captures(text).map(|c| (*kind, c[1].to_string())))
}

pub fn scan(messages: &[Message]) -> Vec<Attachment> {
    messages
        .iter()
        .enumerate()
        .filter_map(|(index, m)| classify(m).map(|(kind, name)| Attachment { index, kind, name }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_all_three_kinds() {
        let msgs = vec![
            Message::system("---\nFile: `ignored.txt`"),
            Message::user("---\nFile: `main.rs`\n```\nfn main() {}\n```\n---"),
            Message::user("---\nDirectory: `src`\nFiles: `a.rs`\n\n---"),
            Message::user("---\nWebsite: `https://example.com`\nhello\n---"),
            Message::user("just chatting"),
        ];
        let found = scan(&msgs);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], Attachment { index: 1, kind: AttachmentKind::File, name: "main.rs".into() });
        assert_eq!(found[1].kind, AttachmentKind::Directory);
        assert_eq!(found[2].name, "https://example.com");
    }

    #[test]
    fn header_must_open_the_message() {
        let msg = Message::user("see below\n---\nFile: `x.txt`");
        assert!(classify(&msg).is_none());
    }

    #[test]
    fn hand_edited_header_loses_identity() {
        let msg = Message::user("---\nFile: x.txt\n---");
        assert!(classify(&msg).is_none());
    }
}
