use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment of structured content (`{"type": "text", "text": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default = "text_kind")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

fn text_kind() -> String {
    "text".to_string()
}

/// Message body: plain text, or a list of parts as some clients persist it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for Content {
    fn default() -> Self {
        Content::Text(String::new())
    }
}

impl Content {
    /// Textual segments joined together. Non-text parts contribute nothing.
    pub fn flatten(&self) -> Cow<'_, str> {
        match self {
            Content::Text(s) => Cow::Borrowed(s.as_str()),
            Content::Parts(parts) => Cow::Owned(parts.iter().map(|p| p.text.as_str()).collect()),
        }
    }

    /// Plain text content, if this is not structured.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            Content::Parts(_) => None,
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, deserialize_with = "nullable_content")]
    pub content: Content,
}

/// Persisted sessions may carry `"content": null`.
fn nullable_content<'de, D: Deserializer<'de>>(d: D) -> Result<Content, D::Error> {
    Ok(Option::<Content>::deserialize(d)?.unwrap_or_default())
}

impl Message {
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<Content>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<Content>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn text(&self) -> Cow<'_, str> {
        self.content.flatten()
    }
}

/// Test helpers for building Message instances with sensible defaults.
/// Not gated behind `#[cfg(test)]` so downstream crates can use them.
pub mod test_helpers {
    use super::*;

    pub struct MessageBuilder {
        msg: Message,
    }

    impl MessageBuilder {
        pub fn system(content: &str) -> Self {
            Self { msg: Message::system(content) }
        }

        pub fn user(content: &str) -> Self {
            Self { msg: Message::user(content) }
        }

        pub fn assistant(content: &str) -> Self {
            Self { msg: Message::assistant(content) }
        }

        /// Replace the body with structured text parts.
        pub fn parts(mut self, parts: &[&str]) -> Self {
            self.msg.content = Content::Parts(
                parts.iter().map(|t| ContentPart { kind: "text".into(), text: (*t).to_string() }).collect(),
            );
            self
        }

        pub fn build(self) -> Message {
            self.msg
        }
    }

    /// `[system(prompt), user(u1), assistant(a1), ...]` from alternating texts.
    pub fn conversation(system_prompt: &str, turns: &[&str]) -> Vec<Message> {
        let mut out = vec![Message::system(system_prompt)];
        for (i, t) in turns.iter().enumerate() {
            out.push(if i % 2 == 0 { Message::user(*t) } else { Message::assistant(*t) });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_helpers::MessageBuilder;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn parts_flatten_to_text() {
        let msg = MessageBuilder::user("").parts(&["alpha ", "beta"]).build();
        assert_eq!(msg.text(), "alpha beta");
        assert!(msg.content.as_text().is_none());
    }

    #[test]
    fn parts_round_trip_through_json() {
        let raw = r#"{"role":"user","content":[{"type":"text","text":"a"},{"type":"image_url"}]}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.text(), "a");
    }

    #[test]
    fn null_content_becomes_empty() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant","content":null}"#).unwrap();
        assert_eq!(msg.text(), "");
        let missing: Message = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(missing.text(), "");
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(serde_json::from_str::<Message>(r#"{"role":"tool","content":"x"}"#).is_err());
    }
}
