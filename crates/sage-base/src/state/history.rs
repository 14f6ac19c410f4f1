//! The authoritative conversation history and its token budget.
use std::path::PathBuf;
use std::time::Duration;

use super::attachments::{self, Attachment, AttachmentKind, RemoveOutcome};
use super::message::{Content, Message, Role};
use super::tokens::{TokenLedger, Tokenizer};
use crate::config::constants::SUMMARY_MARKER;
use crate::persistence::{SessionError, SessionStore, session_file_name};

/// Ordered messages; index 0 is always the active system prompt.
pub struct HistoryStore {
    messages: Vec<Message>,
    ledger: TokenLedger,
    tokenizer: Box<dyn Tokenizer>,
    /// Session file name this history was last saved to or loaded from
    active_session: Option<String>,
    /// Generation time of the most recent committed turn
    gen_time: Option<Duration>,
}

impl HistoryStore {
    pub fn new(system_prompt: &str, tokenizer: Box<dyn Tokenizer>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            ledger: TokenLedger::new(),
            tokenizer,
            active_session: None,
            gen_time: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append(&mut self, role: Role, content: impl Into<Content>) {
        self.messages.push(Message::new(role, content));
    }

    /// Remove the message at `index`. Out-of-range indices are a no-op.
    pub fn remove_at(&mut self, index: usize) -> Option<Message> {
        if index < self.messages.len() { Some(self.messages.remove(index)) } else { None }
    }

    pub fn reset(&mut self, system_prompt: &str) {
        self.messages = vec![Message::system(system_prompt)];
        self.ledger.clear();
        self.active_session = None;
    }

    /// Replace everything with a three-message seed carrying `summary`.
    pub fn reset_with_summary(&mut self, system_prompt: &str, summary: &str) {
        self.messages =
            vec![Message::system(system_prompt), Message::system(SUMMARY_MARKER), Message::assistant(summary)];
        self.ledger.clear();
        self.active_session = None;
    }

    /// Pop the final message if it is an unanswered user prompt.
    pub fn correct_last_user_turn(&mut self) -> bool {
        if self.messages.last().is_some_and(|m| m.role == Role::User) {
            self.messages.pop();
            return true;
        }
        false
    }

    /// Wire-format projection: empty non-system entries are dropped,
    /// consecutive user messages are merged with a blank line and
    /// `environment` is appended to the leading system message.
    pub fn processed_view(&self, environment: &str) -> Vec<Message> {
        let mut out: Vec<Message> = Vec::with_capacity(self.messages.len());
        for msg in &self.messages {
            if msg.role != Role::System && msg.text().trim().is_empty() {
                continue;
            }
            match out.last_mut() {
                Some(prev) if prev.role == Role::User && msg.role == Role::User => {
                    let merged = format!("{}\n\n{}", prev.text(), msg.text());
                    prev.content = Content::Text(merged);
                }
                _ => out.push(msg.clone()),
            }
        }

        if let Some(first) = out.first_mut()
            && first.role == Role::System
        {
            first.content = Content::Text(format!("{}\n\n{}", first.text(), environment));
        }
        out
    }

    /// Total tokens in the stored history.
    pub fn count_tokens(&mut self) -> usize {
        self.ledger.count(&self.messages, self.tokenizer.as_ref())
    }

    /// Re-tokenizations performed by the most recent count.
    pub fn recounted(&self) -> usize {
        self.ledger.recounted()
    }

    /// Tokens of a single text, as the history would count them.
    pub fn measure(&self, text: &str) -> usize {
        self.tokenizer.count(text).unwrap_or(0)
    }

    /// Evict the oldest non-system entries until the history fits
    /// `context_length * limit_fraction`. Returns how many were removed.
    pub fn trim_to_budget(&mut self, limit_fraction: f64, context_length: usize) -> usize {
        let limit = (context_length as f64 * limit_fraction) as usize;
        let mut tokens = self.count_tokens();
        let mut removed = 0;

        while tokens > limit && self.messages.len() > 1 {
            tokens = tokens.saturating_sub(self.ledger.remove(1).unwrap_or(0));
            self.messages.remove(1);
            removed += 1;
        }
        removed
    }

    /// Number of user turns.
    pub fn turn_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    pub fn last_assistant(&self) -> Option<&str> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant).and_then(|m| m.content.as_text())
    }

    pub fn record_generation(&mut self, elapsed: Duration) {
        self.gen_time = Some(elapsed);
    }

    /// Tokens per second of the newest counted entry over the last generation time.
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.gen_time?.as_secs_f64();
        let tokens = self.ledger.last_fresh()?;
        if secs > 0.0 && tokens > 0 { Some(tokens as f64 / secs) } else { None }
    }

    pub fn active_session(&self) -> Option<&str> {
        self.active_session.as_deref()
    }

    pub fn clear_active_session(&mut self) {
        self.active_session = None;
    }

    pub fn save_to_disk(&mut self, store: &SessionStore, name: &str) -> Result<PathBuf, SessionError> {
        let path = store.write(name, &self.messages)?;
        self.active_session = Some(session_file_name(name));
        Ok(path)
    }

    /// Replace the history with a saved session. On failure nothing changes.
    pub fn load_from_disk(&mut self, store: &SessionStore, name: &str) -> Result<PathBuf, SessionError> {
        let path = store.path_for(name)?;
        let messages = store.read(name)?;
        if messages.is_empty() {
            return Err(SessionError::Corrupted { path, reason: "empty session".into() });
        }
        self.messages = messages;
        self.ledger.clear();
        self.active_session = Some(session_file_name(name));
        Ok(path)
    }

    // ========================================================================
    // Attachments
    // ========================================================================

    pub fn attachments(&self) -> Vec<Attachment> {
        attachments::scan(&self.messages)
    }

    /// Append an attachment, replacing an earlier one with the same name.
    /// Returns true when an existing attachment was replaced.
    pub fn attach(&mut self, name: &str, wrapped: String) -> bool {
        let existing = self.attachments().into_iter().rev().find(|a| a.name == name);
        if let Some(old) = &existing {
            self.remove_at(old.index);
        }
        self.append(Role::User, wrapped);
        existing.is_some()
    }

    /// Remove the attachment stored at history `index`.
    pub fn remove_attachment(&mut self, index: usize) -> RemoveOutcome {
        let found = self.attachments();
        if found.is_empty() {
            return RemoveOutcome::Skipped;
        }
        match found.iter().find(|a| a.index == index) {
            Some(a) => {
                self.remove_at(a.index);
                RemoveOutcome::Removed(a.kind)
            }
            None => RemoveOutcome::NotFound,
        }
    }

    /// Remove every attachment, returning the kinds removed.
    pub fn purge_attachments(&mut self) -> Vec<AttachmentKind> {
        let found = self.attachments();
        for a in found.iter().rev() {
            self.remove_at(a.index);
        }
        found.into_iter().map(|a| a.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tokens::{CharEstimator, TokenizeError};
    use tempfile::TempDir;

    /// One token per whitespace-separated word.
    struct Words;

    impl Tokenizer for Words {
        fn count(&self, text: &str) -> Result<usize, TokenizeError> {
            Ok(text.split_whitespace().count())
        }
    }

    fn store(prompt: &str) -> HistoryStore {
        HistoryStore::new(prompt, Box::new(Words))
    }

    #[test]
    fn starts_with_system_prompt() {
        let h = store("S");
        assert_eq!(h.messages(), &[Message::system("S")]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut h = store("S");
        h.append(Role::User, "hi");
        assert!(h.remove_at(7).is_none());
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn reset_clears_session_identity() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::new(dir.path());
        let mut h = store("S");
        h.append(Role::User, "hi");
        h.save_to_disk(&sessions, "work").unwrap();
        assert_eq!(h.active_session(), Some("work.json"));

        h.reset("S2");
        assert_eq!(h.messages(), &[Message::system("S2")]);
        assert!(h.active_session().is_none());
    }

    #[test]
    fn summary_seed_has_three_messages() {
        let mut h = store("S");
        h.append(Role::User, "a");
        h.append(Role::Assistant, "b");
        h.reset_with_summary("S", "we did things");
        assert_eq!(
            h.messages(),
            &[Message::system("S"), Message::system(SUMMARY_MARKER), Message::assistant("we did things")]
        );
    }

    #[test]
    fn correct_pops_only_trailing_user() {
        let mut h = store("S");
        h.append(Role::User, "q");
        assert!(h.correct_last_user_turn());
        assert_eq!(h.len(), 1);
        assert!(!h.correct_last_user_turn());
        assert_eq!(h.len(), 1);

        h.append(Role::User, "q");
        h.append(Role::Assistant, "a");
        assert!(!h.correct_last_user_turn());
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn processed_view_merges_users_and_adds_environment() {
        let mut h = store("S");
        h.append(Role::User, "---\nFile: `a.txt`\n```\nA\n```\n---");
        h.append(Role::User, "what is in a.txt?");
        h.append(Role::Assistant, "A");
        h.append(Role::User, "thanks");

        let view = h.processed_view("[ENV]");
        assert_eq!(view.len(), 4);
        assert_eq!(view[0].text(), "S\n\n[ENV]");
        assert_eq!(view[1].text(), "---\nFile: `a.txt`\n```\nA\n```\n---\n\nwhat is in a.txt?");
        assert_eq!(view[3].text(), "thanks");
    }

    #[test]
    fn processed_view_drops_empty_entries() {
        let mut h = store("S");
        h.append(Role::User, "first");
        h.append(Role::Assistant, "");
        h.append(Role::User, "  \n");
        h.append(Role::User, "second");

        let view = h.processed_view("[ENV]");
        assert_eq!(view.len(), 2);
        assert!(view.iter().skip(1).all(|m| !m.text().trim().is_empty()));
        assert_eq!(view[1].text(), "first\n\nsecond");
        // Storage keeps every entry
        assert_eq!(h.len(), 5);
    }

    #[test]
    fn processed_view_keeps_empty_system_prompt() {
        let mut h = store("");
        h.append(Role::User, "hi");
        let view = h.processed_view("[ENV]");
        assert_eq!(view[0].role, Role::System);
        assert_eq!(view[0].text(), "\n\n[ENV]");
    }

    #[test]
    fn processed_view_does_not_mutate() {
        let mut h = store("S");
        h.append(Role::User, "a");
        h.append(Role::User, "b");
        let before = h.messages().to_vec();
        let _ = h.processed_view("[ENV]");
        assert_eq!(h.messages(), before.as_slice());
    }

    #[test]
    fn trim_keeps_head_and_fits_budget() {
        let mut h = store("system prompt here");
        for i in 0..10 {
            h.append(Role::User, format!("question number {} padded", i));
            h.append(Role::Assistant, format!("answer number {} padded out", i));
        }
        let removed = h.trim_to_budget(0.95, 40);
        assert!(removed > 0);
        assert_eq!(h.messages()[0], Message::system("system prompt here"));
        assert!(h.count_tokens() <= 38);
        assert_eq!(h.messages().last().unwrap().text(), "answer number 9 padded out");
    }

    #[test]
    fn trim_stops_at_single_message() {
        let mut h = store("a very long system prompt that alone exceeds the budget");
        h.append(Role::User, "hello there");
        h.trim_to_budget(0.95, 3);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn trim_under_budget_is_noop() {
        let mut h = store("S");
        h.append(Role::User, "hi");
        assert_eq!(h.trim_to_budget(0.95, 1000), 0);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn cache_stays_aligned_after_trim() {
        let mut h = store("S");
        for _ in 0..5 {
            h.append(Role::User, "one two three four");
        }
        h.trim_to_budget(0.5, 20);
        let incremental = h.count_tokens();
        let fresh = TokenLedger::new().count(h.messages(), &Words);
        assert_eq!(incremental, fresh);
    }

    #[test]
    fn second_count_retokenizes_nothing() {
        let mut h = HistoryStore::new("S", Box::new(CharEstimator));
        h.append(Role::User, "hello");
        let a = h.count_tokens();
        let b = h.count_tokens();
        assert_eq!(a, b);
        assert_eq!(h.recounted(), 0);
    }

    #[test]
    fn throughput_uses_newest_entry() {
        let mut h = store("S");
        h.append(Role::User, "q");
        h.count_tokens();
        h.append(Role::Assistant, "one two three four");
        h.record_generation(Duration::from_secs(2));
        h.count_tokens();
        assert_eq!(h.throughput(), Some(2.0));
    }

    #[test]
    fn turn_count_and_last_assistant() {
        let mut h = store("S");
        assert!(h.last_assistant().is_none());
        h.append(Role::User, "a");
        h.append(Role::Assistant, "first");
        h.append(Role::User, "b");
        h.append(Role::Assistant, "second");
        assert_eq!(h.turn_count(), 2);
        assert_eq!(h.last_assistant(), Some("second"));
    }

    #[test]
    fn failed_load_leaves_history_untouched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{oops").unwrap();
        let sessions = SessionStore::new(dir.path());
        let mut h = store("S");
        h.append(Role::User, "keep me");

        assert!(matches!(h.load_from_disk(&sessions, "bad"), Err(SessionError::Corrupted { .. })));
        assert!(matches!(h.load_from_disk(&sessions, "missing"), Err(SessionError::NotFound(_))));
        assert_eq!(h.len(), 2);
        assert!(h.active_session().is_none());
    }

    #[test]
    fn load_replaces_history() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::new(dir.path());
        let mut a = store("S");
        a.append(Role::User, "saved question");
        a.save_to_disk(&sessions, "one").unwrap();

        let mut b = store("other");
        b.load_from_disk(&sessions, "one.json").unwrap();
        assert_eq!(b.messages(), a.messages());
        assert_eq!(b.active_session(), Some("one.json"));
    }

    #[test]
    fn reattach_replaces_previous_copy() {
        let mut h = store("S");
        assert!(!h.attach("a.txt", "---\nFile: `a.txt`\n```\nv1\n```\n---".into()));
        h.append(Role::Assistant, "ok");
        assert!(h.attach("a.txt", "---\nFile: `a.txt`\n```\nv2\n```\n---".into()));

        let found = h.attachments();
        assert_eq!(found.len(), 1);
        assert!(h.messages()[found[0].index].text().contains("v2"));
    }

    #[test]
    fn remove_attachment_outcomes() {
        let mut h = store("S");
        assert_eq!(h.remove_attachment(1), RemoveOutcome::Skipped);

        h.attach("https://x.io", "---\nWebsite: `https://x.io`\nbody\n---".into());
        h.append(Role::User, "plain");
        assert_eq!(h.remove_attachment(2), RemoveOutcome::NotFound);
        assert_eq!(h.remove_attachment(1), RemoveOutcome::Removed(AttachmentKind::Website));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn purge_removes_every_attachment() {
        let mut h = store("S");
        h.attach("a", "---\nFile: `a`\n```\n\n```\n---".into());
        h.append(Role::User, "question");
        h.attach("d", "---\nDirectory: `d`\nFiles: ``\n\n\n---".into());
        let kinds = h.purge_attachments();
        assert_eq!(kinds, vec![AttachmentKind::File, AttachmentKind::Directory]);
        assert_eq!(h.messages().len(), 2);
        assert_eq!(h.messages()[1].text(), "question");
    }
}
