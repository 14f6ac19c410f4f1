use std::time::{Duration, Instant};

use crate::llms::Fragment;
use crate::ui::PanelKind;

/// Where a channel's panel is in its lifecycle for the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    /// No payload seen yet
    Absent,
    Visible,
    /// Collapsed by the consume policy
    Consumed,
}

/// One logical stream channel: pending fragments, flushed text, panel state.
#[derive(Debug)]
pub struct Channel {
    pub kind: PanelKind,
    buffer: Vec<String>,
    accumulated: String,
    pub phase: PanelPhase,
    /// Cleared once the panel outgrows the line limit; gates cadence renders only
    pub counting: bool,
}

impl Channel {
    fn new(kind: PanelKind) -> Self {
        Self { kind, buffer: Vec::new(), accumulated: String::new(), phase: PanelPhase::Absent, counting: true }
    }

    pub fn push(&mut self, text: String) {
        self.buffer.push(text);
    }

    /// Move buffered fragments into the accumulator, in arrival order.
    pub fn drain(&mut self) {
        for piece in self.buffer.drain(..) {
            self.accumulated.push_str(&piece);
        }
    }

    pub fn discard_buffer(&mut self) {
        self.buffer.clear();
    }

    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn is_visible(&self) -> bool {
        self.phase == PanelPhase::Visible
    }
}

/// Which channels a fragment carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classified {
    pub reasoning: bool,
    pub content: bool,
}

/// Per-turn mutable record. Built fresh for every turn and dropped at its end.
#[derive(Debug)]
pub struct TurnState {
    pub reasoning: Channel,
    pub response: Channel,
    /// Armed on the first fragment, not when the request is sent
    started: Option<Instant>,
    last_flush: Option<Instant>,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            reasoning: Channel::new(PanelKind::Reasoning),
            response: Channel::new(PanelKind::Response),
            started: None,
            last_flush: None,
        }
    }
}

impl TurnState {
    /// Buffer each non-empty payload of `fragment`.
    pub fn classify(&mut self, fragment: Fragment) -> Classified {
        let mut seen = Classified::default();
        if let Some(r) = fragment.reasoning.filter(|r| !r.is_empty()) {
            self.reasoning.push(r);
            seen.reasoning = true;
        }
        if let Some(c) = fragment.content.filter(|c| !c.is_empty()) {
            self.response.push(c);
            seen.content = true;
        }
        seen
    }

    pub fn has_started(&self) -> bool {
        self.started.is_some()
    }

    pub fn arm(&mut self, now: Instant) {
        self.started.get_or_insert(now);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// True when at least `interval` has passed since the last flush.
    /// The first check of a turn is always due.
    pub fn flush_due(&mut self, interval: Duration, now: Instant) -> bool {
        match self.last_flush {
            Some(last) if now.duration_since(last) < interval => false,
            _ => {
                self.last_flush = Some(now);
                true
            }
        }
    }

    /// Text committed to history for this turn.
    pub fn commit_text(&self) -> String {
        let reasoning = self.reasoning.text().trim();
        let response = self.response.text().trim();
        if reasoning.is_empty() {
            response.to_string()
        } else {
            format!("<think>\n{}\n</think>\n\n{}", reasoning, response)
        }
    }

    pub fn channels_mut(&mut self) -> [&mut Channel; 2] {
        [&mut self.reasoning, &mut self.response]
    }
}
