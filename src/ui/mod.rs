pub mod console;
pub mod helpers;
pub mod highlight;
pub mod input;
pub mod markdown;
pub mod panels;
pub mod theme;

use std::fmt;

use ratatui::style::Color;
use sage_base::state::HistoryStore;

use crate::constants::{CONTEXT_ALERT_PERCENT, CONTEXT_WARN_PERCENT};

pub use console::Console;

/// The two live panels of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Reasoning,
    Response,
}

/// Presentation boundary driven by the stream engine.
///
/// Implementations must not fail on any accepted input; terminal errors are
/// swallowed.
pub trait Renderer {
    /// Start a live region for one turn
    fn begin_live(&mut self);
    fn show_waiting(&mut self);
    fn clear_waiting(&mut self);
    fn show_panel(&mut self, kind: PanelKind);
    fn update_text(&mut self, kind: PanelKind, text: &str);
    fn hide_panels(&mut self);
    fn refresh(&mut self);
    /// Stop the live region. `keep` prints the final panels into scrollback.
    fn end_live(&mut self, keep: bool);
    fn show_status(&mut self, status: &StatusLine);
    fn show_error(&mut self, title: &str, detail: &str);
}

// ============================================================================
// Status line
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Low,
    Warn,
    Alert,
}

impl UsageLevel {
    pub fn color(&self) -> Color {
        match self {
            UsageLevel::Low => theme::MUTED,
            UsageLevel::Warn => theme::WARNING,
            UsageLevel::Alert => theme::ERROR,
        }
    }
}

/// `Context: X% | Turn: N | Tk/s: Y`
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub context_percent: f64,
    pub turns: usize,
    pub tokens_per_second: Option<f64>,
}

impl StatusLine {
    pub fn capture(history: &mut HistoryStore, context_length: usize, include_rate: bool) -> Self {
        let tokens = history.count_tokens();
        let raw = if context_length == 0 { 0.0 } else { tokens as f64 / context_length as f64 * 100.0 };
        Self {
            context_percent: (raw * 10.0).round() / 10.0,
            turns: history.turn_count(),
            tokens_per_second: if include_rate { history.throughput() } else { None },
        }
    }

    pub fn level(&self) -> UsageLevel {
        if self.context_percent >= CONTEXT_ALERT_PERCENT {
            UsageLevel::Alert
        } else if self.context_percent >= CONTEXT_WARN_PERCENT {
            UsageLevel::Warn
        } else {
            UsageLevel::Low
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context: {:.1}% | Turn: {}", self.context_percent, self.turns)?;
        if let Some(rate) = self.tokens_per_second {
            write!(f, " | Tk/s: {:.1}", rate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum RenderCommand {
        BeginLive,
        ShowWaiting,
        ClearWaiting,
        ShowPanel(PanelKind),
        UpdateText(PanelKind, String),
        HidePanels,
        Refresh,
        EndLive(bool),
        Status(StatusLine),
        Error(String, String),
    }

    /// Renderer that records every command for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingRenderer {
        pub commands: Vec<RenderCommand>,
    }

    impl RecordingRenderer {
        pub fn count(&self, pred: impl Fn(&RenderCommand) -> bool) -> usize {
            self.commands.iter().filter(|c| pred(c)).count()
        }

        pub fn position(&self, cmd: &RenderCommand) -> Option<usize> {
            self.commands.iter().position(|c| c == cmd)
        }

        /// Last text pushed to a panel.
        pub fn last_text(&self, kind: PanelKind) -> Option<&str> {
            self.commands.iter().rev().find_map(|c| match c {
                RenderCommand::UpdateText(k, t) if *k == kind => Some(t.as_str()),
                _ => None,
            })
        }
    }

    impl Renderer for RecordingRenderer {
        fn begin_live(&mut self) {
            self.commands.push(RenderCommand::BeginLive);
        }
        fn show_waiting(&mut self) {
            self.commands.push(RenderCommand::ShowWaiting);
        }
        fn clear_waiting(&mut self) {
            self.commands.push(RenderCommand::ClearWaiting);
        }
        fn show_panel(&mut self, kind: PanelKind) {
            self.commands.push(RenderCommand::ShowPanel(kind));
        }
        fn update_text(&mut self, kind: PanelKind, text: &str) {
            self.commands.push(RenderCommand::UpdateText(kind, text.to_string()));
        }
        fn hide_panels(&mut self) {
            self.commands.push(RenderCommand::HidePanels);
        }
        fn refresh(&mut self) {
            self.commands.push(RenderCommand::Refresh);
        }
        fn end_live(&mut self, keep: bool) {
            self.commands.push(RenderCommand::EndLive(keep));
        }
        fn show_status(&mut self, status: &StatusLine) {
            self.commands.push(RenderCommand::Status(status.clone()));
        }
        fn show_error(&mut self, title: &str, detail: &str) {
            self.commands.push(RenderCommand::Error(title.to_string(), detail.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_base::state::{CharEstimator, Role};

    #[test]
    fn status_text_and_levels() {
        let s = StatusLine { context_percent: 12.34, turns: 3, tokens_per_second: Some(41.26) };
        assert_eq!(s.to_string(), "Context: 12.3% | Turn: 3 | Tk/s: 41.3");
        assert_eq!(s.level(), UsageLevel::Low);

        let s = StatusLine { context_percent: 50.0, turns: 1, tokens_per_second: None };
        assert_eq!(s.to_string(), "Context: 50.0% | Turn: 1");
        assert_eq!(s.level(), UsageLevel::Warn);
        assert_eq!(StatusLine { context_percent: 80.0, ..s }.level(), UsageLevel::Alert);
    }

    #[test]
    fn capture_counts_turns_and_usage() {
        let mut h = HistoryStore::new("S", Box::new(CharEstimator));
        h.append(Role::User, "x".repeat(32));
        h.append(Role::Assistant, "ok");
        let s = StatusLine::capture(&mut h, 100, false);
        assert_eq!(s.turns, 1);
        // 1 + 10 + 1 tokens
        assert_eq!(s.context_percent, 12.0);
        assert!(s.tokens_per_second.is_none());
    }
}
