//! Inline terminal output: static panels go into scrollback with
//! `insert_before`, the live turn is drawn in an inline viewport.

use std::io::{self, Stdout, stdout};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};
use ratatui::prelude::*;
use ratatui::{TerminalOptions, Viewport};

use super::panels::{self, Panel};
use super::{PanelKind, Renderer, StatusLine};
use crate::constants::AWAITING_MESSAGE;

type Term = Terminal<CrosstermBackend<Stdout>>;

fn inline_terminal(height: u16) -> io::Result<Term> {
    Terminal::with_options(CrosstermBackend::new(stdout()), TerminalOptions { viewport: Viewport::Inline(height) })
}

/// Live region state for one turn.
struct Live {
    terminal: Term,
    /// Spinner frame while no fragment has arrived
    waiting: Option<usize>,
    reasoning: Option<String>,
    response: Option<String>,
}

impl Live {
    fn slot(&mut self, kind: PanelKind) -> &mut Option<String> {
        match kind {
            PanelKind::Reasoning => &mut self.reasoning,
            PanelKind::Response => &mut self.response,
        }
    }

    fn visible(&self, code_theme: &str) -> Vec<Panel> {
        let mut out = Vec::new();
        if let Some(text) = &self.reasoning {
            out.push(panels::live(PanelKind::Reasoning, text, code_theme));
        }
        if let Some(text) = &self.response {
            out.push(panels::live(PanelKind::Response, text, code_theme));
        }
        out
    }

    fn draw(&mut self, code_theme: &str) -> io::Result<()> {
        let visible = self.visible(code_theme);
        let waiting = self.waiting;
        self.terminal.draw(|frame| {
            let area = frame.area();
            if let Some(tick) = waiting {
                let row = Rect { height: area.height.min(1), ..area };
                panels::waiting(tick, AWAITING_MESSAGE).render(row, frame.buffer_mut());
                return;
            }
            let mut remaining = area;
            let count = visible.len();
            for (i, panel) in visible.iter().enumerate() {
                if remaining.height == 0 {
                    break;
                }
                let wanted = panel.height(remaining.width).min(u16::MAX as usize) as u16;
                // Earlier panels may use at most half of what is left
                let cap = if i + 1 < count { remaining.height / 2 } else { remaining.height };
                let height = wanted.min(cap).max(1);
                let slot = Rect { height, ..remaining };
                panel.render_tail(slot, frame.buffer_mut());
                remaining.y += height;
                remaining.height -= height;
            }
        })?;
        Ok(())
    }
}

/// Terminal front end. Every method swallows terminal errors.
pub struct Console {
    code_theme: String,
    live: Option<Live>,
}

impl Console {
    pub fn new(code_theme: &str) -> Self {
        Self { code_theme: code_theme.to_string(), live: None }
    }

    pub fn set_code_theme(&mut self, name: &str) {
        self.code_theme = name.to_string();
    }

    pub fn code_theme(&self) -> &str {
        &self.code_theme
    }

    /// Terminal height in rows, or 24 when it cannot be queried.
    pub fn height(&self) -> u16 {
        terminal::size().map(|(_, h)| h).unwrap_or(24)
    }

    /// Print a panel into scrollback.
    pub fn print(&mut self, panel: &Panel) {
        let _ = Self::insert(panel);
    }

    fn insert(panel: &Panel) -> io::Result<()> {
        let mut terminal = inline_terminal(1)?;
        let width = terminal.size()?.width.max(1);
        let height = panel.height(width).min(u16::MAX as usize) as u16;
        if height > 0 {
            terminal.insert_before(height, |buf| panel.render(buf.area, buf))?;
        }
        terminal.clear()
    }

    pub fn clear_screen(&mut self) {
        let _ = execute!(stdout(), Clear(ClearType::All), Clear(ClearType::Purge), MoveTo(0, 0));
    }

    fn redraw(&mut self) {
        if let Some(live) = self.live.as_mut() {
            let _ = live.draw(&self.code_theme);
        }
    }
}

impl Renderer for Console {
    fn begin_live(&mut self) {
        let rows = self.height().saturating_sub(1).max(3);
        self.live = inline_terminal(rows)
            .ok()
            .map(|terminal| Live { terminal, waiting: None, reasoning: None, response: None });
    }

    fn show_waiting(&mut self) {
        if let Some(live) = self.live.as_mut() {
            live.waiting = Some(0);
        }
        self.redraw();
    }

    fn clear_waiting(&mut self) {
        if let Some(live) = self.live.as_mut() {
            live.waiting = None;
        }
        self.redraw();
    }

    fn show_panel(&mut self, kind: PanelKind) {
        if let Some(live) = self.live.as_mut() {
            live.slot(kind).get_or_insert_with(String::new);
        }
    }

    fn update_text(&mut self, kind: PanelKind, text: &str) {
        if let Some(live) = self.live.as_mut()
            && let Some(slot) = live.slot(kind)
        {
            slot.clear();
            slot.push_str(text);
        }
    }

    fn hide_panels(&mut self) {
        if let Some(live) = self.live.as_mut() {
            live.reasoning = None;
            live.response = None;
        }
        self.redraw();
    }

    fn refresh(&mut self) {
        if let Some(live) = self.live.as_mut()
            && let Some(tick) = live.waiting.as_mut()
        {
            *tick += 1;
        }
        self.redraw();
    }

    fn end_live(&mut self, keep: bool) {
        let Some(mut live) = self.live.take() else { return };
        let _ = live.terminal.clear();
        let finals = if keep { live.visible(&self.code_theme) } else { Vec::new() };
        drop(live);
        for panel in &finals {
            self.print(panel);
        }
    }

    fn show_status(&mut self, status: &StatusLine) {
        self.print(&panels::status(status));
    }

    fn show_error(&mut self, title: &str, detail: &str) {
        self.print(&panels::error(title, detail));
    }
}
