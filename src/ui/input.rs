//! Raw-mode line editor and the streaming interrupt.

use std::io::{self, Write, stdout};
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::queue;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::constants::INPUT_HISTORY_LIMIT;
use crate::stream::Interrupt;

/// What a read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Esc pressed
    Escape,
    /// Ctrl+C or Ctrl+D on an empty line
    Interrupt,
}

/// Result of feeding one key to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    Continue,
    Submit,
    Escape,
    Interrupt,
    HistoryPrev,
    HistoryNext,
}

/// Editable line with a char cursor.
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl LineBuffer {
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set(&mut self, text: &str) {
        self.chars = text.chars().collect();
        self.cursor = self.chars.len();
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\r') {
            self.chars.insert(self.cursor, c);
            self.cursor += 1;
        }
    }

    pub fn apply(&mut self, key: KeyEvent) -> KeyResult {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                if self.chars.is_empty() {
                    return KeyResult::Interrupt;
                }
                self.set("");
            }
            KeyCode::Char('d') if ctrl => {
                if self.chars.is_empty() {
                    return KeyResult::Interrupt;
                }
                self.delete();
            }
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.chars.len(),
            KeyCode::Char('u') if ctrl => {
                self.chars.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char(c) if !ctrl => {
                self.chars.insert(self.cursor, c);
                self.cursor += 1;
            }
            KeyCode::Enter => return KeyResult::Submit,
            KeyCode::Esc => return KeyResult::Escape,
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.chars.remove(self.cursor);
                }
            }
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.chars.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.chars.len(),
            KeyCode::Up => return KeyResult::HistoryPrev,
            KeyCode::Down => return KeyResult::HistoryNext,
            _ => {}
        }
        KeyResult::Continue
    }

    fn delete(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    /// Visible slice and cursor column for a field `width` cells wide.
    /// Newlines show as `↵`.
    pub fn view(&self, width: usize) -> (String, usize) {
        let shown: Vec<char> = self.chars.iter().map(|&c| if c == '\n' { '↵' } else { c }).collect();
        let w = |c: &char| c.width().unwrap_or(0);

        // Scroll so the cursor stays inside the field
        let mut start = 0;
        while start < self.cursor && shown[start..self.cursor].iter().map(w).sum::<usize>() >= width.max(1) {
            start += 1;
        }

        let mut out = String::new();
        let mut used = 0;
        for c in &shown[start..] {
            let cw = w(c);
            if used + cw > width {
                break;
            }
            out.push(*c);
            used += cw;
        }
        let col = shown[start..self.cursor].iter().map(w).sum();
        (out, col)
    }
}

/// In-memory input history with up/down navigation.
#[derive(Debug, Default)]
pub struct InputHistory {
    entries: Vec<String>,
    /// Position while browsing; `None` means editing a fresh line
    index: Option<usize>,
    draft: String,
}

impl InputHistory {
    pub fn push(&mut self, line: &str) {
        if line.trim().is_empty() || self.entries.last().is_some_and(|l| l == line) {
            return;
        }
        self.entries.push(line.to_string());
        if self.entries.len() > INPUT_HISTORY_LIMIT {
            self.entries.remove(0);
        }
    }

    fn reset(&mut self) {
        self.index = None;
        self.draft.clear();
    }

    pub fn prev(&mut self, current: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let next = match self.index {
            None => {
                self.draft = current.to_string();
                self.entries.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.index = Some(next);
        self.entries.get(next).map(String::as_str)
    }

    pub fn next(&mut self) -> Option<&str> {
        let i = self.index?;
        if i + 1 < self.entries.len() {
            self.index = Some(i + 1);
            self.entries.get(i + 1).map(String::as_str)
        } else {
            self.index = None;
            Some(self.draft.as_str())
        }
    }
}

/// Reads lines from the terminal in raw mode.
#[derive(Debug, Default)]
pub struct LineEditor {
    history: InputHistory,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one line. Only lines read with `remember` enter the history.
    pub fn read_line(&mut self, prompt: &str, remember: bool) -> io::Result<ReadOutcome> {
        let mut buffer = LineBuffer::default();
        self.history.reset();
        render(prompt, &buffer)?;

        loop {
            let outcome = match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match buffer.apply(key) {
                    KeyResult::Continue => None,
                    KeyResult::Submit => Some(ReadOutcome::Line(buffer.text())),
                    KeyResult::Escape => Some(ReadOutcome::Escape),
                    KeyResult::Interrupt => Some(ReadOutcome::Interrupt),
                    KeyResult::HistoryPrev if remember => {
                        if let Some(line) = self.history.prev(&buffer.text()) {
                            buffer.set(line);
                        }
                        None
                    }
                    KeyResult::HistoryNext if remember => {
                        if let Some(line) = self.history.next() {
                            buffer.set(line);
                        }
                        None
                    }
                    _ => None,
                },
                Event::Paste(text) => {
                    buffer.insert_str(&text);
                    None
                }
                _ => None,
            };

            if let Some(outcome) = outcome {
                let mut out = stdout();
                queue!(out, Print("\r\n"))?;
                out.flush()?;
                if remember && let ReadOutcome::Line(line) = &outcome {
                    self.history.push(line);
                }
                return Ok(outcome);
            }
            render(prompt, &buffer)?;
        }
    }
}

fn render(prompt: &str, buffer: &LineBuffer) -> io::Result<()> {
    let width = terminal::size().map(|(w, _)| w as usize).unwrap_or(80);
    let prompt_width = prompt.width();
    let field = width.saturating_sub(prompt_width + 1);
    let (visible, col) = buffer.view(field);

    let mut out = stdout();
    queue!(
        out,
        MoveToColumn(0),
        Clear(ClearType::UntilNewLine),
        Print(prompt.cyan().bold()),
        Print(visible),
        MoveToColumn((prompt_width + col).min(u16::MAX as usize) as u16),
    )?;
    out.flush()
}

/// Ctrl+C or Esc pressed while a turn is streaming.
#[derive(Debug, Default)]
pub struct KeyInterrupt;

impl Interrupt for KeyInterrupt {
    fn interrupted(&mut self) -> bool {
        while let Ok(true) = event::poll(Duration::ZERO) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
                    if ctrl_c || key.code == KeyCode::Esc {
                        return true;
                    }
                }
                Ok(_) => {}
                Err(_) => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(b: &mut LineBuffer, s: &str) {
        for c in s.chars() {
            b.apply(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn editing_keys() {
        let mut b = LineBuffer::default();
        type_str(&mut b, "helo");
        b.apply(key(KeyCode::Left));
        type_str(&mut b, "l");
        assert_eq!(b.text(), "hello");
        b.apply(key(KeyCode::Home));
        b.apply(key(KeyCode::Delete));
        assert_eq!(b.text(), "ello");
        b.apply(key(KeyCode::End));
        b.apply(key(KeyCode::Backspace));
        assert_eq!(b.text(), "ell");
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn control_keys() {
        let mut b = LineBuffer::default();
        assert_eq!(b.apply(ctrl('d')), KeyResult::Interrupt);
        type_str(&mut b, "ab");
        b.apply(key(KeyCode::Home));
        assert_eq!(b.apply(ctrl('d')), KeyResult::Continue);
        assert_eq!(b.text(), "b");
        assert_eq!(b.apply(ctrl('c')), KeyResult::Continue);
        assert_eq!(b.text(), "");
        assert_eq!(b.apply(ctrl('c')), KeyResult::Interrupt);
        assert_eq!(b.apply(key(KeyCode::Esc)), KeyResult::Escape);
        assert_eq!(b.apply(key(KeyCode::Enter)), KeyResult::Submit);
    }

    #[test]
    fn paste_keeps_newlines() {
        let mut b = LineBuffer::default();
        b.insert_str("a\r\nb");
        assert_eq!(b.text(), "a\nb");
        assert_eq!(b.view(10), ("a↵b".to_string(), 3));
    }

    #[test]
    fn view_scrolls_to_cursor() {
        let mut b = LineBuffer::default();
        b.set("abcdefghij");
        let (shown, col) = b.view(4);
        assert!(shown.ends_with('j') || col <= 4);
        assert!(col <= 4);
    }

    #[test]
    fn history_navigation() {
        let mut h = InputHistory::default();
        h.push("first");
        h.push("second");
        h.push("second");
        h.push("  ");
        assert_eq!(h.prev("draft"), Some("second"));
        assert_eq!(h.prev(""), Some("first"));
        assert_eq!(h.prev(""), Some("first"));
        assert_eq!(h.next(), Some("second"));
        assert_eq!(h.next(), Some("draft"));
        assert_eq!(h.next(), None);
    }
}
