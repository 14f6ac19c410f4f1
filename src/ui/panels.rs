//! Static panel builders. Each returns a `Panel` the console prints into
//! scrollback (or tail-renders while a turn is live).

use std::path::Path;
use std::sync::LazyLock;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use serde::Deserialize;

use sage_base::config::{AppDirs, Config};

use super::helpers::{format_number, wrapped_height};
use super::markdown::{render_markdown, render_markdown_table};
use super::theme;
use super::{PanelKind, StatusLine};

// ============================================================================
// Panel
// ============================================================================

/// A titled block of lines framed by horizontal rules.
#[derive(Debug, Clone)]
pub struct Panel {
    pub title: String,
    pub color: Color,
    pub lines: Vec<Line<'static>>,
    /// Unframed panels print their lines bare
    pub framed: bool,
}

impl Panel {
    pub fn new(title: impl Into<String>, color: Color, lines: Vec<Line<'static>>) -> Self {
        Self { title: title.into(), color, lines, framed: true }
    }

    pub fn bare(lines: Vec<Line<'static>>) -> Self {
        Self { title: String::new(), color: theme::TEXT, lines, framed: false }
    }

    fn frame_rows(&self) -> usize {
        if self.framed { 2 } else { 0 }
    }

    /// Rows needed to show every line at `width`.
    pub fn height(&self, width: u16) -> usize {
        wrapped_height(&self.lines, width as usize) + self.frame_rows()
    }

    fn block(&self) -> Block<'static> {
        if !self.framed {
            return Block::new();
        }
        Block::new()
            .borders(Borders::TOP | Borders::BOTTOM)
            .border_style(Style::default().fg(self.color))
            .title(Span::styled(format!(" {} ", self.title), Style::default().fg(self.color).bold()))
    }

    /// Render the whole panel into `area`.
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines.clone()).block(self.block()).wrap(Wrap { trim: false }).render(area, buf);
    }

    /// Render anchored to the last line so the newest text stays visible.
    pub fn render_tail(&self, area: Rect, buf: &mut Buffer) {
        let inner = area.height.saturating_sub(self.frame_rows() as u16) as usize;
        let total = wrapped_height(&self.lines, area.width as usize);
        let scroll = total.saturating_sub(inner).min(u16::MAX as usize) as u16;
        Paragraph::new(self.lines.clone())
            .block(self.block())
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .render(area, buf);
    }
}

// ============================================================================
// Conversation panels
// ============================================================================

pub fn live(kind: PanelKind, text: &str, code_theme: &str) -> Panel {
    match kind {
        PanelKind::Reasoning => reasoning(text),
        PanelKind::Response => response(text, code_theme),
    }
}

pub fn reasoning(text: &str) -> Panel {
    let style = Style::default().fg(theme::TEXT_SECONDARY).italic();
    let lines = text.lines().map(|l| Line::from(Span::styled(l.to_string(), style))).collect();
    Panel::new("🧠 Reasoning", theme::REASONING, lines)
}

pub fn response(text: &str, code_theme: &str) -> Panel {
    Panel::new("💬 Response", theme::RESPONSE, render_markdown(text, code_theme))
}

pub fn user(text: &str) -> Panel {
    let lines = text.lines().map(|l| Line::from(l.to_string())).collect();
    Panel::new("🌐 You", theme::USER, lines)
}

pub fn waiting(frame: usize, message: &str) -> Panel {
    const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spin = SPINNER[frame % SPINNER.len()];
    Panel::bare(vec![Line::from(vec![
        Span::styled(format!("{} ", spin), Style::default().fg(theme::INTRO)),
        Span::styled(message.to_string(), Style::default().fg(theme::INTRO).bold()),
    ])])
}

pub fn error(title: &str, detail: &str) -> Panel {
    let lines = detail.lines().map(|l| Line::from(l.to_string())).collect();
    Panel::new(format!("❌ {}", title), theme::ERROR, lines)
}

pub fn status(status: &StatusLine) -> Panel {
    let dim = Style::default().fg(theme::MUTED);
    let mut spans = vec![
        Span::styled(" Context: ", dim),
        Span::styled(format!("{:.1}%", status.context_percent), Style::default().fg(status.level().color())),
        Span::styled(format!(" | Turn: {}", status.turns), dim),
    ];
    if let Some(rate) = status.tokens_per_second {
        spans.push(Span::styled(format!(" | Tk/s: {:.1}", rate), dim));
    }
    Panel::bare(vec![Line::from(spans), Line::default()])
}

pub fn copy(code: &str, code_theme: &str) -> Panel {
    let text = format!("### The following code is ready to copy\n```\n{}\n```", code);
    Panel::new("📋 Code Blocks", theme::COPY, render_markdown(&text, code_theme))
}

pub fn intro(config: &Config, cwd: &Path) -> Panel {
    let profile = config.active();
    let label = Style::default().fg(theme::ACCENT).bold();
    let row = |name: &str, value: String, style: Style| {
        Line::from(vec![Span::styled(format!("{}: ", name), label), Span::styled(value, style)])
    };
    let lines = vec![
        row("Model", profile.name, Style::default()),
        row("Profile", profile.alias, Style::default()),
        row("System Prompt", config.system_prompt.clone(), Style::default().italic()),
        row("Working Directory", cwd.display().to_string(), Style::default()),
    ];
    Panel::new(format!("🔮 Local Sage {}", env!("CARGO_PKG_VERSION")), theme::INTRO, lines)
}

// ============================================================================
// Messages
// ============================================================================

/// One-line notice in a single color.
pub fn notice(text: &str, color: Color) -> Panel {
    Panel::bare(vec![Line::from(Span::styled(text.to_string(), Style::default().fg(color))), Line::default()])
}

pub fn info(text: &str) -> Panel {
    notice(text, theme::MUTED)
}

pub fn success(text: &str) -> Panel {
    notice(text, theme::SUCCESS)
}

/// Heading followed by bullet items.
pub fn list(heading: &str, items: &[String]) -> Panel {
    let mut lines = vec![Line::from(Span::styled(heading.to_string(), Style::default().fg(theme::USER)))];
    for item in items {
        lines.push(Line::from(vec![
            Span::styled("• ", Style::default().fg(theme::ACCENT_DIM)),
            Span::styled(item.clone(), Style::default().fg(theme::TEXT)),
        ]));
    }
    lines.push(Line::default());
    Panel::bare(lines)
}

// ============================================================================
// Charts
// ============================================================================

#[derive(Debug, Deserialize)]
struct HelpChart {
    sections: Vec<HelpSection>,
    #[serde(default)]
    notes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HelpSection {
    title: String,
    subtitle: String,
    rows: Vec<(String, String)>,
}

fn parse_yaml<T: for<'de> Deserialize<'de>>(name: &str, content: &str) -> T {
    serde_yaml::from_str(content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

static HELP: LazyLock<HelpChart> =
    LazyLock::new(|| parse_yaml("help.yaml", include_str!("../../yamls/help.yaml")));

fn chart(header: (&str, &str), rows: &[(String, String)]) -> Vec<Line<'static>> {
    let mut table = vec![format!("| {} | {} |", header.0, header.1), "| --- | --- |".to_string()];
    table.extend(rows.iter().map(|(k, v)| format!("| `{}` | {} |", k, v)));
    let refs: Vec<&str> = table.iter().map(String::as_str).collect();
    let mut lines: Vec<Line<'static>> = render_markdown_table(&refs).into_iter().map(Line::from).collect();
    lines.push(Line::default());
    lines
}

pub fn help() -> Panel {
    let mut lines = Vec::new();
    for section in &HELP.sections {
        lines.extend(chart((&section.title, &section.subtitle), &section.rows));
    }
    for note in &HELP.notes {
        lines.push(Line::from(Span::styled(format!("• {}", note), Style::default().fg(theme::MUTED))));
    }
    lines.push(Line::default());
    Panel::bare(lines)
}

pub fn settings(config: &Config, dirs: &AppDirs, cwd: &Path) -> Panel {
    let profile = config.active();
    let rows: Vec<(String, String)> = vec![
        ("Profile".into(), profile.alias),
        ("Model Name".into(), profile.name),
        ("Endpoint".into(), profile.endpoint),
        ("System Prompt".into(), config.system_prompt.clone()),
        ("Context Length".into(), format_number(config.context_length)),
        ("Refresh Rate".into(), config.refresh_rate.to_string()),
        ("Code Theme".into(), config.code_theme.clone()),
        ("Reasoning Consume".into(), if config.reasoning_panel_consume { "on" } else { "off" }.into()),
    ];
    let mut lines = chart(("Current Settings", "Your current persistent settings"), &rows);
    for (label, path) in [
        ("Configuration file", dirs.settings_file()),
        ("Session files", dirs.sessions_dir.clone()),
        ("Error logs", dirs.logs_dir.clone()),
        ("Working directory", cwd.to_path_buf()),
    ] {
        let mut spans = vec![Span::styled(format!("• {}: ", label), Style::default().fg(theme::MUTED))];
        spans.push(Span::styled(path.display().to_string(), Style::default().fg(theme::CODE)));
        lines.push(Line::from(spans));
    }
    lines.push(Line::default());
    Panel::bare(lines)
}
