use ratatui::prelude::*;

use super::highlight::highlight_code;
use super::theme;

/// Render a whole markdown document: fenced code blocks are syntax
/// highlighted with `code_theme`, pipe tables are aligned, everything else
/// is parsed line by line.
pub fn render_markdown(text: &str, code_theme: &str) -> Vec<Line<'static>> {
    let mut out: Vec<Line<'static>> = Vec::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();

        if let Some(tag) = trimmed.strip_prefix("```") {
            let lang = tag.trim().to_string();
            let mut code = String::new();
            for inner in lines.by_ref() {
                if inner.trim_start().starts_with("```") {
                    break;
                }
                code.push_str(inner);
                code.push('\n');
            }
            out.push(Line::from(Span::styled(
                format!("─── {} ", if lang.is_empty() { "code" } else { lang.as_str() }),
                Style::default().fg(theme::BORDER),
            )));
            for row in highlight_code(&lang, &code, code_theme) {
                let spans: Vec<Span<'static>> =
                    row.into_iter().map(|(color, t)| Span::styled(t, Style::default().fg(color))).collect();
                out.push(Line::from(spans));
            }
            continue;
        }

        if trimmed.starts_with('|') {
            let mut table = vec![line];
            while let Some(&next) = lines.peek() {
                if !next.trim_start().starts_with('|') {
                    break;
                }
                table.push(next);
                lines.next();
            }
            out.extend(render_markdown_table(&table).into_iter().map(Line::from));
            continue;
        }

        out.push(Line::from(parse_markdown_line(line, Style::default())));
    }

    out
}

/// Display width of text after stripping markdown markers
fn markdown_display_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '`' => {
                while let Some(&next) = chars.peek() {
                    if next == '`' {
                        chars.next();
                        break;
                    }
                    width += 1;
                    chars.next();
                }
            }
            '*' | '_' => {
                if chars.peek() == Some(&c) {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == c && chars.peek() == Some(&c) {
                            chars.next();
                            break;
                        }
                        width += 1;
                    }
                } else {
                    for next in chars.by_ref() {
                        if next == c {
                            break;
                        }
                        width += 1;
                    }
                }
            }
            _ => width += 1,
        }
    }

    width
}

/// Render a markdown table with aligned columns
pub fn render_markdown_table(lines: &[&str]) -> Vec<Vec<Span<'static>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut is_separator_row: Vec<bool> = Vec::new();

    for line in lines {
        let inner = line.trim().trim_start_matches('|').trim_end_matches('|');
        let cells: Vec<String> = inner.split('|').map(|c| c.trim().to_string()).collect();

        // Separator rows contain only dashes and colons
        let is_sep = cells.iter().all(|c| c.chars().all(|ch| ch == '-' || ch == ':' || ch == ' '));

        is_separator_row.push(is_sep);
        rows.push(cells);
    }

    let num_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut col_widths: Vec<usize> = vec![0; num_cols];

    for (i, row) in rows.iter().enumerate() {
        if is_separator_row[i] {
            continue;
        }
        for (col, cell) in row.iter().enumerate() {
            col_widths[col] = col_widths[col].max(markdown_display_width(cell));
        }
    }

    let border = Style::default().fg(theme::BORDER);
    let mut result: Vec<Vec<Span<'static>>> = Vec::new();

    for (row_idx, row) in rows.iter().enumerate() {
        let mut spans: Vec<Span<'static>> = Vec::new();
        if is_separator_row[row_idx] {
            for (col, width) in col_widths.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::styled("─┼─", border));
                }
                spans.push(Span::styled("─".repeat(*width), border));
            }
        } else {
            let is_header = row_idx == 0;
            for (col, width) in col_widths.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::styled(" │ ", border));
                }

                let cell = row.get(col).map(|s| s.as_str()).unwrap_or("");
                let padding_needed = width.saturating_sub(markdown_display_width(cell));

                if is_header {
                    spans.push(Span::styled(cell.to_string(), Style::default().fg(theme::ACCENT).bold()));
                } else {
                    spans.extend(parse_inline_markdown(cell));
                }

                if padding_needed > 0 {
                    spans.push(Span::raw(" ".repeat(padding_needed)));
                }
            }
        }
        result.push(spans);
    }

    result
}

/// Parse one markdown line into styled spans
pub fn parse_markdown_line(line: &str, base_style: Style) -> Vec<Span<'static>> {
    let trimmed = line.trim_start();

    // Headers: # ## ### etc.
    if trimmed.starts_with('#') {
        let level = trimmed.chars().take_while(|&c| c == '#').count();
        let content = trimmed[level..].trim_start();

        let style = match level {
            1 => Style::default().fg(theme::ACCENT).bold(),
            2 => Style::default().fg(theme::ACCENT),
            3 => Style::default().fg(theme::ACCENT).italic(),
            _ => Style::default().fg(theme::TEXT_SECONDARY).italic(),
        };

        return vec![Span::styled(content.to_string(), style)];
    }

    let bullet = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* "));
    if let Some(content) = bullet {
        let indent = line.len() - trimmed.len();
        let mut spans = vec![
            Span::styled(" ".repeat(indent), base_style),
            Span::styled("• ", Style::default().fg(theme::ACCENT_DIM)),
        ];
        spans.extend(parse_inline_markdown(content));
        return spans;
    }

    parse_inline_markdown(line)
}

/// Parse inline markdown (bold, italic, code, links)
pub fn parse_inline_markdown(text: &str) -> Vec<Span<'static>> {
    let plain = Style::default().fg(theme::TEXT);
    let mut spans = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current = String::new();

    while let Some(c) = chars.next() {
        match c {
            '`' => {
                if !current.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut current), plain));
                }

                let mut code = String::new();
                while let Some(next) = chars.next_if(|&n| n != '`') {
                    code.push(next);
                }
                chars.next();

                if !code.is_empty() {
                    spans.push(Span::styled(code, Style::default().fg(theme::CODE)));
                }
            }
            '*' | '_' => {
                let is_double = chars.peek() == Some(&c);

                if is_double {
                    chars.next();

                    if !current.is_empty() {
                        spans.push(Span::styled(std::mem::take(&mut current), plain));
                    }

                    let mut bold_text = String::new();
                    while let Some(next) = chars.next() {
                        if next == c && chars.peek() == Some(&c) {
                            chars.next();
                            break;
                        }
                        bold_text.push(next);
                    }

                    if !bold_text.is_empty() {
                        spans.push(Span::styled(bold_text, plain.bold()));
                    }
                } else {
                    let mut italic_text = String::new();
                    let mut found_close = false;
                    for next in chars.by_ref() {
                        if next == c {
                            found_close = true;
                            break;
                        }
                        italic_text.push(next);
                    }

                    if found_close && !italic_text.is_empty() {
                        if !current.is_empty() {
                            spans.push(Span::styled(std::mem::take(&mut current), plain));
                        }
                        spans.push(Span::styled(italic_text, plain.italic()));
                    } else {
                        // Not actually italic (snake_case, lone asterisk)
                        current.push(c);
                        current.push_str(&italic_text);
                        if found_close {
                            current.push(c);
                        }
                    }
                }
            }
            '[' => {
                let mut link_text = String::new();
                let mut found_bracket = false;

                for next in chars.by_ref() {
                    if next == ']' {
                        found_bracket = true;
                        break;
                    }
                    link_text.push(next);
                }

                if found_bracket && chars.peek() == Some(&'(') {
                    chars.next();
                    for next in chars.by_ref() {
                        if next == ')' {
                            break;
                        }
                    }
                    if !current.is_empty() {
                        spans.push(Span::styled(std::mem::take(&mut current), plain));
                    }
                    spans.push(Span::styled(link_text, Style::default().fg(theme::ACCENT).underlined()));
                } else {
                    current.push('[');
                    current.push_str(&link_text);
                    if found_bracket {
                        current.push(']');
                    }
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        spans.push(Span::styled(current, plain));
    }

    if spans.is_empty() {
        spans.push(Span::raw(""));
    }

    spans
}
