use ratatui::prelude::Line;
use unicode_width::UnicodeWidthStr;

pub fn format_number(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Count how many rows a Line takes when wrapped to a given width
pub fn count_wrapped_lines(line: &Line, max_width: usize) -> usize {
    if max_width == 0 {
        return 1;
    }

    let full_text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
    if full_text.is_empty() {
        return 1;
    }

    // Simulate word wrapping
    let mut line_count = 1;
    let mut current_width = 0;

    for word in full_text.split_inclusive(|c: char| c.is_whitespace()) {
        let word_width = word.width();

        if current_width == 0 {
            current_width = word_width;
        } else if current_width + word_width <= max_width {
            current_width += word_width;
        } else {
            line_count += 1;
            current_width = word_width;
        }

        // Very long words break across rows
        while current_width > max_width {
            line_count += 1;
            current_width = current_width.saturating_sub(max_width);
        }
    }

    line_count
}

/// Total rows for a block of lines at `max_width`.
pub fn wrapped_height(lines: &[Line], max_width: usize) -> usize {
    lines.iter().map(|l| count_wrapped_lines(l, max_width)).sum()
}

/// Strip common leading whitespace from every non-blank line.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_long_words() {
        let line = Line::from("abcdefghij");
        assert_eq!(count_wrapped_lines(&line, 4), 3);
        assert_eq!(count_wrapped_lines(&Line::from(""), 10), 1);
    }

    #[test]
    fn wraps_on_words() {
        let line = Line::from("hello world again");
        assert_eq!(count_wrapped_lines(&line, 12), 2);
        assert_eq!(wrapped_height(&[line.clone(), Line::from("x")], 80), 2);
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(950), "950");
        assert_eq!(format_number(131_072), "131.1K");
    }

    #[test]
    fn dedent_common_indent() {
        assert_eq!(dedent("    fn a() {\n        b();\n    }"), "fn a() {\n    b();\n}");
        assert_eq!(dedent("x\n\n  y"), "x\n\n  y");
    }
}
