use std::sync::LazyLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use ratatui::style::Color;

use sage_base::config::constants::DEFAULT_CODE_THEME;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Lines of (color, text) runs
pub type Highlighted = Vec<Vec<(Color, String)>>;

/// Convert syntect color to ratatui color
fn to_ratatui_color(color: syntect::highlighting::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

pub fn theme_exists(name: &str) -> bool {
    THEME_SET.themes.contains_key(name)
}

/// Bundled theme names, sorted.
pub fn theme_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = THEME_SET.themes.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

/// Highlight a code block. `lang` is the fence tag (token or extension);
/// unknown languages fall back to plain text, unknown themes to the default.
pub fn highlight_code(lang: &str, code: &str, theme_name: &str) -> Highlighted {
    let syntax = SYNTAX_SET
        .find_syntax_by_token(lang)
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(lang))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

    let Some(theme) = THEME_SET.themes.get(theme_name).or_else(|| THEME_SET.themes.get(DEFAULT_CODE_THEME)) else {
        return code.lines().map(|l| vec![(Color::Reset, l.to_string())]).collect();
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut result = Vec::new();

    for line in LinesWithEndings::from(code) {
        let ranges: Vec<(Style, &str)> = highlighter.highlight_line(line, &SYNTAX_SET).unwrap_or_default();

        let spans: Vec<(Color, String)> = ranges
            .into_iter()
            .map(|(style, text)| (to_ratatui_color(style.foreground), text.trim_end_matches('\n').to_string()))
            .collect();

        result.push(spans);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_bundled() {
        assert!(theme_exists(DEFAULT_CODE_THEME));
        assert!(!theme_exists("no-such-theme"));
        assert!(theme_names().contains(&DEFAULT_CODE_THEME));
    }

    #[test]
    fn highlights_one_row_per_line() {
        let out = highlight_code("rust", "fn main() {\n    let x = 1;\n}\n", DEFAULT_CODE_THEME);
        assert_eq!(out.len(), 3);
        let first: String = out[0].iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(first, "fn main() {");
    }

    #[test]
    fn unknown_language_and_theme_still_render() {
        let out = highlight_code("klingon", "qapla'", "missing");
        let text: String = out[0].iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(text, "qapla'");
    }
}
