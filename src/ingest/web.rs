use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use super::{IngestError, Wrapped};
use crate::constants::{WEB_FETCH_TIMEOUT_SECS, WEB_USER_AGENT};

static DROPPED_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|head|svg)\b.*?</(script|style|noscript|head|svg)\s*>|<!--.*?-->")
        .expect("invalid DROPPED_BLOCKS regex")
});
static BLOCK_BREAKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?(p|div|h[1-6]|li|ul|ol|tr|table|section|article|pre|blockquote)\b[^>]*>")
        .expect("invalid BLOCK_BREAKS regex")
});
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid TAGS regex"));
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("invalid NUMERIC_ENTITY regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("invalid SPACES regex"));

fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse().ok(),
        };
        code.and_then(char::from_u32).map(String::from).unwrap_or_default()
    });
    // `&amp;` last so escaped entities stay literal
    numeric.replace("&amp;", "&")
}

/// Reduce an HTML document to readable text.
pub fn html_to_text(html: &str) -> String {
    let stripped = DROPPED_BLOCKS.replace_all(html, "");
    let broken = BLOCK_BREAKS.replace_all(&stripped, "\n");
    let plain = decode_entities(&TAGS.replace_all(&broken, ""));

    let mut out: Vec<String> = Vec::new();
    for line in plain.lines() {
        let line = SPACES.replace_all(line, " ").trim().to_string();
        if line.is_empty() && out.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Fetch `url` and return its readable text.
pub fn fetch_page(url: &str) -> Result<String, IngestError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(WEB_FETCH_TIMEOUT_SECS))
        .user_agent(WEB_USER_AGENT)
        .build()?;
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(IngestError::Fetch(format!("The website returned HTTP {}", status)));
    }
    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|ct| ct.contains("html"));
    let body = response.text()?;

    let text = if is_html { html_to_text(&body) } else { body.trim().to_string() };
    if text.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(text)
}

pub fn wrap_page(url: &str, text: &str) -> Wrapped {
    Wrapped { name: url.to_string(), text: format!("---\nWebsite: `{}`\n{}\n---", url, text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_and_tags_are_removed() {
        let html = "<html><head><title>T</title><style>p{}</style></head><body>\
                    <script>var x = 1;</script><h1>Title</h1><p>Hello <b>world</b></p>\
                    <!-- note --><p>Tom &amp; Jerry &lt;3 &#169;</p></body></html>";
        assert_eq!(html_to_text(html), "Title\n\nHello world\n\nTom & Jerry <3 ©");
    }

    #[test]
    fn blank_lines_collapse() {
        assert_eq!(html_to_text("<div>a</div>\n\n\n<div>  b   c </div>\n\n"), "a\n\nb c");
    }

    #[test]
    fn escaped_entity_stays_literal() {
        assert_eq!(html_to_text("&amp;lt;"), "&lt;");
    }

    #[test]
    fn page_wrapper_format() {
        let wrapped = wrap_page("https://example.com", "body");
        assert_eq!(wrapped.text, "---\nWebsite: `https://example.com`\nbody\n---");
        assert_eq!(wrapped.name, "https://example.com");
    }
}
