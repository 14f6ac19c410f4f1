use std::env;
use std::sync::LazyLock;

use regex::Regex;
use sage_base::state::{RemoveOutcome, Role};

use crate::app::App;
use crate::constants::LARGE_PAYLOAD_PERCENT;
use crate::infra::logging::log_error;
use crate::ingest::{self, IngestError, Wrapped};
use crate::ui::helpers::dedent;
use crate::ui::panels;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[^\S\n]*\w*[^\S\n]*\n(.*?)\n[^\S\n]*```").expect("invalid CODE_BLOCK regex")
});

/// Every fenced block in `text`, dedented and joined by a blank line.
pub fn extract_code_blocks(text: &str) -> Option<String> {
    let blocks: Vec<String> = CODE_BLOCK.captures_iter(text).map(|c| dedent(&c[1])).collect();
    if blocks.is_empty() {
        return None;
    }
    Some(blocks.join("\n\n").trim().to_string())
}

fn percent_of(tokens: usize, context_length: usize) -> f64 {
    if context_length == 0 { 0.0 } else { tokens as f64 / context_length as f64 * 100.0 }
}

/// Append a wrapped attachment and report its share of the context.
fn commit(app: &mut App, wrapped: Wrapped, verb_new: &str) {
    let tokens = app.history.measure(&wrapped.text);
    let replaced = app.history.attach(&wrapped.name, wrapped.text);
    let pct = percent_of(tokens, app.config.context_length);

    let verb = if replaced { "updated" } else { verb_new };
    app.success(&format!("{} {} successfully.", wrapped.name, verb));
    app.warn(&format!("Context size: {}, {:.1}%", tokens, pct));
    if pct > LARGE_PAYLOAD_PERCENT {
        app.info("Large payload detected! Use !purge, if needed, to recover context.");
    }
    app.status();
}

pub fn attach(app: &mut App) {
    let Some(input) = app.prompt("Enter file/directory path: ", false) else { return };
    let cwd = env::current_dir().unwrap_or_default();
    let path = ingest::resolve_path(&input, &cwd);

    match ingest::wrap_path(&path) {
        Ok(wrapped) => commit(app, wrapped, "attached"),
        Err(e) if e.is_skip() => app.info("Skipped: Source is empty, binary, or contains hidden content."),
        Err(IngestError::NotFound(_)) => app.fail("Invalid path."),
        Err(e) => app.report("ERROR READING FILE", &format!("Attaching {}", path.display()), &e.to_string()),
    }
}

pub fn web(app: &mut App) {
    let Some(url) = app.prompt("Enter a URL: ", false) else { return };
    app.info(&format!("Reading {}...", url));

    match ingest::fetch_page(&url) {
        Ok(text) => commit(app, ingest::wrap_page(&url, &text), "ingested"),
        Err(e) => {
            log_error(&app.dirs.logs_dir, &format!("Fetching {}", url), &e.to_string());
            app.fail(&format!("Failed to fetch URL: {}", e));
        }
    }
}

/// Print attachments. Returns false when there are none.
pub fn list(app: &mut App) -> bool {
    let found = app.history.attachments();
    if found.is_empty() {
        app.info("No attachments found.");
        return false;
    }
    let lines: Vec<String> = found.iter().map(|a| format!("{}. {}: {}", a.index, a.kind, a.name)).collect();
    app.print(&panels::list("Attachments in context:", &lines));
    true
}

pub fn purge(app: &mut App) {
    if !list(app) {
        return;
    }
    let Some(choice) = app.prompt("Enter an entry number to purge: ", false) else { return };
    let value = match choice.parse::<i64>() {
        Ok(v) if v <= 0 => {
            app.info("Value must be greater than 0.");
            return;
        }
        Ok(v) => v as usize,
        Err(_) => {
            app.info("Only valid entry numbers are acceptable.");
            return;
        }
    };

    match app.history.remove_attachment(value) {
        RemoveOutcome::Removed(kind) => {
            app.success(&format!("{} removed from context.", kind));
            app.status();
        }
        RemoveOutcome::NotFound => app.fail(&format!("Entry {} does not exist.", value)),
        RemoveOutcome::Skipped => app.info("No attachments found."),
    }
}

pub fn purge_all(app: &mut App) {
    if app.history.purge_attachments().is_empty() {
        app.info("No attachments found.");
        return;
    }
    app.success("All attachments removed.");
    app.status();
}

pub fn change_dir(app: &mut App) {
    let Some(input) = app.prompt("Enter directory path: ", false) else { return };
    let cwd = env::current_dir().unwrap_or_default();
    let path = ingest::resolve_path(&input, &cwd);

    match env::set_current_dir(&path) {
        Ok(()) => {
            let now = env::current_dir().unwrap_or(path);
            app.history.append(
                Role::User,
                format!(
                    "[SYSTEM NOTE: The working directory has changed to {}. \
                     New content is visible in [ENVIRONMENT CONTEXT].]",
                    now.display()
                ),
            );
            app.success(&format!("Working directory is now set to: {}", now.display()));
        }
        Err(e) => {
            let context = format!("Changing directory to {}", path.display());
            app.report("ERROR CHANGING DIRECTORY", &context, &e.to_string());
        }
    }
}

/// Show the fenced code from the last answer, ready to copy.
pub fn copy_code(app: &mut App) {
    let Some(last) = app.history.last_assistant().map(str::to_string) else {
        app.info("No assistant response found to copy from.");
        return;
    };
    let Some(code) = extract_code_blocks(&last) else {
        app.info("No code blocks found in the last response.");
        return;
    };
    let panel = panels::copy(&code, app.console.code_theme());
    app.print(&panel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_blocks_are_joined_and_dedented() {
        let text = "Intro\n```rust\n    fn a() {}\n```\nmiddle\n```\nls -la\n  ```\nend";
        assert_eq!(extract_code_blocks(text).as_deref(), Some("fn a() {}\n\nls -la"));
    }

    #[test]
    fn no_fence_no_code() {
        assert_eq!(extract_code_blocks("plain `inline` text"), None);
    }

    #[test]
    fn percent_handles_zero_context() {
        assert_eq!(percent_of(10, 0), 0.0);
        assert_eq!(percent_of(50, 200), 25.0);
    }
}
