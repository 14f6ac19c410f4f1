use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::restricted::is_restricted;
use super::{IngestError, Wrapped};

/// Expand `~` and resolve `input` against `cwd`.
pub fn resolve_path(input: &str, cwd: &Path) -> PathBuf {
    let input = input.trim().trim_matches(|c| c == '"' || c == '\'');
    let expanded = match input.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(input),
        },
        _ => PathBuf::from(input),
    };
    if expanded.is_absolute() { expanded } else { cwd.join(expanded) }
}

/// Read text, falling back to Latin-1 for invalid UTF-8. Triple backticks
/// are rewritten so the content cannot close the surrounding fence.
fn read_text(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };
    Ok(text.replace("```", "'''"))
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_block(name: &str, text: &str) -> String {
    format!("File: `{}`\n```\n{}\n```", name, text)
}

/// Wrap a file or a directory's top-level files for attachment.
pub fn wrap_path(path: &Path) -> Result<Wrapped, IngestError> {
    if path.is_dir() {
        return wrap_directory(path);
    }
    if !path.is_file() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    let name = base_name(path);
    if is_restricted(path) {
        return Err(IngestError::Unsupported(name));
    }
    let text = format!("---\n{}\n---", file_block(&name, &read_text(path)?));
    Ok(Wrapped { name, text })
}

fn wrap_directory(dir: &Path) -> Result<Wrapped, IngestError> {
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .hidden(true)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut names = Vec::new();
    let mut blocks = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if entry.depth() != 1 || !path.is_file() || is_restricted(path) {
            continue;
        }
        let name = base_name(path);
        blocks.push(file_block(&name, &read_text(path)?));
        names.push(name);
    }

    if names.is_empty() {
        return Err(IngestError::Empty);
    }

    let name = base_name(dir);
    let text = format!("---\nDirectory: `{}`\nFiles: `{}`\n\n{}\n---", name, names.join(", "), blocks.join("\n\n"));
    Ok(Wrapped { name, text })
}
