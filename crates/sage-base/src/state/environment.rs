use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::constants::ENVIRONMENT_LIST_LIMIT;

/// Snapshot of the user's surroundings, appended to the outgoing system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentContext {
    pub user: String,
    pub os: String,
    pub cwd: PathBuf,
    pub files: Vec<String>,
    pub dirs: Vec<String>,
}

impl EnvironmentContext {
    /// Capture the environment for the current working directory.
    pub fn current() -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::capture(&cwd)
    }

    pub fn capture(cwd: &Path) -> Self {
        let (mut files, mut dirs) = (Vec::new(), Vec::new());
        if let Ok(entries) = fs::read_dir(cwd) {
            for entry in entries.filter_map(|e| e.ok()) {
                let name = entry.file_name().to_string_lossy().into_owned();
                match entry.file_type() {
                    Ok(t) if t.is_dir() => dirs.push(name),
                    Ok(t) if t.is_file() => files.push(name),
                    _ => {}
                }
            }
        }
        files.sort();
        dirs.sort();

        Self {
            user: current_user(),
            os: format!("{} {}", env::consts::OS, env::consts::ARCH),
            cwd: cwd.to_path_buf(),
            files,
            dirs,
        }
    }

    pub fn render(&self) -> String {
        let take = |items: &[String]| {
            items.iter().take(ENVIRONMENT_LIST_LIMIT).map(String::as_str).collect::<Vec<_>>().join(", ")
        };
        format!(
            "[ENVIRONMENT CONTEXT]\n\
             RULE: ONLY REFERENCE ENVIRONMENT CONTEXT IF IT IS RELEVANT TO THE CONVERSATION\n\
             Current User: {}\n\
             Operating System: {}\n\
             Working Directory: {}\n\
             Visible Files: {}\n\
             Visible Directories: {}",
            self.user,
            self.os,
            self.cwd.display(),
            take(&self.files),
            take(&self.dirs),
        )
    }
}

fn current_user() -> String {
    env::var("USER").or_else(|_| env::var("USERNAME")).unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_files_and_dirs_separately() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "x").unwrap();
        fs::write(dir.path().join("a.rs"), "x").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();

        let ctx = EnvironmentContext::capture(dir.path());
        assert_eq!(ctx.files, vec!["a.rs", "b.txt"]);
        assert_eq!(ctx.dirs, vec!["src"]);

        let text = ctx.render();
        assert!(text.starts_with("[ENVIRONMENT CONTEXT]\n"));
        assert!(text.contains("Visible Files: a.rs, b.txt"));
        assert!(text.contains("Visible Directories: src"));
    }

    #[test]
    fn listing_is_capped() {
        let dir = TempDir::new().unwrap();
        for i in 0..30 {
            fs::write(dir.path().join(format!("f{:02}", i)), "").unwrap();
        }
        let text = EnvironmentContext::capture(dir.path()).render();
        assert!(text.contains("f19"));
        assert!(!text.contains("f20"));
    }

    #[test]
    fn unreadable_dir_yields_empty_lists() {
        let ctx = EnvironmentContext::capture(Path::new("/definitely/not/here"));
        assert!(ctx.files.is_empty());
        assert!(ctx.dirs.is_empty());
    }
}
