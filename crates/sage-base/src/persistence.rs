//! Session files: pretty-printed JSON arrays of `{role, content}`.
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::constants::SESSION_EXT;
use crate::state::message::Message;

#[derive(Debug)]
pub enum SessionError {
    NotFound(PathBuf),
    Corrupted { path: PathBuf, reason: String },
    /// Names must stay inside the sessions directory
    InvalidName(String),
    Io(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound(path) => write!(f, "No session file found: {}", path.display()),
            SessionError::Corrupted { path, reason } => {
                write!(f, "Corrupted session file: {} ({})", path.display(), reason)
            }
            SessionError::InvalidName(name) => write!(f, "Invalid session name: {}", name),
            SessionError::Io(msg) => write!(f, "Session I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        SessionError::Io(e.to_string())
    }
}

/// Append the session extension unless already present.
pub fn session_file_name(name: &str) -> String {
    let suffix = format!(".{}", SESSION_EXT);
    if name.ends_with(&suffix) { name.to_string() } else { format!("{}{}", name, suffix) }
}

/// Named session files inside one directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `name`. Rejects anything but a bare file name.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, SessionError> {
        let mut parts = Path::new(name).components();
        let bare = matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None));
        if !bare || name.contains(['/', '\\']) {
            return Err(SessionError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(session_file_name(name)))
    }

    pub fn read(&self, name: &str) -> Result<Vec<Message>, SessionError> {
        let path = self.path_for(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(SessionError::NotFound(path)),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| SessionError::Corrupted { path, reason: e.to_string() })
    }

    pub fn write(&self, name: &str, messages: &[Message]) -> Result<PathBuf, SessionError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(messages).map_err(|e| SessionError::Io(e.to_string()))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Session file names, sorted.
    pub fn list(&self) -> Result<Vec<String>, SessionError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|ext| ext == SESSION_EXT).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> Result<PathBuf, SessionError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SessionError::NotFound(path)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::message::test_helpers::conversation;
    use tempfile::TempDir;

    #[test]
    fn extension_appended_once() {
        assert_eq!(session_file_name("work"), "work.json");
        assert_eq!(session_file_name("work.json"), "work.json");
    }

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let msgs = conversation("sys", &["hi", "hello"]);
        let path = store.write("chat", &msgs).unwrap();
        assert!(path.ends_with("chat.json"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n"));
        assert!(raw.contains("\"role\": \"assistant\""));
        assert_eq!(store.read("chat.json").unwrap(), msgs);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(matches!(store.read("nope"), Err(SessionError::NotFound(_))));
        assert!(matches!(store.delete("nope"), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn malformed_json_is_corrupted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "[{\"role\": \"user\"").unwrap();
        let store = SessionStore::new(dir.path());
        let err = store.read("bad").unwrap_err();
        assert!(matches!(err, SessionError::Corrupted { .. }));
        assert!(err.to_string().starts_with("Corrupted session file"));
    }

    #[test]
    fn list_only_json_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }
        let store = SessionStore::new(dir.path());
        assert_eq!(store.list().unwrap(), vec!["a.json", "b.json"]);
    }

    #[test]
    fn names_cannot_leave_the_directory() {
        let dir = TempDir::new().unwrap();
        let sessions = dir.path().join("sessions");
        fs::create_dir(&sessions).unwrap();
        fs::write(dir.path().join("settings.json"), "{}").unwrap();
        let store = SessionStore::new(&sessions);

        for name in ["../settings", "a/b", "a\\b", "..", ".", "", "/etc/passwd"] {
            assert!(matches!(store.path_for(name), Err(SessionError::InvalidName(_))), "{:?}", name);
        }
        assert!(matches!(store.read("../settings"), Err(SessionError::InvalidName(_))));
        assert!(matches!(store.write("../settings", &[]), Err(SessionError::InvalidName(_))));
        assert!(matches!(store.delete("../settings"), Err(SessionError::InvalidName(_))));
        assert_eq!(fs::read_to_string(dir.path().join("settings.json")).unwrap(), "{}");
        assert!(store.path_for("v1.2 notes").is_ok());
    }

    #[test]
    fn delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.write("gone", &conversation("s", &[])).unwrap();
        store.delete("gone").unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
