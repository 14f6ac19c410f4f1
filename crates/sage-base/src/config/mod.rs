//! Persistent user settings and application directories.
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod constants;

use constants::*;

// ============================================================================
// Application Directories
// ============================================================================

/// On-disk layout: `<root>/config`, `<root>/sessions`, `<root>/logs`.
#[derive(Debug, Clone)]
pub struct AppDirs {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub sessions_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl AppDirs {
    /// Resolve the platform data directory, falling back to a local dot dir.
    pub fn resolve() -> Self {
        let root = dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_APP_DIR));
        Self::at(root)
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join("config"),
            sessions_dir: root.join("sessions"),
            logs_dir: root.join("logs"),
            root,
        }
    }

    /// Create every directory. Startup aborts if this fails.
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        fs::create_dir_all(&self.sessions_dir)?;
        fs::create_dir_all(&self.logs_dir)?;
        Ok(())
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

// ============================================================================
// Settings
// ============================================================================

/// A named model endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub alias: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default = "stored_marker")]
    pub api_key: String,
}

fn stored_marker() -> String {
    STORED_KEY_MARKER.to_string()
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self {
            alias: DEFAULT_PROFILE_ALIAS.to_string(),
            name: DEFAULT_MODEL_NAME.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: stored_marker(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub models: Vec<ModelProfile>,
    pub active_model: String,
    pub context_length: usize,
    pub refresh_rate: u32,
    pub code_theme: String,
    pub reasoning_panel_consume: bool,
    pub system_prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: vec![ModelProfile::default()],
            active_model: DEFAULT_PROFILE_ALIAS.to_string(),
            context_length: DEFAULT_CONTEXT_LENGTH,
            refresh_rate: DEFAULT_REFRESH_RATE,
            code_theme: DEFAULT_CODE_THEME.to_string(),
            reasoning_panel_consume: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Result of removing a profile by alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRemoval {
    Removed,
    /// The active profile is never removed
    Active,
    Missing,
}

impl Config {
    /// Load settings from `path`, creating the file from defaults when absent.
    ///
    /// Only recognized keys are applied. Unknown keys and values of the wrong
    /// shape are skipped and reported in the returned warnings.
    pub fn load(path: &Path) -> Result<(Self, Vec<String>), ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok((config, Vec::new()));
        }

        let content = fs::read_to_string(path)?;
        let root: serde_json::Map<String, Value> =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self::from_map(root))
    }

    fn from_map(root: serde_json::Map<String, Value>) -> (Self, Vec<String>) {
        let mut config = Self::default();
        let mut warnings = Vec::new();

        for (key, value) in root {
            match key.as_str() {
                "models" => apply(&mut config.models, &key, value, &mut warnings),
                "active_model" => apply(&mut config.active_model, &key, value, &mut warnings),
                "context_length" => apply(&mut config.context_length, &key, value, &mut warnings),
                "refresh_rate" => apply(&mut config.refresh_rate, &key, value, &mut warnings),
                "code_theme" | "rich_code_theme" => apply(&mut config.code_theme, &key, value, &mut warnings),
                "reasoning_panel_consume" => apply(&mut config.reasoning_panel_consume, &key, value, &mut warnings),
                "system_prompt" => apply(&mut config.system_prompt, &key, value, &mut warnings),
                _ => warnings.push(format!("Ignoring unknown setting '{}'", key)),
            }
        }

        let defaults = Self::default();
        if config.models.is_empty() {
            warnings.push("No model profiles configured, restoring the default profile".to_string());
            config.models = defaults.models;
        }
        if config.context_length == 0 {
            warnings.push("context_length must be positive, using default".to_string());
            config.context_length = defaults.context_length;
        }
        if config.refresh_rate < MIN_REFRESH_RATE {
            warnings.push(format!("refresh_rate must be at least {}, using default", MIN_REFRESH_RATE));
            config.refresh_rate = defaults.refresh_rate;
        }

        (config, warnings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// The active profile, or the first configured one when the alias is stale.
    pub fn active(&self) -> ModelProfile {
        self.models
            .iter()
            .find(|m| m.alias == self.active_model)
            .or_else(|| self.models.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Add a profile. Returns false when the alias is already taken.
    pub fn add_profile(&mut self, profile: ModelProfile) -> bool {
        if self.models.iter().any(|m| m.alias == profile.alias) {
            return false;
        }
        self.models.push(profile);
        true
    }

    pub fn remove_profile(&mut self, alias: &str) -> ProfileRemoval {
        if alias == self.active_model {
            return ProfileRemoval::Active;
        }
        let before = self.models.len();
        self.models.retain(|m| m.alias != alias);
        if self.models.len() < before { ProfileRemoval::Removed } else { ProfileRemoval::Missing }
    }

    /// Make `alias` the active profile.
    pub fn switch_profile(&mut self, alias: &str) -> Option<ModelProfile> {
        let found = self.models.iter().find(|m| m.alias == alias).cloned()?;
        self.active_model = alias.to_string();
        Some(found)
    }
}

fn apply<T: DeserializeOwned>(slot: &mut T, key: &str, value: Value, warnings: &mut Vec<String>) {
    match serde_json::from_value(value) {
        Ok(v) => *slot = v,
        Err(e) => warnings.push(format!("Invalid value for '{}' ({}), using default", key, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn map(v: Value) -> serde_json::Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn defaults_match_local_endpoint() {
        let config = Config::default();
        assert_eq!(config.context_length, 131_072);
        assert_eq!(config.refresh_rate, 30);
        assert!(config.reasoning_panel_consume);
        let active = config.active();
        assert_eq!(active.alias, "default");
        assert_eq!(active.endpoint, "http://localhost:8080/v1");
    }

    #[test]
    fn load_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("settings.json");
        let (config, warnings) = Config::load(&path).unwrap();
        assert!(path.exists());
        assert!(warnings.is_empty());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_keys_are_ignored_with_warning() {
        let (config, warnings) = Config::from_map(map(json!({
            "context_length": 4096,
            "shell_escape": true,
        })));
        assert_eq!(config.context_length, 4096);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("shell_escape"));
    }

    #[test]
    fn legacy_theme_key_is_accepted() {
        let (config, warnings) = Config::from_map(map(json!({ "rich_code_theme": "Solarized (dark)" })));
        assert_eq!(config.code_theme, "Solarized (dark)");
        assert!(warnings.is_empty());
    }

    #[test]
    fn wrong_type_falls_back_to_default() {
        let (config, warnings) = Config::from_map(map(json!({ "refresh_rate": "fast" })));
        assert_eq!(config.refresh_rate, DEFAULT_REFRESH_RATE);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn low_refresh_rate_rejected() {
        let (config, warnings) = Config::from_map(map(json!({ "refresh_rate": 2 })));
        assert_eq!(config.refresh_rate, DEFAULT_REFRESH_RATE);
        assert!(warnings[0].contains("refresh_rate"));
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut config = Config::default();
        assert!(config.add_profile(ModelProfile {
            alias: "remote".into(),
            name: "qwen".into(),
            endpoint: "http://10.0.0.2:8000/v1".into(),
            api_key: "stored".into(),
        }));
        config.switch_profile("remote").unwrap();
        config.save(&path).unwrap();

        let (loaded, warnings) = Config::load(&path).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(loaded.active().name, "qwen");
        assert_eq!(loaded.models.len(), 2);
    }

    #[test]
    fn stale_active_alias_falls_back_to_first() {
        let mut config = Config::default();
        config.active_model = "gone".into();
        assert_eq!(config.active().alias, "default");
    }

    #[test]
    fn duplicate_profile_rejected() {
        let mut config = Config::default();
        assert!(!config.add_profile(ModelProfile::default()));
        assert_eq!(config.models.len(), 1);
    }

    #[test]
    fn active_profile_cannot_be_removed() {
        let mut config = Config::default();
        assert_eq!(config.remove_profile("default"), ProfileRemoval::Active);
        assert_eq!(config.remove_profile("nope"), ProfileRemoval::Missing);
        config.add_profile(ModelProfile { alias: "b".into(), ..ModelProfile::default() });
        assert_eq!(config.remove_profile("b"), ProfileRemoval::Removed);
    }

    #[test]
    fn switch_to_unknown_alias_keeps_active() {
        let mut config = Config::default();
        assert!(config.switch_profile("ghost").is_none());
        assert_eq!(config.active_model, "default");
    }

    #[test]
    fn corrupted_settings_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn app_dirs_layout() {
        let dir = TempDir::new().unwrap();
        let dirs = AppDirs::at(dir.path().join("LocalSage"));
        dirs.ensure().unwrap();
        assert!(dirs.sessions_dir.is_dir());
        assert!(dirs.logs_dir.is_dir());
        assert_eq!(dirs.settings_file(), dirs.config_dir.join("settings.json"));
    }
}
