// =============================================================================
// APPLICATION DIRECTORIES
// =============================================================================

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "LocalSage";

/// Fallback location when the platform data dir cannot be resolved
pub const FALLBACK_APP_DIR: &str = ".localsage";

/// Settings file name inside the config dir
pub const SETTINGS_FILE: &str = "settings.json";

/// Session file extension
pub const SESSION_EXT: &str = "json";

// =============================================================================
// CONFIG DEFAULTS
// =============================================================================

pub const DEFAULT_PROFILE_ALIAS: &str = "default";
pub const DEFAULT_MODEL_NAME: &str = "Sage";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/v1";

/// Marker stored in a profile's api_key field; the real key never lands on disk
pub const STORED_KEY_MARKER: &str = "stored";

pub const DEFAULT_CONTEXT_LENGTH: usize = 131_072;

/// Live refresh rate in Hz
pub const DEFAULT_REFRESH_RATE: u32 = 30;

/// Lowest refresh rate accepted by `!rate`
pub const MIN_REFRESH_RATE: u32 = 4;

pub const DEFAULT_CODE_THEME: &str = "base16-ocean.dark";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Sage, a conversational AI assistant.";

// =============================================================================
// CONTEXT & TOKEN MANAGEMENT
// =============================================================================

/// Average characters per token for token estimation
pub const CHARS_PER_TOKEN: f32 = 3.3;

/// Share of the context window the outgoing history may occupy
pub const TRIM_LIMIT_FRACTION: f64 = 0.95;

/// Visible files/directories listed in the environment block
pub const ENVIRONMENT_LIST_LIMIT: usize = 20;

// =============================================================================
// SUMMARIZATION
// =============================================================================

/// Seed message placed between the system prompt and the summary
pub const SUMMARY_MARKER: &str = "This summary represents the previous session.";

pub const SUMMARY_PROMPT: &str = "Summarize the full conversation for use in a new session. \
Include the main goals, steps taken, and results achieved.";
