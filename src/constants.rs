// =============================================================================
// API & MODELS
// =============================================================================

/// Chat completions path appended to a profile endpoint
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Environment variable consulted for the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Key sent when none is configured (local servers ignore it)
pub const FALLBACK_API_KEY: &str = "dummy-key";

// =============================================================================
// STREAMING
// =============================================================================

/// How long one wait on the fragment channel may block before the
/// interrupt is checked again (milliseconds)
pub const EVENT_POLL_MS: u64 = 8;

/// Grace period after the stream ends, before buffers are flushed (milliseconds)
pub const FLUSH_GRACE_MS: u64 = 20;

/// Live panels stop re-rendering past this multiple of the terminal height
pub const PANEL_HEIGHT_FACTOR: f64 = 1.5;

/// Shown until the first fragment arrives
pub const AWAITING_MESSAGE: &str = "Awaiting response...";

// =============================================================================
// STATUS LINE
// =============================================================================

/// Context usage (percent) at which the status turns yellow
pub const CONTEXT_WARN_PERCENT: f64 = 50.0;

/// Context usage (percent) at which the status turns red
pub const CONTEXT_ALERT_PERCENT: f64 = 80.0;

/// Attachments above this share of the context print a purge hint
pub const LARGE_PAYLOAD_PERCENT: f64 = 50.0;

// =============================================================================
// INGESTION
// =============================================================================

/// Timeout for fetching a web page (seconds)
pub const WEB_FETCH_TIMEOUT_SECS: u64 = 20;

/// User agent sent with `!web` requests
pub const WEB_USER_AGENT: &str = "Mozilla/5.0 (compatible; LocalSage)";

// =============================================================================
// INPUT
// =============================================================================

/// Prompt prefix for the main input line
pub const PROMPT_PREFIX: &str = "❯ ";

/// Entries kept in the in-memory input history
pub const INPUT_HISTORY_LIMIT: usize = 200;
