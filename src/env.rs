//! Environment variable names used by this crate for configuring the
//! pretty handler without code changes.
//!
//! These are purely helpers; [`Options`](crate::options::Options) remains
//! usable without any environment access.

/// Minimum level, e.g. `debug`.
pub const PRETTY_LOG_LEVEL_ENV: &str = "PRETTY_LOG_LEVEL";

/// Append `source: file:line` to every line when true.
pub const PRETTY_LOG_ADD_SOURCE_ENV: &str = "PRETTY_LOG_ADD_SOURCE";

/// Wrap output in ANSI color escapes when true.
pub const PRETTY_LOG_COLORFUL_ENV: &str = "PRETTY_LOG_COLORFUL";

/// Render one attribute per line when true.
pub const PRETTY_LOG_MULTILINE_ENV: &str = "PRETTY_LOG_MULTILINE";

/// chrono strftime pattern for timestamps.
pub const PRETTY_LOG_TIME_FORMAT_ENV: &str = "PRETTY_LOG_TIME_FORMAT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse the usual spellings of a boolean flag.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
