use serde::Deserialize;

use crate::env::{
    parse_flag, PRETTY_LOG_ADD_SOURCE_ENV, PRETTY_LOG_COLORFUL_ENV, PRETTY_LOG_LEVEL_ENV,
    PRETTY_LOG_MULTILINE_ENV, PRETTY_LOG_TIME_FORMAT_ENV,
};
use crate::error::OptionsError;
use crate::record::Level;

/// Default timestamp pattern: sortable, millisecond precision
/// (`2024-01-15 10:30:00.000`).
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Rendering options of a [`PrettyHandler`](crate::handler::PrettyHandler).
///
/// **Fields**
/// - `level`: records below this level are dropped.
/// - `add_source`: append `source: <file>:<line>` when the record carries a location.
/// - `colorful`: wrap output in ANSI escapes from the handler's color theme.
/// - `multiline`: one attribute per indented line instead of `key=value` pairs.
/// - `time_format`: chrono strftime pattern for timestamps and time values.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub level: Level,
    pub add_source: bool,
    pub colorful: bool,
    pub multiline: bool,
    pub time_format: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            level: Level::Info,
            add_source: false,
            colorful: true,
            multiline: false,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl Options {
    /// Defaults overlaid with the `PRETTY_LOG_*` environment variables.
    pub fn from_env() -> Result<Self, OptionsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values produced by `lookup`, keyed by the
    /// `PRETTY_LOG_*` variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OptionsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Options::default();

        if let Some(level) = lookup(PRETTY_LOG_LEVEL_ENV) {
            options.level = level.parse().map_err(|source| OptionsError::InvalidLevel {
                key: PRETTY_LOG_LEVEL_ENV,
                source,
            })?;
        }
        if let Some(value) = lookup(PRETTY_LOG_ADD_SOURCE_ENV) {
            options.add_source = flag(PRETTY_LOG_ADD_SOURCE_ENV, value)?;
        }
        if let Some(value) = lookup(PRETTY_LOG_COLORFUL_ENV) {
            options.colorful = flag(PRETTY_LOG_COLORFUL_ENV, value)?;
        }
        if let Some(value) = lookup(PRETTY_LOG_MULTILINE_ENV) {
            options.multiline = flag(PRETTY_LOG_MULTILINE_ENV, value)?;
        }
        if let Some(pattern) = lookup(PRETTY_LOG_TIME_FORMAT_ENV) {
            options.time_format = pattern;
        }

        Ok(options.normalized())
    }

    /// Replace an empty time format with [`DEFAULT_TIME_FORMAT`].
    pub(crate) fn normalized(mut self) -> Self {
        if self.time_format.is_empty() {
            self.time_format = DEFAULT_TIME_FORMAT.to_string();
        }
        self
    }
}

fn flag(key: &'static str, value: String) -> Result<bool, OptionsError> {
    parse_flag(&value).ok_or(OptionsError::InvalidBool { key, value })
}
