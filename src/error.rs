use tracing::subscriber::SetGlobalDefaultError;

/// Error returned when a level name is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level {0:?} (expected trace, debug, info, warn or error)")]
pub struct ParseLevelError(pub String);

/// Error type returned when building [`Options`](crate::options::Options)
/// from the environment.
#[derive(thiserror::Error, Debug)]
pub enum OptionsError {
    #[error("invalid value for {key}: {source}")]
    InvalidLevel {
        key: &'static str,
        #[source]
        source: ParseLevelError,
    },

    #[error("invalid value for {key}: expected a boolean, got {value:?}")]
    InvalidBool { key: &'static str, value: String },
}

/// Error type returned by the `try_init_*` helpers.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("failed to install global subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}
