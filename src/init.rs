use std::io::{self, Write};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::error::InitError;
use crate::handler::PrettyHandler;
use crate::layer::PrettyLayer;
use crate::options::Options;

/// Install a global `tracing` subscriber that pretty-prints to `writer`.
///
/// **Parameters**
/// - `writer`: destination of rendered lines, e.g. `std::io::stderr()`.
/// - `options`: [`Options`] controlling level, layout and colors.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already installed.
pub fn try_init_pretty_with_writer<W>(writer: W, options: Options) -> Result<(), InitError>
where
    W: Write + Send + 'static,
{
    let layer = PrettyLayer::new(PrettyHandler::new(writer, options));
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Like [`try_init_pretty_with_writer`] but panics if a global subscriber
/// is already set.
pub fn init_pretty_with_writer<W>(writer: W, options: Options)
where
    W: Write + Send + 'static,
{
    try_init_pretty_with_writer(writer, options).expect("set global subscriber");
}

/// Install a global subscriber that pretty-prints to stdout.
pub fn try_init_pretty(options: Options) -> Result<(), InitError> {
    try_init_pretty_with_writer(io::stdout(), options)
}

/// Install a global subscriber that pretty-prints to stdout.
///
/// This is the recommended entrypoint for applications; it panics if a
/// global subscriber is already set.
pub fn init_pretty(options: Options) {
    init_pretty_with_writer(io::stdout(), options);
}

/// Install a stdout subscriber configured from the `PRETTY_LOG_*`
/// environment variables (see [`crate::env`]).
pub fn try_init_from_env() -> Result<(), InitError> {
    let options = Options::from_env()?;
    try_init_pretty(options)
}
