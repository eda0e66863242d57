use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};

use pretty_log_sink::env::{env_or, PRETTY_LOG_LEVEL_ENV};
use pretty_log_sink::init::init_pretty;
use pretty_log_sink::Options;

fn main() {
    let options = Options {
        level: env_or(PRETTY_LOG_LEVEL_ENV, "debug").parse().unwrap_or_default(),
        add_source: true,
        multiline: true,
        ..Options::default()
    };
    init_pretty(options);

    info!(version = "1.0.0", env = "development", "starting application");
    debug!(timeout = "30s", retries = 3, "configuration loaded");
    warn!("development mode enabled");

    let span = info_span!("db", host = "127.0.0.1", port = 5432);
    {
        let _guard = span.enter();
        let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        error!(
            error = &err as &(dyn std::error::Error + 'static),
            attempt = 3,
            backoff = ?Duration::from_secs(2),
            "failed to connect to database"
        );
    }

    info!(uptime = ?Duration::from_secs(300), "shutting down");
}
