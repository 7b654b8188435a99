use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Env var holding the stderr filter directives (default `warn`).
pub const LOG_FILTER_ENV: &str = "PORTAL_FEED_LOG";

/// When set, DEBUG output is also appended to this file.
pub const LOG_FILE_ENV: &str = "PORTAL_FEED_LOG_FILE";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file = std::env::var(LOG_FILE_ENV)
        .ok()
        .and_then(|path| match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
                None
            }
        });

    if let Some(file) = file {
        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(LevelFilter::DEBUG);

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}
