//! Structured logging for pf-core.
//!
//! stdout carries the report; every log line goes to stderr, either as
//! console text or as JSON Lines ([`JsonlLayer`]). Events use the names in
//! [`event_names`] as their tracing target and carry a [`Stage`], so a
//! batch log can be filtered by `event` and `stage` without parsing
//! messages.

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let output = match config.format {
        LogFormat::Jsonl => JsonlLayer::stderr().boxed(),
        LogFormat::Human => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                console.boxed()
            } else {
                console.without_time().boxed()
            }
        }
    };

    let _ = tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init();
}

/// Identifier attached to every line of one job.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("run-{}", &uuid.simple().to_string()[..12])
}
