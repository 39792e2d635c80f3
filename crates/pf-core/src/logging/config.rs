//! Logging configuration.
//!
//! Precedence, highest first: CLI flags, `PF_LOG` / `PF_LOG_FORMAT` /
//! `PF_LOG_TIMESTAMPS`, defaults. `RUST_LOG` directives are applied by the
//! subscriber filter on top of the resolved level.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Console lines for interactive use.
    #[default]
    #[value(alias = "console")]
    Human,
    /// One JSON object per line, for batch pipelines.
    #[value(alias = "json")]
    Jsonl,
}

/// Minimum level that is emitted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
    #[value(alias = "none")]
    Off,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Apply `-v` (repeatable) and `-q`. Quiet wins.
    pub fn adjusted(self, verbose: u8, quiet: bool) -> Self {
        if quiet {
            return LogLevel::Error;
        }
        (0..verbose).fold(self, |level, _| match level {
            LogLevel::Off => LogLevel::Error,
            LogLevel::Error => LogLevel::Warn,
            LogLevel::Warn => LogLevel::Info,
            LogLevel::Info => LogLevel::Debug,
            LogLevel::Debug | LogLevel::Trace => LogLevel::Trace,
        })
    }
}

fn parse_env<T: ValueEnum>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    T::from_str(raw.trim(), true).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Timestamps on human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Resolve from the environment, then apply CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        let defaults = LogConfig::default();
        let timestamps = match std::env::var("PF_LOG_TIMESTAMPS") {
            Ok(v) => !matches!(v.trim(), "0" | "false" | "no" | "off"),
            Err(_) => defaults.timestamps,
        };
        LogConfig {
            format: cli_format
                .or_else(|| parse_env("PF_LOG_FORMAT"))
                .unwrap_or(defaults.format),
            level: cli_level
                .or_else(|| parse_env("PF_LOG"))
                .unwrap_or(defaults.level),
            timestamps,
        }
    }
}
