//! Configuration loading and validation for pf-core.
//!
//! This module handles:
//! - Config resolution order (CLI > env > XDG > /etc > defaults)
//! - Preset layering (a file only overrides the keys it sets)
//! - Semantic validation
//! - Config snapshots for job reports

pub use pf_config::monitor;
pub use pf_config::preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use pf_config::validate::ValidationError;
pub use pf_config::{ConfigPaths, ConfigSnapshot, ConfigSource, MonitorConfig};

use pf_config::{resolve_config, validate_monitor};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::logging::event_names;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Preset(#[from] PresetError),
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::NotFound { .. } => 10,
            ConfigError::Preset(_) => 12,
            ConfigError::IoError { .. } => 60,
            ConfigError::ParseError { .. } => 61,
            ConfigError::ValidationError(e) => e.code(),
        }
    }
}

/// Configuration resolution options.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit monitor.json path (highest priority).
    pub path: Option<PathBuf>,
    /// Preset used as the base before any file is applied.
    pub preset: Option<String>,
}

/// A validated configuration with provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: MonitorConfig,
    pub paths: ConfigPaths,
    pub snapshot: ConfigSnapshot,
}

/// Load configuration with the standard resolution order.
///
/// An explicit path that does not exist is an error; when nothing is found
/// through the environment or the standard directories the preset (or the
/// built-in defaults) is used as is.
pub fn load_config(options: &ConfigOptions) -> Result<LoadedConfig, ConfigError> {
    let preset = options
        .preset
        .as_deref()
        .map(str::parse::<PresetName>)
        .transpose()?;
    let base = preset.map(get_preset).unwrap_or_default();

    let paths = resolve_config(options.path.as_deref());

    let (config, raw) = match &paths.monitor {
        Some(path) => {
            let raw = read_config_file(path)?;
            let config = layer_file(&base, path, &raw)?;
            (config, Some(raw))
        }
        None => {
            info!(
                target: event_names::CONFIG_DEFAULT_USED,
                preset = preset.map(|p| p.as_str()).unwrap_or("none"),
                "no monitor.json found, using built-in configuration"
            );
            (base, None)
        }
    };

    validate_monitor(&config)?;

    let snapshot = ConfigSnapshot::new(
        &config,
        &paths,
        raw.as_deref(),
        preset.map(|p| p.as_str()),
    );

    info!(
        target: event_names::CONFIG_LOADED,
        source = %paths.monitor_source,
        path = ?paths.monitor,
        hash = snapshot.short_id(),
        "configuration loaded"
    );

    Ok(LoadedConfig {
        config,
        paths,
        snapshot,
    })
}

fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply the keys present in `raw` on top of `base`.
fn layer_file(base: &MonitorConfig, path: &Path, raw: &str) -> Result<MonitorConfig, ConfigError> {
    let parse_err = |source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    };

    let overrides: Value = serde_json::from_str(raw).map_err(parse_err)?;
    let mut merged = serde_json::to_value(base).map_err(parse_err)?;
    merge_json(&mut merged, overrides);
    serde_json::from_value(merged).map_err(parse_err)
}

/// Deep merge: objects merge key by key, anything else replaces.
fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
