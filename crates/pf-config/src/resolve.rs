//! Locating `monitor.json`.
//!
//! Candidates are tried in order and the first existing file wins:
//!
//! 1. `--config` (taken even when missing, so the caller reports it)
//! 2. `PF_MONITOR_CONFIG`
//! 3. `PF_MONITOR_CONFIG_DIR/monitor.json`
//! 4. `$XDG_CONFIG_HOME/prefire-monitor/monitor.json`
//! 5. `/etc/prefire-monitor/monitor.json`
//!
//! With none found the built-in defaults apply.

use std::path::{Path, PathBuf};

pub const ENV_MONITOR_PATH: &str = "PF_MONITOR_CONFIG";
pub const ENV_CONFIG_DIR: &str = "PF_MONITOR_CONFIG_DIR";

pub const MONITOR_FILENAME: &str = "monitor.json";

const APP_DIR: &str = "prefire-monitor";

/// Resolved location of the monitor configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// None when the defaults apply.
    pub monitor: Option<PathBuf>,
    pub monitor_source: ConfigSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    CliArgument,
    /// `PF_MONITOR_CONFIG` or `PF_MONITOR_CONFIG_DIR`.
    Environment,
    XdgConfig,
    SystemConfig,
    #[default]
    BuiltinDefault,
}

impl ConfigSource {
    pub fn label(self) -> &'static str {
        match self {
            ConfigSource::CliArgument => "CLI argument",
            ConfigSource::Environment => "environment variable",
            ConfigSource::XdgConfig => "XDG config",
            ConfigSource::SystemConfig => "system config",
            ConfigSource::BuiltinDefault => "builtin default",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Find the monitor configuration file.
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    if let Some(path) = cli_path {
        return ConfigPaths {
            monitor: Some(path.to_path_buf()),
            monitor_source: ConfigSource::CliArgument,
        };
    }

    search_candidates()
        .into_iter()
        .find(|(path, _)| path.is_file())
        .map(|(path, source)| ConfigPaths {
            monitor: Some(path),
            monitor_source: source,
        })
        .unwrap_or_default()
}

/// Implicit locations in priority order.
fn search_candidates() -> Vec<(PathBuf, ConfigSource)> {
    let mut candidates = Vec::new();
    if let Some(path) = std::env::var_os(ENV_MONITOR_PATH) {
        candidates.push((PathBuf::from(path), ConfigSource::Environment));
    }
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
        candidates.push((
            PathBuf::from(dir).join(MONITOR_FILENAME),
            ConfigSource::Environment,
        ));
    }
    if let Some(dir) = xdg_config_dir() {
        candidates.push((dir.join(MONITOR_FILENAME), ConfigSource::XdgConfig));
    }
    candidates.push((
        system_config_dir().join(MONITOR_FILENAME),
        ConfigSource::SystemConfig,
    ));
    candidates
}

/// `$XDG_CONFIG_HOME/prefire-monitor` (or the platform equivalent).
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

pub fn system_config_dir() -> PathBuf {
    Path::new("/etc").join(APP_DIR)
}
