//! Configuration snapshots for job reports.
//!
//! A snapshot records which configuration a job ran with, so histogram
//! output can be traced back to the exact file that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::monitor::MonitorConfig;
use crate::resolve::{ConfigPaths, ConfigSource};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the configuration was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    /// Preset applied before the file, if any.
    #[serde(default)]
    pub preset: Option<String>,

    /// SHA-256 of the file content, or of the serialized defaults.
    pub hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub menu: String,
    pub menu_size: usize,
    pub max_delta_r: f64,
    pub match_mode: String,
    pub enabled_monitors: Vec<String>,
}

impl ConfigSnapshot {
    /// Create a snapshot from a loaded configuration.
    ///
    /// `raw` is the file content when the configuration came from disk.
    pub fn new(
        config: &MonitorConfig,
        paths: &ConfigPaths,
        raw: Option<&str>,
        preset: Option<&str>,
    ) -> Self {
        let hash = match raw {
            Some(content) => hash_content(content),
            None => hash_content(&serde_json::to_string(config).unwrap_or_default()),
        };

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            path: paths.monitor.as_ref().map(|p| p.display().to_string()),
            source: paths.monitor_source.to_string(),
            preset: preset.map(str::to_string),
            hash,
            summary: ConfigSummary::from_config(config),
        }
    }

    /// Create a snapshot for the built-in defaults.
    pub fn defaults_only() -> Self {
        let paths = ConfigPaths {
            monitor: None,
            monitor_source: ConfigSource::BuiltinDefault,
        };
        Self::new(&MonitorConfig::default(), &paths, None, None)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check if this snapshot matches another (same config content).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.hash == other.hash
    }

    /// Short identifier (first 12 hex chars of the hash).
    pub fn short_id(&self) -> &str {
        &self.hash[..12.min(self.hash.len())]
    }
}

impl ConfigSummary {
    fn from_config(config: &MonitorConfig) -> Self {
        let mut enabled_monitors = Vec::new();
        if config.algo_timing.enabled {
            enabled_monitors.push("algo_timing".to_string());
        }
        if config.object_timing.enabled {
            enabled_monitors.push("object_timing".to_string());
        }
        if config.jet_prefiring.enabled {
            enabled_monitors.push("jet_prefiring".to_string());
        }
        if config.client.enabled {
            enabled_monitors.push("client".to_string());
        }

        let match_mode = serde_json::to_value(config.matching.mode)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        ConfigSummary {
            menu: config.trigger_menu.name.clone(),
            menu_size: config.trigger_menu.size(),
            max_delta_r: config.matching.max_delta_r,
            match_mode,
            enabled_monitors,
        }
    }
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
