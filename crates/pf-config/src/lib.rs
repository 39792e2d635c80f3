//! Prefire monitor configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for monitor.json
//! - Config resolution (CLI → env → XDG → /etc → defaults)
//! - Semantic validation
//! - Presets for online and emulator deployments
//! - Config snapshots for job reports

pub mod monitor;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use monitor::{MatchMode, MonitorConfig};
pub use preset::PresetName;
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_monitor, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
