//! No-mock configuration validation + resolution tests.
//!
//! Covers:
//! - Monitor config validation against real JSON fixtures
//! - Resolution order (CLI > env file > env dir > XDG)
//! - Preset determinism and snapshots of loaded files

use pf_config::monitor::MatchMode;
use pf_config::preset::{get_preset, PresetName};
use pf_config::resolve::{resolve_config, ConfigSource};
use pf_config::validate::{validate_monitor, ValidationError};
use pf_config::{ConfigSnapshot, MonitorConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &[
    "PF_MONITOR_CONFIG",
    "PF_MONITOR_CONFIG_DIR",
    "XDG_CONFIG_HOME",
];

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
        .join("config")
}

fn load_fixture(name: &str) -> MonitorConfig {
    MonitorConfig::from_file(&fixtures_dir().join(name)).expect("read monitor fixture")
}

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys.iter().map(|key| env::var(key).ok()).collect();
        for key in keys {
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, saved) in self.keys.iter().zip(&self.saved) {
            match saved {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

fn write_config_dir(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).expect("create config dir");
    let dest = dir.join("monitor.json");
    fs::copy(fixtures_dir().join("valid_monitor.json"), &dest).expect("copy fixture");
    dest
}

#[test]
fn test_validate_monitor_fixture_ok() {
    let config = load_fixture("valid_monitor.json");
    validate_monitor(&config).expect("valid config should pass validation");
    assert_eq!(config.trigger_menu.size(), 16);
    assert_eq!(config.trigger_menu.bit_for("L1_SingleJet180"), Some(5));
    assert_eq!(config.matching.mode, MatchMode::FirstImprovement);
}

#[test]
fn test_validate_rejects_bad_threshold() {
    let config = load_fixture("invalid_monitor_bad_threshold.json");
    let err = validate_monitor(&config).expect_err("negative threshold should fail");
    assert!(matches!(err, ValidationError::InvalidValue { .. }));
}

#[test]
fn test_validate_rejects_duplicate_bit() {
    let config = load_fixture("invalid_monitor_duplicate_bit.json");
    let err = validate_monitor(&config).expect_err("duplicate bit should fail");
    assert!(matches!(err, ValidationError::SemanticError(_)));
}

#[test]
fn test_validate_rejects_old_version() {
    let config = load_fixture("invalid_monitor_old_version.json");
    let err = validate_monitor(&config).expect_err("old version should fail");
    assert_eq!(err.code(), 66);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = MonitorConfig::from_file(Path::new("/nonexistent/monitor.json")).unwrap_err();
    assert!(matches!(err, ValidationError::IoError(_)));
}

#[test]
fn test_resolve_config_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let cli_file = write_config_dir(&temp.path().join("cli"));
        let env_file = write_config_dir(&temp.path().join("env"));

        env::set_var("PF_MONITOR_CONFIG", env_file.display().to_string());

        let paths = resolve_config(Some(&cli_file));
        assert_eq!(paths.monitor_source, ConfigSource::CliArgument);
        assert_eq!(paths.monitor.unwrap(), cli_file);
    });
}

#[test]
fn test_resolve_config_env_file_over_env_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let env_file = write_config_dir(&temp.path().join("env"));
        let dir = temp.path().join("config_dir");
        write_config_dir(&dir);

        env::set_var("PF_MONITOR_CONFIG", env_file.display().to_string());
        env::set_var("PF_MONITOR_CONFIG_DIR", dir.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.monitor_source, ConfigSource::Environment);
        assert_eq!(paths.monitor.unwrap(), env_file);
    });
}

#[test]
fn test_resolve_config_env_dir_over_xdg() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let dir = temp.path().join("config_dir");
        let dir_file = write_config_dir(&dir);
        let xdg_home = temp.path().join("xdg");
        write_config_dir(&xdg_home.join("prefire-monitor"));

        env::set_var("PF_MONITOR_CONFIG_DIR", dir.display().to_string());
        env::set_var("XDG_CONFIG_HOME", xdg_home.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.monitor_source, ConfigSource::Environment);
        assert_eq!(paths.monitor.unwrap(), dir_file);
    });
}

#[test]
fn test_resolve_config_xdg() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let xdg_home = temp.path().join("xdg");
        let xdg_file = write_config_dir(&xdg_home.join("prefire-monitor"));
        env::set_var("XDG_CONFIG_HOME", xdg_home.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.monitor_source, ConfigSource::XdgConfig);
        assert_eq!(paths.monitor.unwrap(), xdg_file);
    });
}

#[test]
fn test_env_path_to_missing_file_falls_through() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let dir = temp.path().join("config_dir");
        let dir_file = write_config_dir(&dir);
        env::set_var(
            "PF_MONITOR_CONFIG",
            temp.path().join("absent.json").display().to_string(),
        );
        env::set_var("PF_MONITOR_CONFIG_DIR", dir.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.monitor.unwrap(), dir_file);
    });
}

#[test]
fn test_presets_are_deterministic() {
    for &name in PresetName::ALL {
        assert_eq!(get_preset(name), get_preset(name));
        validate_monitor(&get_preset(name)).expect("preset validates");
    }
}

#[test]
fn test_snapshot_of_loaded_file() {
    let path = fixtures_dir().join("valid_monitor.json");
    let raw = fs::read_to_string(&path).expect("read fixture");
    let config = MonitorConfig::from_json(&raw).expect("parse fixture");
    let paths = resolve_config(Some(&path));

    let snapshot = ConfigSnapshot::new(&config, &paths, Some(&raw), Some("online"));
    assert_eq!(snapshot.source, "CLI argument");
    assert_eq!(snapshot.preset.as_deref(), Some("online"));
    assert_eq!(snapshot.summary.menu, "L1Menu_Collisions2018_v2_1_0");
    assert_eq!(snapshot.summary.menu_size, 16);
    assert!(!snapshot.matches(&ConfigSnapshot::defaults_only()));

    let json = snapshot.to_json().expect("serialize snapshot");
    assert!(json.contains(&snapshot.hash));
}
