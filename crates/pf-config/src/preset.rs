//! Configuration presets for the two deployment flavours.
//!
//! - Online: monitors reading unpacked hardware collections
//! - Emulator: the same monitors on emulated L1 jets, booked under `L1TEMU/`

use crate::monitor::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Online,
    Emulator,
}

impl PresetName {
    pub const ALL: &'static [PresetName] = &[PresetName::Online, PresetName::Emulator];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Online => "online",
            PresetName::Emulator => "emulator",
        }
    }

    /// Case-insensitive, with short aliases (`hw`, `emu`, `sim`).
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" | "data" | "hw" => Some(PresetName::Online),
            "emulator" | "emu" | "sim" => Some(PresetName::Emulator),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Online => "Hardware collections from the unpacker, L1T folders",
            PresetName::Emulator => "Emulated calorimeter jets (simCaloStage2Digis), L1TEMU folders",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset {
            name: s.to_string(),
            available: available_names(),
        })
    }
}

fn available_names() -> String {
    PresetName::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Error)]
pub enum PresetError {
    #[error("unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
}

/// Get the configuration for a preset.
pub fn get_preset(name: PresetName) -> MonitorConfig {
    match name {
        PresetName::Online => MonitorConfig::default(),
        PresetName::Emulator => emulator_preset(),
    }
}

fn emulator_preset() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.sources.l1_jets = "simCaloStage2Digis".to_string();
    config.object_timing.hist_folder = "L1TEMU/L1TObjects/Timing".to_string();
    config.jet_prefiring.monitor_dir = "L1TEMU/L1TObjects/Prefiring".to_string();
    config.algo_timing.monitor_dir = "L1TEMU/L1TStage2uGT/timing_aux".to_string();
    config.client.input_dir = config.algo_timing.monitor_dir.clone();
    config.client.monitor_dir = "L1TEMU/L1TStage2uGT/timing_aux/Ratios".to_string();
    config
}

/// Preset information for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: String,
}

/// List all available presets.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo {
            name,
            description: name.description().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_monitor;

    #[test]
    fn test_preset_name_parsing() {
        assert_eq!(PresetName::parse("online"), Some(PresetName::Online));
        assert_eq!(PresetName::parse("EMU"), Some(PresetName::Emulator));
        assert_eq!(PresetName::parse("sim"), Some(PresetName::Emulator));
        assert_eq!(PresetName::parse("offline"), None);
    }

    #[test]
    fn test_presets_validate() {
        for &name in PresetName::ALL {
            validate_monitor(&get_preset(name)).unwrap();
        }
    }

    #[test]
    fn test_emulator_preset_moves_folders() {
        let config = get_preset(PresetName::Emulator);
        assert_eq!(config.sources.l1_jets, "simCaloStage2Digis");
        assert_eq!(config.object_timing.hist_folder, "L1TEMU/L1TObjects/Timing");
        assert_eq!(config.client.input_dir, config.algo_timing.monitor_dir);
        assert!(config.client.monitor_dir.starts_with("L1TEMU/"));
    }

    #[test]
    fn test_preset_error_display() {
        let err: PresetError = "bogus".parse::<PresetName>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bogus"));
        assert!(msg.contains("online, emulator"));
    }

    #[test]
    fn test_list_presets() {
        let presets = list_presets();
        assert_eq!(presets.len(), 2);
        assert!(presets.iter().all(|p| !p.description.is_empty()));
    }
}
