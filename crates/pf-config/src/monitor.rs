//! Typed monitor configuration (monitor.json).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Complete monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonitorConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub sources: SourceLabels,

    #[serde(default)]
    pub trigger_menu: TriggerMenu,

    #[serde(default)]
    pub algo_timing: AlgoTimingConfig,

    #[serde(default)]
    pub object_timing: ObjectTimingConfig,

    #[serde(default)]
    pub jet_prefiring: JetPrefiringConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub matching: MatchingConfig,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            schema_version: default_schema_version(),
            sources: SourceLabels::default(),
            trigger_menu: TriggerMenu::default(),
            algo_timing: AlgoTimingConfig::default(),
            object_timing: ObjectTimingConfig::default(),
            jet_prefiring: JetPrefiringConfig::default(),
            client: ClientConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from a JSON file without semantic validation.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Parse from a JSON string without semantic validation.
    pub fn from_json(content: &str) -> ValidationResult<Self> {
        serde_json::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }
}

/// Labels of the input collections inside each event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SourceLabels {
    /// Timing/control record carrying the accept history.
    pub accept_record: String,
    /// Global-trigger algorithm blocks.
    pub algo_blocks: String,
    /// Offline (particle-flow) jets.
    pub offline_jets: String,
    /// L1 calorimeter jets per bunch crossing.
    pub l1_jets: String,
}

impl Default for SourceLabels {
    fn default() -> Self {
        SourceLabels {
            accept_record: "tcdsDigis:tcdsRecord".to_string(),
            algo_blocks: "gtStage2Digis".to_string(),
            offline_jets: "goodPFJetsForL1T".to_string(),
            l1_jets: "caloStage2Digis:Jet".to_string(),
        }
    }
}

/// Name → bit mapping of the trigger menu in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TriggerMenu {
    pub name: String,
    /// Total number of algorithm bits in the menu; 0 derives it from `algorithms`.
    pub num_algorithms: usize,
    pub algorithms: Vec<MenuAlgorithm>,
}

impl Default for TriggerMenu {
    fn default() -> Self {
        TriggerMenu {
            name: "L1Menu_default".to_string(),
            num_algorithms: 0,
            algorithms: Vec::new(),
        }
    }
}

impl TriggerMenu {
    /// Bit number for an algorithm name.
    pub fn bit_for(&self, name: &str) -> Option<usize> {
        self.algorithms
            .iter()
            .find(|algo| algo.name == name)
            .map(|algo| algo.bit)
    }

    /// Number of algorithm bits the menu defines.
    pub fn size(&self) -> usize {
        let from_algorithms = self
            .algorithms
            .iter()
            .map(|a| a.bit + 1)
            .max()
            .unwrap_or(0);
        self.num_algorithms.max(from_algorithms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MenuAlgorithm {
    pub name: String,
    pub bit: usize,
}

/// Algorithm-bit timing split by prefire classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AlgoTimingConfig {
    pub enabled: bool,
    pub monitor_dir: String,
    pub verbose: bool,
    /// Algorithms run without prescale.
    pub unprescaled_algo_short_list: Vec<String>,
    /// Algorithms run with a prescale.
    pub prescaled_algo_short_list: Vec<String>,
}

impl Default for AlgoTimingConfig {
    fn default() -> Self {
        AlgoTimingConfig {
            enabled: true,
            monitor_dir: "L1T/L1TStage2uGT/timing_aux".to_string(),
            verbose: false,
            unprescaled_algo_short_list: Vec::new(),
            prescaled_algo_short_list: Vec::new(),
        }
    }
}

/// Matched-jet timing for offline vs L1 jets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ObjectTimingConfig {
    pub enabled: bool,
    pub hist_folder: String,
}

impl Default for ObjectTimingConfig {
    fn default() -> Self {
        ObjectTimingConfig {
            enabled: true,
            hist_folder: "L1T/L1TObjects/Timing".to_string(),
        }
    }
}

/// Jet matching restricted to unprefirable events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct JetPrefiringConfig {
    pub enabled: bool,
    pub monitor_dir: String,
    pub verbose: bool,
}

impl Default for JetPrefiringConfig {
    fn default() -> Self {
        JetPrefiringConfig {
            enabled: true,
            monitor_dir: "L1T/L1TObjects/Prefiring".to_string(),
            verbose: false,
        }
    }
}

/// Harvester that turns unprefirable/prefirable tables into ratios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClientConfig {
    pub enabled: bool,
    /// Folder the ratio tables are booked in.
    pub monitor_dir: String,
    /// Folder holding the unprefirable/prefirable inputs.
    pub input_dir: String,
    pub all_algs_hist: String,
    pub prescale_algs_hist: String,
    pub unprescale_algs_hist: String,
    pub prefirable_suffix: String,
    pub unprefirable_suffix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            enabled: true,
            monitor_dir: "L1T/L1TStage2uGT/timing_aux/Ratios".to_string(),
            input_dir: "L1T/L1TStage2uGT/timing_aux".to_string(),
            all_algs_hist: "all_algos_vs_bx".to_string(),
            prescale_algs_hist: "prescaled_algos_vs_bx".to_string(),
            unprescale_algs_hist: "unprescaled_algos_vs_bx".to_string(),
            prefirable_suffix: "_pref".to_string(),
            unprefirable_suffix: "_unpref".to_string(),
        }
    }
}

/// How the matcher picks a candidate within one bunch crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Take the first candidate that improves on the current best and move
    /// on to the next crossing.
    #[default]
    FirstImprovement,
    /// Scan every candidate for the smallest separation.
    Nearest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MatchingConfig {
    /// Largest ΔR accepted as a match (exclusive).
    pub max_delta_r: f64,
    pub mode: MatchMode,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        MatchingConfig {
            max_delta_r: 0.3,
            mode: MatchMode::FirstImprovement,
        }
    }
}
