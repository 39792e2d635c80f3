//! Configuration validation errors and semantic validation.

use std::collections::HashSet;

use thiserror::Error;

use crate::monitor::{ClientConfig, MonitorConfig, TriggerMenu};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a monitor configuration semantically.
pub fn validate_monitor(config: &MonitorConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let max_dr = config.matching.max_delta_r;
    if !max_dr.is_finite() || max_dr <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "matching.max_delta_r".to_string(),
            message: format!("Must be positive and finite, got {}", max_dr),
        });
    }

    let sources = &config.sources;
    require_non_empty("sources.accept_record", &sources.accept_record)?;
    require_non_empty("sources.algo_blocks", &sources.algo_blocks)?;
    require_non_empty("sources.offline_jets", &sources.offline_jets)?;
    require_non_empty("sources.l1_jets", &sources.l1_jets)?;

    if config.algo_timing.enabled {
        require_non_empty("algo_timing.monitor_dir", &config.algo_timing.monitor_dir)?;
        require_unique(
            "algo_timing.unprescaled_algo_short_list",
            &config.algo_timing.unprescaled_algo_short_list,
        )?;
        require_unique(
            "algo_timing.prescaled_algo_short_list",
            &config.algo_timing.prescaled_algo_short_list,
        )?;
    }
    if config.object_timing.enabled {
        require_non_empty("object_timing.hist_folder", &config.object_timing.hist_folder)?;
    }
    if config.jet_prefiring.enabled {
        require_non_empty("jet_prefiring.monitor_dir", &config.jet_prefiring.monitor_dir)?;
    }
    if config.client.enabled {
        validate_client(&config.client)?;
    }

    validate_menu(&config.trigger_menu)?;

    Ok(())
}

fn validate_client(client: &ClientConfig) -> ValidationResult<()> {
    require_non_empty("client.monitor_dir", &client.monitor_dir)?;
    require_non_empty("client.input_dir", &client.input_dir)?;
    require_non_empty("client.all_algs_hist", &client.all_algs_hist)?;
    require_non_empty("client.prescale_algs_hist", &client.prescale_algs_hist)?;
    require_non_empty("client.unprescale_algs_hist", &client.unprescale_algs_hist)?;

    if client.prefirable_suffix == client.unprefirable_suffix {
        return Err(ValidationError::SemanticError(format!(
            "client suffixes must differ, both are '{}'",
            client.prefirable_suffix
        )));
    }

    // The ratio tables are written next to their inputs unless the folders
    // differ, so identical base names would collide with the booked ratios.
    if client.monitor_dir == client.input_dir {
        let names = [
            &client.all_algs_hist,
            &client.prescale_algs_hist,
            &client.unprescale_algs_hist,
        ];
        for name in names {
            if name.starts_with("ratio_") || name.starts_with("relative_ratio_") {
                return Err(ValidationError::InvalidValue {
                    field: "client".to_string(),
                    message: format!("input histogram '{}' shadows a ratio table", name),
                });
            }
        }
    }

    Ok(())
}

fn validate_menu(menu: &TriggerMenu) -> ValidationResult<()> {
    let mut names = HashSet::new();
    let mut bits = HashSet::new();

    for algo in &menu.algorithms {
        if algo.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "trigger_menu.algorithms".to_string(),
                message: format!("algorithm at bit {} has an empty name", algo.bit),
            });
        }
        if !names.insert(algo.name.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "duplicate algorithm name '{}' in trigger menu",
                algo.name
            )));
        }
        if !bits.insert(algo.bit) {
            return Err(ValidationError::SemanticError(format!(
                "bit {} assigned to more than one algorithm ('{}')",
                algo.bit, algo.name
            )));
        }
        if menu.num_algorithms > 0 && algo.bit >= menu.num_algorithms {
            return Err(ValidationError::InvalidValue {
                field: "trigger_menu.algorithms".to_string(),
                message: format!(
                    "bit {} of '{}' exceeds num_algorithms {}",
                    algo.bit, algo.name, menu.num_algorithms
                ),
            });
        }
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "Must not be empty".to_string(),
        });
    }
    Ok(())
}

fn require_unique(field: &str, values: &[String]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("duplicate entry '{}'", value),
            });
        }
    }
    Ok(())
}
