//! Error types for the prefire monitor.
//!
//! Errors carry:
//! - Stable error codes for machine parsing
//! - A category for grouping
//! - A recoverability hint (most input problems only cost one event)
//! - A remediation hint for humans
//!
//! Errors serialize to structured JSON for the CLI's machine output:
//! ```json
//! {
//!   "code": 20,
//!   "category": "input",
//!   "message": "collection 'caloStage2Digis:Jet' not found in event",
//!   "recoverable": true,
//!   "suggested_action": "skip_event",
//!   "remediation": "Check the collection labels under 'sources' ...",
//!   "context": { "label": "caloStage2Digis:Jet" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for prefire monitor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file and trigger menu errors.
    Config,
    /// Missing or malformed per-event input.
    Input,
    /// Histogram booking, lookup, and arithmetic errors.
    Histogram,
    /// File I/O and serialization errors.
    Io,
}

/// What a caller should do in response to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Drop this event's contribution and continue the run.
    SkipEvent,
    /// Fix the configuration and rerun.
    FixConfig,
    /// Inspect the input file.
    CheckInput,
    /// Abort the run.
    Abort,
}

/// Unified error type for the prefire monitor.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("algorithm '{name}' not found in trigger menu '{menu}'")]
    UnknownAlgorithm { name: String, menu: String },

    // Input errors (20-29)
    #[error("collection '{label}' not found in event")]
    CollectionNotFound { label: String },

    #[error("collection '{label}' has type {actual}, expected {expected}")]
    CollectionType {
        label: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid event record: {0}")]
    InvalidEvent(String),

    // Histogram errors (30-39)
    #[error("histogram '{path}' not found")]
    HistogramNotFound { path: String },

    #[error("histogram shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("bin {bin} out of range for axis with {bins} bins")]
    BinOutOfRange { bin: usize, bins: usize },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Histogram errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::UnknownAlgorithm { .. } => 11,
            Error::CollectionNotFound { .. } => 20,
            Error::CollectionType { .. } => 21,
            Error::InvalidEvent(_) => 22,
            Error::HistogramNotFound { .. } => 30,
            Error::ShapeMismatch(_) => 31,
            Error::BinOutOfRange { .. } => 32,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::UnknownAlgorithm { .. } => ErrorCategory::Config,

            Error::CollectionNotFound { .. }
            | Error::CollectionType { .. }
            | Error::InvalidEvent(_) => ErrorCategory::Input,

            Error::HistogramNotFound { .. }
            | Error::ShapeMismatch(_)
            | Error::BinOutOfRange { .. } => ErrorCategory::Histogram,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the run can continue past this error.
    ///
    /// Input problems degrade statistics for one event; they never stop a run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => false,
            Error::UnknownAlgorithm { .. } => true,

            Error::CollectionNotFound { .. } => true,
            Error::CollectionType { .. } => true,
            Error::InvalidEvent(_) => true,

            // Harvesting retries at the next boundary
            Error::HistogramNotFound { .. } => true,
            Error::ShapeMismatch(_) => false,
            Error::BinOutOfRange { .. } => false,

            Error::Io(_) => false,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for automated callers.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::FixConfig,
            Error::UnknownAlgorithm { .. } => SuggestedAction::FixConfig,

            Error::CollectionNotFound { .. }
            | Error::CollectionType { .. }
            | Error::InvalidEvent(_) => SuggestedAction::SkipEvent,

            Error::HistogramNotFound { .. } => SuggestedAction::SkipEvent,
            Error::ShapeMismatch(_) | Error::BinOutOfRange { .. } => SuggestedAction::Abort,

            Error::Io(_) => SuggestedAction::Abort,
            Error::Json(_) => SuggestedAction::CheckInput,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'pf-core check' to validate the configuration file."
            }
            Error::UnknownAlgorithm { .. } => {
                "Remove the algorithm from the short list or add it to trigger_menu.algorithms."
            }
            Error::CollectionNotFound { .. } => {
                "Check the collection labels under 'sources' against the labels present in the event file."
            }
            Error::CollectionType { .. } => {
                "The label points at a collection of a different kind. Check 'sources' in the configuration."
            }
            Error::InvalidEvent(_) => {
                "The event record is malformed. Validate it against 'pf-core schema EventRecord'."
            }
            Error::HistogramNotFound { .. } => {
                "The harvester input is not booked yet. Check client.input_dir and the histogram names."
            }
            Error::ShapeMismatch(_) => {
                "Numerator and denominator tables must share binning. This is a bug; please report it."
            }
            Error::BinOutOfRange { .. } => {
                "A bin index outside the axis was requested. This is a bug; please report it."
            }
            Error::Io(_) => "Check that the file exists and is readable/writable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the run can continue.
    pub recoverable: bool,

    /// Suggested action for automated callers.
    pub suggested_action: SuggestedAction,

    pub remediation: String,

    /// Additional structured context (e.g., collection label, histogram path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::UnknownAlgorithm { name, menu } => {
                context.insert("algorithm".to_string(), serde_json::json!(name));
                context.insert("menu".to_string(), serde_json::json!(menu));
            }
            Error::CollectionNotFound { label } => {
                context.insert("label".to_string(), serde_json::json!(label));
            }
            Error::CollectionType {
                label,
                expected,
                actual,
            } => {
                context.insert("label".to_string(), serde_json::json!(label));
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::HistogramNotFound { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            remediation: err.remediation().to_string(),
            context,
        }
    }
}
