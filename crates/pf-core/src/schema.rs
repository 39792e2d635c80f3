//! JSON Schema generation for input and output data formats.
//!
//! ```bash
//! # List available schema types
//! pf-core schema --list
//!
//! # Generate the schema of one type
//! pf-core schema EventRecord
//!
//! # Generate all schemas
//! pf-core schema --all
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::histogram::{Histogram1D, Histogram2D, HistogramStore};
pub use crate::matching::MatchResult;
pub use crate::prefire::{Classification, Diagnostic, TriggerRule};
pub use pf_common::{AcceptEvent, AcceptRecord, AlgoBlock, Collection, EventRecord, Jet};
pub use pf_config::MonitorConfig;

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        // Input
        ("EventRecord", "One event with its labelled collections"),
        ("Collection", "A labelled collection inside an event"),
        ("AcceptEvent", "Bunch crossing and orbit of one accept"),
        (
            "AcceptRecord",
            "Current crossing plus the recent accept history",
        ),
        ("AlgoBlock", "Initial algorithm decisions for one crossing"),
        ("Jet", "Jet kinematics (pt, eta, phi)"),
        // Configuration
        ("MonitorConfig", "Monitor configuration (monitor.json)"),
        // Classification and matching
        ("TriggerRule", "Accept-rate window (n accepts in w crossings)"),
        ("Diagnostic", "Non-fatal accept-history finding"),
        (
            "Classification",
            "Prefire verdict with fired rule and diagnostics",
        ),
        ("MatchResult", "Outcome of matching one reference object"),
        // Histograms
        ("Histogram1D", "One-dimensional histogram"),
        ("Histogram2D", "Two-dimensional histogram"),
        ("HistogramStore", "All published histograms by path"),
    ]
}

/// Generate the JSON Schema of a type by name, or None if it is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "EventRecord" => schema_for!(EventRecord),
        "Collection" => schema_for!(Collection),
        "AcceptEvent" => schema_for!(AcceptEvent),
        "AcceptRecord" => schema_for!(AcceptRecord),
        "AlgoBlock" => schema_for!(AlgoBlock),
        "Jet" => schema_for!(Jet),
        "MonitorConfig" => schema_for!(MonitorConfig),
        "TriggerRule" => schema_for!(TriggerRule),
        "Diagnostic" => schema_for!(Diagnostic),
        "Classification" => schema_for!(Classification),
        "MatchResult" => schema_for!(MatchResult),
        "Histogram1D" => schema_for!(Histogram1D),
        "Histogram2D" => schema_for!(Histogram2D),
        "HistogramStore" => schema_for!(HistogramStore),
        _ => return None,
    };

    serde_json::to_value(schema).ok()
}

/// Generate all schemas keyed by type name.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}
