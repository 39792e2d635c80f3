//! Fuzz target for monitor.json configuration parsing.
//!
//! Tests that parsing and semantic validation handle arbitrary input
//! without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pf_config::{validate_monitor, MonitorConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<MonitorConfig>(data) {
        let _ = validate_monitor(&config);
    }
});
