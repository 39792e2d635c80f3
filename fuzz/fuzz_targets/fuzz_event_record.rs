//! Fuzz target for event record parsing, classification and matching.
//!
//! Any record that parses must classify and match without panicking,
//! including histories with accepts after the current crossing and
//! crossing ranges at the edges of `i32`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pf_common::{Collection, EventRecord};
use pf_config::MatchMode;
use pf_core::matching::find_match_all_bx;
use pf_core::prefire::classify_record;

fuzz_target!(|data: &[u8]| {
    let Ok(event) = serde_json::from_slice::<EventRecord>(data) else {
        return;
    };
    let references: Vec<_> = event
        .collections
        .values()
        .filter_map(|c| match c {
            Collection::Jets(jets) => Some(jets.as_slice()),
            _ => None,
        })
        .flatten()
        .collect();

    for collection in event.collections.values() {
        match collection {
            Collection::AcceptRecord(record) => {
                let _ = classify_record(record);
            }
            Collection::BxJets(candidates) => {
                let _ = candidates.iter_bunches().count();
                for reference in &references {
                    for mode in [MatchMode::FirstImprovement, MatchMode::Nearest] {
                        let _ = find_match_all_bx(*reference, candidates, 0.4, mode);
                    }
                }
            }
            _ => {}
        }
    }
});
