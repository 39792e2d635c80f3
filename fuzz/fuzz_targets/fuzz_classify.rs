//! Fuzz target for prefire classification.
//!
//! The verdict depends only on the four most recent accepts.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pf_core::prefire::{classify, AcceptHistory};

fuzz_target!(|distances: Vec<u64>| {
    let full = classify(&AcceptHistory::from_distances(distances.clone()));
    if distances.len() > 4 {
        let head = classify(&AcceptHistory::from_distances(distances[..4].to_vec()));
        assert_eq!(full.unprefirable, head.unprefirable);
        assert_eq!(full.fired_rule, head.fired_rule);
    }
});
