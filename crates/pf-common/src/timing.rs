//! Bunch-crossing timestamps and the L1 accept history.
//!
//! A bunch crossing is identified by its 1-based position in the orbit
//! (`bx_id`, 1..=3564) and the orbit counter. Flattening the pair gives a
//! monotonically increasing tick count that the trigger rules compare against.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of bunch crossings in one LHC orbit.
pub const ORBIT_LENGTH: u64 = 3564;

/// Depth of the accept history required by the trigger rules.
pub const REQUIRED_HISTORY_DEPTH: usize = 4;

/// One trigger-accept timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AcceptEvent {
    /// 1-based bunch-crossing id within the orbit.
    pub bx_id: u32,
    /// Orbit counter since the start of the fill.
    pub orbit: u64,
}

impl AcceptEvent {
    pub fn new(bx_id: u32, orbit: u64) -> Self {
        AcceptEvent { bx_id, orbit }
    }

    /// Ticks since the orbit counter started: `(bx_id - 1) + orbit * 3564`.
    ///
    /// A zero `bx_id` saturates to the first tick of its orbit.
    pub fn ticks(&self) -> u64 {
        self.orbit
            .saturating_mul(ORBIT_LENGTH)
            .saturating_add(u64::from(self.bx_id))
            .saturating_sub(1)
    }
}

impl std::fmt::Display for AcceptEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bx {} / orbit {}", self.bx_id, self.orbit)
    }
}

/// The accept-history payload delivered with every event.
///
/// `history` is ordered most recent first. The hardware record keeps 16
/// entries; the trigger rules only look at the first four.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AcceptRecord {
    /// The current event's own accept.
    pub current: AcceptEvent,
    /// Previous accepts, most recent first.
    #[serde(default)]
    pub history: Vec<AcceptEvent>,
}

impl AcceptRecord {
    pub fn new(current: AcceptEvent, history: Vec<AcceptEvent>) -> Self {
        AcceptRecord { current, history }
    }

    /// Build a record from tick distances to the previous accepts.
    ///
    /// Convenient for tests and for the `classify` command, which accept
    /// histories already reduced to distances.
    pub fn from_distances(current: AcceptEvent, distances: &[u64]) -> Self {
        let now = current.ticks();
        let history = distances
            .iter()
            .map(|d| {
                let ticks = now.saturating_sub(*d);
                AcceptEvent {
                    bx_id: (ticks % ORBIT_LENGTH) as u32 + 1,
                    orbit: ticks / ORBIT_LENGTH,
                }
            })
            .collect();
        AcceptRecord { current, history }
    }
}
