//! Per-event monitors.
//!
//! Each monitor owns its histograms, reads the collections it was configured
//! with and fills the side of its accumulators selected by the event's
//! classification. Snapshots are published into a [`HistogramStore`] at
//! batch boundaries.

pub mod algo_timing;
pub mod jet_prefiring;
pub mod object_timing;

pub use algo_timing::AlgoTimingMonitor;
pub use jet_prefiring::JetPrefiringMonitor;
pub use object_timing::ObjectTimingMonitor;

use pf_common::EventRecord;
use serde::Serialize;

use crate::histogram::HistogramStore;
use crate::prefire::Classification;

/// Number of bunch crossings with dedicated per-BX tables.
pub const NUM_BX: usize = 5;

/// Offset of BX 0 within the per-BX tables.
pub const CENTRAL_BX: i32 = 2;

/// Relative bunch crossings covered by the per-BX tables.
pub fn bx_window() -> std::ops::RangeInclusive<i32> {
    -CENTRAL_BX..=CENTRAL_BX
}

/// Slot of `bx` in a per-BX array, if it is inside the window.
pub fn bx_slot(bx: i32) -> Option<usize> {
    let slot = bx.checked_add(CENTRAL_BX)?;
    (0..NUM_BX as i32).contains(&slot).then_some(slot as usize)
}

/// What a monitor did with one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Contribution {
    /// Histograms were filled.
    Filled,
    /// The event does not concern this monitor.
    NotApplicable,
    /// An input was missing or unusable.
    Skipped { reason: String },
}

/// A histogram producer driven once per event.
pub trait Monitor {
    /// Short stable name used in reports and logs.
    fn name(&self) -> &'static str;

    /// Process one event given its classification.
    fn analyze(&mut self, event: &EventRecord, verdict: &Classification) -> Contribution;

    /// Copy the current histograms into `store`.
    fn publish(&self, store: &mut HistogramStore);
}
