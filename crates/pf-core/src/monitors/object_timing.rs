//! Timing of L1 jets matched to offline jets.

use pf_common::{EventRecord, Jet};
use pf_config::monitor::{MatchingConfig, ObjectTimingConfig, SourceLabels};
use tracing::{debug, warn};

use super::{bx_slot, bx_window, Contribution, Monitor, NUM_BX};
use crate::accumulator::{PrefireSplit, Split};
use crate::histogram::{Axis, Histogram1D, Histogram2D, HistogramStore};
use crate::logging::event_names;
use crate::matching::{find_match_all_bx, MatchResult};
use crate::prefire::Classification;

/// Histograms for one side of the prefire split.
#[derive(Debug, Clone)]
pub struct TimingPlots {
    pub matched_bx: Histogram1D,
    pub pt_eta: Vec<Histogram2D>,
    pub phi_eta: Vec<Histogram2D>,
}

/// Name fragment for a crossing: `m2`, `m1`, `O0`, `p1`, `p2`.
pub fn bx_tag(bx: i32) -> String {
    let sign = match bx.signum() {
        1 => 'p',
        -1 => 'm',
        _ => 'O',
    };
    format!("{}{}", sign, bx.unsigned_abs())
}

impl TimingPlots {
    fn book(split: Split) -> Self {
        let label = split.label();
        let matched_bx = Histogram1D::new(
            format!("BXOfMatchedJets_{}", label),
            &format!(
                "Relative bunch crossing for matched L1 jets in {} events; Relative Bunch Crossing; No. of events",
                label
            ),
            Axis::new(5, -2.5, 2.5),
        );

        let mut pt_eta = Vec::with_capacity(NUM_BX);
        let mut phi_eta = Vec::with_capacity(NUM_BX);
        for bx in bx_window() {
            let tag = bx_tag(bx);
            pt_eta.push(Histogram2D::new(
                format!("PFJetEtVsEta_{}_{}", label, tag),
                &format!(
                    "E_{{T}} vs #eta for PFJets matched to L1Jets in {} Events for BX={}; PF Jet #eta; PF Jet E_{{T}} (GeV)",
                    label, bx
                ),
                Axis::new(50, -5.0, 5.0),
                Axis::new(35, 0.0, 700.0),
            ));
            phi_eta.push(Histogram2D::new(
                format!("PFJetPhiVsEta_{}_{}", label, tag),
                &format!(
                    "#phi vs #eta for PFJets matched to L1Jet in {} Events for BX={}; PF Jet #eta; PF Jet #phi",
                    label, bx
                ),
                Axis::new(50, -5.0, 5.0),
                Axis::new(35, -3.2, 3.2),
            ));
        }

        TimingPlots {
            matched_bx,
            pt_eta,
            phi_eta,
        }
    }

    /// Record one matched pair; returns false when the crossing has no
    /// dedicated tables.
    fn fill_matched(&mut self, offline: &Jet, bx: i32) -> bool {
        self.matched_bx.fill_within_limits(f64::from(bx));
        match bx_slot(bx) {
            Some(slot) => {
                self.pt_eta[slot].fill_within_limits(offline.eta, offline.pt);
                self.phi_eta[slot].fill_within_limits(offline.eta, offline.phi);
                true
            }
            None => false,
        }
    }
}

/// Matches every offline jet to the L1 jets of all read-out crossings and
/// records where the match landed.
#[derive(Debug)]
pub struct ObjectTimingMonitor {
    folder: String,
    offline_source: String,
    l1_source: String,
    matching: MatchingConfig,
    prefirable: Histogram1D,
    plots: PrefireSplit<TimingPlots>,
}

impl ObjectTimingMonitor {
    pub fn new(
        config: &ObjectTimingConfig,
        sources: &SourceLabels,
        matching: &MatchingConfig,
    ) -> Self {
        debug!(
            target: event_names::HIST_BOOKED,
            folder = %config.hist_folder,
            "booked object timing tables"
        );
        ObjectTimingMonitor {
            folder: config.hist_folder.clone(),
            offline_source: sources.offline_jets.clone(),
            l1_source: sources.l1_jets.clone(),
            matching: matching.clone(),
            prefirable: Histogram1D::new(
                "Prefirable",
                "Was the event prefirable; Was event prefirable; No. of events",
                Axis::new(2, -0.5, 1.5),
            ),
            plots: PrefireSplit::from_fn(TimingPlots::book),
        }
    }

    pub fn prefirable(&self) -> &Histogram1D {
        &self.prefirable
    }

    pub fn plots(&self) -> &PrefireSplit<TimingPlots> {
        &self.plots
    }
}

impl Monitor for ObjectTimingMonitor {
    fn name(&self) -> &'static str {
        "object_timing"
    }

    fn analyze(&mut self, event: &EventRecord, verdict: &Classification) -> Contribution {
        self.prefirable
            .fill_within_limits(if verdict.unprefirable { 1.0 } else { 0.0 });

        let offline = match event.jets(&self.offline_source) {
            Ok(jets) => jets,
            Err(e) => {
                warn!(
                    target: event_names::COLLECTION_MISSING,
                    monitor = "object_timing",
                    label = %self.offline_source,
                    error = %e,
                    "invalid collection: PF jets"
                );
                return Contribution::Skipped {
                    reason: e.to_string(),
                };
            }
        };
        let l1 = match event.bx_jets(&self.l1_source) {
            Ok(jets) => jets,
            Err(e) => {
                warn!(
                    target: event_names::COLLECTION_MISSING,
                    monitor = "object_timing",
                    label = %self.l1_source,
                    error = %e,
                    "invalid collection: L1 jets"
                );
                return Contribution::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        if offline.is_empty() {
            debug!(event_id = %event.id, "no PF jets found");
            return Contribution::Filled;
        }

        let plots = self.plots.select_mut(verdict.unprefirable);
        for jet in offline {
            let result = find_match_all_bx(jet, l1, self.matching.max_delta_r, self.matching.mode);
            if let MatchResult::Matched { bx, .. } = result {
                if !plots.fill_matched(jet, bx) {
                    debug!(
                        target: event_names::MATCH_OUTSIDE_WINDOW,
                        monitor = "object_timing",
                        bx,
                        "matched L1 jet outside the per-BX tables"
                    );
                }
            }
        }

        Contribution::Filled
    }

    fn publish(&self, store: &mut HistogramStore) {
        store.publish(&self.folder, self.prefirable.clone());
        for (_, plots) in self.plots.iter() {
            store.publish(&self.folder, plots.matched_bx.clone());
            for hist in plots.pt_eta.iter().chain(&plots.phi_eta) {
                store.publish(&self.folder, hist.clone());
            }
        }
    }
}
