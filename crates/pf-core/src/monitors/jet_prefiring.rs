//! Offline/online jet matching in unprefirable events.

use pf_common::{EventRecord, Kinematics};
use pf_config::monitor::{JetPrefiringConfig, MatchingConfig, SourceLabels};
use tracing::{debug, info};

use super::{bx_slot, bx_window, Contribution, Monitor, NUM_BX};
use crate::histogram::{Axis, Histogram2D, HistogramStore};
use crate::logging::event_names;
use crate::matching::{find_match_all_bx, MatchResult};
use crate::prefire::Classification;

/// Matched-jet kinematics per crossing. Only unprefirable events contribute.
#[derive(Debug)]
pub struct JetPrefiringMonitor {
    folder: String,
    offline_source: String,
    l1_source: String,
    matching: MatchingConfig,
    verbose: bool,
    njets: Histogram2D,
    offline_pt_eta: Vec<Histogram2D>,
    online_pt_eta: Vec<Histogram2D>,
}

fn pt_eta_table(prefix: &str, which: &str, bx: i32) -> Histogram2D {
    Histogram2D::new(
        format!("{}_pt_eta_bx{}", prefix, bx),
        &format!(
            "{} Pt and Eta for matched jets in BX = {} ; {} Pt (GeV); {} #eta (rad)",
            which, bx, which, which
        ),
        Axis::new(100, 0.0, 500.0),
        Axis::new(5, -2.5, 2.5),
    )
}

impl JetPrefiringMonitor {
    pub fn new(
        config: &JetPrefiringConfig,
        sources: &SourceLabels,
        matching: &MatchingConfig,
    ) -> Self {
        let mut offline_pt_eta = Vec::with_capacity(NUM_BX);
        let mut online_pt_eta = Vec::with_capacity(NUM_BX);
        for bx in bx_window() {
            offline_pt_eta.push(pt_eta_table("offline", "Offline", bx));
            online_pt_eta.push(pt_eta_table("online", "Online", bx));
        }

        debug!(
            target: event_names::HIST_BOOKED,
            folder = %config.monitor_dir,
            "booked jet prefiring tables"
        );

        JetPrefiringMonitor {
            folder: config.monitor_dir.clone(),
            offline_source: sources.offline_jets.clone(),
            l1_source: sources.l1_jets.clone(),
            matching: matching.clone(),
            verbose: config.verbose,
            njets: Histogram2D::new(
                "offline_vs_online_njets",
                "nJets in offline vs online",
                Axis::new(100, 0.0, 100.0),
                Axis::new(100, 0.0, 100.0),
            ),
            offline_pt_eta,
            online_pt_eta,
        }
    }

    pub fn njets(&self) -> &Histogram2D {
        &self.njets
    }

    pub fn offline_pt_eta(&self) -> &[Histogram2D] {
        &self.offline_pt_eta
    }

    pub fn online_pt_eta(&self) -> &[Histogram2D] {
        &self.online_pt_eta
    }
}

impl Monitor for JetPrefiringMonitor {
    fn name(&self) -> &'static str {
        "jet_prefiring"
    }

    fn analyze(&mut self, event: &EventRecord, verdict: &Classification) -> Contribution {
        if self.verbose {
            debug!(event_id = %event.id, "jet prefiring: analyzing");
        }
        if !verdict.unprefirable {
            return Contribution::NotApplicable;
        }

        let offline = match event.jets(&self.offline_source) {
            Ok(jets) => jets,
            Err(e) => {
                info!(
                    target: event_names::COLLECTION_MISSING,
                    monitor = "jet_prefiring",
                    label = %self.offline_source,
                    error = %e,
                    "Cannot find offline jet record"
                );
                return Contribution::Skipped {
                    reason: e.to_string(),
                };
            }
        };
        let online = match event.bx_jets(&self.l1_source) {
            Ok(jets) => jets,
            Err(e) => {
                info!(
                    target: event_names::COLLECTION_MISSING,
                    monitor = "jet_prefiring",
                    label = %self.l1_source,
                    error = %e,
                    "Cannot find online jet record"
                );
                return Contribution::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        self.njets
            .fill(online.size() as f64, offline.len() as f64);

        for jet in offline {
            let result =
                find_match_all_bx(jet, online, self.matching.max_delta_r, self.matching.mode);
            let MatchResult::Matched { bx, index, .. } = result else {
                continue;
            };
            let Some(slot) = bx_slot(bx) else {
                debug!(
                    target: event_names::MATCH_OUTSIDE_WINDOW,
                    monitor = "jet_prefiring",
                    bx,
                    "matched online jet outside the per-BX tables"
                );
                continue;
            };
            let matched = &online.at(bx)[index];
            self.offline_pt_eta[slot].fill(jet.pt(), jet.eta());
            self.online_pt_eta[slot].fill(matched.pt(), matched.eta());
        }

        Contribution::Filled
    }

    fn publish(&self, store: &mut HistogramStore) {
        store.publish(&self.folder, self.njets.clone());
        for hist in self.offline_pt_eta.iter().chain(&self.online_pt_eta) {
            store.publish(&self.folder, hist.clone());
        }
    }
}
