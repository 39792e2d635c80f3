//! Global-trigger algorithm timing split by prefire classification.

use pf_common::{EventRecord, Result};
use pf_config::monitor::{AlgoTimingConfig, TriggerMenu};
use tracing::{debug, info};

use super::{Contribution, Monitor};
use crate::accumulator::{PrefireSplit, Split};
use crate::histogram::{Axis, Histogram2D, HistogramStore};
use crate::logging::event_names;
use crate::menu::{resolve_short_list, ResolvedAlgo};
use crate::prefire::Classification;

/// Size of the algorithm block when the menu does not say otherwise.
pub const DEFAULT_NUM_ALGORITHMS: usize = 512;

pub const UNPREFIRABLE_SUFFIX: &str = "_unpref";
pub const PREFIRABLE_SUFFIX: &str = "_pref";

/// Fills `(bx, algorithm)` for every initial decision bit that fired.
///
/// Three table pairs are kept: all algorithm bits, and the configured
/// prescaled and unprescaled short lists, whose rows are the list position
/// and carry `"<name> (<bit>)"` labels.
#[derive(Debug)]
pub struct AlgoTimingMonitor {
    folder: String,
    source: String,
    verbose: bool,
    prescaled: Vec<ResolvedAlgo>,
    unprescaled: Vec<ResolvedAlgo>,
    all_algos: PrefireSplit<Histogram2D>,
    prescaled_algos: PrefireSplit<Histogram2D>,
    unprescaled_algos: PrefireSplit<Histogram2D>,
}

impl AlgoTimingMonitor {
    pub fn new(config: &AlgoTimingConfig, menu: &TriggerMenu, source: &str) -> Result<Self> {
        let unprescaled = resolve_short_list(menu, &config.unprescaled_algo_short_list);
        let prescaled = resolve_short_list(menu, &config.prescaled_algo_short_list);

        let num_algs = match menu.size() {
            0 => DEFAULT_NUM_ALGORITHMS,
            n => n,
        };

        let all_algos = PrefireSplit::from_fn(|split| {
            book(
                "all_algos_vs_bx",
                &format!(
                    "All Algorithms vs. BX Number in Event for {} Events;Bunch Crossing Number In Event;Algorithm Trigger Bits",
                    split.label()
                ),
                split,
                num_algs,
            )
        });
        let prescaled_algos = labelled_pair(
            "prescaled_algos_vs_bx",
            "Prescaled",
            &prescaled,
        )?;
        let unprescaled_algos = labelled_pair(
            "unprescaled_algos_vs_bx",
            "Unprescaled",
            &unprescaled,
        )?;

        debug!(
            target: event_names::HIST_BOOKED,
            folder = %config.monitor_dir,
            num_algs,
            prescaled = prescaled.len(),
            unprescaled = unprescaled.len(),
            "booked algorithm timing tables"
        );

        Ok(AlgoTimingMonitor {
            folder: config.monitor_dir.clone(),
            source: source.to_string(),
            verbose: config.verbose,
            prescaled,
            unprescaled,
            all_algos,
            prescaled_algos,
            unprescaled_algos,
        })
    }

    pub fn all_algos(&self) -> &PrefireSplit<Histogram2D> {
        &self.all_algos
    }

    pub fn prescaled_algos(&self) -> &PrefireSplit<Histogram2D> {
        &self.prescaled_algos
    }

    pub fn unprescaled_algos(&self) -> &PrefireSplit<Histogram2D> {
        &self.unprescaled_algos
    }
}

fn split_suffix(split: Split) -> &'static str {
    match split {
        Split::Unprefirable => UNPREFIRABLE_SUFFIX,
        Split::Prefirable => PREFIRABLE_SUFFIX,
    }
}

fn book(base: &str, title: &str, split: Split, rows: usize) -> Histogram2D {
    Histogram2D::new(
        format!("{}{}", base, split_suffix(split)),
        title,
        Axis::new(5, -2.5, 2.5),
        Axis::new(rows, -0.5, rows as f64 - 0.5),
    )
}

fn labelled_pair(
    base: &str,
    kind: &str,
    algos: &[ResolvedAlgo],
) -> Result<PrefireSplit<Histogram2D>> {
    let mut pair = PrefireSplit::from_fn(|split| {
        book(
            base,
            &format!(
                "uGT: {} Algorithm Trigger Bits vs. BX Number In Event for {} Events;Bunch Crossing Number In Event;Algorithm Trigger Names + Bits",
                kind,
                split.label()
            ),
            split,
            algos.len(),
        )
    });
    for (row, algo) in algos.iter().enumerate() {
        let label = algo.label();
        pair.prefirable
            .y_axis_mut()
            .set_bin_label(row + 1, label.clone())?;
        pair.unprefirable.y_axis_mut().set_bin_label(row + 1, label)?;
    }
    Ok(pair)
}

impl Monitor for AlgoTimingMonitor {
    fn name(&self) -> &'static str {
        "algo_timing"
    }

    fn analyze(&mut self, event: &EventRecord, verdict: &Classification) -> Contribution {
        if self.verbose {
            debug!(event_id = %event.id, "algorithm timing: analyzing");
        }

        let blocks = match event.algo_blocks(&self.source) {
            Ok(blocks) => blocks,
            Err(e) => {
                info!(
                    target: event_names::COLLECTION_MISSING,
                    monitor = "algo_timing",
                    label = %self.source,
                    error = %e,
                    "Cannot find uGT readout record"
                );
                return Contribution::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        let unpref = verdict.unprefirable;
        let all = self.all_algos.select_mut(unpref);
        let prescaled = self.prescaled_algos.select_mut(unpref);
        let unprescaled = self.unprescaled_algos.select_mut(unpref);

        for (bx, bunch) in blocks.iter_bunches() {
            let x = f64::from(bx);
            for block in bunch {
                for bit in block.fired_bits() {
                    all.fill(x, bit as f64);
                }
                for (row, algo) in self.unprescaled.iter().enumerate() {
                    if block.decision(algo.bit) {
                        unprescaled.fill(x, row as f64);
                    }
                }
                for (row, algo) in self.prescaled.iter().enumerate() {
                    if block.decision(algo.bit) {
                        prescaled.fill(x, row as f64);
                    }
                }
            }
        }

        Contribution::Filled
    }

    fn publish(&self, store: &mut HistogramStore) {
        for pair in [&self.all_algos, &self.prescaled_algos, &self.unprescaled_algos] {
            for (_, hist) in pair.iter() {
                store.publish(&self.folder, hist.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_common::{AlgoBlock, BxVector, Collection};
    use pf_config::monitor::MenuAlgorithm;

    const SOURCE: &str = "gtStage2Digis";

    fn menu() -> TriggerMenu {
        TriggerMenu {
            name: "L1Menu_test".to_string(),
            num_algorithms: 8,
            algorithms: vec![
                MenuAlgorithm {
                    name: "L1_ZeroBias".to_string(),
                    bit: 0,
                },
                MenuAlgorithm {
                    name: "L1_SingleJet180".to_string(),
                    bit: 5,
                },
            ],
        }
    }

    fn config() -> AlgoTimingConfig {
        AlgoTimingConfig {
            unprescaled_algo_short_list: vec![
                "L1_SingleJet180".to_string(),
                "L1_NotInMenu".to_string(),
            ],
            prescaled_algo_short_list: vec!["L1_ZeroBias".to_string()],
            ..AlgoTimingConfig::default()
        }
    }

    fn verdict(unprefirable: bool) -> Classification {
        Classification {
            unprefirable,
            fired_rule: None,
            diagnostics: Vec::new(),
        }
    }

    fn event_with_blocks(blocks: BxVector<AlgoBlock>) -> EventRecord {
        EventRecord::new(1, 1, 1).with_collection(SOURCE, Collection::AlgoBlocks(blocks))
    }

    #[test]
    fn books_labelled_short_lists() {
        let monitor = AlgoTimingMonitor::new(&config(), &menu(), SOURCE).unwrap();
        let unpresc = &monitor.unprescaled_algos().unprefirable;
        assert_eq!(unpresc.name(), "unprescaled_algos_vs_bx_unpref");
        assert_eq!(unpresc.nbins_y(), 1);
        assert_eq!(unpresc.y_axis().bin_label(1), "L1_SingleJet180 (5)");
        assert_eq!(unpresc.x_axis().title(), "Bunch Crossing Number In Event");

        let all = &monitor.all_algos().prefirable;
        assert_eq!(all.name(), "all_algos_vs_bx_pref");
        assert_eq!(all.nbins_y(), 8);
        assert!(all.title().contains("Prefirable Events"));
    }

    #[test]
    fn fills_every_crossing_including_last() {
        let mut monitor = AlgoTimingMonitor::new(&config(), &menu(), SOURCE).unwrap();
        let blocks = BxVector::from_bunches(
            -1,
            vec![
                vec![AlgoBlock::from_bits(8, &[0])],
                vec![AlgoBlock::from_bits(8, &[0, 5])],
                vec![AlgoBlock::from_bits(8, &[5])],
            ],
        );
        let outcome = monitor.analyze(&event_with_blocks(blocks), &verdict(true));
        assert_eq!(outcome, Contribution::Filled);

        let all = &monitor.all_algos().unprefirable;
        assert_eq!(all.content_at(-1.0, 0.0), 1.0);
        assert_eq!(all.content_at(0.0, 0.0), 1.0);
        assert_eq!(all.content_at(0.0, 5.0), 1.0);
        assert_eq!(all.content_at(1.0, 5.0), 1.0);
        assert_eq!(monitor.all_algos().prefirable.entries(), 0);

        let unpresc = &monitor.unprescaled_algos().unprefirable;
        assert_eq!(unpresc.content_at(0.0, 0.0), 1.0);
        assert_eq!(unpresc.content_at(1.0, 0.0), 1.0);

        let presc = &monitor.prescaled_algos().unprefirable;
        assert_eq!(presc.content_at(-1.0, 0.0), 1.0);
        assert_eq!(presc.integral(), 2.0);
    }

    #[test]
    fn missing_blocks_skip_event() {
        let mut monitor = AlgoTimingMonitor::new(&config(), &menu(), SOURCE).unwrap();
        let outcome = monitor.analyze(&EventRecord::new(1, 1, 2), &verdict(false));
        assert!(matches!(outcome, Contribution::Skipped { .. }));
    }

    #[test]
    fn empty_menu_uses_full_block_size() {
        let monitor =
            AlgoTimingMonitor::new(&AlgoTimingConfig::default(), &TriggerMenu::default(), SOURCE)
                .unwrap();
        assert_eq!(
            monitor.all_algos().unprefirable.nbins_y(),
            DEFAULT_NUM_ALGORITHMS
        );
        assert_eq!(monitor.prescaled_algos().unprefirable.nbins_y(), 0);
    }

    #[test]
    fn publish_writes_six_tables() {
        let monitor = AlgoTimingMonitor::new(&config(), &menu(), SOURCE).unwrap();
        let mut store = HistogramStore::new();
        monitor.publish(&mut store);
        assert_eq!(store.len(), 6);
        assert!(store.contains("L1T/L1TStage2uGT/timing_aux/all_algos_vs_bx_unpref"));
        assert!(store.contains("L1T/L1TStage2uGT/timing_aux/prescaled_algos_vs_bx_pref"));
    }
}
