//! Monitoring job lifecycle.
//!
//! A job owns every enabled monitor, the histogram store and the harvester.
//! Phases:
//!
//! 1. [`MonitoringJob::initialize`] books all histograms.
//! 2. [`MonitoringJob::on_event`] classifies the event once and hands the
//!    verdict to each monitor. A change of luminosity block closes the
//!    previous block first.
//! 3. [`MonitoringJob::end_luminosity_block`] publishes snapshots and runs
//!    the harvester.
//! 4. [`MonitoringJob::finalize`] closes the last block and returns the
//!    report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pf_common::{EventRecord, Result, SCHEMA_VERSION};
use pf_config::MonitorConfig;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::histogram::HistogramStore;
use crate::logging::{event_names, generate_run_id, Stage};
use crate::monitors::{
    AlgoTimingMonitor, Contribution, JetPrefiringMonitor, Monitor, ObjectTimingMonitor,
};
use crate::prefire::{classify_record, Classification, Diagnostic};
use crate::ratio::{HarvestOutcome, PrefiringClient, RatioTables};

/// Per-monitor event counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    pub filled: u64,
    pub not_applicable: u64,
    pub skipped: u64,
}

/// Counters accumulated over a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub events: u64,
    pub unprefirable: u64,
    pub prefirable: u64,
    /// Events without a usable accept record.
    pub unclassified: u64,
    pub events_with_diagnostics: u64,
    /// Diagnostic counts keyed by event name.
    pub diagnostics: BTreeMap<String, u64>,
    /// Unprefirable counts keyed by the rule that fired.
    pub fired_rules: BTreeMap<String, u64>,
    pub luminosity_blocks: u64,
    pub harvests: u64,
    pub monitors: BTreeMap<String, MonitorStats>,
}

impl JobStats {
    /// True when any event needs a second look.
    pub fn has_anomalies(&self) -> bool {
        self.unclassified > 0
            || self.events_with_diagnostics > 0
            || self.monitors.values().any(|m| m.skipped > 0)
    }

    fn record_verdict(&mut self, verdict: &Classification) {
        if verdict.unprefirable {
            self.unprefirable += 1;
        } else {
            self.prefirable += 1;
        }
        if let Some(rule) = verdict.fired_rule {
            *self.fired_rules.entry(rule.to_string()).or_default() += 1;
        }
        if verdict.has_diagnostics() {
            self.events_with_diagnostics += 1;
        }
        for diag in &verdict.diagnostics {
            *self
                .diagnostics
                .entry(diag.event_name().to_string())
                .or_default() += 1;
        }
    }

    fn record_contribution(&mut self, monitor: &str, contribution: &Contribution) {
        let stats = self.monitors.entry(monitor.to_string()).or_default();
        match contribution {
            Contribution::Filled => stats.filled += 1,
            Contribution::NotApplicable => stats.not_applicable += 1,
            Contribution::Skipped { .. } => stats.skipped += 1,
        }
    }
}

/// Outcome of a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub stats: JobStats,
    /// Harvester outcomes of the final pass, one per ratio pair.
    pub harvest: Vec<HarvestOutcome>,
    /// Ratio tables keyed by ratio path.
    pub ratios: BTreeMap<String, RatioTables>,
    #[serde(skip)]
    pub store: HistogramStore,
}

/// Drives monitors and the harvester over a stream of events.
pub struct MonitoringJob {
    run_id: String,
    accept_label: String,
    monitors: Vec<Box<dyn Monitor>>,
    client: Option<PrefiringClient>,
    store: HistogramStore,
    stats: JobStats,
    current_block: Option<(u32, u32)>,
    block_open: bool,
    last_harvest: Vec<HarvestOutcome>,
}

impl MonitoringJob {
    /// Book every enabled monitor.
    pub fn initialize(config: &MonitorConfig) -> Result<Self> {
        let run_id = generate_run_id();
        let _span = info_span!("job", run_id = %run_id, stage = %Stage::Init).entered();

        let mut monitors: Vec<Box<dyn Monitor>> = Vec::new();
        if config.algo_timing.enabled {
            monitors.push(Box::new(AlgoTimingMonitor::new(
                &config.algo_timing,
                &config.trigger_menu,
                &config.sources.algo_blocks,
            )?));
        }
        if config.object_timing.enabled {
            monitors.push(Box::new(ObjectTimingMonitor::new(
                &config.object_timing,
                &config.sources,
                &config.matching,
            )));
        }
        if config.jet_prefiring.enabled {
            monitors.push(Box::new(JetPrefiringMonitor::new(
                &config.jet_prefiring,
                &config.sources,
                &config.matching,
            )));
        }
        let client = config
            .client
            .enabled
            .then(|| PrefiringClient::new(&config.client));

        let stats = JobStats {
            monitors: monitors
                .iter()
                .map(|m| (m.name().to_string(), MonitorStats::default()))
                .collect(),
            ..JobStats::default()
        };

        info!(
            target: event_names::JOB_STARTED,
            monitors = monitors.len(),
            harvester = client.is_some(),
            menu = %config.trigger_menu.name,
            "monitoring job initialized"
        );

        Ok(MonitoringJob {
            run_id,
            accept_label: config.sources.accept_record.clone(),
            monitors,
            client,
            store: HistogramStore::new(),
            stats,
            current_block: None,
            block_open: false,
            last_harvest: Vec::new(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stats(&self) -> &JobStats {
        &self.stats
    }

    pub fn store(&self) -> &HistogramStore {
        &self.store
    }

    pub fn monitor_names(&self) -> Vec<&'static str> {
        self.monitors.iter().map(|m| m.name()).collect()
    }

    /// Process one event.
    ///
    /// Returns the classification, or None when the event carries no
    /// accept record and was skipped by every monitor.
    pub fn on_event(&mut self, event: &EventRecord) -> Result<Option<Classification>> {
        let block = (event.id.run, event.id.lumi);
        if self.current_block.is_some_and(|current| current != block) {
            self.end_luminosity_block()?;
        }
        self.current_block = Some(block);
        self.block_open = true;
        self.stats.events += 1;

        let _span = info_span!(
            "event",
            run_id = %self.run_id,
            event_id = %event.id,
            stage = %Stage::Classify
        )
        .entered();

        let record = match event.accept_record(&self.accept_label) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    target: event_names::COLLECTION_MISSING,
                    label = %self.accept_label,
                    error = %e,
                    "no accept record, event not classified"
                );
                self.stats.unclassified += 1;
                return Ok(None);
            }
        };

        let verdict = classify_record(record);
        for diag in &verdict.diagnostics {
            log_diagnostic(diag);
        }
        self.stats.record_verdict(&verdict);

        for monitor in &mut self.monitors {
            let contribution = monitor.analyze(event, &verdict);
            self.stats.record_contribution(monitor.name(), &contribution);
        }

        debug!(
            target: event_names::EVENT_ANALYZED,
            stage = %Stage::Accumulate,
            unprefirable = verdict.unprefirable,
            "event analyzed"
        );

        Ok(Some(verdict))
    }

    /// Publish snapshots and refresh the ratio tables.
    pub fn end_luminosity_block(&mut self) -> Result<()> {
        let _span = info_span!("harvest", run_id = %self.run_id, stage = %Stage::Harvest).entered();

        self.publish_and_harvest()?;
        if !std::mem::take(&mut self.block_open) {
            return Ok(());
        }
        self.stats.luminosity_blocks += 1;

        if let Some((run, lumi)) = self.current_block {
            info!(
                target: event_names::LUMI_ENDED,
                run,
                lumi,
                events = self.stats.events,
                "luminosity block closed"
            );
        }
        Ok(())
    }

    /// Close the job: a final publish and harvest, then the report.
    pub fn finalize(mut self) -> Result<JobReport> {
        let _span = info_span!("harvest", run_id = %self.run_id, stage = %Stage::Harvest).entered();

        if std::mem::take(&mut self.block_open) {
            self.stats.luminosity_blocks += 1;
        }
        self.publish_and_harvest()?;

        let mut ratios = BTreeMap::new();
        if let Some(client) = &self.client {
            for ratio in client.ratios() {
                let (Ok(r), Ok(n)) = (
                    self.store.get_2d(&ratio.ratio_path()),
                    self.store.get_2d(&ratio.normalized_path()),
                ) else {
                    continue;
                };
                ratios.insert(
                    ratio.ratio_path(),
                    RatioTables {
                        ratio: r.clone(),
                        normalized: n.clone(),
                    },
                );
            }
        }

        info!(
            target: event_names::JOB_FINISHED,
            events = self.stats.events,
            unprefirable = self.stats.unprefirable,
            prefirable = self.stats.prefirable,
            histograms = self.store.len(),
            "monitoring job finished"
        );

        Ok(JobReport {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: self.run_id,
            generated_at: Utc::now(),
            stats: self.stats,
            harvest: self.last_harvest,
            ratios,
            store: self.store,
        })
    }

    fn publish_and_harvest(&mut self) -> Result<()> {
        for monitor in &self.monitors {
            monitor.publish(&mut self.store);
        }
        if let Some(client) = &mut self.client {
            self.last_harvest = client.run(&mut self.store)?;
            self.stats.harvests += 1;
        }
        Ok(())
    }
}

fn log_diagnostic(diag: &Diagnostic) {
    match diag {
        Diagnostic::ShortHistory { depth } => error!(
            target: event_names::CLASSIFY_SHORT_HISTORY,
            depth = *depth,
            "{}",
            diag
        ),
        Diagnostic::ImpossibleSpacing { rule } => error!(
            target: event_names::CLASSIFY_IMPOSSIBLE,
            rule = %rule,
            "{}",
            diag
        ),
        Diagnostic::FutureAccept { index } => warn!(
            target: event_names::CLASSIFY_FUTURE_ACCEPT,
            index = *index,
            "{}",
            diag
        ),
        Diagnostic::OutOfOrder { index, .. } => warn!(
            target: event_names::CLASSIFY_OUT_OF_ORDER,
            index = *index,
            "{}",
            diag
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_common::{AcceptEvent, AcceptRecord, Collection};

    fn event(lumi: u32, n: u64, distances: &[u64]) -> EventRecord {
        let record = AcceptRecord::from_distances(AcceptEvent::new(100, 5000), distances);
        EventRecord::new(1, lumi, n).with_collection(
            pf_config::monitor::SourceLabels::default().accept_record,
            Collection::AcceptRecord(record),
        )
    }

    #[test]
    fn counts_verdicts_and_skips() {
        let mut job = MonitoringJob::initialize(&MonitorConfig::default()).unwrap();
        assert_eq!(
            job.monitor_names(),
            vec!["algo_timing", "object_timing", "jet_prefiring"]
        );

        let verdict = job.on_event(&event(1, 1, &[3, 50, 150, 300])).unwrap();
        assert!(verdict.unwrap().unprefirable);
        job.on_event(&event(1, 2, &[10, 20, 150, 300])).unwrap();
        assert!(job.on_event(&EventRecord::new(1, 1, 3)).unwrap().is_none());

        let stats = job.stats();
        assert_eq!(stats.events, 3);
        assert_eq!(stats.unprefirable, 1);
        assert_eq!(stats.prefirable, 1);
        assert_eq!(stats.unclassified, 1);
        assert_eq!(stats.fired_rules.get("1 in 3"), Some(&1));
        assert_eq!(stats.monitors["algo_timing"].skipped, 2);
        assert_eq!(stats.monitors["jet_prefiring"].not_applicable, 1);
        assert!(stats.has_anomalies());
    }

    #[test]
    fn lumi_change_closes_block() {
        let mut job = MonitoringJob::initialize(&MonitorConfig::default()).unwrap();
        job.on_event(&event(1, 1, &[3, 50, 150, 300])).unwrap();
        assert_eq!(job.stats().luminosity_blocks, 0);
        job.on_event(&event(2, 2, &[3, 50, 150, 300])).unwrap();
        assert_eq!(job.stats().luminosity_blocks, 1);
        assert!(job
            .store()
            .contains("L1T/L1TObjects/Timing/Prefirable"));

        let report = job.finalize().unwrap();
        assert_eq!(report.stats.luminosity_blocks, 2);
        assert_eq!(report.stats.harvests, 2);
        assert_eq!(report.harvest.len(), 3);
    }

    #[test]
    fn disabled_monitors_are_not_built() {
        let mut config = MonitorConfig::default();
        config.object_timing.enabled = false;
        config.jet_prefiring.enabled = false;
        config.client.enabled = false;
        let job = MonitoringJob::initialize(&config).unwrap();
        assert_eq!(job.monitor_names(), vec!["algo_timing"]);
        let report = job.finalize().unwrap();
        assert!(report.harvest.is_empty());
        assert!(report.ratios.is_empty());
        assert_eq!(report.stats.luminosity_blocks, 0);
    }
}
