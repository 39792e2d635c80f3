//! Event vocabulary for structured logging.
//!
//! Every log line carries an event name (the tracing target) and a stage.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Processing stages of a monitoring job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Configuration, menu resolution, booking.
    Init,
    /// Prefire classification of an event.
    Classify,
    /// Offline-to-L1 object matching.
    Match,
    /// Histogram filling.
    Accumulate,
    /// Ratio building at batch boundaries.
    Harvest,
    /// Report serialization.
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Classify => "classify",
            Stage::Match => "match",
            Stage::Accumulate => "accumulate",
            Stage::Harvest => "harvest",
            Stage::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Job lifecycle
    pub const JOB_STARTED: &str = "job.started";
    pub const JOB_FINISHED: &str = "job.finished";
    pub const LUMI_ENDED: &str = "job.lumi_ended";

    // Config/init
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";
    pub const MENU_ALGO_UNKNOWN: &str = "menu.algo_unknown";
    pub const HIST_BOOKED: &str = "hist.booked";

    // Classify stage
    pub const CLASSIFY_SHORT_HISTORY: &str = "classify.short_history";
    pub const CLASSIFY_IMPOSSIBLE: &str = "classify.impossible_spacing";
    pub const CLASSIFY_FUTURE_ACCEPT: &str = "classify.future_accept";
    pub const CLASSIFY_OUT_OF_ORDER: &str = "classify.out_of_order";

    // Accumulate stage
    pub const COLLECTION_MISSING: &str = "accumulate.collection_missing";
    pub const EVENT_ANALYZED: &str = "accumulate.event_analyzed";
    pub const MATCH_OUTSIDE_WINDOW: &str = "match.outside_window";

    // Harvest stage
    pub const HARVEST_INPUT_MISSING: &str = "harvest.input_missing";
    pub const HARVEST_DONE: &str = "harvest.done";

    // Input
    pub const INPUT_MALFORMED: &str = "input.malformed_line";

    pub const INTERNAL_ERROR: &str = "internal_error";
}
