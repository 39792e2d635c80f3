//! Accept history as distances from the current crossing.

use pf_common::{AcceptRecord, REQUIRED_HISTORY_DEPTH};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::rules::TriggerRule;
use crate::logging::event_names;

/// Distance stored for an accept that lies after the current crossing.
pub const FUTURE_ACCEPT: u64 = u64::MAX;

/// Anomalies noticed while building or classifying a history.
///
/// None of them changes the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Fewer entries than the rules look at.
    ShortHistory { depth: usize },
    /// An accept recorded later than the current crossing.
    FutureAccept { index: usize },
    /// A deeper entry is closer than the one before it.
    OutOfOrder {
        index: usize,
        distance: u64,
        previous: u64,
    },
    /// The hardware rule was violated.
    ImpossibleSpacing { rule: TriggerRule },
}

impl Diagnostic {
    /// Event name used when logging this diagnostic.
    pub fn event_name(&self) -> &'static str {
        match self {
            Diagnostic::ShortHistory { .. } => event_names::CLASSIFY_SHORT_HISTORY,
            Diagnostic::FutureAccept { .. } => event_names::CLASSIFY_FUTURE_ACCEPT,
            Diagnostic::OutOfOrder { .. } => event_names::CLASSIFY_OUT_OF_ORDER,
            Diagnostic::ImpossibleSpacing { .. } => event_names::CLASSIFY_IMPOSSIBLE,
        }
    }

    /// Errors indicate inconsistent hardware data; the rest are warnings.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Diagnostic::ShortHistory { .. } | Diagnostic::ImpossibleSpacing { .. }
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::ShortHistory { depth } => write!(
                f,
                "unexpectedly small L1A history: {} entries, need {}",
                depth, REQUIRED_HISTORY_DEPTH
            ),
            Diagnostic::FutureAccept { index } => {
                write!(f, "history entry {} is later than the current crossing", index)
            }
            Diagnostic::OutOfOrder {
                index,
                distance,
                previous,
            } => write!(
                f,
                "history entry {} at distance {} is closer than entry {} at {}",
                index,
                distance,
                index - 1,
                previous
            ),
            Diagnostic::ImpossibleSpacing { rule } => {
                write!(f, "found an L1A in an impossible location ({})", rule)
            }
        }
    }
}

/// Previous accepts, most recent first, as ticks before the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AcceptHistory {
    distances: Vec<u64>,
    #[serde(default)]
    diagnostics: Vec<Diagnostic>,
}

impl AcceptHistory {
    /// Build from precomputed distances.
    pub fn from_distances(distances: Vec<u64>) -> Self {
        let mut history = AcceptHistory {
            distances,
            diagnostics: Vec::new(),
        };
        history.check_order();
        history
    }

    /// Build from the raw accept record.
    pub fn from_record(record: &AcceptRecord) -> Self {
        let now = record.current.ticks();
        let mut diagnostics = Vec::new();
        let distances = record
            .history
            .iter()
            .enumerate()
            .map(|(index, accept)| match now.checked_sub(accept.ticks()) {
                Some(d) => d,
                None => {
                    diagnostics.push(Diagnostic::FutureAccept { index });
                    FUTURE_ACCEPT
                }
            })
            .collect();

        let mut history = AcceptHistory {
            distances,
            diagnostics,
        };
        history.check_order();
        history
    }

    pub fn distances(&self) -> &[u64] {
        &self.distances
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Diagnostics raised while building the history.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn check_order(&mut self) {
        for (index, pair) in self.distances.windows(2).enumerate() {
            let (previous, distance) = (pair[0], pair[1]);
            if previous == FUTURE_ACCEPT || distance == FUTURE_ACCEPT {
                continue;
            }
            if distance < previous {
                self.diagnostics.push(Diagnostic::OutOfOrder {
                    index: index + 1,
                    distance,
                    previous,
                });
            }
        }
    }
}
