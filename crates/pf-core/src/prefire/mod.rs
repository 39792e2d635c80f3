//! Prefire classification.
//!
//! An event is *unprefirable* when one of the trigger rules was saturated
//! at its crossing: the previous crossing could not have been accepted, so
//! a prefire in that crossing would have been vetoed. The verdict only
//! depends on the four most recent accepts.

pub mod history;
pub mod rules;

pub use history::{AcceptHistory, Diagnostic, FUTURE_ACCEPT};
pub use rules::{TriggerRule, TRIGGER_RULES};

use pf_common::{AcceptRecord, REQUIRED_HISTORY_DEPTH};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Verdict for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    pub unprefirable: bool,
    /// The rule that made the event unprefirable.
    pub fired_rule: Option<TriggerRule>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Classification {
    /// Index into a `[prefirable, unprefirable]` pair.
    pub fn split_index(&self) -> usize {
        usize::from(self.unprefirable)
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Classify an accept history against [`TRIGGER_RULES`].
pub fn classify(history: &AcceptHistory) -> Classification {
    let distances = history.distances();
    let mut diagnostics = history.diagnostics().to_vec();

    if distances.len() < REQUIRED_HISTORY_DEPTH {
        diagnostics.push(Diagnostic::ShortHistory {
            depth: distances.len(),
        });
    }

    let mut fired_rule = None;
    for rule in TRIGGER_RULES {
        if rule.is_violated(distances) == Some(true) {
            diagnostics.push(Diagnostic::ImpossibleSpacing { rule });
        }
        if rule.is_saturated(distances) == Some(true) {
            fired_rule = Some(rule);
            break;
        }
    }

    Classification {
        unprefirable: fired_rule.is_some(),
        fired_rule,
        diagnostics,
    }
}

/// Build the history from a raw record and classify it.
pub fn classify_record(record: &AcceptRecord) -> Classification {
    classify(&AcceptHistory::from_record(record))
}
