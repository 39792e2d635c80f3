//! The fixed trigger-rule table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// "No more than `max_accepts` accepts within `window` bunch crossings."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct TriggerRule {
    pub max_accepts: usize,
    pub window: u64,
}

/// Rules in evaluation order.
pub const TRIGGER_RULES: [TriggerRule; 4] = [
    TriggerRule::new(1, 3),
    TriggerRule::new(2, 25),
    TriggerRule::new(3, 100),
    TriggerRule::new(4, 240),
];

impl TriggerRule {
    pub const fn new(max_accepts: usize, window: u64) -> Self {
        TriggerRule {
            max_accepts,
            window,
        }
    }

    /// All of the first `max_accepts` distances fall inside the window.
    ///
    /// The hardware enforces the rule, so this should never be observed.
    /// `None` when the history is too short to evaluate the rule.
    pub fn is_violated(&self, distances: &[u64]) -> Option<bool> {
        let head = distances.get(..self.max_accepts)?;
        Some(head.iter().all(|&d| d < self.window))
    }

    /// The rule was saturated at the current crossing: the previous
    /// `max_accepts - 1` accepts are inside the window and the
    /// `max_accepts`-th sits exactly on its edge, so an accept one crossing
    /// earlier would have been vetoed.
    pub fn is_saturated(&self, distances: &[u64]) -> Option<bool> {
        let head = distances.get(..self.max_accepts)?;
        let (edge, inside) = head.split_last()?;
        Some(inside.iter().all(|&d| d < self.window) && *edge == self.window)
    }
}

impl std::fmt::Display for TriggerRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in {}", self.max_accepts, self.window)
    }
}
