//! Nearest-object matching across bunch crossings.
//!
//! A reference object (an offline jet) is matched to at most one candidate
//! (an L1 jet) anywhere in a window of relative bunch crossings. The best
//! distance starts at the threshold and only ever tightens, so a match is
//! always strictly closer than `max_delta_r`.

use std::ops::RangeInclusive;

use pf_common::{BxVector, Kinematics};
use pf_config::MatchMode;
use pf_math::delta_r;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of matching one reference object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        /// Relative bunch crossing of the candidate.
        bx: i32,
        /// Position of the candidate within its crossing.
        index: usize,
        delta_r: f64,
    },
    Unmatched {
        threshold: f64,
    },
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    /// Bunch crossing of the match, if any.
    pub fn bx(&self) -> Option<i32> {
        match self {
            MatchResult::Matched { bx, .. } => Some(*bx),
            MatchResult::Unmatched { .. } => None,
        }
    }
}

/// Match `reference` against `candidates` in the crossings of `bx_range`.
///
/// The range is clipped to the crossings the collection actually holds and
/// scanned in increasing order. Within a crossing candidates are visited in
/// collection order.
///
/// With [`MatchMode::FirstImprovement`] the first candidate closer than the
/// current best is taken and the rest of that crossing is skipped; later
/// crossings are still searched against the tightened distance. With
/// [`MatchMode::Nearest`] every candidate is compared.
pub fn find_match<R, C>(
    reference: &R,
    candidates: &BxVector<C>,
    max_delta_r: f64,
    bx_range: RangeInclusive<i32>,
    mode: MatchMode,
) -> MatchResult
where
    R: Kinematics,
    C: Kinematics,
{
    let lo = (*bx_range.start()).max(candidates.first_bx());
    let hi = (*bx_range.end()).min(candidates.last_bx());

    let mut best = max_delta_r;
    let mut found = None;

    for bx in lo..=hi {
        for (index, candidate) in candidates.at(bx).iter().enumerate() {
            let dr = delta_r(
                reference.eta(),
                reference.phi(),
                candidate.eta(),
                candidate.phi(),
            );
            if dr < best {
                best = dr;
                found = Some((bx, index));
                if mode == MatchMode::FirstImprovement {
                    break;
                }
            }
        }
    }

    match found {
        Some((bx, index)) => MatchResult::Matched {
            bx,
            index,
            delta_r: best,
        },
        None => MatchResult::Unmatched {
            threshold: max_delta_r,
        },
    }
}

/// Match over every crossing the collection holds.
pub fn find_match_all_bx<R, C>(
    reference: &R,
    candidates: &BxVector<C>,
    max_delta_r: f64,
    mode: MatchMode,
) -> MatchResult
where
    R: Kinematics,
    C: Kinematics,
{
    find_match(
        reference,
        candidates,
        max_delta_r,
        candidates.bx_range(),
        mode,
    )
}
