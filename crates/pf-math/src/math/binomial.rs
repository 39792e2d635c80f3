//! Binomial ratio of two counts.
//!
//! When the numerator sample is a subset of the denominator sample the ratio
//! `r = k / n` estimates a binomial probability, and its uncertainty is
//!
//! ```text
//! σ² = |(1 - 2r)·σk² + r²·σn²| / n²
//! ```
//!
//! which for unweighted counts (σk² = k, σn² = n) reduces to `r(1 - r) / n`.
//! The absolute value keeps the error defined when the "subset" assumption
//! is violated and `r > 1`.

use serde::{Deserialize, Serialize};

/// A ratio value with its binomial uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialRatio {
    pub value: f64,
    pub error: f64,
}

/// Ratio of two unweighted counts with binomial error.
///
/// Returns None when the denominator is zero or either input is negative
/// or non-finite; callers leave the target cell untouched in that case.
pub fn binomial_ratio(k: f64, n: f64) -> Option<BinomialRatio> {
    binomial_ratio_weighted(k, k, n, n)
}

/// Ratio of two weighted sums with binomial error.
///
/// `k_sumw2` and `n_sumw2` are the sums of squared weights that produced
/// `k` and `n`.
pub fn binomial_ratio_weighted(
    k: f64,
    k_sumw2: f64,
    n: f64,
    n_sumw2: f64,
) -> Option<BinomialRatio> {
    if !k.is_finite() || !n.is_finite() || !k_sumw2.is_finite() || !n_sumw2.is_finite() {
        return None;
    }
    if k < 0.0 || n < 0.0 || k_sumw2 < 0.0 || n_sumw2 < 0.0 {
        return None;
    }
    if n == 0.0 {
        return None;
    }

    let r = k / n;
    let variance = ((1.0 - 2.0 * r) * k_sumw2 + r * r * n_sumw2).abs() / (n * n);

    Some(BinomialRatio {
        value: r,
        error: variance.sqrt(),
    })
}
