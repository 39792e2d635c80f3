//! Property-based tests for pf-math kernels.
//!
//! Uses proptest to verify geometric and ratio properties across many random inputs.

use proptest::prelude::*;
use pf_math::binomial::binomial_ratio;
use pf_math::{delta_phi, delta_r, normalized_phi};
use std::f64::consts::{PI, TAU};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// azimuth wrapping
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Wrapped angles always land in [-π, π].
    #[test]
    fn normalized_phi_in_range(phi in -100.0..100.0f64) {
        let w = normalized_phi(phi);
        prop_assert!((-PI..=PI).contains(&w), "normalized_phi({})={} out of range", phi, w);
    }

    /// Wrapping only removes whole turns.
    #[test]
    fn normalized_phi_removes_whole_turns(phi in -100.0..100.0f64) {
        let w = normalized_phi(phi);
        let turns = (phi - w) / TAU;
        prop_assert!(approx_eq(turns, turns.round(), 1e-9), "{} - {} is not a multiple of 2π", phi, w);
    }

    /// Δφ is antisymmetric except exactly at the seam.
    #[test]
    fn delta_phi_antisymmetric(a in -PI..PI, b in -PI..PI) {
        let ab = delta_phi(a, b);
        let ba = delta_phi(b, a);
        prop_assume!((ab.abs() - PI).abs() > 1e-9);
        prop_assert!(approx_eq(ab, -ba, TOL), "Δφ({},{})={} but Δφ({},{})={}", a, b, ab, b, a, ba);
    }
}

// ============================================================================
// ΔR
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// ΔR is symmetric.
    #[test]
    fn delta_r_symmetric(e1 in -5.0..5.0f64, p1 in -PI..PI, e2 in -5.0..5.0f64, p2 in -PI..PI) {
        prop_assert!(approx_eq(delta_r(e1, p1, e2, p2), delta_r(e2, p2, e1, p1), TOL));
    }

    /// ΔR is bounded by |Δη| + π.
    #[test]
    fn delta_r_bounded(e1 in -5.0..5.0f64, p1 in -PI..PI, e2 in -5.0..5.0f64, p2 in -PI..PI) {
        let dr = delta_r(e1, p1, e2, p2);
        prop_assert!(dr >= 0.0);
        prop_assert!(dr <= (e1 - e2).abs() + PI + TOL);
    }

    /// Shifting φ by a full turn does not change ΔR.
    #[test]
    fn delta_r_periodic_in_phi(e1 in -5.0..5.0f64, p1 in -PI..PI, e2 in -5.0..5.0f64, p2 in -PI..PI) {
        let base = delta_r(e1, p1, e2, p2);
        let shifted = delta_r(e1, p1 + TAU, e2, p2);
        prop_assert!(approx_eq(base, shifted, 1e-9), "{} != {}", base, shifted);
    }
}

// ============================================================================
// binomial ratio
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For k <= n the ratio is a probability and the error is at most 0.5/sqrt(n).
    #[test]
    fn binomial_ratio_subset_bounds(n in 1u32..10_000, frac in 0.0..=1.0f64) {
        let k = (f64::from(n) * frac).floor();
        let r = binomial_ratio(k, f64::from(n)).unwrap();
        prop_assert!((0.0..=1.0).contains(&r.value));
        prop_assert!(r.error <= 0.5 / f64::from(n).sqrt() + TOL);
    }

    /// A zero denominator never yields a value.
    #[test]
    fn binomial_ratio_zero_denominator(k in 0.0..1e6f64) {
        prop_assert!(binomial_ratio(k, 0.0).is_none());
    }
}
