//! Angular separation in (pseudorapidity, azimuth) space.
//!
//! Detector objects are compared by ΔR = sqrt(Δη² + Δφ²), where the azimuthal
//! difference is first wrapped into [-π, π) so that objects on either side of
//! the φ = ±π seam are recognised as neighbours.

use std::f64::consts::{PI, TAU};

/// Wrap an azimuthal angle into [-π, π).
///
/// Returns NAN for non-finite input.
pub fn normalized_phi(phi: f64) -> f64 {
    if !phi.is_finite() {
        return f64::NAN;
    }
    if (-PI..PI).contains(&phi) {
        return phi;
    }
    (phi + PI).rem_euclid(TAU) - PI
}

/// Signed azimuthal difference `phi1 - phi2`, wrapped into [-π, π).
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    normalized_phi(phi1 - phi2)
}

/// Squared angular separation.
///
/// Cheaper than [`delta_r`] when only comparisons are needed.
pub fn delta_r2(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let d_eta = eta1 - eta2;
    let d_phi = delta_phi(phi1, phi2);
    d_eta * d_eta + d_phi * d_phi
}

/// Angular separation ΔR between two objects.
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    delta_r2(eta1, phi1, eta2, phi2).sqrt()
}
