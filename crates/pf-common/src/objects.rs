//! Physics objects read from the event.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Anything with a direction and a transverse momentum.
pub trait Kinematics {
    fn pt(&self) -> f64;
    fn eta(&self) -> f64;
    fn phi(&self) -> f64;
}

/// A reconstructed jet: offline particle-flow jets and L1 calorimeter jets
/// share this shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Jet {
    /// Transverse momentum (GeV).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle (rad).
    pub phi: f64,
}

impl Jet {
    pub fn new(pt: f64, eta: f64, phi: f64) -> Self {
        Jet { pt, eta, phi }
    }
}

impl Kinematics for Jet {
    fn pt(&self) -> f64 {
        self.pt
    }

    fn eta(&self) -> f64 {
        self.eta
    }

    fn phi(&self) -> f64 {
        self.phi
    }
}

/// Global-trigger algorithm decisions for one bunch crossing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AlgoBlock {
    /// Initial (pre-prescale) decision per algorithm bit.
    #[serde(default)]
    pub decision_initial: Vec<bool>,
}

impl AlgoBlock {
    pub fn new(decision_initial: Vec<bool>) -> Self {
        AlgoBlock { decision_initial }
    }

    /// Build a block with only the given bits set.
    pub fn from_bits(n_bits: usize, set: &[usize]) -> Self {
        let mut decision_initial = vec![false; n_bits];
        for &bit in set {
            if bit < n_bits {
                decision_initial[bit] = true;
            }
        }
        AlgoBlock { decision_initial }
    }

    /// Initial decision for one bit; bits beyond the block are `false`.
    pub fn decision(&self, bit: usize) -> bool {
        self.decision_initial.get(bit).copied().unwrap_or(false)
    }

    /// Indices of all bits that fired.
    pub fn fired_bits(&self) -> impl Iterator<Item = usize> + '_ {
        self.decision_initial
            .iter()
            .enumerate()
            .filter_map(|(bit, &on)| on.then_some(bit))
    }
}
