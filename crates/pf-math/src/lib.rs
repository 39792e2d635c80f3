//! Prefire monitor math utilities.

pub mod math;

pub use math::angular::*;
pub use math::binomial;
pub use math::binomial::BinomialRatio;
