//! Core math modules.

pub mod angular;
pub mod binomial;
