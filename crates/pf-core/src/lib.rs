//! Prefire Monitor Core Library
//!
//! This library provides the monitoring pipeline for trigger prefiring:
//! - Prefire classification of events from their accept history
//! - Offline-to-L1 object matching across bunch crossings
//! - Histogram booking and filling, split by classification
//! - Harvesting of unprefirable/prefirable ratio tables
//! - The job lifecycle that ties them together
//!
//! The binary entry point is in `main.rs`.

pub mod accumulator;
pub mod config;
pub mod exit_codes;
pub mod histogram;
pub mod job;
pub mod logging;
pub mod matching;
pub mod menu;
pub mod monitors;
pub mod prefire;
pub mod ratio;
pub mod schema;
pub mod source;
