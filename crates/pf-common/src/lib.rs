//! Prefire monitor common types and errors.
//!
//! This crate provides the data formats shared by every monitor:
//! - Bunch-crossing timestamps and the accept-history record
//! - Collections indexed by relative bunch crossing
//! - Jets and global-trigger algorithm blocks
//! - Event records with labelled collections
//! - Common error types and output formats

pub mod bx;
pub mod error;
pub mod event;
pub mod objects;
pub mod output;
pub mod timing;

pub use bx::BxVector;
pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use event::{Collection, EventId, EventRecord};
pub use objects::{AlgoBlock, Jet, Kinematics};
pub use output::OutputFormat;
pub use timing::{AcceptEvent, AcceptRecord, ORBIT_LENGTH, REQUIRED_HISTORY_DEPTH};

/// Schema version of all machine-readable output.
pub const SCHEMA_VERSION: &str = "1.0.0";
