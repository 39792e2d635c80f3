//! Event records as delivered to the monitors.
//!
//! Each event carries an open set of labelled collections. Monitors look up
//! the labels they were configured with; a lookup can fail because the label
//! is absent or because it names a collection of another kind. Both cases are
//! recoverable: the monitor skips its contribution for that event.

use crate::bx::BxVector;
use crate::error::{Error, Result};
use crate::objects::{AlgoBlock, Jet};
use crate::timing::AcceptRecord;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One labelled collection inside an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Collection {
    /// Accept history from the timing/control record.
    AcceptRecord(AcceptRecord),
    /// Global-trigger algorithm blocks per bunch crossing.
    AlgoBlocks(BxVector<AlgoBlock>),
    /// A flat jet collection (offline reconstruction).
    Jets(Vec<Jet>),
    /// Jets per bunch crossing (L1 readout).
    BxJets(BxVector<Jet>),
}

impl Collection {
    /// Stable name of the collection kind, as used in the JSON tag.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Collection::AcceptRecord(_) => "accept_record",
            Collection::AlgoBlocks(_) => "algo_blocks",
            Collection::Jets(_) => "jets",
            Collection::BxJets(_) => "bx_jets",
        }
    }
}

/// Identity of an event within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EventId {
    pub run: u32,
    pub lumi: u32,
    pub event: u64,
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.run, self.lumi, self.event)
    }
}

/// A single event and its collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    #[serde(flatten)]
    pub id: EventId,
    #[serde(default)]
    pub collections: BTreeMap<String, Collection>,
}

impl EventRecord {
    pub fn new(run: u32, lumi: u32, event: u64) -> Self {
        EventRecord {
            id: EventId { run, lumi, event },
            collections: BTreeMap::new(),
        }
    }

    /// Attach a collection under `label`, replacing any previous one.
    pub fn with_collection(mut self, label: impl Into<String>, collection: Collection) -> Self {
        self.collections.insert(label.into(), collection);
        self
    }

    /// Look up any collection by label.
    pub fn get(&self, label: &str) -> Result<&Collection> {
        self.collections
            .get(label)
            .ok_or_else(|| Error::CollectionNotFound {
                label: label.to_string(),
            })
    }

    pub fn accept_record(&self, label: &str) -> Result<&AcceptRecord> {
        match self.get(label)? {
            Collection::AcceptRecord(record) => Ok(record),
            other => Err(type_error(label, "accept_record", other)),
        }
    }

    pub fn algo_blocks(&self, label: &str) -> Result<&BxVector<AlgoBlock>> {
        match self.get(label)? {
            Collection::AlgoBlocks(blocks) => Ok(blocks),
            other => Err(type_error(label, "algo_blocks", other)),
        }
    }

    pub fn jets(&self, label: &str) -> Result<&[Jet]> {
        match self.get(label)? {
            Collection::Jets(jets) => Ok(jets),
            other => Err(type_error(label, "jets", other)),
        }
    }

    pub fn bx_jets(&self, label: &str) -> Result<&BxVector<Jet>> {
        match self.get(label)? {
            Collection::BxJets(jets) => Ok(jets),
            other => Err(type_error(label, "bx_jets", other)),
        }
    }
}

fn type_error(label: &str, expected: &'static str, actual: &Collection) -> Error {
    Error::CollectionType {
        label: label.to_string(),
        expected,
        actual: actual.kind_name(),
    }
}
