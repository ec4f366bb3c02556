//! Immutable snapshot records.
//!
//! A record is a plain value: index, species name, a filtered attribute map,
//! and (for deep captures) nested-population records keyed by micro-species
//! name.  Records never change after construction; a restore consumes one
//! without mutating it.  Attribute maps are `BTreeMap`s so serialized output
//! is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use abm_core::{AgentIndex, AttrValue};
use abm_schema::GridDims;

/// Captured state of one agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub index: AgentIndex,
    pub species: String,
    /// Attributes, filtered: always-derived pseudo-attributes are excluded
    /// by capture and must never be re-set by restore.
    pub attrs: BTreeMap<String, AttrValue>,
    /// Nested-population records, present only for deep captures.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub micro: BTreeMap<String, PopulationSnapshot>,
}

impl AgentSnapshot {
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}

/// Captured state of one population.
///
/// `next_index` is captured so a restored population never re-issues an
/// index the source population had already used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub species: String,
    pub next_index: AgentIndex,
    /// Grid dimensions, captured specially so the spatial matrix shape
    /// survives the round trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridDims>,
    /// Agent records in the population's insertion order.
    pub agents: Vec<AgentSnapshot>,
}

impl PopulationSnapshot {
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agent(&self, index: AgentIndex) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.index == index)
    }
}
