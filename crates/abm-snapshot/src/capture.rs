//! Capturing live agents and populations into snapshot records.
//!
//! # Exclusion sets
//!
//! Always-derived attributes are computed relations, never state: capturing
//! them would make restore try to re-set values the engine synthesizes.  The
//! base set excludes the membership/host/timing pseudo-attributes; grid
//! agents additionally exclude their coordinate pseudo-attributes and their
//! location (a grid cell's location is determined by its cell, not by
//! captured state).  These sets must match restore exactly for round-trip
//! fidelity.

use std::collections::BTreeMap;

use abm_core::AttrValue;
use abm_schema::{keys, Species};
use abm_engine::{Agent, Population};

use crate::{AgentSnapshot, PopulationSnapshot};

/// Pseudo-attributes excluded from every snapshot.  `location` is excluded
/// here and re-derived from the owned geometry below, so a literal value
/// stored under the key can never shadow the canonical one.
pub const BASE_EXCLUDED: &[&str] = &[
    keys::MEMBERS,
    keys::AGENTS,
    keys::HOST,
    keys::PEERS,
    keys::INDEX,
    keys::LOCATION,
    keys::EXPERIMENT,
    keys::WORLD,
    keys::TIME,
    keys::MACHINE_TIME,
    keys::DURATION,
    keys::AVERAGE_DURATION,
    keys::TOTAL_DURATION,
];

/// Additionally excluded for agents of grid species.
pub const GRID_EXCLUDED: &[&str] = &[keys::GRID_X, keys::GRID_Y, keys::NEIGHBORS];

/// `true` if `name` must not appear in a snapshot of `species`.
pub fn is_excluded(species: &Species, name: &str) -> bool {
    BASE_EXCLUDED.contains(&name) || (species.is_grid() && GRID_EXCLUDED.contains(&name))
}

/// Capture one agent.  When `deep`, owned micro-populations are captured
/// recursively.
pub fn snapshot_agent(agent: &Agent, deep: bool) -> AgentSnapshot {
    let species = agent.species();
    let mut attrs: BTreeMap<String, AttrValue> = BTreeMap::new();
    if let Some(map) = agent.attrs() {
        for (name, value) in map {
            if !is_excluded(species, name) {
                attrs.insert(name.clone(), value.clone());
            }
        }
    }
    // Location comes from the owned geometry, except for grid agents whose
    // location is derived from their cell.
    if !species.is_grid() {
        if let Some(shape) = agent.shape() {
            attrs.insert(keys::LOCATION.to_owned(), shape.location().into());
        }
    }

    let micro = if deep {
        agent
            .micro_populations()
            .iter()
            .map(|pop| (pop.species().name().to_owned(), snapshot_population(pop, deep)))
            .collect()
    } else {
        BTreeMap::new()
    };

    AgentSnapshot {
        index: agent.index(),
        species: species.name().to_owned(),
        attrs,
        micro,
    }
}

/// Capture one population, agents in insertion order.
pub fn snapshot_population(pop: &Population, deep: bool) -> PopulationSnapshot {
    PopulationSnapshot {
        species: pop.species().name().to_owned(),
        next_index: pop.next_index(),
        grid: pop.species().grid(),
        agents: pop.agents().iter().map(|a| snapshot_agent(a, deep)).collect(),
    }
}
