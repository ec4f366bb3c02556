//! `abm-engine` — agent lifecycle, populations, and scheduling for the
//! `rust_abm` framework.
//!
//! The engine turns immutable [`abm_schema`] species into live state: a
//! [`Population`] owns the agents of one species under one host, drives
//! their creation and per-cycle stepping, and is the only component that
//! mutates the set of indices.  Agents that host nested species own their
//! micro-populations recursively, forming the agent hierarchy.  Behavior
//! execution and spatial placement are external collaborators behind the
//! [`Architecture`] and [`Topology`] traits.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`scope`]    | `Scope` — execution context, error channel, output      |
//! | [`arch`]     | `Architecture` trait, `NoopArchitecture`                |
//! | [`topology`] | `Topology` trait, `NoopTopology`                        |
//! | [`agent`]    | `Agent`, `PopulationPath` (lifecycle state machine)     |
//! | [`population`] | `Population` (creation/stepping protocols, mirrors)   |
//! | [`notifier`] | `PopulationEvent`, `PopulationListener`, `Notifier`     |
//! | [`meta`]     | `MetaPopulation` — read-only aggregation view           |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Concurrency-eligible populations step agents on Rayon's   |
//! |            | thread pool once they reach the configured threshold.     |

pub mod agent;
pub mod arch;
pub mod meta;
pub mod notifier;
pub mod population;
pub mod scope;
pub mod topology;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::{Agent, AttrMap, PathStep, PopulationPath};
pub use arch::{Architecture, NoopArchitecture};
pub use meta::MetaPopulation;
pub use notifier::{Notifier, PopulationEvent, PopulationListener};
pub use population::{Population, PostCreation};
pub use scope::Scope;
pub use topology::{NoopTopology, Topology};
