//! Framework error type.
//!
//! Sub-crates may define their own error enums and convert them into
//! `AbmError` via `From` impls, or keep them separate and wrap `AbmError` as
//! one variant.  Both patterns are acceptable; prefer whichever keeps error
//! sites clean.
//!
//! Behavior execution failures are *not* errors at this level: the
//! architecture collaborator reports them as a boolean pass/fail per agent,
//! and they never abort sibling agents.

use thiserror::Error;

use crate::AgentIndex;

/// The top-level error type for `abm-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum AbmError {
    /// Fail-fast: an operation needed a live agent that is absent.
    #[error("agent {index} of species '{species}' not found")]
    AgentNotFound { species: String, index: AgentIndex },

    /// Fail-fast: an operation needed a live agent but found a dead one.
    #[error("agent {index} of species '{species}' is dead")]
    DeadAgent { species: String, index: AgentIndex },

    /// Fail-fast: a derived accessor needed the agent's geometry.
    #[error("agent {index} of species '{species}' has no geometry")]
    MissingGeometry { species: String, index: AgentIndex },

    /// Fail-fast: a lookup named a population that does not exist.
    #[error("no population for species '{0}'")]
    MissingPopulation(String),

    /// Restore: a snapshot named a species that does not match the target.
    #[error("species mismatch: snapshot is '{snapshot}', target is '{target}'")]
    SpeciesMismatch { snapshot: String, target: String },

    /// Creation at an explicit index collided with a live agent.
    #[error("index {index} already live in population '{species}'")]
    DuplicateIndex { species: String, index: AgentIndex },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `abm-*` crates.
pub type AbmResult<T> = Result<T, AbmError>;
