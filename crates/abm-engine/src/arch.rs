//! The `Architecture` trait — the behavior-execution extension point.
//!
//! The behavior language, its compiler, and its evaluator live outside this
//! workspace; the engine only needs a collaborator that can run a species'
//! init and step behavior for one agent and report pass/fail, supply variable
//! values, and compute mirror target sets.

use abm_core::{AgentRef, AttrValue};
use abm_schema::{Species, VarDef};

use crate::{Agent, Scope};

/// Pluggable behavior execution.
///
/// All methods have defaults (behaviors pass, variables fall back to their
/// schema defaults, mirrors track nothing), so a test or a purely structural
/// model can use [`NoopArchitecture`] unchanged.
///
/// # Failure reporting
///
/// Behavior failures are reported as a `false` return, never as a panic or an
/// error value; a failing agent does not abort its siblings.  To abort an
/// agent mid-flight (including its variable-update phase), interrupt the
/// scope.
///
/// # Thread safety
///
/// Concurrency-eligible populations may call [`step_agent`][Self::step_agent]
/// for many agents in parallel, so implementations must be `Send + Sync`.
/// Per-agent state belongs in the agents' attribute maps, not in the
/// architecture itself.
pub trait Architecture: Send + Sync {
    /// Run the species' init behavior for a freshly scheduled agent.
    fn init_agent(&self, _scope: &mut Scope, _agent: &mut Agent) -> bool {
        true
    }

    /// Run one step of the species' behavior for a live agent.
    fn step_agent(&self, _scope: &mut Scope, _agent: &mut Agent) -> bool {
        true
    }

    /// Hook run after an agent's step, only if the whole step succeeded.
    fn post_step(&self, _scope: &mut Scope, _agent: &mut Agent) {}

    /// Abort any in-flight behavior for a dying agent.
    fn abort(&self, _scope: &mut Scope, _agent: &mut Agent) {}

    /// Population-level hook run once per eligible cycle, before any agent
    /// of the population steps.  Evaluate population-wide expressions here
    /// rather than once per agent.
    fn pre_step_population(&self, _scope: &mut Scope, _species: &Species) {}

    /// The initial value for `var` on a newly created agent, or `None` to
    /// fall back to the schema's declared default.
    fn init_value(&self, _scope: &mut Scope, _agent: &Agent, _var: &VarDef) -> Option<AttrValue> {
        None
    }

    /// The per-cycle value for an updatable `var`, or `None` to fall back to
    /// the schema's declared default.
    fn update_value(&self, _scope: &mut Scope, _agent: &Agent, _var: &VarDef) -> Option<AttrValue> {
        None
    }

    /// The current target set for a mirror `species`.  Only live targets
    /// should be returned; the mirror population disposes agents whose
    /// target is no longer in the set.
    fn mirror_targets(&self, _scope: &mut Scope, _species: &Species) -> Vec<AgentRef> {
        Vec::new()
    }
}

/// An [`Architecture`] whose behaviors all pass and do nothing.
#[derive(Debug)]
pub struct NoopArchitecture;

impl Architecture for NoopArchitecture {}
