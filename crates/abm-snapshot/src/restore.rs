//! Applying snapshot records back onto live agents and populations.
//!
//! Restore goes through the normal attribute-set path, so geometry
//! absorption and any other set-side effects still happen.  Population
//! restore is index-matched: live agents named by the record are updated in
//! place, missing indices are re-created through the restored-creation path
//! (no init behavior re-run), and live agents absent from the record are
//! disposed.  Partially applied attributes are not rolled back on failure.

use rustc_hash::FxHashSet;

use abm_core::{AbmError, AgentIndex};
use abm_engine::{Agent, Architecture, Population, Scope};

use crate::{AgentSnapshot, PopulationSnapshot, SnapshotResult};

/// Apply an agent record onto a live agent of the same species.
///
/// Recurses into nested-population records matched by micro-species name;
/// a record name with no corresponding live micro-population is skipped.
pub fn restore_agent(
    record: &AgentSnapshot,
    agent: &mut Agent,
    scope: &mut Scope,
    arch: &dyn Architecture,
) -> SnapshotResult<()> {
    if record.species != agent.species().name() {
        return Err(AbmError::SpeciesMismatch {
            snapshot: record.species.clone(),
            target: agent.species().name().to_owned(),
        }
        .into());
    }
    agent.update_with(record.attrs.iter());
    for (name, pop_record) in &record.micro {
        if let Some(pop) = agent.micro_population_mut(name) {
            restore_population(pop_record, pop, scope, arch)?;
        }
    }
    Ok(())
}

/// Apply a population record onto a live population of the same species.
pub fn restore_population(
    record: &PopulationSnapshot,
    pop: &mut Population,
    scope: &mut Scope,
    arch: &dyn Architecture,
) -> SnapshotResult<()> {
    if record.species != pop.species().name() {
        return Err(AbmError::SpeciesMismatch {
            snapshot: record.species.clone(),
            target: pop.species().name().to_owned(),
        }
        .into());
    }

    // Dispose live agents the record does not name.
    let wanted: FxHashSet<AgentIndex> = record.agents.iter().map(|a| a.index).collect();
    let extras: Vec<AgentIndex> = pop
        .agents()
        .iter()
        .map(Agent::index)
        .filter(|ix| !wanted.contains(ix))
        .collect();
    for index in extras {
        pop.kill_agent(scope, arch, index)?;
    }

    // Update in place, creating missing indices as restored agents.
    for agent_record in &record.agents {
        let index = pop.get_or_create_agent(scope, arch, agent_record.index)?;
        let agent = pop.agent_mut(index)?;
        restore_agent(agent_record, agent, scope, arch)?;
    }

    pop.reserve_indices(record.next_index);
    Ok(())
}
