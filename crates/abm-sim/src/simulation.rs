//! The `Simulation` struct and its cycle loop.

use abm_core::{AgentIndex, AttrValue, Cycle, SimClock, SimConfig, SimRng};
use abm_engine::{Agent, Architecture, Population, PopulationPath, Scope};
use abm_schema::keys;
use abm_snapshot::{restore_agent, snapshot_agent, AgentSnapshot};

use crate::{SimError, SimObserver, SimResult};

/// Index of the root ("world") agent within the root population.
pub const WORLD_INDEX: AgentIndex = AgentIndex(0);

/// The simulation root: the driving clock, the execution scope (including
/// the master random stream), and the root population holding exactly one
/// world agent whose micro-populations are the model's top-level species.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
#[derive(Debug)]
pub struct Simulation<A: Architecture> {
    /// Global configuration (total cycles, seed, parallel threshold).
    pub config: SimConfig,

    /// Simulation clock — tracks the current cycle.
    pub clock: SimClock,

    pub(crate) scope: Scope,
    pub(crate) root: Population,
    pub(crate) arch: A,
}

impl<A: Architecture> Simulation<A> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current cycle to `config.end_cycle()`, calling observer
    /// hooks at every cycle boundary.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        loop {
            let now = self.clock.current_cycle;
            if now >= self.config.end_cycle() {
                break;
            }
            observer.on_cycle_start(now);
            self.step_cycle(now)?;
            let output = self.scope.drain_output();
            observer.on_cycle_end(now, &output);
            self.clock.advance();
        }
        observer.on_sim_end(self.clock.current_cycle);
        Ok(())
    }

    /// Run exactly `n` cycles from the current position (ignores
    /// `end_cycle`).  Useful for tests and incremental stepping.
    pub fn run_cycles<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            let now = self.clock.current_cycle;
            observer.on_cycle_start(now);
            self.step_cycle(now)?;
            let output = self.scope.drain_output();
            observer.on_cycle_end(now, &output);
            self.clock.advance();
        }
        Ok(())
    }

    fn step_cycle(&mut self, now: Cycle) -> SimResult<()> {
        self.scope.set_cycle(now);
        self.root.step(&mut self.scope, &self.arch)?;
        Ok(())
    }

    /// Tear down the whole agent hierarchy.
    pub fn dispose(&mut self) {
        let Self { root, scope, .. } = self;
        root.dispose(scope);
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// The root ("world") agent.
    pub fn world(&self) -> SimResult<&Agent> {
        Ok(self.root.agent(WORLD_INDEX)?)
    }

    pub fn world_mut(&mut self) -> SimResult<&mut Agent> {
        Ok(self.root.agent_mut(WORLD_INDEX)?)
    }

    /// A top-level population by species name (extern names resolve too).
    pub fn population(&self, name: &str) -> Option<&Population> {
        let world = self.root.get(WORLD_INDEX)?;
        world.population_for(world, name)
    }

    pub fn population_mut(&mut self, name: &str) -> Option<&mut Population> {
        // Resolve first with a short immutable borrow: a direct micro name
        // needs no path, an extern name yields its root-relative path.
        let path: Option<PopulationPath> = {
            let world = self.root.get(WORLD_INDEX)?;
            if world.micro_population(name).is_some() {
                None
            } else {
                Some(world.extern_path(name)?.clone())
            }
        };
        let mut agent = self.root.get_mut(WORLD_INDEX)?;
        match path {
            None => agent.micro_population_mut(name),
            Some(path) => {
                for hop in &path.hops {
                    agent = agent.micro_population_mut(&hop.species)?.get_mut(hop.index)?;
                }
                agent.micro_population_mut(&path.species)
            }
        }
    }

    // ── Checkpointing ─────────────────────────────────────────────────────

    /// Capture the whole simulation: a deep snapshot of the world agent plus
    /// the simulation-root extras (`seed`, `rng`, `rng_usage`, `cycle`).
    pub fn snapshot(&self) -> SimResult<AgentSnapshot> {
        let mut record = snapshot_agent(self.world()?, true);
        let (seed, usage) = self.scope.rng_state();
        record.attrs.insert(keys::SEED.to_owned(), AttrValue::Int(seed as i64));
        record.attrs.insert(
            keys::RNG.to_owned(),
            AttrValue::Str(self.scope.rng_algorithm().to_owned()),
        );
        record.attrs.insert(keys::RNG_USAGE.to_owned(), AttrValue::Int(usage as i64));
        record
            .attrs
            .insert(keys::CYCLE.to_owned(), AttrValue::Int(self.clock.current_cycle.0 as i64));
        Ok(record)
    }

    /// Restore a whole-simulation snapshot.
    ///
    /// The simulation-only extras are stripped and applied through dedicated
    /// setters — the clock is forced to the captured cycle and the random
    /// stream is rebuilt by replaying its usage counter — before the rest of
    /// the record goes through the normal restore path.
    pub fn restore(&mut self, record: &AgentSnapshot) -> SimResult<()> {
        let mut record = record.clone();

        if let Some(algorithm) = record.attrs.remove(keys::RNG) {
            if algorithm.as_str() != Some(self.scope.rng_algorithm()) {
                return Err(SimError::Config(format!(
                    "snapshot RNG algorithm '{algorithm}' does not match '{}'",
                    self.scope.rng_algorithm()
                )));
            }
        }
        let seed = record.attrs.remove(keys::SEED).and_then(|v| v.as_int());
        let usage = record.attrs.remove(keys::RNG_USAGE).and_then(|v| v.as_int());
        if let (Some(seed), Some(usage)) = (seed, usage) {
            self.scope.set_rng(SimRng::restore(seed as u64, usage as u64));
        }
        if let Some(cycle) = record.attrs.remove(keys::CYCLE).and_then(|v| v.as_int()) {
            let cycle = Cycle(cycle as u64);
            self.clock.set_cycle_unchecked(cycle);
            self.scope.set_cycle(cycle);
        }

        let Self { root, scope, arch, .. } = self;
        let world = root.agent_mut(WORLD_INDEX)?;
        restore_agent(&record, world, scope, arch)?;
        Ok(())
    }
}
