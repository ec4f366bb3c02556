//! Fluent builder for constructing a [`Simulation`].

use std::sync::Arc;

use abm_engine::{Architecture, Population, Scope};
use abm_core::SimConfig;
use abm_schema::Species;

use crate::{SimError, SimResult, Simulation};

/// Fluent builder for [`Simulation<A>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — total cycles, seed, parallel threshold
/// - the world [`Species`] — its micro declarations become the model's
///   top-level populations
/// - `A: Architecture` — the behavior implementation
///
/// # Example
///
/// ```rust,ignore
/// let prey = SpeciesBuilder::new("prey").build();
/// let world = SpeciesBuilder::new("world").micro(prey).build();
/// let mut sim = SimBuilder::new(config, world, MyArchitecture).build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<A: Architecture> {
    config: SimConfig,
    world: Arc<Species>,
    arch: A,
}

impl<A: Architecture> SimBuilder<A> {
    pub fn new(config: SimConfig, world: Arc<Species>, arch: A) -> Self {
        Self { config, world, arch }
    }

    /// Validate the inputs, create the root population with its single
    /// world agent, and run the world's init (which creates the top-level
    /// micro-populations and eagerly populates any grids).
    pub fn build(self) -> SimResult<Simulation<A>> {
        if self.world.is_mirror() {
            return Err(SimError::Config("the world species cannot be a mirror".into()));
        }
        if self.world.frequency() == Some(0) {
            return Err(SimError::Config("the world species cannot have frequency 0".into()));
        }

        let mut scope = Scope::from_config(&self.config);
        let mut root = Population::new(self.world, None);
        root.create_agents(&mut scope, &self.arch, 1, &[], false)?;
        root.run_scheduled_inits(&mut scope, &self.arch);

        Ok(Simulation {
            clock: self.config.make_clock(),
            config: self.config,
            scope,
            root,
            arch: self.arch,
        })
    }
}
