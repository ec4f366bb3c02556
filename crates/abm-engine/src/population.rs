//! The population: owning container and scheduler for one species' agents.
//!
//! A population is the only component allowed to mutate its set of indices
//! and to fire structural change notifications.  It owns the live agent
//! sequence (insertion order is observable), the cached init/update variable
//! orders derived from the schema, a monotonically advancing index allocator,
//! the topology, and the listener registry.
//!
//! # Creation protocol
//!
//! [`create_agents`][Population::create_agents] works per batch, not per
//! agent: geometry is applied eagerly with shape-over-location precedence,
//! all agents are appended in one bulk operation, ordered attribute
//! initialization runs, and exactly one `AgentsAdded` event fires last —
//! listeners never observe a half-initialized batch.
//!
//! # Stepping protocol
//!
//! [`step`][Population::step] evaluates the frequency gate, reconciles mirror
//! membership, runs the architecture's population pre-step hook, drains
//! pending init behaviors, then steps every live agent (on the worker pool
//! when the species is concurrency-eligible, the population is large enough,
//! and the `parallel` feature is on).  Agents that died during the step are
//! swept out of the sequence at the end.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use abm_core::{AbmError, AbmResult, AgentIndex, AgentRef, AttrValue, ListenerId, Point, Shape};
use abm_schema::{keys, GridDims, Species, VarDef};

use crate::notifier::{Notifier, PopulationEvent, PopulationListener};
use crate::topology::NoopTopology;
use crate::{Agent, Architecture, AttrMap, Scope, Topology};

/// Post-creation hook, run once per new agent; returning `false`
/// short-circuits the remaining agents of the batch.
pub type PostCreation<'a> = &'a mut dyn FnMut(&mut Scope, &mut Agent) -> bool;

/// The agents of one species under one host.
pub struct Population {
    species: Arc<Species>,
    /// The macro-agent hosting this population; `None` for a root population.
    host: Option<AgentRef>,
    /// Live agent sequence, insertion order significant.
    agents: Vec<Agent>,
    /// Next index to allocate.  Advances monotonically; indices are never
    /// reused within the population's lifetime.
    next_index: AgentIndex,
    /// Ordered variable arrays, derived once from the schema.
    init_vars: Vec<VarDef>,
    update_vars: Vec<VarDef>,
    /// Dependency edges the ordering engine dropped to stay acyclic.
    dropped_edges: Vec<(String, String)>,
    topology: Box<dyn Topology>,
    notifier: Notifier,
    /// Set during bulk kill/teardown so disposal of one agent does not
    /// perturb the iteration over the others.
    is_disposing: bool,
}

impl Population {
    pub fn new(species: Arc<Species>, host: Option<AgentRef>) -> Self {
        let init_order = abm_schema::init_order(&species);
        let update_order = abm_schema::update_order(&species);
        let resolve = |names: &[String]| -> Vec<VarDef> {
            names.iter().filter_map(|n| species.get_var(n).cloned()).collect()
        };
        let init_vars = resolve(&init_order.names);
        let update_vars = resolve(&update_order.names);
        let mut dropped_edges = init_order.dropped;
        dropped_edges.extend(update_order.dropped);
        Self {
            species,
            host,
            agents: Vec::new(),
            next_index: AgentIndex(0),
            init_vars,
            update_vars,
            dropped_edges,
            topology: Box::new(NoopTopology),
            notifier: Notifier::new(),
            is_disposing: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn species(&self) -> &Arc<Species> {
        &self.species
    }

    pub fn host(&self) -> Option<&AgentRef> {
        self.host.as_ref()
    }

    /// The live agent sequence, in insertion order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn next_index(&self) -> AgentIndex {
        self.next_index
    }

    /// Advance the allocator so every index below `up_to` counts as used.
    /// The restore path calls this with the captured allocator position;
    /// the allocator never moves backwards.
    pub fn reserve_indices(&mut self, up_to: AgentIndex) {
        if up_to.0 > self.next_index.0 {
            self.next_index = up_to;
        }
    }

    /// Dependency edges dropped by the ordering engine, for diagnostics.
    pub fn dropped_edges(&self) -> &[(String, String)] {
        &self.dropped_edges
    }

    /// The cached initialization order, as variable names.
    pub fn init_var_names(&self) -> impl Iterator<Item = &str> {
        self.init_vars.iter().map(|v| v.name.as_str())
    }

    /// The cached update order, as variable names.
    pub fn update_var_names(&self) -> impl Iterator<Item = &str> {
        self.update_vars.iter().map(|v| v.name.as_str())
    }

    pub fn get(&self, index: AgentIndex) -> Option<&Agent> {
        self.agents.iter().find(|a| a.index() == index)
    }

    pub fn get_mut(&mut self, index: AgentIndex) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.index() == index)
    }

    /// Fail-fast lookup of a live agent.
    pub fn agent(&self, index: AgentIndex) -> AbmResult<&Agent> {
        self.get(index).ok_or_else(|| AbmError::AgentNotFound {
            species: self.species.name().to_owned(),
            index,
        })
    }

    pub fn agent_mut(&mut self, index: AgentIndex) -> AbmResult<&mut Agent> {
        let species = self.species.name().to_owned();
        self.agents
            .iter_mut()
            .find(|a| a.index() == index)
            .ok_or(AbmError::AgentNotFound { species, index })
    }

    // ── Topology ──────────────────────────────────────────────────────────

    /// Replace the owned topology.  Called on (re)initialization; existing
    /// agent locations are not re-normalized.
    pub fn set_topology(&mut self, topology: Box<dyn Topology>) {
        self.topology = topology;
    }

    /// Move an agent to a normalized location and notify the topology.
    pub fn move_agent(&mut self, index: AgentIndex, location: Point) -> AbmResult<()> {
        let location = self.topology.normalize(location);
        let species = self.species.name().to_owned();
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.index() == index)
            .ok_or(AbmError::AgentNotFound { species, index })?;
        agent.set_location(location);
        let moved = agent.as_ref();
        self.topology.on_moved(&moved, location);
        Ok(())
    }

    /// The live agent nearest to `from`, by the topology's metric.
    pub fn nearest_agent(&self, from: Point) -> Option<AgentRef> {
        let candidates: Vec<(AgentRef, Point)> = self
            .agents
            .iter()
            .filter_map(|a| Some((a.as_ref(), a.shape()?.location())))
            .collect();
        self.topology.nearest(from, &candidates)
    }

    // ── Listeners ─────────────────────────────────────────────────────────

    pub fn add_listener(&mut self, listener: Box<dyn PopulationListener>) -> ListenerId {
        self.notifier.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.notifier.remove(id)
    }

    fn emit(&mut self, event: PopulationEvent) {
        self.notifier.emit(&event);
    }

    // ── Initialization ────────────────────────────────────────────────────

    /// Prepare the population for its first cycle.  Grid species populate
    /// eagerly here, row-major, one agent per cell.
    pub fn init(&mut self, scope: &mut Scope, arch: &dyn Architecture) -> AbmResult<()> {
        if let Some(dims) = self.species.grid() {
            if self.agents.is_empty() {
                self.populate_grid(scope, arch, dims)?;
            }
        }
        Ok(())
    }

    fn populate_grid(&mut self, scope: &mut Scope, arch: &dyn Architecture, dims: GridDims) -> AbmResult<()> {
        let mut maps = Vec::with_capacity(dims.cell_count());
        for row in 0..dims.rows {
            for col in 0..dims.cols {
                let mut map = AttrMap::default();
                map.insert(keys::GRID_X.to_owned(), AttrValue::Int(col as i64));
                map.insert(keys::GRID_Y.to_owned(), AttrValue::Int(row as i64));
                map.insert(
                    keys::LOCATION.to_owned(),
                    AttrValue::Point(Point::new(col as f64 + 0.5, row as f64 + 0.5)),
                );
                maps.push(map);
            }
        }
        self.create_batch(scope, arch, maps.len(), &maps, false, None, None)?;
        Ok(())
    }

    // ── Creation ──────────────────────────────────────────────────────────

    /// Create `count` agents, optionally seeded from `init_values` (one map
    /// per slot; missing maps mean "no explicit values").  Restored agents
    /// skip the init behavior — their state already reflects a prior init.
    pub fn create_agents(
        &mut self,
        scope: &mut Scope,
        arch: &dyn Architecture,
        count: usize,
        init_values: &[AttrMap],
        restored: bool,
    ) -> AbmResult<Vec<AgentIndex>> {
        self.create_batch(scope, arch, count, init_values, restored, None, None)
    }

    /// [`create_agents`][Self::create_agents] with a post-creation hook run
    /// once per new agent (short-circuits on `false`).
    pub fn create_agents_with(
        &mut self,
        scope: &mut Scope,
        arch: &dyn Architecture,
        count: usize,
        init_values: &[AttrMap],
        restored: bool,
        post: PostCreation<'_>,
    ) -> AbmResult<Vec<AgentIndex>> {
        self.create_batch(scope, arch, count, init_values, restored, None, Some(post))
    }

    /// Create one agent at an explicit index (the restore path).
    ///
    /// Fails fast with [`AbmError::DuplicateIndex`] if the index is already
    /// live; on success the allocator advances past the index so it is never
    /// handed out again.
    pub fn create_agent_at(
        &mut self,
        scope: &mut Scope,
        arch: &dyn Architecture,
        index: AgentIndex,
        init_values: Option<AttrMap>,
        restored: bool,
    ) -> AbmResult<AgentIndex> {
        let maps: Vec<AttrMap> = init_values.into_iter().collect();
        self.create_batch(scope, arch, 1, &maps, restored, Some(index), None)?;
        Ok(index)
    }

    /// The live agent at `index`, created (as restored) if absent.
    pub fn get_or_create_agent(
        &mut self,
        scope: &mut Scope,
        arch: &dyn Architecture,
        index: AgentIndex,
    ) -> AbmResult<AgentIndex> {
        if self.get(index).is_some() {
            return Ok(index);
        }
        self.create_agent_at(scope, arch, index, None, true)
    }

    fn create_batch(
        &mut self,
        scope: &mut Scope,
        arch: &dyn Architecture,
        count: usize,
        init_values: &[AttrMap],
        restored: bool,
        base: Option<AgentIndex>,
        mut post: Option<PostCreation<'_>>,
    ) -> AbmResult<Vec<AgentIndex>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        // 1. Allocate indices: the explicit base for restore-to-index
        //    requests, the shared allocator otherwise.  The allocator always
        //    ends past every index used, so indices stay unique.
        let start = match base {
            Some(base) => {
                for k in 0..count {
                    let index = base.offset(k as u32);
                    if self.get(index).is_some() {
                        return Err(AbmError::DuplicateIndex {
                            species: self.species.name().to_owned(),
                            index,
                        });
                    }
                }
                base
            }
            None => self.next_index,
        };
        let end = start.offset(count as u32);
        if end.0 > self.next_index.0 {
            self.next_index = end;
        }

        let mut maps: Vec<Option<AttrMap>> =
            (0..count).map(|k| init_values.get(k).cloned()).collect();

        // 2+3. Construct agents, applying geometry eagerly (an explicit
        //      shape wins over an explicit location; the consumed key is
        //      removed so it is not re-applied generically), then append the
        //      whole batch in one go.
        let first_slot = self.agents.len();
        for (k, map) in maps.iter_mut().enumerate() {
            let index = start.offset(k as u32);
            let mut agent = Agent::new(self.species.clone(), index, self.host.clone());
            if let Some(map) = map {
                if let Some(p) = map.get(keys::SHAPE).and_then(AttrValue::as_point) {
                    agent.set_shape(Shape::at(self.topology.normalize(p)));
                    map.remove(keys::SHAPE);
                } else if let Some(p) = map.get(keys::LOCATION).and_then(AttrValue::as_point) {
                    agent.set_location(self.topology.normalize(p));
                    map.remove(keys::LOCATION);
                }
            }
            // 4. Schedule the init behavior, unless restored.
            if !restored {
                agent.mark_scheduled();
            }
            self.agents.push(agent);
        }

        // 5. Ordered attribute initialization.  Explicit values win over the
        //    architecture; the architecture wins over schema defaults.
        //    Container variables create their micro-population here.
        for k in 0..count {
            let slot = first_slot + k;
            for vi in 0..self.init_vars.len() {
                let var = &self.init_vars[vi];
                let explicit = maps[k].as_mut().and_then(|m| m.remove(&var.name));
                if var.name == keys::SHAPE || var.name == keys::LOCATION {
                    continue; // consumed eagerly in step 2
                }
                if var.container {
                    if let Some(micro) = self.species.micro_species_named(&var.name) {
                        let host_ref = self.agents[slot].as_ref();
                        self.agents[slot].add_micro(Population::new(micro.clone(), Some(host_ref)));
                    }
                    continue;
                }
                let value = match explicit {
                    Some(v) => Some(v),
                    None => arch
                        .init_value(scope, &self.agents[slot], var)
                        .or_else(|| var.default.clone()),
                };
                if let Some(value) = value {
                    self.agents[slot].set_attr(var.name.clone(), value);
                }
            }
            // Values not declared in the schema become ad hoc attributes.
            if let Some(map) = maps[k].take() {
                for (name, value) in map {
                    self.agents[slot].set_attr(name, value);
                }
            }
        }

        // 6. Post-creation hook, short-circuiting on failure.
        if let Some(post) = post.as_mut() {
            for k in 0..count {
                if !post(scope, &mut self.agents[first_slot + k]) {
                    break;
                }
            }
        }

        // 7. One event for the whole batch, after everything else.
        let indices: Vec<AgentIndex> = (0..count).map(|k| start.offset(k as u32)).collect();
        self.emit(PopulationEvent::AgentsAdded {
            species: self.species.name().to_owned(),
            indices: indices.clone(),
        });
        Ok(indices)
    }

    // ── Stepping ──────────────────────────────────────────────────────────

    /// Step the population for the scope's current cycle.
    ///
    /// A cycle gated out by the species' frequency is a no-op returning
    /// `Ok(true)` without touching the architecture.  Per-agent behavior
    /// failures are absorbed into each agent's own result and never abort
    /// siblings; only structural failures (mirror reconciliation) surface
    /// as errors.
    pub fn step(&mut self, scope: &mut Scope, arch: &dyn Architecture) -> AbmResult<bool> {
        if let Some(frequency) = self.species.frequency() {
            if !scope.cycle().passes_frequency(frequency) {
                return Ok(true);
            }
        }
        if self.species.is_mirror() {
            self.manage_mirror(scope, arch)?;
        }
        arch.pre_step_population(scope, &self.species);
        self.run_scheduled_inits(scope, arch);
        self.step_agents(scope, arch);
        self.sweep_dead();
        Ok(true)
    }

    /// Drain pending init behaviors.  Always sequential: init may create
    /// micro-populations and is not a candidate for the worker pool.
    pub fn run_scheduled_inits(&mut self, scope: &mut Scope, arch: &dyn Architecture) {
        for i in 0..self.agents.len() {
            if self.agents[i].is_scheduled() {
                self.agents[i].init(scope, arch);
                scope.clear_interrupt();
            }
        }
    }

    fn step_agents(&mut self, scope: &mut Scope, arch: &dyn Architecture) {
        let update_vars = &self.update_vars;

        #[cfg(feature = "parallel")]
        if self.species.is_concurrent() && self.agents.len() >= scope.parallel_threshold() {
            use rayon::prelude::*;

            let base: &Scope = scope;
            let forks: Vec<Scope> = self
                .agents
                .par_iter_mut()
                .map(|agent| {
                    let mut fork = base.fork();
                    agent.step(&mut fork, arch, update_vars);
                    fork
                })
                .collect();
            for fork in forks {
                scope.absorb(fork);
            }
            return;
        }

        for agent in &mut self.agents {
            agent.step(scope, arch, update_vars);
            scope.clear_interrupt();
        }
    }

    /// Remove agents that died during the step and fire one removal event.
    fn sweep_dead(&mut self) {
        if self.is_disposing {
            return;
        }
        let removed: Vec<AgentIndex> = self
            .agents
            .iter()
            .filter(|a| a.dead())
            .map(Agent::index)
            .collect();
        if removed.is_empty() {
            return;
        }
        self.agents.retain(|a| !a.dead());
        self.emit(PopulationEvent::AgentsRemoved {
            species: self.species.name().to_owned(),
            indices: removed,
        });
    }

    // ── Mirror reconciliation ─────────────────────────────────────────────

    /// Synchronize membership with the architecture's current target set:
    /// dispose agents whose target is gone, create agents for new targets
    /// (each attributed with a `target` reference).
    fn manage_mirror(&mut self, scope: &mut Scope, arch: &dyn Architecture) -> AbmResult<()> {
        let targets = arch.mirror_targets(scope, &self.species);
        let wanted: FxHashSet<&AgentRef> = targets.iter().collect();

        let stale: Vec<AgentIndex> = self
            .agents
            .iter()
            .filter(|a| {
                !a.get_attr(keys::TARGET)
                    .and_then(AttrValue::as_agent)
                    .is_some_and(|t| wanted.contains(t))
            })
            .map(Agent::index)
            .collect();
        for index in stale {
            self.kill_agent(scope, arch, index)?;
        }

        let tracked: FxHashSet<AgentRef> = self
            .agents
            .iter()
            .filter_map(|a| a.get_attr(keys::TARGET)?.as_agent().cloned())
            .collect();
        let maps: Vec<AttrMap> = targets
            .into_iter()
            .filter(|t| !tracked.contains(t))
            .map(|t| {
                let mut map = AttrMap::default();
                map.insert(keys::TARGET.to_owned(), AttrValue::Agent(t));
                map
            })
            .collect();
        if !maps.is_empty() {
            self.create_batch(scope, arch, maps.len(), &maps, false, None, None)?;
        }
        Ok(())
    }

    // ── Removal ───────────────────────────────────────────────────────────

    /// Kill one agent and remove it from the sequence.
    pub fn kill_agent(
        &mut self,
        scope: &mut Scope,
        arch: &dyn Architecture,
        index: AgentIndex,
    ) -> AbmResult<()> {
        let pos = self
            .agents
            .iter()
            .position(|a| a.index() == index)
            .ok_or_else(|| AbmError::AgentNotFound {
                species: self.species.name().to_owned(),
                index,
            })?;
        self.agents[pos].die(scope, arch);
        self.agents.remove(pos);
        self.emit(PopulationEvent::AgentsRemoved {
            species: self.species.name().to_owned(),
            indices: vec![index],
        });
        Ok(())
    }

    /// Kill every member.  The disposal loop runs over the owned sequence
    /// with `is_disposing` set, so individual deaths do not try to splice
    /// the sequence being iterated; one `Cleared` event fires at the end.
    pub fn kill_members(&mut self, scope: &mut Scope, arch: &dyn Architecture) {
        self.is_disposing = true;
        for agent in &mut self.agents {
            agent.die(scope, arch);
        }
        self.agents.clear();
        self.is_disposing = false;
        self.emit(PopulationEvent::Cleared {
            species: self.species.name().to_owned(),
        });
    }

    /// Teardown without running death behaviors.
    pub fn dispose(&mut self, scope: &mut Scope) {
        self.is_disposing = true;
        for agent in &mut self.agents {
            agent.dispose(scope);
        }
        self.agents.clear();
        self.is_disposing = false;
        self.emit(PopulationEvent::Cleared {
            species: self.species.name().to_owned(),
        });
    }
}

impl std::fmt::Debug for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Population")
            .field("species", &self.species.name())
            .field("agents", &self.agents.len())
            .field("next_index", &self.next_index)
            .finish()
    }
}
