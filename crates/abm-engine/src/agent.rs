//! The mutable agent instance and its lifecycle state machine.
//!
//! # Lifecycle
//!
//! ```text
//! unscheduled ──init──▶ alive ──die──▶ dying ──▶ dead/disposed
//!      (scheduled=true)   │▲                        ▲
//!                         └┘ step (repeated)        └─ dispose() from any state
//! ```
//!
//! `dead` and `dying` each transition to `true` at most once and never reset;
//! `dying` guards re-entrant death processing, `dead` makes disposal
//! idempotent.  Removal from the owning population's sequence is the
//! population's job (it owns the storage); a dead agent left in the sequence
//! is swept at the end of the population's step.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use abm_core::{
    AbmError, AbmResult, AgentIndex, AgentRef, AttrValue, Point, Shape,
};
use abm_schema::{keys, Species, VarDef};

use crate::{Architecture, Population, Scope};

/// A string-keyed attribute map, created lazily on an agent's first write.
pub type AttrMap = FxHashMap<String, AttrValue>;

// ── PopulationPath ────────────────────────────────────────────────────────────

/// One hop of a [`PopulationPath`]: descend into the named micro-population,
/// then into the agent at `index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathStep {
    pub species: String,
    pub index: AgentIndex,
}

/// A root-relative address of a micro-population hosted somewhere in the
/// agent hierarchy, used by the extern registry to expose populations of a
/// nested model instance to a containing model's agents.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PopulationPath {
    /// Hops from the root agent down to the hosting agent.
    pub hops: Vec<PathStep>,
    /// The target micro-population's species name on the hosting agent.
    pub species: String,
}

impl PopulationPath {
    pub fn new(species: impl Into<String>) -> Self {
        Self { hops: Vec::new(), species: species.into() }
    }

    /// Append one hop (population name, agent index within it).
    pub fn through(mut self, species: impl Into<String>, index: AgentIndex) -> Self {
        self.hops.push(PathStep { species: species.into(), index });
        self
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// A live instance of a species.
///
/// Identity is `(owning population, index)`; the index is assigned at
/// creation, unique within the population, and never reassigned.  The agent
/// owns its attribute map, its geometry, and its micro-populations; the back
/// reference to the host is a non-owning [`AgentRef`] handle.
pub struct Agent {
    species: Arc<Species>,
    index: AgentIndex,
    host: Option<AgentRef>,
    /// Lazily created on first attribute write.
    attrs: Option<AttrMap>,
    /// Owned geometry; absent until a shape or location is assigned.
    shape: Option<Shape>,
    dead: bool,
    dying: bool,
    /// `true` while the agent's init behavior is pending.
    scheduled: bool,
    /// Owned micro-populations, one per nested species declaration,
    /// created lazily when the container variable initializes.
    micro: Vec<Population>,
    /// Extern registry: qualified name → root-relative population path.
    externs: FxHashMap<String, PopulationPath>,
}

impl Agent {
    pub(crate) fn new(species: Arc<Species>, index: AgentIndex, host: Option<AgentRef>) -> Self {
        Self {
            species,
            index,
            host,
            attrs: None,
            shape: None,
            dead: false,
            dying: false,
            scheduled: false,
            micro: Vec::new(),
            externs: FxHashMap::default(),
        }
    }

    // ── Identity ──────────────────────────────────────────────────────────

    pub fn species(&self) -> &Arc<Species> {
        &self.species
    }

    #[inline]
    pub fn index(&self) -> AgentIndex {
        self.index
    }

    /// A non-owning handle to this agent.
    pub fn as_ref(&self) -> AgentRef {
        AgentRef::new(self.species.name(), self.index)
    }

    /// The macro-agent hosting this agent's population, if any.
    pub fn host(&self) -> Option<&AgentRef> {
        self.host.as_ref()
    }

    /// The agent's display name: the `name` attribute if set, otherwise
    /// `species + index`.
    pub fn name(&self) -> String {
        match self.get_attr(keys::NAME).and_then(AttrValue::as_str) {
            Some(name) => name.to_owned(),
            None => format!("{}{}", self.species.name(), self.index.0),
        }
    }

    // ── Lifecycle flags ───────────────────────────────────────────────────

    #[inline]
    pub fn dead(&self) -> bool {
        self.dead
    }

    #[inline]
    pub fn dying(&self) -> bool {
        self.dying
    }

    /// `true` while the init behavior is pending (set at creation unless the
    /// agent was restored, cleared by `init`).
    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub(crate) fn mark_scheduled(&mut self) {
        self.scheduled = true;
    }

    // ── Attributes ────────────────────────────────────────────────────────

    /// Read a stored attribute.  Derived values (`location`, `index`, the
    /// default name) are synthesized by [`read_attr`][Self::read_attr], not
    /// stored here.
    pub fn get_attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.as_ref()?.get(name)
    }

    /// Read an attribute, synthesizing the derived pseudo-attributes the map
    /// never stores: `location` (from the geometry), `index`, and `name`.
    pub fn read_attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            keys::LOCATION => self.shape.as_ref().map(|s| s.location().into()),
            keys::INDEX => Some(AttrValue::Int(self.index.0 as i64)),
            keys::NAME => Some(self.name().into()),
            _ => self.get_attr(name).cloned(),
        }
    }

    /// Write an attribute through the normal set path.
    ///
    /// `shape` and `location` are absorbed into the owned geometry rather
    /// than stored in the map, so two agents can never alias one shape.
    pub fn set_attr(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        match (name.as_str(), &value) {
            (keys::SHAPE, AttrValue::Point(p)) => self.set_shape(Shape::at(*p)),
            (keys::LOCATION, AttrValue::Point(p)) => self.set_location(*p),
            _ => {
                self.attrs
                    .get_or_insert_with(AttrMap::default)
                    .insert(name, value);
            }
        }
    }

    /// The raw attribute map, if any write ever happened.
    pub fn attrs(&self) -> Option<&AttrMap> {
        self.attrs.as_ref()
    }

    /// Apply a captured attribute map through the normal set path, so that
    /// geometry absorption and any other set-side effects still happen.
    pub fn update_with<'v>(&mut self, attrs: impl IntoIterator<Item = (&'v String, &'v AttrValue)>) {
        for (name, value) in attrs {
            self.set_attr(name.clone(), value.clone());
        }
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Absorb `shape` as this agent's owned geometry.
    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = Some(shape);
    }

    /// The agent's location.  Fail-fast: an agent without geometry has no
    /// location to guess.
    pub fn location(&self) -> AbmResult<Point> {
        match &self.shape {
            Some(shape) => Ok(shape.location()),
            None => Err(AbmError::MissingGeometry {
                species: self.species.name().to_owned(),
                index: self.index,
            }),
        }
    }

    /// Move the agent, creating a point geometry if it has none yet.
    pub fn set_location(&mut self, location: Point) {
        match &mut self.shape {
            Some(shape) => shape.set_location(location),
            None => self.shape = Some(Shape::at(location)),
        }
    }

    // ── Micro-populations ─────────────────────────────────────────────────

    /// The owned micro-populations, in container initialization order.
    pub fn micro_populations(&self) -> &[Population] {
        &self.micro
    }

    pub fn micro_populations_mut(&mut self) -> &mut [Population] {
        &mut self.micro
    }

    /// The lazily created micro-population for a declared nested species, or
    /// `None` if it was never instantiated.
    pub fn micro_population(&self, name: &str) -> Option<&Population> {
        self.micro.iter().find(|p| p.species().name() == name)
    }

    pub fn micro_population_mut(&mut self, name: &str) -> Option<&mut Population> {
        self.micro.iter_mut().find(|p| p.species().name() == name)
    }

    pub(crate) fn add_micro(&mut self, population: Population) {
        // Micro-population names are unique per host; a second container
        // init for the same species is a no-op.
        if self.micro_population(population.species().name()).is_none() {
            self.micro.push(population);
        }
    }

    // ── Extern registry ───────────────────────────────────────────────────

    /// Expose a population hosted by another model instance under
    /// `qualified` (conventionally `modelAlias.speciesName`).
    pub fn register_extern(&mut self, qualified: impl Into<String>, path: PopulationPath) {
        self.externs.insert(qualified.into(), path);
    }

    pub fn extern_path(&self, qualified: &str) -> Option<&PopulationPath> {
        self.externs.get(qualified)
    }

    /// Walk a root-relative path down the hierarchy to its population.
    pub fn resolve_path<'a>(&'a self, path: &PopulationPath) -> Option<&'a Population> {
        let mut agent = self;
        for hop in &path.hops {
            agent = agent.micro_population(&hop.species)?.get(hop.index)?;
        }
        agent.micro_population(&path.species)
    }

    /// Resolve a species name to a population visible from this agent:
    /// a direct micro-population by simple name, else the extern registry
    /// resolved against `root`.
    pub fn population_for<'a>(&'a self, root: &'a Agent, name: &str) -> Option<&'a Population> {
        self.micro_population(name)
            .or_else(|| root.resolve_path(self.extern_path(name)?))
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Run the architecture's init behavior, then recursively initialize the
    /// owned micro-populations.  Returns `false` (abort) if the behavior
    /// fails or the scope was interrupted.
    pub fn init(&mut self, scope: &mut Scope, arch: &dyn Architecture) -> bool {
        if self.dead {
            return false;
        }
        self.scheduled = false;
        if !arch.init_agent(scope, self) || scope.is_interrupted() {
            return false;
        }
        for pop in &mut self.micro {
            if let Err(e) = pop.init(scope, arch) {
                scope.report_error(e);
                return false;
            }
        }
        true
    }

    /// One step: apply updatable variables in update order, then the
    /// architecture's step behavior, then the owned micro-populations.
    /// The post-step hook runs only if the whole step succeeded.
    pub fn step(&mut self, scope: &mut Scope, arch: &dyn Architecture, update_vars: &[VarDef]) -> bool {
        if self.dead {
            return false;
        }
        if self.scheduled && !self.init(scope, arch) {
            return false;
        }
        let ok = self.pre_step(scope, arch, update_vars) && self.do_step(scope, arch);
        if ok {
            arch.post_step(scope, self);
        }
        ok
    }

    fn pre_step(&mut self, scope: &mut Scope, arch: &dyn Architecture, update_vars: &[VarDef]) -> bool {
        for var in update_vars {
            let value = arch
                .update_value(scope, self, var)
                .or_else(|| var.default.clone());
            if scope.is_interrupted() {
                return false;
            }
            if let Some(value) = value {
                self.set_attr(var.name.clone(), value);
            }
        }
        true
    }

    fn do_step(&mut self, scope: &mut Scope, arch: &dyn Architecture) -> bool {
        if !arch.step_agent(scope, self) {
            return false;
        }
        for pop in &mut self.micro {
            if let Err(e) = pop.step(scope, arch) {
                scope.report_error(e);
                return false;
            }
        }
        true
    }

    /// The "die" action.  Guarded by `dying` so a re-entrant call is a
    /// no-op: aborts any in-flight behavior, records the death on the scope,
    /// then disposes immediately.  The owning population sweeps the corpse
    /// out of its sequence afterwards.
    pub fn die(&mut self, scope: &mut Scope, arch: &dyn Architecture) {
        if self.dying {
            return;
        }
        self.dying = true;
        arch.abort(scope, self);
        scope.record_death();
        self.dispose(scope);
    }

    /// Tear down the agent: flush its buffered output, dispose its
    /// micro-populations, and drop geometry and attributes.  Idempotent,
    /// reachable from any state.
    pub fn dispose(&mut self, scope: &mut Scope) {
        if self.dead {
            return;
        }
        self.dead = true;
        self.dying = true;
        scope.flush_agent(&self.as_ref());
        for pop in &mut self.micro {
            pop.dispose(scope);
        }
        self.shape = None;
        self.attrs = None;
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("species", &self.species.name())
            .field("index", &self.index)
            .field("dead", &self.dead)
            .field("micro", &self.micro.len())
            .finish()
    }
}
