//! The immutable species schema and its builder.
//!
//! # Inheritance
//!
//! A species may name a single parent (linear inheritance, never multiple).
//! [`Species::all_vars`] walks the parent chain ancestor-first and lets a
//! child redeclare a variable by name, replacing the parent's definition in
//! place — declaration *position* is inherited from the first declaration so
//! that ordering stays stable across the hierarchy.
//!
//! # Built-ins
//!
//! Every root species implicitly declares `name`, `shape`, and `location`
//! (with `location` initializing after `shape`).  Micro-species declarations
//! add one synthetic container variable each, in declaration order.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::keys;
use crate::variable::VarDef;

/// Grid dimensions for species whose population is a spatial matrix.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridDims {
    pub rows: u32,
    pub cols: u32,
}

impl GridDims {
    #[inline]
    pub fn cell_count(self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

// ── Species ───────────────────────────────────────────────────────────────────

/// Immutable per-species schema, shared (`Arc`) by every population and agent
/// of that species.
///
/// Built once during model load via [`SpeciesBuilder`]; never mutated
/// afterwards.
#[derive(Debug)]
pub struct Species {
    name: String,
    parent: Option<Arc<Species>>,
    /// Own variable declarations, in declaration order.  Built-ins and
    /// synthetic container variables are inserted by the builder.
    vars: Vec<VarDef>,
    /// Nested species declarations, in declaration order.
    micro: Vec<Arc<Species>>,
    /// Behavior names, executed by the architecture collaborator.
    behaviors: Vec<String>,
    /// Capability ("skill") set.
    skills: BTreeSet<String>,
    /// Step frequency: `None` = every cycle, `Some(0)` = never.
    frequency: Option<u64>,
    /// `true` if this species mirrors a dynamically computed target set.
    mirror: bool,
    /// `true` if populations of this species may step agents in parallel.
    concurrent: bool,
    /// Grid dimensions, for species backed by a spatial matrix.
    grid: Option<GridDims>,
}

impl Species {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Species>> {
        self.parent.as_ref()
    }

    pub fn behaviors(&self) -> &[String] {
        &self.behaviors
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill) || self.parent.as_ref().is_some_and(|p| p.has_skill(skill))
    }

    pub fn frequency(&self) -> Option<u64> {
        self.frequency
    }

    pub fn is_mirror(&self) -> bool {
        self.mirror
    }

    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    pub fn grid(&self) -> Option<GridDims> {
        self.grid
    }

    pub fn is_grid(&self) -> bool {
        self.grid.is_some()
    }

    // ── Variables ─────────────────────────────────────────────────────────

    /// The full variable list, inheritance applied: ancestor declarations
    /// first, child redeclarations replacing them in place.
    pub fn all_vars(&self) -> Vec<&VarDef> {
        let mut merged: Vec<&VarDef> = Vec::new();
        self.collect_vars(&mut merged);
        merged
    }

    fn collect_vars<'a>(&'a self, merged: &mut Vec<&'a VarDef>) {
        if let Some(parent) = &self.parent {
            parent.collect_vars(merged);
        }
        for var in &self.vars {
            match merged.iter().position(|v| v.name == var.name) {
                Some(pos) => merged[pos] = var,
                None => merged.push(var),
            }
        }
    }

    /// Look up a variable by name anywhere in the inheritance chain
    /// (child declarations shadow the parent's).
    pub fn get_var(&self, name: &str) -> Option<&VarDef> {
        self.vars
            .iter()
            .find(|v| v.name == name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get_var(name)))
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.get_var(name).is_some()
    }

    /// `true` if any variable (inherited included) is updatable.
    pub fn has_updatable_vars(&self) -> bool {
        self.all_vars().iter().any(|v| v.updatable)
    }

    // ── Micro species ─────────────────────────────────────────────────────

    /// Nested species declarations, in declaration order.
    pub fn micro_species(&self) -> &[Arc<Species>] {
        &self.micro
    }

    pub fn micro_species_named(&self, name: &str) -> Option<&Arc<Species>> {
        self.micro.iter().find(|s| s.name() == name)
    }
}

impl PartialEq for Species {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "species {}", self.name)
    }
}

// ── SpeciesBuilder ────────────────────────────────────────────────────────────

/// Fluent builder for [`Species`].
///
/// # Example
///
/// ```rust
/// use abm_schema::{SpeciesBuilder, VarDef};
///
/// let prey = SpeciesBuilder::new("prey").build();
/// let wolf = SpeciesBuilder::new("wolf")
///     .var(VarDef::new("energy").with_default(10i64).updatable())
///     .var(VarDef::new("speed").init_depends_on(["energy"]))
///     .behavior("hunt")
///     .skill("moving")
///     .build();
/// let world = SpeciesBuilder::new("world")
///     .micro(prey)
///     .micro(wolf)
///     .build();
/// assert_eq!(world.micro_species().len(), 2);
/// ```
pub struct SpeciesBuilder {
    name: String,
    parent: Option<Arc<Species>>,
    vars: Vec<VarDef>,
    micro: Vec<Arc<Species>>,
    behaviors: Vec<String>,
    skills: BTreeSet<String>,
    frequency: Option<u64>,
    mirror: bool,
    concurrent: bool,
    grid: Option<GridDims>,
}

impl SpeciesBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            vars: Vec::new(),
            micro: Vec::new(),
            behaviors: Vec::new(),
            skills: BTreeSet::new(),
            frequency: None,
            mirror: false,
            concurrent: false,
            grid: None,
        }
    }

    /// Set the single parent schema (linear inheritance).
    pub fn parent(mut self, parent: Arc<Species>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn var(mut self, var: VarDef) -> Self {
        self.vars.push(var);
        self
    }

    /// Declare a nested species; a synthetic container variable of the same
    /// name is added at this position in the declaration order.
    pub fn micro(mut self, species: Arc<Species>) -> Self {
        self.vars.push(VarDef::container(species.name()));
        self.micro.push(species);
        self
    }

    pub fn behavior(mut self, name: impl Into<String>) -> Self {
        self.behaviors.push(name.into());
        self
    }

    pub fn skill(mut self, name: impl Into<String>) -> Self {
        self.skills.insert(name.into());
        self
    }

    /// Step every `frequency` cycles; 0 means never.
    pub fn frequency(mut self, frequency: u64) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Keep this species' population synchronized to a target agent set.
    pub fn mirror(mut self) -> Self {
        self.mirror = true;
        self
    }

    /// Allow populations of this species to step agents on the worker pool.
    pub fn concurrent(mut self) -> Self {
        self.concurrent = true;
        self
    }

    /// Back the population with a `rows × cols` spatial matrix.
    pub fn grid(mut self, rows: u32, cols: u32) -> Self {
        self.grid = Some(GridDims { rows, cols });
        self
    }

    pub fn build(self) -> Arc<Species> {
        let mut vars = Vec::with_capacity(self.vars.len() + 3);
        // Built-ins only on root species; subspecies inherit them.
        if self.parent.is_none() {
            vars.push(VarDef::new(keys::NAME));
            vars.push(VarDef::new(keys::SHAPE));
            vars.push(VarDef::new(keys::LOCATION).init_depends_on([keys::SHAPE]));
        }
        vars.extend(self.vars);
        Arc::new(Species {
            name: self.name,
            parent: self.parent,
            vars,
            micro: self.micro,
            behaviors: self.behaviors,
            skills: self.skills,
            frequency: self.frequency,
            mirror: self.mirror,
            concurrent: self.concurrent,
            grid: self.grid,
        })
    }
}
