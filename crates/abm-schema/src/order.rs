//! The dependency ordering engine.
//!
//! Given a species, a facet kind, and a predicate selecting which variables
//! participate, [`order_vars`] produces a total order of the selected
//! variables such that every variable appears after everything it depends on.
//!
//! # Edges
//!
//! - For each selected variable, an edge from each of its selected
//!   dependencies (of the requested facet) to itself.
//! - For each synthetic container variable, an edge from `shape` to it —
//!   a host's geometry must be ready before its nested populations exist.
//! - Between consecutive container variables, an edge forcing declaration
//!   order, unless a reverse edge already constrains them the other way.
//!
//! # Cycle policy
//!
//! Adding an edge that would close a cycle is a no-op: the edge is dropped
//! rather than rejected, which tolerates legitimate mutual `update`
//! dependencies that cannot be strictly ordered.  Dropped edges are reported
//! in [`VarOrder::dropped`] so callers can surface diagnostics; the engine
//! itself never fails.
//!
//! # Determinism
//!
//! The traversal is Kahn's algorithm with a declaration-order tie-break, so
//! any unconstrained subset degrades to declaration order and the result is
//! identical across runs.

use crate::keys;
use crate::species::Species;
use crate::variable::{Facet, VarDef};

/// The result of one ordering run: variable names in a valid total order,
/// plus the edges that were dropped to keep the graph acyclic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarOrder {
    /// Selected variable names, dependency-ordered.
    pub names: Vec<String>,
    /// `(from, to)` edges that would have closed a cycle and were dropped.
    pub dropped: Vec<(String, String)>,
}

impl VarOrder {
    /// Position of `name` in the order, if selected.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

// ── Ordering graph ────────────────────────────────────────────────────────────

/// Dependency graph over the selected variables, indexed by declaration
/// position.  Kept acyclic by construction: `try_add` refuses (and records)
/// any edge whose insertion would create a cycle.
struct OrderingGraph<'a> {
    vars: Vec<&'a VarDef>,
    /// Successor lists, parallel to `vars`.
    succs: Vec<Vec<usize>>,
    dropped: Vec<(String, String)>,
}

impl<'a> OrderingGraph<'a> {
    fn new(vars: Vec<&'a VarDef>) -> Self {
        let n = vars.len();
        Self {
            vars,
            succs: vec![Vec::new(); n],
            dropped: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.name == name)
    }

    fn has_edge(&self, from: usize, to: usize) -> bool {
        self.succs[from].contains(&to)
    }

    /// `true` if `to` can already reach `from` — i.e. `from → to` would
    /// close a cycle.
    fn reaches(&self, start: usize, goal: usize) -> bool {
        let mut seen = vec![false; self.vars.len()];
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            if v == goal {
                return true;
            }
            if std::mem::replace(&mut seen[v], true) {
                continue;
            }
            stack.extend(self.succs[v].iter().copied());
        }
        false
    }

    /// Add `from → to` unless it already exists or would close a cycle;
    /// a cycle-closing edge is recorded in `dropped` instead.
    fn try_add(&mut self, from: usize, to: usize) {
        if from == to || self.has_edge(from, to) {
            return;
        }
        if self.reaches(to, from) {
            self.dropped
                .push((self.vars[from].name.clone(), self.vars[to].name.clone()));
            return;
        }
        self.succs[from].push(to);
    }

    /// Kahn traversal, smallest declaration index first among ready vertices.
    fn into_order(self) -> VarOrder {
        let n = self.vars.len();
        let mut indegree = vec![0usize; n];
        for succs in &self.succs {
            for &to in succs {
                indegree[to] += 1;
            }
        }

        let mut emitted = vec![false; n];
        let mut names = Vec::with_capacity(n);
        // The graph is acyclic by construction, so every vertex becomes
        // ready and the loop emits all n of them.
        while let Some(next) = (0..n).find(|&v| !emitted[v] && indegree[v] == 0) {
            emitted[next] = true;
            names.push(self.vars[next].name.clone());
            for &to in &self.succs[next] {
                indegree[to] -= 1;
            }
        }

        VarOrder { names, dropped: self.dropped }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Order the variables of `species` selected by `keep`, honoring the
/// dependency sets of `facet`.
///
/// Called twice per population construction — once for the init order
/// (all variables, [`Facet::Init`]) and once for the update order (updatable
/// variables, [`Facet::Update`]) — and the results cached for the
/// population's lifetime.
pub fn order_vars<F>(species: &Species, facet: Facet, keep: F) -> VarOrder
where
    F: Fn(&VarDef) -> bool,
{
    let selected: Vec<&VarDef> = species.all_vars().into_iter().filter(|v| keep(v)).collect();
    let mut graph = OrderingGraph::new(selected);

    // Declared dependency edges, restricted to the selected subset.
    for v in 0..graph.vars.len() {
        for dep in graph.vars[v].deps(facet) {
            if let Some(d) = graph.position(dep) {
                graph.try_add(d, v);
            }
        }
    }

    // The host's shape must be ready before any nested population is built.
    let shape = graph.position(keys::SHAPE);
    for v in 0..graph.vars.len() {
        if graph.vars[v].container {
            if let Some(s) = shape {
                graph.try_add(s, v);
            }
        }
    }

    // Consecutive container variables keep declaration order, so that a
    // host's nested populations enumerate in the order they were declared —
    // unless an explicit dependency already constrains them the other way.
    let containers: Vec<usize> = (0..graph.vars.len())
        .filter(|&v| graph.vars[v].container)
        .collect();
    for pair in containers.windows(2) {
        let (c1, c2) = (pair[0], pair[1]);
        if !graph.has_edge(c2, c1) {
            graph.try_add(c1, c2);
        }
    }

    graph.into_order()
}

/// The init order: every variable, `Init` facet.
pub fn init_order(species: &Species) -> VarOrder {
    order_vars(species, Facet::Init, |_| true)
}

/// The update order: updatable variables only, `Update` facet.
pub fn update_order(species: &Species) -> VarOrder {
    order_vars(species, Facet::Update, |v| v.updatable)
}
