//! Read-only aggregation over several populations.
//!
//! A [`MetaPopulation`] composes population sources without owning any
//! agents: iteration concatenates the underlying sequences, and the
//! species-name lookup map is memoized lazily and invalidated whenever the
//! composition changes.  No mutation of the underlying populations goes
//! through this type.

use std::cell::OnceCell;

use rustc_hash::FxHashMap;

use abm_core::AgentRef;

use crate::{Agent, Population};

/// A non-owning, ordered composition of populations.
pub struct MetaPopulation<'a> {
    sources: Vec<&'a Population>,
    /// Lazily built species-name → population map; cleared by `add_source`.
    by_name: OnceCell<FxHashMap<&'a str, &'a Population>>,
}

impl<'a> MetaPopulation<'a> {
    pub fn new() -> Self {
        Self { sources: Vec::new(), by_name: OnceCell::new() }
    }

    pub fn with_sources(sources: Vec<&'a Population>) -> Self {
        Self { sources, by_name: OnceCell::new() }
    }

    /// Append a source; invalidates the memoized name map.
    pub fn add_source(&mut self, population: &'a Population) {
        self.sources.push(population);
        self.by_name.take();
    }

    pub fn sources(&self) -> &[&'a Population] {
        &self.sources
    }

    /// The flattened species-name → population map.  When two sources share
    /// a species name, the earlier source wins.
    pub fn populations(&self) -> &FxHashMap<&'a str, &'a Population> {
        self.by_name.get_or_init(|| {
            let mut map = FxHashMap::default();
            for source in &self.sources {
                map.entry(source.species().name()).or_insert(*source);
            }
            map
        })
    }

    pub fn population_named(&self, name: &str) -> Option<&'a Population> {
        self.populations().get(name).copied()
    }

    /// All agents of all sources, concatenated without copying.
    pub fn iter(&self) -> impl Iterator<Item = &'a Agent> + '_ {
        self.sources.iter().flat_map(|p| p.agents().iter())
    }

    pub fn len(&self) -> usize {
        self.sources.iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.iter().all(|p| p.is_empty())
    }

    /// Agents matching `pred`, in source order.
    pub fn filter(&self, mut pred: impl FnMut(&Agent) -> bool) -> Vec<&'a Agent> {
        self.iter().filter(|a| pred(a)).collect()
    }

    /// Agents matching `pred`, always excluding the filtering caller itself.
    pub fn accept(&self, caller: &AgentRef, mut pred: impl FnMut(&Agent) -> bool) -> Vec<&'a Agent> {
        self.iter()
            .filter(|a| a.as_ref() != *caller && pred(a))
            .collect()
    }
}

impl Default for MetaPopulation<'_> {
    fn default() -> Self {
        Self::new()
    }
}
