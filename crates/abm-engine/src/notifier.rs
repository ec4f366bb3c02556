//! Structural change notification for populations.
//!
//! Events fire at exactly three points: after a creation batch is complete,
//! after a removal, and after a clear.  They never interleave with the
//! mutation they describe, so a listener observing an event always sees the
//! population in its post-mutation state.

use abm_core::{AgentIndex, ListenerId};

/// A structural change to a population's agent sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopulationEvent {
    /// A creation batch completed.  `indices` lists every agent the batch
    /// added, in creation order; one event per batch regardless of size.
    AgentsAdded {
        species: String,
        indices: Vec<AgentIndex>,
    },
    /// Agents were removed from the live sequence.
    AgentsRemoved {
        species: String,
        indices: Vec<AgentIndex>,
    },
    /// The whole population was cleared (bulk kill or teardown).
    Cleared { species: String },
}

/// Receives [`PopulationEvent`]s from one population.
pub trait PopulationListener: Send {
    fn on_population_event(&mut self, event: &PopulationEvent);
}

/// Listener registry embedded in each population.
#[derive(Default)]
pub struct Notifier {
    next: u32,
    listeners: Vec<(ListenerId, Box<dyn PopulationListener>)>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; the returned id removes it later.
    pub fn add(&mut self, listener: Box<dyn PopulationListener>) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener by id; `false` if the id was never registered or
    /// already removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &PopulationEvent) {
        for (_, listener) in &mut self.listeners {
            listener.on_population_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
