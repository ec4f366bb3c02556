//! The `Topology` trait — the spatial-placement extension point.
//!
//! Spatial indexing and geometry computation are external concerns; the
//! population only needs location normalization, a geometry-change
//! notification, and a nearest-agent query over candidates it supplies.

use abm_core::{AgentRef, Point};

/// Pluggable spatial placement.  Owned by a population and replaced on
/// re-initialization via [`Population::set_topology`][crate::Population::set_topology].
pub trait Topology: Send + Sync {
    /// Clamp or wrap a requested location into the topology's space.
    fn normalize(&self, location: Point) -> Point {
        location
    }

    /// Notification that an agent's geometry moved to `location`.
    fn on_moved(&self, _agent: &AgentRef, _location: Point) {}

    /// The candidate nearest to `from`.  The default is a linear scan;
    /// indexed topologies override it.
    fn nearest(&self, from: Point, candidates: &[(AgentRef, Point)]) -> Option<AgentRef> {
        candidates
            .iter()
            .min_by(|(_, a), (_, b)| from.distance(*a).total_cmp(&from.distance(*b)))
            .map(|(r, _)| r.clone())
    }
}

/// A [`Topology`] with no bounds and no index.
pub struct NoopTopology;

impl Topology for NoopTopology {}
