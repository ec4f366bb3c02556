//! `abm-core` — foundational types for the `rust_abm` agent-based simulation
//! framework.
//!
//! This crate is a dependency of every other `abm-*` crate.  It intentionally
//! has no `abm-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentIndex`, `ListenerId`                            |
//! | [`value`]       | `AttrValue` (dynamic attribute values), `AgentRef`    |
//! | [`geometry`]    | `Point`, `Shape`                                      |
//! | [`clock`]       | `Cycle`, `SimClock`, `SimConfig`                      |
//! | [`rng`]         | `SimRng` (checkpointable simulation RNG)              |
//! | [`error`]       | `AbmError`, `AbmResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `abm-snapshot`.                                |

pub mod clock;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod rng;
pub mod value;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use clock::{Cycle, SimClock, SimConfig};
pub use error::{AbmError, AbmResult};
pub use geometry::{Point, Shape};
pub use ids::{AgentIndex, ListenerId};
pub use rng::SimRng;
pub use value::{AgentRef, AttrValue};
