//! `abm-snapshot` — checkpoint and restore for the `rust_abm` framework.
//!
//! Snapshots are immutable value records of an agent or population, captured
//! on demand from live state and consumed once by a restore (or serialized
//! to an external format via their serde derives).  Capture filters out the
//! always-derived pseudo-attributes; restore applies everything else through
//! the engine's normal attribute-set path.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`record`]  | `AgentSnapshot`, `PopulationSnapshot` (serde value types) |
//! | [`capture`] | `snapshot_agent`, `snapshot_population`, exclusion sets   |
//! | [`restore`] | `restore_agent`, `restore_population` (index-matched)     |
//! | [`csv`]     | flat one-row-per-agent CSV export                         |
//! | [`error`]   | `SnapshotError`, `SnapshotResult`                         |

pub mod capture;
pub mod csv;
pub mod error;
pub mod record;
pub mod restore;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use capture::{is_excluded, snapshot_agent, snapshot_population, BASE_EXCLUDED, GRID_EXCLUDED};
pub use csv::{export_population_csv, write_population_csv};
pub use error::{SnapshotError, SnapshotResult};
pub use record::{AgentSnapshot, PopulationSnapshot};
pub use restore::{restore_agent, restore_population};
