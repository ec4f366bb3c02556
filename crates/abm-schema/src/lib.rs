//! `abm-schema` — immutable species schemas for the `rust_abm` framework.
//!
//! A *species* is the per-type description shared by all its agent instances:
//! ordered variable definitions with declared dependencies, a behavior list,
//! nested ("micro") species declarations, an optional parent schema, and a
//! capability (skill) set.  Schemas are built once during model load and
//! immutable thereafter; populations derive their cached initialization and
//! update orders from them via the ordering engine in [`order`].
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`keys`]        | Well-known attribute name constants                   |
//! | [`variable`]    | `VarDef`, `Facet` (dependency facet kinds)            |
//! | [`species`]     | `Species`, `SpeciesBuilder`, `GridDims`               |
//! | [`order`]       | `order_vars`, `VarOrder` (cycle-tolerant topological  |
//! |                 | ordering with dropped-edge diagnostics)               |

pub mod keys;
pub mod order;
pub mod species;
pub mod variable;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use order::{init_order, order_vars, update_order, VarOrder};
pub use species::{GridDims, Species, SpeciesBuilder};
pub use variable::{Facet, VarDef};
