//! `abm-sim` — simulation root and cycle loop for the `rust_abm` framework.
//!
//! # Cycle loop
//!
//! ```text
//! for cycle in 0..config.total_cycles:
//!   ① Gate     — each population checks its species' frequency gate.
//!   ② Mirrors  — mirror populations reconcile against their target sets.
//!   ③ Init     — pending init behaviors drain.
//!   ④ Step     — every live agent steps (parallel with the `parallel`
//!                feature for concurrency-eligible populations), recursing
//!                into owned micro-populations.
//!   ⑤ Observe  — flushed output is handed to the observer.
//! ```
//!
//! The whole hierarchy hangs off a single root ("world") agent whose
//! micro-populations are the model's top-level species; stepping the root
//! population steps the entire model.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Forwards to `abm-engine/parallel` (Rayon worker pool).   |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use abm_core::SimConfig;
//! use abm_engine::NoopArchitecture;
//! use abm_schema::SpeciesBuilder;
//! use abm_sim::{NoopObserver, SimBuilder};
//!
//! let prey = SpeciesBuilder::new("prey").build();
//! let world = SpeciesBuilder::new("world").micro(prey).build();
//! let mut sim = SimBuilder::new(config, world, NoopArchitecture).build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod simulation;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use simulation::{Simulation, WORLD_INDEX};
