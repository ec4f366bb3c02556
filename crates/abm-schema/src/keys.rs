//! Well-known attribute names.
//!
//! Built-in variables (`name`, `shape`, `location`) exist on every species;
//! the rest are pseudo-attributes produced by derived accessors or the
//! snapshot layer.  Keeping them as constants means the exclusion sets in
//! `abm-snapshot` and the consumption rules in `abm-engine` cannot drift on a
//! typo.

/// Built-in: the agent's display name.
pub const NAME: &str = "name";
/// Built-in: the agent's owned geometry.
pub const SHAPE: &str = "shape";
/// Built-in: the agent's location (initialises after `shape`).
pub const LOCATION: &str = "location";

/// Mirror populations: the mirrored target agent reference.
pub const TARGET: &str = "target";

// ── Derived pseudo-attributes (never snapshotted) ─────────────────────────────

pub const MEMBERS: &str = "members";
pub const AGENTS: &str = "agents";
pub const HOST: &str = "host";
pub const PEERS: &str = "peers";
pub const INDEX: &str = "index";
pub const EXPERIMENT: &str = "experiment";
pub const WORLD: &str = "world";
pub const TIME: &str = "time";
pub const MACHINE_TIME: &str = "machine_time";
pub const DURATION: &str = "duration";
pub const AVERAGE_DURATION: &str = "average_duration";
pub const TOTAL_DURATION: &str = "total_duration";

// ── Grid pseudo-attributes ────────────────────────────────────────────────────

pub const GRID_X: &str = "grid_x";
pub const GRID_Y: &str = "grid_y";
pub const NEIGHBORS: &str = "neighbors";

// ── Simulation-root extras (snapshot only) ────────────────────────────────────

pub const SEED: &str = "seed";
pub const RNG: &str = "rng";
pub const RNG_USAGE: &str = "rng_usage";
pub const CYCLE: &str = "cycle";
