//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Cycle` counter advanced by the driving
//! clock once per simulation step.  All scheduling arithmetic (frequency
//! gates, observer intervals) is exact integer math on cycles; there is no
//! wall-clock mapping at this layer.

use std::fmt;

// ── Cycle ─────────────────────────────────────────────────────────────────────

/// An absolute simulation cycle counter.
///
/// Stored as `u64` so overflow is not a practical concern at any feasible
/// stepping rate.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cycle(pub u64);

impl Cycle {
    pub const ZERO: Cycle = Cycle(0);

    /// The cycle `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Cycle {
        Cycle(self.0 + n)
    }

    /// `true` if this cycle passes a frequency gate of period `frequency`.
    ///
    /// Frequency 0 means "never".
    #[inline]
    pub fn passes_frequency(self, frequency: u64) -> bool {
        frequency != 0 && self.0.is_multiple_of(frequency)
    }
}

impl std::ops::Add<u64> for Cycle {
    type Output = Cycle;
    #[inline]
    fn add(self, rhs: u64) -> Cycle {
        Cycle(self.0 + rhs)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The driving clock: tracks the current cycle.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// The current cycle — advanced by `SimClock::advance()` each step.
    pub current_cycle: Cycle,
}

impl SimClock {
    pub fn new() -> Self {
        Self { current_cycle: Cycle::ZERO }
    }

    /// Advance the clock by one cycle.
    #[inline]
    pub fn advance(&mut self) {
        self.current_cycle = Cycle(self.current_cycle.0 + 1);
    }

    /// Force the current cycle, bypassing the monotonicity of `advance`.
    ///
    /// Only the checkpoint-restore path may call this.
    #[inline]
    pub fn set_cycle_unchecked(&mut self, cycle: Cycle) {
        self.current_cycle = cycle;
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.current_cycle)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a TOML/JSON file by the application crate and passed
/// to the simulation builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Total cycles to simulate.
    pub total_cycles: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Population size above which a concurrency-eligible species steps its
    /// agents on the worker pool (with the `parallel` feature).  Below the
    /// threshold agents are stepped sequentially in population order.
    pub parallel_threshold: usize,
}

impl SimConfig {
    /// The cycle at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_cycle(&self) -> Cycle {
        Cycle(self.total_cycles)
    }

    /// Construct the driving clock for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_cycles: 0,
            seed: 0,
            parallel_threshold: 64,
        }
    }
}
