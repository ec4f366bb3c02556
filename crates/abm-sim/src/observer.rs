//! Simulation observer trait for progress reporting and data collection.

use abm_core::Cycle;

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run] at cycle
/// boundaries.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_cycle_end(&mut self, cycle: Cycle, output: &[String]) {
///         if cycle.0 % self.interval == 0 {
///             println!("{cycle}: {} output lines", output.len());
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each cycle, before any population steps.
    fn on_cycle_start(&mut self, _cycle: Cycle) {}

    /// Called at the end of each cycle.
    ///
    /// `output` holds the lines flushed to the output sink this cycle
    /// (buffered per-agent output is flushed when its agent is disposed).
    fn on_cycle_end(&mut self, _cycle: Cycle, _output: &[String]) {}

    /// Called once after the final cycle completes.
    fn on_sim_end(&mut self, _final_cycle: Cycle) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
