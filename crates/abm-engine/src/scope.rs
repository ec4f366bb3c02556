//! The execution scope threaded through every init/step/dispose call.
//!
//! A [`Scope`] carries the cross-cutting execution context the engine and the
//! architecture collaborator share: the current cycle, the interrupt and
//! death-status signals, an error channel for in-simulation failures, and the
//! buffered per-agent output that gets flushed to the sink when an agent is
//! disposed.
//!
//! # Forking
//!
//! When a population steps its agents on the worker pool, each agent receives
//! a fresh [`fork`][Scope::fork] of the population's scope and the forks are
//! [`absorb`][Scope::absorb]ed back sequentially afterwards.  This keeps the
//! parallel phase free of shared mutable state without pretending the scope
//! is thread-safe.

use rustc_hash::FxHashMap;

use abm_core::{AgentRef, Cycle, SimConfig, SimRng};

/// Mutable execution context for one simulation run.
#[derive(Debug)]
pub struct Scope {
    cycle: Cycle,
    parallel_threshold: usize,
    /// The simulation's random stream.  All draws go through here so that
    /// `(seed, usage)` fully determines the generator state for checkpoints.
    rng: SimRng,
    interrupted: bool,
    /// Number of agent deaths signalled through this scope.
    deaths: u64,
    /// In-simulation error messages, drained by the driver between cycles.
    errors: Vec<String>,
    /// Per-agent buffered output lines, flushed to `sink` on disposal.
    buffers: FxHashMap<AgentRef, Vec<String>>,
    /// Flushed output lines, drained by the driver.
    sink: Vec<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::from_config(&SimConfig::default())
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            cycle: Cycle::ZERO,
            parallel_threshold: config.parallel_threshold,
            rng: SimRng::new(config.seed),
            interrupted: false,
            deaths: 0,
            errors: Vec::new(),
            buffers: FxHashMap::default(),
            sink: Vec::new(),
        }
    }

    // ── RNG ───────────────────────────────────────────────────────────────

    pub fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn rng_state(&self) -> (u64, u64) {
        (self.rng.seed(), self.rng.usage())
    }

    pub fn rng_algorithm(&self) -> &'static str {
        self.rng.algorithm()
    }

    /// Replace the random stream.  Only the checkpoint-restore path calls
    /// this.
    pub fn set_rng(&mut self, rng: SimRng) {
        self.rng = rng;
    }

    // ── Cycle ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Set the current cycle.  Called by the driving clock at each cycle
    /// boundary (and by the restore path).
    #[inline]
    pub fn set_cycle(&mut self, cycle: Cycle) {
        self.cycle = cycle;
    }

    #[inline]
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    // ── Interrupt & death status ──────────────────────────────────────────

    /// Signal that the current agent's init/step should abort mid-flight.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Re-arm the scope after an aborted agent; the next agent starts clean.
    pub fn clear_interrupt(&mut self) {
        self.interrupted = false;
    }

    /// Record one agent death.
    pub fn record_death(&mut self) {
        self.deaths += 1;
    }

    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    // ── Error channel ─────────────────────────────────────────────────────

    /// Report an in-simulation error.  Errors accumulate until drained; they
    /// do not abort sibling agents by themselves.
    pub fn report_error(&mut self, error: impl std::fmt::Display) {
        self.errors.push(error.to_string());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    // ── Buffered per-agent output ─────────────────────────────────────────

    /// Buffer one output line on behalf of `agent`.
    pub fn buffer_output(&mut self, agent: &AgentRef, line: impl Into<String>) {
        self.buffers.entry(agent.clone()).or_default().push(line.into());
    }

    /// Number of lines currently buffered for `agent`.
    pub fn buffered(&self, agent: &AgentRef) -> usize {
        self.buffers.get(agent).map_or(0, Vec::len)
    }

    /// Move `agent`'s buffered lines to the output sink.  Disposal calls
    /// this so no buffered output outlives its agent.
    pub fn flush_agent(&mut self, agent: &AgentRef) {
        if let Some(lines) = self.buffers.remove(agent) {
            self.sink.extend(lines);
        }
    }

    /// Drain all flushed output lines, in flush order.
    pub fn drain_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sink)
    }

    // ── Forking for the parallel phase ────────────────────────────────────

    /// An empty scope sharing this scope's cycle and configuration.
    ///
    /// Every fork resumes the random stream at the parent's position, so
    /// forks of the same scope see identical streams; within a parallel
    /// phase, cross-agent determinism is the architecture's responsibility.
    pub fn fork(&self) -> Scope {
        let (seed, usage) = self.rng_state();
        Scope {
            cycle: self.cycle,
            parallel_threshold: self.parallel_threshold,
            rng: SimRng::restore(seed, usage),
            interrupted: false,
            deaths: 0,
            errors: Vec::new(),
            buffers: FxHashMap::default(),
            sink: Vec::new(),
        }
    }

    /// Merge a fork's accumulated state back into this scope.  The fork's
    /// random draws are deliberately not merged; the parent stream stays at
    /// its pre-fork position.  The interrupt flag is scoped to the fork's
    /// agent and dies with the fork, matching the sequential path where the
    /// flag is cleared after every agent.
    pub fn absorb(&mut self, fork: Scope) {
        self.deaths += fork.deaths;
        self.errors.extend(fork.errors);
        for (agent, lines) in fork.buffers {
            self.buffers.entry(agent).or_default().extend(lines);
        }
        self.sink.extend(fork.sink);
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
