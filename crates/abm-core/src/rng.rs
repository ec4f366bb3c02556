//! Checkpointable simulation RNG.
//!
//! # Determinism strategy
//!
//! The simulation owns a single `SimRng` seeded from the run's master seed.
//! Every draw funnels through one primitive (`next_u64`) and increments a
//! usage counter, so the generator's exact state can be captured as
//! `(seed, algorithm, usage)` and later restored by re-seeding and replaying
//! `usage` primitive draws.  Replay cost is linear in `usage` but only paid
//! on checkpoint restore, never on the hot path.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Simulation-level RNG with a usage counter for checkpoint/restore.
///
/// Used only in single-threaded or explicitly synchronised contexts.  If a
/// parallel phase needs randomness, give each worker its own `SimRng` derived
/// via [`SimRng::child`].
pub struct SimRng {
    seed: u64,
    usage: u64,
    inner: SmallRng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            usage: 0,
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Rebuild a generator whose state matches one that was seeded with
    /// `seed` and then drawn from `usage` times.
    pub fn restore(seed: u64, usage: u64) -> Self {
        let mut rng = SimRng::new(seed);
        for _ in 0..usage {
            rng.next_u64();
        }
        rng
    }

    /// Derive a child `SimRng` with a different seed offset — useful for
    /// seeding per-thread generators deterministically from the root seed.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed = self.next_u64() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng::new(child_seed)
    }

    // ── Checkpoint state ──────────────────────────────────────────────────

    /// The master seed this generator was created with.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// How many primitive draws have been taken since seeding.
    #[inline]
    pub fn usage(&self) -> u64 {
        self.usage
    }

    /// Name of the underlying algorithm, captured in snapshots.
    #[inline]
    pub fn algorithm(&self) -> &'static str {
        "small"
    }

    // ── Draws ─────────────────────────────────────────────────────────────
    //
    // Every public draw decomposes into `next_u64` calls so that the usage
    // counter fully determines the generator state.

    /// The primitive draw: one 64-bit value, one usage tick.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.usage += 1;
        self.inner.next_u64()
    }

    /// A uniform float in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        // 53 mantissa bits of one primitive draw.
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p.clamp(0.0, 1.0)
    }

    /// A uniform index in `0..n`.
    ///
    /// # Panics
    /// Panics if `n == 0`.
    #[inline]
    pub fn gen_index(&mut self, n: usize) -> usize {
        assert!(n > 0, "gen_index called with n == 0");
        (self.next_f64() * n as f64) as usize % n
    }

    /// Choose a random element from a slice; `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        let i = self.gen_index(slice.len());
        Some(&slice[i])
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.gen_index(i + 1);
            slice.swap(i, j);
        }
    }
}

impl std::fmt::Debug for SimRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimRng")
            .field("seed", &self.seed)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}
