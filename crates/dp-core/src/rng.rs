//! Deterministic per-agent and simulation-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Per-agent randomness is derived, never stored: an agent's RNG for a given
//! step is seeded from
//!
//!   seed = global_seed XOR (agent_id * C) XOR (tick * C')
//!
//! where the mixing constants are 64-bit golden-ratio fractions that spread
//! consecutive ids/ticks uniformly across the seed space.  Because the seed
//! is a pure function of `(global_seed, agent, tick)`, an agent draws the
//! same values no matter which partition owns it — RNG state does not need
//! to migrate with the agent, and no cross-thread synchronisation is needed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ids::AgentId;
use crate::time::Tick;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;
/// Second-order mixing constant for the tick term.
const TICK_CONSTANT: u64 = 0xc2b2_ae3d_27d4_eb4f;

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// Per-agent, per-step deterministic RNG.
///
/// Created fresh by the step loop for each `(agent, tick)` pair; intentionally
/// `!Sync` so it is never shared across threads.
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed and an agent id.
    pub fn new(global_seed: u64, agent: AgentId) -> Self {
        let seed = global_seed ^ agent.0.wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed for one `(agent, tick)` step — the form the step loop uses.
    pub fn at_tick(global_seed: u64, agent: AgentId, tick: Tick) -> Self {
        let seed = global_seed
            ^ agent.0.wrapping_mul(MIXING_CONSTANT)
            ^ tick.0.wrapping_mul(TICK_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Choose a random element from a slice.  Returns `None` if empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Partition-level RNG for global operations (initial placement, exogenous
/// events).  Used only in single-partition contexts; derive one per pid via
/// [`SimRng::child`] so partitions never share a stream.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset — used to seed
    /// per-partition RNGs deterministically from the root seed.
    pub fn child(seed: u64, offset: u64) -> SimRng {
        SimRng(SmallRng::seed_from_u64(seed ^ offset.wrapping_mul(MIXING_CONSTANT)))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
