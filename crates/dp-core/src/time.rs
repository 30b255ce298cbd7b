//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter; the mapping to wall
//! time is held in `SimClock`:
//!
//!   wall_time = start_unix_secs + tick * tick_duration_secs
//!
//! An integer tick as the canonical unit keeps all schedule arithmetic exact
//! and comparisons O(1).  Every partition advances its own clock; the cluster
//! driver keeps them in lockstep, so `steps()`/`time()` reads taken under the
//! processor lock are step-consistent.

use std::fmt;

use crate::error::{DpError, DpResult};
use crate::geo::WorldBounds;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and wall-clock seconds.  Cheap to copy,
/// holds no heap data.
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) of tick 0.
    pub start_unix_secs: i64,
    /// How many real seconds one tick represents.
    pub tick_duration_secs: u32,
    /// The current tick — advanced once per completed step.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start_unix_secs: i64, tick_duration_secs: u32) -> Self {
        Self {
            start_unix_secs,
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> i64 {
        self.current_tick.0 as i64 * self.tick_duration_secs as i64
    }

    /// Current Unix timestamp corresponding to `current_tick`.
    #[inline]
    pub fn current_unix_secs(&self) -> i64 {
        self.start_unix_secs + self.elapsed_secs()
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (+{}s)", self.current_tick, self.elapsed_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level configuration for a distributed run, identical on every
/// partition.
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// The fixed global coordinate space.
    pub world: WorldBounds,

    /// Number of partitions (processes) tiling the world.
    pub num_partitions: usize,

    /// Area-of-interest radius: the halo margin width, in cells, mirrored
    /// from each neighbor.  Also the upper bound on how far an agent may
    /// move in one step and still land in known territory.
    pub aoi: i32,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results
    /// (in sequential mode).
    pub seed: u64,

    /// Unix timestamp for tick 0.
    pub start_unix_secs: i64,

    /// Seconds per tick.
    pub tick_duration_secs: u32,

    /// Evict unfulfilled promises this many ticks after they were issued.
    /// `None` keeps them until fulfilled, however long that takes.
    pub promise_ttl_ticks: Option<u64>,
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs, self.tick_duration_secs)
    }

    /// Reject configurations the partitioner or halo exchange cannot honor.
    pub fn validate(&self) -> DpResult<()> {
        if self.num_partitions == 0 {
            return Err(DpError::Config("num_partitions must be >= 1".into()));
        }
        if self.aoi < 0 {
            return Err(DpError::Config(format!("aoi must be >= 0, got {}", self.aoi)));
        }
        let w = self.world.rect;
        if w.is_empty() {
            return Err(DpError::Config(format!("world bounds {w} are empty")));
        }
        // Every partition needs at least one cell per axis after splitting.
        if (w.area() as usize) < self.num_partitions {
            return Err(DpError::Config(format!(
                "cannot tile {} cells across {} partitions",
                w.area(),
                self.num_partitions
            )));
        }
        Ok(())
    }
}
