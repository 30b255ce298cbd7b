//! `RemoteProcessor` — the shared handle through which anything outside the
//! tick loop inspects or mutates one partition's state.
//!
//! The driver and external inspectors contend for the same lock, so the
//! guard releases with `unlock_fair`: a visualizer polling in a tight loop
//! cannot starve the tick loop, and vice versa.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use dp_core::{IntRect, Pid, SimClock, Tick};
use dp_field::{GridStorage, HaloField};

use crate::error::RemoteResult;

/// One line of recorded diagnostics, stamped with the tick it was taken at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatRecord {
    pub tick: Tick,
    pub text: String,
}

/// The lock-protected interior of a processor.
pub struct ProcessorState {
    pub field: HaloField,
    pub clock: SimClock,
    pub steps: u64,
    stat_enabled: bool,
    debug_enabled: bool,
    stats: Vec<StatRecord>,
    debugs: Vec<StatRecord>,
}

impl ProcessorState {
    pub fn new(field: HaloField, clock: SimClock) -> Self {
        Self {
            field,
            clock,
            steps: 0,
            stat_enabled: false,
            debug_enabled: false,
            stats: Vec::new(),
            debugs: Vec::new(),
        }
    }

    pub fn init_stat(&mut self) {
        self.stat_enabled = true;
    }

    pub fn init_debug(&mut self) {
        self.debug_enabled = true;
    }

    /// Record a statistics line.  The closure is only evaluated when stat
    /// recording is on, so formatting costs nothing when disabled.
    pub fn record_stat<F: FnOnce() -> String>(&mut self, f: F) {
        if self.stat_enabled {
            let text = f();
            self.stats.push(StatRecord { tick: self.clock.current_tick, text });
        }
    }

    pub fn record_debug<F: FnOnce() -> String>(&mut self, f: F) {
        if self.debug_enabled {
            let text = f();
            debug!(pid = self.field.pid().0, tick = self.clock.current_tick.0, "{text}");
            self.debugs.push(StatRecord { tick: self.clock.current_tick, text });
        }
    }

    pub fn stat_list(&self) -> &[StatRecord] {
        &self.stats
    }

    pub fn debug_list(&self) -> &[StatRecord] {
        &self.debugs
    }
}

/// Cloneable handle to one partition's lock-protected state.
#[derive(Clone)]
pub struct RemoteProcessor {
    pid: Pid,
    state: Arc<Mutex<ProcessorState>>,
}

impl RemoteProcessor {
    pub fn new(field: HaloField, clock: SimClock) -> Self {
        let pid = field.pid();
        Self {
            pid,
            state: Arc::new(Mutex::new(ProcessorState::new(field, clock))),
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Acquire the processor lock.  Dropping the guard hands the lock off
    /// fairly to the longest waiter.
    pub fn lock(&self) -> ProcessorGuard<'_> {
        ProcessorGuard { inner: Some(self.state.lock()) }
    }

    // ── Convenience inspectors (each takes the lock briefly) ──────────────

    pub fn steps(&self) -> u64 {
        self.lock().steps
    }

    pub fn tick(&self) -> Tick {
        self.lock().clock.current_tick
    }

    /// Current simulated Unix time on this partition.
    pub fn time(&self) -> i64 {
        self.lock().clock.current_unix_secs()
    }

    /// This partition's authoritative slice.
    pub fn local_bounds(&self) -> IntRect {
        self.lock().field.local_bounds()
    }

    /// Local slice plus halo margin (the full readable region).
    pub fn storage_bounds(&self) -> Vec<IntRect> {
        self.lock().field.storage_bounds().to_vec()
    }

    /// The whole world rectangle.
    pub fn world_bounds(&self) -> IntRect {
        self.lock().field.partition().world().rect
    }

    /// Every partition's local slice, indexed by pid.
    pub fn all_local_bounds(&self) -> Vec<IntRect> {
        self.lock().field.partition().all_local_bounds().to_vec()
    }

    /// Run `f` with read access to the authoritative storage.
    pub fn with_storage<R>(&self, f: impl FnOnce(&GridStorage) -> R) -> R {
        f(self.lock().field.local_storage())
    }

    /// Run `f` with the full state locked, propagating its result.
    pub fn with_state<R>(
        &self,
        f: impl FnOnce(&mut ProcessorState) -> RemoteResult<R>,
    ) -> RemoteResult<R> {
        f(&mut self.lock())
    }
}

/// Lock guard that releases fairly on drop.
pub struct ProcessorGuard<'a> {
    inner: Option<MutexGuard<'a, ProcessorState>>,
}

impl Deref for ProcessorGuard<'_> {
    type Target = ProcessorState;
    fn deref(&self) -> &ProcessorState {
        self.inner.as_ref().unwrap()
    }
}

impl DerefMut for ProcessorGuard<'_> {
    fn deref_mut(&mut self) -> &mut ProcessorState {
        self.inner.as_mut().unwrap()
    }
}

impl Drop for ProcessorGuard<'_> {
    fn drop(&mut self) {
        if let Some(guard) = self.inner.take() {
            MutexGuard::unlock_fair(guard);
        }
    }
}
