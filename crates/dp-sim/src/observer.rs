//! Cluster observer trait for progress reporting and data collection.

use dp_core::{AgentId, Pid, Tick};

/// Callbacks invoked by [`ClusterSim::run`][crate::ClusterSim::run] at tick
/// boundaries.
///
/// All methods have default no-op implementations.  Callbacks always run on
/// the driver thread in ascending pid order, even when the partitions
/// themselves stepped in parallel.
pub trait SimObserver {
    /// Called at the very start of each tick.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once per partition per tick, after that partition's step
    /// phase.  `woken` is the number of agents that were stepped.
    fn on_partition_step(&mut self, _tick: Tick, _pid: Pid, _woken: usize) {}

    /// Called for each agent that crossed a partition boundary this tick.
    fn on_migration(&mut self, _tick: Tick, _agent: AgentId, _from: Pid, _to: Pid) {}

    /// Called at the end of each tick, after migrations resolved and halo
    /// snapshots were published.
    fn on_tick_end(&mut self, _tick: Tick) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
