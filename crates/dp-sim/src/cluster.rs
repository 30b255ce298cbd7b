//! `ClusterSim` — drives N partitions through lockstep ticks.

use std::sync::Arc;

use dp_core::{AgentId, AgentKind, Int2D, Pid, SimClock, SimConfig, Tick};
use dp_partition::{PartitionError, PartitionTree};
use dp_remote::{Directory, RemoteProcessor};

use crate::behavior::AgentBehavior;
use crate::error::{SimError, SimResult};
use crate::observer::SimObserver;
use crate::partition_sim::{PartitionSim, StepReport};

/// A whole cluster of partitions sharing one partition map and directory.
///
/// Each tick runs three cluster-wide phases in order — step, resolve,
/// publish — so that a migration started at tick T is complete before any
/// tick-T+1 stepping, and every halo mirror shows its neighbor's previous
/// completed step.  With the `parallel` feature the step phase runs on
/// Rayon's thread pool; the per-partition inbox sort keeps the outcome
/// identical to sequential execution.
///
/// Create via [`ClusterBuilder`][crate::ClusterBuilder].
pub struct ClusterSim<B: AgentBehavior> {
    config: SimConfig,
    partition: Arc<PartitionTree>,
    directory: Directory,
    /// The driver's clock; every partition clock advances in lockstep.
    clock: SimClock,
    partitions: Vec<PartitionSim<B>>,
}

impl<B: AgentBehavior> ClusterSim<B> {
    pub(crate) fn new(
        config: SimConfig,
        partition: Arc<PartitionTree>,
        directory: Directory,
        partitions: Vec<PartitionSim<B>>,
    ) -> Self {
        let clock = config.make_clock();
        Self { config, partition, directory, clock, partitions }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn partition_map(&self) -> &Arc<PartitionTree> {
        &self.partition
    }

    #[inline]
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// The inspector handle for one partition (cheap clone; safe to hold
    /// from another thread while the cluster runs).
    pub fn processor(&self, pid: Pid) -> SimResult<RemoteProcessor> {
        self.partitions
            .get(pid.index())
            .map(|sim| sim.processor().clone())
            .ok_or(SimError::Partition(PartitionError::UnknownPid(pid)))
    }

    /// Total entities resident across all partitions.  In-flight migrants
    /// are not counted, so this is exact only at tick boundaries.
    pub fn total_entities(&self) -> usize {
        self.partitions
            .iter()
            .map(|sim| sim.processor().with_storage(|s| s.entity_count()))
            .sum()
    }

    /// Outstanding remote requests across all partitions.
    pub fn pending_promises(&self) -> usize {
        self.partitions.iter().map(|sim| sim.pending_promises()).sum()
    }

    /// Spawn an agent at `point` on whichever partition owns it.
    pub fn spawn(
        &mut self,
        point: Int2D,
        kind: AgentKind,
        payload: Vec<u8>,
        wake_at: Option<Tick>,
    ) -> SimResult<AgentId> {
        let p = self.partition.world().wrap(point)?;
        let owner = self.partition.owner_of(p)?;
        self.partitions[owner.index()].spawn(p, kind, payload, wake_at)
    }

    // ── Driving ───────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`, invoking observer
    /// hooks at every tick boundary.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_tick < self.config.end_tick() {
            self.tick(observer)?;
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.tick(observer)?;
        }
        Ok(())
    }

    fn tick<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        // Phase 1: step every partition.  Observer callbacks run afterwards
        // on this thread, in pid order, regardless of stepping order.
        let reports = self.step_all(now)?;
        for (sim, report) in self.partitions.iter().zip(&reports) {
            observer.on_partition_step(now, sim.pid(), report.woken);
            for &(agent, dest) in &report.migrations {
                observer.on_migration(now, agent, sim.pid(), dest);
            }
        }

        // Phase 2: complete this tick's migrations and serve its requests,
        // so ownership has transferred before any next-tick stepping.
        for sim in &mut self.partitions {
            sim.resolve(now)?;
        }

        // Phase 3: publish boundary snapshots (applied at the neighbor's
        // next step drain).
        for sim in &mut self.partitions {
            sim.publish_halo()?;
        }

        for sim in &mut self.partitions {
            sim.advance();
        }
        self.clock.advance();
        observer.on_tick_end(now);
        Ok(())
    }

    #[cfg(not(feature = "parallel"))]
    fn step_all(&mut self, now: Tick) -> SimResult<Vec<StepReport>> {
        self.partitions.iter_mut().map(|sim| sim.step(now)).collect()
    }

    #[cfg(feature = "parallel")]
    fn step_all(&mut self, now: Tick) -> SimResult<Vec<StepReport>> {
        use rayon::prelude::*;
        self.partitions.par_iter_mut().map(|sim| sim.step(now)).collect()
    }
}
