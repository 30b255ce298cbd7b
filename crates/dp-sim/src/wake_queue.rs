//! `WakeQueue` — sparse per-tick agent activation queue.
//!
//! Most agents are idle most ticks.  Instead of scanning every resident
//! entity each tick, an agent registers the tick at which it next needs
//! attention and the step loop drains only that tick's entries — O(active)
//! work instead of O(N).
//!
//! `BTreeMap` keeps insert and pop at O(log W) where W is the number of
//! distinct future wake ticks, which stays tiny in practice.

use std::collections::BTreeMap;

use dp_core::{AgentId, Tick};

/// Maps simulation ticks to the agents that must wake at that tick.
#[derive(Default)]
pub struct WakeQueue {
    inner: BTreeMap<Tick, Vec<AgentId>>,
    /// Cached total entry count for O(1) `len()`.
    total: usize,
}

impl WakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `agent` to wake at `tick`.  Duplicate registrations for the
    /// same tick are collapsed at drain time.
    pub fn push(&mut self, tick: Tick, agent: AgentId) {
        self.inner.entry(tick).or_default().push(agent);
        self.total += 1;
    }

    /// Remove and return all agents scheduled for exactly `tick`, sorted
    /// ascending with duplicates removed.  The ascending order is what makes
    /// the apply phase deterministic.
    ///
    /// Returns `None` when no agents are queued for that tick (the common
    /// case — avoids allocation).
    pub fn drain_tick(&mut self, tick: Tick) -> Option<Vec<AgentId>> {
        let mut agents = self.inner.remove(&tick)?;
        self.total -= agents.len();
        agents.sort_unstable();
        agents.dedup();
        Some(agents)
    }

    /// Drop every queued wake for `agent`, returning the earliest dropped
    /// tick.  When the agent migrates away, that tick travels with the
    /// migrant so the new owner re-schedules it.
    pub fn forget(&mut self, agent: AgentId) -> Option<Tick> {
        let mut earliest = None;
        for (&tick, queue) in self.inner.iter_mut() {
            let before = queue.len();
            queue.retain(|&a| a != agent);
            if queue.len() < before {
                self.total -= before - queue.len();
                // Iteration is ascending, so the first hit is the earliest.
                earliest.get_or_insert(tick);
            }
        }
        self.inner.retain(|_, q| !q.is_empty());
        earliest
    }

    /// The earliest tick with at least one queued agent.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().copied()
    }

    /// Total number of (tick, agent) entries across all future ticks.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
