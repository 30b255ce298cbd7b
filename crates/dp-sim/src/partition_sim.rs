//! `PartitionSim` — one partition's step loop.
//!
//! Each tick a partition runs three phases, driven in lockstep by
//! [`ClusterSim`][crate::ClusterSim]:
//!
//! 1. **Step** ([`step`][PartitionSim::step]): apply the halo overwrites and
//!    reply settlements waiting in the inbox, drain this tick's wake queue,
//!    call [`AgentBehavior::step`] for each woken agent in ascending
//!    `AgentId` order, then apply the produced intents and ship the outbound
//!    migrants and remote requests.
//! 2. **Resolve** ([`resolve`][PartitionSim::resolve]): consume the migrants
//!    and requests sent during this tick's step phase, so every migrant is
//!    owned by its destination before any next-tick stepping and every
//!    request is served against post-step state and replied to.
//! 3. **Publish** ([`publish_halo`][PartitionSim::publish_halo]): push
//!    boundary snapshots to every neighbor.  Applied at the neighbor's next
//!    step drain, so mirrors always show the previous completed step.
//!
//! Each phase body runs under the processor lock and releases it with a fair
//! unlock at the phase boundary, so an external inspector polling the
//! [`RemoteProcessor`] handle is admitted between phases instead of starving.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use dp_core::{AgentId, AgentKind, AgentRng, Int2D, Pid, SimConfig, Tick};
use dp_field::{Entity, MoveOutcome};
use dp_partition::PartitionTree;
use dp_remote::{
    Directory, Envelope, Inbox, ProcessorState, Promise, PromiseTable, PromiseValue,
    RemoteFault, RemoteOutcome, RemoteProcessor, Request, processor_name,
};

use crate::behavior::{AgentBehavior, Intent, StepContext};
use crate::error::SimResult;
use crate::wake_queue::WakeQueue;

/// What one partition did during its step phase, reported back to the
/// cluster driver for observer callbacks.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Number of agents stepped this tick.
    pub woken: usize,
    /// Agents that left this partition, with their destination.
    pub migrations: Vec<(AgentId, Pid)>,
}

/// One partition's simulation state and step machinery.
pub struct PartitionSim<B: AgentBehavior> {
    pid: Pid,
    config: SimConfig,
    partition: Arc<PartitionTree>,
    processor: RemoteProcessor,
    behavior: Arc<B>,
    directory: Directory,
    inbox: Inbox,
    wake_queue: WakeQueue,
    promises: PromiseTable,
    /// Envelopes drained in one phase but belonging to a later one.
    held: Vec<Envelope>,
    /// Serial counter for agents spawned on this partition.
    next_serial: u64,
}

/// Which drain is running.  Envelope handling is phase-scoped so that the
/// tick outcome never depends on partition stepping order or thread
/// interleaving: halo pushes and replies land at the step drain, migrants
/// and requests at the resolve drain, always one full phase after they were
/// sent.
#[derive(Copy, Clone, PartialEq, Eq)]
enum DrainPhase {
    Step,
    Resolve,
}

impl<B: AgentBehavior> PartitionSim<B> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        pid: Pid,
        config: SimConfig,
        partition: Arc<PartitionTree>,
        processor: RemoteProcessor,
        behavior: Arc<B>,
        directory: Directory,
        inbox: Inbox,
    ) -> Self {
        Self {
            pid,
            config,
            partition,
            processor,
            behavior,
            directory,
            inbox,
            wake_queue: WakeQueue::new(),
            promises: PromiseTable::new(),
            held: Vec::new(),
            next_serial: 0,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The lockable inspector handle for this partition.
    pub fn processor(&self) -> &RemoteProcessor {
        &self.processor
    }

    /// Outstanding remote requests issued by this partition.
    pub fn pending_promises(&self) -> usize {
        self.promises.len()
    }

    /// Insert a new agent at a local point, allocating its id.
    pub fn spawn(
        &mut self,
        point: Int2D,
        kind: AgentKind,
        payload: Vec<u8>,
        wake_at: Option<Tick>,
    ) -> SimResult<AgentId> {
        let id = AgentId::compose(self.pid, self.next_serial);
        self.next_serial += 1;
        let processor = self.processor.clone();
        let mut state = processor.lock();
        state.field.add(point, Entity::new(id, kind, payload))?;
        if let Some(wake) = wake_at {
            self.wake_queue.push(wake, id);
        }
        Ok(id)
    }

    // ── Phase 1: step ─────────────────────────────────────────────────────

    pub fn step(&mut self, now: Tick) -> SimResult<StepReport> {
        let processor = self.processor.clone();
        let mut state = processor.lock();

        self.drain_inbox(&mut state, now, DrainPhase::Step)?;
        self.promises.evict_expired(now);

        let woken = self.wake_queue.drain_tick(now).unwrap_or_default();
        let woken_count = woken.len();

        // Intent phase: read-only over the field, ascending AgentId (the
        // drain is sorted).  Each agent's rng is derived fresh from
        // (seed, agent, tick) so results don't depend on ownership history.
        let mut all_intents = Vec::with_capacity(woken.len());
        for agent in woken {
            // The wake may be stale: the agent migrated away or was removed
            // remotely since it was scheduled.
            if !state.field.owns(agent) {
                continue;
            }
            let ctx = StepContext::new(now, self.pid, &state.field);
            let mut rng = AgentRng::at_tick(self.config.seed, agent, now);
            let intents = self.behavior.step(agent, &ctx, &mut rng);
            all_intents.push((agent, intents));
        }

        // Apply phase: sequential writes in the same ascending order.
        let mut outgoing_wakes: FxHashMap<AgentId, Tick> = FxHashMap::default();
        for (agent, intents) in all_intents {
            self.apply_intents(&mut state, agent, intents, now, &mut outgoing_wakes);
        }

        // Ship this tick's boundary crossers.  Pending wakes travel with
        // the migrant; the origin forgets the agent entirely.
        let migrants = state.field.take_migrants();
        let mut migrations = Vec::with_capacity(migrants.len());
        for migrant in migrants {
            let (id, dest) = (migrant.entity.id, migrant.dest);
            let wake_at = outgoing_wakes.remove(&id);
            self.send_to(dest, Envelope::Migrate { from: self.pid, migrant, wake_at })?;
            migrations.push((id, dest));
        }

        let resident = state.field.local_storage().entity_count();
        state.record_stat(move || format!("woke {woken_count}, {resident} resident"));

        Ok(StepReport { woken: woken_count, migrations })
    }

    // ── Phase 2: resolve ──────────────────────────────────────────────────

    /// Drain messages produced by this tick's step phase: inbound migrants
    /// become locally owned, requests are served and replied to.
    pub fn resolve(&mut self, now: Tick) -> SimResult<()> {
        let processor = self.processor.clone();
        let mut state = processor.lock();
        self.drain_inbox(&mut state, now, DrainPhase::Resolve)
    }

    // ── Phase 3: publish ──────────────────────────────────────────────────

    /// Snapshot the boundary strip each neighbor mirrors and push it.
    pub fn publish_halo(&mut self) -> SimResult<()> {
        let neighbors = self.partition.neighbors_of(self.pid)?.to_vec();
        let processor = self.processor.clone();
        let state = processor.lock();
        for neighbor in neighbors {
            let snapshot = state.field.outgoing_halo(neighbor)?;
            self.send_to(neighbor, Envelope::HaloPush { from: self.pid, snapshot })?;
        }
        Ok(())
    }

    /// Advance this partition's clock and step counter (driver-called, once
    /// per tick, after all three phases).
    pub fn advance(&mut self) {
        let mut state = self.processor.lock();
        state.clock.advance();
        state.steps += 1;
    }

    // ── Inbox processing ──────────────────────────────────────────────────

    fn drain_inbox(
        &mut self,
        state: &mut ProcessorState,
        now: Tick,
        phase: DrainPhase,
    ) -> SimResult<()> {
        // Held envelopes go first so per-sender FIFO survives the handoff
        // between phases.
        let mut envelopes = std::mem::take(&mut self.held);
        envelopes.extend(self.inbox.drain()?);
        // Stable sort by sender pid: per-sender order is preserved, and the
        // application order no longer depends on thread interleaving when
        // the step phase ran in parallel.
        envelopes.sort_by_key(|env| match env {
            Envelope::Request { from, .. }
            | Envelope::HaloPush { from, .. }
            | Envelope::Migrate { from, .. } => from.0,
            // Replies settle disjoint promises; order is immaterial.
            Envelope::Reply { .. } => u16::MAX,
        });

        for envelope in envelopes {
            match (phase, envelope) {
                // Halo pushes are only ever sent at publish, after every
                // partition finished the tick, so applying on sight is safe.
                (_, Envelope::HaloPush { from, snapshot }) => {
                    state.field.apply_halo(from, snapshot);
                }
                (DrainPhase::Step, Envelope::Reply { promise, outcome }) => {
                    self.promises.fulfill(promise, outcome);
                }
                // A reply seen at resolve was produced earlier in this same
                // phase; settling it now would make readiness depend on pid
                // order.  It settles at the next step drain instead.
                (DrainPhase::Resolve, envelope @ Envelope::Reply { .. }) => {
                    self.held.push(envelope);
                }
                // Migrants and requests sent during this tick's step phase
                // are resolved after every partition stepped, against the
                // field state all partitions agree on.
                (
                    DrainPhase::Step,
                    envelope @ (Envelope::Migrate { .. } | Envelope::Request { .. }),
                ) => {
                    self.held.push(envelope);
                }
                (DrainPhase::Resolve, Envelope::Migrate { from, migrant, wake_at }) => {
                    // Ownership mismatch here means the sender's partition
                    // map disagrees with ours: not recoverable locally.
                    let agent = state.field.accept_migrant(migrant)?;
                    debug!(pid = self.pid.0, from = from.0, agent = %agent, "accepted migrant");
                    if let Some(wake) = wake_at {
                        // A wake that lapsed in transit fires next tick
                        // instead of being lost.
                        let wake = if wake > now { wake } else { now.offset(1) };
                        self.wake_queue.push(wake, agent);
                    }
                }
                (DrainPhase::Resolve, Envelope::Request { from, promise, request }) => {
                    let outcome = self.serve_request(state, now, request);
                    match (promise, outcome) {
                        (Some(id), outcome) => {
                            self.send_to(from, Envelope::Reply { promise: id, outcome })?;
                        }
                        (None, Err(fault)) => {
                            warn!(pid = self.pid.0, from = from.0, %fault,
                                "fire-and-forget request failed");
                        }
                        (None, Ok(_)) => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Serve one request against the local slice.  Faults are returned
    /// in-band; a request for a point this partition does not own is
    /// answered `NotLocal`, never with wrong-partition data.
    fn serve_request(
        &mut self,
        state: &mut ProcessorState,
        now: Tick,
        request: Request,
    ) -> RemoteOutcome {
        match request {
            Request::Get { point } => {
                let p = self.require_local(state, point)?;
                let entities = state
                    .field
                    .get(p)
                    .map_err(|_| RemoteFault::NotLocal { pid: self.pid, point: p })?
                    .to_vec();
                Ok(PromiseValue::Entities(entities))
            }
            Request::Add { point, entity, wake_at } => {
                let p = self.require_local(state, point)?;
                let id = entity.id;
                state
                    .field
                    .add(p, entity)
                    .map_err(|_| RemoteFault::NotLocal { pid: self.pid, point: p })?;
                if let Some(wake) = wake_at {
                    let wake = if wake > now { wake } else { now.offset(1) };
                    self.wake_queue.push(wake, id);
                }
                Ok(PromiseValue::Int(1))
            }
            Request::Remove { point, id } => {
                // The point validates routing; removal itself is by id.
                self.require_local(state, point)?;
                let removed = state.field.owns(id) && state.field.remove(id).is_ok();
                if removed {
                    self.wake_queue.forget(id);
                }
                Ok(PromiseValue::Int(removed as i64))
            }
            Request::RemoveAll { point } => {
                let p = self.require_local(state, point)?;
                let removed = state
                    .field
                    .remove_all_at(p)
                    .map_err(|_| RemoteFault::NotLocal { pid: self.pid, point: p })?;
                for entity in &removed {
                    self.wake_queue.forget(entity.id);
                }
                Ok(PromiseValue::Int(removed.len() as i64))
            }
        }
    }

    fn require_local(&self, state: &ProcessorState, point: Int2D) -> Result<Int2D, RemoteFault> {
        let p = state
            .field
            .partition()
            .world()
            .wrap(point)
            .map_err(|_| RemoteFault::OutOfWorld { point })?;
        if state.field.is_local(p) {
            Ok(p)
        } else {
            Err(RemoteFault::NotLocal { pid: self.pid, point: p })
        }
    }

    // ── Intent application ────────────────────────────────────────────────

    fn apply_intents(
        &mut self,
        state: &mut ProcessorState,
        agent: AgentId,
        intents: Vec<Intent>,
        now: Tick,
        outgoing_wakes: &mut FxHashMap<AgentId, Tick>,
    ) {
        let mut migrated = false;
        for intent in intents {
            match intent {
                Intent::MoveTo(p) => {
                    if migrated {
                        warn!(pid = self.pid.0, agent = %agent, "move after migration ignored");
                        continue;
                    }
                    match state.field.move_object(agent, p) {
                        Ok(MoveOutcome::Local) => {}
                        Ok(MoveOutcome::Migrated(_dest)) => {
                            migrated = true;
                            // Wakes queued before the move — earlier in this
                            // intent list or on a previous tick — travel with
                            // the migrant instead of being lost.
                            if let Some(pending) = self.wake_queue.forget(agent) {
                                outgoing_wakes.insert(agent, pending);
                            }
                        }
                        // Failed moves are non-fatal: the agent stays put.
                        Err(e) => {
                            warn!(pid = self.pid.0, agent = %agent, %p, error = %e, "move failed");
                        }
                    }
                }
                Intent::WakeAt(tick) => {
                    // Stale wakes are dropped so a badly-written behavior
                    // cannot spin the loop.
                    if tick <= now {
                        continue;
                    }
                    if migrated {
                        // The envelope carries one wake; keep the earliest.
                        outgoing_wakes
                            .entry(agent)
                            .and_modify(|t| *t = (*t).min(tick))
                            .or_insert(tick);
                    } else {
                        self.wake_queue.push(tick, agent);
                    }
                }
                Intent::SetPayload(payload) => {
                    if migrated {
                        warn!(pid = self.pid.0, agent = %agent,
                            "payload update after migration dropped; update state before moving");
                        continue;
                    }
                    if let Err(e) = state.field.set_payload(agent, payload) {
                        warn!(pid = self.pid.0, agent = %agent, error = %e, "payload update failed");
                    }
                }
                Intent::RemoteGet { pid, point, promise } => {
                    self.issue_request(state, now, pid, Request::Get { point }, Some(promise));
                }
                Intent::RemoteAdd { pid, point, entity, wake_at } => {
                    self.issue_request(state, now, pid, Request::Add { point, entity, wake_at }, None);
                }
                Intent::RemoteRemove { pid, point, id } => {
                    self.issue_request(state, now, pid, Request::Remove { point, id }, None);
                }
                Intent::RemoteRemoveAll { pid, point, promise } => {
                    self.issue_request(state, now, pid, Request::RemoveAll { point }, Some(promise));
                }
            }
        }
    }

    /// Route a remote request: served synchronously when self-addressed,
    /// otherwise registered and sent.  A destination with no directory
    /// binding settles the promise with `Unreachable` immediately — an
    /// unreachable partition must never leave a promise hanging.
    fn issue_request(
        &mut self,
        state: &mut ProcessorState,
        now: Tick,
        pid: Pid,
        request: Request,
        promise: Option<Promise<RemoteOutcome>>,
    ) {
        if pid == self.pid {
            let outcome = self.serve_request(state, now, request);
            match (promise, outcome) {
                (Some(p), outcome) => {
                    if p.fulfill(outcome).is_err() {
                        warn!(pid = self.pid.0, "local request promise already fulfilled");
                    }
                }
                (None, Err(fault)) => {
                    warn!(pid = self.pid.0, %fault, "local fire-and-forget request failed");
                }
                (None, Ok(_)) => {}
            }
            return;
        }

        let endpoint = match self.directory.lookup(&processor_name(pid)) {
            Ok(endpoint) => endpoint,
            Err(_) => {
                warn!(pid = self.pid.0, dest = pid.0, "request to unbound processor");
                if let Some(p) = promise {
                    let _ = p.fulfill(Err(RemoteFault::Unreachable { pid }));
                }
                return;
            }
        };

        let promise_id =
            promise.map(|p| self.promises.register(p, now, self.config.promise_ttl_ticks));
        let envelope = Envelope::Request { from: self.pid, promise: promise_id, request };
        if let Err(e) = endpoint.send(envelope) {
            warn!(pid = self.pid.0, dest = pid.0, error = %e, "request send failed");
            if let Some(id) = promise_id {
                self.promises.fulfill(id, Err(RemoteFault::Unreachable { pid }));
            }
        }
    }

    /// Send an envelope to another partition.  Used for migrants, halo
    /// pushes, and replies, where an unreachable destination is a cluster
    /// integrity failure rather than an application fault.
    fn send_to(&self, dest: Pid, envelope: Envelope) -> SimResult<()> {
        let endpoint = self.directory.lookup(&processor_name(dest))?;
        endpoint.send(envelope)?;
        Ok(())
    }
}
