//! The `AgentBehavior` trait — the extension point for user code.

use dp_core::{AgentId, AgentRng, Int2D, Pid, Tick};
use dp_field::{Entity, HaloField};
use dp_remote::{Promise, RemoteOutcome};

/// Read-only view of one partition's state passed to every behavior call.
///
/// Carries the stepping partition's identity explicitly: behaviors never
/// consult global state to learn where they are running, so the same
/// behavior value can serve every partition in a cluster.
pub struct StepContext<'a> {
    /// Current simulation tick.
    pub tick: Tick,

    /// The partition this agent is currently owned by.
    pub pid: Pid,

    /// The partition's field: authoritative local slice plus halo mirrors.
    /// Reads within the AOI of the agent's own position always succeed.
    pub field: &'a HaloField,
}

impl<'a> StepContext<'a> {
    #[inline]
    pub fn new(tick: Tick, pid: Pid, field: &'a HaloField) -> Self {
        Self { tick, pid, field }
    }

    /// The stepping agent's current cell.
    pub fn location_of(&self, agent: AgentId) -> Option<Int2D> {
        self.field.location_of(agent).ok()
    }

    /// Entities within Chebyshev distance `radius`, from local and halo data.
    /// Empty when the radius exceeds the AOI (the field rejects the query).
    pub fn neighbors(&self, center: Int2D, radius: i32) -> Vec<(Int2D, &'a Entity)> {
        self.field.objects_within_distance(center, radius).unwrap_or_default()
    }
}

/// An action an agent requests during its step.
///
/// Intents are produced by [`AgentBehavior::step`] and applied sequentially,
/// in ascending `AgentId` order, by the partition step loop.  Remote intents
/// are asynchronous: the step loop forwards them to the owning partition and
/// the agent observes the result by polling the promise it kept a clone of.
#[derive(Debug)]
pub enum Intent {
    /// Move to `Int2D` (wrapped in a toroidal world).  A destination outside
    /// the local slice migrates the agent to the owning partition.
    MoveTo(Int2D),

    /// Wake again at the given tick.  Wakes scheduled for the current tick
    /// or earlier are discarded.  Pending wakes travel with the agent when
    /// it migrates.
    WakeAt(Tick),

    /// Replace this agent's serialized state.
    SetPayload(Vec<u8>),

    /// Read the entities at a point owned by `pid`.  The promise settles
    /// with `PromiseValue::Entities` or an in-band fault.
    RemoteGet {
        pid: Pid,
        point: Int2D,
        promise: Promise<RemoteOutcome>,
    },

    /// Insert an entity on `pid`, optionally scheduling its first wake
    /// there.  Fire-and-forget: failures are logged by the serving side.
    RemoteAdd {
        pid: Pid,
        point: Int2D,
        entity: Entity,
        wake_at: Option<Tick>,
    },

    /// Remove one entity at a point owned by `pid`.  Fire-and-forget.
    RemoteRemove { pid: Pid, point: Int2D, id: AgentId },

    /// Clear a point owned by `pid`.  The promise settles with
    /// `PromiseValue::Int` (the number removed).
    RemoteRemoveAll {
        pid: Pid,
        point: Int2D,
        promise: Promise<RemoteOutcome>,
    },
}

/// Pluggable per-agent logic.
///
/// One value serves the whole cluster: the step loop may invoke it for
/// different partitions on different threads, so implementations must be
/// `Send + Sync` and keep per-agent state in entity payloads (or behind
/// their own synchronization), never in thread-local storage.
///
/// Determinism: the `rng` argument is freshly derived from
/// `(seed, agent, tick)` each call, so an agent draws the same values no
/// matter which partition owns it or which thread steps it.
pub trait AgentBehavior: Send + Sync + 'static {
    /// Called once per woken agent per tick.  Returns the agent's intents
    /// for this tick; an empty `Vec` means the agent sleeps until something
    /// wakes it again.
    fn step(&self, agent: AgentId, ctx: &StepContext<'_>, rng: &mut AgentRng) -> Vec<Intent>;
}
