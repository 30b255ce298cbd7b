//! Wire types exchanged between processors.
//!
//! Everything that crosses a processor boundary is one of these enums, and
//! every variant is serde-serializable: the mailbox transport bincode-encodes
//! envelopes even between in-process processors, so an unserializable payload
//! fails loudly instead of working until the first real network deployment.

use dp_core::{AgentId, Int2D, Pid, PromiseId, Tick};
use dp_field::{Entity, Migrant, RegionSnapshot};

use crate::promise::PromiseValue;

/// A field operation requested of the owning processor.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Request {
    /// Read the entities at a point.  Replied to with
    /// [`PromiseValue::Entities`].
    Get { point: Int2D },
    /// Insert an entity at a point, optionally scheduling its first wake.
    Add { point: Int2D, entity: Entity, wake_at: Option<Tick> },
    /// Remove one entity at a point.
    Remove { point: Int2D, id: AgentId },
    /// Clear a point.  Replied to with [`PromiseValue::Int`] (removed count).
    RemoveAll { point: Int2D },
}

/// Why a remote operation could not produce a value.
///
/// Faults travel in-band as the `Err` arm of a reply, so the requester's
/// promise settles exactly once whether the remote operation succeeded or not.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum RemoteFault {
    /// The addressed processor does not own the point (stale routing).
    #[error("point {point} is not local to {pid}")]
    NotLocal { pid: Pid, point: Int2D },
    /// No processor is bound under the addressed name.
    #[error("processor {pid} is unreachable")]
    Unreachable { pid: Pid },
    /// The point is outside the world bounds.
    #[error("point {point} is outside the world")]
    OutOfWorld { point: Int2D },
}

/// What a reply fulfills a promise with.
pub type RemoteOutcome = Result<PromiseValue, RemoteFault>;

/// A message in a processor's inbox.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Envelope {
    /// A field operation.  `promise` names the requester-side promise the
    /// eventual [`Envelope::Reply`] settles; fire-and-forget requests carry
    /// `None`.
    Request { from: Pid, promise: Option<PromiseId>, request: Request },
    /// The outcome of an earlier request, routed back to the requester.
    Reply { promise: PromiseId, outcome: RemoteOutcome },
    /// A wholesale halo snapshot from a neighboring processor.
    HaloPush { from: Pid, snapshot: RegionSnapshot },
    /// An agent crossing a partition boundary.
    Migrate { from: Pid, migrant: Migrant, wake_at: Option<Tick> },
}
