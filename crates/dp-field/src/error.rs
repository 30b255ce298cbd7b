//! Field-layer errors.

use dp_core::{AgentId, Int2D, Pid};
use dp_partition::PartitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldError {
    /// A point query outside both the local slice and the halo coverage —
    /// the caller asked about a region this partition knows nothing about.
    /// Never answered with "empty"; the region may well hold entities.
    #[error("partition {pid} has no knowledge of point {point}")]
    OutOfRegion { pid: Pid, point: Int2D },

    /// A mutation aimed at a halo-region point.  Mirrors are never
    /// authoritative; route the write to the owning partition instead.
    #[error("partition {pid} cannot write halo point {point} (mirror, not owner)")]
    HaloWrite { pid: Pid, point: Int2D },

    /// An agent id this partition does not currently own.
    #[error("agent {0} is not owned by this partition")]
    UnknownAgent(AgentId),

    #[error(transparent)]
    Partition(#[from] PartitionError),
}

pub type FieldResult<T> = Result<T, FieldError>;
