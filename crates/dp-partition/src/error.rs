//! Partition-layer errors.

use dp_core::{DpError, Int2D, Pid};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    /// A point query outside a bounded world.  Callers must treat this as a
    /// usage error, not as "legitimately empty space".
    #[error("point {0} is outside the world")]
    OutOfWorld(Int2D),

    /// A pid that is not part of this tiling.
    #[error("unknown partition {0}")]
    UnknownPid(Pid),

    /// The world cannot be split into the requested number of partitions.
    #[error("cannot build a partition tree: {0}")]
    BadTiling(String),

    /// A neighborhood query that no tree level — including the root — can
    /// satisfy.  Fatal to the query; never answered with a partial set.
    #[error("no neighborhood of {pid} covers {missing:?} at any tree level")]
    MalformedTopology { pid: Pid, missing: Vec<Pid> },
}

impl From<DpError> for PartitionError {
    fn from(e: DpError) -> Self {
        match e {
            DpError::OutOfWorld { point, .. } => PartitionError::OutOfWorld(point),
            DpError::Config(msg) => PartitionError::BadTiling(msg),
        }
    }
}

pub type PartitionResult<T> = Result<T, PartitionError>;
