//! Framework error type.
//!
//! Sub-crates define their own error enums (`PartitionError`, `FieldError`,
//! `RemoteError`, `SimError`) and either convert `DpError` in via `From` or
//! wrap it as one variant.  Nearly every error in this framework arises at a
//! partition or process boundary; purely local mutations do not fail.

use thiserror::Error;

use crate::geo::{Int2D, IntRect};

/// The top-level error type for `dp-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum DpError {
    #[error("point {point} outside world bounds {world}")]
    OutOfWorld { point: Int2D, world: IntRect },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `dp-*` crates.
pub type DpResult<T> = Result<T, DpError>;
