//! Remote-layer errors.
//!
//! Local faults (bad name, codec failure, promise misuse) are `RemoteError`;
//! faults that must travel back across the wire to a requester are the
//! serializable [`crate::wire::RemoteFault`] instead.

use dp_core::Pid;
use dp_field::FieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// `bind` on a name that is already registered.
    #[error("name {0:?} is already bound")]
    AlreadyBound(String),

    /// `lookup`/`unbind` on a name with no binding.
    #[error("name {0:?} is not bound")]
    Unbound(String),

    /// The endpoint exists but its owner has shut down.  No automatic retry:
    /// policy belongs to the calling layer.
    #[error("partition {pid} is unreachable")]
    Unreachable { pid: Pid },

    /// A promise can transition pending → fulfilled exactly once.
    #[error("promise was already fulfilled")]
    AlreadyFulfilled,

    /// A typed read of a `PromiseValue` holding a different variant.
    #[error("promise value is {got}, not {wanted}")]
    TypeMismatch { wanted: &'static str, got: &'static str },

    /// Wire (de)serialization failure.
    #[error("wire codec error: {0}")]
    Codec(String),

    #[error(transparent)]
    Field(#[from] FieldError),
}

pub type RemoteResult<T> = Result<T, RemoteError>;
