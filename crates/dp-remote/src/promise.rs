//! One-shot asynchronously-fulfilled result cells.
//!
//! A [`Promise`] is a tagged state machine, `Pending → Ready(value)`, with no
//! other transitions.  The value is stored in an atomically-published
//! `OnceLock`, so:
//!
//! - reading before fulfillment is unrepresentable — [`Promise::poll`]
//!   returns `PromiseState::Pending` and there is no other accessor;
//! - once `Ready`, every subsequent poll observes the same value (the
//!   monotonicity the protocol requires);
//! - a second `fulfill` fails instead of overwriting.

use std::sync::{Arc, OnceLock};

use crate::error::{RemoteError, RemoteResult};

// ── Promise ───────────────────────────────────────────────────────────────────

/// Poll result: either nothing yet, or a shared reference to the settled
/// value.
#[derive(Debug)]
pub enum PromiseState<'a, T> {
    Pending,
    Ready(&'a T),
}

/// A one-shot future value.  Clones share the same cell: the requester keeps
/// one clone, the fulfilling side (promise table / transport) another.
#[derive(Debug)]
pub struct Promise<T> {
    cell: Arc<OnceLock<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self { cell: Arc::clone(&self.cell) }
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Promise<T> {
    pub fn new() -> Self {
        Self { cell: Arc::new(OnceLock::new()) }
    }

    /// Settle the promise.  Exactly one fulfillment may ever succeed.
    pub fn fulfill(&self, value: T) -> RemoteResult<()> {
        self.cell.set(value).map_err(|_| RemoteError::AlreadyFulfilled)
    }

    /// Current state.  Side-effect-free and idempotent: once this returns
    /// `Ready`, it returns `Ready` with the same value forever.
    #[inline]
    pub fn poll(&self) -> PromiseState<'_, T> {
        match self.cell.get() {
            Some(v) => PromiseState::Ready(v),
            None => PromiseState::Pending,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }
}

// ── PromiseValue ──────────────────────────────────────────────────────────────

/// The serializable payload a remote reply carries.
///
/// Typed accessors return [`RemoteError::TypeMismatch`] on a wrong-variant
/// read, so a requester that asked for entities can never silently interpret
/// an integer reply.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum PromiseValue {
    Int(i64),
    Real(f64),
    Bytes(Vec<u8>),
    Entities(Vec<dp_field::Entity>),
}

impl PromiseValue {
    fn kind(&self) -> &'static str {
        match self {
            PromiseValue::Int(_) => "int",
            PromiseValue::Real(_) => "real",
            PromiseValue::Bytes(_) => "bytes",
            PromiseValue::Entities(_) => "entities",
        }
    }

    pub fn as_int(&self) -> RemoteResult<i64> {
        match self {
            PromiseValue::Int(v) => Ok(*v),
            other => Err(RemoteError::TypeMismatch { wanted: "int", got: other.kind() }),
        }
    }

    pub fn as_real(&self) -> RemoteResult<f64> {
        match self {
            PromiseValue::Real(v) => Ok(*v),
            other => Err(RemoteError::TypeMismatch { wanted: "real", got: other.kind() }),
        }
    }

    pub fn as_bytes(&self) -> RemoteResult<&[u8]> {
        match self {
            PromiseValue::Bytes(v) => Ok(v),
            other => Err(RemoteError::TypeMismatch { wanted: "bytes", got: other.kind() }),
        }
    }

    pub fn as_entities(&self) -> RemoteResult<&[dp_field::Entity]> {
        match self {
            PromiseValue::Entities(v) => Ok(v),
            other => Err(RemoteError::TypeMismatch { wanted: "entities", got: other.kind() }),
        }
    }
}
