//! `dp-field` — per-partition entity storage with a mirrored halo margin.
//!
//! Each partition owns a [`HaloField`]: authoritative storage for its own
//! slice of the world plus a read-only mirror of the boundary strips of every
//! neighboring slice (the "halo", refreshed wholesale once per step).
//!
//! # Ownership model
//!
//! | Region                    | Data                | Writes               |
//! |---------------------------|---------------------|----------------------|
//! | local slice               | authoritative, live | allowed              |
//! | halo (neighbor mirrors)   | one step stale      | rejected (`HaloWrite`) |
//! | anywhere else             | unknown             | rejected (`OutOfRegion`) |
//!
//! An entity has exactly one owning partition at any time.  A move that
//! leaves the local slice removes the entity here and queues it as a
//! [`Migrant`]; the transport layer delivers it to the owner returned by
//! `PartitionTree::owner_of`.

pub mod entity;
pub mod error;
pub mod halo;
pub mod storage;

#[cfg(test)]
mod tests;

pub use entity::{Entity, Migrant, RegionSnapshot};
pub use error::{FieldError, FieldResult};
pub use halo::{HaloField, MoveOutcome};
pub use storage::GridStorage;
