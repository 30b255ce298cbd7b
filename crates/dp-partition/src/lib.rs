//! `dp-partition` — static spatial decomposition of the world across
//! partitions.
//!
//! A [`PartitionTree`] assigns every partition (pid) a disjoint rectangular
//! slice of the world; the union of all slices tiles the world exactly.  The
//! tree structure exists for neighborhood queries at varying locality
//! (`neighbors_at_level`, `minimal_neighborhood_containing`).
//!
//! The tree is built once at startup and is immutable for the run.  Share it
//! across components with an `Arc`; because there is only ever one map, no
//! process can observe a mixed old/new tiling.

pub mod error;
pub mod tree;


pub use error::{PartitionError, PartitionResult};
pub use tree::PartitionTree;
