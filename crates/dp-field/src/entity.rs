//! Wire-crossing entity types.

use dp_core::{AgentId, AgentKind, Int2D, IntRect, Pid};

/// One resident of the field: an agent or passive object.
///
/// The payload is opaque serialized application state (encoded/decoded by
/// the behavior layer), so the storage and transport layers can move
/// entities between partitions without knowing their concrete type.  `kind`
/// is the application-assigned category tag used for per-kind indexing.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Entity {
    pub id: AgentId,
    pub kind: AgentKind,
    pub payload: Vec<u8>,
}

impl Entity {
    pub fn new(id: AgentId, kind: AgentKind, payload: Vec<u8>) -> Self {
        Self { id, kind, payload }
    }
}

/// An entity in flight between partitions after crossing a slice boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Migrant {
    /// The partition that owns `point` (computed via `owner_of` when the
    /// move was applied).
    pub dest: Pid,
    /// The entity's new, already-wrapped position.
    pub point: Int2D,
    pub entity: Entity,
}

/// A wholesale copy of one region of a partition's authoritative storage,
/// pushed to a neighbor each step to refresh its halo mirror.
///
/// `rects` names the full region covered (so the receiver can clear cells
/// that became empty); `cells` holds only the non-empty cells.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RegionSnapshot {
    pub rects: Vec<IntRect>,
    pub cells: Vec<(Int2D, Vec<Entity>)>,
}

impl RegionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Total entity count across all cells.
    pub fn entity_count(&self) -> usize {
        self.cells.iter().map(|(_, v)| v.len()).sum()
    }
}
