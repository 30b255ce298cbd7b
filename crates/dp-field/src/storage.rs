//! `GridStorage` — cell-indexed entity container for one region of the world.
//!
//! Storage is a sparse hash map from lattice cell to resident entities, plus
//! two secondary indexes kept in lockstep:
//!
//! - `locations`: `AgentId → Int2D`, for O(1) remove/move by id;
//! - `kinds`: `AgentKind → ids`, the per-category index that replaces
//!   runtime type inspection when applications track heterogeneous agents.
//!
//! `FxHashMap` because cell keys are small integers and the per-step scan is
//! the hot path.

use dp_core::{AgentId, AgentKind, Int2D, IntRect};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::entity::{Entity, RegionSnapshot};

const NO_ENTITIES: &[Entity] = &[];

/// Sparse entity storage over a fixed set of covered rects.
#[derive(Debug, Default)]
pub struct GridStorage {
    covered: Vec<IntRect>,
    cells: FxHashMap<Int2D, Vec<Entity>>,
    locations: FxHashMap<AgentId, Int2D>,
    kinds: FxHashMap<AgentKind, FxHashSet<AgentId>>,
}

impl GridStorage {
    pub fn new(covered: Vec<IntRect>) -> Self {
        Self { covered, ..Default::default() }
    }

    /// The rects this storage is responsible for.
    #[inline]
    pub fn covered(&self) -> &[IntRect] {
        &self.covered
    }

    /// `true` if `p` falls inside any covered rect.
    #[inline]
    pub fn covers(&self, p: Int2D) -> bool {
        self.covered.iter().any(|r| r.contains(p))
    }

    /// Number of resident entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.locations.len()
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Entities at `p` (empty slice when the cell is vacant).  The caller is
    /// responsible for having checked coverage first.
    #[inline]
    pub fn get(&self, p: Int2D) -> &[Entity] {
        self.cells.get(&p).map(Vec::as_slice).unwrap_or(NO_ENTITIES)
    }

    /// Current cell of `id`, if resident.
    #[inline]
    pub fn location_of(&self, id: AgentId) -> Option<Int2D> {
        self.locations.get(&id).copied()
    }

    #[inline]
    pub fn contains_agent(&self, id: AgentId) -> bool {
        self.locations.contains_key(&id)
    }

    /// A resident entity by id.
    pub fn entity(&self, id: AgentId) -> Option<&Entity> {
        let p = self.location_of(id)?;
        self.cells.get(&p)?.iter().find(|e| e.id == id)
    }

    /// All resident ids of one kind, ascending (deterministic iteration).
    pub fn ids_of_kind(&self, kind: AgentKind) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self
            .kinds
            .get(&kind)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// All resident ids, ascending.
    pub fn all_ids(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self.locations.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Insert `entity` at `p`, displacing any previous residence of the same
    /// id.  Coverage is the caller's contract (checked by `HaloField`).
    pub fn insert(&mut self, p: Int2D, entity: Entity) {
        debug_assert!(self.covers(p), "insert at uncovered point {p}");
        if let Some(old) = self.locations.insert(entity.id, p) {
            Self::remove_from_cell(&mut self.cells, old, entity.id);
        }
        self.kinds.entry(entity.kind).or_default().insert(entity.id);
        self.cells.entry(p).or_default().push(entity);
    }

    /// Remove `id`, returning its cell and entity if it was resident.
    pub fn remove(&mut self, id: AgentId) -> Option<(Int2D, Entity)> {
        let p = self.locations.remove(&id)?;
        let entity = Self::remove_from_cell(&mut self.cells, p, id)?;
        if let Some(set) = self.kinds.get_mut(&entity.kind) {
            set.remove(&id);
        }
        Some((p, entity))
    }

    /// Remove every entity at `p`, returning them.
    pub fn remove_all_at(&mut self, p: Int2D) -> Vec<Entity> {
        let drained = self.cells.remove(&p).unwrap_or_default();
        for e in &drained {
            self.locations.remove(&e.id);
            if let Some(set) = self.kinds.get_mut(&e.kind) {
                set.remove(&e.id);
            }
        }
        drained
    }

    /// Replace the opaque payload of a resident entity.
    pub fn set_payload(&mut self, id: AgentId, payload: Vec<u8>) -> bool {
        let Some(p) = self.location_of(id) else { return false };
        let Some(cell) = self.cells.get_mut(&p) else { return false };
        match cell.iter_mut().find(|e| e.id == id) {
            Some(e) => {
                e.payload = payload;
                true
            }
            None => false,
        }
    }

    // ── Region operations (halo exchange) ─────────────────────────────────

    /// Copy every non-empty cell inside `rects` into a snapshot.
    pub fn snapshot_region(&self, rects: &[IntRect]) -> RegionSnapshot {
        let mut cells: Vec<(Int2D, Vec<Entity>)> = self
            .cells
            .iter()
            .filter(|(p, v)| !v.is_empty() && rects.iter().any(|r| r.contains(**p)))
            .map(|(p, v)| (*p, v.clone()))
            .collect();
        // Deterministic order so identical states produce identical bytes.
        cells.sort_unstable_by_key(|(p, _)| (p.y, p.x));
        RegionSnapshot { rects: rects.to_vec(), cells }
    }

    /// Drop every entity inside `rects`.
    pub fn clear_region(&mut self, rects: &[IntRect]) {
        let doomed: Vec<Int2D> = self
            .cells
            .keys()
            .filter(|p| rects.iter().any(|r| r.contains(**p)))
            .copied()
            .collect();
        for p in doomed {
            self.remove_all_at(p);
        }
    }

    /// Overwrite the snapshot's region wholesale: clear it, then install the
    /// snapshot's cells.  Never merges.
    pub fn apply_snapshot(&mut self, snap: RegionSnapshot) {
        self.clear_region(&snap.rects);
        for (p, entities) in snap.cells {
            for e in entities {
                self.insert(p, e);
            }
        }
    }

    fn remove_from_cell(
        cells: &mut FxHashMap<Int2D, Vec<Entity>>,
        p: Int2D,
        id: AgentId,
    ) -> Option<Entity> {
        let cell = cells.get_mut(&p)?;
        let at = cell.iter().position(|e| e.id == id)?;
        let entity = cell.swap_remove(at);
        if cell.is_empty() {
            cells.remove(&p);
        }
        Some(entity)
    }
}
