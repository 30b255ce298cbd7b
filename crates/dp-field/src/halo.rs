//! `HaloField` — one partition's authoritative slice plus its neighbor
//! mirrors, with migration bookkeeping.

use std::sync::Arc;

use dp_core::{AgentId, Int2D, IntRect, Pid};
use dp_partition::PartitionTree;
use tracing::trace;

use crate::entity::{Entity, Migrant, RegionSnapshot};
use crate::error::{FieldError, FieldResult};
use crate::storage::GridStorage;

/// Result of [`HaloField::move_object`].
#[derive(Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The destination is inside the local slice; the entity moved in place.
    Local,
    /// The destination belongs to another partition; the entity was removed
    /// here and queued for migration to `Pid`.
    Migrated(Pid),
}

/// Per-partition field: local authoritative storage, halo mirrors, and the
/// outbound migration buffer.
pub struct HaloField {
    pid: Pid,
    partition: Arc<PartitionTree>,
    local_bounds: IntRect,
    /// Authoritative entities inside `local_bounds`.
    local: GridStorage,
    /// Read-only mirrors of neighbor boundary strips, overwritten wholesale
    /// each step.  Covers the halo pieces (which include the local slice;
    /// lookups check `local` first, so mirrored cells are only consulted for
    /// non-local points).
    mirrors: GridStorage,
    /// Entities that crossed the slice boundary this step, awaiting pickup
    /// by the transport layer.
    outbound: Vec<Migrant>,
}

impl HaloField {
    pub fn new(partition: Arc<PartitionTree>, pid: Pid) -> FieldResult<Self> {
        let local_bounds = partition.local_bounds_of(pid)?;
        let halo_cover = partition.halo_bounds_of(pid)?.to_vec();
        Ok(Self {
            pid,
            local_bounds,
            local: GridStorage::new(vec![local_bounds]),
            mirrors: GridStorage::new(halo_cover),
            partition,
            outbound: Vec::new(),
        })
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn partition(&self) -> &Arc<PartitionTree> {
        &self.partition
    }

    /// This partition's authoritative slice.
    #[inline]
    pub fn local_bounds(&self) -> IntRect {
        self.local_bounds
    }

    /// Total known region (local slice expanded by AOI, in-world).
    #[inline]
    pub fn storage_bounds(&self) -> &[IntRect] {
        self.mirrors.covered()
    }

    /// Read access to the authoritative storage (for inspectors).
    #[inline]
    pub fn local_storage(&self) -> &GridStorage {
        &self.local
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Entities at `p`.
    ///
    /// Local points return live authoritative entities; halo points return
    /// the most recent mirror (one step stale by design).  Points outside
    /// both regions fail with [`FieldError::OutOfRegion`].
    pub fn get(&self, p: Int2D) -> FieldResult<&[Entity]> {
        let p = self.wrap(p)?;
        if self.local_bounds.contains(p) {
            Ok(self.local.get(p))
        } else if self.mirrors.covers(p) {
            Ok(self.mirrors.get(p))
        } else {
            Err(FieldError::OutOfRegion { pid: self.pid, point: p })
        }
    }

    /// `true` when `p` is inside the local slice (after wrapping).
    pub fn is_local(&self, p: Int2D) -> bool {
        self.wrap(p).map(|p| self.local_bounds.contains(p)).unwrap_or(false)
    }

    /// Current cell of a locally-owned agent.
    pub fn location_of(&self, id: AgentId) -> FieldResult<Int2D> {
        self.local.location_of(id).ok_or(FieldError::UnknownAgent(id))
    }

    #[inline]
    pub fn owns(&self, id: AgentId) -> bool {
        self.local.contains_agent(id)
    }

    /// A locally-owned entity by id.
    pub fn entity(&self, id: AgentId) -> FieldResult<&Entity> {
        self.local.entity(id).ok_or(FieldError::UnknownAgent(id))
    }

    /// All entities within Chebyshev distance `radius` of `center`, drawn
    /// from local *and* halo data.  The halo contribution is capped at the
    /// AOI: asking for a radius beyond it would silently miss entities, so
    /// that is an addressing error.
    pub fn objects_within_distance(
        &self,
        center: Int2D,
        radius: i32,
    ) -> FieldResult<Vec<(Int2D, &Entity)>> {
        if radius > self.partition.aoi() {
            return Err(FieldError::OutOfRegion {
                pid: self.pid,
                point: center.offset(radius, 0),
            });
        }
        let center = self.wrap(center)?;
        let mut out = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let Ok(p) = self.wrap(center.offset(dx, dy)) else { continue };
                let cell = if self.local_bounds.contains(p) {
                    self.local.get(p)
                } else if self.mirrors.covers(p) {
                    self.mirrors.get(p)
                } else {
                    continue; // beyond the known region at a world edge
                };
                out.extend(cell.iter().map(|e| (p, e)));
            }
        }
        Ok(out)
    }

    // ── Writes (local slice only) ─────────────────────────────────────────

    /// Insert a new entity at `p`.  Rejects halo points (`HaloWrite`) and
    /// unknown regions (`OutOfRegion`): mirrors are never written directly.
    pub fn add(&mut self, p: Int2D, entity: Entity) -> FieldResult<()> {
        let p = self.wrap(p)?;
        self.require_local(p)?;
        self.local.insert(p, entity);
        Ok(())
    }

    /// Remove a locally-owned entity.
    pub fn remove(&mut self, id: AgentId) -> FieldResult<Entity> {
        self.local
            .remove(id)
            .map(|(_, e)| e)
            .ok_or(FieldError::UnknownAgent(id))
    }

    /// Remove every entity at a local point, returning them.
    pub fn remove_all_at(&mut self, p: Int2D) -> FieldResult<Vec<Entity>> {
        let p = self.wrap(p)?;
        self.require_local(p)?;
        Ok(self.local.remove_all_at(p))
    }

    /// Replace the payload of a locally-owned entity.
    pub fn set_payload(&mut self, id: AgentId, payload: Vec<u8>) -> FieldResult<()> {
        if self.local.set_payload(id, payload) {
            Ok(())
        } else {
            Err(FieldError::UnknownAgent(id))
        }
    }

    /// Move a locally-owned entity to `p`.
    ///
    /// A destination inside the local slice is applied immediately.  A
    /// destination owned by another partition removes the entity and queues
    /// it in the outbound migration buffer — exactly one partition owns it
    /// at every instant (it is either resident here or in flight, never
    /// both).
    pub fn move_object(&mut self, id: AgentId, p: Int2D) -> FieldResult<MoveOutcome> {
        let p = self.wrap(p)?;
        if self.local_bounds.contains(p) {
            let (_, entity) = self.local.remove(id).ok_or(FieldError::UnknownAgent(id))?;
            self.local.insert(p, entity);
            return Ok(MoveOutcome::Local);
        }
        // Resolve the destination before touching storage: any failure from
        // here on leaves the entity exactly where it was.
        let dest = self.partition.owner_of(p)?;
        let (_, entity) = self.local.remove(id).ok_or(FieldError::UnknownAgent(id))?;
        trace!(pid = self.pid.0, agent = %id, %p, dest = dest.0, "queueing migration");
        self.outbound.push(Migrant { dest, point: p, entity });
        Ok(MoveOutcome::Migrated(dest))
    }

    // ── Migration and halo plumbing (transport-facing) ────────────────────

    /// Drain the outbound migration buffer.
    pub fn take_migrants(&mut self) -> Vec<Migrant> {
        std::mem::take(&mut self.outbound)
    }

    /// Install an inbound migrant.  Its position must be local — the sender
    /// computed ownership via the shared partition map, so a mismatch means
    /// the maps disagree and must be surfaced.
    pub fn accept_migrant(&mut self, m: Migrant) -> FieldResult<AgentId> {
        self.require_local(m.point)?;
        let id = m.entity.id;
        self.local.insert(m.point, m.entity);
        Ok(id)
    }

    /// Snapshot the part of the local slice that `neighbor` mirrors.
    pub fn outgoing_halo(&self, neighbor: Pid) -> FieldResult<RegionSnapshot> {
        let region = self.partition.halo_overlap(neighbor, self.pid)?;
        Ok(self.local.snapshot_region(&region))
    }

    /// Overwrite one neighbor's mirrored region wholesale with its latest
    /// snapshot.  Mirror state is replaced, never merged.
    pub fn apply_halo(&mut self, from: Pid, snap: RegionSnapshot) {
        trace!(
            pid = self.pid.0,
            from = from.0,
            entities = snap.entity_count(),
            "applying halo snapshot"
        );
        self.mirrors.apply_snapshot(snap);
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn wrap(&self, p: Int2D) -> FieldResult<Int2D> {
        self.partition
            .world()
            .wrap(p)
            .map_err(|_| FieldError::OutOfRegion { pid: self.pid, point: p })
    }

    fn require_local(&self, p: Int2D) -> FieldResult<()> {
        if self.local_bounds.contains(p) {
            Ok(())
        } else if self.mirrors.covers(p) {
            Err(FieldError::HaloWrite { pid: self.pid, point: p })
        } else {
            Err(FieldError::OutOfRegion { pid: self.pid, point: p })
        }
    }
}
