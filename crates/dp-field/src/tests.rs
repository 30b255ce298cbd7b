//! Unit tests for grid storage and the halo field.

use std::sync::Arc;

use dp_core::{AgentId, AgentKind, Int2D, IntRect, Pid, WorldBounds};
use dp_partition::PartitionTree;

use crate::{Entity, FieldError, HaloField, MoveOutcome};

const WALKER: AgentKind = AgentKind(0);
const BEACON: AgentKind = AgentKind(1);

fn agent(pid: u16, serial: u64) -> AgentId {
    AgentId::compose(Pid(pid), serial)
}

fn entity(pid: u16, serial: u64, kind: AgentKind) -> Entity {
    Entity::new(agent(pid, serial), kind, vec![serial as u8])
}

/// Two slices of a bounded 200×200 world, AOI 1 (scenario-A geometry).
fn two_fields() -> (HaloField, HaloField) {
    let world = WorldBounds::new(IntRect::new(0, 0, 200, 200), false);
    let tree = Arc::new(PartitionTree::build(world, 2, 1).unwrap());
    (
        HaloField::new(Arc::clone(&tree), Pid(0)).unwrap(),
        HaloField::new(tree, Pid(1)).unwrap(),
    )
}

#[cfg(test)]
mod storage {
    use super::*;
    use crate::GridStorage;

    fn store() -> GridStorage {
        GridStorage::new(vec![IntRect::new(0, 0, 10, 10)])
    }

    #[test]
    fn insert_get_remove_roundtrip() {
        let mut s = store();
        let p = Int2D::new(3, 4);
        s.insert(p, entity(0, 1, WALKER));
        assert_eq!(s.get(p).len(), 1);
        assert_eq!(s.location_of(agent(0, 1)), Some(p));

        let (at, e) = s.remove(agent(0, 1)).unwrap();
        assert_eq!(at, p);
        assert_eq!(e.id, agent(0, 1));
        assert!(s.get(p).is_empty());
        assert_eq!(s.entity_count(), 0);
    }

    #[test]
    fn reinsert_displaces_previous_cell() {
        let mut s = store();
        s.insert(Int2D::new(1, 1), entity(0, 1, WALKER));
        s.insert(Int2D::new(2, 2), entity(0, 1, WALKER));
        assert!(s.get(Int2D::new(1, 1)).is_empty());
        assert_eq!(s.get(Int2D::new(2, 2)).len(), 1);
        assert_eq!(s.entity_count(), 1);
    }

    #[test]
    fn kind_index_tracks_inserts_and_removes() {
        let mut s = store();
        s.insert(Int2D::new(0, 0), entity(0, 1, WALKER));
        s.insert(Int2D::new(0, 1), entity(0, 2, BEACON));
        s.insert(Int2D::new(0, 2), entity(0, 3, WALKER));

        assert_eq!(s.ids_of_kind(WALKER), vec![agent(0, 1), agent(0, 3)]);
        assert_eq!(s.ids_of_kind(BEACON), vec![agent(0, 2)]);

        s.remove(agent(0, 1)).unwrap();
        assert_eq!(s.ids_of_kind(WALKER), vec![agent(0, 3)]);
        assert!(s.ids_of_kind(AgentKind(9)).is_empty());
    }

    #[test]
    fn snapshot_and_overwrite_never_merge() {
        let mut a = store();
        let mut b = store();
        let strip = [IntRect::new(0, 0, 10, 1)];

        // b holds stale data in the strip; a's snapshot replaces it wholesale.
        b.insert(Int2D::new(5, 0), entity(1, 9, WALKER));
        a.insert(Int2D::new(2, 0), entity(0, 1, WALKER));
        a.insert(Int2D::new(7, 0), entity(0, 2, WALKER));

        let snap = a.snapshot_region(&strip);
        assert_eq!(snap.entity_count(), 2);
        b.apply_snapshot(snap);

        assert!(b.get(Int2D::new(5, 0)).is_empty(), "stale cell must be cleared");
        assert_eq!(b.get(Int2D::new(2, 0)).len(), 1);
        assert_eq!(b.get(Int2D::new(7, 0)).len(), 1);
    }

    #[test]
    fn snapshot_cells_are_deterministically_ordered() {
        let mut s = store();
        s.insert(Int2D::new(9, 0), entity(0, 1, WALKER));
        s.insert(Int2D::new(0, 0), entity(0, 2, WALKER));
        s.insert(Int2D::new(4, 3), entity(0, 3, WALKER));
        let snap = s.snapshot_region(&[IntRect::new(0, 0, 10, 10)]);
        let points: Vec<Int2D> = snap.cells.iter().map(|(p, _)| *p).collect();
        assert_eq!(points, vec![Int2D::new(0, 0), Int2D::new(9, 0), Int2D::new(4, 3)]);
    }
}

#[cfg(test)]
mod halo_field {
    use super::*;

    #[test]
    fn local_reads_are_authoritative() {
        let (mut f0, _) = two_fields();
        f0.add(Int2D::new(50, 50), entity(0, 1, WALKER)).unwrap();
        let got = f0.get(Int2D::new(50, 50)).unwrap();
        assert_eq!(got.len(), 1);
        assert!(f0.owns(agent(0, 1)));
    }

    #[test]
    fn unknown_region_fails_loudly_not_empty() {
        let (f0, _) = two_fields();
        // x=150 is deep inside partition 1: outside p0's local and halo.
        match f0.get(Int2D::new(150, 50)) {
            Err(FieldError::OutOfRegion { pid, point }) => {
                assert_eq!(pid, Pid(0));
                assert_eq!(point, Int2D::new(150, 50));
            }
            other => panic!("expected OutOfRegion, got {other:?}"),
        }
    }

    #[test]
    fn halo_writes_rejected() {
        let (mut f0, _) = two_fields();
        // x=100 is p1's territory but inside p0's halo coverage.
        let err = f0.add(Int2D::new(100, 50), entity(0, 1, WALKER)).unwrap_err();
        assert!(matches!(err, FieldError::HaloWrite { .. }), "got {err:?}");
    }

    #[test]
    fn halo_read_sees_neighbor_snapshot() {
        let (mut f0, mut f1) = two_fields();
        f1.add(Int2D::new(100, 50), entity(1, 7, WALKER)).unwrap();

        // Before any exchange the mirror is empty (not an error: the point
        // is inside p0's known region).
        assert!(f0.get(Int2D::new(100, 50)).unwrap().is_empty());

        let snap = f1.outgoing_halo(Pid(0)).unwrap();
        f0.apply_halo(Pid(1), snap);
        let seen = f0.get(Int2D::new(100, 50)).unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, agent(1, 7));
    }

    #[test]
    fn halo_overwrite_is_wholesale() {
        let (mut f0, mut f1) = two_fields();
        f1.add(Int2D::new(100, 10), entity(1, 1, WALKER)).unwrap();
        f0.apply_halo(Pid(1), f1.outgoing_halo(Pid(0)).unwrap());
        assert_eq!(f0.get(Int2D::new(100, 10)).unwrap().len(), 1);

        // Neighbor's entity moves away; next snapshot must erase the mirror.
        f1.move_object(agent(1, 1), Int2D::new(150, 10)).unwrap();
        f0.apply_halo(Pid(1), f1.outgoing_halo(Pid(0)).unwrap());
        assert!(f0.get(Int2D::new(100, 10)).unwrap().is_empty());
    }

    #[test]
    fn move_within_slice_is_local() {
        let (mut f0, _) = two_fields();
        f0.add(Int2D::new(10, 10), entity(0, 1, WALKER)).unwrap();
        let out = f0.move_object(agent(0, 1), Int2D::new(20, 20)).unwrap();
        assert_eq!(out, MoveOutcome::Local);
        assert_eq!(f0.location_of(agent(0, 1)).unwrap(), Int2D::new(20, 20));
        assert!(f0.take_migrants().is_empty());
    }

    #[test]
    fn boundary_crossing_queues_a_migrant() {
        let (mut f0, mut f1) = two_fields();
        f0.add(Int2D::new(99, 100), entity(0, 1, WALKER)).unwrap();

        let out = f0.move_object(agent(0, 1), Int2D::new(101, 100)).unwrap();
        assert_eq!(out, MoveOutcome::Migrated(Pid(1)));
        assert!(!f0.owns(agent(0, 1)), "sender must relinquish ownership");

        let migrants = f0.take_migrants();
        assert_eq!(migrants.len(), 1);
        assert_eq!(migrants[0].dest, Pid(1));
        assert_eq!(migrants[0].point, Int2D::new(101, 100));

        let id = f1.accept_migrant(migrants.into_iter().next().unwrap()).unwrap();
        assert_eq!(id, agent(0, 1));
        assert!(f1.owns(agent(0, 1)));
        assert_eq!(f1.location_of(agent(0, 1)).unwrap(), Int2D::new(101, 100));
    }

    #[test]
    fn misrouted_migrant_rejected() {
        let (mut f0, mut f1) = two_fields();
        f0.add(Int2D::new(99, 100), entity(0, 1, WALKER)).unwrap();
        f0.move_object(agent(0, 1), Int2D::new(101, 100)).unwrap();
        let mut m = f0.take_migrants().remove(0);
        // Corrupt the destination point to somewhere p1 does not own.
        m.point = Int2D::new(5, 5);
        assert!(f1.accept_migrant(m).is_err());
    }

    #[test]
    fn within_distance_spans_local_and_halo() {
        let (mut f0, mut f1) = two_fields();
        f0.add(Int2D::new(99, 100), entity(0, 1, WALKER)).unwrap();
        f1.add(Int2D::new(100, 100), entity(1, 2, WALKER)).unwrap();
        f0.apply_halo(Pid(1), f1.outgoing_halo(Pid(0)).unwrap());

        let near = f0.objects_within_distance(Int2D::new(99, 100), 1).unwrap();
        let ids: Vec<AgentId> = near.iter().map(|(_, e)| e.id).collect();
        assert!(ids.contains(&agent(0, 1)));
        assert!(ids.contains(&agent(1, 2)), "halo mirror must be visible");
    }

    #[test]
    fn within_distance_beyond_aoi_is_an_addressing_error() {
        let (f0, _) = two_fields();
        assert!(f0.objects_within_distance(Int2D::new(50, 50), 2).is_err());
    }

    #[test]
    fn failed_move_leaves_the_entity_in_place() {
        let (mut f0, _) = two_fields();
        f0.add(Int2D::new(10, 10), entity(0, 1, WALKER)).unwrap();

        // Off the edge of a bounded world: the move fails, and the entity
        // stays owned at its old cell with nothing queued for migration.
        assert!(f0.move_object(agent(0, 1), Int2D::new(300, 10)).is_err());
        assert!(f0.owns(agent(0, 1)));
        assert_eq!(f0.location_of(agent(0, 1)).unwrap(), Int2D::new(10, 10));
        assert!(f0.take_migrants().is_empty());
    }

    #[test]
    fn toroidal_moves_wrap_before_ownership() {
        let world = WorldBounds::new(IntRect::new(0, 0, 100, 100), true);
        let tree = Arc::new(PartitionTree::build(world, 2, 1).unwrap());
        let mut f0 = HaloField::new(Arc::clone(&tree), Pid(0)).unwrap();

        f0.add(Int2D::new(0, 10), entity(0, 1, WALKER)).unwrap();
        // Stepping left off the seam wraps to x=99, owned by partition 1.
        let out = f0.move_object(agent(0, 1), Int2D::new(-1, 10)).unwrap();
        assert_eq!(out, MoveOutcome::Migrated(Pid(1)));
        assert_eq!(f0.take_migrants()[0].point, Int2D::new(99, 10));
    }
}
