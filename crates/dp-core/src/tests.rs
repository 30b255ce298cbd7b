//! Unit tests for dp-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, Pid, PromiseId};

    #[test]
    fn agent_id_compose_roundtrip() {
        let id = AgentId::compose(Pid(3), 4171);
        assert_eq!(id.home_pid(), Pid(3));
        assert_eq!(id.serial(), 4171);
    }

    #[test]
    fn agent_ids_from_different_pids_never_collide() {
        assert_ne!(AgentId::compose(Pid(0), 7), AgentId::compose(Pid(1), 7));
    }

    #[test]
    fn ordering() {
        assert!(Pid(0) < Pid(1));
        assert!(PromiseId(100) > PromiseId(99));
        // Same pid: serial order.  Different pid: pid order dominates.
        assert!(AgentId::compose(Pid(0), 5) < AgentId::compose(Pid(0), 6));
        assert!(AgentId::compose(Pid(0), u32::MAX as u64) < AgentId::compose(Pid(1), 0));
    }

    #[test]
    fn display() {
        assert_eq!(Pid(7).to_string(), "Pid(7)");
        assert_eq!(AgentId::compose(Pid(2), 9).to_string(), "Agent(2/9)");
    }
}

#[cfg(test)]
mod geo {
    use crate::{Int2D, IntRect};

    #[test]
    fn half_open_containment() {
        let r = IntRect::new(0, 0, 10, 10);
        assert!(r.contains(Int2D::new(0, 0)));
        assert!(r.contains(Int2D::new(9, 9)));
        assert!(!r.contains(Int2D::new(10, 9)));
        assert!(!r.contains(Int2D::new(-1, 5)));
    }

    #[test]
    fn adjacent_rects_do_not_intersect() {
        let a = IntRect::new(0, 0, 100, 200);
        let b = IntRect::new(100, 0, 200, 200);
        assert!(!a.intersects(&b));
        assert!(a.expand(1).intersects(&b));
    }

    #[test]
    fn intersection_of_overlapping() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(5, 5, 20, 20);
        assert_eq!(a.intersection(&b), Some(IntRect::new(5, 5, 10, 10)));
        assert_eq!(a.intersection(&IntRect::new(10, 0, 20, 10)), None);
    }

    #[test]
    fn cells_cover_area() {
        let r = IntRect::new(2, 3, 5, 5);
        let cells: Vec<_> = r.cells().collect();
        assert_eq!(cells.len() as i64, r.area());
        assert_eq!(cells[0], Int2D::new(2, 3));
        assert_eq!(*cells.last().unwrap(), Int2D::new(4, 4));
    }

    #[test]
    fn chebyshev_distance() {
        assert_eq!(Int2D::new(0, 0).chebyshev(Int2D::new(3, -2)), 3);
        assert_eq!(Int2D::new(5, 5).chebyshev(Int2D::new(5, 5)), 0);
    }
}

#[cfg(test)]
mod world {
    use crate::{Int2D, IntRect, WorldBounds};

    fn world(toroidal: bool) -> WorldBounds {
        WorldBounds::new(IntRect::new(0, 0, 200, 200), toroidal)
    }

    #[test]
    fn bounded_wrap_rejects_outside_points() {
        let w = world(false);
        assert_eq!(w.wrap(Int2D::new(5, 5)).unwrap(), Int2D::new(5, 5));
        assert!(w.wrap(Int2D::new(200, 5)).is_err());
        assert!(w.wrap(Int2D::new(-1, 5)).is_err());
    }

    #[test]
    fn toroidal_wrap_normalizes() {
        let w = world(true);
        assert_eq!(w.wrap(Int2D::new(200, 5)).unwrap(), Int2D::new(0, 5));
        assert_eq!(w.wrap(Int2D::new(-1, 5)).unwrap(), Int2D::new(199, 5));
        assert_eq!(w.wrap(Int2D::new(405, -401)).unwrap(), Int2D::new(5, 199));
    }

    #[test]
    fn bounded_expansion_clamps_to_one_rect() {
        let w = world(false);
        let local = IntRect::new(0, 0, 100, 200);
        let cover = w.expand_wrapped(&local, 1);
        assert_eq!(cover, vec![IntRect::new(0, 0, 101, 200)]);
    }

    #[test]
    fn toroidal_expansion_wraps_across_seam() {
        let w = world(true);
        let local = IntRect::new(0, 0, 100, 200);
        let cover = w.expand_wrapped(&local, 1);
        // y expansion covers the whole axis (200 + 2 > 200) → full extent;
        // x splits into the wrapped strip [199,200) and the body [0,101).
        assert_eq!(cover.len(), 2);
        assert!(cover.contains(&IntRect::new(199, 0, 200, 200)));
        assert!(cover.contains(&IntRect::new(0, 0, 101, 200)));
    }

    #[test]
    fn toroidal_corner_expansion_makes_four_pieces() {
        let w = WorldBounds::new(IntRect::new(0, 0, 100, 100), true);
        let local = IntRect::new(0, 0, 50, 50);
        let cover = w.expand_wrapped(&local, 2);
        assert_eq!(cover.len(), 4);
        let covered: i64 = cover.iter().map(|r| r.area()).sum();
        assert_eq!(covered, 54 * 54);
    }
}

#[cfg(test)]
mod time {
    use crate::{Int2D, IntRect, SimClock, SimConfig, Tick, WorldBounds};

    fn config() -> SimConfig {
        SimConfig {
            world: WorldBounds::new(IntRect::new(0, 0, 64, 64), false),
            num_partitions: 4,
            aoi: 1,
            total_ticks: 100,
            seed: 42,
            start_unix_secs: 0,
            tick_duration_secs: 60,
            promise_ttl_ticks: None,
        }
    }

    #[test]
    fn clock_advances() {
        let mut clock = SimClock::new(1_000, 60);
        assert_eq!(clock.current_tick, Tick::ZERO);
        clock.advance();
        clock.advance();
        assert_eq!(clock.current_tick, Tick(2));
        assert_eq!(clock.current_unix_secs(), 1_120);
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
        assert_eq!(config().end_tick(), Tick(100));
    }

    #[test]
    fn degenerate_configs_rejected() {
        let mut c = config();
        c.num_partitions = 0;
        assert!(c.validate().is_err());

        let mut c = config();
        c.aoi = -1;
        assert!(c.validate().is_err());

        let mut c = config();
        c.world = WorldBounds::new(IntRect::new(0, 0, 0, 10), false);
        assert!(c.validate().is_err());
    }

    #[test]
    fn sanity_point_display() {
        assert_eq!(Int2D::new(3, -4).to_string(), "(3, -4)");
        assert_eq!(Tick(9).to_string(), "T9");
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng, Pid, SimRng, Tick};

    #[test]
    fn same_inputs_same_stream() {
        let a = AgentId::compose(Pid(1), 5);
        let mut r1 = AgentRng::at_tick(42, a, Tick(7));
        let mut r2 = AgentRng::at_tick(42, a, Tick(7));
        for _ in 0..8 {
            assert_eq!(r1.gen_range(0..1_000_000), r2.gen_range(0..1_000_000));
        }
    }

    #[test]
    fn tick_changes_stream() {
        let a = AgentId::compose(Pid(1), 5);
        let mut r1 = AgentRng::at_tick(42, a, Tick(7));
        let mut r2 = AgentRng::at_tick(42, a, Tick(8));
        let draws1: Vec<u32> = (0..4).map(|_| r1.gen_range(0..u32::MAX)).collect();
        let draws2: Vec<u32> = (0..4).map(|_| r2.gen_range(0..u32::MAX)).collect();
        assert_ne!(draws1, draws2);
    }

    #[test]
    fn sim_rng_children_are_reproducible_and_disjoint() {
        let mut a1 = SimRng::child(42, 0);
        let mut a2 = SimRng::child(42, 0);
        let mut b = SimRng::child(42, 1);
        let draws_a1: Vec<u32> = (0..4).map(|_| a1.gen_range(0..u32::MAX)).collect();
        let draws_a2: Vec<u32> = (0..4).map(|_| a2.gen_range(0..u32::MAX)).collect();
        let draws_b: Vec<u32> = (0..4).map(|_| b.gen_range(0..u32::MAX)).collect();
        assert_eq!(draws_a1, draws_a2);
        assert_ne!(draws_a1, draws_b);
    }
}
