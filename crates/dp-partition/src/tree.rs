//! `PartitionTree` — recursive bisection of the world into per-pid slices.
//!
//! # Construction
//!
//! The world rect is split recursively along its longer axis, dividing the
//! remaining pid budget proportionally between the two halves, until each
//! leaf holds exactly one pid.  Leaves are numbered depth-first, so pid
//! assignment is deterministic for a given `(world, num_partitions)`.
//!
//! # Tiling invariant
//!
//! The leaf rects are pairwise disjoint and their union is exactly the world
//! rect.  `owner_of` resolves ownership by descending the tree, so it agrees
//! with the leaf rects by construction: every in-world point has exactly one
//! owner.

use dp_core::{Int2D, IntRect, Pid, WorldBounds};

use crate::error::{PartitionError, PartitionResult};

#[derive(Debug)]
enum NodeKind {
    Leaf(Pid),
    /// Children are node indices; `[0]` covers the low side of the cut axis.
    Split([usize; 2]),
}

#[derive(Debug)]
struct Node {
    rect: IntRect,
    kind: NodeKind,
}

/// Immutable spatial decomposition shared by every component of a run.
#[derive(Debug)]
pub struct PartitionTree {
    world: WorldBounds,
    aoi: i32,
    nodes: Vec<Node>,
    /// Root-to-leaf node-index path per pid.  `paths[pid][d]` is the
    /// ancestor at tree depth `d`; the last element is the leaf itself.
    paths: Vec<Vec<usize>>,
    /// Leaf rect per pid.
    local: Vec<IntRect>,
    /// In-world halo coverage per pid (local expanded by AOI, clamped or
    /// wrapped).  One rect for bounded worlds, up to four for toroidal.
    halo: Vec<Vec<IntRect>>,
    /// Boundary-exchange neighbor set per pid (sorted, self excluded).
    neighbors: Vec<Vec<Pid>>,
}

impl PartitionTree {
    /// Build a tiling of `world` into `num_partitions` slices with halo
    /// margin `aoi`.
    pub fn build(world: WorldBounds, num_partitions: usize, aoi: i32) -> PartitionResult<Self> {
        if num_partitions == 0 {
            return Err(PartitionError::BadTiling("num_partitions must be >= 1".into()));
        }
        if num_partitions > u16::MAX as usize {
            return Err(PartitionError::BadTiling(format!(
                "{num_partitions} partitions exceeds pid space"
            )));
        }
        if aoi < 0 {
            return Err(PartitionError::BadTiling(format!("aoi must be >= 0, got {aoi}")));
        }
        if world.rect.is_empty() {
            return Err(PartitionError::BadTiling(format!("world {} is empty", world.rect)));
        }

        let mut nodes = Vec::with_capacity(2 * num_partitions);
        let mut next_pid = 0u16;
        split(&mut nodes, &mut next_pid, world.rect, num_partitions)?;

        // Recover per-pid leaf rects and root-to-leaf paths.
        let mut local = vec![IntRect::new(0, 0, 0, 0); num_partitions];
        let mut paths = vec![Vec::new(); num_partitions];
        let mut stack = vec![(0usize, vec![0usize])];
        while let Some((idx, path)) = stack.pop() {
            match nodes[idx].kind {
                NodeKind::Leaf(pid) => {
                    local[pid.index()] = nodes[idx].rect;
                    paths[pid.index()] = path;
                }
                NodeKind::Split([lo, hi]) => {
                    let mut lo_path = path.clone();
                    lo_path.push(lo);
                    let mut hi_path = path;
                    hi_path.push(hi);
                    stack.push((lo, lo_path));
                    stack.push((hi, hi_path));
                }
            }
        }

        let halo: Vec<Vec<IntRect>> = local
            .iter()
            .map(|r| world.expand_wrapped(r, aoi))
            .collect();

        // Level-0 neighbor sets: q must exchange halo data with p when q's
        // slice intersects p's halo coverage.
        let mut neighbors = Vec::with_capacity(num_partitions);
        for p in 0..num_partitions {
            let mut set: Vec<Pid> = (0..num_partitions)
                .filter(|&q| q != p)
                .filter(|&q| halo[p].iter().any(|piece| piece.intersects(&local[q])))
                .map(|q| Pid(q as u16))
                .collect();
            set.sort_unstable();
            neighbors.push(set);
        }

        Ok(Self { world, aoi, nodes, paths, local, halo, neighbors })
    }

    // ── The tiling contract ───────────────────────────────────────────────

    #[inline]
    pub fn world(&self) -> WorldBounds {
        self.world
    }

    #[inline]
    pub fn aoi(&self) -> i32 {
        self.aoi
    }

    #[inline]
    pub fn num_partitions(&self) -> usize {
        self.local.len()
    }

    /// All pids of this tiling, ascending.
    pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
        (0..self.local.len() as u16).map(Pid)
    }

    /// The disjoint slice owned by `pid`.
    pub fn local_bounds_of(&self, pid: Pid) -> PartitionResult<IntRect> {
        self.local
            .get(pid.index())
            .copied()
            .ok_or(PartitionError::UnknownPid(pid))
    }

    /// Every pid's slice, indexed by pid — the visualization-facing
    /// `getAllLocalBounds` surface.
    #[inline]
    pub fn all_local_bounds(&self) -> &[IntRect] {
        &self.local
    }

    /// In-world coverage of `pid`'s halo region (its slice expanded by AOI).
    ///
    /// Bounded worlds clamp to one rect; toroidal worlds may wrap into up to
    /// four pieces.  The coverage includes the local slice itself.
    pub fn halo_bounds_of(&self, pid: Pid) -> PartitionResult<&[IntRect]> {
        self.halo
            .get(pid.index())
            .map(Vec::as_slice)
            .ok_or(PartitionError::UnknownPid(pid))
    }

    /// The parts of `owner`'s slice that fall inside `of`'s halo coverage —
    /// i.e. the region `owner` must push to `of` every step.
    pub fn halo_overlap(&self, of: Pid, owner: Pid) -> PartitionResult<Vec<IntRect>> {
        let owner_rect = self.local_bounds_of(owner)?;
        Ok(self
            .halo_bounds_of(of)?
            .iter()
            .filter_map(|piece| piece.intersection(&owner_rect))
            .collect())
    }

    /// The unique owner of an in-world point.  Toroidal worlds normalize the
    /// point first; bounded worlds reject out-of-world points loudly.
    pub fn owner_of(&self, p: Int2D) -> PartitionResult<Pid> {
        let p = self.world.wrap(p)?;
        let mut idx = 0usize;
        loop {
            match self.nodes[idx].kind {
                NodeKind::Leaf(pid) => return Ok(pid),
                NodeKind::Split([lo, hi]) => {
                    idx = if self.nodes[lo].rect.contains(p) { lo } else { hi };
                }
            }
        }
    }

    // ── Neighborhood queries ──────────────────────────────────────────────

    /// Boundary-exchange neighbors of `pid` (level 0): every pid whose slice
    /// intersects `pid`'s halo coverage.
    pub fn neighbors_of(&self, pid: Pid) -> PartitionResult<&[Pid]> {
        self.neighbors
            .get(pid.index())
            .map(Vec::as_slice)
            .ok_or(PartitionError::UnknownPid(pid))
    }

    /// Tree depth of `pid`'s leaf — the deepest meaningful query level.
    pub fn depth_of(&self, pid: Pid) -> PartitionResult<usize> {
        self.paths
            .get(pid.index())
            .map(|p| p.len() - 1)
            .ok_or(PartitionError::UnknownPid(pid))
    }

    /// Neighbors of `pid` localized to tree level `level`: the
    /// boundary-exchange set restricted to leaves sharing `pid`'s ancestor
    /// at depth `level`.  Level 0 (the root) returns the full set; deeper
    /// levels return smaller, more local sets.  Levels below the leaf clamp
    /// to the leaf depth.
    pub fn neighbors_at_level(&self, pid: Pid, level: usize) -> PartitionResult<Vec<Pid>> {
        let path = self.paths.get(pid.index()).ok_or(PartitionError::UnknownPid(pid))?;
        let ancestor = path[level.min(path.len() - 1)];
        let within = self.leaves_under(ancestor);
        Ok(self.neighbors[pid.index()]
            .iter()
            .copied()
            .filter(|q| within.contains(q))
            .collect())
    }

    /// The smallest (deepest) level whose neighbor set covers every pid in
    /// `required`, walking from the leaf level up to the root.
    ///
    /// Returns `(level, neighbor_set)`.  If even the root level's full set
    /// does not cover the request the tree cannot serve it, and the call
    /// fails with [`PartitionError::MalformedTopology`] rather than
    /// returning a partial set.
    pub fn minimal_neighborhood_containing(
        &self,
        pid: Pid,
        required: &[Pid],
    ) -> PartitionResult<(usize, Vec<Pid>)> {
        let depth = self.depth_of(pid)?;
        for level in (0..=depth).rev() {
            let set = self.neighbors_at_level(pid, level)?;
            if required.iter().all(|r| set.contains(r)) {
                return Ok((level, set));
            }
        }
        let root_set = self.neighbors_at_level(pid, 0)?;
        let missing: Vec<Pid> = required
            .iter()
            .copied()
            .filter(|r| !root_set.contains(r))
            .collect();
        Err(PartitionError::MalformedTopology { pid, missing })
    }

    /// All leaf pids in the subtree rooted at `node`.
    fn leaves_under(&self, node: usize) -> Vec<Pid> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(idx) = stack.pop() {
            match self.nodes[idx].kind {
                NodeKind::Leaf(pid) => out.push(pid),
                NodeKind::Split([lo, hi]) => {
                    stack.push(lo);
                    stack.push(hi);
                }
            }
        }
        out
    }
}

/// Recursively bisect `rect` into `n` leaves, appending nodes and returning
/// the index of the subtree root.
fn split(
    nodes: &mut Vec<Node>,
    next_pid: &mut u16,
    rect: IntRect,
    n: usize,
) -> PartitionResult<usize> {
    if n == 1 {
        if rect.is_empty() {
            return Err(PartitionError::BadTiling(format!("empty leaf rect {rect}")));
        }
        let idx = nodes.len();
        nodes.push(Node { rect, kind: NodeKind::Leaf(Pid(*next_pid)) });
        *next_pid += 1;
        return Ok(idx);
    }

    let n_lo = n / 2;
    let n_hi = n - n_lo;

    // Cut the longer axis; fall back to the other if it cannot be split.
    let split_x = if rect.width() >= rect.height() {
        rect.width() >= 2
    } else {
        rect.height() < 2
    };
    let (lo_rect, hi_rect) = if split_x {
        let cut = proportional_cut(rect.x0, rect.x1, n_lo, n)?;
        (
            IntRect::new(rect.x0, rect.y0, cut, rect.y1),
            IntRect::new(cut, rect.y0, rect.x1, rect.y1),
        )
    } else {
        let cut = proportional_cut(rect.y0, rect.y1, n_lo, n)?;
        (
            IntRect::new(rect.x0, rect.y0, rect.x1, cut),
            IntRect::new(rect.x0, cut, rect.x1, rect.y1),
        )
    };

    // Reserve the split node before recursing so the subtree root index is
    // stable (children are patched in afterwards).
    let idx = nodes.len();
    nodes.push(Node { rect, kind: NodeKind::Split([0, 0]) });
    let lo = split(nodes, next_pid, lo_rect, n_lo)?;
    let hi = split(nodes, next_pid, hi_rect, n_hi)?;
    nodes[idx].kind = NodeKind::Split([lo, hi]);
    Ok(idx)
}

/// A cut point dividing `[a0, a1)` in proportion `n_lo : n`, leaving at
/// least one cell on each side.
fn proportional_cut(a0: i32, a1: i32, n_lo: usize, n: usize) -> PartitionResult<i32> {
    let len = (a1 - a0) as i64;
    if len < 2 {
        return Err(PartitionError::BadTiling(format!(
            "axis [{a0},{a1}) too small to split into {n} parts"
        )));
    }
    let cut = a0 as i64 + (len * n_lo as i64) / n as i64;
    Ok(cut.clamp(a0 as i64 + 1, a1 as i64 - 1) as i32)
}
