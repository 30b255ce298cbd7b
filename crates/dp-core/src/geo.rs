//! Integer lattice geometry: points, half-open rectangles, and world bounds
//! with optional toroidal wraparound.
//!
//! All rectangles are half-open (`x0 <= x < x1`, `y0 <= y < y1`), so adjacent
//! partitions tile exactly with no shared cells.  Coordinates are `i32`:
//! worlds up to ~4 billion cells per axis, with headroom below zero so halo
//! expansion arithmetic never underflows.

use crate::error::{DpError, DpResult};

// ── Int2D ─────────────────────────────────────────────────────────────────────

/// A point on the integer simulation lattice.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Int2D {
    pub x: i32,
    pub y: i32,
}

impl Int2D {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise translation.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Int2D {
        Int2D::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev (chessboard) distance — the natural metric for square-cell
    /// neighborhood queries.
    #[inline]
    pub fn chebyshev(self, other: Int2D) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl std::fmt::Display for Int2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ── IntRect ───────────────────────────────────────────────────────────────────

/// A half-open axis-aligned rectangle: `[x0, x1) × [y0, y1)`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct IntRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl IntRect {
    #[inline]
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    #[inline]
    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    #[inline]
    pub fn contains(&self, p: Int2D) -> bool {
        p.x >= self.x0 && p.x < self.x1 && p.y >= self.y0 && p.y < self.y1
    }

    #[inline]
    pub fn intersects(&self, other: &IntRect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Intersection, or `None` if the rects are disjoint.
    pub fn intersection(&self, other: &IntRect) -> Option<IntRect> {
        let r = IntRect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Grow by `margin` cells on every side.
    #[inline]
    pub fn expand(&self, margin: i32) -> IntRect {
        IntRect::new(self.x0 - margin, self.y0 - margin, self.x1 + margin, self.y1 + margin)
    }

    /// Clip to `bounds`.  May produce an empty rect.
    #[inline]
    pub fn clamp(&self, bounds: &IntRect) -> IntRect {
        IntRect::new(
            self.x0.max(bounds.x0),
            self.y0.max(bounds.y0),
            self.x1.min(bounds.x1),
            self.y1.min(bounds.y1),
        )
    }

    /// Iterate every lattice point, row-major.  Intended for tests and
    /// small-region snapshots, not hot paths.
    pub fn cells(&self) -> impl Iterator<Item = Int2D> + '_ {
        let (x0, x1) = (self.x0, self.x1.max(self.x0));
        (self.y0..self.y1).flat_map(move |y| (x0..x1).map(move |x| Int2D::new(x, y)))
    }
}

impl std::fmt::Display for IntRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{})×[{},{})", self.x0, self.x1, self.y0, self.y1)
    }
}

// ── WorldBounds ───────────────────────────────────────────────────────────────

/// The fixed global coordinate space, known identically to every partition.
///
/// When `toroidal` is set, the world wraps on both axes: points are
/// normalized with [`WorldBounds::wrap`] before any ownership or storage
/// lookup, and halo expansion wraps around the edges instead of clamping.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct WorldBounds {
    pub rect: IntRect,
    pub toroidal: bool,
}

impl WorldBounds {
    pub fn new(rect: IntRect, toroidal: bool) -> Self {
        Self { rect, toroidal }
    }

    #[inline]
    pub fn contains(&self, p: Int2D) -> bool {
        self.rect.contains(p)
    }

    /// Normalize `p` into the world.
    ///
    /// Toroidal worlds wrap on both axes; bounded worlds return
    /// [`DpError::OutOfWorld`] for points outside the rect.
    pub fn wrap(&self, p: Int2D) -> DpResult<Int2D> {
        if self.rect.contains(p) {
            return Ok(p);
        }
        if !self.toroidal {
            return Err(DpError::OutOfWorld { point: p, world: self.rect });
        }
        let w = self.rect.width();
        let h = self.rect.height();
        Ok(Int2D::new(
            self.rect.x0 + (p.x - self.rect.x0).rem_euclid(w),
            self.rect.y0 + (p.y - self.rect.y0).rem_euclid(h),
        ))
    }

    /// The in-world coverage of `local` expanded by `aoi` cells on every side.
    ///
    /// Bounded worlds clamp: the result is a single rect.  Toroidal worlds
    /// wrap: the expansion may split into up to four disjoint in-world pieces
    /// (two wrapped segments per axis).  An expansion that covers a whole
    /// axis collapses to the full axis extent.
    pub fn expand_wrapped(&self, local: &IntRect, aoi: i32) -> Vec<IntRect> {
        let grown = local.expand(aoi);
        if !self.toroidal {
            let clipped = grown.clamp(&self.rect);
            return if clipped.is_empty() { vec![] } else { vec![clipped] };
        }

        let xs = wrap_segment(grown.x0, grown.x1, self.rect.x0, self.rect.x1);
        let ys = wrap_segment(grown.y0, grown.y1, self.rect.y0, self.rect.y1);
        let mut out = Vec::with_capacity(xs.len() * ys.len());
        for &(y0, y1) in &ys {
            for &(x0, x1) in &xs {
                out.push(IntRect::new(x0, y0, x1, y1));
            }
        }
        out
    }
}

/// Wrap the 1-D segment `[a0, a1)` into the axis `[w0, w1)`.
///
/// Returns one segment when the wrapped interval is contiguous, two when it
/// straddles the seam, and the full axis when the input covers it entirely.
fn wrap_segment(a0: i32, a1: i32, w0: i32, w1: i32) -> Vec<(i32, i32)> {
    let axis = w1 - w0;
    let len = a1 - a0;
    if len >= axis {
        return vec![(w0, w1)];
    }
    let lo = w0 + (a0 - w0).rem_euclid(axis);
    if lo + len <= w1 {
        vec![(lo, lo + len)]
    } else {
        vec![(lo, w1), (w0, w0 + (lo + len - w1))]
    }
}
