//! ----------------------------------------------------------------------------
//!  Raster regions
//!
//!  A [`RasterRegion`] is the part of the screen that is still visible through
//!  the current chain of portals, stored as one inclusive `[left, right]`
//!  pixel span per scan-line.  Spans live in the frame's [`SpanArena`]; the
//!  region itself is a small `Copy` handle (row range + first slot).
//!
//!  ▸ `build` scan-converts a convex screen polygon (two monotone chains,
//!    one DDA per chain) inside the parent's vertical range.
//!  ▸ `intersect` clamps every row against the parent and trims rows that
//!    became empty.
//!  ▸ `clip_line` finds where a segment leaves the region by bisection; the
//!    boundary is a span table, so there is no closed form to solve.
//!
//!  Fill convention: row `y` is covered when `top <= y + 0.5 < bottom`,
//!  column `x` when `left <= x + 0.5 < right`, so polygons sharing an edge
//!  never share a pixel.
//! ----------------------------------------------------------------------------

use glam::{Vec2, Vec3};
use smallvec::{SmallVec, smallvec};

use crate::engine::{
    arena::{ArenaError, SpanArena},
    clip::POLY_INLINE,
    projection::ScreenVertex,
    types::{Bisection, Screen},
};

/// Upper bound on probe points when a segment has both ends outside.
const MAX_LINE_SAMPLES: usize = 256;

/// Polygons with a smaller absolute shoelace area are treated as lines.
const MIN_AREA: f32 = 1e-6;

/// One end of a span: pixel column plus perspective attributes `(1/z, u/z, v/z)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpanEdge {
    pub x: i32,
    pub attr: Vec3,
}

/// Inclusive pixel run `left.x ..= right.x` on one scan-line.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Span {
    pub left: SpanEdge,
    pub right: SpanEdge,
}

impl Span {
    pub fn new(left: i32, right: i32) -> Self {
        Self {
            left: SpanEdge {
                x: left,
                attr: Vec3::ZERO,
            },
            right: SpanEdge {
                x: right,
                attr: Vec3::ZERO,
            },
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.left.x > self.right.x
    }

    /// Attributes linearly interpolated at column `x`.
    pub fn attr_at(&self, x: i32) -> Vec3 {
        let w = self.right.x - self.left.x;
        if w <= 0 {
            return self.left.attr;
        }
        let t = (x - self.left.x) as f32 / w as f32;
        self.left.attr.lerp(self.right.attr, t)
    }

    /// Narrow this span to `bounds`, re-deriving attributes at any moved end.
    pub fn clamp_to(&mut self, bounds: &Span) {
        let orig = *self;
        if bounds.left.x > orig.left.x {
            self.left = SpanEdge {
                x: bounds.left.x,
                attr: orig.attr_at(bounds.left.x),
            };
        }
        if bounds.right.x < orig.right.x {
            self.right = SpanEdge {
                x: bounds.right.x,
                attr: orig.attr_at(bounds.right.x),
            };
        }
    }
}

/// Screen-space visibility mask: rows `y_min ..= y_max`, one span each.
///
/// Invariant: every row in range has `left.x <= right.x`.  A region with
/// `y_min > y_max` is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterRegion {
    y_min: i32,
    y_max: i32,
    first: usize,
}

impl RasterRegion {
    pub const EMPTY: Self = Self {
        y_min: 0,
        y_max: -1,
        first: 0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.y_min > self.y_max
    }

    #[inline]
    pub fn y_min(&self) -> i32 {
        self.y_min
    }

    #[inline]
    pub fn y_max(&self) -> i32 {
        self.y_max
    }

    /// Number of scan-lines in range.
    #[inline]
    pub fn rows(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.y_max - self.y_min + 1) as usize
        }
    }

    #[inline(always)]
    fn index(&self, y: i32) -> usize {
        debug_assert!(y >= self.y_min && y <= self.y_max);
        self.first + (y - self.y_min) as usize
    }

    /// Span at row `y`, `None` outside the vertical range.
    pub fn span<'a>(&self, arena: &'a SpanArena, y: i32) -> Option<&'a Span> {
        if y < self.y_min || y > self.y_max {
            return None;
        }
        Some(arena.get(self.index(y)))
    }

    /// `(y, span)` for every row, top to bottom.
    pub fn spans<'a>(self, arena: &'a SpanArena) -> impl Iterator<Item = (i32, &'a Span)> + 'a {
        let slots = self.first..self.first + self.rows();
        (self.y_min..).zip(arena.slice(slots).iter())
    }

    /// Every row satisfies `left <= right`.
    pub fn is_valid(&self, arena: &SpanArena) -> bool {
        self.spans(arena).all(|(_, s)| !s.is_empty())
    }

    /*──────────────────────────── Construction ────────────────────────────*/

    /// The whole frame-buffer; root parent of every traversal.
    pub fn full_screen(screen: &Screen, arena: &mut SpanArena) -> Result<Self, ArenaError> {
        if screen.w == 0 || screen.h == 0 {
            return Ok(Self::EMPTY);
        }
        let slots = arena.alloc(screen.h)?;
        let first = slots.start;
        let row = Span::new(0, screen.w as i32 - 1);
        for slot in slots {
            *arena.get_mut(slot) = row;
        }
        Ok(Self {
            y_min: 0,
            y_max: screen.h as i32 - 1,
            first,
        })
    }

    /// Region from explicit `(left, right)` rows starting at `y_min`.
    /// Empty rows are trimmed like after an intersection.
    pub fn from_rows(
        y_min: i32,
        rows: &[(i32, i32)],
        arena: &mut SpanArena,
    ) -> Result<Self, ArenaError> {
        if rows.is_empty() {
            return Ok(Self::EMPTY);
        }
        let slots = arena.alloc(rows.len())?;
        for (slot, &(l, r)) in slots.clone().zip(rows) {
            *arena.get_mut(slot) = Span::new(l, r);
        }
        let mut region = Self {
            y_min,
            y_max: y_min + rows.len() as i32 - 1,
            first: slots.start,
        };
        region.trim(arena);
        Ok(region)
    }

    /// Scan-convert a convex screen polygon within the vertical range of
    /// `parent`.
    ///
    /// Horizontal clamping against the parent is left to
    /// [`intersect`](Self::intersect).  Degenerate input (fewer than three vertices, zero
    /// area, zero height, or a chain collapsing to a point) yields an empty
    /// region, never an error; only arena exhaustion fails.
    pub fn build(
        poly: &[ScreenVertex],
        parent: &RasterRegion,
        arena: &mut SpanArena,
    ) -> Result<Self, ArenaError> {
        if poly.len() < 3 || parent.is_empty() {
            return Ok(Self::EMPTY);
        }
        let Some(chains) = Chains::split(poly) else {
            return Ok(Self::EMPTY);
        };

        let y0 = pixel_start(chains.top_y).max(parent.y_min);
        let y1 = (pixel_start(chains.bottom_y) - 1).min(parent.y_max);
        if y0 > y1 {
            return Ok(Self::EMPTY);
        }

        let slots = arena.alloc((y1 - y0 + 1) as usize)?;
        let first_ys = y0 as f32 + 0.5;
        let mut left = EdgeWalker::new(poly, &chains.left, first_ys);
        let mut right = EdgeWalker::new(poly, &chains.right, first_ys);

        for (slot, y) in slots.clone().zip(y0..=y1) {
            let ys = y as f32 + 0.5;
            let (lx, la) = left.step(ys);
            let (rx, ra) = right.step(ys);
            *arena.get_mut(slot) = Span {
                left: SpanEdge {
                    x: pixel_start(lx),
                    attr: la,
                },
                right: SpanEdge {
                    x: pixel_start(rx) - 1,
                    attr: ra,
                },
            };
        }

        let mut region = Self {
            y_min: y0,
            y_max: y1,
            first: slots.start,
        };
        region.trim(arena);
        Ok(region)
    }

    /*──────────────────────────── Intersection ────────────────────────────*/

    /// Restrict `self` to `parent`, in place.  Returns `false` when nothing
    /// is left.
    pub fn intersect(&mut self, parent: &RasterRegion, arena: &mut SpanArena) -> bool {
        if self.is_empty() || parent.is_empty() {
            *self = Self::EMPTY;
            return false;
        }
        let y0 = self.y_min.max(parent.y_min);
        let y1 = self.y_max.min(parent.y_max);
        if y0 > y1 {
            *self = Self::EMPTY;
            return false;
        }

        self.first += (y0 - self.y_min) as usize;
        self.y_min = y0;
        self.y_max = y1;

        for y in y0..=y1 {
            let bounds = *arena.get(parent.index(y));
            arena.get_mut(self.index(y)).clamp_to(&bounds);
        }

        self.trim(arena);
        !self.is_empty()
    }

    /// Keep the longest run of non-empty rows.  For a convex outline the
    /// empty rows can only sit at the ends; an interior gap only comes from
    /// rounding on sliver polygons.  The shorter side of such a gap is
    /// dropped along with any pixel centres it covered, so a sub-pixel
    /// sliver may lose a few pixels.
    fn trim(&mut self, arena: &SpanArena) {
        let mut best: Option<(i32, i32)> = None;
        let mut run: Option<i32> = None;

        for y in self.y_min..=self.y_max + 1 {
            let valid = y <= self.y_max && !arena.get(self.index(y)).is_empty();
            match (valid, run) {
                (true, None) => run = Some(y),
                (false, Some(start)) => {
                    let longer = best.is_none_or(|(s, e)| y - start > e - s + 1);
                    if longer {
                        best = Some((start, y - 1));
                    }
                    run = None;
                }
                _ => {}
            }
        }

        match best {
            None => *self = Self::EMPTY,
            Some((s, e)) => {
                if s != self.y_min || e != self.y_max {
                    log::trace!(
                        "region trimmed from {}..={} to {s}..={e}",
                        self.y_min,
                        self.y_max
                    );
                }
                self.first += (s - self.y_min) as usize;
                self.y_min = s;
                self.y_max = e;
            }
        }
    }

    /*──────────────────────────── Point / line queries ────────────────────*/

    /// Is the screen point inside the span of its row?
    pub fn contains(&self, arena: &SpanArena, p: Vec2) -> bool {
        let y = p.y.floor();
        if y < self.y_min as f32 || y > self.y_max as f32 {
            return false;
        }
        let span = arena.get(self.index(y as i32));
        p.x >= span.left.x as f32 && p.x < (span.right.x + 1) as f32
    }

    /// Clip the segment `a → b` to the region.
    ///
    /// Ends that are already inside are kept exactly; ends outside are moved
    /// to within `bisection.tolerance_px` of the boundary.  If both ends are
    /// outside the segment is probed for an inside point first.
    pub fn clip_line(
        &self,
        arena: &SpanArena,
        a: Vec2,
        b: Vec2,
        bisection: &Bisection,
    ) -> Option<(Vec2, Vec2)> {
        if self.is_empty() {
            return None;
        }
        let inside = |p: Vec2| self.contains(arena, p);
        let a_in = inside(a);
        let b_in = inside(b);
        if a_in && b_in {
            return Some((a, b));
        }

        let seed = if a_in {
            a
        } else if b_in {
            b
        } else {
            find_inside(a, b, bisection, &inside)?
        };

        let a = if a_in {
            a
        } else {
            bisect_boundary(seed, a, bisection, &inside)
        };
        let b = if b_in {
            b
        } else {
            bisect_boundary(seed, b, bisection, &inside)
        };
        Some((a, b))
    }
}

/// Locate a region boundary between a known-inside and a known-outside
/// point by repeated halving.
///
/// Returns the last point known to be inside.  Stops when the bracket is
/// no longer than `tolerance_px` or after `max_steps` halvings.
pub fn bisect_boundary(
    inside: Vec2,
    outside: Vec2,
    bisection: &Bisection,
    contains: impl Fn(Vec2) -> bool,
) -> Vec2 {
    let tol_sq = bisection.tolerance_px * bisection.tolerance_px;
    let (mut lo, mut hi) = (inside, outside);
    for _ in 0..bisection.max_steps {
        if lo.distance_squared(hi) <= tol_sq {
            break;
        }
        let mid = (lo + hi) * 0.5;
        if contains(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Probe evenly along `a → b` (excluding the ends) for an inside point.
fn find_inside(
    a: Vec2,
    b: Vec2,
    bisection: &Bisection,
    contains: impl Fn(Vec2) -> bool,
) -> Option<Vec2> {
    let step = bisection.tolerance_px.max(0.5);
    let samples = ((a.distance(b) / step).ceil() as usize).clamp(2, MAX_LINE_SAMPLES);
    (1..samples)
        .map(|i| a.lerp(b, i as f32 / samples as f32))
        .find(|&p| contains(p))
}

/// First pixel whose centre is at or after `v`.
#[inline(always)]
fn pixel_start(v: f32) -> i32 {
    (v - 0.5).ceil() as i32
}

/*──────────────────────────── Scan conversion ────────────────────────────*/

type Chain = SmallVec<[usize; POLY_INLINE]>;

/// The two y-monotone halves of a convex outline, top vertex first.
struct Chains {
    left: Chain,
    right: Chain,
    top_y: f32,
    bottom_y: f32,
}

impl Chains {
    fn split(poly: &[ScreenVertex]) -> Option<Self> {
        let n = poly.len();

        let area: f32 = (0..n)
            .map(|i| {
                let (a, b) = (poly[i].pos, poly[(i + 1) % n].pos);
                a.x * b.y - b.x * a.y
            })
            .sum();
        if area.abs() < MIN_AREA || !area.is_finite() {
            return None;
        }

        let top_y = poly.iter().map(|v| v.pos.y).fold(f32::INFINITY, f32::min);
        let bottom_y = poly
            .iter()
            .map(|v| v.pos.y)
            .fold(f32::NEG_INFINITY, f32::max);
        if bottom_y <= top_y {
            return None;
        }

        // topmost-leftmost and topmost-rightmost vertices
        let mut top_left = 0;
        let mut top_right = 0;
        let mut found = false;
        for (i, v) in poly.iter().enumerate() {
            if v.pos.y != top_y {
                continue;
            }
            if !found || v.pos.x < poly[top_left].pos.x {
                top_left = i;
            }
            if !found || v.pos.x > poly[top_right].pos.x {
                top_right = i;
            }
            found = true;
        }

        // With y pointing down a positive area means clockwise on screen:
        // walking forward from the top-right vertex descends the right side.
        let (left, right) = if area > 0.0 {
            (
                walk(poly, top_left, n - 1, bottom_y),
                walk(poly, top_right, 1, bottom_y),
            )
        } else {
            (
                walk(poly, top_left, 1, bottom_y),
                walk(poly, top_right, n - 1, bottom_y),
            )
        };

        if left.len() < 2 || right.len() < 2 {
            return None;
        }
        Some(Self {
            left,
            right,
            top_y,
            bottom_y,
        })
    }
}

/// Follow the outline from `start` in steps of `step` (mod n) until a
/// bottom vertex is reached.
fn walk(poly: &[ScreenVertex], start: usize, step: usize, bottom_y: f32) -> Chain {
    let n = poly.len();
    let mut chain: Chain = smallvec![start];
    let mut i = start;
    while poly[i].pos.y < bottom_y && chain.len() <= n {
        i = (i + step) % n;
        chain.push(i);
    }
    chain
}

/// Incremental x / attribute walker along one chain (classic DDA: slope
/// once per edge, one add per scan-line).
struct EdgeWalker<'a> {
    poly: &'a [ScreenVertex],
    chain: &'a Chain,
    seg: usize,
    x: f32,
    dx: f32,
    attr: Vec3,
    dattr: Vec3,
    y_end: f32,
}

impl<'a> EdgeWalker<'a> {
    fn new(poly: &'a [ScreenVertex], chain: &'a Chain, ys: f32) -> Self {
        let mut w = Self {
            poly,
            chain,
            seg: 0,
            x: 0.0,
            dx: 0.0,
            attr: Vec3::ZERO,
            dattr: Vec3::ZERO,
            y_end: f32::NEG_INFINITY,
        };
        w.enter(ys);
        w
    }

    /// Select the edge spanning `ys` and evaluate it there directly.
    fn enter(&mut self, ys: f32) {
        while self.seg + 2 < self.chain.len() && ys >= self.poly[self.chain[self.seg + 1]].pos.y {
            self.seg += 1;
        }
        let a = &self.poly[self.chain[self.seg]];
        let b = &self.poly[self.chain[self.seg + 1]];
        let dy = b.pos.y - a.pos.y;
        if dy <= f32::EPSILON {
            // zero-height edge: no slope to speak of
            self.x = a.pos.x.max(b.pos.x);
            self.attr = a.attr;
            self.dx = 0.0;
            self.dattr = Vec3::ZERO;
        } else {
            let inv_dy = 1.0 / dy;
            self.dx = (b.pos.x - a.pos.x) * inv_dy;
            self.dattr = (b.attr - a.attr) * inv_dy;
            let off = ys - a.pos.y;
            self.x = a.pos.x + self.dx * off;
            self.attr = a.attr + self.dattr * off;
        }
        self.y_end = b.pos.y;
    }

    /// Value at scan-line centre `ys`, then advance one row.
    fn step(&mut self, ys: f32) -> (f32, Vec3) {
        if ys >= self.y_end {
            self.enter(ys);
        }
        let out = (self.x, self.attr);
        self.x += self.dx;
        self.attr += self.dattr;
        out
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    fn sv(x: f32, y: f32) -> ScreenVertex {
        ScreenVertex {
            pos: vec2(x, y),
            attr: Vec3::ZERO,
            edge: None,
        }
    }

    fn setup(w: usize, h: usize) -> (SpanArena, RasterRegion) {
        let mut arena = SpanArena::new(1 << 14);
        let full = RasterRegion::full_screen(&Screen::new(w, h), &mut arena).unwrap();
        (arena, full)
    }

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<ScreenVertex> {
        vec![sv(x0, y0), sv(x1, y0), sv(x1, y1), sv(x0, y1)]
    }

    #[test]
    fn full_screen_takes_one_slot_per_row() {
        let mut arena = SpanArena::new(64);
        let full = RasterRegion::full_screen(&Screen::new(20, 12), &mut arena).unwrap();
        assert_eq!(arena.used(), 12);
        assert_eq!((full.y_min(), full.y_max()), (0, 11));
        for (_, s) in full.spans(&arena) {
            assert_eq!((s.left.x, s.right.x), (0, 19));
        }
        assert!(RasterRegion::full_screen(&Screen::new(20, 0), &mut arena).unwrap().is_empty());
        assert!(RasterRegion::full_screen(&Screen::new(8, 65), &mut arena).is_err());
    }

    #[test]
    fn square_covers_expected_pixels() {
        let (mut arena, full) = setup(100, 100);
        let r = RasterRegion::build(&square(10.0, 10.0, 20.0, 20.0), &full, &mut arena).unwrap();
        assert_eq!((r.y_min(), r.y_max()), (10, 19));
        for (_, s) in r.spans(&arena) {
            assert_eq!((s.left.x, s.right.x), (10, 19));
        }
        assert!(r.is_valid(&arena));
    }

    #[test]
    fn winding_does_not_matter() {
        let (mut arena, full) = setup(100, 100);
        let mut poly = vec![sv(50.0, 5.0), sv(90.0, 60.0), sv(20.0, 80.0)];
        let cw = RasterRegion::build(&poly, &full, &mut arena).unwrap();
        poly.reverse();
        let ccw = RasterRegion::build(&poly, &full, &mut arena).unwrap();

        assert_eq!((cw.y_min(), cw.y_max()), (ccw.y_min(), ccw.y_max()));
        let a: Vec<_> = cw.spans(&arena).map(|(_, s)| (s.left.x, s.right.x)).collect();
        let b: Vec<_> = ccw.spans(&arena).map(|(_, s)| (s.left.x, s.right.x)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn triangle_rows_are_monotone_and_valid() {
        let (mut arena, full) = setup(100, 100);
        let tri = [sv(10.0, 10.0), sv(90.0, 10.0), sv(50.0, 90.0)];
        let r = RasterRegion::build(&tri, &full, &mut arena).unwrap();
        assert!(r.is_valid(&arena));

        let widths: Vec<i32> = r
            .spans(&arena)
            .map(|(_, s)| s.right.x - s.left.x)
            .collect();
        assert!(widths.windows(2).all(|w| w[1] <= w[0]));

        // half-way down: x = 10 + 39.5/2 .. 90 - 39.5/2
        let mid = r.span(&arena, 49).unwrap();
        assert_eq!((mid.left.x, mid.right.x), (30, 69));
    }

    #[test]
    fn parent_limits_vertical_range() {
        let mut arena = SpanArena::new(1024);
        let parent = RasterRegion::from_rows(12, &[(0, 99); 4], &mut arena).unwrap();
        let r = RasterRegion::build(&square(10.0, 10.0, 20.0, 20.0), &parent, &mut arena).unwrap();
        assert_eq!((r.y_min(), r.y_max()), (12, 15));
    }

    #[test]
    fn degenerate_polygons_are_empty() {
        let (mut arena, full) = setup(64, 64);
        let line = [sv(1.0, 1.0), sv(10.0, 10.0), sv(20.0, 20.0)];
        let flat = [sv(1.0, 5.0), sv(10.0, 5.0), sv(20.0, 5.0)];
        let two = [sv(1.0, 1.0), sv(10.0, 10.0)];
        for poly in [&line[..], &flat[..], &two[..]] {
            assert!(RasterRegion::build(poly, &full, &mut arena).unwrap().is_empty());
        }
        // thinner than one row centre
        let sliver = square(5.0, 10.6, 30.0, 11.4);
        assert!(RasterRegion::build(&sliver, &full, &mut arena).unwrap().is_empty());
    }

    #[test]
    fn attributes_interpolate_down_the_edges() {
        let (mut arena, full) = setup(100, 100);
        let mut poly = square(0.0, 0.0, 10.0, 10.0);
        poly[2].attr = Vec3::splat(1.0);
        poly[3].attr = Vec3::splat(1.0);
        let r = RasterRegion::build(&poly, &full, &mut arena).unwrap();
        let s = r.span(&arena, 4).unwrap();
        assert!((s.left.attr.x - 0.45).abs() < 1e-5);
        assert!((s.right.attr.x - 0.45).abs() < 1e-5);
    }

    #[test]
    fn intersect_contracts_to_parent() {
        let (mut arena, full) = setup(100, 100);
        let parent =
            RasterRegion::build(&square(30.0, 30.0, 70.0, 70.0), &full, &mut arena).unwrap();
        let tri = [sv(10.0, 10.0), sv(90.0, 10.0), sv(50.0, 90.0)];
        let mut r = RasterRegion::build(&tri, &full, &mut arena).unwrap();

        assert!(r.intersect(&parent, &mut arena));
        assert!(r.is_valid(&arena));
        for (y, s) in r.spans(&arena) {
            let p = parent.span(&arena, y).unwrap();
            assert!(s.left.x >= p.left.x && s.right.x <= p.right.x);
        }

        // a second pass is a no-op
        let before: Vec<Span> = r.spans(&arena).map(|(_, s)| *s).collect();
        let handle = r;
        assert!(r.intersect(&parent, &mut arena));
        assert_eq!(r, handle);
        let after: Vec<Span> = r.spans(&arena).map(|(_, s)| *s).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn disjoint_regions_intersect_to_empty() {
        let (mut arena, full) = setup(100, 100);
        let a = RasterRegion::build(&square(0.0, 0.0, 10.0, 10.0), &full, &mut arena).unwrap();
        let mut b =
            RasterRegion::build(&square(50.0, 0.0, 60.0, 10.0), &full, &mut arena).unwrap();
        assert!(!b.intersect(&a, &mut arena));
        assert!(b.is_empty());

        let mut c =
            RasterRegion::build(&square(0.0, 50.0, 10.0, 60.0), &full, &mut arena).unwrap();
        assert!(!c.intersect(&a, &mut arena));
    }

    #[test]
    fn trim_keeps_longest_valid_run() {
        let mut arena = SpanArena::new(64);
        let r = RasterRegion::from_rows(
            3,
            &[(5, 1), (0, 5), (4, 2), (0, 5), (0, 5), (9, 0)],
            &mut arena,
        )
        .unwrap();
        assert_eq!((r.y_min(), r.y_max()), (6, 7));
        assert!(r.is_valid(&arena));
        // the single valid row above the gap is given up
        assert!(r.span(&arena, 4).is_none());
        assert!(!r.contains(&arena, vec2(2.5, 4.5)));

        let none = RasterRegion::from_rows(0, &[(3, 1), (2, 1)], &mut arena).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn clamping_reinterpolates_attributes() {
        let mut s = Span {
            left: SpanEdge {
                x: 0,
                attr: Vec3::ZERO,
            },
            right: SpanEdge {
                x: 10,
                attr: Vec3::splat(10.0),
            },
        };
        s.clamp_to(&Span::new(5, 8));
        assert_eq!(s.left.x, 5);
        assert_eq!(s.right.x, 8);
        assert!((s.left.attr - Vec3::splat(5.0)).length() < 1e-5);
        assert!((s.right.attr - Vec3::splat(8.0)).length() < 1e-5);
    }

    #[test]
    fn contains_respects_pixel_bounds() {
        let (mut arena, full) = setup(100, 100);
        let r = RasterRegion::build(&square(10.0, 10.0, 20.0, 20.0), &full, &mut arena).unwrap();
        assert!(r.contains(&arena, vec2(10.0, 10.0)));
        assert!(r.contains(&arena, vec2(19.9, 19.9)));
        assert!(!r.contains(&arena, vec2(20.0, 15.0)));
        assert!(!r.contains(&arena, vec2(15.0, 9.9)));
    }

    #[test]
    fn clip_line_moves_outside_end_to_boundary() {
        let (mut arena, full) = setup(100, 100);
        let r = RasterRegion::build(&square(20.0, 20.0, 60.0, 60.0), &full, &mut arena).unwrap();
        let bis = Bisection::default();

        let (a, b) = r
            .clip_line(&arena, vec2(40.0, 40.0), vec2(90.0, 40.0), &bis)
            .unwrap();
        assert_eq!(a, vec2(40.0, 40.0));
        assert!(r.contains(&arena, b));
        assert!(b.x <= 60.0 && b.x >= 60.0 - bis.tolerance_px);
    }

    #[test]
    fn clip_line_through_region_with_both_ends_outside() {
        let (mut arena, full) = setup(100, 100);
        let r = RasterRegion::build(&square(20.0, 20.0, 60.0, 60.0), &full, &mut arena).unwrap();
        let bis = Bisection {
            tolerance_px: 0.5,
            max_steps: 32,
        };
        let (a, b) = r
            .clip_line(&arena, vec2(0.0, 30.0), vec2(99.0, 30.0), &bis)
            .unwrap();
        assert!(r.contains(&arena, a) && r.contains(&arena, b));
        assert!(a.x < 21.0 && b.x > 59.0);

        assert!(
            r.clip_line(&arena, vec2(0.0, 5.0), vec2(99.0, 5.0), &bis)
                .is_none()
        );
    }

    #[test]
    fn bisection_is_bounded_by_max_steps() {
        use std::cell::Cell;
        let calls = Cell::new(0);
        let bis = Bisection {
            tolerance_px: 0.0,
            max_steps: 7,
        };
        let p = bisect_boundary(vec2(0.0, 0.0), vec2(100.0, 0.0), &bis, |p| {
            calls.set(calls.get() + 1);
            p.x < 33.0
        });
        assert_eq!(calls.get(), 7);
        assert!(p.x < 33.0 && p.x > 33.0 - 100.0 / 64.0);
    }
}
