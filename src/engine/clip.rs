//! ---------------------------------------------------------------------------
//! Convex polygon clipping against half-spaces (Sutherland–Hodgman)
//!
//! * Vertices carry their texture coordinate and the cell edge that the
//!   polygon edge *starting* at them lies on, so edges survive clipping with
//!   their identity intact.
//! * Every cut edge gets exactly one new vertex on the plane; edges that run
//!   along a clip plane carry no cell edge and are never outlined.
//! ---------------------------------------------------------------------------

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::{
    engine::plane::{Frustum, Plane},
    world::geometry::EdgeId,
};

/// Inline capacity of a polygon buffer.  A prism base is at most a decagon
/// and each of the five frustum planes adds at most one vertex.
pub const POLY_INLINE: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipVertex {
    pub pos: Vec3,
    pub uv: Vec2,
    /// Cell edge between this vertex and the next one, if it should be drawn.
    pub edge: Option<EdgeId>,
}

impl ClipVertex {
    pub fn new(pos: Vec3, uv: Vec2, edge: Option<EdgeId>) -> Self {
        Self { pos, uv, edge }
    }
}

pub type Polygon3 = SmallVec<[ClipVertex; POLY_INLINE]>;

/// Clip `poly` to the inside of `plane`.
///
/// Returns `None` when fewer than three vertices survive.  A vertex lying
/// exactly on the plane counts as inside.
pub fn clip_polygon(poly: &[ClipVertex], plane: &Plane) -> Option<Polygon3> {
    if poly.len() < 3 {
        return None;
    }

    let mut dist: SmallVec<[f32; POLY_INLINE]> = SmallVec::with_capacity(poly.len());
    let mut outside = 0;
    for v in poly {
        let d = plane.distance(v.pos);
        if d < 0.0 {
            outside += 1;
        }
        dist.push(d);
    }
    if outside == poly.len() {
        return None;
    }
    if outside == 0 {
        return Some(poly.iter().copied().collect());
    }

    let mut out = Polygon3::new();
    for i in 0..poly.len() {
        let j = (i + 1) % poly.len();
        let (a, b) = (&poly[i], &poly[j]);
        let (da, db) = (dist[i], dist[j]);
        let a_in = da >= 0.0;
        let b_in = db >= 0.0;

        if a_in {
            out.push(*a);
        }
        if a_in == b_in {
            continue;
        }

        // from the inside end towards the outside end
        let (inside, outside, d_in, d_out) = if a_in { (a, b, da, db) } else { (b, a, db, da) };
        let Some(t) = crossing(d_in, d_out) else {
            continue;
        };
        let pos = inside.pos.lerp(outside.pos, t);
        let uv = inside.uv.lerp(outside.uv, t);

        // Leaving: the new vertex starts the edge along the plane.
        // Entering: it starts the remaining part of the original edge a→b.
        let edge = if a_in { None } else { a.edge };
        out.push(ClipVertex { pos, uv, edge });
    }

    (out.len() >= 3).then_some(out)
}

/// Fold [`clip_polygon`] over every plane of `frustum`, stopping at the
/// first plane that removes the polygon completely.
pub fn clip_to_frustum(poly: &[ClipVertex], frustum: &Frustum) -> Option<Polygon3> {
    let mut cur: Polygon3 = poly.iter().copied().collect();
    for plane in frustum.planes() {
        cur = clip_polygon(&cur, plane)?;
    }
    (cur.len() >= 3).then_some(cur)
}

/// Fraction from the inside end of an edge to where it meets the plane.
///
/// Both magnitudes are taken as absolute values so the result never depends
/// on which side the edge started.  `None` flags an edge whose distances
/// cancel out (parallel to the plane within float precision).
#[inline]
fn crossing(d_in: f32, d_out: f32) -> Option<f32> {
    let a = d_in.abs();
    let denom = a + d_out.abs();
    if denom <= f32::EPSILON {
        return None;
    }
    Some((a / denom).clamp(0.0, 1.0))
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
