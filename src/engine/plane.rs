//! Oriented half-spaces and the camera frustum built from them.

use glam::Vec3;
use smallvec::SmallVec;

use crate::engine::types::{Screen, Viewer};

/// Below this squared length a cross product is treated as zero.
const DEGENERATE_EPS: f32 = 1e-12;

/// Half-space `dot(normal, p) >= d`.
///
/// Points with `dot(normal, p) < d` are *outside*.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    /// Build a plane from a (not necessarily unit) normal and offset.
    /// The offset is rescaled along with the normal so the half-space is
    /// unchanged.
    pub fn new(normal: Vec3, d: f32) -> Self {
        let len = normal.length();
        debug_assert!(len > 0.0, "plane normal must not be zero");
        Self {
            normal: normal / len,
            d: d / len,
        }
    }

    /// Plane through three points, `None` when they are collinear.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let n = (b - a).cross(c - a);
        let len_sq = n.length_squared();
        if len_sq < DEGENERATE_EPS {
            return None;
        }
        let normal = n / len_sq.sqrt();
        Some(Self {
            normal,
            d: normal.dot(a),
        })
    }

    /// Signed distance; negative means outside.
    #[inline(always)]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.d
    }

    #[inline(always)]
    pub fn contains(&self, p: Vec3) -> bool {
        self.distance(p) >= 0.0
    }

    /// Same plane, opposite inside.
    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }

    /// Orient the plane so that `inside` lies in the kept half-space.
    pub fn facing(self, inside: Vec3) -> Self {
        if self.distance(inside) < 0.0 {
            self.flipped()
        } else {
            self
        }
    }
}

/// A list of planes bounding the visible part of camera space.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    planes: SmallVec<[Plane; 6]>,
}

impl Frustum {
    /// Near, left, right, top and bottom planes in camera space
    /// (x right, y up, z forward) for a pinhole of focal length
    /// `view.focal` pixels.
    pub fn from_viewer(screen: &Screen, view: &Viewer) -> Self {
        let f = view.focal;
        let mut planes = SmallVec::new();
        planes.push(Plane::new(Vec3::Z, view.near));
        // x·f/z >= -half_w   ⇔   f·x + half_w·z >= 0
        planes.push(Plane::new(Vec3::new(f, 0.0, screen.half_w), 0.0));
        planes.push(Plane::new(Vec3::new(-f, 0.0, screen.half_w), 0.0));
        // screen y grows downwards, camera y upwards
        planes.push(Plane::new(Vec3::new(0.0, -f, screen.half_h), 0.0));
        planes.push(Plane::new(Vec3::new(0.0, f, screen.half_h), 0.0));
        Self { planes }
    }

    /// Only the near plane; used for portal outlines whose sides are
    /// handled by the raster region instead.
    pub fn near_only(near: f32) -> Self {
        let mut planes = SmallVec::new();
        planes.push(Plane::new(Vec3::Z, near));
        Self { planes }
    }

    #[inline]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.planes.iter().all(|pl| pl.contains(p))
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
