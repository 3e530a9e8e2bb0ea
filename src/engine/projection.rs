use glam::{Vec2, Vec3, vec2, vec3};
use smallvec::SmallVec;

use crate::{
    engine::{
        clip::{ClipVertex, POLY_INLINE},
        types::{Screen, Viewer},
    },
    world::geometry::EdgeId,
};

/// A projected vertex.  `attr` holds the perspective-correct attributes
/// `(1/z, u/z, v/z)` which interpolate linearly in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenVertex {
    pub pos: Vec2,
    pub attr: Vec3,
    pub edge: Option<EdgeId>,
}

pub type Polygon2 = SmallVec<[ScreenVertex; POLY_INLINE]>;

/// Perspective divide from camera space onto the frame-buffer.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    screen: Screen,
    view: Viewer,
}

impl Projector {
    pub fn new(screen: Screen, view: Viewer) -> Self {
        Self { screen, view }
    }

    #[inline]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Camera-space point → screen point.  The point must already be in
    /// front of the near plane.
    #[inline]
    pub fn project_point(&self, p: Vec3) -> Vec2 {
        debug_assert!(
            p.z >= self.view.near * 0.999,
            "projecting a point behind the near plane (z = {})",
            p.z
        );
        let inv_z = 1.0 / p.z;
        vec2(
            self.screen.half_w + p.x * self.view.focal * inv_z,
            self.screen.half_h - p.y * self.view.focal * inv_z,
        )
    }

    pub fn project(&self, v: &ClipVertex) -> ScreenVertex {
        let inv_z = 1.0 / v.pos.z;
        ScreenVertex {
            pos: self.project_point(v.pos),
            attr: vec3(inv_z, v.uv.x * inv_z, v.uv.y * inv_z),
            edge: v.edge,
        }
    }

    /// Project every vertex of an already near-clipped polygon.
    pub fn project_polygon(&self, poly: &[ClipVertex]) -> Polygon2 {
        poly.iter().map(|v| self.project(v)).collect()
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
