//! ---------------------------------------------------------------------------
//! Recursive portal walk
//!
//! Starting in the camera's cell with the whole screen as visible region:
//!
//! 1. every front-facing wall of the cell is clipped to the frustum,
//!    projected, turned into a raster region, cut down to the current region
//!    and emitted span by span;
//! 2. its tagged edges are clipped to the current region and drawn once per
//!    cell per frame;
//! 3. every front-facing portal whose neighbour was not entered this frame
//!    is near-clipped, projected and intersected with the current region;
//!    a non-empty result becomes the neighbour's region and the walk
//!    recurses.
//!
//! All regions of a visit live in the span arena between the visit's mark
//! and the matching rewind.
//! ---------------------------------------------------------------------------

use glam::{Vec2, Vec3};

use crate::{
    engine::{
        arena::ArenaError,
        clip::{ClipVertex, Polygon3, clip_to_frustum},
        context::{FrameStats, RenderContext},
        plane::Frustum,
        projection::{Polygon2, Projector},
        region::RasterRegion,
        types::{DrawFlags, RenderConfig},
    },
    renderer::{Renderer, Rgba, SpanCall},
    world::{Camera, CellId, EdgeId, Face, Level, Portal, Segment, TextureBank},
};

/// Read-only inputs of one frame.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub level: &'a Level,
    pub camera: &'a Camera,
    pub textures: &'a TextureBank,
}

pub struct PortalWalk<'a, R: Renderer> {
    scene: Scene<'a>,
    config: &'a RenderConfig,
    renderer: &'a mut R,
    ctx: &'a mut RenderContext,
    projector: Projector,
    frustum: Frustum,
    near_only: Frustum,
}

impl<'a, R: Renderer> PortalWalk<'a, R> {
    pub fn new(
        scene: Scene<'a>,
        config: &'a RenderConfig,
        renderer: &'a mut R,
        ctx: &'a mut RenderContext,
    ) -> Self {
        let screen = config.screen();
        let view = config.viewer();
        Self {
            scene,
            config,
            renderer,
            ctx,
            projector: Projector::new(screen, view),
            frustum: Frustum::from_viewer(&screen, &view),
            near_only: Frustum::near_only(view.near),
        }
    }

    /// Walk the whole visible cell graph.  The context must already be
    /// prepared with [`RenderContext::begin_frame`].
    pub fn run(mut self) -> FrameStats {
        let start = self.scene.camera.cell();
        if start as usize >= self.scene.level.len() {
            log::warn!("camera cell {start} is not part of the level");
            return self.ctx.stats;
        }
        let screen = *self.projector.screen();
        let mark = self.ctx.arena.mark();
        match RasterRegion::full_screen(&screen, &mut self.ctx.arena) {
            Ok(root) => self.visit(start, root),
            Err(e) => self.overflow(e),
        }
        self.ctx.arena.rewind(mark);
        self.ctx.stats.peak_spans = self.ctx.arena.peak();
        self.ctx.stats
    }

    fn visit(&mut self, cell: CellId, region: RasterRegion) {
        let entry = self.ctx.arena.mark();
        self.ctx.stamp(cell);
        self.ctx.enter();
        self.ctx.stats.cells_visited += 1;
        log::trace!(
            "enter cell {cell} at depth {} (rows {}..={})",
            self.ctx.depth(),
            region.y_min(),
            region.y_max()
        );

        let level = self.scene.level;
        let seg = level.segment(cell);
        let eye = self.scene.camera.pos();

        for face in seg.faces.iter().filter(|f| f.neighbor.is_none()) {
            if face.plane.distance(eye) > 0.0 {
                self.draw_wall(cell, seg, face, region);
            }
        }

        for (fi, face) in seg.faces.iter().enumerate() {
            let Some(next) = face.neighbor else {
                continue;
            };
            let dist = face.plane.distance(eye);
            if dist <= 0.0 {
                continue;
            }
            for portal in &face.portals {
                if self.ctx.is_rendered(next) {
                    break;
                }
                let doorway = dist < self.config.near && outline_contains(portal, face, eye);
                self.enter_portal(cell, fi, next, portal, region, doorway);
            }
        }

        self.ctx.leave();
        self.ctx.arena.rewind(entry);
    }

    /*──────────────────────────── Walls ─────────────────────────────*/

    fn draw_wall(&mut self, cell: CellId, seg: &Segment, face: &Face, region: RasterRegion) {
        let poly = self.face_polygon(seg, face);
        let Some(clipped) = clip_to_frustum(&poly, &self.frustum) else {
            return;
        };
        let screen = self.projector.project_polygon(&clipped);
        let mark = self.ctx.arena.mark();

        if self.config.draw.contains(DrawFlags::WALLS) {
            match RasterRegion::build(&screen, &region, &mut self.ctx.arena) {
                Ok(mut wall) => {
                    if wall.intersect(&region, &mut self.ctx.arena) {
                        self.emit_spans(wall, face);
                    }
                }
                Err(e) => self.overflow(e),
            }
        }
        if self.config.draw.contains(DrawFlags::EDGES) {
            self.draw_edges(cell, &screen, region);
        }

        self.ctx.arena.rewind(mark);
    }

    fn emit_spans(&mut self, wall: RasterRegion, face: &Face) {
        debug_assert!(wall.is_valid(&self.ctx.arena), "inverted span survived intersection");
        let mut count = 0;
        for (y, span) in wall.spans(&self.ctx.arena) {
            self.renderer.draw_span(
                &SpanCall {
                    y,
                    left: span.left,
                    right: span.right,
                    tex: face.texture,
                    blend: self.config.blend,
                },
                self.scene.textures,
            );
            count += 1;
        }
        self.ctx.stats.spans += count;
        self.ctx.stats.walls_drawn += 1;
    }

    /// Draw the tagged polygon edges not yet drawn in this cell.
    fn draw_edges(&mut self, cell: CellId, poly: &Polygon2, region: RasterRegion) {
        for (i, a) in poly.iter().enumerate() {
            let Some(edge) = a.edge else {
                continue;
            };
            if self.ctx.edge_drawn(cell, edge) {
                self.ctx.stats.edges_skipped += 1;
                continue;
            }
            let b = &poly[(i + 1) % poly.len()];
            self.draw_clipped_line(region, a.pos, b.pos, self.config.edge_colour);
            self.ctx.mark_edge(cell, edge);
        }
    }

    fn draw_clipped_line(&mut self, region: RasterRegion, a: Vec2, b: Vec2, colour: Rgba) {
        let Some((p, q)) = region.clip_line(&self.ctx.arena, a, b, &self.config.bisection) else {
            return;
        };
        self.renderer.draw_line(
            p.x.floor() as i32,
            p.y.floor() as i32,
            q.x.floor() as i32,
            q.y.floor() as i32,
            colour,
        );
        self.ctx.stats.lines += 1;
    }

    /*──────────────────────────── Portals ───────────────────────────*/

    fn enter_portal(
        &mut self,
        cell: CellId,
        face: usize,
        next: CellId,
        portal: &Portal,
        region: RasterRegion,
        doorway: bool,
    ) {
        self.ctx.stats.portals_tested += 1;
        let mark = self.ctx.arena.mark();

        let visible = if doorway {
            // the near plane swallows the outline; the neighbour shares our view
            Some((region, Polygon2::new()))
        } else {
            self.portal_region(portal, region)
        };

        let Some((child, screen)) = visible else {
            log::trace!("cell {cell} face {face} -> {next}: invisible");
            self.ctx.stats.portals_culled += 1;
            self.ctx.arena.rewind(mark);
            return;
        };

        if self.config.draw.contains(DrawFlags::PORTAL_OUTLINES) {
            for (i, a) in screen.iter().enumerate() {
                if a.edge.is_some() {
                    let b = screen[(i + 1) % screen.len()].pos;
                    self.draw_clipped_line(region, a.pos, b, self.config.outline_colour);
                }
            }
        }

        if self.ctx.depth() >= self.config.max_depth {
            log::debug!(
                "depth cap {} reached at cell {cell}, not entering {next}",
                self.config.max_depth
            );
            self.ctx.stats.depth_truncations += 1;
            self.ctx.arena.rewind(mark);
            return;
        }

        log::trace!(
            "cell {cell} face {face} -> {next}: visible rows {}..={}",
            child.y_min(),
            child.y_max()
        );
        // the shared outline was drawn from this side already
        if let Some(back) = self.scene.level.opposite_face(cell, next) {
            let mask = self.scene.level.segment(next).faces[back as usize].edge_mask();
            self.ctx.mark_edges(next, mask);
        }
        self.visit(next, child);
        self.ctx.arena.rewind(mark);
    }

    /// Near-clip, project and cut the portal down to `region`.
    fn portal_region(
        &mut self,
        portal: &Portal,
        region: RasterRegion,
    ) -> Option<(RasterRegion, Polygon2)> {
        let clipped = clip_to_frustum(&self.portal_polygon(portal), &self.near_only)?;
        let screen = self.projector.project_polygon(&clipped);
        match RasterRegion::build(&screen, &region, &mut self.ctx.arena) {
            Ok(mut child) => child
                .intersect(&region, &mut self.ctx.arena)
                .then_some((child, screen)),
            Err(e) => {
                self.overflow(e);
                None
            }
        }
    }

    /*──────────────────────────── Geometry ──────────────────────────*/

    /// Camera-space outline of a wall, every edge tagged with its cell edge.
    fn face_polygon(&self, seg: &Segment, face: &Face) -> Polygon3 {
        let cam = self.scene.camera;
        face.corners
            .iter()
            .zip(&face.uvs)
            .zip(&face.edges)
            .map(|((&c, &uv), &e)| {
                ClipVertex::new(cam.to_cam(seg.vertices[c as usize]), uv, Some(e))
            })
            .collect()
    }

    /// Camera-space portal outline; tags index the outline's own edges.
    fn portal_polygon(&self, portal: &Portal) -> Polygon3 {
        let cam = self.scene.camera;
        portal
            .outline
            .iter()
            .enumerate()
            .map(|(i, &p)| ClipVertex::new(cam.to_cam(p), Vec2::ZERO, Some(i as EdgeId)))
            .collect()
    }

    /// Arena exhaustion is fatal in debug builds; release builds drop the
    /// branch and keep going.
    fn overflow(&mut self, e: ArenaError) {
        log::error!("{e}; skipping branch at depth {}", self.ctx.depth());
        self.ctx.stats.arena_overflows += 1;
        if cfg!(debug_assertions) {
            panic!("{e}");
        }
    }
}

/// Whether `p`, projected onto the portal's face, lies inside its outline.
fn outline_contains(portal: &Portal, face: &Face, p: Vec3) -> bool {
    let n = face.plane.normal;
    let ring = &portal.outline;
    let mut sign = 0.0_f32;
    for (i, &a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let s = (b - a).cross(p - a).dot(n);
        if s * sign < 0.0 {
            return false;
        }
        if s != 0.0 {
            sign = s;
        }
    }
    !ring.is_empty()
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
