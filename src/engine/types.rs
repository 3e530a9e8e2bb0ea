use bitflags::bitflags;

use crate::renderer::BlendMode;

/// Constants that depend on the *frame-buffer*, not on the level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Screen {
    pub w: usize,
    pub h: usize,
    pub half_w: f32, // pre-derived for speed
    pub half_h: f32, // pre-derived for speed
}

impl Screen {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            half_w: w as f32 * 0.5,
            half_h: h as f32 * 0.5,
        }
    }
}

/// Camera state reused by every raster unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewer {
    pub focal: f32,
    pub near: f32,
}

bitflags! {
    /// Optional drawing passes on top of the textured walls.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DrawFlags: u8 {
        const WALLS           = 0x01;
        const EDGES           = 0x02;
        const PORTAL_OUTLINES = 0x04;
    }
}

/// Parameters of the iterative boundary search used when a boundary has
/// no closed form (a span table is not a line).
///
/// The search stops once the bracketing points are closer than
/// `tolerance_px` pixels, or after `max_steps` halvings, whichever is first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bisection {
    pub tolerance_px: f32,
    pub max_steps: u32,
}

impl Default for Bisection {
    fn default() -> Self {
        Self {
            tolerance_px: 2.0,
            max_steps: 24,
        }
    }
}

/// Hard recursion cap for the portal walk.
pub const MAX_PORTAL_DEPTH: u32 = 16;

/// Everything the engine needs to know that is not level or camera data.
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Horizontal field of view in radians.
    pub fov: f32,
    /// Distance of the near clipping plane in world units.
    pub near: f32,
    pub max_depth: u32,
    /// Upper bound on live spans in the frame arena.
    pub arena_spans: usize,
    pub bisection: Bisection,
    pub blend: BlendMode,
    pub draw: DrawFlags,
    pub edge_colour: u32,
    pub outline_colour: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 400,
            fov: 90_f32.to_radians(),
            near: 0.05,
            max_depth: MAX_PORTAL_DEPTH,
            arena_spans: 1 << 16,
            bisection: Bisection::default(),
            blend: BlendMode::Replace,
            draw: DrawFlags::WALLS | DrawFlags::EDGES,
            edge_colour: 0xFF_FFFFFF,
            outline_colour: 0xFF_FF4040,
        }
    }
}

impl RenderConfig {
    #[inline]
    pub fn screen(&self) -> Screen {
        Screen::new(self.width, self.height)
    }

    /// Pixel-per-unit scale at depth 1 for the configured width and FoV.
    ///
    /// ```text
    /// focal = w / (2 * tan(fov/2))
    /// ```
    #[inline]
    pub fn focal(&self) -> f32 {
        (self.width as f32) * 0.5 / (self.fov * 0.5).tan()
    }

    #[inline]
    pub fn viewer(&self) -> Viewer {
        Viewer {
            focal: self.focal(),
            near: self.near,
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
