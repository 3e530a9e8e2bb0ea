//! ---------------------------------------------------------------------------
//! Software (CPU) span renderer
//!
//! * Fills a `Vec<u32>` frame-buffer in **0xAARRGGBB** format.
//! * Relies on the portal walk to hand over spans that are already clipped
//!   to their visible region, so no Z-buffer is needed.
//! * Texture coordinates are recovered per pixel from the linearly stepped
//!   `(1/z, u/z, v/z)` triple.
//! ---------------------------------------------------------------------------

use glam::Vec3;

use crate::{
    renderer::{Renderer, Rgba, SpanCall},
    world::{Texture, TextureBank},
};

/// World units covered by one repeat of a texture.
const TILE_WORLD_SIZE: f32 = 1.0;

const CLEAR_COLOUR: Rgba = 0xFF_202020;

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

#[derive(Default)]
pub struct Software {
    scratch: Vec<Rgba>,
    width: usize,
    height: usize,
}

impl Software {
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.scratch[y * self.width + x]
    }

    #[inline]
    pub fn frame(&self) -> &[Rgba] {
        &self.scratch
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, col: Rgba) {
        if (0..self.width as i32).contains(&x) && (0..self.height as i32).contains(&y) {
            self.scratch[y as usize * self.width + x as usize] = col;
        }
    }
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize) {
        // (re)allocate if resolution changed
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
        }

        /* dark-grey clear */
        self.scratch.fill(CLEAR_COLOUR);
    }

    fn draw_span(&mut self, span: &SpanCall, bank: &TextureBank) {
        if span.y < 0 || span.y as usize >= self.height {
            return;
        }
        let x0 = span.left.x.max(0);
        let x1 = span.right.x.min(self.width as i32 - 1);
        if x0 > x1 {
            return;
        }

        let row = span.y as usize * self.width;
        if !span.blend.samples_texture() {
            for x in x0..=x1 {
                let px = &mut self.scratch[row + x as usize];
                *px = span.blend.apply(*px, 0);
            }
            return;
        }

        let tex = bank.texture_or_missing(span.tex);
        let step = SpanStep::from_call(span);
        let mut cur = SpanCursor::at(span, &step, x0);
        for x in x0..=x1 {
            let px = &mut self.scratch[row + x as usize];
            *px = span.blend.apply(*px, cur.sample(tex));
            cur.advance(&step);
        }
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, col: Rgba) {
        let mut x0 = x0;
        let mut y0 = y0;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x0, y0, col);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }
}

/*──────────────────────── helper structs ─────────────────────────────*/

/// Per-pixel increment of the perspective attributes along a span.
#[derive(Clone, Copy)]
struct SpanStep {
    dattr: Vec3,
}
impl SpanStep {
    fn from_call(span: &SpanCall) -> Self {
        let w = (span.right.x - span.left.x).max(1) as f32;
        Self {
            dattr: (span.right.attr - span.left.attr) / w,
        }
    }
}

/// Attributes at the current pixel, marching left to right.
#[derive(Clone, Copy)]
struct SpanCursor {
    attr: Vec3,
}
impl SpanCursor {
    fn at(span: &SpanCall, step: &SpanStep, x: i32) -> Self {
        Self {
            attr: span.left.attr + step.dattr * (x - span.left.x) as f32,
        }
    }

    #[inline]
    fn advance(&mut self, s: &SpanStep) {
        self.attr += s.dattr;
    }

    #[inline]
    fn sample(&self, tex: &Texture) -> Rgba {
        let inv_z = self.attr.x;
        if inv_z <= 0.0 {
            return tex.pixels[0];
        }
        let z = 1.0 / inv_z;
        let u = self.attr.y * z / TILE_WORLD_SIZE * tex.w as f32;
        let v = self.attr.z * z / TILE_WORLD_SIZE * tex.h as f32;
        tex.texel(u.floor() as i32, v.floor() as i32)
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::region::SpanEdge, renderer::BlendMode};

    /* tiny helpers ---------------------------------------------------*/
    fn tiny_bank() -> (TextureBank, u16) {
        let mut bank = TextureBank::default_with_checker();
        let blue = bank
            .insert(
                "BLUE",
                Texture {
                    name: "BLUE".into(),
                    w: 4,
                    h: 4,
                    pixels: vec![0xFF_0000FF; 16],
                },
            )
            .unwrap();
        (bank, blue)
    }

    fn span(y: i32, l: i32, r: i32, tex: u16, blend: BlendMode) -> SpanCall {
        SpanCall {
            y,
            left: SpanEdge {
                x: l,
                attr: Vec3::new(1.0, 0.0, 0.0),
            },
            right: SpanEdge {
                x: r,
                attr: Vec3::new(1.0, 1.0, 0.0),
            },
            tex,
            blend,
        }
    }

    #[test]
    fn software_renders_span() {
        let (bank, blue) = tiny_bank();
        let mut sw = Software::default();
        sw.begin_frame(8, 8);
        sw.draw_span(&span(3, 1, 5, blue, BlendMode::Replace), &bank);

        for x in 1..=5 {
            assert_eq!(sw.pixel(x, 3), 0xFF_0000FF);
        }
        assert_eq!(sw.pixel(0, 3), CLEAR_COLOUR);
        assert_eq!(sw.pixel(6, 3), CLEAR_COLOUR);
        assert_eq!(sw.pixel(3, 2), CLEAR_COLOUR);
    }

    #[test]
    fn off_screen_parts_are_dropped() {
        let (bank, blue) = tiny_bank();
        let mut sw = Software::default();
        sw.begin_frame(4, 4);
        sw.draw_span(&span(1, -10, 10, blue, BlendMode::Replace), &bank);
        sw.draw_span(&span(9, 0, 3, blue, BlendMode::Replace), &bank);
        assert!((0..4).all(|x| sw.pixel(x, 1) == 0xFF_0000FF));
    }

    #[test]
    fn blend_modes_combine_with_frame() {
        let (bank, blue) = tiny_bank();
        let mut sw = Software::default();
        sw.begin_frame(4, 1);
        sw.draw_span(&span(0, 0, 3, 0, BlendMode::Colour(0xFF_FF00FF)), &bank);
        sw.draw_span(&span(0, 0, 0, blue, BlendMode::And), &bank);
        sw.draw_span(&span(0, 1, 1, blue, BlendMode::Xor), &bank);
        sw.draw_span(&span(0, 2, 2, blue, BlendMode::Or), &bank);

        assert_eq!(sw.pixel(0, 0), 0xFF_0000FF);
        assert_eq!(sw.pixel(1, 0), 0xFF_FF0000);
        assert_eq!(sw.pixel(2, 0), 0xFF_FF00FF);
        assert_eq!(sw.pixel(3, 0), 0xFF_FF00FF);
    }

    #[test]
    fn texture_is_sampled_perspective_correct() {
        // u runs 0 → 1 world unit while depth doubles: the midpoint of the
        // span is at u = 1/3, not 1/2 as affine mapping would give
        let mut bank = TextureBank::default_with_checker();
        let ramp = bank
            .insert(
                "RAMP",
                Texture {
                    name: "RAMP".into(),
                    w: 4,
                    h: 1,
                    pixels: vec![10, 20, 30, 40],
                },
            )
            .unwrap();
        let call = SpanCall {
            y: 0,
            left: SpanEdge {
                x: 0,
                attr: Vec3::new(1.0, 0.0, 0.0),
            },
            right: SpanEdge {
                x: 10,
                attr: Vec3::new(0.5, 0.5 * 0.999, 0.0),
            },
            tex: ramp,
            blend: BlendMode::Replace,
        };
        let mut sw = Software::default();
        sw.begin_frame(11, 1);
        sw.draw_span(&call, &bank);

        assert_eq!(sw.pixel(0, 0), 10);
        // at x = 5: 1/z = 0.75, u/z ≈ 0.25 → u ≈ 1/3 → texel 1
        assert_eq!(sw.pixel(5, 0), 20);
        assert_eq!(sw.pixel(10, 0), 40);
    }

    #[test]
    fn bresenham_hits_both_ends() {
        let mut sw = Software::default();
        sw.begin_frame(8, 8);
        sw.draw_line(1, 1, 6, 4, 0xFF_FFFFFF);
        assert_eq!(sw.pixel(1, 1), 0xFF_FFFFFF);
        assert_eq!(sw.pixel(6, 4), 0xFF_FFFFFF);
        let lit = sw.frame().iter().filter(|&&p| p == 0xFF_FFFFFF).count();
        assert_eq!(lit, 6);

        // clipped at the frame edge without panicking
        sw.draw_line(-5, 2, 20, 2, 0xFF_00FF00);
        assert!((0..8).all(|x| sw.pixel(x, 2) == 0xFF_00FF00));
    }

    #[test]
    fn end_frame_loans_buffer() {
        let mut sw = Software::default();
        sw.begin_frame(3, 2);
        let mut seen = (0, 0, 0);
        sw.end_frame(|fb, w, h| seen = (fb.len(), w, h));
        assert_eq!(seen, (6, 3, 2));
    }
}
