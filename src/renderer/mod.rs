//! Rendering abstraction layer.
//!
//! *The visibility core never touches a pixel buffer directly.*
//! It emits one [`SpanCall`] per visible scan-line and one line per drawn
//! edge, front-to-back, to a type that implements [`Renderer`].
//!
//! * Back-ends are swappable without touching the portal walk.
//! * How a span combines with the frame-buffer is a [`BlendMode`] carried
//!   by the call, not a property of the back-end.

use crate::{
    engine::region::SpanEdge,
    world::{TextureBank, TextureId},
};

/// Pixel format of the software frame-buffer (0xAARRGGBB).
pub type Rgba = u32;

/// How a source pixel combines with what is already in the frame-buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Overwrite with the texel.
    #[default]
    Replace,
    And,
    Or,
    /// Toggle the colour bits; alpha is kept.
    Xor,
    /// Flat fill, the texture is ignored.
    Colour(Rgba),
}

impl BlendMode {
    #[inline]
    pub fn apply(self, dst: Rgba, src: Rgba) -> Rgba {
        match self {
            BlendMode::Replace => src,
            BlendMode::And => dst & src,
            BlendMode::Or => dst | src,
            BlendMode::Xor => (dst ^ src) & 0x00FF_FFFF | dst & 0xFF00_0000,
            BlendMode::Colour(c) => c,
        }
    }

    /// Does this mode look at the texture at all?
    #[inline]
    pub fn samples_texture(self) -> bool {
        !matches!(self, BlendMode::Colour(_))
    }
}

/// One visible scan-line of a wall.
///
/// Columns `left.x ..= right.x` on row `y`; both ends carry the
/// perspective attributes `(1/z, u/z, v/z)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpanCall {
    pub y: i32,
    pub left: SpanEdge,
    pub right: SpanEdge,
    pub tex: TextureId,
    pub blend: BlendMode,
}

impl SpanCall {
    #[inline]
    pub fn width(&self) -> i32 {
        self.right.x - self.left.x + 1
    }
}

/// A renderer that owns an internal scratch buffer for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
/// Software callers typically forward it to their window-manager;
/// back-ends without a CPU buffer pass an empty slice.
pub trait Renderer {
    /// (Re)allocate internal scratch for the requested resolution and clear it.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Rasterise one span.  Columns outside the frame are ignored.
    fn draw_span(&mut self, span: &SpanCall, bank: &TextureBank);

    /// Draw a one-pixel line between two pixel positions, both inclusive.
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, colour: Rgba);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    ///
    /// * `submit(&[Rgba], w, h)` is run exactly once per frame.
    /// * Software caller passes `|fb, w, h| window.update_with_buffer(fb, w, h)`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

mod recorder;
pub mod software;

pub use recorder::{LineCall, Recorder};
pub use software::Software;
