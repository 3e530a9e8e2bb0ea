use crate::{
    renderer::{Renderer, Rgba, SpanCall},
    world::TextureBank,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCall {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub colour: Rgba,
}

/// Back-end that only remembers what it was asked to draw.
///
/// Used by tests and benchmarks to inspect the output of the portal walk
/// without rasterising.
#[derive(Default, Debug)]
pub struct Recorder {
    pub spans: Vec<SpanCall>,
    pub lines: Vec<LineCall>,
    pub frames: usize,
    width: usize,
    height: usize,
}

impl Recorder {
    /// Number of pixels covered by all recorded spans.
    pub fn covered_pixels(&self) -> usize {
        self.spans.iter().map(|s| s.width().max(0) as usize).sum()
    }

    /// Pixels hit by more than one span, counted once per extra hit.
    pub fn overdrawn_pixels(&self) -> usize {
        let mut hits = vec![0u8; self.width * self.height];
        let mut extra = 0;
        for s in &self.spans {
            if s.y < 0 || s.y as usize >= self.height {
                continue;
            }
            for x in s.left.x.max(0)..=s.right.x.min(self.width as i32 - 1) {
                let h = &mut hits[s.y as usize * self.width + x as usize];
                if *h > 0 {
                    extra += 1;
                }
                *h = h.saturating_add(1);
            }
        }
        extra
    }
}

impl Renderer for Recorder {
    fn begin_frame(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.spans.clear();
        self.lines.clear();
    }

    fn draw_span(&mut self, span: &SpanCall, _bank: &TextureBank) {
        self.spans.push(*span);
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, colour: Rgba) {
        self.lines.push(LineCall {
            x0,
            y0,
            x1,
            y1,
            colour,
        });
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        self.frames += 1;
        submit(&[], self.width, self.height);
    }
}
