//! Stack-discipline storage for raster-region spans.
//!
//! A visit marks the arena on entry and rewinds on exit, so sibling portal
//! branches reuse the same slots.  Nothing is freed individually.

use std::ops::Range;

use thiserror::Error;

use crate::engine::region::Span;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArenaError {
    #[error("span arena exhausted: {requested} spans requested, {used}/{capacity} in use")]
    Exhausted {
        requested: usize,
        used: usize,
        capacity: usize,
    },
}

/// High-water mark returned by [`SpanArena::mark`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaMark(usize);

pub struct SpanArena {
    spans: Vec<Span>,
    cursor: usize,
    capacity: usize,
    peak: usize,
}

impl SpanArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            spans: Vec::new(),
            cursor: 0,
            capacity,
            peak: 0,
        }
    }

    /// Allocate `len` consecutive spans and return the index range that
    /// was handed out.  Slots are zeroed.
    pub fn alloc(&mut self, len: usize) -> Result<Range<usize>, ArenaError> {
        let start = self.cursor;
        let end = start + len;
        if end > self.capacity {
            return Err(ArenaError::Exhausted {
                requested: len,
                used: self.cursor,
                capacity: self.capacity,
            });
        }
        if end > self.spans.len() {
            let grown = end.next_power_of_two().min(self.capacity);
            self.spans.resize(grown, Span::default());
        }
        self.spans[start..end].fill(Span::default());
        self.cursor = end;
        self.peak = self.peak.max(end);
        Ok(start..end)
    }

    #[inline]
    pub fn mark(&self) -> ArenaMark {
        ArenaMark(self.cursor)
    }

    /// Release every allocation made after `mark`.
    #[inline]
    pub fn rewind(&mut self, mark: ArenaMark) {
        debug_assert!(mark.0 <= self.cursor, "rewinding forward");
        self.cursor = mark.0;
    }

    /// Start of frame: drop everything, keep the backing memory.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.peak = 0;
    }

    #[inline]
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Largest number of live spans since the last [`reset`](Self::reset).
    #[inline]
    pub fn peak(&self) -> usize {
        self.peak
    }

    #[inline]
    pub fn get(&self, idx: usize) -> &Span {
        &self.spans[idx]
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> &mut Span {
        &mut self.spans[idx]
    }

    #[inline]
    pub fn slice(&self, range: Range<usize>) -> &[Span] {
        &self.spans[range]
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
