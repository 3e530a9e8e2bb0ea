//! Per-frame render state threaded through the portal walk.

use std::fmt;

use crate::{
    engine::arena::SpanArena,
    world::{CellId, EdgeId},
};

/// Which edges of a cell were already drawn this frame, by the cell itself
/// or by a neighbour sharing the edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeState {
    pub bits: u32,
    pub frame: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellState {
    /// Frame in which the cell was last entered; `0` = never.
    pub rendered_frame: u32,
    pub edges: EdgeState,
}

/// Counters for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub cells_visited: u32,
    pub portals_tested: u32,
    pub portals_culled: u32,
    pub walls_drawn: u32,
    pub spans: u32,
    pub lines: u32,
    /// Edges not drawn because their bit was already set.
    pub edges_skipped: u32,
    pub depth_truncations: u32,
    pub arena_overflows: u32,
    pub max_depth: u32,
    pub peak_spans: usize,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cells {} | portals {}/{} culled | walls {} | spans {} | lines {} (skipped {}) | depth {} (cut {}) | arena peak {} (overflows {})",
            self.cells_visited,
            self.portals_culled,
            self.portals_tested,
            self.walls_drawn,
            self.spans,
            self.lines,
            self.edges_skipped,
            self.max_depth,
            self.depth_truncations,
            self.peak_spans,
            self.arena_overflows,
        )
    }
}

/// Everything the walk mutates, passed by `&mut` instead of living in
/// globals.  Survives across frames so cell state and arena memory are
/// reused.
pub struct RenderContext {
    pub arena: SpanArena,
    pub stats: FrameStats,
    frame: u32,
    depth: u32,
    cells: Vec<CellState>,
}

impl RenderContext {
    pub fn new(cell_count: usize, arena_spans: usize) -> Self {
        Self {
            arena: SpanArena::new(arena_spans),
            stats: FrameStats::default(),
            frame: 0,
            depth: 0,
            cells: vec![CellState::default(); cell_count],
        }
    }

    /// Advance the frame stamp and drop last frame's scratch.  Cell state
    /// is not touched; it goes stale by stamp comparison.
    pub fn begin_frame(&mut self, cell_count: usize) {
        self.frame = self.frame.wrapping_add(1);
        if self.frame == 0 {
            // stamp 0 means "never": clear everything on wrap
            self.frame = 1;
            self.cells.fill(CellState::default());
        }
        if self.cells.len() != cell_count {
            self.cells.resize(cell_count, CellState::default());
        }
        self.arena.reset();
        self.depth = 0;
        self.stats = FrameStats::default();
    }

    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn enter(&mut self) {
        self.depth += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
    }

    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced leave");
        self.depth -= 1;
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> &CellState {
        &self.cells[id as usize]
    }

    /// Was `id` already entered this frame?
    #[inline]
    pub fn is_rendered(&self, id: CellId) -> bool {
        self.cells[id as usize].rendered_frame == self.frame
    }

    pub fn stamp(&mut self, id: CellId) {
        self.cells[id as usize].rendered_frame = self.frame;
    }

    /// Edge bits of `id` valid for the current frame.
    pub fn edge_bits(&self, id: CellId) -> u32 {
        let e = &self.cells[id as usize].edges;
        if e.frame == self.frame { e.bits } else { 0 }
    }

    fn edges_mut(&mut self, id: CellId) -> &mut EdgeState {
        let frame = self.frame;
        let e = &mut self.cells[id as usize].edges;
        if e.frame != frame {
            *e = EdgeState { bits: 0, frame };
        }
        e
    }

    #[inline]
    pub fn edge_drawn(&self, id: CellId, edge: EdgeId) -> bool {
        self.edge_bits(id) & (1 << edge) != 0
    }

    pub fn mark_edge(&mut self, id: CellId, edge: EdgeId) {
        self.edges_mut(id).bits |= 1 << edge;
    }

    pub fn mark_edges(&mut self, id: CellId, mask: u32) {
        self.edges_mut(id).bits |= mask;
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
