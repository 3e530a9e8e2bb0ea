pub mod arena;
pub mod clip;
pub mod context;
mod engine;
pub mod plane;
pub mod projection;
pub mod region;
pub mod traversal;
pub mod types;

pub use arena::{ArenaError, ArenaMark, SpanArena};
pub use clip::{ClipVertex, Polygon3, clip_polygon, clip_to_frustum};
pub use context::{CellState, EdgeState, FrameStats, RenderContext};
pub use engine::Engine;
pub use plane::{Frustum, Plane};
pub use projection::{Polygon2, Projector, ScreenVertex};
pub use region::{RasterRegion, Span, SpanEdge, bisect_boundary};
pub use traversal::{PortalWalk, Scene};
pub use types::{Bisection, DrawFlags, MAX_PORTAL_DEPTH, RenderConfig, Screen, Viewer};
