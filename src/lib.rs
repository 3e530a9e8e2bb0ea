//! Portal-cell software renderer core.
//!
//! The world is a graph of convex cells ("segments") joined by shared faces.
//! Every frame the [`engine::Engine`] walks that graph from the camera's cell,
//! narrowing a screen-space [`engine::RasterRegion`] through each portal, and
//! hands the surviving spans to a [`renderer::Renderer`].

pub mod engine;
pub mod renderer;
pub mod world;
