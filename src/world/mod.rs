mod camera;
pub mod fixtures;
pub mod geometry;
mod texture;

pub use geometry::{
    CellId, EdgeId, Face, FaceId, Level, LevelError, MAX_BASE_VERTICES, MIN_BASE_VERTICES, Portal,
    Segment,
};

pub use camera::Camera;

pub use texture::{NO_TEXTURE, Texture, TextureBank, TextureError, TextureId};
