use glam::{Mat3, Vec3};

use crate::world::geometry::{CellId, Level};

/// Steepest allowed pitch, just short of straight up or down.
const PITCH_LIMIT: f32 = 1.5;

/// Viewer in world space.
///
/// Camera space is x right, y up, z forward.  `yaw` turns around world y,
/// `pitch` tilts the view up (positive) or down.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pos: Vec3,
    yaw: f32,   // radians, 0 = looking along +z, positive = left
    pitch: f32, // radians, positive = up
    cell: CellId,
    orientation: Mat3, // columns: right, up, forward
}

impl Camera {
    /// Create a camera at `pos` inside `cell`, facing `yaw`.
    pub fn new(pos: Vec3, yaw: f32, cell: CellId) -> Self {
        let mut cam = Self {
            pos,
            yaw,
            pitch: 0.0,
            cell,
            orientation: Mat3::IDENTITY,
        };
        cam.update_orientation();
        cam
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    /// Cell the eye is currently in.
    #[inline]
    pub fn cell(&self) -> CellId {
        self.cell
    }

    #[inline]
    pub fn orientation(&self) -> Mat3 {
        self.orientation
    }

    /// World point → camera space.
    #[inline]
    pub fn to_cam(&self, p: Vec3) -> Vec3 {
        self.orientation.transpose() * (p - self.pos)
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    #[inline(always)]
    pub fn forward(&self) -> Vec3 {
        self.orientation.z_axis
    }

    #[inline(always)]
    pub fn right(&self) -> Vec3 {
        self.orientation.x_axis
    }

    #[inline(always)]
    pub fn up(&self) -> Vec3 {
        self.orientation.y_axis
    }

    fn update_orientation(&mut self) {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        let forward = Vec3::new(-sy * cp, sp, cy * cp);
        let right = Vec3::Y.cross(forward).normalize();
        let up = forward.cross(right);
        self.orientation = Mat3::from_cols(right, up, forward);
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move by `forward` units and `side` (strafe) on the horizontal plane.
    /// The move is refused if it would leave the level.
    pub fn step(&mut self, level: &Level, forward: f32, side: f32) -> bool {
        let (sy, cy) = self.yaw.sin_cos();
        let flat_fwd = Vec3::new(-sy, 0.0, cy);
        let flat_right = Vec3::Y.cross(flat_fwd);
        self.move_by(level, flat_fwd * forward + flat_right * side)
    }

    /// Translate by `delta`, following portals to find the new cell.
    pub fn move_by(&mut self, level: &Level, delta: Vec3) -> bool {
        let target = self.pos + delta;
        match level.locate(self.cell, target) {
            Some(cell) => {
                if cell != self.cell {
                    log::debug!("camera crossed from cell {} into {}", self.cell, cell);
                }
                self.pos = target;
                self.cell = cell;
                true
            }
            None => false,
        }
    }

    /// Rotate around the world up axis (positive = turn left).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
        self.update_orientation();
    }

    /// Tilt up (positive) or down, clamped short of vertical.
    pub fn look(&mut self, delta_pitch: f32) {
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_orientation();
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
