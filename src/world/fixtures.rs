//! Small hand-built levels for tests, benches and the viewer.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::world::{
    geometry::{Level, LevelError, Segment},
    texture::{NO_TEXTURE, TextureId},
};

fn pick(textures: &[TextureId], i: usize) -> TextureId {
    if textures.is_empty() {
        NO_TEXTURE
    } else {
        textures[i % textures.len()]
    }
}

/// `count` cubes of edge `size` stacked along +z.  Cube `i` spans
/// `x, y ∈ [-size/2, size/2]`, `z ∈ [i·size, (i+1)·size]`; its bases are
/// the portals to the previous and next cube.
pub fn cube_row(count: usize, size: f32, textures: &[TextureId]) -> Result<Level, LevelError> {
    let h = size * 0.5;
    let square = [(-h, -h), (h, -h), (h, h), (-h, h)];
    let segments = (0..count)
        .map(|i| {
            let z0 = i as f32 * size;
            let bottom = square.map(|(x, y)| Vec3::new(x, y, z0));
            let top = square.map(|(x, y)| Vec3::new(x, y, z0 + size));
            Segment::prism(&bottom, &top).map(|s| s.with_textures(|f| pick(textures, i + f)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Level::new(format!("cube row ×{count}"), segments)
}

/// Four cubes on a 2×2 grid in the xz plane.  Each shares a wall with two
/// others, so the portal graph is a single 4-cycle.
pub fn cube_ring(size: f32, textures: &[TextureId]) -> Result<Level, LevelError> {
    let h = size * 0.5;
    let cells = [(0, 0), (1, 0), (1, 1), (0, 1)];
    let segments = cells
        .iter()
        .enumerate()
        .map(|(i, &(gx, gz))| {
            let (x0, z0) = (gx as f32 * size, gz as f32 * size);
            let (x1, z1) = (x0 + size, z0 + size);
            let footprint = [(x0, z0), (x1, z0), (x1, z1), (x0, z1)];
            let bottom = footprint.map(|(x, z)| Vec3::new(x, -h, z));
            let top = footprint.map(|(x, z)| Vec3::new(x, h, z));
            Segment::prism(&bottom, &top).map(|s| s.with_textures(|f| pick(textures, i + f)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Level::new("cube ring", segments)
}

/// A regular `sides`-gon hall with a square corridor cell attached to every
/// other wall.  Exercises prisms with more than four sides.
pub fn polygon_hall(sides: usize, radius: f32, textures: &[TextureId]) -> Result<Level, LevelError> {
    let h = radius * 0.5;
    let ring: Vec<(f32, f32)> = (0..sides)
        .map(|i| {
            let a = i as f32 / sides as f32 * TAU;
            (radius * a.cos(), radius * a.sin())
        })
        .collect();

    let mut segments = Vec::with_capacity(1 + sides / 2);
    let bottom: Vec<Vec3> = ring.iter().map(|&(x, z)| Vec3::new(x, -h, z)).collect();
    let top: Vec<Vec3> = ring.iter().map(|&(x, z)| Vec3::new(x, h, z)).collect();
    segments.push(Segment::prism(&bottom, &top)?.with_textures(|f| pick(textures, f)));

    for i in (0..sides).step_by(2) {
        let (ax, az) = ring[i];
        let (bx, bz) = ring[(i + 1) % sides];
        // outward normal of the wall in xz
        let (mx, mz) = ((ax + bx) * 0.5, (az + bz) * 0.5);
        let len = (mx * mx + mz * mz).sqrt();
        let (ox, oz) = (mx / len * radius, mz / len * radius);
        let foot = [(bx, bz), (ax, az), (ax + ox, az + oz), (bx + ox, bz + oz)];
        let bottom = foot.map(|(x, z)| Vec3::new(x, -h, z));
        let top = foot.map(|(x, z)| Vec3::new(x, h, z));
        segments.push(Segment::prism(&bottom, &top)?.with_textures(|f| pick(textures, i + f + 1)));
    }
    Level::new(format!("{sides}-gon hall"), segments)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_a_cycle() {
        let level = cube_ring(2.0, &[]).unwrap();
        for cell in 0..4u16 {
            let portals = level.segment(cell).faces.iter().filter(|f| f.is_portal()).count();
            assert_eq!(portals, 2, "cell {cell}");
        }
        assert!(level.opposite_face(0, 1).is_some());
        assert!(level.opposite_face(3, 0).is_some());
        assert!(level.opposite_face(0, 2).is_none());
    }

    #[test]
    fn hall_links_every_corridor() {
        let level = polygon_hall(6, 4.0, &[]).unwrap();
        assert_eq!(level.len(), 4);
        let hall_portals = level.segment(0).faces.iter().filter(|f| f.is_portal()).count();
        assert_eq!(hall_portals, 3);
        assert_eq!(level.locate(0, Vec3::ZERO), Some(0));
    }

    #[test]
    fn textures_are_cycled() {
        let level = cube_row(2, 1.0, &[5, 6]).unwrap();
        assert_eq!(level.segment(0).faces[0].texture, 5);
        assert_eq!(level.segment(0).faces[1].texture, 6);
        assert_eq!(level.segment(1).faces[0].texture, 6);
    }
}
