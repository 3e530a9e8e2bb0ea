use glam::{Vec2, Vec3};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{engine::plane::Plane, world::texture::TextureId};

pub type CellId = u16;
pub type FaceId = u8;
pub type EdgeId = u8;

pub const MIN_BASE_VERTICES: usize = 3;
/// `3 · N` edges must fit into one `u32` edge mask.
pub const MAX_BASE_VERTICES: usize = 10;

/// Corners of two faces closer than this are considered the same point.
const WELD_EPS: f32 = 1e-4;

/// Tolerance for point-in-cell tests.
const INSIDE_EPS: f32 = 1e-5;

#[derive(Error, Debug, PartialEq)]
pub enum LevelError {
    #[error("a prism base needs {MIN_BASE_VERTICES}..={MAX_BASE_VERTICES} vertices, got {0}")]
    BaseVertexCount(usize),

    #[error("bottom and top bases differ ({bottom} vs {top} vertices)")]
    MismatchedBases { bottom: usize, top: usize },

    #[error("face {0} is degenerate")]
    DegenerateFace(FaceId),

    #[error("segment {cell}: face {face} out of range")]
    BadFace { cell: CellId, face: FaceId },

    #[error("segment {cell}: face {face} links to missing segment {neighbor}")]
    BadNeighbor {
        cell: CellId,
        face: FaceId,
        neighbor: CellId,
    },

    #[error("level has no segments")]
    Empty,

    #[error("level has {0} segments, more than a cell id can address")]
    TooManySegments(usize),
}

/*--------------------------- portals & faces ---------------------------*/

/// Window through a face into the neighbouring cell.  The outline is a
/// convex world-space polygon lying on the face plane.
#[derive(Clone, Debug)]
pub struct Portal {
    pub outline: SmallVec<[Vec3; MAX_BASE_VERTICES]>,
}

#[derive(Clone, Debug)]
pub struct Face {
    /// Indices into [`Segment::vertices`], in outline order.
    pub corners: SmallVec<[u8; MAX_BASE_VERTICES]>,
    /// `edges[k]` joins `corners[k]` and `corners[k + 1]`.
    pub edges: SmallVec<[EdgeId; MAX_BASE_VERTICES]>,
    /// Planar texture coordinates per corner, in world units.
    pub uvs: SmallVec<[Vec2; MAX_BASE_VERTICES]>,
    /// Inward-facing: the cell lies on the inside.
    pub plane: Plane,
    pub neighbor: Option<CellId>,
    pub portals: SmallVec<[Portal; 1]>,
    pub texture: TextureId,
}

impl Face {
    #[inline]
    pub fn is_portal(&self) -> bool {
        self.neighbor.is_some()
    }

    /// Bitmask with one bit per edge of this face.
    pub fn edge_mask(&self) -> u32 {
        self.edges.iter().fold(0, |m, &e| m | 1 << e)
    }
}

/*------------------------------ segments ------------------------------*/

/// Convex cell: a prism over an N-gon.
///
/// Vertices `0..N` form the bottom base, `N..2N` the top base with vertex
/// `N + i` above vertex `i`.  Faces `0..N` are the side quads, face `N` the
/// bottom base and face `N + 1` the top base.
///
/// Edge numbering: bottom edge `i` joins `i → i+1`, top edge `N + i` joins
/// `N+i → N+i+1`, vertical edge `2N + i` joins `i → N+i`.
#[derive(Clone, Debug)]
pub struct Segment {
    pub base_vertex_count: usize,
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub centroid: Vec3,
}

impl Segment {
    /// Build a cell from two N-gon bases (same N, matching order).
    pub fn prism(bottom: &[Vec3], top: &[Vec3]) -> Result<Self, LevelError> {
        let n = bottom.len();
        if top.len() != n {
            return Err(LevelError::MismatchedBases {
                bottom: n,
                top: top.len(),
            });
        }
        if !(MIN_BASE_VERTICES..=MAX_BASE_VERTICES).contains(&n) {
            return Err(LevelError::BaseVertexCount(n));
        }

        let vertices: Vec<Vec3> = bottom.iter().chain(top).copied().collect();
        let centroid = vertices.iter().copied().sum::<Vec3>() / vertices.len() as f32;

        let mut faces = Vec::with_capacity(n + 2);
        for i in 0..n {
            let j = (i + 1) % n;
            let corners = [i, j, n + j, n + i];
            let edges = [i, 2 * n + j, n + i, 2 * n + i];
            faces.push(Self::make_face(&vertices, &corners, &edges, centroid, i)?);
        }
        let bottom_corners: SmallVec<[usize; MAX_BASE_VERTICES]> = (0..n).collect();
        let top_corners: SmallVec<[usize; MAX_BASE_VERTICES]> = (n..2 * n).collect();
        faces.push(Self::make_face(
            &vertices,
            &bottom_corners,
            &bottom_corners,
            centroid,
            n,
        )?);
        faces.push(Self::make_face(
            &vertices,
            &top_corners,
            &top_corners,
            centroid,
            n + 1,
        )?);

        Ok(Self {
            base_vertex_count: n,
            vertices,
            faces,
            centroid,
        })
    }

    fn make_face(
        vertices: &[Vec3],
        corners: &[usize],
        edges: &[usize],
        centroid: Vec3,
        face: usize,
    ) -> Result<Face, LevelError> {
        let pts: SmallVec<[Vec3; MAX_BASE_VERTICES]> =
            corners.iter().map(|&c| vertices[c]).collect();

        // Newell normal: robust for slightly non-planar quads
        let mut normal = Vec3::ZERO;
        for (k, &a) in pts.iter().enumerate() {
            let b = pts[(k + 1) % pts.len()];
            normal += Vec3::new(
                (a.y - b.y) * (a.z + b.z),
                (a.z - b.z) * (a.x + b.x),
                (a.x - b.x) * (a.y + b.y),
            );
        }
        if normal.length_squared() < 1e-12 {
            return Err(LevelError::DegenerateFace(face as FaceId));
        }
        let normal = normal.normalize();
        let plane = Plane {
            normal,
            d: normal.dot(pts[0]),
        }
        .facing(centroid);

        // planar mapping: u along the first edge, v across it
        let u_axis = (pts[1] - pts[0]).normalize_or_zero();
        let v_axis = plane.normal.cross(u_axis);
        let uvs = pts
            .iter()
            .map(|&p| Vec2::new((p - pts[0]).dot(u_axis), (p - pts[0]).dot(v_axis)))
            .collect();

        Ok(Face {
            corners: corners.iter().map(|&c| c as u8).collect(),
            edges: edges.iter().map(|&e| e as EdgeId).collect(),
            uvs,
            plane,
            neighbor: None,
            portals: SmallVec::new(),
            texture: 0,
        })
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        3 * self.base_vertex_count
    }

    /// Mask with every edge bit of this cell set.
    #[inline]
    pub fn full_edge_mask(&self) -> u32 {
        if self.edge_count() >= 32 {
            u32::MAX
        } else {
            (1u32 << self.edge_count()) - 1
        }
    }

    /// The two vertex indices joined by `edge`.
    pub fn edge_vertices(&self, edge: EdgeId) -> (usize, usize) {
        let n = self.base_vertex_count;
        let e = edge as usize;
        match e / n {
            0 => (e, (e + 1) % n),
            1 => (e, n + (e - n + 1) % n),
            _ => (e - 2 * n, e - n),
        }
    }

    /// World-space corners of `face`.
    pub fn face_points(&self, face: FaceId) -> impl Iterator<Item = Vec3> + '_ {
        self.faces[face as usize]
            .corners
            .iter()
            .map(|&c| self.vertices[c as usize])
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.faces
            .iter()
            .all(|f| f.plane.distance(p) >= -INSIDE_EPS)
    }

    /// Give every face the texture returned by `pick(face_index)`.
    pub fn with_textures(mut self, mut pick: impl FnMut(usize) -> TextureId) -> Self {
        for (i, f) in self.faces.iter_mut().enumerate() {
            f.texture = pick(i);
        }
        self
    }
}

/*------------------------------- level --------------------------------*/

/// Runtime snapshot of one world (immutable after load).
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub segments: Vec<Segment>,
}

impl Level {
    /// Validate the cells and link every pair of faces with coinciding
    /// corners as portals.
    pub fn new(name: impl Into<String>, segments: Vec<Segment>) -> Result<Self, LevelError> {
        if segments.is_empty() {
            return Err(LevelError::Empty);
        }
        if segments.len() > CellId::MAX as usize {
            return Err(LevelError::TooManySegments(segments.len()));
        }
        let mut level = Self {
            name: name.into(),
            segments,
        };
        level.link_shared_faces();
        level.validate()?;
        Ok(level)
    }

    #[inline]
    pub fn segment(&self, id: CellId) -> &Segment {
        &self.segments[id as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Link two faces explicitly; both get a whole-face portal.
    pub fn connect(
        &mut self,
        a: CellId,
        face_a: FaceId,
        b: CellId,
        face_b: FaceId,
    ) -> Result<(), LevelError> {
        for (cell, face) in [(a, face_a), (b, face_b)] {
            let seg = self
                .segments
                .get(cell as usize)
                .ok_or(LevelError::BadNeighbor {
                    cell: a,
                    face: face_a,
                    neighbor: cell,
                })?;
            if face as usize >= seg.faces.len() {
                return Err(LevelError::BadFace { cell, face });
            }
        }
        self.set_portal(a, face_a, b);
        self.set_portal(b, face_b, a);
        Ok(())
    }

    fn set_portal(&mut self, cell: CellId, face: FaceId, neighbor: CellId) {
        let seg = &mut self.segments[cell as usize];
        let outline = seg.faces[face as usize]
            .corners
            .iter()
            .map(|&c| seg.vertices[c as usize])
            .collect();
        let f = &mut seg.faces[face as usize];
        f.neighbor = Some(neighbor);
        if f.portals.is_empty() {
            f.portals.push(Portal { outline });
        }
    }

    /// Pair up faces of different cells whose corner sets coincide.
    pub fn link_shared_faces(&mut self) {
        let mut links = Vec::new();
        for a in 0..self.segments.len() {
            for b in a + 1..self.segments.len() {
                let (sa, sb) = (&self.segments[a], &self.segments[b]);
                for (fa, face_a) in sa.faces.iter().enumerate() {
                    for (fb, face_b) in sb.faces.iter().enumerate() {
                        if face_a.corners.len() == face_b.corners.len()
                            && same_corners(sa, fa as FaceId, sb, fb as FaceId)
                        {
                            links.push((a as CellId, fa as FaceId, b as CellId, fb as FaceId));
                        }
                    }
                }
            }
        }
        for (a, fa, b, fb) in links {
            log::debug!("linking segment {a} face {fa} <-> segment {b} face {fb}");
            self.set_portal(a, fa, b);
            self.set_portal(b, fb, a);
        }
    }

    fn validate(&self) -> Result<(), LevelError> {
        for (cell, seg) in self.segments.iter().enumerate() {
            for (face, f) in seg.faces.iter().enumerate() {
                if let Some(neighbor) = f.neighbor {
                    if neighbor as usize >= self.segments.len() {
                        return Err(LevelError::BadNeighbor {
                            cell: cell as CellId,
                            face: face as FaceId,
                            neighbor,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Face of `to` that leads back into `from`.
    pub fn opposite_face(&self, from: CellId, to: CellId) -> Option<FaceId> {
        self.segment(to)
            .faces
            .iter()
            .position(|f| f.neighbor == Some(from))
            .map(|i| i as FaceId)
    }

    /// Walk through portals from `start` towards `p`.  Returns the cell
    /// containing `p`, or `None` if `p` is outside the world.
    pub fn locate(&self, start: CellId, p: Vec3) -> Option<CellId> {
        let mut cur = start;
        for _ in 0..self.segments.len() {
            let seg = self.segment(cur);
            let exit = seg
                .faces
                .iter()
                .filter(|f| f.plane.distance(p) < -INSIDE_EPS)
                .min_by(|a, b| a.plane.distance(p).total_cmp(&b.plane.distance(p)));
            match exit {
                None => return Some(cur),
                Some(f) => cur = f.neighbor?,
            }
        }
        None
    }
}

fn same_corners(sa: &Segment, fa: FaceId, sb: &Segment, fb: FaceId) -> bool {
    sa.face_points(fa)
        .all(|p| sb.face_points(fb).any(|q| p.distance_squared(q) < WELD_EPS * WELD_EPS))
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
