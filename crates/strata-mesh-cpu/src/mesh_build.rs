use crate::face::{CUBE_CORNERS, Face};

/// CPU-side geometry for one chunk. Positions are chunk-local; the draw
/// consumer places the mesh at the chunk origin.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuffers {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub opaque: Vec<u32>,
    pub transparent: Vec<u32>,
}

impl MeshBuffers {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        (self.opaque.len() + self.transparent.len()) / 6
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Append one unit face of the voxel whose minimum corner is
    /// `(x, y, z)`. `transparent` picks the index list.
    pub fn add_face(
        &mut self,
        face: Face,
        x: f32,
        y: f32,
        z: f32,
        uvs: [(f32, f32); 4],
        transparent: bool,
    ) {
        let base = self.vertex_count() as u32;
        let n = face.normal();
        for (corner, (u, v)) in face.corners().into_iter().zip(uvs) {
            let (cx, cy, cz) = CUBE_CORNERS[corner];
            self.pos.extend_from_slice(&[x + cx, y + cy, z + cz]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[u, v]);
        }
        let idx = [base, base + 1, base + 2, base + 2, base + 1, base + 3];
        if transparent {
            self.transparent.extend_from_slice(&idx);
        } else {
            self.opaque.extend_from_slice(&idx);
        }
    }
}

/// UV corners of texture `tex` in a square atlas of `per_row` x `per_row`
/// tiles, row 0 at the top.
pub fn atlas_uv(tex: u16, per_row: u32) -> [(f32, f32); 4] {
    let per_row = per_row.max(1);
    let t = u32::from(tex);
    let row = t / per_row;
    let col = t - row * per_row;
    let cell = 1.0 / per_row as f32;
    let u = col as f32 * cell;
    let v = 1.0 - row as f32 * cell - cell;
    [(u, v), (u, v + cell), (u + cell, v), (u + cell, v + cell)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_uv_first_and_wrapped_tiles() {
        let uv = atlas_uv(0, 4);
        assert_eq!(uv[0], (0.0, 0.75));
        assert_eq!(uv[3], (0.25, 1.0));
        // Tile 5 is row 1, column 1.
        let uv = atlas_uv(5, 4);
        assert_eq!(uv[0], (0.25, 0.5));
        assert_eq!(uv[1], (0.25, 0.75));
        assert_eq!(uv[2], (0.5, 0.5));
    }

    #[test]
    fn face_indices_follow_the_quad_pattern() {
        let mut m = MeshBuffers::default();
        m.add_face(Face::Top, 0.0, 0.0, 0.0, atlas_uv(0, 16), false);
        m.add_face(Face::Back, 1.0, 0.0, 0.0, atlas_uv(0, 16), true);
        assert_eq!(m.opaque, vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(m.transparent, vec![4, 5, 6, 6, 5, 7]);
        assert_eq!(m.vertex_count(), 8);
        assert_eq!(m.face_count(), 2);
        assert_eq!(&m.norm[0..3], &[0.0, 1.0, 0.0]);
    }
}
