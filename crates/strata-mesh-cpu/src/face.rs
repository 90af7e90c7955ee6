use strata_geom::Vec3;

/// Cube faces in emission order. The discriminant doubles as the index into
/// a block's per-face texture table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    Back = 0,
    Front = 1,
    Top = 2,
    Bottom = 3,
    Left = 4,
    Right = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Back,
        Face::Front,
        Face::Top,
        Face::Bottom,
        Face::Left,
        Face::Right,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Integer step `(dx,dy,dz)` to the voxel on the other side of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::Back => (0, 0, -1),
            Face::Front => (0, 0, 1),
            Face::Top => (0, 1, 0),
            Face::Bottom => (0, -1, 0),
            Face::Left => (-1, 0, 0),
            Face::Right => (1, 0, 0),
        }
    }

    #[inline]
    pub fn normal(self) -> Vec3 {
        let (x, y, z) = self.delta();
        Vec3::new(x as f32, y as f32, z as f32)
    }

    /// Indices into [`CUBE_CORNERS`] for this face's four vertices.
    #[inline]
    pub fn corners(self) -> [usize; 4] {
        match self {
            Face::Back => [0, 3, 1, 2],
            Face::Front => [5, 6, 4, 7],
            Face::Top => [3, 7, 2, 6],
            Face::Bottom => [1, 5, 0, 4],
            Face::Left => [4, 7, 0, 3],
            Face::Right => [1, 2, 5, 6],
        }
    }
}

/// Unit cube corners, origin at the voxel's minimum corner.
pub const CUBE_CORNERS: [(f32, f32, f32); 8] = [
    (0.0, 0.0, 0.0),
    (1.0, 0.0, 0.0),
    (1.0, 1.0, 0.0),
    (0.0, 1.0, 0.0),
    (0.0, 0.0, 1.0),
    (1.0, 0.0, 1.0),
    (1.0, 1.0, 1.0),
    (0.0, 1.0, 1.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, f) in Face::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn corners_lie_on_the_face_plane() {
        for f in Face::ALL {
            let (dx, dy, dz) = f.delta();
            for c in f.corners() {
                let (x, y, z) = CUBE_CORNERS[c];
                // Every corner sits on the side of the cube the normal points to.
                let on_plane = |d: i32, v: f32| match d {
                    1 => v == 1.0,
                    -1 => v == 0.0,
                    _ => true,
                };
                assert!(on_plane(dx, x) && on_plane(dy, y) && on_plane(dz, z), "{f:?}");
            }
        }
    }
}
