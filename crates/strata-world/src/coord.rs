use serde::{Deserialize, Serialize};
use strata_geom::VoxelPos;

/// Chunk-grid position. Chunks are full-height columns, so there is no Y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    #[inline]
    pub fn from_voxel(x: i32, z: i32, width: usize) -> Self {
        let w = width as i32;
        Self {
            cx: x.div_euclid(w),
            cz: z.div_euclid(w),
        }
    }

    /// World-space (x, z) of this chunk's first column.
    #[inline]
    pub fn origin(self, width: usize) -> (i32, i32) {
        (self.cx * width as i32, self.cz * width as i32)
    }

    /// Chebyshev distance, the metric of a square view window.
    #[inline]
    pub fn chebyshev(self, other: ChunkCoord) -> i32 {
        (self.cx - other.cx).abs().max((self.cz - other.cz).abs())
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cz)
    }
}

/// Fixed extents of a world. Never changes once the world exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldDims {
    pub chunk_width: usize,
    pub chunk_height: usize,
    pub size_in_chunks: usize,
}

impl WorldDims {
    pub const fn new(chunk_width: usize, chunk_height: usize, size_in_chunks: usize) -> Self {
        Self {
            chunk_width,
            chunk_height,
            size_in_chunks,
        }
    }

    #[inline]
    pub fn world_voxels(&self) -> i32 {
        (self.chunk_width * self.size_in_chunks) as i32
    }

    #[inline]
    pub fn in_bounds(&self, pos: VoxelPos) -> bool {
        let w = self.world_voxels();
        pos.x >= 0
            && pos.x < w
            && pos.z >= 0
            && pos.z < w
            && pos.y >= 0
            && pos.y < self.chunk_height as i32
    }

    #[inline]
    pub fn chunk_in_bounds(&self, coord: ChunkCoord) -> bool {
        let n = self.size_in_chunks as i32;
        coord.cx >= 0 && coord.cx < n && coord.cz >= 0 && coord.cz < n
    }

    #[inline]
    pub fn chunk_of(&self, pos: VoxelPos) -> ChunkCoord {
        ChunkCoord::from_voxel(pos.x, pos.z, self.chunk_width)
    }

    /// Split a world position into its chunk and the in-chunk offset.
    #[inline]
    pub fn split(&self, pos: VoxelPos) -> (ChunkCoord, usize, usize, usize) {
        let w = self.chunk_width as i32;
        let coord = self.chunk_of(pos);
        (
            coord,
            pos.x.rem_euclid(w) as usize,
            pos.y.max(0) as usize,
            pos.z.rem_euclid(w) as usize,
        )
    }
}
