use strata_blocks::{VoxelId, ids};
use strata_geom::VoxelPos;
use strata_world::{ChunkCoord, ModBatch, TerrainGen};

/// Dense `[x][y][z]` voxel grid for one chunk column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkData {
    pub coord: ChunkCoord,
    pub width: usize,
    pub height: usize,
    voxels: Vec<VoxelId>,
}

impl ChunkData {
    /// An all-air chunk waiting for population.
    pub fn new(coord: ChunkCoord, width: usize, height: usize) -> Self {
        Self {
            coord,
            width,
            height,
            voxels: vec![ids::AIR; width * height * width],
        }
    }

    /// Wrap stored voxels; `None` when the buffer does not fit the dimensions.
    pub fn from_voxels(
        coord: ChunkCoord,
        width: usize,
        height: usize,
        voxels: Vec<VoxelId>,
    ) -> Option<Self> {
        if voxels.len() != width * height * width {
            return None;
        }
        Some(Self {
            coord,
            width,
            height,
            voxels,
        })
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.height + y) * self.width + z
    }

    #[inline]
    pub fn contains_local(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.width && y < self.height && z < self.width
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Option<VoxelId> {
        if !self.contains_local(x, y, z) {
            return None;
        }
        Some(self.voxels[self.idx(x, y, z)])
    }

    /// Write one cell; returns the previous id, or `None` when out of range.
    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, id: VoxelId) -> Option<VoxelId> {
        if !self.contains_local(x, y, z) {
            return None;
        }
        let i = self.idx(x, y, z);
        Some(std::mem::replace(&mut self.voxels[i], id))
    }

    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        self.coord.origin(self.width)
    }

    #[inline]
    pub fn contains_world(&self, pos: VoxelPos) -> bool {
        let (x0, z0) = self.origin();
        let w = self.width as i32;
        pos.y >= 0
            && pos.y < self.height as i32
            && pos.x >= x0
            && pos.x < x0 + w
            && pos.z >= z0
            && pos.z < z0 + w
    }

    #[inline]
    pub fn get_world(&self, pos: VoxelPos) -> Option<VoxelId> {
        if !self.contains_world(pos) {
            return None;
        }
        let (x0, z0) = self.origin();
        self.get_local(
            (pos.x - x0) as usize,
            pos.y as usize,
            (pos.z - z0) as usize,
        )
    }

    pub fn voxels(&self) -> &[VoxelId] {
        &self.voxels
    }

    /// Fill every cell from the generator. Flora batches discovered on the
    /// way are appended to `flora`; nothing outside this chunk is touched.
    pub fn populate(&mut self, terrain: &TerrainGen, flora: &mut Vec<ModBatch>) {
        let (x0, z0) = self.origin();
        for x in 0..self.width {
            for z in 0..self.width {
                let wx = x0 + x as i32;
                let wz = z0 + z as i32;
                let column = terrain.column(wx, wz);
                for y in 0..self.height {
                    let id = terrain.generate_in_column(
                        VoxelPos::new(wx, y as i32, wz),
                        column,
                        flora,
                    );
                    let i = self.idx(x, y, z);
                    self.voxels[i] = id;
                }
            }
        }
    }
}
