/// A voxel is a single byte naming its block type.
pub type VoxelId = u8;

/// Faces per block, in mesher order: back, front, top, bottom, left, right.
pub const FACE_COUNT: usize = 6;

/// Well-known ids the generator and edit paths refer to directly.
pub mod ids {
    use super::VoxelId;

    pub const AIR: VoxelId = 0;
    pub const BEDROCK: VoxelId = 1;
    pub const STONE: VoxelId = 2;
    pub const GRASS: VoxelId = 3;
    pub const SAND: VoxelId = 4;
    pub const DIRT: VoxelId = 5;
    pub const SNOW: VoxelId = 6;
    pub const GRAVEL: VoxelId = 7;
    pub const WOOD: VoxelId = 8;
    pub const COAL_ORE: VoxelId = 9;
    pub const IRON_ORE: VoxelId = 10;
    pub const LEAVES: VoxelId = 11;
    pub const CACTUS_TOP: VoxelId = 12;
    pub const CACTUS_BODY: VoxelId = 13;
    pub const PLANKS: VoxelId = 14;
    pub const GLASS: VoxelId = 15;
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockType {
    pub id: VoxelId,
    pub name: String,
    pub solid: bool,
    pub transparent: bool,
    /// Atlas texture index per face (back, front, top, bottom, left, right).
    pub textures: [u16; FACE_COUNT],
    /// Seconds of continuous mining before the block breaks.
    pub mining_secs: f32,
}

impl BlockType {
    pub fn air() -> Self {
        Self {
            id: ids::AIR,
            name: "air".to_string(),
            solid: false,
            transparent: true,
            textures: [0; FACE_COUNT],
            mining_secs: 0.0,
        }
    }

    #[inline]
    pub fn texture(&self, face: usize) -> u16 {
        self.textures.get(face).copied().unwrap_or(0)
    }
}
