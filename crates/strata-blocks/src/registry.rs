use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::{BlockDef, BlocksConfig};
use super::types::{BlockType, FACE_COUNT, VoxelId, ids};

// (name, solid, transparent, textures back/front/top/bottom/left/right, mining secs)
type BuiltinRow = (&'static str, bool, bool, [u16; FACE_COUNT], f32);

const BUILTIN: &[BuiltinRow] = &[
    ("air", false, true, [0, 0, 0, 0, 0, 0], 0.0),
    ("bedrock", true, false, [3, 3, 3, 3, 3, 3], 0.0),
    ("stone", true, false, [0, 0, 0, 0, 0, 0], 2.0),
    ("grass", true, false, [2, 2, 7, 1, 2, 2], 0.6),
    ("sand", true, false, [4, 4, 4, 4, 4, 4], 0.5),
    ("dirt", true, false, [1, 1, 1, 1, 1, 1], 0.5),
    ("snow", true, false, [5, 5, 5, 1, 5, 5], 0.4),
    ("gravel", true, false, [6, 6, 6, 6, 6, 6], 0.6),
    ("wood", true, false, [8, 8, 9, 9, 8, 8], 1.5),
    ("coal_ore", true, false, [10, 10, 10, 10, 10, 10], 3.0),
    ("iron_ore", true, false, [11, 11, 11, 11, 11, 11], 3.5),
    ("leaves", true, true, [12, 12, 12, 12, 12, 12], 0.2),
    ("cactus_top", true, false, [14, 14, 13, 13, 14, 14], 0.4),
    ("cactus_body", true, false, [14, 14, 13, 13, 14, 14], 0.4),
    ("planks", true, false, [15, 15, 15, 15, 15, 15], 1.2),
    ("glass", true, true, [16, 16, 16, 16, 16, 16], 0.3),
];

#[derive(Clone, Debug)]
pub struct BlockRegistry {
    /// Indexed by id; `None` marks an id nobody defined.
    pub blocks: Vec<Option<BlockType>>,
    pub by_name: HashMap<String, VoxelId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BlockRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            blocks: Vec::new(),
            by_name: HashMap::new(),
        };
        reg.insert(BlockType::air());
        reg
    }

    /// The catalog the generator's well-known ids refer to.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        for (i, (name, solid, transparent, textures, mining_secs)) in BUILTIN.iter().enumerate() {
            reg.insert(BlockType {
                id: i as VoxelId,
                name: (*name).to_string(),
                solid: *solid,
                transparent: *transparent,
                textures: *textures,
                mining_secs: *mining_secs,
            });
        }
        reg
    }

    fn insert(&mut self, ty: BlockType) {
        let slot = ty.id as usize;
        if self.blocks.len() <= slot {
            self.blocks.resize(slot + 1, None);
        }
        if let Some(old) = self.blocks[slot].take() {
            self.by_name.remove(&old.name);
        }
        self.by_name.insert(ty.name.clone(), ty.id);
        self.blocks[slot] = Some(ty);
    }

    #[inline]
    pub fn get(&self, id: VoxelId) -> Option<&BlockType> {
        self.blocks.get(id as usize).and_then(|b| b.as_ref())
    }

    pub fn id_by_name(&self, name: &str) -> Option<VoxelId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Unknown ids behave like air everywhere.
    #[inline]
    pub fn is_solid(&self, id: VoxelId) -> bool {
        self.get(id).is_some_and(|b| b.solid)
    }

    #[inline]
    pub fn is_transparent(&self, id: VoxelId) -> bool {
        self.get(id).is_none_or(|b| b.transparent)
    }

    #[inline]
    pub fn texture(&self, id: VoxelId, face: usize) -> u16 {
        self.get(id).map(|b| b.texture(face)).unwrap_or(0)
    }

    pub fn mining_secs(&self, id: VoxelId) -> f32 {
        self.get(id).map(|b| b.mining_secs).unwrap_or(0.0)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = Self::new();
        let mut seen: Vec<VoxelId> = Vec::new();
        let mut next_id: usize = 1;
        for def in cfg.blocks.into_iter() {
            let BlockDef {
                name,
                id,
                solid,
                transparent,
                textures,
                mining_secs,
            } = def;
            let id = match id {
                Some(id) => id,
                None => VoxelId::try_from(next_id)
                    .map_err(|_| format!("block '{name}': no free id left"))?,
            };
            if seen.contains(&id) {
                return Err(format!("block '{name}': duplicate id {id}").into());
            }
            let solid = solid.unwrap_or(true);
            if id == ids::AIR && solid {
                return Err(format!("block '{name}': id 0 is reserved for air").into());
            }
            seen.push(id);
            next_id = next_id.max(id as usize + 1);
            reg.insert(BlockType {
                id,
                name,
                solid,
                transparent: transparent.unwrap_or(!solid),
                textures: textures.resolve(),
                mining_secs: mining_secs.unwrap_or(1.0),
            });
        }
        Ok(reg)
    }
}
