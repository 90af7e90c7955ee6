use serde::Deserialize;

use crate::types::FACE_COUNT;

#[derive(Clone, Debug, Deserialize)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    pub id: Option<u8>,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub textures: TexturesDef,
    #[serde(default)]
    pub mining_secs: Option<f32>,
}

/// Per-face texture selection. Specific faces override `side`, which
/// overrides `all`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TexturesDef {
    pub all: Option<u16>,
    pub side: Option<u16>,
    pub top: Option<u16>,
    pub bottom: Option<u16>,
    pub back: Option<u16>,
    pub front: Option<u16>,
    pub left: Option<u16>,
    pub right: Option<u16>,
}

impl TexturesDef {
    pub fn resolve(&self) -> [u16; FACE_COUNT] {
        let all = self.all.unwrap_or(0);
        let side = self.side.unwrap_or(all);
        [
            self.back.unwrap_or(side),
            self.front.unwrap_or(side),
            self.top.unwrap_or(all),
            self.bottom.unwrap_or(all),
            self.left.unwrap_or(side),
            self.right.unwrap_or(side),
        ]
    }
}
