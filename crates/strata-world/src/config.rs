use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;

use strata_blocks::{VoxelId, ids};

use crate::coord::WorldDims;

#[derive(Clone, Debug, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub world: WorldSettings,
    #[serde(default)]
    pub terrain: TerrainSettings,
    #[serde(default = "default_biomes")]
    pub biomes: Vec<BiomeDef>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world: WorldSettings::default(),
            terrain: TerrainSettings::default(),
            biomes: default_biomes(),
        }
    }
}

impl WorldConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: WorldConfig = toml::from_str(s)?;
        Ok(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn dims(&self) -> WorldDims {
        WorldDims::new(
            self.world.chunk_width,
            self.world.chunk_height,
            self.world.size_in_chunks,
        )
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WorldSettings {
    #[serde(default = "default_world_name")]
    pub name: String,
    #[serde(default)]
    pub seed: i32,
    #[serde(default = "default_size_in_chunks")]
    pub size_in_chunks: usize,
    #[serde(default = "default_chunk_width")]
    pub chunk_width: usize,
    #[serde(default = "default_chunk_height")]
    pub chunk_height: usize,
    #[serde(default = "default_view_distance")]
    pub view_distance: i32,
    #[serde(default = "default_load_distance")]
    pub load_distance: i32,
    #[serde(default = "default_multithreading")]
    pub multithreading: bool,
    #[serde(default = "default_atlas_blocks_per_row")]
    pub atlas_blocks_per_row: u32,
}
fn default_world_name() -> String {
    "Prototype".to_string()
}
fn default_size_in_chunks() -> usize {
    100
}
fn default_chunk_width() -> usize {
    16
}
fn default_chunk_height() -> usize {
    128
}
fn default_view_distance() -> i32 {
    5
}
fn default_load_distance() -> i32 {
    8
}
fn default_multithreading() -> bool {
    true
}
fn default_atlas_blocks_per_row() -> u32 {
    16
}
impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: 0,
            size_in_chunks: default_size_in_chunks(),
            chunk_width: default_chunk_width(),
            chunk_height: default_chunk_height(),
            view_distance: default_view_distance(),
            load_distance: default_load_distance(),
            multithreading: default_multithreading(),
            atlas_blocks_per_row: default_atlas_blocks_per_row(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainSettings {
    #[serde(default = "default_solid_ground_height")]
    pub solid_ground_height: i32,
    #[serde(default = "default_snow_line")]
    pub snow_line: i32,
    #[serde(default = "default_snow_block")]
    pub snow_block: VoxelId,
    #[serde(default = "default_stone_block")]
    pub stone_block: VoxelId,
}
fn default_solid_ground_height() -> i32 {
    42
}
fn default_snow_line() -> i32 {
    90
}
fn default_snow_block() -> VoxelId {
    ids::SNOW
}
fn default_stone_block() -> VoxelId {
    ids::STONE
}
impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            solid_ground_height: default_solid_ground_height(),
            snow_line: default_snow_line(),
            snow_block: default_snow_block(),
            stone_block: default_stone_block(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BiomeDef {
    pub name: String,
    /// Noise offset and scale of this biome's weight field.
    pub offset: f32,
    pub scale: f32,
    pub terrain_height: f32,
    pub terrain_scale: f32,
    pub surface_block: VoxelId,
    pub subsurface_block: VoxelId,
    #[serde(default)]
    pub place_flora: bool,
    #[serde(default)]
    pub flora_index: usize,
    #[serde(default = "default_flora_zone_scale")]
    pub flora_zone_scale: f32,
    #[serde(default = "default_flora_zone_threshold")]
    pub flora_zone_threshold: f32,
    #[serde(default = "default_flora_placement_scale")]
    pub flora_placement_scale: f32,
    #[serde(default = "default_flora_placement_threshold")]
    pub flora_placement_threshold: f32,
    #[serde(default = "default_min_trunk")]
    pub min_trunk: i32,
    #[serde(default = "default_max_trunk")]
    pub max_trunk: i32,
    #[serde(default)]
    pub lodes: Vec<Lode>,
}
fn default_flora_zone_scale() -> f32 {
    1.3
}
fn default_flora_zone_threshold() -> f32 {
    0.6
}
fn default_flora_placement_scale() -> f32 {
    15.0
}
fn default_flora_placement_threshold() -> f32 {
    0.8
}
fn default_min_trunk() -> i32 {
    5
}
fn default_max_trunk() -> i32 {
    12
}

/// Ore rule: `block` replaces stone strictly between the two heights where
/// the 3D noise clears `threshold`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Lode {
    pub name: String,
    pub block: VoxelId,
    pub min_height: i32,
    pub max_height: i32,
    pub scale: f32,
    pub threshold: f32,
    #[serde(default)]
    pub offset: f32,
}

impl Lode {
    #[inline]
    pub fn in_band(&self, y: i32) -> bool {
        y > self.min_height && y < self.max_height
    }
}

fn lode(name: &str, block: VoxelId, band: (i32, i32), scale: f32, threshold: f32, offset: f32) -> Lode {
    Lode {
        name: name.to_string(),
        block,
        min_height: band.0,
        max_height: band.1,
        scale,
        threshold,
        offset,
    }
}

fn underground() -> Vec<Lode> {
    vec![
        lode("dirt", ids::DIRT, (1, 255), 0.1, 0.5, 0.0),
        lode("gravel", ids::GRAVEL, (1, 60), 0.2, 0.62, 300.0),
        lode("coal", ids::COAL_ORE, (5, 60), 0.2, 0.64, 600.0),
        lode("iron", ids::IRON_ORE, (5, 40), 0.25, 0.68, 900.0),
        lode("caves", ids::AIR, (5, 60), 0.1, 0.63, 43534.0),
    ]
}

pub fn default_biomes() -> Vec<BiomeDef> {
    vec![
        BiomeDef {
            name: "Grasslands".to_string(),
            offset: 1234.0,
            scale: 0.042,
            terrain_height: 22.0,
            terrain_scale: 0.15,
            surface_block: ids::GRASS,
            subsurface_block: ids::DIRT,
            place_flora: true,
            flora_index: 0,
            flora_zone_scale: 1.3,
            flora_zone_threshold: 0.6,
            flora_placement_scale: 15.0,
            flora_placement_threshold: 0.8,
            min_trunk: 5,
            max_trunk: 12,
            lodes: underground(),
        },
        BiomeDef {
            name: "Desert".to_string(),
            offset: 6545.0,
            scale: 0.058,
            terrain_height: 10.0,
            terrain_scale: 0.05,
            surface_block: ids::SAND,
            subsurface_block: ids::SAND,
            place_flora: true,
            flora_index: 1,
            flora_zone_scale: 1.06,
            flora_zone_threshold: 0.75,
            flora_placement_scale: 15.0,
            flora_placement_threshold: 0.8,
            min_trunk: 2,
            max_trunk: 5,
            lodes: underground(),
        },
        BiomeDef {
            name: "Forest".to_string(),
            offset: 64534.0,
            scale: 0.034,
            terrain_height: 80.0,
            terrain_scale: 0.03,
            surface_block: ids::GRASS,
            subsurface_block: ids::DIRT,
            place_flora: true,
            flora_index: 0,
            flora_zone_scale: 1.3,
            flora_zone_threshold: 0.384,
            flora_placement_scale: 5.0,
            flora_placement_threshold: 0.755,
            min_trunk: 5,
            max_trunk: 12,
            lodes: underground(),
        },
    ]
}
