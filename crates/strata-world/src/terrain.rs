use strata_blocks::{VoxelId, ids};
use strata_geom::VoxelPos;

use crate::config::{BiomeDef, TerrainSettings, WorldConfig};
use crate::coord::WorldDims;
use crate::error::WorldGenError;
use crate::noise::NoiseField;
use crate::structure::{ModBatch, generate_flora};

/// Voxels below the surface that take the biome's subsurface block.
pub const SUBSURFACE_DEPTH: i32 = 4;

/// Per-column result of the biome blend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub height: i32,
    /// Index of the strongest-weighted biome.
    pub biome: usize,
}

/// Procedural voxel source: `position -> block id`.
///
/// Height is the average of every biome's positive contribution on top of
/// the solid ground height. Surface, subsurface, lodes and flora come from
/// the single strongest biome only. Flora is never written here; each
/// placement is pushed as a batch for the caller to apply later.
pub struct TerrainGen {
    terrain: TerrainSettings,
    biomes: Vec<BiomeDef>,
    dims: WorldDims,
    noise: NoiseField,
}

impl TerrainGen {
    pub fn new(
        terrain: TerrainSettings,
        biomes: Vec<BiomeDef>,
        dims: WorldDims,
        seed: i32,
    ) -> Result<Self, WorldGenError> {
        if dims.chunk_width == 0 || dims.chunk_height == 0 || dims.size_in_chunks == 0 {
            return Err(WorldGenError::InvalidDimensions(format!(
                "chunk {}x{} in a world of {} chunks",
                dims.chunk_width, dims.chunk_height, dims.size_in_chunks
            )));
        }
        if biomes.is_empty() {
            return Err(WorldGenError::NoBiomes);
        }
        if let Some(b) = biomes.iter().find(|b| {
            ![b.offset, b.scale, b.terrain_height, b.terrain_scale]
                .iter()
                .all(|v| v.is_finite())
        }) {
            return Err(WorldGenError::DegenerateBiomes(format!(
                "biome '{}' has non-finite noise parameters",
                b.name
            )));
        }
        // Weights are never negative, so only a positive height can lift a column.
        if !biomes.iter().any(|b| b.terrain_height > 0.0) {
            return Err(WorldGenError::DegenerateBiomes(
                "no biome has a positive terrain_height".into(),
            ));
        }
        log::debug!(
            "terrain generator ready: {} biome(s), seed {}, ground {}",
            biomes.len(),
            seed,
            terrain.solid_ground_height
        );
        Ok(Self {
            terrain,
            biomes,
            dims,
            noise: NoiseField::new(seed, dims.chunk_width),
        })
    }

    pub fn from_config(cfg: &WorldConfig) -> Result<Self, WorldGenError> {
        Self::new(
            cfg.terrain.clone(),
            cfg.biomes.clone(),
            cfg.dims(),
            cfg.world.seed,
        )
    }

    #[inline]
    pub fn dims(&self) -> WorldDims {
        self.dims
    }

    #[inline]
    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    pub fn column(&self, x: i32, z: i32) -> Column {
        let (fx, fz) = (x as f32, z as f32);
        let mut biome = 0usize;
        let mut strongest = f32::NEG_INFINITY;
        let mut sum = 0.0f32;
        let mut count = 0u32;
        for (i, b) in self.biomes.iter().enumerate() {
            let weight = self.noise.sample2d(fx, fz, b.offset, b.scale);
            if weight > strongest {
                strongest = weight;
                biome = i;
            }
            let h = b.terrain_height * self.noise.sample2d(fx, fz, 0.0, b.terrain_scale) * weight;
            if h > 0.0 {
                sum += h;
                count += 1;
            }
        }
        let base = self.terrain.solid_ground_height;
        let height = if count > 0 {
            (sum / count as f32).floor() as i32 + base
        } else {
            base
        };
        Column { height, biome }
    }

    #[inline]
    pub fn column_height(&self, x: i32, z: i32) -> i32 {
        self.column(x, z).height
    }

    pub fn biome_at(&self, x: i32, z: i32) -> &BiomeDef {
        &self.biomes[self.column(x, z).biome]
    }

    pub fn generate_voxel(&self, pos: VoxelPos, flora: &mut Vec<ModBatch>) -> VoxelId {
        if !self.dims.in_bounds(pos) {
            return ids::AIR;
        }
        if pos.y == 0 {
            return ids::BEDROCK;
        }
        let column = self.column(pos.x, pos.z);
        self.generate_in_column(pos, column, flora)
    }

    /// Same as [`generate_voxel`](Self::generate_voxel) with the column blend
    /// already computed, so chunk population pays for it once per column.
    pub fn generate_in_column(
        &self,
        pos: VoxelPos,
        column: Column,
        flora: &mut Vec<ModBatch>,
    ) -> VoxelId {
        if !self.dims.in_bounds(pos) {
            return ids::AIR;
        }
        if pos.y == 0 {
            return ids::BEDROCK;
        }
        let Some(b) = self.biomes.get(column.biome) else {
            return ids::AIR;
        };
        let (y, h) = (pos.y, column.height);
        let stone = self.terrain.stone_block;

        let mut id = if y == h {
            if h > self.terrain.snow_line {
                self.terrain.snow_block
            } else {
                b.surface_block
            }
        } else if y < h && y > h - SUBSURFACE_DEPTH {
            b.subsurface_block
        } else if y > h {
            ids::AIR
        } else {
            stone
        };

        if id == stone {
            let (fx, fy, fz) = (pos.x as f32, pos.y as f32, pos.z as f32);
            for lode in &b.lodes {
                if lode.in_band(y)
                    && self
                        .noise
                        .sample3d(fx, fy, fz, lode.offset, lode.scale, lode.threshold)
                {
                    id = lode.block;
                }
            }
        }

        if y == h && b.place_flora {
            let (fx, fz) = (pos.x as f32, pos.z as f32);
            let zone = self.noise.sample2d(fx, fz, 0.0, b.flora_zone_scale);
            if zone > b.flora_zone_threshold {
                let placement = self.noise.sample2d(fx, fz, 0.0, b.flora_placement_scale);
                if placement > b.flora_placement_threshold {
                    let batch =
                        generate_flora(b.flora_index, pos, b.min_trunk, b.max_trunk, &self.noise);
                    if !batch.is_empty() {
                        flora.push(batch);
                    }
                }
            }
        }

        id
    }
}
