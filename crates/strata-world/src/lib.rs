//! World sizing, configuration, noise, and terrain generation.
#![forbid(unsafe_code)]

pub mod config;
mod coord;
mod error;
pub mod noise;
pub mod structure;
pub mod terrain;

pub use config::{BiomeDef, Lode, TerrainSettings, WorldConfig, WorldSettings};
pub use coord::{ChunkCoord, WorldDims};
pub use error::WorldGenError;
pub use noise::NoiseField;
pub use structure::{FloraKind, ModBatch, VoxelMod, generate_flora};
pub use terrain::{Column, SUBSURFACE_DEPTH, TerrainGen};
