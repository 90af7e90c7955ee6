//! Chunk voxel storage and the world chunk registry.
#![forbid(unsafe_code)]

mod data;
pub mod persist;
mod world;

pub use data::ChunkData;
pub use persist::{ChunkPersistence, MemoryStore, PersistenceError, WorldMeta};
pub use world::{ChunkHandle, WorldData, read_chunk, write_chunk};
