use std::sync::Mutex;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strata_blocks::VoxelId;
use strata_world::ChunkCoord;
use thiserror::Error;

use crate::data::ChunkData;

pub const WORLD_FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMeta {
    pub name: String,
    pub seed: i32,
    #[serde(default = "default_version")]
    pub version: u32,
}
fn default_version() -> u32 {
    WORLD_FORMAT_VERSION
}

impl WorldMeta {
    pub fn new(name: impl Into<String>, seed: i32) -> Self {
        Self {
            name: name.into(),
            seed,
            version: WORLD_FORMAT_VERSION,
        }
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt chunk data: {0}")]
    Corrupt(String),

    #[error("world metadata: {0}")]
    Meta(String),
}

/// Per-chunk storage behind the registry. Implementations are shared with
/// the background save thread.
pub trait ChunkPersistence: Send + Sync {
    fn load_chunk(
        &self,
        world_name: &str,
        coord: ChunkCoord,
    ) -> Result<Option<ChunkData>, PersistenceError>;

    fn save_chunk(&self, chunk: &ChunkData, world_name: &str) -> Result<(), PersistenceError>;
}

/// In-process store for tests and throwaway worlds.
#[derive(Default)]
pub struct MemoryStore {
    chunks: Mutex<HashMap<(String, ChunkCoord), (usize, usize, Vec<VoxelId>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChunkPersistence for MemoryStore {
    fn load_chunk(
        &self,
        world_name: &str,
        coord: ChunkCoord,
    ) -> Result<Option<ChunkData>, PersistenceError> {
        let chunks = self
            .chunks
            .lock()
            .map_err(|_| PersistenceError::Corrupt("memory store poisoned".into()))?;
        let Some((width, height, voxels)) = chunks.get(&(world_name.to_string(), coord)) else {
            return Ok(None);
        };
        ChunkData::from_voxels(coord, *width, *height, voxels.clone())
            .map(Some)
            .ok_or_else(|| PersistenceError::Corrupt(format!("chunk {coord:?} has wrong length")))
    }

    fn save_chunk(&self, chunk: &ChunkData, world_name: &str) -> Result<(), PersistenceError> {
        let mut chunks = self
            .chunks
            .lock()
            .map_err(|_| PersistenceError::Corrupt("memory store poisoned".into()))?;
        chunks.insert(
            (world_name.to_string(), chunk.coord),
            (chunk.width, chunk.height, chunk.voxels().to_vec()),
        );
        Ok(())
    }
}
