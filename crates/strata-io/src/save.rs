use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use strata_chunk::{ChunkData, ChunkPersistence, PersistenceError, WorldData, WorldMeta, read_chunk};
use strata_world::ChunkCoord;

use crate::codec::{decode_chunk, encode_chunk};

const META_FILE: &str = "world.toml";
const CHUNK_DIR: &str = "chunks";

/// Disk layout: `<root>/<world>/world.toml` and
/// `<root>/<world>/chunks/<cx>-<cz>.chunk`.
#[derive(Clone, Debug)]
pub struct SaveSystem {
    root: PathBuf,
}

impl SaveSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn world_dir(&self, world_name: &str) -> PathBuf {
        self.root.join(world_name)
    }

    fn chunk_path(&self, world_name: &str, coord: ChunkCoord) -> PathBuf {
        self.world_dir(world_name)
            .join(CHUNK_DIR)
            .join(format!("{}-{}.chunk", coord.cx, coord.cz))
    }

    /// Saved metadata for `name`, or fresh metadata with `seed` written out
    /// immediately.
    pub fn load_world(&self, name: &str, seed: i32) -> Result<WorldMeta, PersistenceError> {
        let path = self.world_dir(name).join(META_FILE);
        if path.exists() {
            let s = fs::read_to_string(&path)?;
            let meta: WorldMeta =
                toml::from_str(&s).map_err(|e| PersistenceError::Meta(e.to_string()))?;
            log::info!("loaded world '{}' (seed {})", meta.name, meta.seed);
            return Ok(meta);
        }
        let meta = WorldMeta::new(name, seed);
        self.save_meta(&meta)?;
        log::info!("created world '{}' (seed {})", name, seed);
        Ok(meta)
    }

    pub fn save_meta(&self, meta: &WorldMeta) -> Result<(), PersistenceError> {
        let dir = self.world_dir(&meta.name);
        fs::create_dir_all(&dir)?;
        let s = toml::to_string(meta).map_err(|e| PersistenceError::Meta(e.to_string()))?;
        write_atomic(&dir.join(META_FILE), s.as_bytes())
    }

    /// Write metadata now, then every dirty chunk on a background thread
    /// through the world's own store. The dirty set is cleared up front;
    /// chunks that fail to save are marked dirty again. The handle yields
    /// how many chunks were written.
    pub fn save_world(
        &self,
        world: &Arc<WorldData>,
    ) -> Result<JoinHandle<Result<usize, PersistenceError>>, PersistenceError> {
        self.save_meta(world.meta())?;
        let dirty = world.take_dirty();
        let world = Arc::clone(world);
        log::info!(
            "saving world '{}': {} dirty chunk(s)",
            world.meta().name,
            dirty.len()
        );
        let handle = thread::Builder::new()
            .name("strata-save".into())
            .spawn(move || {
                let store = world.store();
                let name = world.meta().name.clone();
                let mut saved = 0usize;
                let mut first_err = None;
                for (coord, handle) in dirty {
                    let snapshot = read_chunk(&handle).clone();
                    match store.save_chunk(&snapshot, &name) {
                        Ok(()) => saved += 1,
                        Err(e) => {
                            log::warn!("failed to save chunk ({}, {}): {}", coord.cx, coord.cz, e);
                            world.mark_dirty(coord);
                            first_err.get_or_insert(e);
                        }
                    }
                }
                log::info!("saved {} chunk(s) of '{}'", saved, name);
                match first_err {
                    Some(e) => Err(e),
                    None => Ok(saved),
                }
            })?;
        Ok(handle)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl ChunkPersistence for SaveSystem {
    fn load_chunk(
        &self,
        world_name: &str,
        coord: ChunkCoord,
    ) -> Result<Option<ChunkData>, PersistenceError> {
        let path = self.chunk_path(world_name, coord);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let chunk = decode_chunk(&bytes)?;
        if chunk.coord != coord {
            return Err(PersistenceError::Corrupt(format!(
                "{} holds chunk ({}, {})",
                path.display(),
                chunk.coord.cx,
                chunk.coord.cz
            )));
        }
        Ok(Some(chunk))
    }

    fn save_chunk(&self, chunk: &ChunkData, world_name: &str) -> Result<(), PersistenceError> {
        let path = self.chunk_path(world_name, chunk.coord);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let bytes = encode_chunk(chunk)?;
        log::trace!("writing {} ({} bytes)", path.display(), bytes.len());
        write_atomic(&path, &bytes)
    }
}
