use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::{HashMap, HashSet};
use strata_blocks::{VoxelId, ids};
use strata_edit::ModSender;
use strata_geom::VoxelPos;
use strata_world::{ChunkCoord, TerrainGen, WorldDims};

use crate::data::ChunkData;
use crate::persist::{ChunkPersistence, WorldMeta};

pub type ChunkHandle = Arc<RwLock<ChunkData>>;

#[inline]
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
pub fn read_chunk(c: &ChunkHandle) -> RwLockReadGuard<'_, ChunkData> {
    c.read().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
pub fn write_chunk(c: &ChunkHandle) -> RwLockWriteGuard<'_, ChunkData> {
    c.write().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of every chunk's voxels and the single source of truth for reads
/// and writes.
///
/// Chunks are created on first request, loaded from the store when it has
/// them, otherwise generated. Flora found while generating goes out on the
/// modification queue instead of being written here. Entries are never
/// removed.
///
/// Locking: the map lock covers the whole check-load-generate sequence, so
/// two threads asking for the same coordinate get the same chunk. A chunk's
/// own lock is never taken while the map lock is held.
pub struct WorldData {
    meta: WorldMeta,
    dims: WorldDims,
    terrain: Arc<TerrainGen>,
    store: Arc<dyn ChunkPersistence>,
    mods: ModSender,
    map: Mutex<HashMap<ChunkCoord, ChunkHandle>>,
    dirty: Mutex<HashSet<ChunkCoord>>,
}

impl WorldData {
    pub fn new(
        meta: WorldMeta,
        terrain: Arc<TerrainGen>,
        store: Arc<dyn ChunkPersistence>,
        mods: ModSender,
    ) -> Self {
        Self {
            meta,
            dims: terrain.dims(),
            terrain,
            store,
            mods,
            map: Mutex::new(HashMap::new()),
            dirty: Mutex::new(HashSet::new()),
        }
    }

    #[inline]
    pub fn meta(&self) -> &WorldMeta {
        &self.meta
    }

    #[inline]
    pub fn dims(&self) -> WorldDims {
        self.dims
    }

    pub fn terrain(&self) -> &TerrainGen {
        &self.terrain
    }

    pub fn store(&self) -> Arc<dyn ChunkPersistence> {
        Arc::clone(&self.store)
    }

    #[inline]
    pub fn in_bounds(&self, pos: VoxelPos) -> bool {
        self.dims.in_bounds(pos)
    }

    pub fn request_chunk(&self, coord: ChunkCoord, create: bool) -> Option<ChunkHandle> {
        if !self.dims.chunk_in_bounds(coord) {
            log::trace!("chunk ({}, {}) is outside the world", coord.cx, coord.cz);
            return None;
        }
        let mut map = lock(&self.map);
        if let Some(h) = map.get(&coord) {
            return Some(Arc::clone(h));
        }
        if !create {
            return None;
        }
        let (chunk, fresh) = match self.load_stored(coord) {
            Some(c) => (c, false),
            None => (self.generate(coord), true),
        };
        let handle = Arc::new(RwLock::new(chunk));
        map.insert(coord, Arc::clone(&handle));
        drop(map);
        if fresh {
            self.mark_dirty(coord);
        }
        Some(handle)
    }

    fn load_stored(&self, coord: ChunkCoord) -> Option<ChunkData> {
        match self.store.load_chunk(&self.meta.name, coord) {
            Ok(Some(c))
                if c.width == self.dims.chunk_width
                    && c.height == self.dims.chunk_height
                    && c.coord == coord =>
            {
                log::debug!("loaded chunk ({}, {}) from store", coord.cx, coord.cz);
                Some(c)
            }
            Ok(Some(c)) => {
                log::warn!(
                    "stored chunk ({}, {}) is {}x{} at ({}, {}); regenerating",
                    coord.cx,
                    coord.cz,
                    c.width,
                    c.height,
                    c.coord.cx,
                    c.coord.cz
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!(
                    "failed to load chunk ({}, {}): {}; regenerating",
                    coord.cx,
                    coord.cz,
                    e
                );
                None
            }
        }
    }

    fn generate(&self, coord: ChunkCoord) -> ChunkData {
        let mut chunk = ChunkData::new(coord, self.dims.chunk_width, self.dims.chunk_height);
        let mut flora = Vec::new();
        chunk.populate(&self.terrain, &mut flora);
        log::debug!(
            "generated chunk ({}, {}) with {} flora batch(es)",
            coord.cx,
            coord.cz,
            flora.len()
        );
        for batch in flora {
            self.mods.send(batch);
        }
        chunk
    }

    pub fn get_voxel(&self, pos: VoxelPos) -> VoxelId {
        if !self.dims.in_bounds(pos) {
            log::trace!("read outside world at {:?}", pos);
            return ids::AIR;
        }
        let (coord, lx, ly, lz) = self.dims.split(pos);
        let Some(h) = self.request_chunk(coord, true) else {
            return ids::AIR;
        };
        read_chunk(&h).get_local(lx, ly, lz).unwrap_or(ids::AIR)
    }

    /// Write through to the owning chunk and mark it dirty. Returns the
    /// replaced id, or `None` when nothing was written: outside the world,
    /// or on the bedrock floor, which no write may change.
    pub fn set_voxel(&self, pos: VoxelPos, id: VoxelId) -> Option<VoxelId> {
        if !self.dims.in_bounds(pos) {
            log::trace!("write outside world at {:?} ignored", pos);
            return None;
        }
        if pos.y == 0 {
            log::trace!("write to bedrock floor at {:?} ignored", pos);
            return None;
        }
        let (coord, lx, ly, lz) = self.dims.split(pos);
        let h = self.request_chunk(coord, true)?;
        let prev = write_chunk(&h).set_local(lx, ly, lz, id)?;
        self.mark_dirty(coord);
        Some(prev)
    }

    pub fn mark_dirty(&self, coord: ChunkCoord) {
        lock(&self.dirty).insert(coord);
    }

    pub fn is_dirty(&self, coord: ChunkCoord) -> bool {
        lock(&self.dirty).contains(&coord)
    }

    pub fn dirty_count(&self) -> usize {
        lock(&self.dirty).len()
    }

    /// Drain the dirty set, pairing each coordinate with its chunk.
    pub fn take_dirty(&self) -> Vec<(ChunkCoord, ChunkHandle)> {
        let coords: Vec<ChunkCoord> = lock(&self.dirty).drain().collect();
        let map = lock(&self.map);
        coords
            .into_iter()
            .filter_map(|c| map.get(&c).map(|h| (c, Arc::clone(h))))
            .collect()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        lock(&self.map).contains_key(&coord)
    }

    pub fn chunk_count(&self) -> usize {
        lock(&self.map).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use strata_edit::mod_channel;
    use strata_world::WorldConfig;

    fn small_world() -> (WorldData, strata_edit::ModReceiver, Arc<MemoryStore>) {
        let mut cfg = WorldConfig::default();
        cfg.world.size_in_chunks = 4;
        let terrain = Arc::new(TerrainGen::from_config(&cfg).unwrap());
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mod_channel();
        let world = WorldData::new(WorldMeta::new("t", 0), terrain, store.clone(), tx);
        (world, rx, store)
    }

    #[test]
    fn request_is_idempotent() {
        let (world, _rx, _) = small_world();
        let c = ChunkCoord::new(1, 2);
        let a = world.request_chunk(c, true).unwrap();
        let b = world.request_chunk(c, true).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(world.chunk_count(), 1);
    }

    #[test]
    fn request_without_create_does_not_allocate() {
        let (world, _rx, _) = small_world();
        assert!(world.request_chunk(ChunkCoord::new(0, 0), false).is_none());
        assert_eq!(world.chunk_count(), 0);
        assert!(world.request_chunk(ChunkCoord::new(-1, 0), true).is_none());
        assert!(world.request_chunk(ChunkCoord::new(0, 4), true).is_none());
    }

    #[test]
    fn fresh_chunks_are_dirty_loaded_ones_are_not() {
        let (world, _rx, store) = small_world();
        let c = ChunkCoord::new(0, 0);
        let mut saved = ChunkData::new(c, 16, 128);
        saved.set_local(1, 1, 1, ids::GLASS);
        store.save_chunk(&saved, "t").unwrap();
        let h = world.request_chunk(c, true).unwrap();
        assert_eq!(read_chunk(&h).get_local(1, 1, 1), Some(ids::GLASS));
        assert!(!world.is_dirty(c));
        world.request_chunk(ChunkCoord::new(1, 0), true).unwrap();
        assert!(world.is_dirty(ChunkCoord::new(1, 0)));
    }

    struct CorruptStore;

    impl ChunkPersistence for CorruptStore {
        fn load_chunk(
            &self,
            _world_name: &str,
            coord: ChunkCoord,
        ) -> Result<Option<ChunkData>, crate::persist::PersistenceError> {
            Err(crate::persist::PersistenceError::Corrupt(format!(
                "bad header for ({}, {})",
                coord.cx, coord.cz
            )))
        }

        fn save_chunk(
            &self,
            _chunk: &ChunkData,
            _world_name: &str,
        ) -> Result<(), crate::persist::PersistenceError> {
            Ok(())
        }
    }

    #[test]
    fn unreadable_stored_chunk_is_regenerated() {
        let mut cfg = WorldConfig::default();
        cfg.world.size_in_chunks = 4;
        let terrain = Arc::new(TerrainGen::from_config(&cfg).unwrap());
        let (tx, _rx) = mod_channel();
        let world = WorldData::new(WorldMeta::new("t", 0), terrain, Arc::new(CorruptStore), tx);
        let c = ChunkCoord::new(1, 1);
        let h = world.request_chunk(c, true).unwrap();
        let chunk = read_chunk(&h);
        assert_eq!(chunk.coord, c);
        assert_eq!((chunk.width, chunk.height), (16, 128));
        assert_eq!(chunk.get_local(0, 0, 0), Some(ids::BEDROCK));
        assert_eq!(chunk.get_local(15, 0, 15), Some(ids::BEDROCK));
        assert!(world.is_dirty(c));
    }

    #[test]
    fn wrong_sized_stored_chunk_is_regenerated() {
        let (world, _rx, store) = small_world();
        let c = ChunkCoord::new(2, 2);
        store.save_chunk(&ChunkData::new(c, 8, 8), "t").unwrap();
        let h = world.request_chunk(c, true).unwrap();
        let chunk = read_chunk(&h);
        assert_eq!((chunk.width, chunk.height), (16, 128));
        assert_eq!(chunk.get_local(0, 0, 0), Some(ids::BEDROCK));
    }

    #[test]
    fn set_voxel_marks_dirty_and_returns_previous() {
        let (world, _rx, _) = small_world();
        let p = VoxelPos::new(20, 120, 3);
        world.request_chunk(ChunkCoord::new(1, 0), true);
        world.take_dirty();
        assert_eq!(world.set_voxel(p, ids::PLANKS), Some(ids::AIR));
        assert_eq!(world.get_voxel(p), ids::PLANKS);
        assert!(world.is_dirty(ChunkCoord::new(1, 0)));
        let taken = world.take_dirty();
        assert_eq!(taken.len(), 1);
        assert_eq!(world.dirty_count(), 0);
    }

    #[test]
    fn bedrock_floor_is_immutable() {
        let (world, _rx, _) = small_world();
        let p = VoxelPos::new(3, 0, 3);
        assert_eq!(world.get_voxel(p), ids::BEDROCK);
        assert_eq!(world.set_voxel(p, ids::AIR), None);
        assert_eq!(world.get_voxel(p), ids::BEDROCK);
    }
}
