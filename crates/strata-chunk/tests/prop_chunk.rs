use std::sync::Arc;

use strata_blocks::ids;
use strata_chunk::{ChunkData, ChunkPersistence, MemoryStore, WorldData, WorldMeta};
use strata_edit::mod_channel;
use strata_geom::VoxelPos;
use strata_world::{ChunkCoord, TerrainGen, WorldConfig};
use proptest::prelude::*;

fn dim() -> impl Strategy<Value = usize> {
    1usize..=8
}

fn small_i32() -> impl Strategy<Value = i32> {
    -1_000_000i32..=1_000_000
}

// 2x2 chunks of 4x16x4 voxels: cheap enough to build per case.
fn tiny_world() -> WorldData {
    let mut cfg = WorldConfig::default();
    cfg.world.size_in_chunks = 2;
    cfg.world.chunk_width = 4;
    cfg.world.chunk_height = 16;
    let terrain = Arc::new(TerrainGen::from_config(&cfg).unwrap());
    let (tx, _rx) = mod_channel();
    WorldData::new(WorldMeta::new("prop", 5), terrain, Arc::new(MemoryStore::new()), tx)
}

fn out_of_bounds_pos() -> impl Strategy<Value = VoxelPos> {
    prop_oneof![
        (-50i32..0, 0i32..16, 0i32..8),
        (8i32..60, 0i32..16, 0i32..8),
        (0i32..8, -40i32..0, 0i32..8),
        (0i32..8, 16i32..80, 0i32..8),
        (0i32..8, 0i32..16, -50i32..0),
        (0i32..8, 0i32..16, 8i32..60),
    ]
    .prop_map(|(x, y, z)| VoxelPos::new(x, y, z))
}

proptest! {
    // idx maps each (x,y,z) within bounds to unique in-range indices
    #[test]
    fn idx_is_unique_and_in_range(cx in small_i32(), cz in small_i32(), w in dim(), h in dim()) {
        let chunk = ChunkData::new(ChunkCoord::new(cx, cz), w, h);
        let expect = w * h * w;
        let mut seen = vec![false; expect];
        for x in 0..w { for y in 0..h { for z in 0..w {
            let i = chunk.idx(x, y, z);
            prop_assert!(i < expect);
            prop_assert!(!seen[i]);
            seen[i] = true;
        }}}
        prop_assert!(seen.into_iter().all(|b| b));
    }

    // Local accessors refuse anything past the edge instead of wrapping
    #[test]
    fn local_access_is_bounds_checked(w in dim(), h in dim(), x in 0usize..12, y in 0usize..12, z in 0usize..12) {
        let mut chunk = ChunkData::new(ChunkCoord::new(0, 0), w, h);
        let inside = x < w && y < h && z < w;
        prop_assert_eq!(chunk.set_local(x, y, z, ids::GLASS).is_some(), inside);
        prop_assert_eq!(chunk.get_local(x, y, z), if inside { Some(ids::GLASS) } else { None });
        let others = chunk.voxels().iter().filter(|v| **v == ids::GLASS).count();
        prop_assert_eq!(others, usize::from(inside));
    }

    // contains_world and get_world agree with the chunk's origin
    #[test]
    fn world_addressing_matches_origin(cx in -1000i32..1000, cz in -1000i32..1000, w in dim(), h in dim(),
                                       dx in -2i32..10, y in -2i32..10, dz in -2i32..10) {
        let chunk = ChunkData::new(ChunkCoord::new(cx, cz), w, h);
        let (x0, z0) = chunk.origin();
        let pos = VoxelPos::new(x0 + dx, y, z0 + dz);
        let inside = dx >= 0 && dx < w as i32 && dz >= 0 && dz < w as i32 && y >= 0 && y < h as i32;
        prop_assert_eq!(chunk.contains_world(pos), inside);
        prop_assert_eq!(chunk.get_world(pos).is_some(), inside);
    }

    // Out-of-world reads are air and writes change nothing
    #[test]
    fn out_of_bounds_reads_air_and_ignores_writes(pos in out_of_bounds_pos(), id in 1u8..16) {
        let world = tiny_world();
        prop_assert_eq!(world.get_voxel(pos), ids::AIR);
        prop_assert_eq!(world.set_voxel(pos, id), None);
        prop_assert_eq!(world.get_voxel(pos), ids::AIR);
        prop_assert_eq!(world.dirty_count(), 0);
    }

    // Any sequence of edits leaves the bedrock floor untouched
    #[test]
    fn bedrock_survives_edit_sequences(edits in prop::collection::vec((0i32..8, 0i32..3, 0i32..8, 0u8..16), 1..40)) {
        let world = tiny_world();
        for (x, y, z, id) in &edits {
            world.set_voxel(VoxelPos::new(*x, *y, *z), *id);
        }
        for x in 0..8 { for z in 0..8 {
            prop_assert_eq!(world.get_voxel(VoxelPos::new(x, 0, z)), ids::BEDROCK);
        }}
    }
}

#[test]
fn concurrent_requests_share_one_chunk() {
    let world = Arc::new(tiny_world());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let world = world.clone();
            std::thread::spawn(move || world.request_chunk(ChunkCoord::new(1, 1), true).unwrap())
        })
        .collect();
    let chunks: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for c in &chunks[1..] {
        assert!(Arc::ptr_eq(&chunks[0], c));
    }
    assert_eq!(world.chunk_count(), 1);
}

#[test]
fn memory_store_round_trip() {
    let store = MemoryStore::new();
    let world = tiny_world();
    let handle = world.request_chunk(ChunkCoord::new(1, 0), true).unwrap();
    let original = handle.read().unwrap().clone();
    store.save_chunk(&original, "w").unwrap();
    let loaded = store.load_chunk("w", ChunkCoord::new(1, 0)).unwrap().unwrap();
    assert_eq!(loaded.voxels(), original.voxels());
    assert!(store.load_chunk("other", ChunkCoord::new(1, 0)).unwrap().is_none());
}
