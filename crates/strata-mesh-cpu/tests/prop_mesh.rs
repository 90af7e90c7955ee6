use std::sync::Arc;

use proptest::prelude::*;
use strata_blocks::{BlockRegistry, ids};
use strata_chunk::{ChunkData, MemoryStore, WorldData, WorldMeta, read_chunk};
use strata_edit::mod_channel;
use strata_mesh_cpu::{EmptySurroundings, build_chunk_mesh};
use strata_world::{ChunkCoord, TerrainGen, WorldConfig};

fn cells() -> impl Strategy<Value = Vec<((usize, usize, usize), u8)>> {
    prop::collection::vec(((0usize..6, 0usize..6, 0usize..6), 0u8..16), 0..60)
}

proptest! {
    // Buffers stay in lockstep: 4 vertices, 4 normals, 4 uvs and 6 indices per face
    #[test]
    fn buffer_lengths_agree(cells in cells()) {
        let reg = BlockRegistry::builtin();
        let mut c = ChunkData::new(ChunkCoord::new(0, 0), 6, 6);
        for ((x, y, z), id) in &cells {
            c.set_local(*x, *y, *z, *id);
        }
        let m = build_chunk_mesh(&c, &reg, &EmptySurroundings, 16);
        let faces = m.face_count();
        prop_assert_eq!(m.pos.len(), faces * 12);
        prop_assert_eq!(m.norm.len(), faces * 12);
        prop_assert_eq!(m.uv.len(), faces * 8);
        prop_assert!(faces <= cells.len() * 6);
        let vc = m.vertex_count() as u32;
        prop_assert!(m.opaque.iter().chain(&m.transparent).all(|i| *i < vc));
    }
}

#[test]
fn generated_chunk_meshes_without_hidden_underground_faces() {
    let mut cfg = WorldConfig::default();
    cfg.world.size_in_chunks = 3;
    let terrain = Arc::new(TerrainGen::from_config(&cfg).unwrap());
    let (tx, _rx) = mod_channel();
    let world = WorldData::new(WorldMeta::new("m", 0), terrain, Arc::new(MemoryStore::new()), tx);
    let reg = BlockRegistry::builtin();
    let h = world.request_chunk(ChunkCoord::new(1, 1), true).unwrap();
    let chunk = read_chunk(&h);
    let m = build_chunk_mesh(&chunk, &reg, &world, 16);
    assert!(!m.is_empty());
    // A naive all-faces mesh would be far larger than the culled one.
    let solids = chunk.voxels().iter().filter(|v| reg.is_solid(**v)).count();
    assert!(m.face_count() < solids * 3);
    // Bedrock bottoms face out of the world, which reads as air.
    assert!(m.norm.chunks(3).any(|n| n == [0.0, -1.0, 0.0]));
    drop(chunk);
    assert_eq!(world.get_voxel(strata_geom::VoxelPos::new(20, 0, 20)), ids::BEDROCK);
}
