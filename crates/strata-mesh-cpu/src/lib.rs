//! Face-culled chunk meshing on the CPU.
#![forbid(unsafe_code)]

mod face;
mod mesh_build;

pub use face::{CUBE_CORNERS, Face};
pub use mesh_build::{MeshBuffers, atlas_uv};

use strata_blocks::{BlockRegistry, VoxelId, ids};
use strata_chunk::{ChunkData, WorldData};
use strata_geom::VoxelPos;

/// Voxel lookup for cells outside the chunk being meshed.
pub trait VoxelSource {
    fn voxel_at(&self, pos: VoxelPos) -> VoxelId;
}

/// Reads through the registry, creating neighbors on demand. Positions
/// outside the world read as air.
impl VoxelSource for WorldData {
    #[inline]
    fn voxel_at(&self, pos: VoxelPos) -> VoxelId {
        self.get_voxel(pos)
    }
}

/// Everything outside the chunk is air.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptySurroundings;

impl VoxelSource for EmptySurroundings {
    #[inline]
    fn voxel_at(&self, _pos: VoxelPos) -> VoxelId {
        ids::AIR
    }
}

/// Build geometry for every visible face of `chunk`.
///
/// A face is emitted when the voxel is solid and the neighbor across the face
/// is transparent. Cells past the chunk's side or vertical edges are read
/// from `neighbors`. Each face lands in the opaque or transparent index list
/// according to its own block, not the neighbor's.
pub fn build_chunk_mesh(
    chunk: &ChunkData,
    reg: &BlockRegistry,
    neighbors: &dyn VoxelSource,
    atlas_per_row: u32,
) -> MeshBuffers {
    let mut out = MeshBuffers::default();
    let (w, h) = (chunk.width as i32, chunk.height as i32);
    let (x0, z0) = chunk.origin();
    let voxels = chunk.voxels();

    let lookup = |x: i32, y: i32, z: i32| -> VoxelId {
        if x >= 0 && x < w && y >= 0 && y < h && z >= 0 && z < w {
            voxels[chunk.idx(x as usize, y as usize, z as usize)]
        } else {
            neighbors.voxel_at(VoxelPos::new(x0 + x, y, z0 + z))
        }
    };

    for y in 0..h {
        for x in 0..w {
            for z in 0..w {
                let id = voxels[chunk.idx(x as usize, y as usize, z as usize)];
                if !reg.is_solid(id) {
                    continue;
                }
                let transparent = reg.is_transparent(id);
                for face in Face::ALL {
                    let (dx, dy, dz) = face.delta();
                    if !reg.is_transparent(lookup(x + dx, y + dy, z + dz)) {
                        continue;
                    }
                    let uvs = atlas_uv(reg.texture(id, face.index()), atlas_per_row);
                    out.add_face(face, x as f32, y as f32, z as f32, uvs, transparent);
                }
            }
        }
    }

    log::trace!(
        "meshed chunk ({}, {}): {} faces",
        chunk.coord.cx,
        chunk.coord.cz,
        out.face_count()
    );
    out
}
