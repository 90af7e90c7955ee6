//! Block type catalog: ids, solidity, transparency, textures.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use registry::BlockRegistry;
pub use types::{BlockType, FACE_COUNT, VoxelId, ids};
