//! On-disk world saves: metadata plus one compressed file per chunk.
#![forbid(unsafe_code)]

pub mod codec;
mod save;

pub use codec::{decode_chunk, encode_chunk};
pub use save::SaveSystem;
