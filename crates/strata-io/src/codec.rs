use strata_chunk::{ChunkData, PersistenceError};
use strata_world::ChunkCoord;

pub const MAGIC: [u8; 4] = *b"STCK";
pub const CHUNK_FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 4 + 4 + 2 + 2;

/// Header (magic, version, cx, cz, width, height; little endian) followed by
/// the lz4-compressed voxel bytes.
pub fn encode_chunk(chunk: &ChunkData) -> Result<Vec<u8>, PersistenceError> {
    let width = u16::try_from(chunk.width)
        .map_err(|_| PersistenceError::Corrupt(format!("width {} too large", chunk.width)))?;
    let height = u16::try_from(chunk.height)
        .map_err(|_| PersistenceError::Corrupt(format!("height {} too large", chunk.height)))?;
    let body = lz4_flex::compress_prepend_size(chunk.voxels());
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    out.push(CHUNK_FORMAT_VERSION);
    out.extend_from_slice(&chunk.coord.cx.to_le_bytes());
    out.extend_from_slice(&chunk.coord.cz.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode_chunk(bytes: &[u8]) -> Result<ChunkData, PersistenceError> {
    if bytes.len() < HEADER_LEN {
        return Err(PersistenceError::Corrupt(format!(
            "{} bytes is shorter than the header",
            bytes.len()
        )));
    }
    if bytes[0..4] != MAGIC {
        return Err(PersistenceError::Corrupt("bad magic".into()));
    }
    if bytes[4] != CHUNK_FORMAT_VERSION {
        return Err(PersistenceError::Corrupt(format!(
            "unsupported chunk format version {}",
            bytes[4]
        )));
    }
    let cx = i32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
    let cz = i32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]);
    let width = u16::from_le_bytes([bytes[13], bytes[14]]) as usize;
    let height = u16::from_le_bytes([bytes[15], bytes[16]]) as usize;
    let voxels = lz4_flex::decompress_size_prepended(&bytes[HEADER_LEN..])
        .map_err(|e| PersistenceError::Corrupt(format!("decompress: {e}")))?;
    let len = voxels.len();
    ChunkData::from_voxels(ChunkCoord::new(cx, cz), width, height, voxels).ok_or_else(|| {
        PersistenceError::Corrupt(format!("{len} voxels do not fill a {width}x{height} chunk"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChunkData {
        let mut c = ChunkData::new(ChunkCoord::new(-3, 7), 4, 6);
        c.set_local(0, 0, 0, 1);
        c.set_local(3, 5, 3, 11);
        c.set_local(2, 1, 0, 9);
        c
    }

    #[test]
    fn encode_decode_preserves_cells_and_coord() {
        let c = sample();
        let back = decode_chunk(&encode_chunk(&c).unwrap()).unwrap();
        assert_eq!(back.coord, c.coord);
        assert_eq!((back.width, back.height), (4, 6));
        assert_eq!(back.voxels(), c.voxels());
    }

    #[test]
    fn damaged_input_is_reported_not_panicked() {
        let bytes = encode_chunk(&sample()).unwrap();
        assert!(decode_chunk(&bytes[..10]).is_err());
        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(decode_chunk(&bad_magic).is_err());
        let mut bad_version = bytes.clone();
        bad_version[4] = 99;
        assert!(decode_chunk(&bad_version).is_err());
        let mut wrong_dims = bytes.clone();
        wrong_dims[13] = 5;
        assert!(decode_chunk(&wrong_dims).is_err());
        let truncated = &bytes[..bytes.len() - 3];
        assert!(decode_chunk(truncated).is_err());
    }
}
