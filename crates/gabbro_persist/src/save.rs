use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use gabbro_shared::chunk::ChunkData;
use gabbro_shared::coords::{ChunkPos, CHUNK_VOLUME};

pub const SAVE_FORMAT_VERSION: i32 = 1;
pub const SAVE_FILE_EXTENSION: &str = "wld";

const HEADER_BYTES: usize = 12;
const CHUNK_RECORD_BYTES: usize = 12 + CHUNK_VOLUME;

/// The modified chunks of one world, as written to disk.
///
/// Layout, little-endian:
/// `[i32 version][i32 seed][i32 chunk_count]` followed by one
/// `[i32 cx][i32 cy][i32 cz][32768 block bytes]` record per chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSave {
    pub seed: i32,
    pub chunks: Vec<(ChunkPos, ChunkData)>,
}

pub fn save_path(dir: &Path, room_id: &str) -> PathBuf {
    dir.join(format!("{room_id}.{SAVE_FILE_EXTENSION}"))
}

pub fn encode_save(save: &WorldSave) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_BYTES + save.chunks.len() * CHUNK_RECORD_BYTES);
    out.extend_from_slice(&SAVE_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&save.seed.to_le_bytes());
    out.extend_from_slice(&(save.chunks.len() as i32).to_le_bytes());

    for (pos, chunk) in &save.chunks {
        out.extend_from_slice(&pos.x.to_le_bytes());
        out.extend_from_slice(&pos.y.to_le_bytes());
        out.extend_from_slice(&pos.z.to_le_bytes());
        out.extend_from_slice(chunk.as_bytes());
    }

    out
}

/// Decodes a save payload. An unknown format version is not fatal: the world
/// starts fresh, so the result is `Ok(None)`. Truncated or malformed payloads
/// are real corruption and surface as errors.
pub fn decode_save(bytes: &[u8]) -> io::Result<Option<WorldSave>> {
    if bytes.len() < HEADER_BYTES {
        return Err(corrupt("save file shorter than its header"));
    }

    let version = read_i32(bytes, 0);
    if version != SAVE_FORMAT_VERSION {
        warn!("Ignoring save with unsupported format version {version} (expected {SAVE_FORMAT_VERSION})");
        return Ok(None);
    }

    let seed = read_i32(bytes, 4);
    let chunk_count = read_i32(bytes, 8);
    if chunk_count < 0 {
        return Err(corrupt("negative chunk count in save header"));
    }

    let chunk_count = chunk_count as usize;
    let expected = HEADER_BYTES + chunk_count * CHUNK_RECORD_BYTES;
    if bytes.len() != expected {
        return Err(corrupt(&format!(
            "save file is {} bytes but {chunk_count} chunks require {expected}",
            bytes.len()
        )));
    }

    let mut chunks = Vec::with_capacity(chunk_count);
    for index in 0..chunk_count {
        let offset = HEADER_BYTES + index * CHUNK_RECORD_BYTES;
        let pos = ChunkPos {
            x: read_i32(bytes, offset),
            y: read_i32(bytes, offset + 4),
            z: read_i32(bytes, offset + 8),
        };
        let blocks = &bytes[offset + 12..offset + CHUNK_RECORD_BYTES];
        let chunk = ChunkData::from_bytes(blocks)
            .ok_or_else(|| corrupt("chunk record has the wrong block count"))?;
        chunks.push((pos, chunk));
    }

    Ok(Some(WorldSave { seed, chunks }))
}

/// Writes the save through a temp file so a crash mid-write never clobbers
/// the previous save.
pub fn write_world_file(dir: &Path, room_id: &str, save: &WorldSave) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    let path = save_path(dir, room_id);
    let tmp_path = path.with_extension(format!("{SAVE_FILE_EXTENSION}.tmp"));
    fs::write(&tmp_path, encode_save(save))?;
    fs::rename(&tmp_path, &path)?;

    info!(
        "Saved {} modified chunks to {}",
        save.chunks.len(),
        path.display()
    );
    Ok(())
}

/// Reads a world save. A missing file means a fresh world, not an error.
pub fn read_world_file(dir: &Path, room_id: &str) -> io::Result<Option<WorldSave>> {
    let path = save_path(dir, room_id);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    decode_save(&bytes)
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(raw)
}

fn corrupt(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{
        decode_save, encode_save, read_world_file, save_path, write_world_file, WorldSave,
        SAVE_FORMAT_VERSION,
    };
    use gabbro_shared::block::BlockId;
    use gabbro_shared::chunk::ChunkData;
    use gabbro_shared::coords::{ChunkPos, LocalPos, CHUNK_VOLUME};

    fn temp_save_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "gabbro-save-test-{tag}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample_save() -> WorldSave {
        let mut chunk_a = ChunkData::new_filled(BlockId::STONE);
        chunk_a.set(LocalPos { x: 0, y: 5, z: 9 }, BlockId::GOLD_ORE);
        let mut chunk_b = ChunkData::new_empty();
        chunk_b.set(LocalPos { x: 31, y: 0, z: 31 }, BlockId::BRICK);

        WorldSave {
            seed: 987654,
            chunks: vec![
                (ChunkPos { x: -2, y: 1, z: 3 }, chunk_a),
                (ChunkPos { x: 0, y: 7, z: 0 }, chunk_b),
            ],
        }
    }

    #[test]
    fn encode_decode_round_trip_preserves_everything() {
        let save = sample_save();
        let bytes = encode_save(&save);

        assert_eq!(bytes.len(), 12 + 2 * (12 + CHUNK_VOLUME));
        let decoded = decode_save(&bytes)
            .expect("decode save")
            .expect("save should be recognized");
        assert_eq!(decoded, save);
    }

    #[test]
    fn version_mismatch_reads_as_no_save() {
        let mut bytes = encode_save(&sample_save());
        bytes[0..4].copy_from_slice(&(SAVE_FORMAT_VERSION + 1).to_le_bytes());

        let decoded = decode_save(&bytes).expect("version mismatch is not an io error");
        assert!(decoded.is_none());
    }

    #[test]
    fn truncated_payload_is_corruption() {
        let bytes = encode_save(&sample_save());
        assert!(decode_save(&bytes[..bytes.len() - 1]).is_err());
        assert!(decode_save(&bytes[..8]).is_err());
    }

    #[test]
    fn file_round_trip_and_missing_file() {
        let dir = temp_save_dir("roundtrip");
        let save = sample_save();

        assert!(read_world_file(&dir, "alpha")
            .expect("missing dir reads as no save")
            .is_none());

        write_world_file(&dir, "alpha", &save).expect("write save");
        let restored = read_world_file(&dir, "alpha")
            .expect("read save back")
            .expect("save exists");
        assert_eq!(restored, save);

        assert!(save_path(&dir, "alpha").ends_with("alpha.wld"));
        let _ = fs::remove_dir_all(&dir);
    }
}
