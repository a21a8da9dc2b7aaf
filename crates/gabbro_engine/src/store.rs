use std::io;
use std::path::Path;

use glam::IVec3;
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use gabbro_persist::save::{read_world_file, write_world_file, WorldSave};
use gabbro_shared::block::{is_valid_block_code, BlockId};
use gabbro_shared::chunk::ChunkData;
use gabbro_shared::coords::{world_to_chunk, ChunkPos, WORLD_HEIGHT};
use gabbro_shared::worldgen::WorldGenerator;

/// Canonical block data for one world. Unmodified chunks are regenerated on
/// demand from the seed; a chunk gets its own materialized copy only on the
/// first edit, and from then on that copy is the sole source of truth.
pub struct WorldStore {
    generator: WorldGenerator,
    modified: FxHashMap<ChunkPos, ChunkData>,
}

impl WorldStore {
    pub fn new(seed: i32) -> Self {
        Self {
            generator: WorldGenerator::new(seed),
            modified: FxHashMap::default(),
        }
    }

    pub fn seed(&self) -> i32 {
        self.generator.seed
    }

    pub fn generator(&self) -> &WorldGenerator {
        &self.generator
    }

    /// Block data for a chunk: the edited copy if one exists, otherwise a
    /// fresh baseline. Baselines are deliberately not memoized here.
    pub fn get_chunk(&self, pos: ChunkPos) -> ChunkData {
        match self.modified.get(&pos) {
            Some(chunk) => chunk.clone(),
            None => self.generator.generate_chunk(pos),
        }
    }

    pub fn get_block(&self, world_pos: IVec3) -> BlockId {
        if world_pos.y < 0 || world_pos.y >= WORLD_HEIGHT {
            return BlockId::AIR;
        }

        let (chunk_pos, local) = world_to_chunk(world_pos);
        match self.modified.get(&chunk_pos) {
            Some(chunk) => chunk.get(local),
            None => self.generator.generate_chunk(chunk_pos).get(local),
        }
    }

    /// Writes one block. Returns false without mutating anything when the
    /// target is outside the world column or the block code is not in the
    /// palette. The first edit of a chunk clones the baseline (copy-on-write)
    /// so the generator's output is never mutated in place.
    pub fn set_block(&mut self, world_pos: IVec3, block: BlockId) -> bool {
        if world_pos.y < 0 || world_pos.y >= WORLD_HEIGHT {
            return false;
        }
        if !is_valid_block_code(block.0) {
            return false;
        }

        let (chunk_pos, local) = world_to_chunk(world_pos);
        let chunk = self
            .modified
            .entry(chunk_pos)
            .or_insert_with(|| self.generator.generate_chunk(chunk_pos));
        chunk.set(local, block);
        true
    }

    pub fn is_modified(&self, pos: ChunkPos) -> bool {
        self.modified.contains_key(&pos)
    }

    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    /// Persists all edited chunks. A world with no edits writes nothing.
    pub fn save(&self, dir: &Path, room_id: &str) -> io::Result<()> {
        if self.modified.is_empty() {
            return Ok(());
        }

        let mut chunks: Vec<(ChunkPos, ChunkData)> = self
            .modified
            .iter()
            .map(|(pos, chunk)| (*pos, chunk.clone()))
            .collect();
        chunks.sort_by_key(|(pos, _)| (pos.x, pos.y, pos.z));

        write_world_file(
            dir,
            room_id,
            &WorldSave {
                seed: self.generator.seed,
                chunks,
            },
        )
    }

    /// Replaces the edited-chunk set wholesale from disk. Returns false when
    /// no usable save exists, which callers treat as a fresh world. A corrupt
    /// save counts as unusable, not as an error; only real IO failures
    /// surface as `Err`.
    pub fn load_save(&mut self, dir: &Path, room_id: &str) -> io::Result<bool> {
        let save = match read_world_file(dir, room_id) {
            Ok(Some(save)) => save,
            Ok(None) => return Ok(false),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                warn!("Save for room {room_id} is corrupt: {err}; starting fresh");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        self.generator = WorldGenerator::new(save.seed);
        self.modified = save.chunks.into_iter().collect();
        info!(
            "Loaded {} modified chunks for room {room_id} (seed {})",
            self.modified.len(),
            save.seed
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use glam::IVec3;

    use super::WorldStore;
    use gabbro_shared::block::BlockId;
    use gabbro_shared::coords::{world_to_chunk, ChunkPos};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "gabbro-store-test-{tag}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn edits_are_copy_on_write_and_never_leak_into_baselines() {
        let mut store = WorldStore::new(12345);
        let world_pos = IVec3::new(10, 70, 10);
        let (chunk_pos, local) = world_to_chunk(world_pos);

        let baseline_before = store.generator().generate_chunk(chunk_pos);
        assert!(store.set_block(world_pos, BlockId::BRICK));
        assert!(store.is_modified(chunk_pos));
        assert_eq!(store.get_block(world_pos), BlockId::BRICK);

        // A fresh baseline still carries the pre-edit block.
        let baseline_after = store.generator().generate_chunk(chunk_pos);
        assert_eq!(baseline_after, baseline_before);
        assert_ne!(baseline_after.get(local), BlockId::BRICK);
    }

    #[test]
    fn modified_chunks_survive_repeated_lookups() {
        let mut store = WorldStore::new(7);
        let world_pos = IVec3::new(-5, 64, 33);
        assert!(store.set_block(world_pos, BlockId::GLASS));

        let (chunk_pos, local) = world_to_chunk(world_pos);
        assert_eq!(store.get_chunk(chunk_pos).get(local), BlockId::GLASS);
        assert_eq!(store.get_chunk(chunk_pos).get(local), BlockId::GLASS);
    }

    #[test]
    fn out_of_range_and_invalid_edits_are_rejected() {
        let mut store = WorldStore::new(1);

        assert!(!store.set_block(IVec3::new(4, -1, 4), BlockId::GRASS));
        assert!(!store.set_block(IVec3::new(4, 256, 4), BlockId::GRASS));
        assert!(!store.set_block(IVec3::new(4, 64, 4), BlockId(16)));
        assert_eq!(store.modified_count(), 0);

        assert_eq!(store.get_block(IVec3::new(4, -1, 4)), BlockId::AIR);
        assert_eq!(store.get_block(IVec3::new(4, 300, 4)), BlockId::AIR);
    }

    #[test]
    fn save_and_load_round_trip_restores_edits_and_seed() {
        let dir = temp_dir("roundtrip");
        let mut store = WorldStore::new(2024);
        let edits = [
            (IVec3::new(0, 65, 0), BlockId::PLANKS),
            (IVec3::new(40, 10, -8), BlockId::GLASS),
            (IVec3::new(-100, 200, 55), BlockId::COBBLESTONE),
        ];
        for (pos, block) in edits {
            assert!(store.set_block(pos, block));
        }

        store.save(&dir, "main").expect("save world");

        let mut restored = WorldStore::new(0);
        assert!(restored.load_save(&dir, "main").expect("load world"));
        assert_eq!(restored.seed(), 2024);
        assert_eq!(restored.modified_count(), store.modified_count());
        for (pos, block) in edits {
            assert_eq!(restored.get_block(pos), block);
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_store_save_is_a_no_op_and_missing_save_loads_fresh() {
        let dir = temp_dir("empty");
        let store = WorldStore::new(5);
        store.save(&dir, "main").expect("no-op save");
        assert!(!dir.exists());

        let mut other = WorldStore::new(5);
        assert!(!other.load_save(&dir, "main").expect("missing save"));
        assert_eq!(other.modified_count(), 0);
    }

    #[test]
    fn corrupt_saves_load_as_a_fresh_world() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).expect("create save dir");
        fs::write(dir.join("main.wld"), [1u8, 0, 0]).expect("write truncated save");

        let mut store = WorldStore::new(3);
        assert!(!store
            .load_save(&dir, "main")
            .expect("corrupt save is not an io error"));
        assert_eq!(store.modified_count(), 0);
        assert_eq!(store.seed(), 3);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unmodified_chunks_regenerate_identically() {
        let store = WorldStore::new(99);
        let pos = ChunkPos { x: 2, y: 2, z: -1 };
        assert_eq!(store.get_chunk(pos), store.get_chunk(pos));
        assert!(!store.is_modified(pos));
    }
}
