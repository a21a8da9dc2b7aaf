use std::sync::Arc;

use glam::{IVec3, Vec3};
use rustc_hash::FxHashMap;
use tracing::warn;

use gabbro_shared::block::{BlockId, BlockRegistry};
use gabbro_shared::chunk::ChunkData;
use gabbro_shared::coords::{
    world_to_chunk, ChunkPos, CHUNK_HEIGHT, CHUNK_SIZE, VERTICAL_CHUNKS,
};

use crate::mesh::{build_chunk_mesh, ChunkMeshes};
use crate::store::WorldStore;
use crate::worker_pool::{
    mesh_priority, neighbors_from_array, MeshJob, MeshJobResult, MeshWorkerPool,
};

pub struct ChunkEntry {
    pub chunk: ChunkData,
    pub meshes: Option<ChunkMeshes>,
    pub meshing: bool,
    pub generation: u64,
}

/// Client-side chunk cache. Loads the cuboid of chunks around the player,
/// evicts everything outside it immediately, and keeps per-chunk mesh state
/// current through the worker pool (async) and direct meshing (edits).
pub struct ChunkManager {
    chunks: FxHashMap<ChunkPos, ChunkEntry>,
    pool: MeshWorkerPool,
    registry: Arc<BlockRegistry>,
    render_distance: i32,
    /// Single monotonic source for entry generations. Surviving eviction is
    /// the point: a reloaded chunk always gets a strictly newer generation
    /// than any job issued before the unload, so those results stay stale.
    generation_counter: u64,
}

impl ChunkManager {
    pub fn new(registry: Arc<BlockRegistry>, render_distance: i32) -> Self {
        let pool = MeshWorkerPool::new(Arc::clone(&registry));
        Self::from_pool(registry, render_distance, pool)
    }

    pub fn with_worker_count(
        registry: Arc<BlockRegistry>,
        render_distance: i32,
        worker_count: usize,
    ) -> Self {
        let pool = MeshWorkerPool::with_worker_count(Arc::clone(&registry), worker_count);
        Self::from_pool(registry, render_distance, pool)
    }

    fn from_pool(
        registry: Arc<BlockRegistry>,
        render_distance: i32,
        pool: MeshWorkerPool,
    ) -> Self {
        Self {
            chunks: FxHashMap::default(),
            pool,
            registry,
            render_distance,
            generation_counter: 0,
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation_counter += 1;
        self.generation_counter
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn get_meshes(&self, pos: ChunkPos) -> Option<&ChunkMeshes> {
        self.chunks.get(&pos).and_then(|entry| entry.meshes.as_ref())
    }

    pub fn pending_mesh_count(&self) -> usize {
        self.pool.queued_len() + self.pool.in_flight()
    }

    /// Reconciles the loaded set against the player position: render distance
    /// bounds the horizontal ring, the full vertical column always loads.
    /// Eviction is immediate and purely distance-based.
    pub fn update_player_position(&mut self, store: &WorldStore, player_pos: Vec3) {
        let (player_chunk, _) = world_to_chunk(player_pos.floor().as_ivec3());
        let distance = self.render_distance;

        self.chunks.retain(|pos, _| {
            (pos.x - player_chunk.x).abs() <= distance
                && (pos.z - player_chunk.z).abs() <= distance
                && pos.y >= 0
                && pos.y < VERTICAL_CHUNKS
        });

        for chunk_x in player_chunk.x - distance..=player_chunk.x + distance {
            for chunk_z in player_chunk.z - distance..=player_chunk.z + distance {
                for chunk_y in 0..VERTICAL_CHUNKS {
                    let pos = ChunkPos {
                        x: chunk_x,
                        y: chunk_y,
                        z: chunk_z,
                    };
                    if self.chunks.contains_key(&pos) {
                        continue;
                    }

                    let chunk = store.get_chunk(pos);
                    let neighbors = self.neighbor_grids(pos);
                    let generation = self.next_generation();
                    self.chunks.insert(
                        pos,
                        ChunkEntry {
                            chunk: chunk.clone(),
                            meshes: None,
                            meshing: true,
                            generation,
                        },
                    );
                    self.pool.submit(MeshJob {
                        pos,
                        chunk,
                        neighbors,
                        generation,
                        priority: mesh_priority(pos, player_chunk),
                    });
                }
            }
        }

        self.pool.dispatch();
    }

    /// Applies finished meshing jobs. Stale results are dropped by the
    /// generation check; failed jobs fall back to meshing on this thread so
    /// the chunk still ends up with geometry.
    pub fn poll_mesh_results(&mut self) {
        for result in self.pool.poll() {
            self.apply_result(result);
        }
    }

    fn apply_result(&mut self, result: MeshJobResult) {
        let Some(entry) = self.chunks.get(&result.pos) else {
            return;
        };
        if entry.generation != result.generation {
            return;
        }

        match result.outcome {
            Ok(meshes) => {
                let entry = self
                    .chunks
                    .get_mut(&result.pos)
                    .expect("entry checked above");
                entry.meshes = meshes;
                entry.meshing = false;
            }
            Err(message) => {
                warn!(
                    "Mesh worker failed for chunk ({}, {}, {}): {message}; re-meshing synchronously",
                    result.pos.x, result.pos.y, result.pos.z
                );
                self.remesh_now(result.pos);
            }
        }
    }

    /// Writes one block through the store, then synchronously remeshes the
    /// edited chunk and any loaded neighbor that shares the edited face.
    pub fn apply_block_edit(
        &mut self,
        store: &mut WorldStore,
        world_pos: IVec3,
        block: BlockId,
    ) -> bool {
        if !store.set_block(world_pos, block) {
            return false;
        }

        let (chunk_pos, local) = world_to_chunk(world_pos);
        if let Some(entry) = self.chunks.get_mut(&chunk_pos) {
            entry.chunk = store.get_chunk(chunk_pos);
        }
        self.remesh_now(chunk_pos);

        let size = CHUNK_SIZE as u8;
        let height = CHUNK_HEIGHT as u8;
        let boundary_neighbors = [
            (local.x == 0, ChunkPos { x: -1, y: 0, z: 0 }),
            (local.x == size - 1, ChunkPos { x: 1, y: 0, z: 0 }),
            (local.y == 0, ChunkPos { x: 0, y: -1, z: 0 }),
            (local.y == height - 1, ChunkPos { x: 0, y: 1, z: 0 }),
            (local.z == 0, ChunkPos { x: 0, y: 0, z: -1 }),
            (local.z == size - 1, ChunkPos { x: 0, y: 0, z: 1 }),
        ];
        for (on_boundary, offset) in boundary_neighbors {
            if on_boundary {
                self.remesh_now(chunk_pos + offset);
            }
        }

        true
    }

    /// Meshes a loaded chunk on the calling thread and advances its
    /// generation so any in-flight async result for it gets discarded on
    /// arrival.
    fn remesh_now(&mut self, pos: ChunkPos) {
        if !self.chunks.contains_key(&pos) {
            return;
        }

        let neighbors = self.neighbor_grids(pos);
        let generation = self.next_generation();
        let entry = self.chunks.get_mut(&pos).expect("presence checked above");
        entry.generation = generation;

        let chunk = entry.chunk.clone();
        let meshes = build_chunk_mesh(&chunk, &self.registry, &neighbors_from_array(&neighbors));

        let entry = self.chunks.get_mut(&pos).expect("presence checked above");
        entry.meshes = meshes;
        entry.meshing = false;
    }

    fn neighbor_grids(&self, pos: ChunkPos) -> [Option<ChunkData>; 6] {
        let offsets = [
            ChunkPos { x: 1, y: 0, z: 0 },
            ChunkPos { x: -1, y: 0, z: 0 },
            ChunkPos { x: 0, y: 1, z: 0 },
            ChunkPos { x: 0, y: -1, z: 0 },
            ChunkPos { x: 0, y: 0, z: 1 },
            ChunkPos { x: 0, y: 0, z: -1 },
        ];
        offsets.map(|offset| {
            self.chunks
                .get(&(pos + offset))
                .map(|entry| entry.chunk.clone())
        })
    }
}
