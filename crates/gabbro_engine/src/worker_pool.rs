use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use gabbro_core::events::{channel, EventReceiver, EventSender};
use gabbro_core::jobs::{mesh_worker_count, JobSystem};
use gabbro_shared::block::BlockRegistry;
use gabbro_shared::chunk::ChunkData;
use gabbro_shared::coords::ChunkPos;

use crate::mesh::{build_chunk_mesh, ChunkMeshes, ChunkNeighbors};

/// One meshing job. Carries owned copies of the grids so workers never touch
/// the store's data; neighbor order is +X, -X, +Y, -Y, +Z, -Z.
pub struct MeshJob {
    pub pos: ChunkPos,
    pub chunk: ChunkData,
    pub neighbors: [Option<ChunkData>; 6],
    pub generation: u64,
    pub priority: i32,
}

pub struct MeshJobResult {
    pub pos: ChunkPos,
    pub generation: u64,
    pub outcome: Result<Option<ChunkMeshes>, String>,
}

/// Parallel meshing scheduler. `submit` only queues; `dispatch` hands the
/// highest-priority jobs to idle workers, and `poll` collects finished
/// results and refills the workers that freed up.
pub struct MeshWorkerPool {
    jobs: JobSystem,
    registry: Arc<BlockRegistry>,
    queue: Vec<MeshJob>,
    idle_workers: usize,
    in_flight: usize,
    completed_tx: EventSender<MeshJobResult>,
    completed_rx: EventReceiver<MeshJobResult>,
}

impl MeshWorkerPool {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self::with_worker_count(registry, mesh_worker_count())
    }

    pub fn with_worker_count(registry: Arc<BlockRegistry>, worker_count: usize) -> Self {
        let jobs = JobSystem::new(worker_count, "mesh-worker")
            .expect("failed to create mesh worker thread pool");
        let (completed_tx, completed_rx) = channel();

        Self {
            jobs,
            registry,
            queue: Vec::new(),
            idle_workers: worker_count,
            in_flight: 0,
            completed_tx,
            completed_rx,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.jobs.worker_count()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Queues a job, keeping the queue sorted by descending priority. Equal
    /// priorities stay in submission order.
    pub fn submit(&mut self, job: MeshJob) {
        let index = self
            .queue
            .iter()
            .position(|queued| queued.priority < job.priority)
            .unwrap_or(self.queue.len());
        self.queue.insert(index, job);
    }

    /// Hands queued jobs to idle workers, highest priority first.
    pub fn dispatch(&mut self) {
        while self.idle_workers > 0 && !self.queue.is_empty() {
            let job = self.queue.remove(0);
            self.idle_workers -= 1;
            self.in_flight += 1;

            let completed_tx = self.completed_tx.clone();
            let registry = Arc::clone(&self.registry);
            self.jobs.spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    let neighbors = neighbors_from_array(&job.neighbors);
                    build_chunk_mesh(&job.chunk, &registry, &neighbors)
                }))
                .map_err(panic_message);

                let _ = completed_tx.send(MeshJobResult {
                    pos: job.pos,
                    generation: job.generation,
                    outcome,
                });
            });
        }
    }

    /// Collects every finished result without blocking. Workers that came
    /// back idle immediately pick up the next queued jobs.
    pub fn poll(&mut self) -> Vec<MeshJobResult> {
        let results = self.completed_rx.drain();
        if !results.is_empty() {
            self.idle_workers += results.len();
            self.in_flight -= results.len();
            self.dispatch();
        }
        results
    }
}

/// Closer chunks mesh sooner.
pub fn mesh_priority(pos: ChunkPos, player_chunk: ChunkPos) -> i32 {
    let delta = pos - player_chunk;
    1000 - (delta.x * delta.x + delta.y * delta.y + delta.z * delta.z)
}

pub fn neighbors_from_array(neighbors: &[Option<ChunkData>; 6]) -> ChunkNeighbors<'_> {
    ChunkNeighbors {
        pos_x: neighbors[0].as_ref(),
        neg_x: neighbors[1].as_ref(),
        pos_y: neighbors[2].as_ref(),
        neg_y: neighbors[3].as_ref(),
        pos_z: neighbors[4].as_ref(),
        neg_z: neighbors[5].as_ref(),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "meshing job panicked".to_string()
    }
}
