use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

pub struct JobSystem {
    pool: ThreadPool,
    worker_count: usize,
}

impl JobSystem {
    pub fn new(num_threads: usize, name_prefix: &str) -> Result<Self, ThreadPoolBuildError> {
        let prefix = name_prefix.to_string();
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()?;

        Ok(Self {
            pool,
            worker_count: num_threads,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(job);
    }

    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }
}

/// Worker count for meshing pools: leave one core for the driving thread,
/// never fewer than one worker, never more than four.
pub fn mesh_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|parallelism| parallelism.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .clamp(1, 4)
}
