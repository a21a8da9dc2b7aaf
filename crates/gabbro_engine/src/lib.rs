pub mod chunk_manager;
pub mod config;
pub mod mesh;
pub mod net;
pub mod store;
pub mod worker_pool;
