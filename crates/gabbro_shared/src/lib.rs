pub mod block;
pub mod chunk;
pub mod coords;
pub mod protocol;
pub mod worldgen;
