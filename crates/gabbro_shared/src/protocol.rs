use glam::IVec3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::coords::ChunkPos;

pub const PROTOCOL_VERSION: u32 = 1;

/// Messages inbound to the world core. Transport and session framing are
/// handled elsewhere; only the payload shapes matter here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum C2S {
    RequestChunk { pos: ChunkPos },
    BlockUpdate { world_pos: IVec3, block: BlockId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum S2C {
    /// Full block grid for one chunk, flat byte array in index order.
    ChunkData { pos: ChunkPos, data: Vec<u8> },
    BlockChanged {
        world_pos: IVec3,
        block: BlockId,
        player_id: u64,
    },
}

pub fn encode<T: Serialize>(msg: &T) -> Vec<u8> {
    bincode::serialize(msg).expect("failed to encode protocol payload")
}

pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, bincode::Error> {
    bincode::deserialize(data)
}
