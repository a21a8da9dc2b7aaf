use tracing::warn;

use gabbro_shared::protocol::{decode, C2S, S2C};

use crate::store::WorldStore;

/// Handles one inbound payload against the store. Malformed messages and
/// rejected edits are dropped with a log line; neither disconnects the
/// session nor touches store state.
pub fn handle_client_message(store: &mut WorldStore, raw: &[u8], player_id: u64) -> Option<S2C> {
    let message = match decode::<C2S>(raw) {
        Ok(message) => message,
        Err(err) => {
            warn!("Dropping malformed message from player {player_id}: {err}");
            return None;
        }
    };

    match message {
        C2S::RequestChunk { pos } => {
            let chunk = store.get_chunk(pos);
            Some(S2C::ChunkData {
                pos,
                data: chunk.as_bytes().to_vec(),
            })
        }
        C2S::BlockUpdate { world_pos, block } => {
            if store.set_block(world_pos, block) {
                Some(S2C::BlockChanged {
                    world_pos,
                    block,
                    player_id,
                })
            } else {
                warn!(
                    "Rejected block update at ({}, {}, {}) from player {player_id}",
                    world_pos.x, world_pos.y, world_pos.z
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::handle_client_message;
    use crate::store::WorldStore;
    use gabbro_shared::block::BlockId;
    use gabbro_shared::coords::{ChunkPos, CHUNK_VOLUME};
    use gabbro_shared::protocol::{encode, C2S, S2C};

    #[test]
    fn malformed_payloads_are_dropped_without_side_effects() {
        let mut store = WorldStore::new(5);
        assert!(handle_client_message(&mut store, &[0xde, 0xad, 0xbe], 1).is_none());
        assert_eq!(store.modified_count(), 0);
    }

    #[test]
    fn chunk_requests_return_the_full_grid() {
        let mut store = WorldStore::new(12345);
        let pos = ChunkPos { x: 0, y: 2, z: 0 };
        let raw = encode(&C2S::RequestChunk { pos });

        let reply = handle_client_message(&mut store, &raw, 7).expect("chunk reply");
        match reply {
            S2C::ChunkData {
                pos: reply_pos,
                data,
            } => {
                assert_eq!(reply_pos, pos);
                assert_eq!(data.len(), CHUNK_VOLUME);
                assert_eq!(data, store.get_chunk(pos).as_bytes());
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn valid_edits_are_applied_and_broadcast() {
        let mut store = WorldStore::new(9);
        let world_pos = IVec3::new(3, 80, -12);
        let raw = encode(&C2S::BlockUpdate {
            world_pos,
            block: BlockId::GLASS,
        });

        let reply = handle_client_message(&mut store, &raw, 42).expect("broadcast");
        assert_eq!(
            reply,
            S2C::BlockChanged {
                world_pos,
                block: BlockId::GLASS,
                player_id: 42,
            }
        );
        assert_eq!(store.get_block(world_pos), BlockId::GLASS);
    }

    #[test]
    fn out_of_range_edits_are_rejected() {
        let mut store = WorldStore::new(9);
        let raw = encode(&C2S::BlockUpdate {
            world_pos: IVec3::new(0, 300, 0),
            block: BlockId::STONE,
        });

        assert!(handle_client_message(&mut store, &raw, 1).is_none());
        assert_eq!(store.modified_count(), 0);
    }
}
