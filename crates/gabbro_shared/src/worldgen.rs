use noise::{NoiseFn, Perlin, Value};

use crate::block::BlockId;
use crate::chunk::ChunkData;
use crate::coords::{ChunkPos, LocalPos, CHUNK_HEIGHT, CHUNK_SIZE};

pub const WATER_LEVEL: i32 = 60;
pub const BASE_HEIGHT: f64 = 64.0;
pub const AMPLITUDE: f64 = 30.0;

/// Surfaces at or below this height are beach sand rather than grass.
const SAND_MAX_HEIGHT: i32 = 62;

const OCTAVE_FREQUENCIES: [f64; 4] = [0.01, 0.02, 0.04, 0.08];
const OCTAVE_AMPLITUDES: [f64; 4] = [1.0, 0.5, 0.25, 0.125];

const CAVE_SCALE: f64 = 0.05;
const CAVE_THRESHOLD: f64 = 0.6;
const CAVE_MIN_Y: i32 = 1;
const CAVE_MAX_Y: i32 = 50;

const GOLD_MAX_Y: i32 = 20;
const GOLD_CHANCE: f64 = 0.003;
const IRON_MAX_Y: i32 = 40;
const IRON_CHANCE: f64 = 0.008;
const COAL_MAX_Y: i32 = 60;
const COAL_CHANCE: f64 = 0.015;

const FLOWER_SALT: i32 = 7;
const FLOWER_CHANCE: f64 = 0.02;

const TREE_SALT: i32 = 42;
const TREE_CHANCE: f64 = 0.016;
/// Columns this close to a chunk edge never grow trees, so a canopy can
/// never clip across a chunk boundary.
const TREE_EDGE_MARGIN: usize = 2;
const CANOPY_RADIUS: f64 = 2.5;

/// Deterministic terrain source. Every chunk is a pure function of the seed
/// and its position, so peers regenerate identical baseline terrain without
/// ever shipping unmodified chunks over the wire.
#[derive(Debug, Clone)]
pub struct WorldGenerator {
    pub seed: i32,
}

impl WorldGenerator {
    pub fn new(seed: i32) -> Self {
        Self { seed }
    }

    pub fn generate_chunk(&self, pos: ChunkPos) -> ChunkData {
        let height_noise = Value::new(self.seed as u32);
        let cave_noise = Perlin::new(self.seed as u32);

        let mut chunk = ChunkData::new_empty();
        let base_y = pos.y * CHUNK_HEIGHT as i32;
        let mut heights = [[0i32; CHUNK_SIZE]; CHUNK_SIZE];

        // Pass 1: column fill, cave carving, ore placement.
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let world_x = pos.x * CHUNK_SIZE as i32 + lx as i32;
                let world_z = pos.z * CHUNK_SIZE as i32 + lz as i32;
                let surface = column_height(&height_noise, world_x, world_z);
                heights[lz][lx] = surface;

                for ly in 0..CHUNK_HEIGHT {
                    let world_y = base_y + ly as i32;
                    let mut block = column_block(surface, world_y);

                    if block == BlockId::STONE
                        && world_y > CAVE_MIN_Y
                        && world_y < CAVE_MAX_Y
                        && cave_noise.get([
                            f64::from(world_x) * CAVE_SCALE,
                            f64::from(world_y) * CAVE_SCALE,
                            f64::from(world_z) * CAVE_SCALE,
                        ]) > CAVE_THRESHOLD
                    {
                        block = BlockId::AIR;
                    }

                    if block == BlockId::STONE {
                        block = ore_for(self.seed, world_x, world_y, world_z);
                    }

                    chunk.set(
                        LocalPos {
                            x: lx as u8,
                            y: ly as u8,
                            z: lz as u8,
                        },
                        block,
                    );
                }
            }
        }

        // Pass 2: flowers on grass above the waterline.
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let surface = heights[lz][lx];
                if surface <= SAND_MAX_HEIGHT || surface <= WATER_LEVEL {
                    continue;
                }

                let world_x = pos.x * CHUNK_SIZE as i32 + lx as i32;
                let world_z = pos.z * CHUNK_SIZE as i32 + lz as i32;
                if column_hash(self.seed.wrapping_add(FLOWER_SALT), world_x, world_z)
                    < FLOWER_CHANCE
                {
                    set_world_y(&mut chunk, base_y, lx, surface + 1, lz, BlockId::FLOWER);
                }
            }
        }

        // Pass 3: trees, interior columns only.
        for lz in TREE_EDGE_MARGIN..CHUNK_SIZE - TREE_EDGE_MARGIN {
            for lx in TREE_EDGE_MARGIN..CHUNK_SIZE - TREE_EDGE_MARGIN {
                let surface = heights[lz][lx];
                if surface <= SAND_MAX_HEIGHT || surface <= WATER_LEVEL {
                    continue;
                }

                let world_x = pos.x * CHUNK_SIZE as i32 + lx as i32;
                let world_z = pos.z * CHUNK_SIZE as i32 + lz as i32;
                let hash = column_hash(self.seed.wrapping_add(TREE_SALT), world_x, world_z);
                if hash > TREE_CHANCE {
                    continue;
                }

                let trunk_height = 4 + ((hash * 1000.0).floor() as i32).rem_euclid(3);
                for step in 1..=trunk_height {
                    set_world_y(&mut chunk, base_y, lx, surface + step, lz, BlockId::WOOD);
                }

                let canopy_center_y = surface + trunk_height;
                let reach = CANOPY_RADIUS.floor() as i32;
                for dy in -reach..=reach {
                    for dz in -reach..=reach {
                        for dx in -reach..=reach {
                            let dist_sq = f64::from(dx * dx + dy * dy + dz * dz);
                            if dist_sq > CANOPY_RADIUS * CANOPY_RADIUS {
                                continue;
                            }

                            let leaf_x = (lx as i32 + dx) as usize;
                            let leaf_z = (lz as i32 + dz) as usize;
                            let leaf_y = canopy_center_y + dy;
                            if !slab_contains(base_y, leaf_y) {
                                continue;
                            }

                            let local = LocalPos {
                                x: leaf_x as u8,
                                y: (leaf_y - base_y) as u8,
                                z: leaf_z as u8,
                            };
                            if chunk.get(local) != BlockId::WOOD {
                                chunk.set(local, BlockId::LEAVES);
                            }
                        }
                    }
                }
            }
        }

        chunk
    }

    /// Surface height for one column, exactly as `generate_chunk` computes it.
    pub fn height_at(&self, world_x: i32, world_z: i32) -> i32 {
        column_height(&Value::new(self.seed as u32), world_x, world_z)
    }
}

pub fn get_height_at(seed: i32, world_x: i32, world_z: i32) -> i32 {
    WorldGenerator::new(seed).height_at(world_x, world_z)
}

fn column_height(height_noise: &Value, world_x: i32, world_z: i32) -> i32 {
    let wx = f64::from(world_x);
    let wz = f64::from(world_z);

    let mut sum = 0.0;
    let mut total_amplitude = 0.0;
    for (frequency, amplitude) in OCTAVE_FREQUENCIES.iter().zip(OCTAVE_AMPLITUDES.iter()) {
        sum += height_noise.get([wx * frequency, wz * frequency]) * amplitude;
        total_amplitude += amplitude;
    }

    (BASE_HEIGHT + (sum / total_amplitude) * AMPLITUDE).floor() as i32
}

fn column_block(surface: i32, world_y: i32) -> BlockId {
    if world_y == surface {
        if surface <= SAND_MAX_HEIGHT {
            BlockId::SAND
        } else {
            BlockId::GRASS
        }
    } else if world_y < surface && world_y >= surface - 3 {
        BlockId::DIRT
    } else if world_y < surface {
        BlockId::STONE
    } else if world_y <= WATER_LEVEL {
        BlockId::WATER
    } else {
        BlockId::AIR
    }
}

fn ore_for(seed: i32, world_x: i32, world_y: i32, world_z: i32) -> BlockId {
    let hash = feature_hash(seed, world_x, world_y, world_z);
    if world_y < GOLD_MAX_Y && hash < GOLD_CHANCE {
        BlockId::GOLD_ORE
    } else if world_y < IRON_MAX_Y && hash < IRON_CHANCE {
        BlockId::IRON_ORE
    } else if world_y < COAL_MAX_Y && hash < COAL_CHANCE {
        BlockId::COAL_ORE
    } else {
        BlockId::STONE
    }
}

/// Integer-mix hash in [0, 1). Independent of the noise generators so feature
/// placement never correlates with terrain shape.
fn feature_hash(seed: i32, world_x: i32, world_y: i32, world_z: i32) -> f64 {
    let mut hash = (seed as u64)
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    hash = hash.wrapping_add((world_x as i64 as u64).wrapping_mul(2654435761));
    hash = hash.wrapping_add((world_y as i64 as u64).wrapping_mul(22695477));
    hash = hash.wrapping_add((world_z as i64 as u64).wrapping_mul(40503));
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    (hash >> 11) as f64 / (1u64 << 53) as f64
}

fn column_hash(seed: i32, world_x: i32, world_z: i32) -> f64 {
    feature_hash(seed, world_x, 0, world_z)
}

fn slab_contains(base_y: i32, world_y: i32) -> bool {
    world_y >= base_y && world_y < base_y + CHUNK_HEIGHT as i32
}

fn set_world_y(
    chunk: &mut ChunkData,
    base_y: i32,
    lx: usize,
    world_y: i32,
    lz: usize,
    block: BlockId,
) {
    if slab_contains(base_y, world_y) {
        chunk.set(
            LocalPos {
                x: lx as u8,
                y: (world_y - base_y) as u8,
                z: lz as u8,
            },
            block,
        );
    }
}
