use gabbro_shared::block::{BlockId, BlockRegistry};
use gabbro_shared::chunk::ChunkData;
use gabbro_shared::coords::{LocalPos, CHUNK_SIZE};

const SIZE: i32 = CHUNK_SIZE as i32;
const MASK_CELLS: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Brightness per ambient-occlusion level 0..3.
const AO_BRIGHTNESS: [f32; 4] = [0.4, 0.6, 0.8, 1.0];

/// Water top faces sit this far below the block ceiling.
const WATER_TOP_OFFSET: f32 = 0.1;

/// One renderable geometry buffer: parallel per-vertex arrays plus triangle
/// indices. Positions are chunk-local; the renderer offsets by chunk origin.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffer {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }
}

/// Opaque and water geometry kept apart so the renderer can draw water in a
/// separate translucent pass.
#[derive(Debug, Clone, Default)]
pub struct ChunkMeshes {
    pub opaque: MeshBuffer,
    pub water: MeshBuffer,
}

/// Borrowed face-adjacent neighbor grids. An absent neighbor reads as all
/// air at the shared boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkNeighbors<'a> {
    pub pos_x: Option<&'a ChunkData>,
    pub neg_x: Option<&'a ChunkData>,
    pub pos_y: Option<&'a ChunkData>,
    pub neg_y: Option<&'a ChunkData>,
    pub pos_z: Option<&'a ChunkData>,
    pub neg_z: Option<&'a ChunkData>,
}

struct FaceSpec {
    axis: usize,
    sign: i32,
    u_axis: usize,
    v_axis: usize,
    normal: [f32; 3],
}

// u_axis cross v_axis points along the outward normal, so the shared
// (0,1,2),(0,2,3) triangulation winds counter-clockwise for every face.
const FACES: [FaceSpec; 6] = [
    FaceSpec {
        axis: 0,
        sign: 1,
        u_axis: 1,
        v_axis: 2,
        normal: [1.0, 0.0, 0.0],
    },
    FaceSpec {
        axis: 0,
        sign: -1,
        u_axis: 2,
        v_axis: 1,
        normal: [-1.0, 0.0, 0.0],
    },
    FaceSpec {
        axis: 1,
        sign: 1,
        u_axis: 2,
        v_axis: 0,
        normal: [0.0, 1.0, 0.0],
    },
    FaceSpec {
        axis: 1,
        sign: -1,
        u_axis: 0,
        v_axis: 2,
        normal: [0.0, -1.0, 0.0],
    },
    FaceSpec {
        axis: 2,
        sign: 1,
        u_axis: 0,
        v_axis: 1,
        normal: [0.0, 0.0, 1.0],
    },
    FaceSpec {
        axis: 2,
        sign: -1,
        u_axis: 1,
        v_axis: 0,
        normal: [0.0, 0.0, -1.0],
    },
];

/// Builds greedy-merged geometry for one chunk. Returns `None` when no face
/// is visible at all (fully air, or fully buried).
pub fn build_chunk_mesh(
    chunk: &ChunkData,
    registry: &BlockRegistry,
    neighbors: &ChunkNeighbors<'_>,
) -> Option<ChunkMeshes> {
    let mut meshes = ChunkMeshes::default();
    let mut mask = [BlockId::AIR; MASK_CELLS];
    let mut visited = [false; MASK_CELLS];

    for face in &FACES {
        for slice in 0..SIZE {
            let mut any_visible = false;
            mask.fill(BlockId::AIR);

            for v in 0..SIZE {
                for u in 0..SIZE {
                    let mut cell = [0i32; 3];
                    cell[face.axis] = slice;
                    cell[face.u_axis] = u;
                    cell[face.v_axis] = v;

                    let block = chunk.get(LocalPos {
                        x: cell[0] as u8,
                        y: cell[1] as u8,
                        z: cell[2] as u8,
                    });
                    if block == BlockId::AIR {
                        continue;
                    }

                    let mut adjacent_cell = cell;
                    adjacent_cell[face.axis] += face.sign;
                    let adjacent = sample_block(
                        chunk,
                        neighbors,
                        adjacent_cell[0],
                        adjacent_cell[1],
                        adjacent_cell[2],
                    );

                    if face_visible(registry, block, adjacent) {
                        mask[(v * SIZE + u) as usize] = block;
                        any_visible = true;
                    }
                }
            }

            if !any_visible {
                continue;
            }

            greedy_merge_slice(
                &mut meshes,
                &mask,
                &mut visited,
                chunk,
                registry,
                neighbors,
                face,
                slice,
            );
        }
    }

    if meshes.opaque.is_empty() && meshes.water.is_empty() {
        None
    } else {
        Some(meshes)
    }
}

/// A face is drawn against air and against transparent blocks of a different
/// type. Same-type transparent neighbors (water against water) suppress it,
/// so bodies of water have no internal walls.
fn face_visible(registry: &BlockRegistry, block: BlockId, adjacent: BlockId) -> bool {
    if adjacent == BlockId::AIR {
        return true;
    }
    registry.is_transparent(adjacent) && adjacent != block
}

/// Block lookup that may step one cell outside the chunk along a single
/// axis, redirecting into the matching neighbor grid. Diagonal escapes (two
/// axes out at once, reachable only by AO corner probes at chunk corners)
/// read as air since edge-diagonal chunks are not passed in.
fn sample_block(
    chunk: &ChunkData,
    neighbors: &ChunkNeighbors<'_>,
    x: i32,
    y: i32,
    z: i32,
) -> BlockId {
    let outside = [x, y, z]
        .iter()
        .filter(|&&coord| !(0..SIZE).contains(&coord))
        .count();
    if outside > 1 {
        return BlockId::AIR;
    }

    let lookup = |neighbor: Option<&ChunkData>, lx: i32, ly: i32, lz: i32| {
        neighbor
            .map(|data| {
                data.get(LocalPos {
                    x: lx as u8,
                    y: ly as u8,
                    z: lz as u8,
                })
            })
            .unwrap_or(BlockId::AIR)
    };

    if x < 0 {
        lookup(neighbors.neg_x, x + SIZE, y, z)
    } else if x >= SIZE {
        lookup(neighbors.pos_x, x - SIZE, y, z)
    } else if y < 0 {
        lookup(neighbors.neg_y, x, y + SIZE, z)
    } else if y >= SIZE {
        lookup(neighbors.pos_y, x, y - SIZE, z)
    } else if z < 0 {
        lookup(neighbors.neg_z, x, y, z + SIZE)
    } else if z >= SIZE {
        lookup(neighbors.pos_z, x, y, z - SIZE)
    } else {
        chunk.get(LocalPos {
            x: x as u8,
            y: y as u8,
            z: z as u8,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn greedy_merge_slice(
    meshes: &mut ChunkMeshes,
    mask: &[BlockId; MASK_CELLS],
    visited: &mut [bool; MASK_CELLS],
    chunk: &ChunkData,
    registry: &BlockRegistry,
    neighbors: &ChunkNeighbors<'_>,
    face: &FaceSpec,
    slice: i32,
) {
    visited.fill(false);

    for v0 in 0..SIZE {
        for u0 in 0..SIZE {
            let start = (v0 * SIZE + u0) as usize;
            if visited[start] || mask[start] == BlockId::AIR {
                continue;
            }
            let block = mask[start];

            // Extend the run rightward while the block type matches.
            let mut width = 1;
            while u0 + width < SIZE {
                let index = (v0 * SIZE + u0 + width) as usize;
                if visited[index] || mask[index] != block {
                    break;
                }
                width += 1;
            }

            // Then grow downward while every cell of the candidate row matches.
            let mut height = 1;
            'grow: while v0 + height < SIZE {
                for u in u0..u0 + width {
                    let index = ((v0 + height) * SIZE + u) as usize;
                    if visited[index] || mask[index] != block {
                        break 'grow;
                    }
                }
                height += 1;
            }

            for v in v0..v0 + height {
                for u in u0..u0 + width {
                    visited[(v * SIZE + u) as usize] = true;
                }
            }

            emit_quad(
                meshes, chunk, registry, neighbors, face, slice, block, u0, v0, width, height,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_quad(
    meshes: &mut ChunkMeshes,
    chunk: &ChunkData,
    registry: &BlockRegistry,
    neighbors: &ChunkNeighbors<'_>,
    face: &FaceSpec,
    slice: i32,
    block: BlockId,
    u0: i32,
    v0: i32,
    width: i32,
    height: i32,
) {
    let props = registry.get_properties(block);
    let face_color = if face.axis == 1 && face.sign > 0 {
        props.face_color_top()
    } else if face.axis == 1 && face.sign < 0 {
        props.face_color_bottom()
    } else {
        props.color
    };

    let corner_points = [
        (u0, v0),
        (u0 + width, v0),
        (u0 + width, v0 + height),
        (u0, v0 + height),
    ];
    let corner_signs = [(-1, -1), (1, -1), (1, 1), (-1, 1)];

    let mut ao = [0u8; 4];
    for (index, &(su, sv)) in corner_signs.iter().enumerate() {
        // The quad cell touching this corner, from which the three AO probes
        // step outward.
        let cell_u = if su > 0 { u0 + width - 1 } else { u0 };
        let cell_v = if sv > 0 { v0 + height - 1 } else { v0 };
        ao[index] = corner_ao(chunk, registry, neighbors, face, slice, cell_u, cell_v, su, sv);
    }

    let is_water = block == BlockId::WATER;
    let is_water_top = is_water && face.axis == 1 && face.sign > 0;
    let target = if is_water {
        &mut meshes.water
    } else {
        &mut meshes.opaque
    };

    let plane = slice + if face.sign > 0 { 1 } else { 0 };
    let base = target.vertex_count() as u32;

    for (index, &(cu, cv)) in corner_points.iter().enumerate() {
        let mut position = [0f32; 3];
        position[face.axis] = plane as f32;
        position[face.u_axis] = cu as f32;
        position[face.v_axis] = cv as f32;
        if is_water_top {
            position[1] -= WATER_TOP_OFFSET;
        }

        let brightness = AO_BRIGHTNESS[usize::from(ao[index])];
        target.positions.extend_from_slice(&position);
        target.normals.extend_from_slice(&face.normal);
        target.colors.extend_from_slice(&[
            face_color[0] * brightness,
            face_color[1] * brightness,
            face_color[2] * brightness,
        ]);
    }

    // Split along the brighter diagonal so AO interpolation has no seam.
    if ao[0] + ao[2] > ao[1] + ao[3] {
        target
            .indices
            .extend_from_slice(&[base + 1, base + 2, base + 3, base + 1, base + 3, base]);
    } else {
        target
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Occlusion level for one quad corner: probe the two side cells and the
/// diagonal cell in the layer the face looks into. Both sides solid pins the
/// level to zero no matter what the diagonal holds.
#[allow(clippy::too_many_arguments)]
fn corner_ao(
    chunk: &ChunkData,
    registry: &BlockRegistry,
    neighbors: &ChunkNeighbors<'_>,
    face: &FaceSpec,
    slice: i32,
    cell_u: i32,
    cell_v: i32,
    su: i32,
    sv: i32,
) -> u8 {
    let layer = slice + face.sign;
    let probe = |du: i32, dv: i32| -> bool {
        let mut cell = [0i32; 3];
        cell[face.axis] = layer;
        cell[face.u_axis] = cell_u + du;
        cell[face.v_axis] = cell_v + dv;
        registry.is_solid(sample_block(chunk, neighbors, cell[0], cell[1], cell[2]))
    };

    let side1 = probe(su, 0);
    let side2 = probe(0, sv);
    let corner = probe(su, sv);

    if side1 && side2 {
        0
    } else {
        3 - (u8::from(side1) + u8::from(side2) + u8::from(corner))
    }
}
