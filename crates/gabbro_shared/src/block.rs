use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Block-type code stored per voxel. The full palette fits in a byte; chunks
/// are flat byte arrays on disk and on the wire.
#[repr(transparent)]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Pod,
    Zeroable,
)]
pub struct BlockId(pub u8);

impl BlockId {
    pub const AIR: Self = Self(0);
    pub const GRASS: Self = Self(1);
    pub const DIRT: Self = Self(2);
    pub const STONE: Self = Self(3);
    pub const SAND: Self = Self(4);
    pub const WATER: Self = Self(5);
    pub const WOOD: Self = Self(6);
    pub const LEAVES: Self = Self(7);
    pub const COAL_ORE: Self = Self(8);
    pub const IRON_ORE: Self = Self(9);
    pub const GOLD_ORE: Self = Self(10);
    pub const GLASS: Self = Self(11);
    pub const COBBLESTONE: Self = Self(12);
    pub const PLANKS: Self = Self(13);
    pub const BRICK: Self = Self(14);
    pub const FLOWER: Self = Self(15);

    pub const MAX: Self = Self::FLOWER;
}

pub fn is_valid_block_code(code: u8) -> bool {
    code <= BlockId::MAX.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockProperties {
    pub name: String,
    /// Base RGB in the unit interval; side faces always use this.
    pub color: [f32; 3],
    /// Distinct colors for +Y / -Y faces where a block has them (grass).
    #[serde(default)]
    pub top_color: Option<[f32; 3]>,
    #[serde(default)]
    pub bottom_color: Option<[f32; 3]>,
    pub solid: bool,
    pub transparent: bool,
}

impl BlockProperties {
    pub fn face_color_top(&self) -> [f32; 3] {
        self.top_color.unwrap_or(self.color)
    }

    pub fn face_color_bottom(&self) -> [f32; 3] {
        self.bottom_color.unwrap_or(self.color)
    }
}

#[derive(Default, Debug, Clone)]
pub struct BlockRegistry {
    properties: Vec<BlockProperties>,
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn register(&mut self, props: BlockProperties) -> BlockId {
        if let Some(existing) = self.by_name.get(props.name.as_str()) {
            return *existing;
        }

        let next_index = self.properties.len();
        let id = BlockId(
            u8::try_from(next_index).expect("block registry exceeded BlockId capacity (u8::MAX)"),
        );

        self.by_name.insert(props.name.clone(), id);
        self.properties.push(props);
        id
    }

    pub fn get_properties(&self, id: BlockId) -> &BlockProperties {
        self.properties
            .get(id.0 as usize)
            .or_else(|| self.properties.get(BlockId::AIR.0 as usize))
            .expect("block registry is empty; call register_default_blocks() first")
    }

    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get_properties(id).solid
    }

    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.get_properties(id).transparent
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

pub fn register_default_blocks() -> BlockRegistry {
    fn block(name: &str, color: [f32; 3], solid: bool, transparent: bool) -> BlockProperties {
        BlockProperties {
            name: name.to_string(),
            color,
            top_color: None,
            bottom_color: None,
            solid,
            transparent,
        }
    }

    let mut registry = BlockRegistry::new();

    let defaults = [
        block("air", [0.0, 0.0, 0.0], false, true),
        BlockProperties {
            name: "grass".to_string(),
            color: [0.33, 0.51, 0.21],
            top_color: Some([0.24, 0.60, 0.20]),
            bottom_color: Some([0.45, 0.33, 0.22]),
            solid: true,
            transparent: false,
        },
        block("dirt", [0.45, 0.33, 0.22], true, false),
        block("stone", [0.50, 0.50, 0.50], true, false),
        block("sand", [0.82, 0.78, 0.56], true, false),
        block("water", [0.20, 0.40, 0.80], false, true),
        BlockProperties {
            name: "wood".to_string(),
            color: [0.42, 0.31, 0.17],
            top_color: Some([0.55, 0.43, 0.26]),
            bottom_color: Some([0.55, 0.43, 0.26]),
            solid: true,
            transparent: false,
        },
        block("leaves", [0.20, 0.47, 0.16], true, false),
        block("coal_ore", [0.34, 0.34, 0.34], true, false),
        block("iron_ore", [0.62, 0.52, 0.45], true, false),
        block("gold_ore", [0.76, 0.65, 0.25], true, false),
        block("glass", [0.85, 0.92, 0.95], true, true),
        block("cobblestone", [0.42, 0.42, 0.42], true, false),
        block("planks", [0.65, 0.51, 0.30], true, false),
        block("brick", [0.58, 0.25, 0.20], true, false),
        block("flower", [0.85, 0.30, 0.35], false, true),
    ];

    for (idx, props) in defaults.into_iter().enumerate() {
        let id = registry.register(props);
        debug_assert_eq!(id.0 as usize, idx, "default block IDs must be stable");
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::{is_valid_block_code, register_default_blocks, BlockId};

    #[test]
    fn every_code_in_the_palette_has_an_entry() {
        let registry = register_default_blocks();
        assert_eq!(registry.len(), usize::from(BlockId::MAX.0) + 1);

        for code in 0..=BlockId::MAX.0 {
            let props = registry.get_properties(BlockId(code));
            assert!(!props.name.is_empty());
        }
    }

    #[test]
    fn water_and_glass_are_transparent_with_differing_solidity() {
        let registry = register_default_blocks();

        let water = registry.get_properties(BlockId::WATER);
        assert!(water.transparent);
        assert!(!water.solid);

        let glass = registry.get_properties(BlockId::GLASS);
        assert!(glass.transparent);
        assert!(glass.solid);
    }

    #[test]
    fn grass_uses_distinct_top_and_bottom_colors() {
        let registry = register_default_blocks();
        let grass = registry.get_properties(BlockId::GRASS);

        assert_ne!(grass.face_color_top(), grass.color);
        assert_ne!(grass.face_color_bottom(), grass.color);
        assert_eq!(grass.face_color_bottom(), [0.45, 0.33, 0.22]);

        let stone = registry.get_properties(BlockId::STONE);
        assert_eq!(stone.face_color_top(), stone.color);
        assert_eq!(stone.face_color_bottom(), stone.color);
    }

    #[test]
    fn block_code_validity_is_bounded_by_the_palette() {
        assert!(is_valid_block_code(0));
        assert!(is_valid_block_code(15));
        assert!(!is_valid_block_code(16));
        assert!(!is_valid_block_code(255));
    }

    #[test]
    fn lookup_by_name_matches_block_constants() {
        let registry = register_default_blocks();
        assert_eq!(registry.get_by_name("grass"), Some(BlockId::GRASS));
        assert_eq!(registry.get_by_name("gold_ore"), Some(BlockId::GOLD_ORE));
        assert_eq!(registry.get_by_name("flower"), Some(BlockId::FLOWER));
        assert_eq!(registry.get_by_name("missing"), None);
    }
}
