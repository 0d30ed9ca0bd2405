use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::{FluidState, VoxelShape};

/// Index of a block descriptor in its [`BlockRegistry`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockId(pub u16);

impl BlockId {
    /// Air is always registered first.
    pub const AIR: Self = Self(0);
}

/// Block id paired with the fluid it holds.
///
/// Plain fluid cells pair a fluid block (e.g. `water`) with its fluid state;
/// waterlogged blocks pair a solid block with a water state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockState {
    /// Block occupying the cell.
    pub block: BlockId,
    /// Fluid inside the cell (empty for dry blocks).
    pub fluid: FluidState,
}

impl BlockState {
    /// Empty air cell.
    pub const AIR: Self = Self {
        block: BlockId::AIR,
        fluid: FluidState::EMPTY,
    };

    /// Dry block.
    pub const fn dry(block: BlockId) -> Self {
        Self {
            block,
            fluid: FluidState::EMPTY,
        }
    }

    /// Block holding `fluid`.
    pub const fn with_fluid(block: BlockId, fluid: FluidState) -> Self {
        Self { block, fluid }
    }
}

/// Static rendering and physics facts about a block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Unique name, e.g. `stone`.
    pub name: String,
    /// Whether the block takes part in face occlusion at all.
    #[serde(default)]
    pub can_occlude: bool,
    /// Whether the block blocks motion; solid dry cells are excluded from
    /// fluid height averaging.
    #[serde(default)]
    pub solid: bool,
    /// Occlusion shape in block-local space.
    #[serde(default)]
    pub shape: VoxelShape,
    /// Whether adjacent fluid sides use the overlay sprite against this block.
    #[serde(default)]
    pub fluid_overlay: bool,
}

impl BlockDescriptor {
    /// The air descriptor.
    pub fn air() -> Self {
        Self {
            name: "air".into(),
            can_occlude: false,
            solid: false,
            shape: VoxelShape::empty(),
            fluid_overlay: false,
        }
    }

    /// Opaque full cube (stone, dirt, ...).
    pub fn full_cube(name: &str) -> Self {
        Self {
            name: name.into(),
            can_occlude: true,
            solid: true,
            shape: VoxelShape::block(),
            fluid_overlay: false,
        }
    }

    /// Block a fluid lives in on its own (water, lava).
    pub fn fluid(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::air()
        }
    }

    /// Solid but see-through block that shows the fluid overlay (glass, leaves).
    pub fn see_through(name: &str) -> Self {
        Self {
            name: name.into(),
            can_occlude: false,
            solid: true,
            shape: VoxelShape::block(),
            fluid_overlay: true,
        }
    }

    /// Partial solid block with an explicit occlusion shape.
    pub fn shaped(name: &str, shape: VoxelShape) -> Self {
        Self {
            name: name.into(),
            can_occlude: true,
            solid: true,
            shape,
            fluid_overlay: false,
        }
    }

    /// Occluding full cube; such cells hide anything behind them.
    pub fn is_solid_render(&self) -> bool {
        self.can_occlude && self.shape.is_full_block()
    }
}

/// Errors raised while assembling a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two descriptors share a name.
    #[error("duplicate block name `{0}`")]
    Duplicate(String),
    /// A lookup referenced a name that was never registered.
    #[error("unknown block `{0}`")]
    Unknown(String),
    /// More descriptors than a [`BlockId`] can address.
    #[error("block registry is full ({0} entries)")]
    Full(usize),
}

/// Name-indexed table of block descriptors. Id 0 is always air.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: Vec<BlockDescriptor>,
    by_name: HashMap<String, BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self {
            blocks: vec![BlockDescriptor::air()],
            by_name: HashMap::from([("air".to_string(), BlockId::AIR)]),
        }
    }
}

impl BlockRegistry {
    /// Build a registry from descriptors. Air is prepended when absent.
    pub fn new(descriptors: Vec<BlockDescriptor>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for descriptor in descriptors {
            if descriptor.name == "air" && registry.blocks.len() == 1 {
                registry.blocks[0] = descriptor;
                continue;
            }
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Registry holding the blocks most scenes need.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        for descriptor in [
            BlockDescriptor::full_cube("stone"),
            BlockDescriptor::fluid("water"),
            BlockDescriptor::fluid("lava"),
            BlockDescriptor::see_through("glass"),
            BlockDescriptor::see_through("leaves"),
            BlockDescriptor::shaped("stone_slab", VoxelShape::bottom_slab()),
            BlockDescriptor::shaped("stone_slab_top", VoxelShape::top_slab()),
        ] {
            // Names above are distinct, registration cannot fail.
            let _ = registry.register(descriptor);
        }
        registry
    }

    /// Append a descriptor and return its id.
    pub fn register(&mut self, descriptor: BlockDescriptor) -> Result<BlockId, RegistryError> {
        if self.by_name.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        let index = self.blocks.len();
        let id = u16::try_from(index)
            .map(BlockId)
            .map_err(|_| RegistryError::Full(index))?;
        trace!(name = %descriptor.name, id = id.0, "registered block");
        self.by_name.insert(descriptor.name.clone(), id);
        self.blocks.push(descriptor);
        Ok(id)
    }

    /// Descriptor for `id`, falling back to air for unknown ids.
    pub fn descriptor(&self, id: BlockId) -> &BlockDescriptor {
        debug_assert!(
            (id.0 as usize) < self.blocks.len(),
            "unregistered block id {id:?}"
        );
        self.blocks.get(id.0 as usize).unwrap_or(&self.blocks[0])
    }

    /// Look up an id by name.
    pub fn id_by_name(&self, name: &str) -> Result<BlockId, RegistryError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }

    /// Number of registered blocks, air included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Never true: air is always present.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_always_id_zero() {
        let registry = BlockRegistry::new(vec![BlockDescriptor::full_cube("stone")]).unwrap();
        assert_eq!(registry.id_by_name("air"), Ok(BlockId::AIR));
        assert_eq!(registry.id_by_name("stone"), Ok(BlockId(1)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn explicit_air_replaces_the_default_entry() {
        let registry = BlockRegistry::new(vec![
            BlockDescriptor::air(),
            BlockDescriptor::full_cube("stone"),
        ])
        .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = BlockRegistry::new(vec![
            BlockDescriptor::full_cube("stone"),
            BlockDescriptor::full_cube("stone"),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("stone".into()));
    }

    #[test]
    fn unknown_names_report_the_name() {
        let registry = BlockRegistry::with_defaults();
        assert_eq!(
            registry.id_by_name("obsidian"),
            Err(RegistryError::Unknown("obsidian".into()))
        );
    }

    #[test]
    fn solid_render_requires_a_full_occluding_cube() {
        assert!(BlockDescriptor::full_cube("stone").is_solid_render());
        assert!(!BlockDescriptor::see_through("glass").is_solid_render());
        assert!(!BlockDescriptor::shaped("slab", VoxelShape::bottom_slab()).is_solid_render());
    }
}
