//! Sparse in-memory level of block states and light.

use std::collections::HashMap;

use fluidmesh_core::{packed_light, BlockPos};

use crate::{BlockDescriptor, BlockRegistry, BlockState, FluidState};

/// Default biome water tint (ARGB).
pub const DEFAULT_WATER_TINT: u32 = 0xFF3F_76E4;

/// Sky and block light levels of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightLevel {
    /// Sky light (0-15).
    pub sky: u8,
    /// Block light (0-15).
    pub block: u8,
}

impl LightLevel {
    /// Open sky, no block light.
    pub const DAYLIGHT: Self = Self {
        sky: packed_light::MAX_LEVEL,
        block: 0,
    };

    /// Pitch black.
    pub const DARK: Self = Self { sky: 0, block: 0 };

    /// Packed lightmap coordinate.
    pub fn packed(self) -> u32 {
        packed_light::pack(self.block, self.sky)
    }
}

/// Read-only access to the voxel neighborhood around the cells being meshed.
///
/// Implementations must not change while a voxel is being processed.
pub trait LevelView {
    /// Registry resolving block ids in this level.
    fn registry(&self) -> &BlockRegistry;

    /// Block state at `pos`. Cells outside the loaded area read as air.
    fn block_state(&self, pos: BlockPos) -> BlockState;

    /// Fluid at `pos`.
    fn fluid_state(&self, pos: BlockPos) -> FluidState {
        self.block_state(pos).fluid
    }

    /// Light levels at `pos`.
    fn light(&self, _pos: BlockPos) -> LightLevel {
        LightLevel::DAYLIGHT
    }

    /// Biome water tint (ARGB) of the column containing `pos`.
    fn water_tint(&self, _pos: BlockPos) -> u32 {
        DEFAULT_WATER_TINT
    }

    /// Descriptor of a block state.
    fn descriptor(&self, state: BlockState) -> &BlockDescriptor {
        self.registry().descriptor(state.block)
    }
}

/// Sparse in-memory level: anything not set is air in daylight.
#[derive(Debug, Clone)]
pub struct LevelSlice {
    registry: BlockRegistry,
    blocks: HashMap<BlockPos, BlockState>,
    light: HashMap<BlockPos, LightLevel>,
    default_light: LightLevel,
    tints: HashMap<(i32, i32), u32>,
}

impl LevelSlice {
    /// Empty level over `registry`.
    pub fn new(registry: BlockRegistry) -> Self {
        Self {
            registry,
            blocks: HashMap::new(),
            light: HashMap::new(),
            default_light: LightLevel::DAYLIGHT,
            tints: HashMap::new(),
        }
    }

    /// Place a block state. Setting air clears the cell.
    pub fn set_block(&mut self, pos: BlockPos, state: BlockState) {
        if state == BlockState::AIR {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, state);
        }
    }

    /// Fill the inclusive box `min..=max` with `state`.
    pub fn fill(&mut self, min: BlockPos, max: BlockPos, state: BlockState) {
        for x in min.x.min(max.x)..=min.x.max(max.x) {
            for y in min.y.min(max.y)..=min.y.max(max.y) {
                for z in min.z.min(max.z)..=min.z.max(max.z) {
                    self.set_block(BlockPos::new(x, y, z), state);
                }
            }
        }
    }

    /// Override the light at one cell.
    pub fn set_light(&mut self, pos: BlockPos, light: LightLevel) {
        self.light.insert(pos, light);
    }

    /// Light used for cells without an override.
    pub fn set_default_light(&mut self, light: LightLevel) {
        self.default_light = light;
    }

    /// Set the water tint of the column at `(x, z)`.
    pub fn set_water_tint(&mut self, x: i32, z: i32, argb: u32) {
        self.tints.insert((x, z), argb);
    }

    /// Number of non-air cells.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when every cell is air.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Inclusive bounding box of all non-air cells.
    pub fn bounds(&self) -> Option<(BlockPos, BlockPos)> {
        let mut iter = self.blocks.keys();
        let first = *iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| {
            (
                BlockPos::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                BlockPos::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }

    /// Positions holding fluid, sorted for deterministic iteration.
    pub fn fluid_positions(&self) -> Vec<BlockPos> {
        let mut positions: Vec<_> = self
            .blocks
            .iter()
            .filter(|(_, state)| !state.fluid.is_empty())
            .map(|(pos, _)| *pos)
            .collect();
        positions.sort();
        positions
    }
}

impl LevelView for LevelSlice {
    fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    fn block_state(&self, pos: BlockPos) -> BlockState {
        self.blocks.get(&pos).copied().unwrap_or(BlockState::AIR)
    }

    fn light(&self, pos: BlockPos) -> LightLevel {
        self.light.get(&pos).copied().unwrap_or(self.default_light)
    }

    fn water_tint(&self, pos: BlockPos) -> u32 {
        self.tints
            .get(&(pos.x, pos.z))
            .copied()
            .unwrap_or(DEFAULT_WATER_TINT)
    }
}
