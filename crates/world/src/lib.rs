#![warn(missing_docs)]
//! Voxel-world data consumed by the fluid mesher.
//!
//! Block descriptors and states, fluid states with their flow field,
//! occlusion shapes, and the [`LevelView`] read interface plus an in-memory
//! [`LevelSlice`] implementation.

mod block;
mod fluid;
mod level;
mod rules;
mod shape;

pub use block::{BlockDescriptor, BlockId, BlockRegistry, BlockState, RegistryError};
pub use fluid::{fluid_side_occluded, Fluid, FluidState, FLUID_AMOUNT_SOURCE};
pub use level::{LevelSlice, LevelView, LightLevel, DEFAULT_WATER_TINT};
pub use rules::{DefaultFluidRules, FluidRules};
pub use shape::{block_occludes, covers_unit_square, faces_seal, Aabb, VoxelShape};
