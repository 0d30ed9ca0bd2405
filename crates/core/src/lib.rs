#![warn(missing_docs)]
//! Core primitives shared across the workspace.
//!
//! Positions, compass directions, quad facings and the compact encodings
//! (packed normals, ARGB/ABGR colors, packed light) that the mesher writes
//! into vertex data.

pub mod color;
mod direction;
mod facing;
pub mod packed_light;
pub mod packed_normal;
mod pos;

pub use direction::{Axis, Direction, AXIS_DIRECTIONS, HORIZONTAL_DIRECTIONS};
pub use facing::{ModelQuadFacing, FACING_COUNT};
pub use pos::BlockPos;
