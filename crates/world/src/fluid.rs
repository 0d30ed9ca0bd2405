//! Fluid identities, per-cell fluid state and the horizontal flow field.

use fluidmesh_core::{BlockPos, Direction, HORIZONTAL_DIRECTIONS};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{faces_seal, BlockRegistry, BlockState, LevelView, VoxelShape};

/// Amount stored by a source (full) fluid cell.
pub const FLUID_AMOUNT_SOURCE: u8 = 8;

/// Height difference used when a fluid pours over an edge into a lower cell.
const DROP_OFF_HEIGHT: f32 = 0.888_888_9;

/// Downward pull added to falling fluid next to a wall.
const FALLING_PULL: f32 = -6.0;

/// Fluid identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fluid {
    /// No fluid.
    #[default]
    Empty,
    /// Water (translucent, tinted).
    Water,
    /// Lava (opaque, untinted).
    Lava,
}

impl Fluid {
    /// Two fluids blend into one surface iff they are the same kind.
    pub fn is_same(self, other: Fluid) -> bool {
        self == other
    }

    /// True for [`Fluid::Empty`].
    pub fn is_empty(self) -> bool {
        matches!(self, Fluid::Empty)
    }
}

/// Fluid stored in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FluidState {
    /// Which fluid.
    pub fluid: Fluid,
    /// Level from 0 to [`FLUID_AMOUNT_SOURCE`].
    pub amount: u8,
    /// Set while the fluid is falling down a column.
    #[serde(default)]
    pub falling: bool,
}

impl FluidState {
    /// No fluid.
    pub const EMPTY: Self = Self {
        fluid: Fluid::Empty,
        amount: 0,
        falling: false,
    };

    /// Full source cell of `fluid`.
    pub const fn source(fluid: Fluid) -> Self {
        Self {
            fluid,
            amount: FLUID_AMOUNT_SOURCE,
            falling: false,
        }
    }

    /// Flowing cell of `fluid` at `amount` (clamped to the source level).
    pub fn flowing(fluid: Fluid, amount: u8) -> Self {
        Self {
            fluid,
            amount: amount.min(FLUID_AMOUNT_SOURCE),
            falling: false,
        }
    }

    /// Same state with the falling flag set.
    pub const fn falling(mut self) -> Self {
        self.falling = true;
        self
    }

    /// True when the cell holds no fluid.
    pub fn is_empty(&self) -> bool {
        self.fluid.is_empty() || self.amount == 0
    }

    /// Surface height inside its own cell, in `[0, 0.889]`.
    pub fn own_height(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.amount as f32 / 9.0
        }
    }

    fn affects_flow(&self, other: &FluidState) -> bool {
        other.is_empty() || other.fluid.is_same(self.fluid)
    }

    /// Normalized flow velocity of this fluid at `pos`.
    ///
    /// Each horizontal neighbor pulls the flow towards itself by the height
    /// difference. An empty neighbor with the same fluid below it counts as
    /// a drop-off. Falling fluid against a solid wall additionally pulls down.
    pub fn flow(&self, level: &dyn LevelView, pos: BlockPos) -> Vec3 {
        let own = self.own_height();
        let mut flow = Vec3::ZERO;

        for dir in HORIZONTAL_DIRECTIONS {
            let neighbor_pos = pos.offset(dir);
            let neighbor = level.fluid_state(neighbor_pos);
            if !self.affects_flow(&neighbor) {
                continue;
            }

            let neighbor_height = neighbor.own_height();
            let mut delta = 0.0;
            if neighbor_height == 0.0 {
                let blocks_motion = level.descriptor(level.block_state(neighbor_pos)).solid;
                if !blocks_motion {
                    let below = level.fluid_state(neighbor_pos.below());
                    let below_height = below.own_height();
                    if self.affects_flow(&below) && below_height > 0.0 {
                        delta = own - (below_height - DROP_OFF_HEIGHT);
                    }
                }
            } else if neighbor_height > 0.0 {
                delta = own - neighbor_height;
            }

            if delta != 0.0 {
                flow += dir.normal() * delta;
            }
        }

        if self.falling {
            let walled = HORIZONTAL_DIRECTIONS.iter().any(|&dir| {
                self.is_solid_face(level, pos.offset(dir))
                    || self.is_solid_face(level, pos.above().offset(dir))
            });
            if walled {
                flow = flow.normalize_or_zero() + Vec3::new(0.0, FALLING_PULL, 0.0);
            }
        }

        flow.normalize_or_zero()
    }

    fn is_solid_face(&self, level: &dyn LevelView, pos: BlockPos) -> bool {
        let state = level.block_state(pos);
        !state.fluid.fluid.is_same(self.fluid) && level.descriptor(state).solid
    }
}

/// Whether the `dir` face of a fluid cell, treated as a full cube, is hidden
/// by the block the fluid sits in or by its neighbor.
///
/// The face is hidden when:
/// - the neighbor holds the same fluid,
/// - the owning block's own shape seals that face, or
/// - the owning block's face together with the neighbor's opposite face
///   covers the whole face.
pub fn fluid_side_occluded(
    registry: &BlockRegistry,
    block_state: BlockState,
    adjacent: BlockState,
    dir: Direction,
    fluid: FluidState,
) -> bool {
    if adjacent.fluid.fluid.is_same(fluid.fluid) && !adjacent.fluid.is_empty() {
        return true;
    }

    let own = registry.descriptor(block_state.block);
    let empty = VoxelShape::empty();
    let own_face = if own.can_occlude {
        if own.shape.covers_face(dir) {
            return true;
        }
        &own.shape
    } else {
        &empty
    };

    let neighbor = registry.descriptor(adjacent.block);
    if !neighbor.can_occlude {
        return false;
    }
    faces_seal(own_face, &neighbor.shape, dir)
}
