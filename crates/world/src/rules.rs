//! Platform rules consulted while meshing fluids.

use fluidmesh_core::{BlockPos, Direction};

use crate::{BlockState, FluidState, LevelView};

/// Game-rule predicates the fluid mesher asks about but does not own.
pub trait FluidRules: Send + Sync {
    /// Whether a fluid side facing `adjacent` should use the overlay sprite.
    fn should_show_fluid_overlay(
        &self,
        level: &dyn LevelView,
        adjacent: BlockState,
        adjacent_pos: BlockPos,
        fluid: FluidState,
    ) -> bool;

    /// Whether the top surface should also be drawn facing down, so it can be
    /// seen from the cell at `above`.
    fn should_render_backward_up_face(
        &self,
        level: &dyn LevelView,
        above: BlockPos,
        fluid: FluidState,
    ) -> bool;

    /// Whether `adjacent` hides the fluid face pointing at it regardless of
    /// shapes. `side` is the face of `adjacent` that touches the fluid.
    fn should_occlude_fluid(
        &self,
        _side: Direction,
        _adjacent: BlockState,
        _fluid: FluidState,
    ) -> bool {
        false
    }
}

/// Rules driven by block descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFluidRules;

impl FluidRules for DefaultFluidRules {
    fn should_show_fluid_overlay(
        &self,
        level: &dyn LevelView,
        adjacent: BlockState,
        _adjacent_pos: BlockPos,
        _fluid: FluidState,
    ) -> bool {
        level.descriptor(adjacent).fluid_overlay
    }

    /// True when any cell in the 3×3 ring around `above` holds something
    /// other than this fluid and is not an opaque full cube.
    fn should_render_backward_up_face(
        &self,
        level: &dyn LevelView,
        above: BlockPos,
        fluid: FluidState,
    ) -> bool {
        (-1..=1).any(|dx| {
            (-1..=1).any(|dz| {
                let state = level.block_state(above.add(dx, 0, dz));
                !state.fluid.fluid.is_same(fluid.fluid) && !level.descriptor(state).is_solid_render()
            })
        })
    }
}
