//! Corner heights of a fluid surface.
//!
//! Each corner averages the cells sharing it, so two neighboring cells
//! always agree on the height of their shared edge. Near-full samples are
//! weighted ten times heavier so a source next to a trickle stays high.

use fluidmesh_core::{BlockPos, Direction};
use fluidmesh_world::{Fluid, FluidState, LevelView};

use crate::fluid::{CORNER_NE, CORNER_NW, CORNER_SE, CORNER_SW};

const HEAVY_SAMPLE_THRESHOLD: f32 = 0.8;
const HEAVY_SAMPLE_WEIGHT: u32 = 10;

/// Running weighted sum of height samples for one corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeightAccumulator {
    sum: f32,
    samples: u32,
}

impl HeightAccumulator {
    /// Add one sample. Negative heights mark solid cells and are skipped.
    pub fn add(&mut self, height: f32) {
        if height >= HEAVY_SAMPLE_THRESHOLD {
            self.sum += height * HEAVY_SAMPLE_WEIGHT as f32;
            self.samples += HEAVY_SAMPLE_WEIGHT;
        } else if height >= 0.0 {
            self.sum += height;
            self.samples += 1;
        }
    }

    /// Weighted sample count so far.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Weighted mean, or 0 with no samples.
    pub fn average(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.sum / self.samples as f32
        }
    }

    /// Forget all samples.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Surface height of `fluid` as seen in the cell at `pos`.
///
/// Returns 1 when the same fluid continues above, the cell's own height when
/// it holds the same fluid, 0 for any other non-solid cell and -1 for solid
/// cells, which corner averaging skips.
pub fn fluid_height(level: &dyn LevelView, fluid: Fluid, pos: BlockPos) -> f32 {
    let state = level.block_state(pos);
    if !state.fluid.is_empty() && state.fluid.fluid.is_same(fluid) {
        let above = level.fluid_state(pos.above());
        if !above.is_empty() && above.fluid.is_same(fluid) {
            return 1.0;
        }
        return state.fluid.own_height();
    }
    if !level.descriptor(state).solid {
        return 0.0;
    }
    -1.0
}

/// Height of one top corner from the cell's own height, the two edge
/// neighbors touching the corner and the diagonal cell.
///
/// The diagonal is only sampled when one of the edge neighbors holds fluid.
/// `acc` is left reset.
pub fn corner_height(
    acc: &mut HeightAccumulator,
    level: &dyn LevelView,
    fluid: Fluid,
    own_height: f32,
    neighbor_a: f32,
    neighbor_b: f32,
    diagonal_pos: BlockPos,
) -> f32 {
    if neighbor_a >= 1.0 || neighbor_b >= 1.0 {
        return 1.0;
    }
    if neighbor_a > 0.0 || neighbor_b > 0.0 {
        let diagonal = fluid_height(level, fluid, diagonal_pos);
        if diagonal >= 1.0 {
            return 1.0;
        }
        acc.add(diagonal);
    }
    acc.add(own_height);
    acc.add(neighbor_a);
    acc.add(neighbor_b);
    let height = acc.average();
    acc.reset();
    height
}

/// All four top corners of the fluid at `pos`, ordered NE, SE, SW, NW.
pub fn corner_heights(
    acc: &mut HeightAccumulator,
    level: &dyn LevelView,
    fluid: FluidState,
    pos: BlockPos,
) -> [f32; 4] {
    let own = fluid_height(level, fluid.fluid, pos);
    if own >= 1.0 {
        return [1.0; 4];
    }

    let north = pos.offset(Direction::North);
    let south = pos.offset(Direction::South);
    let h_north = fluid_height(level, fluid.fluid, north);
    let h_south = fluid_height(level, fluid.fluid, south);
    let h_east = fluid_height(level, fluid.fluid, pos.offset(Direction::East));
    let h_west = fluid_height(level, fluid.fluid, pos.offset(Direction::West));

    let mut corners = [0.0; 4];
    let layout = [
        (CORNER_NE, h_north, h_east, north.offset(Direction::East)),
        (CORNER_SE, h_south, h_east, south.offset(Direction::East)),
        (CORNER_SW, h_south, h_west, south.offset(Direction::West)),
        (CORNER_NW, h_north, h_west, north.offset(Direction::West)),
    ];
    for (corner, a, b, diagonal) in layout {
        corners[corner] = corner_height(acc, level, fluid.fluid, own, a, b, diagonal);
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluidmesh_world::{BlockRegistry, BlockState, LevelSlice};

    struct Pool {
        level: LevelSlice,
        water_block: fluidmesh_world::BlockId,
    }

    impl Pool {
        fn new() -> Self {
            let level = LevelSlice::new(BlockRegistry::with_defaults());
            let water_block = level.registry().id_by_name("water").unwrap();
            Self { level, water_block }
        }

        fn water(&mut self, pos: BlockPos, fluid: FluidState) {
            self.level
                .set_block(pos, BlockState::with_fluid(self.water_block, fluid));
        }
    }

    #[test]
    fn heavy_samples_outweigh_light_ones() {
        let mut acc = HeightAccumulator::default();
        acc.add(0.9);
        acc.add(0.0);
        acc.add(-1.0);
        assert_eq!(acc.samples(), 11);
        assert!((acc.average() - 9.0 / 11.0).abs() < 1e-6);
        acc.reset();
        assert_eq!(acc.average(), 0.0);
    }

    #[test]
    fn fluid_height_classifies_cells() {
        let mut pool = Pool::new();
        let source = FluidState::source(Fluid::Water);
        pool.water(BlockPos::ZERO, source);
        pool.water(BlockPos::new(1, 0, 0), source);
        pool.water(BlockPos::new(1, 1, 0), source);
        let stone = pool.level.registry().id_by_name("stone").unwrap();
        pool.level.set_block(BlockPos::new(2, 0, 0), BlockState::dry(stone));

        let level = &pool.level;
        assert!((fluid_height(level, Fluid::Water, BlockPos::ZERO) - 8.0 / 9.0).abs() < 1e-6);
        assert_eq!(fluid_height(level, Fluid::Water, BlockPos::new(1, 0, 0)), 1.0);
        assert_eq!(fluid_height(level, Fluid::Water, BlockPos::new(2, 0, 0)), -1.0);
        assert_eq!(fluid_height(level, Fluid::Water, BlockPos::new(0, 0, 5)), 0.0);
        // Water is a different fluid as far as lava is concerned.
        assert_eq!(fluid_height(level, Fluid::Lava, BlockPos::ZERO), 0.0);
    }

    #[test]
    fn fluid_above_raises_every_corner() {
        let mut pool = Pool::new();
        let flowing = FluidState::flowing(Fluid::Water, 3);
        pool.water(BlockPos::ZERO, flowing);
        pool.water(BlockPos::new(0, 1, 0), flowing);
        let mut acc = HeightAccumulator::default();
        assert_eq!(
            corner_heights(&mut acc, &pool.level, flowing, BlockPos::ZERO),
            [1.0; 4]
        );
    }

    #[test]
    fn lone_source_corners_sink_towards_air() {
        let mut pool = Pool::new();
        let source = FluidState::source(Fluid::Water);
        pool.water(BlockPos::ZERO, source);
        let mut acc = HeightAccumulator::default();
        let corners = corner_heights(&mut acc, &pool.level, source, BlockPos::ZERO);
        // Own height weighted 10 against two empty neighbors.
        let expected = (8.0 / 9.0 * 10.0) / 12.0;
        for corner in corners {
            assert!((corner - expected).abs() < 1e-6, "{corners:?}");
        }
        assert_eq!(acc, HeightAccumulator::default());
    }

    #[test]
    fn full_neighbor_pins_the_shared_corners() {
        let mut pool = Pool::new();
        let low = FluidState::flowing(Fluid::Water, 2);
        pool.water(BlockPos::ZERO, low);
        // Column east of the cell: same fluid with more above.
        pool.water(BlockPos::new(1, 0, 0), low);
        pool.water(BlockPos::new(1, 1, 0), low);
        let mut acc = HeightAccumulator::default();
        let corners = corner_heights(&mut acc, &pool.level, low, BlockPos::ZERO);
        assert_eq!(corners[CORNER_NE], 1.0);
        assert_eq!(corners[CORNER_SE], 1.0);
        assert!(corners[CORNER_SW] < 1.0);
        assert!(corners[CORNER_NW] < 1.0);
    }

    #[test]
    fn full_diagonal_pins_its_corner_through_a_low_edge() {
        let mut pool = Pool::new();
        let low = FluidState::flowing(Fluid::Water, 2);
        pool.water(BlockPos::ZERO, low);
        pool.water(BlockPos::new(1, 0, 0), FluidState::flowing(Fluid::Water, 3));
        // North-east diagonal with the same fluid stacked on top.
        pool.water(BlockPos::new(1, 0, -1), low);
        pool.water(BlockPos::new(1, 1, -1), low);

        let level = &pool.level;
        let east = fluid_height(level, Fluid::Water, BlockPos::new(1, 0, 0));
        assert!(east > 0.0 && east < 1.0);

        let mut acc = HeightAccumulator::default();
        let corners = corner_heights(&mut acc, level, low, BlockPos::ZERO);
        assert_eq!(corners[CORNER_NE], 1.0);
        assert!(corners[CORNER_SE] < 1.0);
        assert!(corners[CORNER_SW] < 1.0);
        assert!(corners[CORNER_NW] < 1.0);
        assert_eq!(acc, HeightAccumulator::default());
    }

    #[test]
    fn solid_neighbors_are_left_out_of_the_average() {
        let mut pool = Pool::new();
        let low = FluidState::flowing(Fluid::Water, 3);
        pool.water(BlockPos::ZERO, low);
        let stone = pool.level.registry().id_by_name("stone").unwrap();
        pool.level
            .fill(BlockPos::new(-1, 0, -1), BlockPos::new(1, 0, -1), BlockState::dry(stone));
        pool.level
            .set_block(BlockPos::new(-1, 0, 0), BlockState::dry(stone));
        let mut acc = HeightAccumulator::default();
        let corners = corner_heights(&mut acc, &pool.level, low, BlockPos::ZERO);
        // North and west are stone: the NW corner only sees the cell itself.
        assert!((corners[CORNER_NW] - low.own_height()).abs() < 1e-6);
    }
}
