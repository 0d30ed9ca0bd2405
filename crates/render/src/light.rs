use fluidmesh_core::{packed_light, Axis, BlockPos, Direction};
use fluidmesh_world::{LevelView, LightLevel};

use crate::{ModelQuad, QuadFlags};

/// Brightness contributed by a cell that blocks ambient light.
const OCCLUDER_BRIGHTNESS: f32 = 0.2;

/// Which light pipeline a quad is lit with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightMode {
    /// Per-vertex light blending with ambient occlusion.
    Smooth,
    /// One light sample per face.
    Flat,
}

/// Per-vertex lighting output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadLightData {
    /// Brightness multipliers.
    pub br: [f32; 4],
    /// Packed lightmap coordinates.
    pub lm: [u32; 4],
}

impl Default for QuadLightData {
    fn default() -> Self {
        Self {
            br: [1.0; 4],
            lm: [0; 4],
        }
    }
}

/// Computes per-vertex light for one quad.
pub trait LightPipeline: Send + Sync {
    /// Fill `out` for `quad` belonging to the cell at `pos`, lit from `light_face`.
    fn calculate(
        &self,
        level: &dyn LevelView,
        quad: &ModelQuad,
        pos: BlockPos,
        out: &mut QuadLightData,
        light_face: Direction,
    );
}

fn is_occluder(level: &dyn LevelView, pos: BlockPos) -> bool {
    level.descriptor(level.block_state(pos)).is_solid_render()
}

/// Single sample per face.
///
/// Aligned quads read the cell they face unless it is opaque, everything
/// else reads its own cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatLightPipeline;

impl LightPipeline for FlatLightPipeline {
    fn calculate(
        &self,
        level: &dyn LevelView,
        quad: &ModelQuad,
        pos: BlockPos,
        out: &mut QuadLightData,
        light_face: Direction,
    ) {
        let sample = if quad.flags().contains(QuadFlags::IS_ALIGNED) {
            let neighbor = pos.offset(light_face);
            if is_occluder(level, neighbor) {
                pos
            } else {
                neighbor
            }
        } else {
            pos
        };
        let light = level.light(sample).packed();
        out.br = [1.0; 4];
        out.lm = [light; 4];
    }
}

/// Blends light from the four cells around each vertex on the lit side and
/// darkens vertices next to opaque cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothLightPipeline;

impl SmoothLightPipeline {
    fn tangents(face: Direction) -> [Axis; 2] {
        match face.axis() {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::X, Axis::Z],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }

    fn step_along(axis: Axis, positive: bool) -> Direction {
        match (axis, positive) {
            (Axis::X, true) => Direction::East,
            (Axis::X, false) => Direction::West,
            (Axis::Y, true) => Direction::Up,
            (Axis::Y, false) => Direction::Down,
            (Axis::Z, true) => Direction::South,
            (Axis::Z, false) => Direction::North,
        }
    }

    fn vertex(
        level: &dyn LevelView,
        quad: &ModelQuad,
        i: usize,
        pos: BlockPos,
        face: Direction,
    ) -> (f32, u32) {
        let local = quad.position(i).to_array();
        let [a, b] = Self::tangents(face);
        let da = Self::step_along(a, local[a.index()] >= 0.5);
        let db = Self::step_along(b, local[b.index()] >= 0.5);

        let center = pos.offset(face);
        let edge_a = center.offset(da);
        let edge_b = center.offset(db);
        let corner = edge_a.offset(db);

        let center_occludes = is_occluder(level, center);
        let a_occludes = is_occluder(level, edge_a);
        let b_occludes = is_occluder(level, edge_b);
        // A corner behind two opaque edges cannot be seen from the vertex.
        let corner_occludes = if a_occludes && b_occludes {
            true
        } else {
            is_occluder(level, corner)
        };

        let shade = |occludes: bool| if occludes { OCCLUDER_BRIGHTNESS } else { 1.0 };
        let brightness = (shade(center_occludes)
            + shade(a_occludes)
            + shade(b_occludes)
            + shade(corner_occludes))
            / 4.0;

        let own = level.light(pos);
        let samples = [
            (center, center_occludes),
            (edge_a, a_occludes),
            (edge_b, b_occludes),
            (corner, corner_occludes),
        ];
        let (mut sky, mut block, mut count) = (0u32, 0u32, 0u32);
        for (cell, occludes) in samples {
            if occludes {
                continue;
            }
            let LightLevel { sky: s, block: b } = level.light(cell);
            sky += u32::from(s);
            block += u32::from(b);
            count += 1;
        }
        let light = if count == 0 {
            own.packed()
        } else {
            packed_light::pack((block / count) as u8, (sky / count) as u8)
        };
        (brightness, light)
    }
}

impl LightPipeline for SmoothLightPipeline {
    fn calculate(
        &self,
        level: &dyn LevelView,
        quad: &ModelQuad,
        pos: BlockPos,
        out: &mut QuadLightData,
        light_face: Direction,
    ) {
        for i in 0..4 {
            let (br, lm) = Self::vertex(level, quad, i, pos, light_face);
            out.br[i] = br;
            out.lm[i] = lm;
        }
    }
}

/// Maps a [`LightMode`] to the pipeline implementing it.
pub struct LightPipelineProvider {
    flat: Box<dyn LightPipeline>,
    smooth: Box<dyn LightPipeline>,
}

impl LightPipelineProvider {
    /// Provider over the given pipelines.
    pub fn new(flat: Box<dyn LightPipeline>, smooth: Box<dyn LightPipeline>) -> Self {
        Self { flat, smooth }
    }

    /// Pipeline for `mode`.
    pub fn get(&self, mode: LightMode) -> &dyn LightPipeline {
        match mode {
            LightMode::Flat => self.flat.as_ref(),
            LightMode::Smooth => self.smooth.as_ref(),
        }
    }
}

impl Default for LightPipelineProvider {
    fn default() -> Self {
        Self::new(Box::new(FlatLightPipeline), Box::new(SmoothLightPipeline))
    }
}

impl std::fmt::Debug for LightPipelineProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightPipelineProvider").finish_non_exhaustive()
    }
}
