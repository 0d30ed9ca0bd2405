use fluidmesh_core::{color, BlockPos};
use fluidmesh_world::{FluidState, LevelView};

use crate::ModelQuad;

/// Supplies per-vertex tint for fluid quads.
pub trait ColorProvider: Send + Sync {
    /// Write one ARGB colour per vertex of `quad` into `out`.
    fn colors(
        &self,
        level: &dyn LevelView,
        pos: BlockPos,
        fluid: FluidState,
        quad: &ModelQuad,
        out: &mut [u32; 4],
    );
}

/// Same colour everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantColorProvider(pub u32);

impl Default for ConstantColorProvider {
    fn default() -> Self {
        Self(color::WHITE)
    }
}

impl ColorProvider for ConstantColorProvider {
    fn colors(
        &self,
        _level: &dyn LevelView,
        _pos: BlockPos,
        _fluid: FluidState,
        _quad: &ModelQuad,
        out: &mut [u32; 4],
    ) {
        *out = [self.0; 4];
    }
}

/// Biome water tint blended bilinearly between the column centers around
/// each vertex, so tints fade across column borders without seams.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlendedTintColorProvider;

impl BlendedTintColorProvider {
    fn blend(level: &dyn LevelView, x: f32, y: i32, z: f32) -> u32 {
        let (x0, z0) = (x.floor(), z.floor());
        let (fx, fz) = (x - x0, z - z0);
        let (ix, iz) = (x0 as i32, z0 as i32);
        let sample = |dx: i32, dz: i32| {
            color::unpack_argb(level.water_tint(BlockPos::new(ix + dx, y, iz + dz)))
        };
        let corners = [sample(0, 0), sample(1, 0), sample(0, 1), sample(1, 1)];
        let weights = [
            (1.0 - fx) * (1.0 - fz),
            fx * (1.0 - fz),
            (1.0 - fx) * fz,
            fx * fz,
        ];
        let mut channels = [0.0f32; 4];
        for (corner, weight) in corners.iter().zip(weights) {
            for (channel, value) in channels.iter_mut().zip(corner) {
                *channel += f32::from(*value) * weight;
            }
        }
        let [a, r, g, b] = channels.map(|c| c.round().clamp(0.0, 255.0) as u8);
        color::pack_argb(a, r, g, b)
    }
}

impl ColorProvider for BlendedTintColorProvider {
    fn colors(
        &self,
        level: &dyn LevelView,
        pos: BlockPos,
        _fluid: FluidState,
        quad: &ModelQuad,
        out: &mut [u32; 4],
    ) {
        for (i, slot) in out.iter_mut().enumerate() {
            let x = pos.x as f32 + quad.x(i) - 0.5;
            let z = pos.z as f32 + quad.z(i) - 0.5;
            *slot = Self::blend(level, x, pos.y, z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluidmesh_world::{BlockRegistry, Fluid, LevelSlice, DEFAULT_WATER_TINT};

    fn quad_over_cell() -> ModelQuad {
        let mut quad = ModelQuad::default();
        quad.set_pos(0, 0.0, 1.0, 0.0);
        quad.set_pos(1, 0.0, 1.0, 1.0);
        quad.set_pos(2, 1.0, 1.0, 1.0);
        quad.set_pos(3, 1.0, 1.0, 0.0);
        quad
    }

    #[test]
    fn constant_provider_fills_every_vertex() {
        let level = LevelSlice::new(BlockRegistry::with_defaults());
        let mut out = [0; 4];
        ConstantColorProvider(0xFF11_2233).colors(
            &level,
            BlockPos::ZERO,
            FluidState::source(Fluid::Lava),
            &quad_over_cell(),
            &mut out,
        );
        assert_eq!(out, [0xFF11_2233; 4]);
    }

    #[test]
    fn uniform_biome_blends_to_its_own_tint() {
        let level = LevelSlice::new(BlockRegistry::with_defaults());
        let mut out = [0; 4];
        BlendedTintColorProvider.colors(
            &level,
            BlockPos::new(4, 0, 4),
            FluidState::source(Fluid::Water),
            &quad_over_cell(),
            &mut out,
        );
        assert_eq!(out, [DEFAULT_WATER_TINT; 4]);
    }

    #[test]
    fn vertices_on_a_border_average_both_columns() {
        let mut level = LevelSlice::new(BlockRegistry::with_defaults());
        for z in -1..=1 {
            level.set_water_tint(0, z, color::pack_argb(255, 0, 0, 0));
            level.set_water_tint(1, z, color::pack_argb(255, 200, 0, 0));
        }
        let mut out = [0; 4];
        BlendedTintColorProvider.colors(
            &level,
            BlockPos::ZERO,
            FluidState::source(Fluid::Water),
            &quad_over_cell(),
            &mut out,
        );
        // Vertex 3 sits at x = 1, halfway between column centers 0.5 and 1.5.
        assert_eq!(color::unpack_argb(out[3]), [255, 100, 0, 0]);
    }
}
