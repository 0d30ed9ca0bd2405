//! Per-cell fluid surface assembly.

use std::f32::consts::FRAC_PI_2;

use fluidmesh_core::{color, packed_normal, Axis, BlockPos, Direction, ModelQuadFacing};
use fluidmesh_world::{BlockState, Fluid, FluidRules, FluidState, LevelView};
use glam::Vec3;

use crate::{
    compute_cull_mask, corner_heights, is_side_exposed, BlockOcclusionCache, ChunkModelBuilder,
    ChunkVertex, ColorProvider, CullMask, FluidSprites, HeightAccumulator, LightMode,
    LightPipelineProvider, Material, ModelQuad, QuadFlags, QuadLightData, Sprite,
    TranslucentGeometryCollector, DEFAULT_OCCLUSION_CACHE_CAPACITY,
};

/// Inset keeping fluid faces off the faces of neighboring blocks.
pub const EPSILON: f32 = 0.001;

/// Index of the north-east corner in a corner height array.
pub const CORNER_NE: usize = 0;
/// Index of the south-east corner.
pub const CORNER_SE: usize = 1;
/// Index of the south-west corner.
pub const CORNER_SW: usize = 2;
/// Index of the north-west corner.
pub const CORNER_NW: usize = 3;

const Z_SIDE_BRIGHTNESS: f32 = 0.8;
const X_SIDE_BRIGHTNESS: f32 = 0.6;
const FLOW_UV_RADIUS: f32 = 0.25;
/// Largest corner height difference a top face may have and still count as level.
const ALIGNED_EQUALS_EPSILON: f32 = 0.011;

fn is_aligned_equals(a: f32, b: f32) -> bool {
    (a - b).abs() <= ALIGNED_EQUALS_EPSILON
}

/// Geometry of one vertical side. `c1` sits at `(x1, z1)`, `c2` at `(x2, z2)`.
struct SideFace {
    dir: Direction,
    c1: usize,
    c2: usize,
    x1: f32,
    x2: f32,
    z1: f32,
    z2: f32,
}

const SIDES: [SideFace; 4] = [
    SideFace {
        dir: Direction::North,
        c1: CORNER_NW,
        c2: CORNER_NE,
        x1: 0.0,
        x2: 1.0,
        z1: EPSILON,
        z2: EPSILON,
    },
    SideFace {
        dir: Direction::South,
        c1: CORNER_SE,
        c2: CORNER_SW,
        x1: 1.0,
        x2: 0.0,
        z1: 1.0 - EPSILON,
        z2: 1.0 - EPSILON,
    },
    SideFace {
        dir: Direction::West,
        c1: CORNER_SW,
        c2: CORNER_NW,
        x1: EPSILON,
        x2: EPSILON,
        z1: 1.0,
        z2: 0.0,
    },
    SideFace {
        dir: Direction::East,
        c1: CORNER_NE,
        c2: CORNER_SE,
        x1: 1.0 - EPSILON,
        x2: 1.0 - EPSILON,
        z1: 0.0,
        z2: 1.0,
    },
];

/// Mutable state one worker reuses across every cell it meshes.
pub struct FluidScratch {
    quad: ModelQuad,
    light: QuadLightData,
    colors: [u32; 4],
    brightness: [f32; 4],
    vertices: [ChunkVertex; 4],
    heights: HeightAccumulator,
    occlusion: BlockOcclusionCache,
}

impl FluidScratch {
    /// Scratch whose occlusion cache holds at most `cache_capacity` entries.
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            quad: ModelQuad::default(),
            light: QuadLightData::default(),
            colors: [color::WHITE; 4],
            brightness: [1.0; 4],
            vertices: [ChunkVertex::default(); 4],
            heights: HeightAccumulator::default(),
            occlusion: BlockOcclusionCache::new(cache_capacity),
        }
    }

    /// Occlusion cache, for statistics.
    pub fn occlusion_cache(&self) -> &BlockOcclusionCache {
        &self.occlusion
    }
}

impl Default for FluidScratch {
    fn default() -> Self {
        Self::new(DEFAULT_OCCLUSION_CACHE_CAPACITY)
    }
}

/// Destination of one cell's quads.
pub struct FluidOutput<'a> {
    /// Mesh buffer receiving every quad.
    pub mesh: &'a mut dyn ChunkModelBuilder,
    /// Sorter fed translucent quads, when one is attached.
    pub collector: Option<&'a mut dyn TranslucentGeometryCollector>,
    /// Pass and sampling of the fluid.
    pub material: Material,
}

/// The cell being meshed and its inputs.
struct Cell<'a> {
    level: &'a dyn LevelView,
    pos: BlockPos,
    offset: BlockPos,
    fluid: FluidState,
    colors: &'a dyn ColorProvider,
}

/// Builds the surface of single fluid cells.
///
/// Immutable and shareable between workers; per-worker state lives in
/// [`FluidScratch`].
pub struct FluidRenderer {
    lighters: LightPipelineProvider,
    rules: Box<dyn FluidRules>,
    ambient_occlusion: bool,
}

impl FluidRenderer {
    /// Renderer over the given light pipelines and platform rules.
    pub fn new(
        lighters: LightPipelineProvider,
        rules: Box<dyn FluidRules>,
        ambient_occlusion: bool,
    ) -> Self {
        Self {
            lighters,
            rules,
            ambient_occlusion,
        }
    }

    /// Whether water is lit with the smooth pipeline.
    pub fn ambient_occlusion(&self) -> bool {
        self.ambient_occlusion
    }

    /// Platform rules consulted while meshing.
    pub fn rules(&self) -> &dyn FluidRules {
        self.rules.as_ref()
    }

    /// Mesh the fluid at `pos` and return how many quads were written.
    ///
    /// `offset` is the cell position relative to the origin of the mesh
    /// being built. Cells hidden on every side write nothing and never reach
    /// the light pipelines or `colors`.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        scratch: &mut FluidScratch,
        level: &dyn LevelView,
        block_state: BlockState,
        fluid: FluidState,
        pos: BlockPos,
        offset: BlockPos,
        out: &mut FluidOutput<'_>,
        colors: &dyn ColorProvider,
        sprites: &FluidSprites,
    ) -> usize {
        debug_assert!(!fluid.is_empty(), "render called for an empty fluid at {pos:?}");

        let mask = compute_cull_mask(
            &mut scratch.occlusion,
            self.rules.as_ref(),
            level,
            pos,
            block_state,
            fluid,
        );
        if mask.is_totally_occluded() {
            return 0;
        }

        let corners = corner_heights(&mut scratch.heights, level, fluid, pos);
        let cell = Cell {
            level,
            pos,
            offset,
            fluid,
            colors,
        };
        self.emit_faces(scratch, &cell, out, sprites, mask, corners)
    }

    fn emit_faces(
        &self,
        scratch: &mut FluidScratch,
        cell: &Cell<'_>,
        out: &mut FluidOutput<'_>,
        sprites: &FluidSprites,
        mask: CullMask,
        mut corners: [f32; 4],
    ) -> usize {
        let mut written = 0;
        let y_offset = if mask.is_culled(Direction::Down) {
            0.0
        } else {
            EPSILON
        };

        let lowest = corners.iter().copied().fold(f32::INFINITY, f32::min);
        if !mask.is_culled(Direction::Up)
            && is_side_exposed(cell.level, cell.pos, Direction::Up, lowest)
        {
            for corner in &mut corners {
                *corner -= EPSILON;
            }

            let velocity = cell.fluid.flow(cell.level, cell.pos);
            let (sprite, uvs) = top_face_uvs(velocity, sprites);
            let quad = &mut scratch.quad;
            quad.set_flags(QuadFlags::empty());
            quad.set_sprite(sprite);
            let xz = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
            let ys = [
                corners[CORNER_NW],
                corners[CORNER_SW],
                corners[CORNER_SE],
                corners[CORNER_NE],
            ];
            for i in 0..4 {
                let (x, z) = xz[i];
                quad.set_vertex(i, x, ys[i], z, uvs[i][0], uvs[i][1]);
            }

            let level_surface = is_aligned_equals(corners[CORNER_NE], corners[CORNER_NW])
                && is_aligned_equals(corners[CORNER_NW], corners[CORNER_SE])
                && is_aligned_equals(corners[CORNER_SE], corners[CORNER_SW])
                && is_aligned_equals(corners[CORNER_SW], corners[CORNER_NE]);
            let (facing, backward) = if level_surface {
                (ModelQuadFacing::PosY, ModelQuadFacing::NegY)
            } else {
                (ModelQuadFacing::Unassigned, ModelQuadFacing::Unassigned)
            };
            self.update_quad(scratch, cell, Direction::Up, facing, 1.0);
            write_quad(scratch, out, cell.offset, facing, false);
            written += 1;

            if self
                .rules
                .should_render_backward_up_face(cell.level, cell.pos.above(), cell.fluid)
            {
                write_quad(scratch, out, cell.offset, backward, true);
                written += 1;
            }
        }

        if !mask.is_culled(Direction::Down) {
            let sprite = sprites.still;
            let quad = &mut scratch.quad;
            quad.set_flags(QuadFlags::empty());
            quad.set_sprite(sprite);
            quad.set_vertex(0, 0.0, y_offset, 1.0, sprite.u0, sprite.v1);
            quad.set_vertex(1, 0.0, y_offset, 0.0, sprite.u0, sprite.v0);
            quad.set_vertex(2, 1.0, y_offset, 0.0, sprite.u1, sprite.v0);
            quad.set_vertex(3, 1.0, y_offset, 1.0, sprite.u1, sprite.v1);

            self.update_quad(scratch, cell, Direction::Down, ModelQuadFacing::NegY, 1.0);
            write_quad(scratch, out, cell.offset, ModelQuadFacing::NegY, false);
            written += 1;
        }

        for side in &SIDES {
            if mask.is_culled(side.dir) {
                continue;
            }
            let c1 = corners[side.c1];
            let c2 = corners[side.c2];
            if !is_side_exposed(cell.level, cell.pos, side.dir, c1.max(c2)) {
                continue;
            }

            let (sprite, overlay) = match sprites.overlay {
                Some(overlay) if self.shows_overlay(cell, side.dir) => (overlay, true),
                _ => (sprites.flowing, false),
            };

            let u1 = sprite.u(0.0);
            let u2 = sprite.u(0.5);
            let v1 = sprite.v((1.0 - c1) * 0.5);
            let v2 = sprite.v((1.0 - c2) * 0.5);
            let v3 = sprite.v(0.5);

            let quad = &mut scratch.quad;
            quad.set_flags(QuadFlags::IS_PARALLEL | QuadFlags::IS_ALIGNED);
            quad.set_sprite(sprite);
            quad.set_vertex(0, side.x2, c2, side.z2, u2, v2);
            quad.set_vertex(1, side.x2, y_offset, side.z2, u2, v3);
            quad.set_vertex(2, side.x1, y_offset, side.z1, u1, v3);
            quad.set_vertex(3, side.x1, c1, side.z1, u1, v1);

            let brightness = match side.dir.axis() {
                Axis::Z => Z_SIDE_BRIGHTNESS,
                _ => X_SIDE_BRIGHTNESS,
            };
            let facing = ModelQuadFacing::from_direction(side.dir);
            self.update_quad(scratch, cell, side.dir, facing, brightness);
            write_quad(scratch, out, cell.offset, facing, false);
            written += 1;

            if !overlay {
                write_quad(scratch, out, cell.offset, facing.opposite(), true);
                written += 1;
            }
        }

        written
    }

    fn shows_overlay(&self, cell: &Cell<'_>, dir: Direction) -> bool {
        let adjacent_pos = cell.pos.offset(dir);
        let adjacent = cell.level.block_state(adjacent_pos);
        self.rules
            .should_show_fluid_overlay(cell.level, adjacent, adjacent_pos, cell.fluid)
    }

    /// Normal, light and tint for the quad currently in `scratch`.
    fn update_quad(
        &self,
        scratch: &mut FluidScratch,
        cell: &Cell<'_>,
        light_face: Direction,
        facing: ModelQuadFacing,
        brightness: f32,
    ) {
        let quad = &mut scratch.quad;
        let normal = facing
            .packed_aligned_normal()
            .unwrap_or_else(|| quad.calculate_normal());
        quad.set_face_normal(normal);
        quad.set_light_face(light_face);

        let mode = if self.ambient_occlusion && cell.fluid.fluid == Fluid::Water {
            LightMode::Smooth
        } else {
            LightMode::Flat
        };
        self.lighters
            .get(mode)
            .calculate(cell.level, quad, cell.pos, &mut scratch.light, light_face);

        cell.colors
            .colors(cell.level, cell.pos, cell.fluid, quad, &mut scratch.colors);

        for i in 0..4 {
            scratch.colors[i] = color::argb_to_abgr(scratch.colors[i]);
            scratch.brightness[i] = scratch.light.br[i] * brightness;
        }
    }
}

impl std::fmt::Debug for FluidRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluidRenderer")
            .field("ambient_occlusion", &self.ambient_occlusion)
            .finish_non_exhaustive()
    }
}

/// Sprite and UVs of the top face for a flow `velocity`.
///
/// Still fluid maps the still sprite straight on. Moving fluid rotates the
/// flowing sprite so its texture runs along the flow. UVs are then pulled
/// slightly towards their center to keep sampling inside the tile.
fn top_face_uvs(velocity: Vec3, sprites: &FluidSprites) -> (Sprite, [[f32; 2]; 4]) {
    let (sprite, fractions) = if velocity.x == 0.0 && velocity.z == 0.0 {
        (
            sprites.still,
            [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]],
        )
    } else {
        let angle = velocity.z.atan2(velocity.x) - FRAC_PI_2;
        let s = angle.sin() * FLOW_UV_RADIUS;
        let c = angle.cos() * FLOW_UV_RADIUS;
        (
            sprites.flowing,
            [
                [0.5 - c - s, 0.5 - c + s],
                [0.5 - c + s, 0.5 + c + s],
                [0.5 + c + s, 0.5 + c - s],
                [0.5 + c - s, 0.5 - c - s],
            ],
        )
    };

    let mut uvs = fractions.map(|[fu, fv]| [sprite.u(fu), sprite.v(fv)]);
    let center_u = uvs.iter().map(|uv| uv[0]).sum::<f32>() / 4.0;
    let center_v = uvs.iter().map(|uv| uv[1]).sum::<f32>() / 4.0;
    let shrink = sprites.still.uv_shrink_ratio();
    for uv in &mut uvs {
        uv[0] += (center_u - uv[0]) * shrink;
        uv[1] += (center_v - uv[1]) * shrink;
    }
    (sprite, uvs)
}

/// Copy the quad in `scratch` into the mesh, reversing the winding when
/// `flip` is set so it faces the other way.
fn write_quad(
    scratch: &mut FluidScratch,
    out: &mut FluidOutput<'_>,
    offset: BlockPos,
    facing: ModelQuadFacing,
    flip: bool,
) {
    let quad = &scratch.quad;
    let origin = Vec3::new(offset.x as f32, offset.y as f32, offset.z as f32);
    for i in 0..4 {
        let dst = if flip { (4 - i) & 3 } else { i };
        let [u, v] = quad.uv(i);
        scratch.vertices[dst] = ChunkVertex {
            position: (origin + quad.position(i)).to_array(),
            color: scratch.colors[i],
            ao: scratch.brightness[i],
            uv: [u, v],
            light: scratch.light.lm[i],
        };
    }

    if let Some(sprite) = quad.sprite() {
        out.mesh.add_sprite(&sprite);
    }

    if out.material.is_translucent() {
        if let Some(collector) = out.collector.as_deref_mut() {
            let normal = if flip {
                packed_normal::flip(quad.face_normal())
            } else {
                quad.face_normal()
            };
            collector.append_quad(normal, &scratch.vertices, facing);
        }
    }

    out.mesh
        .push_vertices(facing, &scratch.vertices, out.material);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use fluidmesh_world::{BlockRegistry, DefaultFluidRules, LevelSlice};

    use super::*;
    use crate::{
        ChunkMeshBuffers, ConstantColorProvider, FlatLightPipeline, LightPipeline, SpriteId,
        TerrainPass, TranslucentQuadCollector,
    };

    #[derive(Clone, Default)]
    struct Calls(Arc<AtomicUsize>);

    impl Calls {
        fn bump(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct CountingLight(Calls);

    impl LightPipeline for CountingLight {
        fn calculate(
            &self,
            level: &dyn LevelView,
            quad: &ModelQuad,
            pos: BlockPos,
            out: &mut QuadLightData,
            light_face: Direction,
        ) {
            self.0.bump();
            FlatLightPipeline.calculate(level, quad, pos, out, light_face);
        }
    }

    struct CountingColors(Calls);

    impl ColorProvider for CountingColors {
        fn colors(
            &self,
            _level: &dyn LevelView,
            _pos: BlockPos,
            _fluid: FluidState,
            _quad: &ModelQuad,
            out: &mut [u32; 4],
        ) {
            self.0.bump();
            *out = [0xFF20_4080; 4];
        }
    }

    fn sprite(id: u32) -> Sprite {
        let u0 = id as f32 * 0.25;
        Sprite::new(SpriteId(id), [u0, 0.0, u0 + 0.25, 0.25], 16, 16)
    }

    fn sprites() -> FluidSprites {
        FluidSprites::new(sprite(0), sprite(1))
    }

    fn renderer(light_calls: &Calls) -> FluidRenderer {
        FluidRenderer::new(
            LightPipelineProvider::new(
                Box::new(CountingLight(light_calls.clone())),
                Box::new(CountingLight(light_calls.clone())),
            ),
            Box::new(DefaultFluidRules),
            false,
        )
    }

    struct World {
        level: LevelSlice,
        water: BlockState,
    }

    impl World {
        fn new() -> Self {
            let level = LevelSlice::new(BlockRegistry::with_defaults());
            let id = level.registry().id_by_name("water").unwrap();
            let water = BlockState::with_fluid(id, FluidState::source(Fluid::Water));
            Self { level, water }
        }

        fn named(&self, name: &str) -> BlockState {
            BlockState::dry(self.level.registry().id_by_name(name).unwrap())
        }
    }

    fn render_cell(
        renderer: &FluidRenderer,
        world: &World,
        pos: BlockPos,
        sprites: &FluidSprites,
        colors: &dyn ColorProvider,
        mesh: &mut ChunkMeshBuffers,
    ) -> usize {
        let mut scratch = FluidScratch::new(64);
        let mut out = FluidOutput {
            mesh,
            collector: None,
            material: Material::TRANSLUCENT,
        };
        renderer.render(
            &mut scratch,
            &world.level,
            world.water,
            world.water.fluid,
            pos,
            pos,
            &mut out,
            colors,
            sprites,
        )
    }

    fn ys(mesh: &ChunkMeshBuffers, facing: ModelQuadFacing) -> Vec<f32> {
        mesh.vertices(TerrainPass::Translucent, facing)
            .iter()
            .map(|v| v.position[1])
            .collect()
    }

    #[test]
    fn buried_cell_writes_nothing_and_never_lights() {
        let mut world = World::new();
        let stone = world.named("stone");
        world
            .level
            .fill(BlockPos::new(-1, -1, -1), BlockPos::new(1, 1, 1), stone);
        world.level.set_block(BlockPos::ZERO, world.water);

        let light_calls = Calls::default();
        let color_calls = Calls::default();
        let mut mesh = ChunkMeshBuffers::new();
        let quads = render_cell(
            &renderer(&light_calls),
            &world,
            BlockPos::ZERO,
            &sprites(),
            &CountingColors(color_calls.clone()),
            &mut mesh,
        );
        assert_eq!(quads, 0);
        assert!(mesh.is_empty());
        assert_eq!(light_calls.get(), 0);
        assert_eq!(color_calls.get(), 0);
    }

    #[test]
    fn equal_corners_give_a_flat_inset_top_and_lifted_bottom() {
        let mut world = World::new();
        world.level.set_block(BlockPos::ZERO, world.water);
        let calls = Calls::default();
        let renderer = renderer(&calls);
        let mut scratch = FluidScratch::new(16);
        let mut mesh = ChunkMeshBuffers::new();
        let colors = ConstantColorProvider::default();
        let cell = Cell {
            level: &world.level,
            pos: BlockPos::ZERO,
            offset: BlockPos::ZERO,
            fluid: world.water.fluid,
            colors: &colors,
        };
        let mut out = FluidOutput {
            mesh: &mut mesh,
            collector: None,
            material: Material::TRANSLUCENT,
        };
        let quads = renderer.emit_faces(
            &mut scratch,
            &cell,
            &mut out,
            &sprites(),
            CullMask::empty(),
            [0.5; 4],
        );
        // Top, its backward copy, bottom and four double-sided walls.
        assert_eq!(quads, 11);

        assert_eq!(ys(&mesh, ModelQuadFacing::PosY), vec![0.5 - EPSILON; 4]);
        let down = ys(&mesh, ModelQuadFacing::NegY);
        assert_eq!(down.len(), 8);
        assert_eq!(down.iter().filter(|&&y| y == EPSILON).count(), 4);
        assert_eq!(down.iter().filter(|&&y| y == 0.5 - EPSILON).count(), 4);
        assert_eq!(mesh.quad_count(), 11);
        assert_eq!(calls.get(), 6);
    }

    #[test]
    fn culled_floor_drops_the_walls_to_the_block_bottom() {
        let mut world = World::new();
        world.level.set_block(BlockPos::ZERO, world.water);
        let calls = Calls::default();
        let renderer = renderer(&calls);
        let mut scratch = FluidScratch::new(16);
        let mut mesh = ChunkMeshBuffers::new();
        let colors = ConstantColorProvider::default();
        let cell = Cell {
            level: &world.level,
            pos: BlockPos::ZERO,
            offset: BlockPos::ZERO,
            fluid: world.water.fluid,
            colors: &colors,
        };
        let mut out = FluidOutput {
            mesh: &mut mesh,
            collector: None,
            material: Material::TRANSLUCENT,
        };
        renderer.emit_faces(
            &mut scratch,
            &cell,
            &mut out,
            &sprites(),
            CullMask::DOWN | CullMask::UP,
            [0.5; 4],
        );
        let north = mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::NegZ);
        let lowest = north
            .iter()
            .map(|v| v.position[1])
            .fold(f32::INFINITY, f32::min);
        assert_eq!(lowest, 0.0);
        // Without a top face the walls keep the raw corner heights.
        assert!(north.iter().any(|v| v.position[1] == 0.5));
    }

    #[test]
    fn still_and_flowing_tops_pick_their_sprites() {
        let sprites = sprites();
        let (still, uvs) = top_face_uvs(Vec3::ZERO, &sprites);
        assert_eq!(still.id, SpriteId(0));
        // Corners pulled inwards by the shrink ratio, not past the center.
        assert!(uvs[0][0] > sprites.still.u0 && uvs[0][0] < sprites.still.u(0.5));

        let (flowing, uvs) = top_face_uvs(Vec3::new(0.3, 0.0, 0.1), &sprites);
        assert_eq!(flowing.id, SpriteId(1));
        for [u, v] in uvs {
            assert!(u >= sprites.flowing.u0 && u <= sprites.flowing.u1);
            assert!(v >= sprites.flowing.v0 && v <= sprites.flowing.v1);
        }
    }

    #[test]
    fn flow_along_x_maps_texture_down_the_sprite() {
        let sprites = sprites();
        let (_, along) = top_face_uvs(Vec3::X, &sprites);
        let (_, across) = top_face_uvs(Vec3::Z, &sprites);
        assert_ne!(along, across);
    }

    fn walled_cell(world: &mut World) {
        let stone = world.named("stone");
        let glass = world.named("glass");
        world.level.set_block(BlockPos::ZERO, world.water);
        world.level.set_block(BlockPos::new(0, 0, 1), stone);
        world.level.set_block(BlockPos::new(1, 0, 0), stone);
        world.level.set_block(BlockPos::new(-1, 0, 0), stone);
        world.level.set_block(BlockPos::new(0, 0, -1), glass);
    }

    #[test]
    fn overlay_sides_are_one_sided() {
        let mut world = World::new();
        walled_cell(&mut world);
        let sprites = sprites().with_overlay(sprite(2));
        let mut mesh = ChunkMeshBuffers::new();
        render_cell(
            &renderer(&Calls::default()),
            &world,
            BlockPos::ZERO,
            &sprites,
            &ConstantColorProvider::default(),
            &mut mesh,
        );
        assert_eq!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::NegZ).len(), 4);
        assert!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::PosZ).is_empty());
        assert!(mesh.sprites().any(|id| id == SpriteId(2)));
    }

    #[test]
    fn plain_sides_are_written_twice() {
        let mut world = World::new();
        walled_cell(&mut world);
        let mut mesh = ChunkMeshBuffers::new();
        render_cell(
            &renderer(&Calls::default()),
            &world,
            BlockPos::ZERO,
            &sprites(),
            &ConstantColorProvider::default(),
            &mut mesh,
        );
        assert_eq!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::NegZ).len(), 4);
        assert_eq!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::PosZ).len(), 4);
        assert!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::PosX).is_empty());
    }

    #[test]
    fn side_shade_depends_on_axis() {
        let mut world = World::new();
        world.level.set_block(BlockPos::ZERO, world.water);
        let mut mesh = ChunkMeshBuffers::new();
        render_cell(
            &renderer(&Calls::default()),
            &world,
            BlockPos::ZERO,
            &sprites(),
            &ConstantColorProvider::default(),
            &mut mesh,
        );
        for facing in [ModelQuadFacing::NegZ, ModelQuadFacing::PosZ] {
            for v in mesh.vertices(TerrainPass::Translucent, facing) {
                assert_eq!(v.ao, 0.8);
            }
        }
        for facing in [ModelQuadFacing::NegX, ModelQuadFacing::PosX] {
            for v in mesh.vertices(TerrainPass::Translucent, facing) {
                assert_eq!(v.ao, 0.6);
            }
        }
    }

    #[test]
    fn tint_is_stored_as_abgr() {
        let mut world = World::new();
        world.level.set_block(BlockPos::ZERO, world.water);
        let mut mesh = ChunkMeshBuffers::new();
        render_cell(
            &renderer(&Calls::default()),
            &world,
            BlockPos::ZERO,
            &sprites(),
            &CountingColors(Calls::default()),
            &mut mesh,
        );
        let top = mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::PosY);
        assert_eq!(top[0].color, 0xFF80_4020);
    }

    #[test]
    fn identical_inputs_give_identical_meshes() {
        let mut world = World::new();
        walled_cell(&mut world);
        world
            .level
            .set_block(BlockPos::new(0, 0, 2), world.water);
        let renderer = renderer(&Calls::default());
        let mut a = ChunkMeshBuffers::new();
        let mut b = ChunkMeshBuffers::new();
        for mesh in [&mut a, &mut b] {
            render_cell(
                &renderer,
                &world,
                BlockPos::ZERO,
                &sprites(),
                &ConstantColorProvider::default(),
                mesh,
            );
        }
        assert_eq!(a.hash(), b.hash());
    }

    fn labelled_quad(scratch: &mut FluidScratch) {
        for i in 0..4 {
            scratch.quad.set_vertex(i, i as f32, 0.0, 0.0, 0.0, 0.0);
        }
        scratch.quad.set_face_normal(packed_normal::pack(0.0, 1.0, 0.0));
        scratch.quad.set_sprite(sprite(0));
    }

    #[test]
    fn flipped_quads_reverse_the_winding() {
        let mut scratch = FluidScratch::new(4);
        labelled_quad(&mut scratch);
        let mut mesh = ChunkMeshBuffers::new();
        let mut out = FluidOutput {
            mesh: &mut mesh,
            collector: None,
            material: Material::SOLID,
        };
        write_quad(&mut scratch, &mut out, BlockPos::new(0, 5, 0), ModelQuadFacing::NegY, true);
        let order: Vec<f32> = mesh
            .vertices(TerrainPass::Solid, ModelQuadFacing::NegY)
            .iter()
            .map(|v| v.position[0])
            .collect();
        assert_eq!(order, vec![0.0, 3.0, 2.0, 1.0]);
        assert_eq!(
            mesh.vertices(TerrainPass::Solid, ModelQuadFacing::NegY)[0].position[1],
            5.0
        );
    }

    #[test]
    fn collector_sees_flipped_normals_for_translucent_quads_only() {
        let up = packed_normal::pack(0.0, 1.0, 0.0);
        let mut scratch = FluidScratch::new(4);
        labelled_quad(&mut scratch);
        let mut mesh = ChunkMeshBuffers::new();
        let mut collector = TranslucentQuadCollector::new();

        let mut out = FluidOutput {
            mesh: &mut mesh,
            collector: Some(&mut collector),
            material: Material::TRANSLUCENT,
        };
        write_quad(&mut scratch, &mut out, BlockPos::ZERO, ModelQuadFacing::PosY, false);
        write_quad(&mut scratch, &mut out, BlockPos::ZERO, ModelQuadFacing::NegY, true);
        out.material = Material::SOLID;
        write_quad(&mut scratch, &mut out, BlockPos::ZERO, ModelQuadFacing::PosY, false);

        let normals: Vec<u32> = collector.quads().iter().map(|q| q.normal).collect();
        assert_eq!(normals, vec![up, packed_normal::flip(up)]);
        assert_eq!(collector.quads()[1].facing, ModelQuadFacing::NegY);
        assert_eq!(mesh.quad_count(), 3);
    }

    fn emit_open_cell(corners: [f32; 4]) -> ChunkMeshBuffers {
        let mut world = World::new();
        world.level.set_block(BlockPos::ZERO, world.water);
        let renderer = renderer(&Calls::default());
        let mut scratch = FluidScratch::new(16);
        let mut mesh = ChunkMeshBuffers::new();
        let colors = ConstantColorProvider::default();
        let cell = Cell {
            level: &world.level,
            pos: BlockPos::ZERO,
            offset: BlockPos::ZERO,
            fluid: world.water.fluid,
            colors: &colors,
        };
        let mut out = FluidOutput {
            mesh: &mut mesh,
            collector: None,
            material: Material::TRANSLUCENT,
        };
        renderer.emit_faces(
            &mut scratch,
            &cell,
            &mut out,
            &sprites(),
            CullMask::empty(),
            corners,
        );
        mesh
    }

    #[test]
    fn nearly_level_tops_keep_the_aligned_facing() {
        let mesh = emit_open_cell([0.5, 0.5, 0.5, 0.505]);
        assert_eq!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::PosY).len(), 4);
        assert!(mesh
            .vertices(TerrainPass::Translucent, ModelQuadFacing::Unassigned)
            .is_empty());
        // Bottom face plus the backward copy of the top.
        assert_eq!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::NegY).len(), 8);

        let mesh = emit_open_cell([0.5, 0.5, 0.5, 0.52]);
        assert!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::PosY).is_empty());
        assert_eq!(
            mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::Unassigned).len(),
            8
        );
    }

    #[test]
    fn aligned_equality_tolerates_small_steps() {
        assert!(is_aligned_equals(0.5, 0.51));
        assert!(is_aligned_equals(0.51, 0.5));
        assert!(!is_aligned_equals(0.5, 0.52));
    }

    #[test]
    fn sloped_tops_go_to_the_unassigned_bucket() {
        let mut world = World::new();
        let flowing = BlockState::with_fluid(
            world.water.block,
            FluidState::flowing(Fluid::Water, 4),
        );
        world.level.set_block(BlockPos::ZERO, flowing);
        // Source to the east raises the eastern corners.
        world.level.set_block(BlockPos::new(1, 0, 0), world.water);
        let mut mesh = ChunkMeshBuffers::new();
        let mut scratch = FluidScratch::new(16);
        let mut out = FluidOutput {
            mesh: &mut mesh,
            collector: None,
            material: Material::TRANSLUCENT,
        };
        renderer(&Calls::default()).render(
            &mut scratch,
            &world.level,
            flowing,
            flowing.fluid,
            BlockPos::ZERO,
            BlockPos::ZERO,
            &mut out,
            &ConstantColorProvider::default(),
            &sprites(),
        );
        assert!(mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::PosY).is_empty());
        let top = mesh.vertices(TerrainPass::Translucent, ModelQuadFacing::Unassigned);
        // Forward and backward copies.
        assert_eq!(top.len(), 8);
        assert!(top[3].position[1] > top[0].position[1]);
        // Flowing sprite, since the slope drives a flow.
        assert!(mesh.sprites().any(|id| id == SpriteId(1)));
    }
}
