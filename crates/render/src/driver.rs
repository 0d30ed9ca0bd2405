use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use fluidmesh_core::BlockPos;
use fluidmesh_testkit::{FluidMeshMetric, MeshMetricSink};
use fluidmesh_world::{Fluid, LevelSlice, LevelView};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    ChunkMeshBuffers, ColorProvider, FluidOutput, FluidRenderer, FluidScratch, FluidSprites,
    Material, MeshHash, TranslucentQuadCollector,
};

/// Coordinates of a cubic section of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionPos {
    /// Section X.
    pub x: i32,
    /// Section Y.
    pub y: i32,
    /// Section Z.
    pub z: i32,
}

impl SectionPos {
    /// Construct a section position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Section of edge `size` containing `pos`.
    pub fn containing(pos: BlockPos, size: i32) -> Self {
        Self::new(
            pos.x.div_euclid(size),
            pos.y.div_euclid(size),
            pos.z.div_euclid(size),
        )
    }

    /// Lowest cell of the section.
    pub fn origin(self, size: i32) -> BlockPos {
        BlockPos::new(self.x * size, self.y * size, self.z * size)
    }
}

/// How one fluid is drawn.
pub struct FluidAppearance {
    /// Surface textures.
    pub sprites: FluidSprites,
    /// Tint source.
    pub colors: Box<dyn ColorProvider>,
    /// Pass the fluid is drawn in.
    pub material: Material,
}

/// Appearance per fluid kind. Fluids without an entry are skipped.
#[derive(Default)]
pub struct FluidPalette {
    water: Option<FluidAppearance>,
    lava: Option<FluidAppearance>,
}

impl FluidPalette {
    /// Empty palette.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how `fluid` is drawn. Setting [`Fluid::Empty`] is ignored.
    pub fn insert(&mut self, fluid: Fluid, appearance: FluidAppearance) {
        match fluid {
            Fluid::Water => self.water = Some(appearance),
            Fluid::Lava => self.lava = Some(appearance),
            Fluid::Empty => {}
        }
    }

    /// Appearance of `fluid`, if registered.
    pub fn get(&self, fluid: Fluid) -> Option<&FluidAppearance> {
        match fluid {
            Fluid::Water => self.water.as_ref(),
            Fluid::Lava => self.lava.as_ref(),
            Fluid::Empty => None,
        }
    }
}

impl std::fmt::Debug for FluidPalette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluidPalette")
            .field("water", &self.water.as_ref().map(|a| a.material))
            .field("lava", &self.lava.as_ref().map(|a| a.material))
            .finish()
    }
}

/// Finished mesh of one section.
#[derive(Debug, Clone)]
pub struct SectionMesh {
    /// Section this mesh belongs to.
    pub position: SectionPos,
    /// Vertex buckets.
    pub buffers: ChunkMeshBuffers,
    /// Translucent quads for sorting.
    pub translucent: TranslucentQuadCollector,
    /// Fluid cells visited.
    pub cells: usize,
    /// Quads written.
    pub quads: usize,
    /// Mesh hash for determinism comparisons.
    pub hash: MeshHash,
}

/// Meshes the fluid cells of whole sections.
pub struct FluidSectionDriver<'a> {
    renderer: &'a FluidRenderer,
    palette: &'a FluidPalette,
    section_size: i32,
    cache_capacity: usize,
}

impl<'a> FluidSectionDriver<'a> {
    /// Driver over sections of edge `section_size` (at least 1). Each worker
    /// gets an occlusion cache of `cache_capacity` entries.
    pub fn new(
        renderer: &'a FluidRenderer,
        palette: &'a FluidPalette,
        section_size: i32,
        cache_capacity: usize,
    ) -> Self {
        Self {
            renderer,
            palette,
            section_size: section_size.max(1),
            cache_capacity,
        }
    }

    /// Edge length of a section in cells.
    pub fn section_size(&self) -> i32 {
        self.section_size
    }

    /// Mesh one section, visiting cells in Y, Z, X order.
    pub fn mesh_section(
        &self,
        scratch: &mut FluidScratch,
        level: &dyn LevelView,
        section: SectionPos,
    ) -> SectionMesh {
        let origin = section.origin(self.section_size);
        let mut buffers = ChunkMeshBuffers::new();
        let mut translucent = TranslucentQuadCollector::new();
        let mut cells = 0;
        let mut quads = 0;

        for dy in 0..self.section_size {
            for dz in 0..self.section_size {
                for dx in 0..self.section_size {
                    let pos = origin.add(dx, dy, dz);
                    let state = level.block_state(pos);
                    if state.fluid.is_empty() {
                        continue;
                    }
                    let Some(appearance) = self.palette.get(state.fluid.fluid) else {
                        trace!(?pos, fluid = ?state.fluid.fluid, "no appearance for fluid");
                        continue;
                    };
                    cells += 1;
                    let mut out = FluidOutput {
                        mesh: &mut buffers,
                        collector: Some(&mut translucent),
                        material: appearance.material,
                    };
                    quads += self.renderer.render(
                        scratch,
                        level,
                        state,
                        state.fluid,
                        pos,
                        BlockPos::new(dx, dy, dz),
                        &mut out,
                        appearance.colors.as_ref(),
                        &appearance.sprites,
                    );
                }
            }
        }

        let hash = buffers.hash();
        debug!(
            ?section,
            cells,
            quads,
            translucent = translucent.len(),
            hash = %hash.to_hex(),
            "meshed fluid section"
        );
        SectionMesh {
            position: section,
            buffers,
            translucent,
            cells,
            quads,
            hash,
        }
    }

    /// Mesh `sections` in order on the calling thread.
    pub fn mesh_sections(&self, level: &dyn LevelView, sections: &[SectionPos]) -> Vec<SectionMesh> {
        let mut scratch = FluidScratch::new(self.cache_capacity);
        let meshes = sections
            .iter()
            .map(|&section| self.mesh_section(&mut scratch, level, section))
            .collect();
        let cache = scratch.occlusion_cache();
        debug!(
            hits = cache.hits(),
            misses = cache.misses(),
            "occlusion cache after serial pass"
        );
        meshes
    }

    /// Mesh `sections` on the rayon pool, one scratch per worker. The result
    /// keeps the input order and matches [`Self::mesh_sections`].
    pub fn mesh_sections_parallel<L>(&self, level: &L, sections: &[SectionPos]) -> Vec<SectionMesh>
    where
        L: LevelView + Sync,
    {
        sections
            .par_iter()
            .map_init(
                || FluidScratch::new(self.cache_capacity),
                |scratch, &section| self.mesh_section(scratch, level, section),
            )
            .collect()
    }

    /// Convert meshes into serializable metrics for CI artifacts.
    pub fn stats_to_metrics(meshes: &[SectionMesh]) -> Vec<FluidMeshMetric> {
        meshes
            .iter()
            .map(|mesh| FluidMeshMetric {
                section: [mesh.position.x, mesh.position.y, mesh.position.z],
                cells: mesh.cells,
                quads: mesh.quads,
                translucent_quads: mesh.translucent.len(),
                hash: mesh.hash.to_hex(),
            })
            .collect()
    }

    /// Write metrics to disk using the testkit sink.
    pub fn write_metrics_to_file<P: AsRef<Path>>(meshes: &[SectionMesh], path: P) -> Result<()> {
        let metrics = Self::stats_to_metrics(meshes);
        let mut sink = MeshMetricSink::create(path)?;
        sink.write(&metrics)?;
        Ok(())
    }
}

/// Sections of edge `size` holding at least one fluid cell, sorted.
pub fn fluid_sections(level: &LevelSlice, size: i32) -> Vec<SectionPos> {
    let size = size.max(1);
    level
        .fluid_positions()
        .into_iter()
        .map(|pos| SectionPos::containing(pos, size))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
