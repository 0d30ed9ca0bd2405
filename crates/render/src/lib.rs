#![warn(missing_docs)]
//! Fluid surface meshing.
//!
//! [`FluidRenderer`] turns one fluid cell and its neighborhood into lit,
//! textured quads. [`FluidSectionDriver`] runs it over whole sections,
//! serially or on a rayon pool with one [`FluidScratch`] per worker.

mod cache;
mod color;
mod driver;
mod fluid;
mod height;
mod light;
mod material;
mod mesh;
mod quad;
mod texture_atlas;
mod translucent;

pub use cache::{compute_cull_mask, is_side_exposed, BlockOcclusionCache, CullMask};
pub use color::{BlendedTintColorProvider, ColorProvider, ConstantColorProvider};
pub use driver::{
    fluid_sections, FluidAppearance, FluidPalette, FluidSectionDriver, SectionMesh, SectionPos,
};
pub use fluid::{
    FluidOutput, FluidRenderer, FluidScratch, CORNER_NE, CORNER_NW, CORNER_SE, CORNER_SW, EPSILON,
};
pub use height::{corner_height, corner_heights, fluid_height, HeightAccumulator};
pub use light::{
    FlatLightPipeline, LightMode, LightPipeline, LightPipelineProvider, QuadLightData,
    SmoothLightPipeline,
};
pub use material::{Material, TerrainPass};
pub use mesh::{ChunkMeshBuffers, ChunkModelBuilder, ChunkVertex, MeshHash};
pub use quad::{ModelQuad, QuadFlags};
pub use texture_atlas::{FluidSprites, Sprite, SpriteId};
pub use translucent::{
    SortType, TranslucentGeometryCollector, TranslucentQuad, TranslucentQuadCollector,
};

/// Default capacity of the per-worker occlusion cache.
pub const DEFAULT_OCCLUSION_CACHE_CAPACITY: usize = 2048;
