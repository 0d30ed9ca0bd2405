//! fluidmesh - fluid surface meshing for voxel scenes
//!
//! Loads a TOML scene (or the built-in one), meshes every section holding
//! fluid and reports per-section statistics.

mod config;
mod scene;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use fluidmesh_render::{
    fluid_sections, FluidRenderer, FluidSectionDriver, LightPipelineProvider, SortType,
    TerrainPass,
};
use fluidmesh_world::DefaultFluidRules;
use scene::{Scene, SceneConfig};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fluid surface mesher for voxel scenes", long_about = None)]
struct Args {
    /// Scene TOML to mesh; the built-in scene is used when omitted
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Write per-section metrics JSON here
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Override smooth lighting for water (true/false)
    #[arg(long)]
    ambient_occlusion: Option<bool>,

    /// Override the section edge length in cells
    #[arg(long)]
    section_size: Option<i32>,

    /// Override the occlusion cache capacity per worker
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Mesh sections on the calling thread instead of the rayon pool
    #[arg(long)]
    serial: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Starting fluidmesh v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.scene {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::builtin().context("parsing built-in scene")?,
    };
    let settings = config.render.with_overrides(
        args.ambient_occlusion,
        args.section_size,
        args.cache_capacity,
    );
    let scene = Scene::build(&config).context("building scene")?;

    let renderer = FluidRenderer::new(
        LightPipelineProvider::default(),
        Box::new(DefaultFluidRules),
        settings.ambient_occlusion,
    );
    let driver = FluidSectionDriver::new(
        &renderer,
        &scene.palette,
        settings.section_size,
        settings.occlusion_cache_capacity,
    );
    let sections = fluid_sections(&scene.level, settings.section_size);
    if sections.is_empty() {
        warn!("scene holds no fluid, nothing to mesh");
    }

    let started = Instant::now();
    let meshes = if args.serial {
        driver.mesh_sections(&scene.level, &sections)
    } else {
        driver.mesh_sections_parallel(&scene.level, &sections)
    };
    let elapsed = started.elapsed();

    let cells: usize = meshes.iter().map(|m| m.cells).sum();
    let quads: usize = meshes.iter().map(|m| m.quads).sum();
    let solid: usize = meshes
        .iter()
        .map(|m| m.buffers.pass_quad_count(TerrainPass::Solid))
        .sum();
    let dynamic = meshes
        .iter()
        .filter(|m| m.translucent.sort_type() == SortType::Dynamic)
        .count();
    info!(
        sections = meshes.len(),
        cells,
        quads,
        solid,
        translucent = quads - solid,
        dynamic_sort_sections = dynamic,
        ambient_occlusion = settings.ambient_occlusion,
        serial = args.serial,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "meshed scene"
    );

    if let Some(path) = &args.metrics {
        FluidSectionDriver::write_metrics_to_file(&meshes, path)
            .with_context(|| format!("writing metrics to {}", path.display()))?;
        info!(path = %path.display(), "wrote metrics");
    }

    Ok(())
}
