//! TOML scene files: extra blocks, fluid sprites, box fills and tints.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use fluidmesh_core::BlockPos;
use fluidmesh_render::{
    BlendedTintColorProvider, ColorProvider, ConstantColorProvider, FluidAppearance, FluidPalette,
    FluidSprites, Material, Sprite, SpriteId,
};
use fluidmesh_world::{
    BlockDescriptor, BlockRegistry, BlockState, Fluid, FluidState, LevelSlice, LevelView,
    RegistryError, FLUID_AMOUNT_SOURCE,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::RenderSettings;

/// Scene meshed when no `--scene` is given: a stone basin with a still pool,
/// a terrace of flowing water against glass, a waterfall and a lava pit.
const BUILTIN_SCENE: &str = r#"
[render]
ambient_occlusion = true
section_size = 16

[[sprites]]
fluid = "water"
still = [0.0, 0.0, 0.25, 0.25]
flowing = [0.25, 0.0, 0.5, 0.25]
overlay = [0.5, 0.0, 0.75, 0.25]

[[sprites]]
fluid = "lava"
still = [0.0, 0.25, 0.25, 0.5]
flowing = [0.25, 0.25, 0.5, 0.5]

[[fills]]
block = "stone"
min = [-8, -1, -8]
max = [8, -1, 8]

[[fills]]
block = "stone"
min = [-8, 0, -8]
max = [8, 1, -8]

[[fills]]
block = "stone"
min = [-8, 0, 8]
max = [8, 1, 8]

[[fills]]
block = "stone"
min = [-8, 0, -7]
max = [-8, 1, 7]

[[fills]]
block = "water"
min = [-7, 0, -7]
max = [0, 0, 7]
fluid = "water"

[[fills]]
block = "water"
min = [1, 0, -7]
max = [1, 0, 7]
fluid = "water"
amount = 6

[[fills]]
block = "water"
min = [2, 0, -7]
max = [2, 0, 7]
fluid = "water"
amount = 4

[[fills]]
block = "water"
min = [3, 0, -7]
max = [3, 0, 7]
fluid = "water"
amount = 2

[[fills]]
block = "glass"
min = [4, 0, -7]
max = [4, 1, 7]

[[fills]]
block = "stone_slab"
min = [-7, 0, 7]
max = [0, 0, 7]

[[fills]]
block = "water"
min = [-3, 1, 0]
max = [-3, 4, 0]
fluid = "water"
falling = true

[[fills]]
block = "stone"
min = [12, -1, -2]
max = [16, -1, 2]

[[fills]]
block = "lava"
min = [13, 0, -1]
max = [15, 0, 1]
fluid = "lava"

[[fills]]
block = "stone_slab"
min = [12, 0, -2]
max = [16, 0, -2]

[[tints]]
x = -7
z = -7
argb = 0xFF2B6BD1
"#;

const DEFAULT_SPRITE_SIZE: u32 = 16;

fn default_sprite_size() -> u32 {
    DEFAULT_SPRITE_SIZE
}

fn default_amount() -> u8 {
    FLUID_AMOUNT_SOURCE
}

/// Errors raised while loading or assembling a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The file is not valid scene TOML.
    #[error("invalid scene TOML: {0}")]
    Parse(#[from] toml::de::Error),
    /// Extra block descriptors clash with the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A fill names a block that was never registered.
    #[error("fill #{index} uses unknown block `{name}`")]
    UnknownBlock {
        /// Position of the fill in the file.
        index: usize,
        /// Name as written.
        name: String,
    },
    /// A fill asks for an empty or over-full fluid.
    #[error("fill #{index} has fluid amount {amount}, expected 1..={max}", max = FLUID_AMOUNT_SOURCE)]
    AmountOutOfRange {
        /// Position of the fill in the file.
        index: usize,
        /// Amount as written.
        amount: u8,
    },
    /// A fill places a fluid that has no sprites.
    #[error("fill #{index} places {fluid:?} but the scene has no sprites for it")]
    MissingSprites {
        /// Position of the fill in the file.
        index: usize,
        /// Fluid lacking an appearance.
        fluid: Fluid,
    },
    /// Two sprite entries for one fluid.
    #[error("sprites for {0:?} are defined twice")]
    DuplicateSprites(Fluid),
    /// A sprite rectangle is empty or leaves the atlas.
    #[error("{fluid:?} sprite `{which}` has malformed rectangle {rect:?}")]
    InvalidSprite {
        /// Fluid the sprite belongs to.
        fluid: Fluid,
        /// `still`, `flowing` or `overlay`.
        which: &'static str,
        /// Rectangle as written.
        rect: [f32; 4],
    },
    /// Sprites were given for the empty fluid.
    #[error("sprites cannot be assigned to the empty fluid")]
    EmptyFluidSprites,
}

/// Atlas rectangles for one fluid.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpriteConfig {
    /// Fluid these sprites dress.
    pub fluid: Fluid,
    /// `[u0, v0, u1, v1]` of the still texture.
    pub still: [f32; 4],
    /// `[u0, v0, u1, v1]` of the flowing texture.
    pub flowing: [f32; 4],
    /// Optional overlay for sides against see-through blocks.
    #[serde(default)]
    pub overlay: Option<[f32; 4]>,
    /// Texture edge in pixels.
    #[serde(default = "default_sprite_size")]
    pub size: u32,
}

/// Inclusive box of cells set to one block, optionally holding fluid.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FillConfig {
    /// Block name.
    pub block: String,
    /// First corner.
    pub min: [i32; 3],
    /// Opposite corner; a single cell when absent.
    #[serde(default)]
    pub max: Option<[i32; 3]>,
    /// Fluid stored in every filled cell.
    #[serde(default)]
    pub fluid: Option<Fluid>,
    /// Fluid amount, a source by default.
    #[serde(default = "default_amount")]
    pub amount: u8,
    /// Whether the fluid is falling.
    #[serde(default)]
    pub falling: bool,
}

/// Biome water tint of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TintConfig {
    /// Column X.
    pub x: i32,
    /// Column Z.
    pub z: i32,
    /// ARGB color.
    pub argb: u32,
}

/// A scene file as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Mesher settings.
    pub render: RenderSettings,
    /// Block descriptors registered after the built-in ones.
    pub blocks: Vec<BlockDescriptor>,
    /// Sprites per fluid.
    pub sprites: Vec<SpriteConfig>,
    /// Fills applied in order; later fills overwrite earlier ones.
    pub fills: Vec<FillConfig>,
    /// Water tints per column.
    pub tints: Vec<TintConfig>,
}

impl SceneConfig {
    /// Parse scene TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(contents)?)
    }

    /// The scene used when none is given.
    pub fn builtin() -> Result<Self, SceneError> {
        Self::from_toml_str(BUILTIN_SCENE)
    }

    /// Read and parse a scene file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading scene {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("loading scene {}", path.display()))
    }
}

/// A scene ready to mesh.
#[derive(Debug)]
pub struct Scene {
    /// Cells of the scene.
    pub level: LevelSlice,
    /// Appearance of each fluid.
    pub palette: FluidPalette,
}

impl Scene {
    /// Validate `config` and build its level and fluid palette.
    pub fn build(config: &SceneConfig) -> Result<Self, SceneError> {
        let mut registry = BlockRegistry::with_defaults();
        for descriptor in &config.blocks {
            registry.register(descriptor.clone())?;
        }

        let palette = build_palette(&config.sprites, &config.render)?;

        let mut level = LevelSlice::new(registry);
        for (index, fill) in config.fills.iter().enumerate() {
            let state = fill_state(&level, &palette, index, fill)?;
            let min = BlockPos::from(fill.min);
            let max = fill.max.map(BlockPos::from).unwrap_or(min);
            level.fill(min, max, state);
        }
        for tint in &config.tints {
            level.set_water_tint(tint.x, tint.z, tint.argb);
        }

        debug!(
            blocks = level.len(),
            bounds = ?level.bounds(),
            fluids = level.fluid_positions().len(),
            "built scene"
        );
        Ok(Self { level, palette })
    }
}

fn fill_state(
    level: &LevelSlice,
    palette: &FluidPalette,
    index: usize,
    fill: &FillConfig,
) -> Result<BlockState, SceneError> {
    let block = level
        .registry()
        .id_by_name(&fill.block)
        .map_err(|_| SceneError::UnknownBlock {
            index,
            name: fill.block.clone(),
        })?;
    let Some(fluid) = fill.fluid.filter(|fluid| !fluid.is_empty()) else {
        return Ok(BlockState::dry(block));
    };
    if fill.amount == 0 || fill.amount > FLUID_AMOUNT_SOURCE {
        return Err(SceneError::AmountOutOfRange {
            index,
            amount: fill.amount,
        });
    }
    if palette.get(fluid).is_none() {
        return Err(SceneError::MissingSprites { index, fluid });
    }
    let mut state = FluidState::flowing(fluid, fill.amount);
    if fill.falling {
        state = state.falling();
    }
    Ok(BlockState::with_fluid(block, state))
}

fn build_palette(
    sprites: &[SpriteConfig],
    settings: &RenderSettings,
) -> Result<FluidPalette, SceneError> {
    let mut palette = FluidPalette::new();
    let mut next_id = 0;
    let mut sprite = |fluid: Fluid, which: &'static str, rect: [f32; 4], size: u32| {
        let candidate = Sprite {
            id: SpriteId(next_id),
            u0: rect[0],
            v0: rect[1],
            u1: rect[2],
            v1: rect[3],
            width: size,
            height: size,
        };
        if !candidate.is_valid() {
            return Err(SceneError::InvalidSprite { fluid, which, rect });
        }
        next_id += 1;
        Ok(candidate)
    };

    for entry in sprites {
        let fluid = entry.fluid;
        if fluid.is_empty() {
            return Err(SceneError::EmptyFluidSprites);
        }
        if palette.get(fluid).is_some() {
            return Err(SceneError::DuplicateSprites(fluid));
        }
        let mut set = FluidSprites::new(
            sprite(fluid, "still", entry.still, entry.size)?,
            sprite(fluid, "flowing", entry.flowing, entry.size)?,
        );
        if let Some(rect) = entry.overlay {
            set = set.with_overlay(sprite(fluid, "overlay", rect, entry.size)?);
        }

        let (colors, material): (Box<dyn ColorProvider>, Material) = match fluid {
            Fluid::Water => (
                Box::new(BlendedTintColorProvider),
                if settings.water_translucent {
                    Material::TRANSLUCENT
                } else {
                    Material::SOLID
                },
            ),
            _ => (Box::new(ConstantColorProvider::default()), Material::SOLID),
        };
        palette.insert(
            fluid,
            FluidAppearance {
                sprites: set,
                colors,
                material,
            },
        );
    }
    Ok(palette)
}
