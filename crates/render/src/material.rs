/// Render pass a quad is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TerrainPass {
    /// Depth-tested, no blending.
    Solid,
    /// Alpha blended; needs back-to-front ordering.
    Translucent,
}

impl TerrainPass {
    /// Every pass in draw order.
    pub const ALL: [TerrainPass; 2] = [TerrainPass::Solid, TerrainPass::Translucent];

    /// Index into per-pass arrays.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Pass plus sampling options for a batch of quads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Material {
    /// Target pass.
    pub pass: TerrainPass,
    /// Whether the sampler uses mipmaps.
    pub mipped: bool,
}

impl Material {
    /// Opaque geometry (lava).
    pub const SOLID: Self = Self {
        pass: TerrainPass::Solid,
        mipped: true,
    };

    /// Blended geometry (water).
    pub const TRANSLUCENT: Self = Self {
        pass: TerrainPass::Translucent,
        mipped: true,
    };

    /// True when quads must be handed to the translucency collector.
    pub fn is_translucent(self) -> bool {
        self.pass == TerrainPass::Translucent
    }
}
