/// Identifier of a sprite within the block atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(pub u32);

/// Rectangle of the block atlas holding one texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    /// Atlas identifier.
    pub id: SpriteId,
    /// Left U coordinate.
    pub u0: f32,
    /// Top V coordinate.
    pub v0: f32,
    /// Right U coordinate.
    pub u1: f32,
    /// Bottom V coordinate.
    pub v1: f32,
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
}

impl Sprite {
    /// Sprite covering `[u0, u1] × [v0, v1]` of an atlas, `width × height` pixels.
    pub fn new(id: SpriteId, uv: [f32; 4], width: u32, height: u32) -> Self {
        let sprite = Self {
            id,
            u0: uv[0],
            v0: uv[1],
            u1: uv[2],
            v1: uv[3],
            width,
            height,
        };
        debug_assert!(sprite.is_valid(), "malformed sprite {sprite:?}");
        sprite
    }

    /// Atlas U at fraction `f` (0..1) across the sprite.
    pub fn u(&self, f: f32) -> f32 {
        self.u0 + (self.u1 - self.u0) * f
    }

    /// Atlas V at fraction `f` (0..1) down the sprite.
    pub fn v(&self, f: f32) -> f32 {
        self.v0 + (self.v1 - self.v0) * f
    }

    /// Fraction by which UVs are pulled towards their center so sampling
    /// never bleeds into neighboring atlas tiles.
    pub fn uv_shrink_ratio(&self) -> f32 {
        let atlas_width = self.width as f32 / (self.u1 - self.u0);
        let atlas_height = self.height as f32 / (self.v1 - self.v0);
        4.0 / atlas_width.max(atlas_height)
    }

    /// Non-empty rectangle inside `[0, 1]²` with non-zero pixel size.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && 0.0 <= self.u0
            && self.u0 < self.u1
            && self.u1 <= 1.0
            && 0.0 <= self.v0
            && self.v0 < self.v1
            && self.v1 <= 1.0
    }
}

/// Textures of one fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidSprites {
    /// Still surface (index 0). Also used for the bottom face.
    pub still: Sprite,
    /// Flowing surface and sides (index 1).
    pub flowing: Sprite,
    /// Optional overlay for sides against see-through blocks (index 2).
    pub overlay: Option<Sprite>,
}

impl FluidSprites {
    /// Sprite set without an overlay.
    pub fn new(still: Sprite, flowing: Sprite) -> Self {
        Self {
            still,
            flowing,
            overlay: None,
        }
    }

    /// Same set with an overlay sprite.
    pub fn with_overlay(mut self, overlay: Sprite) -> Self {
        self.overlay = Some(overlay);
        self
    }
}
