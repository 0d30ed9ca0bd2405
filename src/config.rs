use fluidmesh_render::DEFAULT_OCCLUSION_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};

/// Mesher knobs read from the `[render]` table of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Smooth-light water surfaces.
    pub ambient_occlusion: bool,
    /// Entries per worker in the full-block occlusion cache.
    pub occlusion_cache_capacity: usize,
    /// Edge length of a mesh section in cells.
    pub section_size: i32,
    /// Route water through the translucent pass (and the sort collector).
    pub water_translucent: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            ambient_occlusion: true,
            occlusion_cache_capacity: DEFAULT_OCCLUSION_CACHE_CAPACITY,
            section_size: 16,
            water_translucent: true,
        }
    }
}

impl RenderSettings {
    /// Apply command-line overrides on top of the scene's settings.
    pub fn with_overrides(
        mut self,
        ambient_occlusion: Option<bool>,
        section_size: Option<i32>,
        cache_capacity: Option<usize>,
    ) -> Self {
        if let Some(value) = ambient_occlusion {
            self.ambient_occlusion = value;
        }
        if let Some(value) = section_size {
            self.section_size = value.max(1);
        }
        if let Some(value) = cache_capacity {
            self.occlusion_cache_capacity = value.max(1);
        }
        self
    }
}
