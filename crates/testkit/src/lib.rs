#![warn(missing_docs)]
//! Metric artifacts written by mesh runs and read back by tests and CI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Mesh metric snapshot for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidMeshMetric {
    /// Section coordinates [x, y, z].
    pub section: [i32; 3],
    /// Fluid cells visited.
    pub cells: usize,
    /// Quads written, including back faces.
    pub quads: usize,
    /// Quads handed to the translucency collector.
    pub translucent_quads: usize,
    /// Mesh hash (hex string) for deterministic comparisons.
    pub hash: String,
}

/// Writes section mesh metrics to JSON for CI artifacts.
pub struct MeshMetricSink {
    file: File,
}

impl MeshMetricSink {
    /// Create a sink pointed at the supplied path, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating metrics dir {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("creating metrics file {}", path.display()))?;
        Ok(Self { file })
    }

    /// Persist the provided metrics as pretty JSON.
    pub fn write(&mut self, metrics: &[FluidMeshMetric]) -> Result<()> {
        let json = serde_json::to_string_pretty(metrics)?;
        self.file.write_all(json.as_bytes())?;
        debug!(sections = metrics.len(), "wrote mesh metrics");
        Ok(())
    }
}

/// Load metrics previously written by [`MeshMetricSink`].
pub fn read_metrics<P: AsRef<Path>>(path: P) -> Result<Vec<FluidMeshMetric>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading metrics file {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}
