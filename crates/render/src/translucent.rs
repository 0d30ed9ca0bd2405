use fluidmesh_core::{packed_normal, ModelQuadFacing};
use glam::Vec3;

use crate::ChunkVertex;

const PLANE_EPSILON: f32 = 1e-4;

/// Receives translucent quads so they can be ordered before drawing.
pub trait TranslucentGeometryCollector {
    /// Record one quad with its packed normal and facing bucket.
    fn append_quad(
        &mut self,
        packed_normal: u32,
        vertices: &[ChunkVertex; 4],
        facing: ModelQuadFacing,
    );
}

/// How a section's translucent geometry has to be sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortType {
    /// No translucent quads.
    Empty,
    /// Every quad lies on one plane with one normal; any order is correct.
    None,
    /// Order depends on the camera.
    Dynamic,
}

/// A translucent quad reduced to what sorting needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslucentQuad {
    /// Average of the four vertex positions.
    pub center: Vec3,
    /// Packed normal as received.
    pub normal: u32,
    /// Facing bucket the quad was written to.
    pub facing: ModelQuadFacing,
}

/// Collector that keeps quad centroids for back-to-front ordering.
#[derive(Debug, Clone, Default)]
pub struct TranslucentQuadCollector {
    quads: Vec<TranslucentQuad>,
}

impl TranslucentQuadCollector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Quads in arrival order.
    pub fn quads(&self) -> &[TranslucentQuad] {
        &self.quads
    }

    /// Number of quads.
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// True when nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Forget all quads.
    pub fn clear(&mut self) {
        self.quads.clear();
    }

    /// Classify the collected geometry.
    pub fn sort_type(&self) -> SortType {
        let Some(first) = self.quads.first() else {
            return SortType::Empty;
        };
        let normal = packed_normal::unpack(first.normal);
        let distance = normal.dot(first.center);
        let coplanar = self.quads.iter().all(|quad| {
            quad.normal == first.normal
                && (packed_normal::unpack(quad.normal).dot(quad.center) - distance).abs()
                    < PLANE_EPSILON
        });
        if coplanar {
            SortType::None
        } else {
            SortType::Dynamic
        }
    }

    /// Quad indices ordered farthest-first from `camera`.
    ///
    /// Equal distances keep arrival order.
    pub fn back_to_front(&self, camera: Vec3) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.quads.len()).collect();
        order.sort_by(|&a, &b| {
            let da = self.quads[a].center.distance_squared(camera);
            let db = self.quads[b].center.distance_squared(camera);
            db.total_cmp(&da)
        });
        order
    }
}

impl TranslucentGeometryCollector for TranslucentQuadCollector {
    fn append_quad(
        &mut self,
        packed_normal: u32,
        vertices: &[ChunkVertex; 4],
        facing: ModelQuadFacing,
    ) {
        let center = vertices
            .iter()
            .map(|vertex| Vec3::from_array(vertex.position))
            .sum::<Vec3>()
            / 4.0;
        self.quads.push(TranslucentQuad {
            center,
            normal: packed_normal,
            facing,
        });
    }
}
