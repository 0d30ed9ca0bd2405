//! Occlusion shapes and face-coverage tests.
//!
//! Shapes are unions of axis-aligned boxes in block-local space (0..1 on
//! every axis). Occlusion between two neighbors only cares about the slice
//! of each shape lying on the shared face, so every test here reduces to
//! rectangle coverage on the unit square.

use fluidmesh_core::{Axis, Direction};
use serde::{Deserialize, Serialize};

const FACE_EPSILON: f32 = 1.0e-6;

/// Axis-aligned box in block-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Aabb {
    /// The unit cube.
    pub const UNIT: Self = Self::new([0.0; 3], [1.0; 3]);

    /// Construct a box from two corners.
    pub const fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Box spanning the full footprint from the floor up to `height`.
    pub const fn column(height: f32) -> Self {
        Self::new([0.0, 0.0, 0.0], [1.0, height, 1.0])
    }

    /// True when the box has no volume.
    pub fn is_degenerate(&self) -> bool {
        (0..3).any(|i| self.max[i] - self.min[i] <= FACE_EPSILON)
    }

    fn covers_unit(&self) -> bool {
        (0..3).all(|i| self.min[i] <= FACE_EPSILON && self.max[i] >= 1.0 - FACE_EPSILON)
    }

    /// Rectangle `[u0, v0, u1, v1]` this box leaves on the `dir` face, if it
    /// touches that face at all.
    fn face_rect(&self, dir: Direction) -> Option<[f32; 4]> {
        if self.is_degenerate() {
            return None;
        }
        let axis = dir.axis().index();
        let touches = if dir.is_positive() {
            self.max[axis] >= 1.0 - FACE_EPSILON
        } else {
            self.min[axis] <= FACE_EPSILON
        };
        if !touches {
            return None;
        }
        let (u, v) = face_axes(dir.axis());
        Some([
            self.min[u].max(0.0),
            self.min[v].max(0.0),
            self.max[u].min(1.0),
            self.max[v].min(1.0),
        ])
    }
}

fn face_axes(axis: Axis) -> (usize, usize) {
    match axis {
        Axis::X => (1, 2),
        Axis::Y => (0, 2),
        Axis::Z => (0, 1),
    }
}

/// Union of boxes describing what a block visually occludes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoxelShape {
    boxes: Vec<Aabb>,
}

impl VoxelShape {
    /// Shape occluding nothing.
    pub fn empty() -> Self {
        Self { boxes: Vec::new() }
    }

    /// Full unit cube.
    pub fn block() -> Self {
        Self {
            boxes: vec![Aabb::UNIT],
        }
    }

    /// Single box shape.
    pub fn from_box(aabb: Aabb) -> Self {
        Self::from_boxes(vec![aabb])
    }

    /// Union of boxes. Degenerate boxes are dropped.
    pub fn from_boxes(boxes: Vec<Aabb>) -> Self {
        Self {
            boxes: boxes.into_iter().filter(|b| !b.is_degenerate()).collect(),
        }
    }

    /// Bottom half slab.
    pub fn bottom_slab() -> Self {
        Self::from_box(Aabb::column(0.5))
    }

    /// Top half slab.
    pub fn top_slab() -> Self {
        Self::from_box(Aabb::new([0.0, 0.5, 0.0], [1.0, 1.0, 1.0]))
    }

    /// True when the shape has no volume.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// True when some box fills the whole unit cube.
    pub fn is_full_block(&self) -> bool {
        self.boxes.iter().any(Aabb::covers_unit)
    }

    /// Boxes making up this shape.
    pub fn boxes(&self) -> &[Aabb] {
        &self.boxes
    }

    /// Face-plane rectangles on the `dir` side.
    pub fn face_rects(&self, dir: Direction) -> impl Iterator<Item = [f32; 4]> + '_ {
        self.boxes.iter().filter_map(move |b| b.face_rect(dir))
    }

    /// True when this shape alone seals the `dir` face.
    pub fn covers_face(&self, dir: Direction) -> bool {
        let rects: Vec<_> = self.face_rects(dir).collect();
        covers_unit_square(&rects)
    }
}

/// Whether the neighbor `adjacent` in direction `side` hides the `side` face
/// of `shape`.
///
/// Only the slice of `shape` on its `side` face and the slice of `adjacent`
/// on the opposite face take part. A shape that does not reach the face has
/// nothing there to hide.
pub fn block_occludes(shape: &VoxelShape, adjacent: &VoxelShape, side: Direction) -> bool {
    if shape.is_full_block() && adjacent.is_full_block() {
        return true;
    }
    if adjacent.is_empty() {
        return false;
    }
    let own: Vec<_> = shape.face_rects(side).collect();
    if own.is_empty() {
        return false;
    }
    let theirs: Vec<_> = adjacent.face_rects(side.opposite()).collect();
    rects_cover(&own, &theirs)
}

/// Whether the `side` face of `shape` and the opposite face of `adjacent`
/// together seal the whole shared face.
pub fn faces_seal(shape: &VoxelShape, adjacent: &VoxelShape, side: Direction) -> bool {
    if shape.is_full_block() && adjacent.is_full_block() {
        return true;
    }
    let rects: Vec<_> = shape
        .face_rects(side)
        .chain(adjacent.face_rects(side.opposite()))
        .collect();
    covers_unit_square(&rects)
}

/// Whether the union of `[u0, v0, u1, v1]` rectangles covers `[0,1]²`.
pub fn covers_unit_square(rects: &[[f32; 4]]) -> bool {
    rects_cover(&[[0.0, 0.0, 1.0, 1.0]], rects)
}

/// Whether every point of the `target` rectangles lies in some `cover`
/// rectangle.
///
/// Splits the square along every rectangle edge and checks the center of
/// each resulting cell.
fn rects_cover(target: &[[f32; 4]], cover: &[[f32; 4]]) -> bool {
    if cover.is_empty() {
        return target.is_empty();
    }
    let mut us = vec![0.0f32, 1.0];
    let mut vs = vec![0.0f32, 1.0];
    let interior = |value: f32| value > 0.0 && value < 1.0;
    for r in target.iter().chain(cover) {
        us.extend([r[0], r[2]].into_iter().filter(|&u| interior(u)));
        vs.extend([r[1], r[3]].into_iter().filter(|&v| interior(v)));
    }
    for edges in [&mut us, &mut vs] {
        edges.sort_by(f32::total_cmp);
        edges.dedup_by(|a, b| (*a - *b).abs() <= FACE_EPSILON);
    }

    let inside = |r: &[f32; 4], mu: f32, mv: f32| r[0] <= mu && mu <= r[2] && r[1] <= mv && mv <= r[3];
    us.windows(2).all(|u| {
        let mu = (u[0] + u[1]) * 0.5;
        vs.windows(2).all(|v| {
            let mv = (v[0] + v[1]) * 0.5;
            !target.iter().any(|r| inside(r, mu, mv)) || cover.iter().any(|r| inside(r, mu, mv))
        })
    })
}
