//! Mutable model quad reused for every face a fluid cell emits.

use bitflags::bitflags;
use fluidmesh_core::{packed_normal, Direction};
use glam::Vec3;

use crate::Sprite;

bitflags! {
    /// Geometric hints consumed by the light pipelines.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct QuadFlags: u8 {
        /// Quad does not span the whole face of the cell.
        const IS_PARTIAL = 0b001;
        /// Quad lies in a plane parallel to a cell face.
        const IS_PARALLEL = 0b010;
        /// Quad lies exactly on a cell face.
        const IS_ALIGNED = 0b100;
    }
}

/// Four textured vertices plus the metadata lighting and sorting need.
///
/// Built in place with setters and reused between faces, so every field is
/// overwritten before each emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelQuad {
    positions: [Vec3; 4],
    uvs: [[f32; 2]; 4],
    sprite: Option<Sprite>,
    flags: QuadFlags,
    light_face: Direction,
    face_normal: u32,
}

impl Default for ModelQuad {
    fn default() -> Self {
        Self {
            positions: [Vec3::ZERO; 4],
            uvs: [[0.0; 2]; 4],
            sprite: None,
            flags: QuadFlags::empty(),
            light_face: Direction::Up,
            face_normal: 0,
        }
    }
}

impl ModelQuad {
    /// Set the position of vertex `i`, relative to the cell origin.
    pub fn set_pos(&mut self, i: usize, x: f32, y: f32, z: f32) {
        self.positions[i] = Vec3::new(x, y, z);
    }

    /// Set the atlas UV of vertex `i`.
    pub fn set_uv(&mut self, i: usize, u: f32, v: f32) {
        self.uvs[i] = [u, v];
    }

    /// Set vertex `i` in one call.
    pub fn set_vertex(&mut self, i: usize, x: f32, y: f32, z: f32, u: f32, v: f32) {
        self.set_pos(i, x, y, z);
        self.set_uv(i, u, v);
    }

    /// Set the sprite the UVs refer to.
    pub fn set_sprite(&mut self, sprite: Sprite) {
        self.sprite = Some(sprite);
    }

    /// Set the geometric flags.
    pub fn set_flags(&mut self, flags: QuadFlags) {
        self.flags = flags;
    }

    /// Set the face used for light sampling.
    pub fn set_light_face(&mut self, face: Direction) {
        self.light_face = face;
    }

    /// Set the packed face normal.
    pub fn set_face_normal(&mut self, normal: u32) {
        self.face_normal = normal;
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: usize) -> Vec3 {
        self.positions[i]
    }

    /// X of vertex `i`.
    pub fn x(&self, i: usize) -> f32 {
        self.positions[i].x
    }

    /// Y of vertex `i`.
    pub fn y(&self, i: usize) -> f32 {
        self.positions[i].y
    }

    /// Z of vertex `i`.
    pub fn z(&self, i: usize) -> f32 {
        self.positions[i].z
    }

    /// UV of vertex `i`.
    pub fn uv(&self, i: usize) -> [f32; 2] {
        self.uvs[i]
    }

    /// Sprite, if one was set.
    pub fn sprite(&self) -> Option<Sprite> {
        self.sprite
    }

    /// Geometric flags.
    pub fn flags(&self) -> QuadFlags {
        self.flags
    }

    /// Face used for light sampling.
    pub fn light_face(&self) -> Direction {
        self.light_face
    }

    /// Packed face normal.
    pub fn face_normal(&self) -> u32 {
        self.face_normal
    }

    /// Normal from the cross product of the diagonals, packed.
    ///
    /// Degenerate quads yield the zero normal.
    pub fn calculate_normal(&self) -> u32 {
        let d0 = self.positions[2] - self.positions[0];
        let d1 = self.positions[3] - self.positions[1];
        packed_normal::pack_vec(d0.cross(d1).normalize_or_zero())
    }
}
