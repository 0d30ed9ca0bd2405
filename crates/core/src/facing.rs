use serde::{Deserialize, Serialize};

use crate::{packed_normal, Direction};

/// Number of facing buckets, including [`ModelQuadFacing::Unassigned`].
pub const FACING_COUNT: usize = 7;

/// Which way a quad faces, used to bucket geometry for backface culling
/// and translucency sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelQuadFacing {
    /// Faces +X.
    PosX,
    /// Faces +Y.
    PosY,
    /// Faces +Z.
    PosZ,
    /// Faces -X.
    NegX,
    /// Faces -Y.
    NegY,
    /// Faces -Z.
    NegZ,
    /// Not aligned with any axis.
    Unassigned,
}

impl ModelQuadFacing {
    /// All buckets in index order.
    pub const ALL: [ModelQuadFacing; FACING_COUNT] = [
        ModelQuadFacing::PosX,
        ModelQuadFacing::PosY,
        ModelQuadFacing::PosZ,
        ModelQuadFacing::NegX,
        ModelQuadFacing::NegY,
        ModelQuadFacing::NegZ,
        ModelQuadFacing::Unassigned,
    ];

    /// Facing of a face pointing along `dir`.
    pub const fn from_direction(dir: Direction) -> Self {
        match dir {
            Direction::Down => ModelQuadFacing::NegY,
            Direction::Up => ModelQuadFacing::PosY,
            Direction::North => ModelQuadFacing::NegZ,
            Direction::South => ModelQuadFacing::PosZ,
            Direction::West => ModelQuadFacing::NegX,
            Direction::East => ModelQuadFacing::PosX,
        }
    }

    /// Facing pointing the other way. Unassigned stays unassigned.
    pub const fn opposite(self) -> Self {
        match self {
            ModelQuadFacing::PosX => ModelQuadFacing::NegX,
            ModelQuadFacing::PosY => ModelQuadFacing::NegY,
            ModelQuadFacing::PosZ => ModelQuadFacing::NegZ,
            ModelQuadFacing::NegX => ModelQuadFacing::PosX,
            ModelQuadFacing::NegY => ModelQuadFacing::PosY,
            ModelQuadFacing::NegZ => ModelQuadFacing::PosZ,
            ModelQuadFacing::Unassigned => ModelQuadFacing::Unassigned,
        }
    }

    /// True for the six axis-aligned buckets.
    pub const fn is_aligned(self) -> bool {
        !matches!(self, ModelQuadFacing::Unassigned)
    }

    /// Bucket index in [`ModelQuadFacing::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Precomputed packed normal for aligned facings.
    ///
    /// Returns `None` for [`ModelQuadFacing::Unassigned`], whose normal has
    /// to be derived from the quad geometry.
    pub fn packed_aligned_normal(self) -> Option<u32> {
        let [x, y, z] = match self {
            ModelQuadFacing::PosX => [1.0, 0.0, 0.0],
            ModelQuadFacing::PosY => [0.0, 1.0, 0.0],
            ModelQuadFacing::PosZ => [0.0, 0.0, 1.0],
            ModelQuadFacing::NegX => [-1.0, 0.0, 0.0],
            ModelQuadFacing::NegY => [0.0, -1.0, 0.0],
            ModelQuadFacing::NegZ => [0.0, 0.0, -1.0],
            ModelQuadFacing::Unassigned => return None,
        };
        Some(packed_normal::pack(x, y, z))
    }
}
