use serde::{Deserialize, Serialize};

use crate::Direction;

/// Integer world-space coordinate of a voxel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockPos {
    /// X coordinate (east is positive).
    pub x: i32,
    /// Y coordinate (up is positive).
    pub y: i32,
    /// Z coordinate (south is positive).
    pub z: i32,
}

impl BlockPos {
    /// The world origin.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Construct a position from its components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Neighbor one step in `dir`.
    pub fn offset(self, dir: Direction) -> Self {
        let [dx, dy, dz] = dir.step();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Position translated by an arbitrary delta.
    pub fn add(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Neighbor directly above.
    pub fn above(self) -> Self {
        self.offset(Direction::Up)
    }

    /// Neighbor directly below.
    pub fn below(self) -> Self {
        self.offset(Direction::Down)
    }

    /// Components as an array, handy for vertex math.
    pub fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}
