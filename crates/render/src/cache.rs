use std::num::NonZeroUsize;

use bitflags::bitflags;
use fluidmesh_core::{BlockPos, Direction, AXIS_DIRECTIONS};
use fluidmesh_world::{
    block_occludes, fluid_side_occluded, Aabb, BlockState, FluidRules, FluidState, LevelView,
    VoxelShape,
};
use lru::LruCache;
use tracing::trace;

/// Fraction of a cell a source block fills; the floor test uses it.
const SOURCE_SURFACE_HEIGHT: f32 = 0.888_888_9;

bitflags! {
    /// Faces of a fluid cell that are hidden.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CullMask: u8 {
        /// Top face.
        const UP = 1;
        /// Bottom face.
        const DOWN = 2;
        /// -Z face.
        const NORTH = 4;
        /// +Z face.
        const SOUTH = 8;
        /// -X face.
        const WEST = 16;
        /// +X face.
        const EAST = 32;
    }
}

impl CullMask {
    /// Bit for one face.
    pub const fn from_direction(dir: Direction) -> Self {
        match dir {
            Direction::Up => CullMask::UP,
            Direction::Down => CullMask::DOWN,
            Direction::North => CullMask::NORTH,
            Direction::South => CullMask::SOUTH,
            Direction::West => CullMask::WEST,
            Direction::East => CullMask::EAST,
        }
    }

    /// True when the face pointing along `dir` is hidden.
    pub fn is_culled(self, dir: Direction) -> bool {
        self.contains(Self::from_direction(dir))
    }

    /// True when all six faces are hidden.
    pub fn is_totally_occluded(self) -> bool {
        self.is_all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct OcclusionKey {
    state: BlockState,
    adjacent: BlockState,
    dir: Direction,
    fluid: FluidState,
}

/// Bounded memo of full-block face tests.
///
/// The answer depends only on the key, so entries never go stale; the LRU
/// bound keeps a long-lived worker from growing without limit.
pub struct BlockOcclusionCache {
    entries: LruCache<OcclusionKey, bool>,
    hits: u64,
    misses: u64,
}

impl BlockOcclusionCache {
    /// Cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            hits: 0,
            misses: 0,
        }
    }

    /// Whether the `dir` face of a fluid filling `block_state` at `pos`,
    /// treated as a full cube, must be drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn should_draw_full_block_fluid_side(
        &mut self,
        rules: &dyn FluidRules,
        level: &dyn LevelView,
        pos: BlockPos,
        block_state: BlockState,
        dir: Direction,
        fluid: FluidState,
    ) -> bool {
        let adjacent = level.block_state(pos.offset(dir));
        if rules.should_occlude_fluid(dir.opposite(), adjacent, fluid) {
            return false;
        }

        let key = OcclusionKey {
            state: block_state,
            adjacent,
            dir,
            fluid,
        };
        if let Some(&draw) = self.entries.get(&key) {
            self.hits += 1;
            return draw;
        }
        self.misses += 1;
        let draw = !fluid_side_occluded(level.registry(), block_state, adjacent, dir, fluid);
        if let Some((evicted, _)) = self.entries.push(key, draw) {
            if evicted != key {
                trace!(dir = ?evicted.dir, "occlusion cache evicted entry");
            }
        }
        draw
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to compute the answer.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl std::fmt::Debug for BlockOcclusionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockOcclusionCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

/// Whether a fluid surface at `height` on the `dir` side of `pos` can be
/// seen past the neighbor in that direction.
pub fn is_side_exposed(level: &dyn LevelView, pos: BlockPos, dir: Direction, height: f32) -> bool {
    let neighbor = level.descriptor(level.block_state(pos.offset(dir)));
    if !neighbor.can_occlude || neighbor.shape.is_empty() {
        return true;
    }
    let threshold = VoxelShape::from_box(Aabb::column(height));
    !block_occludes(&threshold, &neighbor.shape, dir)
}

/// Decide which faces of the fluid at `pos` are hidden.
pub fn compute_cull_mask(
    cache: &mut BlockOcclusionCache,
    rules: &dyn FluidRules,
    level: &dyn LevelView,
    pos: BlockPos,
    block_state: BlockState,
    fluid: FluidState,
) -> CullMask {
    let mut mask = CullMask::empty();
    for dir in AXIS_DIRECTIONS {
        let mut culled =
            !cache.should_draw_full_block_fluid_side(rules, level, pos, block_state, dir, fluid);
        culled |= match dir {
            Direction::Up => false,
            Direction::Down => !is_side_exposed(level, pos, dir, SOURCE_SURFACE_HEIGHT),
            _ => !is_side_exposed(level, pos, dir, 1.0),
        };
        if culled {
            mask |= CullMask::from_direction(dir);
        }
    }
    mask
}
