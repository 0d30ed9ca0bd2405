use std::collections::BTreeSet;

use blake3::Hasher;
use fluidmesh_core::{ModelQuadFacing, FACING_COUNT};

use crate::{Material, Sprite, SpriteId, TerrainPass};

/// Hash of the combined vertex buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    /// Lowercase hex rendering for logs and metrics.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

/// Packed vertex layout produced by the mesher.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkVertex {
    /// Position relative to the section origin.
    pub position: [f32; 3],
    /// Tint, packed ABGR.
    pub color: u32,
    /// Shade and ambient occlusion multiplier.
    pub ao: f32,
    /// Atlas texture coordinates.
    pub uv: [f32; 2],
    /// Packed lightmap coordinate.
    pub light: u32,
}

/// Receiver of finished quads.
pub trait ChunkModelBuilder {
    /// Record that `sprite` is sampled by this mesh.
    fn add_sprite(&mut self, sprite: &Sprite);

    /// Append one quad to the bucket for `facing` in the pass of `material`.
    fn push_vertices(
        &mut self,
        facing: ModelQuadFacing,
        vertices: &[ChunkVertex; 4],
        material: Material,
    );
}

/// Vertex buckets per render pass and facing.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMeshBuffers {
    buckets: Vec<Vec<ChunkVertex>>,
    sprites: BTreeSet<SpriteId>,
}

impl Default for ChunkMeshBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkMeshBuffers {
    /// Empty buffers.
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); TerrainPass::ALL.len() * FACING_COUNT],
            sprites: BTreeSet::new(),
        }
    }

    fn bucket_index(pass: TerrainPass, facing: ModelQuadFacing) -> usize {
        pass.index() * FACING_COUNT + facing.index()
    }

    /// Vertices for one pass and facing, four per quad.
    pub fn vertices(&self, pass: TerrainPass, facing: ModelQuadFacing) -> &[ChunkVertex] {
        &self.buckets[Self::bucket_index(pass, facing)]
    }

    /// Quad count of one pass across all facings.
    pub fn pass_quad_count(&self, pass: TerrainPass) -> usize {
        ModelQuadFacing::ALL
            .iter()
            .map(|&facing| self.vertices(pass, facing).len() / 4)
            .sum()
    }

    /// Total quads in every bucket.
    pub fn quad_count(&self) -> usize {
        self.vertex_count() / 4
    }

    /// Total vertices in every bucket.
    pub fn vertex_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// True when nothing was pushed.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Sprites referenced by the mesh, sorted.
    pub fn sprites(&self) -> impl Iterator<Item = SpriteId> + '_ {
        self.sprites.iter().copied()
    }

    /// Drop all geometry, keeping allocations.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Vec::clear);
        self.sprites.clear();
    }

    /// Move the contents of `other` onto the end of these buffers.
    pub fn append(&mut self, other: &mut ChunkMeshBuffers) {
        for (dst, src) in self.buckets.iter_mut().zip(other.buckets.iter_mut()) {
            dst.append(src);
        }
        self.sprites.append(&mut other.sprites);
    }

    /// Hash over every bucket in pass and facing order.
    pub fn hash(&self) -> MeshHash {
        let mut hasher = Hasher::new();
        for bucket in &self.buckets {
            hasher.update(&(bucket.len() as u64).to_le_bytes());
            hasher.update(bytemuck::cast_slice(bucket));
        }
        MeshHash(*hasher.finalize().as_bytes())
    }
}

impl ChunkModelBuilder for ChunkMeshBuffers {
    fn add_sprite(&mut self, sprite: &Sprite) {
        self.sprites.insert(sprite.id);
    }

    fn push_vertices(
        &mut self,
        facing: ModelQuadFacing,
        vertices: &[ChunkVertex; 4],
        material: Material,
    ) {
        self.buckets[Self::bucket_index(material.pass, facing)].extend_from_slice(vertices);
    }
}
