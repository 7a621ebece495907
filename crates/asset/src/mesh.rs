//! CPU-side mesh representation used by loaders.

use bytemuck::{Pod, Zeroable};

/// Highest vertex count a `u16` index buffer can address.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

/// One triangle corner: 0-based references into the attribute streams of a
/// [`ParsedMesh`]. `normal`/`uv` are `None` when the mesh carries no such stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct CornerIndex {
    pub position: u32,
    pub normal: Option<u32>,
    pub uv: Option<u32>,
}

impl CornerIndex {
    /// Corner referencing only a position.
    pub fn position_only(position: u32) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Attribute streams plus triangle corners, as read from the source file.
/// `corners.len()` is a multiple of 3; consecutive triples form triangles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub corners: Vec<CornerIndex>,
}

impl ParsedMesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.corners.len() / 3
    }

    /// Mesh-level flag: texture coordinates present for the whole mesh.
    #[inline]
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Mesh-level flag: normals present for the whole mesh.
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }
}

/// Vertex with position/normal/uv in object space. Fixed 32-byte record.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct InterleavedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl InterleavedVertex {
    pub const STRIDE: usize = std::mem::size_of::<InterleavedVertex>();
    pub const POSITION_OFFSET: usize = std::mem::offset_of!(InterleavedVertex, position);
    pub const NORMAL_OFFSET: usize = std::mem::offset_of!(InterleavedVertex, normal);
    pub const UV_OFFSET: usize = std::mem::offset_of!(InterleavedVertex, uv);
    /// Floats per vertex.
    pub const COMPONENTS: usize = 8;

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

// Pipeline vertex layout is declared against these numbers.
const _: () = {
    assert!(InterleavedVertex::STRIDE == 32);
    assert!(InterleavedVertex::POSITION_OFFSET == 0);
    assert!(InterleavedVertex::NORMAL_OFFSET == 12);
    assert!(InterleavedVertex::UV_OFFSET == 24);
};

/// Interleaved vertex buffer plus 16-bit index buffer, ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<InterleavedVertex>,
    pub indices: Vec<u16>,
}

impl MeshBuffers {
    pub fn new(vertices: Vec<InterleavedVertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[inline]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Flat `f32` view of the vertex buffer (8 floats per vertex).
    #[inline]
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Axis-aligned bounds of all positions, `None` for an empty buffer.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(mut lo, mut hi), v| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(v.position[axis]);
                hi[axis] = hi[axis].max(v.position[axis]);
            }
            (lo, hi)
        }))
    }
}
