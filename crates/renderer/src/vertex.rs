//! Vertex input layout for [`InterleavedVertex`] buffers.

use asset::InterleavedVertex;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// position @0, normal @12, uv @24; shader locations 0/1/2.
pub const VERTEX_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: InterleavedVertex::POSITION_OFFSET as BufferAddress,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: InterleavedVertex::NORMAL_OFFSET as BufferAddress,
        shader_location: 1,
    },
    VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: InterleavedVertex::UV_OFFSET as BufferAddress,
        shader_location: 2,
    },
];

pub const VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: InterleavedVertex::STRIDE as BufferAddress,
    step_mode: VertexStepMode::Vertex,
    attributes: &VERTEX_ATTRIBUTES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_interleaved_record() {
        assert_eq!(VERTEX_LAYOUT.array_stride, 32);
        let offsets: Vec<u64> = VERTEX_ATTRIBUTES.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let locations: Vec<u32> = VERTEX_ATTRIBUTES.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn attributes_are_packed_without_gaps() {
        let mut end = 0;
        for attr in VERTEX_ATTRIBUTES {
            assert_eq!(attr.offset, end);
            end = attr.offset + attr.format.size();
        }
        assert_eq!(end, VERTEX_LAYOUT.array_stride);
    }
}
