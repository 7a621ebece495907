//! Packs a [`ParsedMesh`] into one interleaved vertex buffer and one 16-bit
//! index buffer. One vertex per triangle corner, no deduplication.

use crate::error::{Attribute, MeshError};
use crate::mesh::{InterleavedVertex, MAX_VERTICES, MeshBuffers, ParsedMesh};

/// Interleave `mesh` into position/normal/uv records.
///
/// UVs are `(0, 0)` for meshes without texture coordinates. Meshes without
/// normals get the flat normal of each triangle.
pub fn interleave(mesh: &ParsedMesh) -> Result<MeshBuffers, MeshError> {
    let count = mesh.corners.len();
    if count % 3 != 0 {
        return Err(MeshError::malformed(
            0,
            format!("{count} face corners do not form whole triangles"),
        ));
    }
    if count > MAX_VERTICES {
        return Err(MeshError::VertexLimitExceeded {
            count,
            max: MAX_VERTICES,
        });
    }

    let with_uv = mesh.has_uvs();
    let with_normal = mesh.has_normals();

    let mut vertices = Vec::with_capacity(count);
    for triangle in mesh.corners.chunks_exact(3) {
        let positions = [
            fetch(&mesh.positions, Some(triangle[0].position), Attribute::Position)?,
            fetch(&mesh.positions, Some(triangle[1].position), Attribute::Position)?,
            fetch(&mesh.positions, Some(triangle[2].position), Attribute::Position)?,
        ];
        let flat = if with_normal {
            None
        } else {
            Some(face_normal(&positions))
        };

        for (corner, position) in triangle.iter().zip(positions) {
            let normal = match flat {
                Some(n) => n,
                None => fetch(&mesh.normals, corner.normal, Attribute::Normal)?,
            };
            let uv = if with_uv {
                fetch(&mesh.uvs, corner.uv, Attribute::TexCoord)?
            } else {
                [0.0, 0.0]
            };
            vertices.push(InterleavedVertex::new(position, normal, uv));
        }
    }

    // count <= MAX_VERTICES, so every index fits in u16.
    let indices: Vec<u16> = (0..count).map(|i| i as u16).collect();

    log::debug!(
        "Interleaved {} vertices ({} bytes), {} indices",
        vertices.len(),
        vertices.len() * InterleavedVertex::STRIDE,
        indices.len()
    );
    Ok(MeshBuffers::new(vertices, indices))
}

fn fetch<const N: usize>(
    stream: &[[f32; N]],
    index: Option<u32>,
    attribute: Attribute,
) -> Result<[f32; N], MeshError> {
    let Some(index) = index else {
        return Err(MeshError::malformed(
            0,
            format!("face corner is missing its {attribute} index"),
        ));
    };
    stream
        .get(index as usize)
        .copied()
        .ok_or(MeshError::IndexOutOfRange {
            line: 0,
            attribute,
            index: i64::from(index),
            len: stream.len(),
        })
}

fn face_normal([a, b, c]: &[[f32; 3]; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len <= f32::EPSILON {
        return [0.0, 0.0, 1.0];
    }
    [n[0] / len, n[1] / len, n[2] / len]
}
