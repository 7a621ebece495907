//! Minimal OBJ parser supporting positions, normals and texture coordinates.
//!
//! Only triangle faces are accepted. Attribute presence is a mesh-level
//! property: either every face corner references a texture coordinate (or
//! normal) or none does.

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result};

use crate::error::{Attribute, MeshError};
use crate::mesh::{CornerIndex, MAX_VERTICES, ParsedMesh};

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<ParsedMesh> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    load_obj_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load OBJ file: {}", path.display()))
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(mut reader: R) -> Result<ParsedMesh> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .context("Failed to read OBJ source as UTF-8 text")?;
    Ok(parse_obj(&contents)?)
}

/// One face-corner index made 0-based; `raw` keeps the source value for diagnostics.
#[derive(Clone, Copy, Debug)]
struct Ref {
    resolved: i64,
    raw: i64,
}

#[derive(Clone, Copy, Debug)]
struct RawCorner {
    line: usize,
    position: Ref,
    uv: Option<Ref>,
    normal: Option<Ref>,
}

/// Parse OBJ text into a [`ParsedMesh`].
pub fn parse_obj(contents: &str) -> Result<ParsedMesh, MeshError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();
    let mut raw_corners: Vec<RawCorner> = Vec::new();
    let mut last_line = 0;

    // UTF-8 byte-order mark written by some Windows exporters.
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    for (line_idx, line) in contents.lines().enumerate() {
        let line_no = line_idx + 1;
        last_line = line_no;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = match parts.next() {
                    Some(token) => parse_f32(Some(token), line_no, "v coordinate")?,
                    None => 0.0,
                };
                texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                normals.push([nx, ny, nz]);
            }
            "f" => {
                let elements: Vec<&str> = parts.collect();
                if elements.len() != 3 {
                    return Err(MeshError::UnsupportedFaceTopology {
                        line: line_no,
                        corners: elements.len(),
                    });
                }
                for element in elements {
                    raw_corners.push(parse_face_corner(
                        element,
                        positions.len(),
                        texcoords.len(),
                        normals.len(),
                        line_no,
                    )?);
                }
            }
            other => {
                log::debug!("OBJ line {}: ignoring '{}' directive", line_no, other);
            }
        }
    }

    if positions.is_empty() {
        return Err(MeshError::malformed(last_line, "mesh declares no vertex positions"));
    }
    if raw_corners.is_empty() {
        return Err(MeshError::malformed(last_line, "mesh declares no faces"));
    }
    if raw_corners.len() > MAX_VERTICES {
        return Err(MeshError::VertexLimitExceeded {
            count: raw_corners.len(),
            max: MAX_VERTICES,
        });
    }

    let with_uv = consistent_presence(&raw_corners, |c| c.uv.is_some(), "texture coordinates")?;
    let with_normal = consistent_presence(&raw_corners, |c| c.normal.is_some(), "normals")?;

    let mut corners = Vec::with_capacity(raw_corners.len());
    for c in &raw_corners {
        let position = check_bounds(c.position, positions.len(), Attribute::Position, c.line)?;
        let uv = c
            .uv
            .map(|r| check_bounds(r, texcoords.len(), Attribute::TexCoord, c.line))
            .transpose()?;
        let normal = c
            .normal
            .map(|r| check_bounds(r, normals.len(), Attribute::Normal, c.line))
            .transpose()?;
        corners.push(CornerIndex {
            position,
            normal,
            uv,
        });
    }

    if !with_uv && !texcoords.is_empty() {
        log::debug!("OBJ: {} texture coordinates declared but never referenced", texcoords.len());
        texcoords.clear();
    }
    if !with_normal && !normals.is_empty() {
        log::debug!("OBJ: {} normals declared but never referenced", normals.len());
        normals.clear();
    }

    let mesh = ParsedMesh {
        positions,
        normals,
        uvs: texcoords,
        corners,
    };
    log::debug!(
        "Parsed OBJ: {} positions, {} normals, {} uvs, {} triangles",
        mesh.positions.len(),
        mesh.normals.len(),
        mesh.uvs.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32, MeshError> {
    let token = value.ok_or_else(|| MeshError::malformed(line_no, format!("missing {what}")))?;
    let value = token
        .parse::<f32>()
        .map_err(|_| MeshError::malformed(line_no, format!("invalid {what} '{token}'")))?;
    if !value.is_finite() {
        return Err(MeshError::malformed(line_no, format!("non-finite {what} '{token}'")));
    }
    Ok(value)
}

fn parse_face_corner(
    token: &str,
    pos_count: usize,
    tex_count: usize,
    norm_count: usize,
    line_no: usize,
) -> Result<RawCorner, MeshError> {
    let mut split = token.split('/');
    let position = match split.next() {
        Some(value) if !value.is_empty() => resolve_index(value, pos_count, line_no)?,
        _ => {
            return Err(MeshError::malformed(
                line_no,
                format!("face element '{token}' has no position index"),
            ));
        }
    };

    let uv = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, tex_count, line_no)?),
        _ => None,
    };

    let normal = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, norm_count, line_no)?),
        _ => None,
    };

    if split.next().is_some() {
        return Err(MeshError::malformed(
            line_no,
            format!("face element '{token}' has too many components"),
        ));
    }

    Ok(RawCorner {
        line: line_no,
        position,
        uv,
        normal,
    })
}

/// 1-based or negative (relative to the count seen so far) OBJ index to 0-based.
fn resolve_index(token: &str, len_so_far: usize, line_no: usize) -> Result<Ref, MeshError> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| MeshError::malformed(line_no, format!("invalid index '{token}'")))?;
    if raw == 0 {
        return Err(MeshError::malformed(line_no, "OBJ indices are 1-based; found 0"));
    }

    let resolved = if raw > 0 { raw - 1 } else { len_so_far as i64 + raw };
    Ok(Ref { resolved, raw })
}

fn check_bounds(r: Ref, len: usize, attribute: Attribute, line: usize) -> Result<u32, MeshError> {
    if r.resolved < 0 || r.resolved as usize >= len {
        return Err(MeshError::IndexOutOfRange {
            line,
            attribute,
            index: r.raw,
            len,
        });
    }
    Ok(r.resolved as u32)
}

fn consistent_presence(
    corners: &[RawCorner],
    has: impl Fn(&RawCorner) -> bool,
    what: &str,
) -> Result<bool, MeshError> {
    let first = has(&corners[0]);
    match corners.iter().find(|c| has(*c) != first) {
        Some(c) => Err(MeshError::malformed(
            c.line,
            format!("{what} are referenced by some face corners but not others"),
        )),
        None => Ok(first),
    }
}
