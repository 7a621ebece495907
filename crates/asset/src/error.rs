use std::fmt;

use thiserror::Error;

/// Attribute stream a face corner indexes into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Attribute {
    Position,
    Normal,
    TexCoord,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Position => "position",
            Attribute::Normal => "normal",
            Attribute::TexCoord => "texture coordinate",
        })
    }
}

/// Mesh parsing / interleaving failures. Raised before any GPU resource exists.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("Malformed mesh data on line {line}: {reason}")]
    MalformedMeshData { line: usize, reason: String },

    #[error("Unsupported face topology on line {line}: {corners} corners, only triangles are accepted")]
    UnsupportedFaceTopology { line: usize, corners: usize },

    /// `index` is as written in the source (1-based for OBJ, 0-based when
    /// raised by the interleaver). `line` is 0 when no source line applies.
    #[error("{attribute} index {index} out of range (len={len}) on line {line}")]
    IndexOutOfRange {
        line: usize,
        attribute: Attribute,
        index: i64,
        len: usize,
    },

    #[error("Mesh needs {count} vertices, 16-bit index buffers address at most {max}")]
    VertexLimitExceeded { count: usize, max: usize },
}

impl MeshError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedMeshData {
            line,
            reason: reason.into(),
        }
    }
}
