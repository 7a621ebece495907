//! Asset parsers and CPU-side mesh data.
//! OBJ text -> [`ParsedMesh`] -> interleaved vertex/index buffers ready for upload.

pub mod error;
pub mod interleave;
pub mod mesh;
pub mod obj;

pub use error::{Attribute, MeshError};
pub use interleave::interleave;
pub use mesh::{CornerIndex, InterleavedVertex, MAX_VERTICES, MeshBuffers, ParsedMesh};
pub use obj::{load_obj_from_path, load_obj_from_reader, parse_obj};

/// Cube used when no mesh path is given: 8 positions, 6 normals, 12 triangles, no UVs.
pub const CUBE_OBJ: &str = include_str!("../assets/cube.obj");
