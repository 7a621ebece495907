use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Camera UBO: one column-major clip-from-model matrix (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MvpUniform {
    pub mvp: [[f32; 4]; 4],
}

/// Exact size of the uniform buffer and of every per-frame write.
pub const MVP_UNIFORM_SIZE: u64 = std::mem::size_of::<MvpUniform>() as u64;

const _: () = assert!(MVP_UNIFORM_SIZE == 64);

impl MvpUniform {
    pub fn new(mvp: Mat4) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
        }
    }

    pub fn identity() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

/// One uniform buffer update: bytes and the offset they land at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformWrite {
    pub offset: u64,
    pub bytes: [u8; MVP_UNIFORM_SIZE as usize],
}

impl UniformWrite {
    pub fn mvp(mvp: Mat4) -> Self {
        Self {
            offset: 0,
            bytes: bytemuck::cast(MvpUniform::new(mvp)),
        }
    }

    /// Decode the matrix back out of the bytes.
    pub fn matrix(&self) -> Mat4 {
        let uniform: MvpUniform = bytemuck::cast(self.bytes);
        Mat4::from_cols_array_2d(&uniform.mvp)
    }
}
