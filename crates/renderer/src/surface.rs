//! Output surface seam: anything that can hand out a color target each frame.

use wgpu::{SurfaceTexture, TextureFormat, TextureView};

use crate::error::{RenderError, RenderResult};

/// Color target for one frame. Presenting is a no-op for offscreen targets.
pub struct SurfaceFrame {
    view: TextureView,
    presentable: Option<SurfaceTexture>,
}

impl SurfaceFrame {
    pub fn offscreen(view: TextureView) -> Self {
        Self {
            view,
            presentable: None,
        }
    }

    pub fn from_surface_texture(texture: SurfaceTexture) -> Self {
        let view = texture.texture.create_view(&Default::default());
        Self {
            view,
            presentable: Some(texture),
        }
    }

    #[inline]
    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn present(self) {
        if let Some(texture) = self.presentable {
            texture.present();
        }
    }
}

/// Drawing surface the renderer targets.
///
/// Sizes are physical pixels (already scaled by the display's scale factor).
pub trait SurfaceProvider {
    /// Formats the surface can be configured with.
    fn supported_formats(&self) -> &[TextureFormat];

    /// Format the surface is currently configured with.
    fn format(&self) -> TextureFormat;

    fn physical_size(&self) -> (u32, u32);

    /// Current backbuffer for this frame.
    fn acquire(&mut self) -> RenderResult<SurfaceFrame>;
}

/// Prefer an sRGB format, otherwise the first one the surface reports.
pub fn preferred_format(supported: &[TextureFormat]) -> Option<TextureFormat> {
    supported
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .or_else(|| supported.first().copied())
}

pub fn check_surface_format(requested: TextureFormat, supported: &[TextureFormat]) -> RenderResult<()> {
    if supported.contains(&requested) {
        Ok(())
    } else {
        Err(RenderError::UnsupportedSurfaceFormat {
            requested,
            supported: supported.to_vec(),
        })
    }
}
