//! Texture-backed render target for runs without a window.

use wgpu::{Device, Extent3d, Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages};

use crate::error::RenderResult;
use crate::surface::{SurfaceFrame, SurfaceProvider};

pub struct OffscreenTarget {
    texture: Texture,
    formats: [TextureFormat; 1],
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new(device: &Device, format: TextureFormat, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("OffscreenColor"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        log::debug!("Offscreen target {}x{} {:?}", width, height, format);
        Self {
            texture,
            formats: [format],
            width,
            height,
        }
    }
}

impl SurfaceProvider for OffscreenTarget {
    fn supported_formats(&self) -> &[TextureFormat] {
        &self.formats
    }

    fn format(&self) -> TextureFormat {
        self.formats[0]
    }

    fn physical_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn acquire(&mut self) -> RenderResult<SurfaceFrame> {
        Ok(SurfaceFrame::offscreen(
            self.texture.create_view(&Default::default()),
        ))
    }
}
