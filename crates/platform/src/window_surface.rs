//! Presentable surface over a winit window.

use std::sync::Arc;

use anyhow::{Context, Result};
use renderer::{GpuContext, RenderResult, SurfaceFrame, SurfaceProvider, preferred_format};
use wgpu::{
    CompositeAlphaMode, Device, PresentMode, Surface, SurfaceConfiguration, SurfaceError,
    TextureFormat, TextureUsages,
};
use winit::window::Window;

pub struct WindowSurface {
    surface: Surface<'static>,
    device: Device,
    config: SurfaceConfiguration,
    formats: Vec<TextureFormat>,
}

/// Surface went stale (resize race, display change); a reconfigure fixes it.
pub fn is_surface_lost(err: &SurfaceError) -> bool {
    matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
}

impl WindowSurface {
    /// Create the raw surface for `window`. Configure it with [`Self::configure`]
    /// once a compatible device exists.
    pub fn create(instance: &wgpu::Instance, window: Arc<Window>) -> Result<Surface<'static>> {
        instance
            .create_surface(window)
            .context("failed to create window surface")
    }

    /// Pick a format (sRGB preferred) and configure the surface at the
    /// window's physical size.
    pub fn configure(surface: Surface<'static>, gpu: &GpuContext, width: u32, height: u32) -> Result<Self> {
        let caps = surface.get_capabilities(&gpu.adapter);
        let format = preferred_format(&caps.formats)
            .context("surface reports no supported formats for this adapter")?;
        let alpha_mode = if caps.alpha_modes.contains(&CompositeAlphaMode::Opaque) {
            CompositeAlphaMode::Opaque
        } else {
            caps.alpha_modes.first().copied().unwrap_or(CompositeAlphaMode::Auto)
        };

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);
        log::info!(
            "Surface configured: {:?} {}x{} ({:?})",
            format,
            config.width,
            config.height,
            alpha_mode
        );

        Ok(Self {
            surface,
            device: gpu.device.clone(),
            config,
            formats: caps.formats,
        })
    }

    /// Reconfigure for a new physical size. Zero sizes (minimized) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        log::debug!("Surface reconfigured to {width}x{height}");
        true
    }
}

impl SurfaceProvider for WindowSurface {
    fn supported_formats(&self) -> &[TextureFormat] {
        &self.formats
    }

    fn format(&self) -> TextureFormat {
        self.config.format
    }

    fn physical_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// A lost or outdated surface is reconfigured at its current size and
    /// acquired once more. Any other error, or a second failure, is returned
    /// and stops the frame loop.
    fn acquire(&mut self) -> RenderResult<SurfaceFrame> {
        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) if is_surface_lost(&err) => {
                log::warn!("Surface {err}, reconfiguring at {}x{}", self.config.width, self.config.height);
                self.surface.configure(&self.device, &self.config);
                self.surface.get_current_texture()?
            }
            Err(err) => return Err(err.into()),
        };
        Ok(SurfaceFrame::from_surface_texture(texture))
    }
}
