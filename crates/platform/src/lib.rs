//! Platform layer: window, event loop, surface, and the headless runner.
//!
//! Startup order: window -> instance -> surface -> adapter/device -> format
//! selection -> surface configuration -> pipeline build -> first redraw.
//! The mesh is loaded and the camera checked before any of that, so a bad OBJ
//! file or camera fails without opening a window.

mod stats;
mod viewer;
mod window_surface;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use asset::MeshBuffers;
use corelib::CameraParams;
use renderer::{
    FrameDriver, GpuContext, OffscreenTarget, PipelineDesc, ShaderDesc, SurfaceProvider, build,
};
use winit::event_loop::{ControlFlow, EventLoop};

pub use stats::FrameStats;
pub use window_surface::WindowSurface;

/// Color format used when rendering without a window.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Everything the viewer needs, collected from the command line.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    /// Initial window size in logical pixels.
    pub width: u32,
    pub height: u32,
    /// OBJ file to display; the bundled cube when `None`.
    pub obj_path: Option<PathBuf>,
    pub camera: CameraParams,
    pub orbit_deg_per_sec: f32,
    /// Render this many frames offscreen and exit instead of opening a window.
    pub headless_frames: Option<u64>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            show_fps: false,
            width: 1280,
            height: 720,
            obj_path: None,
            camera: CameraParams::default(),
            orbit_deg_per_sec: 0.0,
            headless_frames: None,
        }
    }
}

impl ViewerConfig {
    fn driver(&self) -> FrameDriver {
        FrameDriver::new(self.camera).with_orbit_speed(self.orbit_deg_per_sec.to_radians())
    }
}

/// Parse and interleave the configured mesh (or the bundled cube).
pub fn load_mesh(path: Option<&Path>) -> Result<MeshBuffers> {
    let parsed = match path {
        Some(path) => asset::load_obj_from_path(path)?,
        None => asset::parse_obj(asset::CUBE_OBJ).context("bundled cube failed to parse")?,
    };
    let buffers = asset::interleave(&parsed).context("failed to build vertex buffers")?;
    log::info!(
        "Mesh ready: {} triangles, {} vertices (normals: {}, uvs: {})",
        parsed.triangle_count(),
        buffers.vertices.len(),
        parsed.has_normals(),
        parsed.has_uvs()
    );
    if let Some((min, max)) = buffers.bounds() {
        log::info!("Mesh bounds: min={min:?} max={max:?}");
    }
    Ok(buffers)
}

/// Reject degenerate camera parameters before any window or GPU object exists.
pub fn check_camera(config: &ViewerConfig) -> Result<()> {
    config
        .camera
        .with_viewport(config.width, config.height)
        .proj_view()
        .context("camera configuration rejected")?;
    Ok(())
}

/// Open the window and render until it is closed or a frame fails.
/// With `headless_frames` set, renders offscreen instead and returns after
/// that many frames.
pub fn run_viewer(config: ViewerConfig) -> Result<()> {
    let mesh = load_mesh(config.obj_path.as_deref())?;
    check_camera(&config)?;

    if let Some(frames) = config.headless_frames {
        run_headless(&config, &mesh, frames)?;
        return Ok(());
    }

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    // Redraws are requested explicitly after each submitted frame.
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut viewer = viewer::Viewer::new(config, mesh);
    event_loop
        .run_app(&mut viewer)
        .context("winit event loop terminated with error")?;
    viewer.finish()
}

/// Render `frames` frames into an offscreen texture. Returns the frame count.
pub fn run_headless(config: &ViewerConfig, mesh: &MeshBuffers, frames: u64) -> Result<u64> {
    let gpu = pollster::block_on(GpuContext::headless(config.backends))?;
    let mut target = OffscreenTarget::new(&gpu.device, HEADLESS_FORMAT, config.width, config.height);
    let (width, height) = target.physical_size();

    let (pipeline, resources) = build(
        &gpu,
        &PipelineDesc {
            color_format: target.format(),
            surface_formats: target.supported_formats(),
            width,
            height,
            vertex_shader: ShaderDesc::bundled_vertex(),
            fragment_shader: ShaderDesc::bundled_fragment(),
            mesh,
        },
    )?;

    let mut driver = config.driver();
    driver.set_viewport(width, height);
    let submitted = driver.run(&gpu, &mut target, &pipeline, &resources, Some(frames))?;
    log::info!("Headless run finished: {submitted} frames at {width}x{height}");
    Ok(submitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_bundled_cube() {
        let config = ViewerConfig::default();
        assert!(config.obj_path.is_none());
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.headless_frames, None);

        let mesh = load_mesh(config.obj_path.as_deref()).unwrap();
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.vertices.len(), 36);
    }

    #[test]
    fn missing_obj_file_names_the_path() {
        let err = load_mesh(Some(Path::new("/nonexistent/model.obj"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/model.obj"));
    }

    #[test]
    fn degenerate_camera_fails_before_gpu_setup() {
        assert!(check_camera(&ViewerConfig::default()).is_ok());

        let mut config = ViewerConfig::default();
        config.camera.fov_y_deg = 0.0;
        let err = check_camera(&config).unwrap_err();
        assert!(format!("{err:#}").contains("field of view"));

        let mut config = ViewerConfig::default();
        config.camera.eye = config.camera.target;
        assert!(check_camera(&config).is_err());

        // Fails at the camera check, never reaching the event loop.
        assert!(run_viewer(config).is_err());
    }
}
