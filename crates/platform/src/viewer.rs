//! winit application handler: owns the window, GPU state and frame driver.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use asset::MeshBuffers;
use renderer::{
    FrameDriver, FrameResources, GpuContext, PipelineDesc, PipelineState, ShaderDesc,
    SurfaceProvider, Tick, build,
};
use wgpu::{Instance, InstanceDescriptor};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

use crate::ViewerConfig;
use crate::stats::FrameStats;
use crate::window_surface::WindowSurface;

/// Field order matters for drop: the surface goes before the window it
/// presents to.
struct ViewerState {
    surface: WindowSurface,
    resources: FrameResources,
    pipeline: PipelineState,
    gpu: GpuContext,
    driver: FrameDriver,
    stats: Option<FrameStats>,
    window: Arc<Window>,
}

impl ViewerState {
    fn resize(&mut self, size: PhysicalSize<u32>) {
        if !self.surface.resize(size.width, size.height) {
            log::debug!("Ignoring resize to {}x{}", size.width, size.height);
            return;
        }
        self.resources.resize(&self.gpu.device, size.width, size.height);
        self.driver.set_viewport(size.width, size.height);
        log::info!("Resized: {}x{}", size.width, size.height);
    }
}

pub(crate) struct Viewer {
    config: ViewerConfig,
    mesh: MeshBuffers,
    state: Option<ViewerState>,
    error: Option<anyhow::Error>,
}

impl Viewer {
    pub(crate) fn new(config: ViewerConfig, mesh: MeshBuffers) -> Self {
        Self {
            config,
            mesh,
            state: None,
            error: None,
        }
    }

    /// Result of the event loop once it has exited.
    pub(crate) fn finish(self) -> Result<()> {
        match (self.error, self.state) {
            (Some(err), _) => Err(err),
            (None, Some(state)) => {
                log::info!("Viewer closed after {} frames", state.driver.frames());
                Ok(())
            }
            (None, None) => Err(anyhow!("event loop exited before the window was created")),
        }
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<ViewerState> {
        let attrs = Window::default_attributes()
            .with_title("objlit")
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        let PhysicalSize { width, height } = window.inner_size();
        log::info!(
            "Window created: {}x{} physical (scale factor {:.2})",
            width,
            height,
            window.scale_factor()
        );

        let instance = Instance::new(&InstanceDescriptor {
            backends: self.config.backends,
            ..Default::default()
        });
        let raw_surface = WindowSurface::create(&instance, window.clone())?;
        let gpu = pollster::block_on(GpuContext::request(&instance, Some(&raw_surface)))?;
        let surface = WindowSurface::configure(raw_surface, &gpu, width, height)?;
        let (width, height) = surface.physical_size();

        let (pipeline, resources) = build(
            &gpu,
            &PipelineDesc {
                color_format: surface.format(),
                surface_formats: surface.supported_formats(),
                width,
                height,
                vertex_shader: ShaderDesc::bundled_vertex(),
                fragment_shader: ShaderDesc::bundled_fragment(),
                mesh: &self.mesh,
            },
        )?;

        let mut driver = self.config.driver();
        driver.set_viewport(width, height);

        Ok(ViewerState {
            surface,
            resources,
            pipeline,
            gpu,
            driver,
            stats: self.config.show_fps.then(FrameStats::new),
            window,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                state.driver.stop_token().stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                // A `Resized` with the new physical size follows.
                log::info!("Scale factor changed: {scale_factor:.3}");
            }
            WindowEvent::RedrawRequested => {
                let tick = state.driver.tick(
                    &state.gpu,
                    &mut state.surface,
                    &state.pipeline,
                    &state.resources,
                );
                match tick {
                    Ok(Tick::Continue) => {
                        if let Some(stats) = state.stats.as_mut() {
                            stats.record();
                        }
                        state.window.request_redraw();
                    }
                    Ok(Tick::Stopped) => event_loop.exit(),
                    Err(err) => self.fail(event_loop, err.into()),
                }
            }
            _ => {}
        }
    }
}
