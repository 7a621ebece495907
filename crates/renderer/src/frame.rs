//! Frame driver: Idle -> Rendering (loop) -> Stopped.
//!
//! Each iteration recomputes the MVP, writes it to the uniform buffer,
//! records one depth-tested indexed draw and submits it. Submission does not
//! wait for the GPU. Errors are fatal for the loop: the driver moves to
//! `Stopped` and the error is returned, no frame is retried or skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use corelib::{CameraParams, CoreResult, Mat4, transform};
use wgpu::{
    Color, CommandEncoderDescriptor, IndexFormat, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp,
};

use crate::error::{RenderError, RenderResult};
use crate::gpu::GpuContext;
use crate::pipeline::{FrameResources, PipelineState};
use crate::surface::SurfaceProvider;
use crate::uniform::UniformWrite;

const CLEAR_COLOR: Color = Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriverState {
    Idle,
    Rendering,
    Stopped,
}

/// What the caller should do after a tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tick {
    /// Schedule the next iteration.
    Continue,
    Stopped,
}

/// Whole-loop cancellation. Does not cancel already-submitted work.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct FrameDriver {
    camera: CameraParams,
    model: Mat4,
    state: DriverState,
    stop: StopToken,
    /// Camera orbit speed around its up axis, radians per second.
    orbit_speed: f32,
    last_tick: Option<Instant>,
    frames: u64,
}

impl FrameDriver {
    pub fn new(camera: CameraParams) -> Self {
        Self {
            camera,
            model: transform::model_matrix(),
            state: DriverState::Idle,
            stop: StopToken::default(),
            orbit_speed: 0.0,
            last_tick: None,
            frames: 0,
        }
    }

    pub fn with_orbit_speed(mut self, radians_per_sec: f32) -> Self {
        self.orbit_speed = radians_per_sec;
        self
    }

    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn camera(&self) -> &CameraParams {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut CameraParams {
        &mut self.camera
    }

    /// Token that stops the loop from any thread.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Keep the projection aspect in step with the physical surface size.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera = self.camera.with_viewport(width, height);
    }

    /// The 64-byte uniform write for the current camera and model.
    pub fn prepare_uniform(&self) -> CoreResult<UniformWrite> {
        Ok(UniformWrite::mvp(transform::mvp(&self.camera, self.model)?))
    }

    /// Run one iteration. `Tick::Continue` asks the caller to schedule the next.
    pub fn tick<S: SurfaceProvider + ?Sized>(
        &mut self,
        gpu: &GpuContext,
        surface: &mut S,
        pipeline: &PipelineState,
        resources: &FrameResources,
    ) -> RenderResult<Tick> {
        if self.state == DriverState::Stopped || self.stop.is_stopped() {
            self.halt();
            return Ok(Tick::Stopped);
        }

        if let Err(err) = self.render_frame(gpu, surface, pipeline, resources) {
            log::error!("Frame {} failed, stopping render loop: {}", self.frames, err);
            self.halt();
            return Err(err);
        }
        self.frames += 1;

        if self.stop.is_stopped() {
            self.halt();
            Ok(Tick::Stopped)
        } else {
            Ok(Tick::Continue)
        }
    }

    /// Explicit loop: tick until stopped, an error occurs, or `max_frames`
    /// frames have been submitted. Returns the total frame count.
    pub fn run<S: SurfaceProvider + ?Sized>(
        &mut self,
        gpu: &GpuContext,
        surface: &mut S,
        pipeline: &PipelineState,
        resources: &FrameResources,
        max_frames: Option<u64>,
    ) -> RenderResult<u64> {
        loop {
            if max_frames.is_some_and(|max| self.frames >= max) {
                self.stop.stop();
            }
            match self.tick(gpu, surface, pipeline, resources)? {
                Tick::Continue => continue,
                Tick::Stopped => break,
            }
        }
        Ok(self.frames)
    }

    fn halt(&mut self) {
        if self.state != DriverState::Stopped {
            log::info!("Render loop stopped after {} frames", self.frames);
        }
        self.state = DriverState::Stopped;
    }

    fn advance_camera(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_tick.replace(now) {
            if self.orbit_speed != 0.0 {
                let dt = now.duration_since(last).as_secs_f32();
                self.camera = self.camera.orbited(self.orbit_speed * dt);
            }
        }
    }

    fn render_frame<S: SurfaceProvider + ?Sized>(
        &mut self,
        gpu: &GpuContext,
        surface: &mut S,
        pipeline: &PipelineState,
        resources: &FrameResources,
    ) -> RenderResult<()> {
        gpu.ensure_alive()?;

        // --- update MVP
        self.advance_camera();
        let write = self.prepare_uniform()?;
        gpu.queue
            .write_buffer(&resources.uniform_buffer, write.offset, &write.bytes);

        // --- frame & pass
        let frame = surface.acquire()?;
        let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("MainEncoder"),
        });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: frame.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &resources.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&pipeline.pipeline);
            rpass.set_bind_group(0, &resources.bind_group, &[]);
            rpass.set_vertex_buffer(0, resources.vertex_buffer.slice(..));
            rpass.set_index_buffer(resources.index_buffer.slice(..), IndexFormat::Uint16);
            rpass.draw_indexed(0..resources.index_count, 0, 0..1);
        }

        gpu.queue.submit(Some(encoder.finish()));
        frame.present();

        if self.state == DriverState::Idle {
            log::info!("First frame submitted, render loop running");
            self.state = DriverState::Rendering;
        }
        log::trace!("Frame {} submitted", self.frames);

        gpu.ensure_alive()
    }
}
