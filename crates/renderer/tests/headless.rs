//! End-to-end: OBJ cube -> buffers -> pipeline -> frames on an offscreen target.
//! GPU-backed tests return early when the machine has no adapter.

use asset::{CUBE_OBJ, interleave, parse_obj};
use corelib::{CameraParams, Vec3};
use renderer::{
    DriverState, FrameDriver, GpuContext, OffscreenTarget, PipelineDesc, RenderError, ShaderDesc,
    SurfaceProvider, Tick, build,
};
use wgpu::TextureFormat;

const FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

fn reference_camera() -> CameraParams {
    CameraParams::new_perspective(
        Vec3::new(10.0, 10.0, 10.0),
        Vec3::ZERO,
        Vec3::Y,
        120.0,
        0.1,
        100.0,
        4.0 / 3.0,
    )
}

fn gpu() -> Option<GpuContext> {
    let _ = env_logger::builder().is_test(true).try_init();
    match pollster::block_on(GpuContext::headless(wgpu::Backends::all())) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            log::warn!("Skipping GPU test: {err}");
            None
        }
    }
}

#[test]
fn cube_buffers_and_first_uniform_write() {
    let mesh = parse_obj(CUBE_OBJ).unwrap();
    let buffers = interleave(&mesh).unwrap();
    assert_eq!(buffers.indices.len(), 36);
    assert_eq!(buffers.vertex_floats().len(), 36 * 8);

    let driver = FrameDriver::new(reference_camera());
    let write = driver.prepare_uniform().unwrap();
    assert_eq!(write.offset, 0);
    assert_eq!(write.bytes.len(), 64);
}

#[test]
fn out_of_range_face_fails_before_any_buffer() {
    let mut src = String::new();
    for i in 0..8 {
        src.push_str(&format!("v {i} {i} 0\n"));
    }
    src.push_str("f 1 2 9\n");
    let err = parse_obj(&src).unwrap_err();
    let err: RenderError = err.into();
    assert!(matches!(err, RenderError::Mesh(asset::MeshError::IndexOutOfRange { .. })));
}

#[test]
fn cube_renders_on_offscreen_target() {
    let Some(gpu) = gpu() else { return };

    let buffers = interleave(&parse_obj(CUBE_OBJ).unwrap()).unwrap();
    let mut target = OffscreenTarget::new(&gpu.device, FORMAT, 640, 480);
    let (width, height) = target.physical_size();

    let (pipeline, resources) = build(
        &gpu,
        &PipelineDesc {
            color_format: FORMAT,
            surface_formats: target.supported_formats(),
            width,
            height,
            vertex_shader: ShaderDesc::bundled_vertex(),
            fragment_shader: ShaderDesc::bundled_fragment(),
            mesh: &buffers,
        },
    )
    .expect("pipeline");
    assert_eq!(resources.index_count, 36);
    assert_eq!(resources.uniform_buffer.size(), 64);
    assert_eq!(resources.vertex_buffer.size(), 36 * 32);
    assert_eq!(resources.depth_texture.width(), 640);
    assert_eq!(resources.depth_texture.height(), 480);

    let mut driver = FrameDriver::new(reference_camera());
    assert_eq!(driver.state(), DriverState::Idle);
    let tick = driver.tick(&gpu, &mut target, &pipeline, &resources).unwrap();
    assert_eq!(tick, Tick::Continue);
    assert_eq!(driver.state(), DriverState::Rendering);

    driver.stop_token().stop();
    let tick = driver.tick(&gpu, &mut target, &pipeline, &resources).unwrap();
    assert_eq!(tick, Tick::Stopped);
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(driver.frames(), 1);
}

#[test]
fn run_stops_after_frame_budget() {
    let Some(gpu) = gpu() else { return };

    let buffers = interleave(&parse_obj(CUBE_OBJ).unwrap()).unwrap();
    let mut target = OffscreenTarget::new(&gpu.device, FORMAT, 64, 64);
    let (pipeline, resources) = build(
        &gpu,
        &PipelineDesc {
            color_format: FORMAT,
            surface_formats: target.supported_formats(),
            width: 64,
            height: 64,
            vertex_shader: ShaderDesc::bundled_vertex(),
            fragment_shader: ShaderDesc::bundled_fragment(),
            mesh: &buffers,
        },
    )
    .unwrap();

    let mut driver = FrameDriver::new(reference_camera());
    let frames = driver
        .run(&gpu, &mut target, &pipeline, &resources, Some(3))
        .unwrap();
    assert_eq!(frames, 3);
    assert_eq!(driver.state(), DriverState::Stopped);
}

#[test]
fn device_loss_stops_the_loop() {
    let Some(gpu) = gpu() else { return };

    let buffers = interleave(&parse_obj(CUBE_OBJ).unwrap()).unwrap();
    let mut target = OffscreenTarget::new(&gpu.device, FORMAT, 64, 64);
    let (pipeline, resources) = build(
        &gpu,
        &PipelineDesc {
            color_format: FORMAT,
            surface_formats: target.supported_formats(),
            width: 64,
            height: 64,
            vertex_shader: ShaderDesc::bundled_vertex(),
            fragment_shader: ShaderDesc::bundled_fragment(),
            mesh: &buffers,
        },
    )
    .unwrap();

    let mut driver = FrameDriver::new(reference_camera());
    gpu.lost_signal().raise("simulated");
    let err = driver.tick(&gpu, &mut target, &pipeline, &resources).unwrap_err();
    assert!(matches!(err, RenderError::DeviceLost(_)));
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(
        driver.tick(&gpu, &mut target, &pipeline, &resources).unwrap(),
        Tick::Stopped
    );
}

#[test]
fn unsupported_format_creates_nothing() {
    let Some(gpu) = gpu() else { return };

    let buffers = interleave(&parse_obj(CUBE_OBJ).unwrap()).unwrap();
    let result = build(
        &gpu,
        &PipelineDesc {
            color_format: TextureFormat::Rgba16Float,
            surface_formats: &[FORMAT],
            width: 64,
            height: 64,
            vertex_shader: ShaderDesc::bundled_vertex(),
            fragment_shader: ShaderDesc::bundled_fragment(),
            mesh: &buffers,
        },
    );
    assert!(matches!(result, Err(RenderError::UnsupportedSurfaceFormat { .. })));
}

#[test]
fn broken_fragment_shader_is_reported() {
    let Some(gpu) = gpu() else { return };

    let buffers = interleave(&parse_obj(CUBE_OBJ).unwrap()).unwrap();
    let result = build(
        &gpu,
        &PipelineDesc {
            color_format: FORMAT,
            surface_formats: &[FORMAT],
            width: 64,
            height: 64,
            vertex_shader: ShaderDesc::bundled_vertex(),
            fragment_shader: ShaderDesc::fragment("bad.frag.wgsl", "@fragment fn fs_main( -> {"),
            mesh: &buffers,
        },
    );
    match result {
        Err(RenderError::ShaderCompilation { shader, .. }) => assert_eq!(shader, "bad.frag.wgsl"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("broken shader accepted"),
    }
}

#[test]
fn depth_target_follows_resize() {
    let Some(gpu) = gpu() else { return };

    let buffers = interleave(&parse_obj(CUBE_OBJ).unwrap()).unwrap();
    let target = OffscreenTarget::new(&gpu.device, FORMAT, 64, 64);
    let (pipeline, mut resources) = build(
        &gpu,
        &PipelineDesc {
            color_format: FORMAT,
            surface_formats: target.supported_formats(),
            width: 64,
            height: 64,
            vertex_shader: ShaderDesc::bundled_vertex(),
            fragment_shader: ShaderDesc::bundled_fragment(),
            mesh: &buffers,
        },
    )
    .unwrap();

    resources.resize(&gpu.device, 320, 200);
    assert_eq!((resources.width, resources.height), (320, 200));
    assert_eq!(resources.depth_texture.width(), 320);
    assert_eq!(resources.depth_texture.height(), 200);

    // Depth and color attachments must agree or the render pass is rejected.
    let mut resized = OffscreenTarget::new(&gpu.device, FORMAT, 320, 200);
    let mut driver = FrameDriver::new(reference_camera());
    driver.set_viewport(320, 200);
    let tick = driver.tick(&gpu, &mut resized, &pipeline, &resources).unwrap();
    assert_eq!(tick, Tick::Continue);

    resources.resize(&gpu.device, 0, 0);
    assert_eq!((resources.width, resources.height), (1, 1));
    assert_eq!(resources.depth_texture.width(), 1);
    assert_eq!(resources.depth_texture.height(), 1);
}
