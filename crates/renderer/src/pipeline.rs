//! Render pipeline builder: immutable pipeline state plus the per-frame
//! resource bundle (uniform, bind group, depth target, geometry).

use std::num::NonZeroU64;

use asset::{MeshBuffers, MeshError};
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CompareFunction, DepthBiasState, DepthStencilState, Device, ErrorFilter, Extent3d, Face,
    FragmentState, FrontFace, MultisampleState, PipelineCompilationOptions,
    PipelineLayoutDescriptor, PrimitiveState, PrimitiveTopology, RenderPipeline,
    RenderPipelineDescriptor, ShaderModuleDescriptor, ShaderSource, ShaderStages, StencilState,
    Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexState, util::DeviceExt,
};

use crate::error::{RenderError, RenderResult};
use crate::gpu::GpuContext;
use crate::shader::{self, ShaderDesc};
use crate::surface::check_surface_format;
use crate::uniform::{MVP_UNIFORM_SIZE, MvpUniform};
use crate::vertex::VERTEX_LAYOUT;

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Everything `build` needs. Sizes are physical pixels.
pub struct PipelineDesc<'a> {
    pub color_format: TextureFormat,
    pub surface_formats: &'a [TextureFormat],
    pub width: u32,
    pub height: u32,
    pub vertex_shader: ShaderDesc<'a>,
    pub fragment_shader: ShaderDesc<'a>,
    pub mesh: &'a MeshBuffers,
}

/// Immutable once built; shared read-only with the frame driver.
pub struct PipelineState {
    pub pipeline: RenderPipeline,
    pub bind_group_layout: BindGroupLayout,
    pub color_format: TextureFormat,
    pub depth_format: TextureFormat,
}

/// Created once, uniform contents rewritten every frame, depth target
/// recreated on resize.
pub struct FrameResources {
    pub uniform_buffer: Buffer,
    pub bind_group: BindGroup,
    pub depth_texture: Texture,
    pub depth_view: TextureView,
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub index_count: u32,
    pub width: u32,
    pub height: u32,
}

impl FrameResources {
    /// Recreate the depth attachment for a new physical surface size.
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        let (texture, view) = create_depth_target(device, self.width, self.height);
        self.depth_texture = texture;
        self.depth_view = view;
        log::debug!("Depth target resized to {}x{}", self.width, self.height);
    }
}

/// Build pipeline state and frame resources.
///
/// Format, mesh and shader checks all run before the first GPU object is
/// created, so a failure leaves nothing half-initialized.
pub fn build(gpu: &GpuContext, desc: &PipelineDesc<'_>) -> RenderResult<(PipelineState, FrameResources)> {
    check_surface_format(desc.color_format, desc.surface_formats)?;
    check_mesh(desc.mesh)?;
    let vs_interface = shader::validate_vertex(&desc.vertex_shader)?;
    shader::validate_fragment(&desc.fragment_shader, &vs_interface)?;

    let device = &gpu.device;
    device.push_error_scope(ErrorFilter::Validation);

    let vs_module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(desc.vertex_shader.name),
        source: ShaderSource::Wgsl(desc.vertex_shader.source.into()),
    });
    let fs_module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(desc.fragment_shader.name),
        source: ShaderSource::Wgsl(desc.fragment_shader.source.into()),
    });

    // ==== Camera BGL/BG ====
    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Camera BGL"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(MVP_UNIFORM_SIZE),
            },
            count: None,
        }],
    });

    // Identity until the first frame writes the real MVP.
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Camera UBO"),
        contents: bytemuck::bytes_of(&MvpUniform::identity()),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Camera BG"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    // ==== Pipeline ====
    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("Mesh PipelineLayout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("Mesh Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &vs_module,
            entry_point: Some(desc.vertex_shader.entry_point),
            buffers: &[VERTEX_LAYOUT],
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: &fs_module,
            entry_point: Some(desc.fragment_shader.entry_point),
            targets: &[Some(ColorTargetState {
                format: desc.color_format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: PipelineCompilationOptions::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: Some(Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompilation {
            shader: format!("{} + {}", desc.vertex_shader.name, desc.fragment_shader.name),
            message: err.to_string(),
        });
    }

    // ==== Geometry ====
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh VB"),
        contents: desc.mesh.vertex_bytes(),
        usage: BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh IB"),
        contents: desc.mesh.index_bytes(),
        usage: BufferUsages::INDEX,
    });

    let width = desc.width.max(1);
    let height = desc.height.max(1);
    let (depth_texture, depth_view) = create_depth_target(device, width, height);

    log::info!(
        "Pipeline ready: color={:?}, depth={:?}, {}x{} px, {} vertices, {} indices",
        desc.color_format,
        DEPTH_FORMAT,
        width,
        height,
        desc.mesh.vertices.len(),
        desc.mesh.index_count()
    );

    Ok((
        PipelineState {
            pipeline,
            bind_group_layout,
            color_format: desc.color_format,
            depth_format: DEPTH_FORMAT,
        },
        FrameResources {
            uniform_buffer,
            bind_group,
            depth_texture,
            depth_view,
            vertex_buffer,
            index_buffer,
            index_count: desc.mesh.index_count(),
            width,
            height,
        },
    ))
}

fn check_mesh(mesh: &MeshBuffers) -> Result<(), MeshError> {
    if !mesh.is_valid() {
        return Err(MeshError::MalformedMeshData {
            line: 0,
            reason: "mesh buffers are empty".to_owned(),
        });
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(MeshError::MalformedMeshData {
            line: 0,
            reason: format!("{} indices do not form a triangle list", mesh.indices.len()),
        });
    }
    if let Some(&bad) = mesh.indices.iter().find(|&&i| usize::from(i) >= mesh.vertices.len()) {
        return Err(MeshError::IndexOutOfRange {
            line: 0,
            attribute: asset::Attribute::Position,
            index: i64::from(bad),
            len: mesh.vertices.len(),
        });
    }
    Ok(())
}

/// Depth texture + view sized to the physical surface.
fn create_depth_target(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = tex.create_view(&TextureViewDescriptor::default());
    (tex, view)
}
