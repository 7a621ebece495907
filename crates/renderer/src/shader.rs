//! WGSL validation against the fixed pipeline interface, done with naga
//! before any GPU object is created.
//!
//! Interface: vertex inputs at locations 0/1/2 (vec3, vec3, vec2 of f32),
//! a 64-byte uniform at `@group(0) @binding(0)`, nothing else bound.

use naga::{
    AddressSpace, Binding, Handle, Module, Scalar, ShaderStage, Type, TypeInner, VectorSize,
    valid::{Capabilities, ValidationFlags, Validator},
};

use crate::error::{RenderError, RenderResult};
use crate::uniform::MVP_UNIFORM_SIZE;

/// Bundled vertex stage.
pub const MESH_VERTEX_WGSL: &str = include_str!("shaders/mesh.vert.wgsl");
/// Bundled fragment stage.
pub const MESH_FRAGMENT_WGSL: &str = include_str!("shaders/mesh.frag.wgsl");

/// Named WGSL source for one pipeline stage.
#[derive(Clone, Copy, Debug)]
pub struct ShaderDesc<'a> {
    pub name: &'a str,
    pub source: &'a str,
    pub entry_point: &'a str,
}

impl<'a> ShaderDesc<'a> {
    pub fn vertex(name: &'a str, source: &'a str) -> Self {
        Self {
            name,
            source,
            entry_point: "vs_main",
        }
    }

    pub fn fragment(name: &'a str, source: &'a str) -> Self {
        Self {
            name,
            source,
            entry_point: "fs_main",
        }
    }

    pub fn bundled_vertex() -> ShaderDesc<'static> {
        ShaderDesc::vertex("mesh.vert.wgsl", MESH_VERTEX_WGSL)
    }

    pub fn bundled_fragment() -> ShaderDesc<'static> {
        ShaderDesc::fragment("mesh.frag.wgsl", MESH_FRAGMENT_WGSL)
    }
}

/// Inter-stage locations a validated vertex stage writes.
#[derive(Debug)]
pub struct VertexInterface {
    pub outputs: Vec<u32>,
}

pub fn validate_vertex(desc: &ShaderDesc<'_>) -> RenderResult<VertexInterface> {
    let module = compile(desc)?;
    let fail = |message: String| RenderError::ShaderCompilation {
        shader: desc.name.to_owned(),
        message,
    };

    let entry = find_entry(&module, desc, ShaderStage::Vertex)?;
    check_bindings(&module, desc, true)?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_locations(&module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }
    let expected = [
        (0, VectorSize::Tri),
        (1, VectorSize::Tri),
        (2, VectorSize::Bi),
    ];
    for (location, ty) in &inputs {
        let Some((_, size)) = expected.iter().find(|(l, _)| l == location) else {
            return Err(fail(format!(
                "vertex input @location({location}) is not provided by the vertex buffer layout"
            )));
        };
        let want = TypeInner::Vector {
            size: *size,
            scalar: Scalar::F32,
        };
        if module.types[*ty].inner != want {
            return Err(fail(format!(
                "vertex input @location({location}) must be {want:?}"
            )));
        }
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(&module, result.ty, result.binding.as_ref(), &mut outputs);
    }
    Ok(VertexInterface {
        outputs: outputs.into_iter().map(|(l, _)| l).collect(),
    })
}

/// Validate the fragment stage; its inputs must be written by `vertex`.
pub fn validate_fragment(desc: &ShaderDesc<'_>, vertex: &VertexInterface) -> RenderResult<()> {
    let module = compile(desc)?;
    let entry = find_entry(&module, desc, ShaderStage::Fragment)?;
    check_bindings(&module, desc, false)?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_locations(&module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }
    if let Some((location, _)) = inputs.iter().find(|(l, _)| !vertex.outputs.contains(l)) {
        return Err(RenderError::ShaderCompilation {
            shader: desc.name.to_owned(),
            message: format!("fragment input @location({location}) is not written by the vertex stage"),
        });
    }
    Ok(())
}

fn compile(desc: &ShaderDesc<'_>) -> RenderResult<Module> {
    let module = naga::front::wgsl::parse_str(desc.source).map_err(|e| {
        RenderError::ShaderCompilation {
            shader: desc.name.to_owned(),
            message: e.emit_to_string(desc.source),
        }
    })?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| RenderError::ShaderCompilation {
            shader: desc.name.to_owned(),
            message: e.emit_to_string(desc.source),
        })?;
    Ok(module)
}

fn find_entry<'m>(
    module: &'m Module,
    desc: &ShaderDesc<'_>,
    stage: ShaderStage,
) -> RenderResult<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == desc.entry_point && ep.stage == stage)
        .ok_or_else(|| RenderError::ShaderCompilation {
            shader: desc.name.to_owned(),
            message: format!("missing {stage:?} entry point '{}'", desc.entry_point),
        })
}

/// Only `@group(0) @binding(0)` may be bound, as a 64-byte uniform.
fn check_bindings(module: &Module, desc: &ShaderDesc<'_>, require_mvp: bool) -> RenderResult<()> {
    let fail = |message: String| RenderError::ShaderCompilation {
        shader: desc.name.to_owned(),
        message,
    };

    let mut found = false;
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        if binding.group != 0 || binding.binding != 0 {
            return Err(fail(format!(
                "resource @group({}) @binding({}) is not in the pipeline layout",
                binding.group, binding.binding
            )));
        }
        if var.space != AddressSpace::Uniform {
            return Err(fail("@group(0) @binding(0) must be a uniform buffer".to_owned()));
        }
        let size = module.types[var.ty].inner.size(module.to_ctx());
        if u64::from(size) != MVP_UNIFORM_SIZE {
            return Err(fail(format!(
                "@group(0) @binding(0) is {size} bytes, the MVP uniform is {MVP_UNIFORM_SIZE}"
            )));
        }
        found = true;
    }

    if require_mvp && !found {
        return Err(fail("missing MVP uniform at @group(0) @binding(0)".to_owned()));
    }
    Ok(())
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, Handle<Type>)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push((*location, ty)),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAG_OK: &str = "
        @fragment
        fn fs_main(@location(0) n: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(n, 1.0);
        }
    ";

    fn vertex_with(body: &str) -> String {
        format!(
            "struct Camera {{ mvp: mat4x4<f32> }};
             @group(0) @binding(0) var<uniform> camera: Camera;
             {body}"
        )
    }

    #[test]
    fn bundled_shaders_validate() {
        let vs = validate_vertex(&ShaderDesc::bundled_vertex()).expect("vertex stage");
        assert!(vs.outputs.contains(&0) && vs.outputs.contains(&1));
        validate_fragment(&ShaderDesc::bundled_fragment(), &vs).expect("fragment stage");
    }

    #[test]
    fn syntax_error_names_the_shader() {
        let desc = ShaderDesc::vertex("broken.wgsl", "fn vs_main( {");
        match validate_vertex(&desc) {
            Err(RenderError::ShaderCompilation { shader, .. }) => assert_eq!(shader, "broken.wgsl"),
            other => panic!("expected compilation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_entry_point() {
        let src = vertex_with(
            "@vertex fn main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return camera.mvp * vec4<f32>(p, 1.0);
             }",
        );
        let err = validate_vertex(&ShaderDesc::vertex("v", &src)).unwrap_err();
        assert!(err.to_string().contains("vs_main"));
    }

    #[test]
    fn missing_uniform() {
        let src = "@vertex fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(p, 1.0);
        }";
        let err = validate_vertex(&ShaderDesc::vertex("v", src)).unwrap_err();
        assert!(err.to_string().contains("missing MVP uniform"));
    }

    #[test]
    fn wrong_uniform_size() {
        let src = "@group(0) @binding(0) var<uniform> m: mat3x3<f32>;
            @vertex fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(m * p, 1.0);
            }";
        let err = validate_vertex(&ShaderDesc::vertex("v", src)).unwrap_err();
        assert!(err.to_string().contains("48 bytes"), "{err}");
    }

    #[test]
    fn extra_binding_is_rejected() {
        let src = vertex_with(
            "@group(1) @binding(0) var<uniform> extra: vec4<f32>;
             @vertex fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return camera.mvp * vec4<f32>(p, 1.0) + extra;
             }",
        );
        let err = validate_vertex(&ShaderDesc::vertex("v", &src)).unwrap_err();
        assert!(err.to_string().contains("@group(1)"));
    }

    #[test]
    fn input_type_mismatch() {
        let src = vertex_with(
            "@vertex fn vs_main(@location(0) p: vec4<f32>) -> @builtin(position) vec4<f32> {
                return camera.mvp * p;
             }",
        );
        let err = validate_vertex(&ShaderDesc::vertex("v", &src)).unwrap_err();
        assert!(err.to_string().contains("@location(0)"));
    }

    #[test]
    fn unknown_input_location() {
        let src = vertex_with(
            "@vertex fn vs_main(@location(3) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return camera.mvp * vec4<f32>(p, 1.0);
             }",
        );
        let err = validate_vertex(&ShaderDesc::vertex("v", &src)).unwrap_err();
        assert!(err.to_string().contains("@location(3)"));
    }

    #[test]
    fn fragment_input_must_be_written() {
        let vs = VertexInterface { outputs: vec![] };
        let err = validate_fragment(&ShaderDesc::fragment("f", FRAG_OK), &vs).unwrap_err();
        assert!(err.to_string().contains("not written"));

        let vs = VertexInterface { outputs: vec![0] };
        validate_fragment(&ShaderDesc::fragment("f", FRAG_OK), &vs).unwrap();
    }
}
