use std::collections::BTreeMap;

use crate::error::ShaderError;

/*
 * Parses a WGSL shader with naga to work out the bind group layouts and the vertex
 * buffer layout a pipeline needs, so a pass can be registered from nothing but its
 * source. Every vertex attribute gets its own buffer (positions, normals, uvs...),
 * which matches how meshes are uploaded.
 *
 * Only the handful of binding types the scene's shaders use are understood.
 */

fn to_wgpu_binding_type(naga_type: &naga::TypeInner) -> Result<wgpu::BindingType, ShaderError> {
    match naga_type {
        naga::TypeInner::Struct { .. }
        | naga::TypeInner::Matrix { .. }
        | naga::TypeInner::Vector { .. }
        | naga::TypeInner::Scalar { .. } => Ok(wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        }),
        naga::TypeInner::Image { dim, class, .. } => match class {
            naga::ImageClass::Sampled { kind, multi } => Ok(wgpu::BindingType::Texture {
                sample_type: match kind {
                    naga::ScalarKind::Float => wgpu::TextureSampleType::Float { filterable: true },
                    naga::ScalarKind::Sint => wgpu::TextureSampleType::Sint,
                    naga::ScalarKind::Uint => wgpu::TextureSampleType::Uint,
                    naga::ScalarKind::Bool => return Err(ShaderError::Unsupported("bool texture")),
                },
                view_dimension: match dim {
                    naga::ImageDimension::D2 => wgpu::TextureViewDimension::D2,
                    _ => return Err(ShaderError::Unsupported("non-2D texture")),
                },
                multisampled: *multi,
            }),
            _ => Err(ShaderError::Unsupported("storage or depth texture")),
        },
        naga::TypeInner::Sampler { comparison } => Ok(wgpu::BindingType::Sampler(if *comparison {
            wgpu::SamplerBindingType::Comparison
        } else {
            wgpu::SamplerBindingType::Filtering
        })),
        _ => Err(ShaderError::Unsupported("uniform type")),
    }
}

fn to_wgpu_vertex_format(ty: &naga::TypeInner) -> Result<wgpu::VertexFormat, ShaderError> {
    match ty {
        naga::TypeInner::Scalar {
            kind: naga::ScalarKind::Float,
            width: 4,
        } => Ok(wgpu::VertexFormat::Float32),
        naga::TypeInner::Vector {
            size,
            kind: naga::ScalarKind::Float,
            width: 4,
        } => Ok(match size {
            naga::VectorSize::Bi => wgpu::VertexFormat::Float32x2,
            naga::VectorSize::Tri => wgpu::VertexFormat::Float32x3,
            naga::VectorSize::Quad => wgpu::VertexFormat::Float32x4,
        }),
        _ => Err(ShaderError::Unsupported("vertex attribute type")),
    }
}

pub struct ShaderMetadata {
    // BTreeMap so groups come out in order
    pub(crate) bind_group_layouts: BTreeMap<u32, Vec<wgpu::BindGroupLayoutEntry>>,
    pub(crate) vertex_attributes: Vec<wgpu::VertexAttribute>,
}

pub fn shader_metadata(pass_name: &str, source: &str) -> Result<ShaderMetadata, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| ShaderError::Parse {
        pass: pass_name.to_string(),
        message: err.emit_to_string(source),
    })?;

    let mut bind_group_layouts = BTreeMap::<u32, Vec<wgpu::BindGroupLayoutEntry>>::new();
    for (_, global_var) in module.global_variables.iter() {
        if let Some(binding) = &global_var.binding {
            let entry = wgpu::BindGroupLayoutEntry {
                binding: binding.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: to_wgpu_binding_type(&module.types[global_var.ty].inner)?,
                count: None,
            };
            bind_group_layouts
                .entry(binding.group)
                .or_default()
                .push(entry);
        }
    }

    let mut vertex_attributes = Vec::new();
    if let Some(vs_main) = module.entry_points.iter().find(|ep| ep.name == "vs_main") {
        for arg in vs_main.function.arguments.iter() {
            if let Some(naga::Binding::Location { location, .. }) = &arg.binding {
                vertex_attributes.push(wgpu::VertexAttribute {
                    format: to_wgpu_vertex_format(&module.types[arg.ty].inner)?,
                    offset: 0,
                    shader_location: *location,
                });
            }
        }
    }
    vertex_attributes.sort_by_key(|attrib| attrib.shader_location);

    Ok(ShaderMetadata {
        bind_group_layouts,
        vertex_attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
struct ViewData {
    view_proj: mat4x4<f32>;
};

[[group(0), binding(0)]] var<uniform> view: ViewData;
[[group(1), binding(0)]] var t_color: texture_2d<f32>;
[[group(1), binding(1)]] var s_color: sampler;

struct VertexOutput {
    [[builtin(position)]] position: vec4<f32>;
    [[location(0)]] uv: vec2<f32>;
};

[[stage(vertex)]]
fn vs_main([[location(0)]] position: vec3<f32>, [[location(1)]] uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = view.view_proj * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

[[stage(fragment)]]
fn fs_main(in: VertexOutput) -> [[location(0)]] vec4<f32> {
    return textureSample(t_color, s_color, in.uv);
}
"#;

    #[test]
    fn test_reflects_groups_and_vertex_buffers() {
        let metadata = shader_metadata("test", SOURCE).unwrap();

        assert_eq!(metadata.bind_group_layouts.len(), 2);
        assert_eq!(metadata.bind_group_layouts[&0].len(), 1);
        assert_eq!(metadata.bind_group_layouts[&1].len(), 2);

        let formats: Vec<wgpu::VertexFormat> = metadata
            .vertex_attributes
            .iter()
            .map(|attrib| attrib.format)
            .collect();
        assert_eq!(
            formats,
            vec![wgpu::VertexFormat::Float32x3, wgpu::VertexFormat::Float32x2]
        );
    }

    #[test]
    fn test_bad_source_reports_pass_name() {
        let err = shader_metadata("broken_pass", "fn (").err().unwrap();
        assert!(err.to_string().contains("broken_pass"));
    }
}
