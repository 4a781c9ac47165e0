// For drawing the 3D scene into an offscreen target with a depth buffer
#[macro_export]
macro_rules! indirect_graphics_depth_pass {
    ( $source: expr, $formats: expr, $blend: expr, $depth_write: expr, $depth_compare: expr ) => {
        crate::renderer::render_job::RenderPassDescriptor {
            source: $source,
            push_constant_ranges: &[],
            targets: Some(
                &$formats
                    .iter()
                    .map(|f| wgpu::ColorTargetState {
                        format: *f,
                        blend: $blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })
                    .collect::<Vec<wgpu::ColorTargetState>>(),
            ),
            surface_blend: wgpu::BlendState::REPLACE,
            primitive_state: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil_state: Some(wgpu::DepthStencilState {
                format: crate::renderer::Renderer::DEPTH_FORMAT,
                depth_write_enabled: $depth_write,
                depth_compare: $depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample_state: wgpu::MultisampleState::default(),
            multiview: None,
        }
    };
}

pub(crate) use indirect_graphics_depth_pass;

// For fullscreen passes into an offscreen target
#[macro_export]
macro_rules! indirect_graphics_nodepth_pass {
    ( $source: expr, $formats: expr, $blend: expr ) => {
        crate::renderer::render_job::RenderPassDescriptor {
            source: $source,
            push_constant_ranges: &[],
            targets: Some(
                &$formats
                    .iter()
                    .map(|f| wgpu::ColorTargetState {
                        format: *f,
                        blend: $blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })
                    .collect::<Vec<wgpu::ColorTargetState>>(),
            ),
            surface_blend: wgpu::BlendState::REPLACE,
            primitive_state: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil_state: None,
            multisample_state: wgpu::MultisampleState::default(),
            multiview: None,
        }
    };
}

pub(crate) use indirect_graphics_nodepth_pass;

// For directly drawing to the surface, overwriting it unless a blend is given
#[macro_export]
macro_rules! direct_graphics_nodepth_pass {
    ( $source: expr ) => {
        $crate::direct_graphics_nodepth_pass!($source, wgpu::BlendState::REPLACE)
    };
    ( $source: expr, $blend: expr ) => {
        crate::renderer::render_job::RenderPassDescriptor {
            source: $source,
            push_constant_ranges: &[],
            targets: None,
            surface_blend: $blend,
            primitive_state: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil_state: None,
            multisample_state: wgpu::MultisampleState::default(),
            multiview: None,
        }
    };
}

pub(crate) use direct_graphics_nodepth_pass;
