use glam::Vec2;
use wgpu::util::DeviceExt;

use super::RenderContext;
use super::Technique;
use crate::assets::shaders;
use crate::drawable::mesh_item;
use crate::drawable::util::ColorUniform;
use crate::error::ShaderError;
use crate::renderer::render_job::RenderItem;
use crate::renderer::util;
use crate::renderer::Renderer;
use crate::resources::material::{linear_clamp_sampler, Material, MaterialBuilder};
use crate::resources::primitives::MeshData;
use crate::resources::{ResourceManager, StaticMeshHandle};

/// Appends a screen aligned rectangle given in pixels (origin top left, y down)
/// to a mesh, converting it to clip space for a surface of `surface` pixels.
pub fn push_quad(
    mesh: &mut MeshData,
    (min, max): (Vec2, Vec2),
    (uv_min, uv_max): (Vec2, Vec2),
    surface: Vec2,
) {
    let to_clip = |pixel: Vec2| {
        let ndc = pixel / surface * 2.0 - 1.0;
        [ndc.x, -ndc.y, 0.0]
    };

    let first = mesh.positions.len() as u32;
    for (x, y, u, v) in [
        (min.x, min.y, uv_min.x, uv_min.y),
        (max.x, min.y, uv_max.x, uv_min.y),
        (max.x, max.y, uv_max.x, uv_max.y),
        (min.x, max.y, uv_min.x, uv_max.y),
    ] {
        mesh.positions.push(to_clip(Vec2::new(x, y)));
        mesh.normals.push([0.0, 0.0, 1.0]);
        mesh.uvs.push([u, v]);
    }
    mesh.indices
        .extend([0, 2, 1, 0, 3, 2].iter().map(|idx| first + idx));
}

/*
 * Flat 2D geometry drawn over the finished frame, tinted by one color and
 * masked by the alpha of a texture (the glyph atlas). Blends with whatever is
 * already on the surface.
 */
pub struct UiLayerTechnique {
    mesh: StaticMeshHandle,
    material: Material,
}

impl UiLayerTechnique {
    pub fn new(
        renderer: &Renderer,
        resources: &ResourceManager,
        texture: &wgpu::Texture,
        mesh: StaticMeshHandle,
        color: ColorUniform,
    ) -> Self {
        let tint = renderer
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("ui_tint"),
                contents: bytemuck::cast_slice(&[color]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let material = MaterialBuilder::new(renderer, resources, Self::PASS_NAME)
            .texture_resource(
                0,
                0,
                texture.create_view(&wgpu::TextureViewDescriptor::default()),
            )
            .sampler_resource(0, 1, linear_clamp_sampler(renderer))
            .buffer_resource(0, 2, tint)
            .produce();

        Self { mesh, material }
    }

    pub fn mesh(&self) -> StaticMeshHandle {
        self.mesh
    }
}

impl Technique for UiLayerTechnique {
    const PASS_NAME: &'static str = "ui";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::direct_graphics_nodepth_pass!(
                &shaders::UI,
                wgpu::BlendState::ALPHA_BLENDING
            ),
        )
    }

    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> RenderItem<'a> {
        mesh_item(
            Self::PASS_NAME,
            Renderer::SURFACE_FRAMEBUFFER,
            &context.resources.meshes[&self.mesh],
            self.material.bind_groups(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_corners_land_in_clip_space() {
        let mut mesh = MeshData::default();
        push_quad(
            &mut mesh,
            (Vec2::ZERO, Vec2::new(200.0, 50.0)),
            (Vec2::ZERO, Vec2::ONE),
            Vec2::new(400.0, 100.0),
        );

        assert_eq!(mesh.positions[0], [-1.0, 1.0, 0.0]);
        assert_eq!(mesh.positions[2], [0.0, 0.0, 0.0]);
        assert_eq!(mesh.uvs[2], [1.0, 1.0]);
        assert_eq!(mesh.indices, vec![0, 2, 1, 0, 3, 2]);
    }

    #[test]
    fn test_later_quads_index_their_own_vertices() {
        let mut mesh = MeshData::default();
        for _ in 0..2 {
            push_quad(
                &mut mesh,
                (Vec2::ZERO, Vec2::ONE),
                (Vec2::ZERO, Vec2::ONE),
                Vec2::splat(10.0),
            );
        }

        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(&mesh.indices[6..], &[4, 6, 5, 4, 7, 6]);
    }
}
