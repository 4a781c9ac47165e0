use glam::{Mat4, Vec3};

use super::RenderContext;
use super::Technique;
use crate::assets::shaders;
use crate::drawable::util::{ColorUniform, StructUniform, TransformUniform};
use crate::drawable::{mesh_item, SCENE_FRAMEBUFFER};
use crate::error::ShaderError;
use crate::renderer::render_job::RenderItem;
use crate::renderer::util;
use crate::renderer::Renderer;
use crate::resources::StaticMeshHandle;

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/*
 * Translucent additive blob, used for the tail lights. Depth tested but never
 * written, so glows must be drawn after the opaque parts of the scene.
 */
pub struct GlowTechnique {
    static_mesh: StaticMeshHandle,
    xforms: TransformUniform<2>,
    color: StructUniform<ColorUniform>,
}

impl GlowTechnique {
    pub fn new(
        renderer: &Renderer,
        static_mesh: StaticMeshHandle,
        color: Vec3,
        opacity: f32,
    ) -> Self {
        Self {
            static_mesh,
            xforms: TransformUniform::new(renderer, Self::PASS_NAME, 0),
            color: StructUniform::new(
                renderer,
                Self::PASS_NAME,
                1,
                &ColorUniform::new(color, opacity),
            ),
        }
    }

    pub fn update_model(&self, renderer: &Renderer, view_proj: Mat4, model: Mat4) {
        self.xforms.update(renderer, &[view_proj, model]);
    }
}

impl Technique for GlowTechnique {
    const PASS_NAME: &'static str = "glow";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::indirect_graphics_depth_pass!(
                &shaders::GLOW,
                [Renderer::SCENE_FORMAT],
                Some(ADDITIVE),
                false,
                wgpu::CompareFunction::Less
            ),
        )
    }

    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> RenderItem<'a> {
        mesh_item(
            Self::PASS_NAME,
            SCENE_FRAMEBUFFER,
            &context.resources.meshes[&self.static_mesh],
            vec![&self.xforms.bind_group, &self.color.bind_group],
        )
    }
}
