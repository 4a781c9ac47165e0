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

// A flat colored mesh; the waypoint markers
pub struct UnlitTechnique {
    static_mesh: StaticMeshHandle,
    xforms: TransformUniform<2>,
    color: StructUniform<ColorUniform>,
}

impl UnlitTechnique {
    pub fn new(renderer: &Renderer, static_mesh: StaticMeshHandle, color: Vec3) -> Self {
        Self {
            static_mesh,
            xforms: TransformUniform::new(renderer, Self::PASS_NAME, 0),
            color: StructUniform::new(
                renderer,
                Self::PASS_NAME,
                1,
                &ColorUniform::new(color, 1.0),
            ),
        }
    }

    pub fn set_color(&self, renderer: &Renderer, color: Vec3) {
        self.color.update(renderer, &ColorUniform::new(color, 1.0));
    }

    pub fn update_model(&self, renderer: &Renderer, view_proj: Mat4, model: Mat4) {
        self.xforms.update(renderer, &[view_proj, model]);
    }
}

impl Technique for UnlitTechnique {
    const PASS_NAME: &'static str = "unlit";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::indirect_graphics_depth_pass!(
                &shaders::UNLIT,
                [Renderer::SCENE_FORMAT],
                Some(wgpu::BlendState::REPLACE),
                true,
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
