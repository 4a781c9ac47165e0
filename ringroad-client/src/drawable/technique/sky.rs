use glam::{Mat4, Vec3};

use super::RenderContext;
use super::Technique;
use crate::assets::shaders;
use crate::drawable::util::TransformUniform;
use crate::drawable::{mesh_item, SCENE_FRAMEBUFFER};
use crate::error::ShaderError;
use crate::renderer::render_job::RenderItem;
use crate::renderer::util;
use crate::renderer::Renderer;
use crate::resources::primitives;
use crate::resources::{ResourceManager, StaticMeshHandle};

mod sky_technique {
    use crate::drawable::util::TransformUniform;
    use once_cell::sync::OnceCell;

    pub static XFORMS: OnceCell<TransformUniform<2>> = OnceCell::new();
}

/*
 * A big gradient backdrop behind the track. It ignores and never writes depth,
 * so it has to be drawn before everything else in the scene framebuffer.
 */
pub struct SkyTechnique {
    plane_handle: StaticMeshHandle,
    xforms: &'static TransformUniform<2>,
}

impl SkyTechnique {
    pub fn new(renderer: &Renderer, resources: &mut ResourceManager) -> Self {
        let plane_handle =
            resources.upload_mesh(renderer, "sky", &primitives::plane(300.0, 60.0, 1, 1));
        let xforms = sky_technique::XFORMS
            .get_or_init(|| TransformUniform::new(renderer, Self::PASS_NAME, 0));

        Self {
            plane_handle,
            xforms,
        }
    }

    fn model() -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 20.0, -40.0))
    }
}

impl Technique for SkyTechnique {
    const PASS_NAME: &'static str = "sky";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::indirect_graphics_depth_pass!(
                &shaders::SKY,
                [Renderer::SCENE_FORMAT],
                Some(wgpu::BlendState::REPLACE),
                false,
                wgpu::CompareFunction::Always
            ),
        )
    }

    fn update_once(renderer: &Renderer, context: &RenderContext) {
        if let Some(xforms) = sky_technique::XFORMS.get() {
            xforms.update(renderer, &[context.view_proj(), Self::model()]);
        }
    }

    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> RenderItem<'a> {
        mesh_item(
            Self::PASS_NAME,
            SCENE_FRAMEBUFFER,
            &context.resources.meshes[&self.plane_handle],
            vec![&self.xforms.bind_group],
        )
    }
}
