use std::f32::consts::FRAC_PI_2;

use glam::Mat4;

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

// A long flat strip of procedural asphalt, lying in the XZ plane
pub struct RoadTechnique {
    plane_handle: StaticMeshHandle,
    xforms: TransformUniform<2>,
}

impl RoadTechnique {
    pub fn new(renderer: &Renderer, resources: &mut ResourceManager) -> Self {
        Self {
            plane_handle: resources.upload_mesh(
                renderer,
                "road",
                &primitives::plane(300.0, 20.0, 1, 1),
            ),
            xforms: TransformUniform::new(renderer, Self::PASS_NAME, 0),
        }
    }

    pub fn update(&self, renderer: &Renderer, context: &RenderContext) {
        self.xforms.update(
            renderer,
            &[context.view_proj(), Mat4::from_rotation_x(-FRAC_PI_2)],
        );
    }
}

impl Technique for RoadTechnique {
    const PASS_NAME: &'static str = "road";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::indirect_graphics_depth_pass!(
                &shaders::ROAD,
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
            &context.resources.meshes[&self.plane_handle],
            vec![&self.xforms.bind_group],
        )
    }
}
