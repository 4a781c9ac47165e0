use glam::{Mat4, Vec3};

use super::RenderContext;
use super::Technique;
use crate::assets::shaders;
use crate::drawable::util::{StructUniform, TransformUniform};
use crate::drawable::{mesh_item, SCENE_FRAMEBUFFER};
use crate::error::ShaderError;
use crate::renderer::render_job::RenderItem;
use crate::renderer::util;
use crate::renderer::Renderer;
use crate::resources::{MaterialHandle, StaticMeshHandle};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub directional: [f32; 4],
    pub direction: [f32; 4],
}

impl Default for LightsUniform {
    // white ambient fill plus a warm orange key light from the front right
    fn default() -> Self {
        let key_color = Vec3::new(1.0, 179.0 / 255.0, 107.0 / 255.0);
        Self {
            ambient: [1.0, 1.0, 1.0, 1.0],
            directional: key_color.extend(2.0).to_array(),
            direction: Vec3::new(5.0, 0.0, 5.0).normalize().extend(0.0).to_array(),
        }
    }
}

mod lit_mesh_technique {
    use super::LightsUniform;
    use crate::drawable::util::StructUniform;
    use once_cell::sync::OnceCell;

    pub static LIGHTS: OnceCell<StructUniform<LightsUniform>> = OnceCell::new();
}

/*
 * Draws one piece of an imported model with its base color material, lit by the
 * shared scene lights. The material must come from ResourceManager::upload_model
 * with this technique's pass name.
 */
pub struct LitMeshTechnique {
    material: MaterialHandle,
    static_mesh: StaticMeshHandle,
    xforms: TransformUniform<2>,
    lights: &'static StructUniform<LightsUniform>,
}

impl LitMeshTechnique {
    pub fn new(
        renderer: &Renderer,
        material: MaterialHandle,
        static_mesh: StaticMeshHandle,
    ) -> Self {
        let lights = lit_mesh_technique::LIGHTS.get_or_init(|| {
            StructUniform::new(renderer, Self::PASS_NAME, 2, &LightsUniform::default())
        });

        Self {
            material,
            static_mesh,
            xforms: TransformUniform::new(renderer, Self::PASS_NAME, 0),
            lights,
        }
    }

    pub fn update_model(&self, renderer: &Renderer, view_proj: Mat4, model: Mat4) {
        self.xforms.update(renderer, &[view_proj, model]);
    }
}

impl Technique for LitMeshTechnique {
    const PASS_NAME: &'static str = "lit_mesh";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::indirect_graphics_depth_pass!(
                &shaders::LIT_MESH,
                [Renderer::SCENE_FORMAT],
                Some(wgpu::BlendState::ALPHA_BLENDING),
                true,
                wgpu::CompareFunction::Less
            ),
        )
    }

    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> RenderItem<'a> {
        let static_mesh = &context.resources.meshes[&self.static_mesh];
        let material = &context.resources.materials[&self.material];

        let mut bind_groups = vec![&self.xforms.bind_group];
        bind_groups.extend(material.bind_groups());
        bind_groups.push(&self.lights.bind_group);

        mesh_item(Self::PASS_NAME, SCENE_FRAMEBUFFER, static_mesh, bind_groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_light_points_at_front_right() {
        let lights = LightsUniform::default();
        let direction = Vec3::from_slice(&lights.direction[..3]);

        assert!((direction.length() - 1.0).abs() < 1e-6);
        assert!(direction.x > 0.0 && direction.z > 0.0);
        assert_eq!(direction.y, 0.0);
        assert_eq!(lights.directional[3], 2.0);
    }
}
