use wgpu::util::DeviceExt;

use super::RenderContext;
use super::Technique;
use crate::assets::shaders;
use crate::drawable::{
    mesh_item, BLOOM_BLUR_DOWN_FRAMEBUFFER, BLOOM_BLUR_UP_FRAMEBUFFER, BLOOM_BRIGHT_FRAMEBUFFER,
    SCENE_FRAMEBUFFER,
};
use crate::error::ShaderError;
use crate::renderer::render_job::RenderItem;
use crate::renderer::util;
use crate::renderer::Renderer;
use crate::resources::material::{linear_clamp_sampler, Material, MaterialBuilder};
use crate::resources::{ResourceManager, StaticMeshHandle};

/*
 * Bloom as a chain of fullscreen passes: keep only the bright parts of the scene,
 * blur them with a dual (kawase) filter down to quarter resolution and back up,
 * then add the result on top of the scene while writing to the surface.
 *
 * Each pass samples framebuffers by texture view, so the materials have to be
 * rebuilt whenever the framebuffers are (on resize).
 */

fn params_buffer(renderer: &Renderer, value: f32) -> wgpu::Buffer {
    renderer
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom_params"),
            contents: bytemuck::cast_slice(&[value, 0.0, 0.0, 0.0]),
            usage: wgpu::BufferUsages::UNIFORM,
        })
}

fn fullscreen_item<'a>(
    pass_name: &'a str,
    framebuffer_name: &str,
    context: &RenderContext<'a>,
    quad_handle: StaticMeshHandle,
    material: &'a Material,
) -> RenderItem<'a> {
    mesh_item(
        pass_name,
        framebuffer_name,
        &context.resources.meshes[&quad_handle],
        material.bind_groups(),
    )
}

pub struct BloomBrightTechnique {
    quad_handle: StaticMeshHandle,
    material: Material,
}

impl BloomBrightTechnique {
    pub fn new(
        renderer: &Renderer,
        resources: &ResourceManager,
        quad_handle: StaticMeshHandle,
        threshold: f32,
    ) -> Self {
        let material = MaterialBuilder::new(renderer, resources, Self::PASS_NAME)
            .framebuffer_texture_resource(0, 0, SCENE_FRAMEBUFFER, 0)
            .sampler_resource(0, 1, linear_clamp_sampler(renderer))
            .buffer_resource(0, 2, params_buffer(renderer, threshold))
            .produce();

        Self {
            quad_handle,
            material,
        }
    }
}

impl Technique for BloomBrightTechnique {
    const PASS_NAME: &'static str = "bloom_bright";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::indirect_graphics_nodepth_pass!(
                &shaders::BLOOM_BRIGHT,
                [Renderer::SCENE_FORMAT],
                Some(wgpu::BlendState::REPLACE)
            ),
        )
    }

    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> RenderItem<'a> {
        fullscreen_item(
            Self::PASS_NAME,
            BLOOM_BRIGHT_FRAMEBUFFER,
            context,
            self.quad_handle,
            &self.material,
        )
    }
}

pub struct KawaseBlurDownTechnique {
    quad_handle: StaticMeshHandle,
    material: Material,
}

impl KawaseBlurDownTechnique {
    pub fn new(
        renderer: &Renderer,
        resources: &ResourceManager,
        quad_handle: StaticMeshHandle,
    ) -> Self {
        let material = MaterialBuilder::new(renderer, resources, Self::PASS_NAME)
            .framebuffer_texture_resource(0, 0, BLOOM_BRIGHT_FRAMEBUFFER, 0)
            .sampler_resource(0, 1, linear_clamp_sampler(renderer))
            .buffer_resource(0, 2, params_buffer(renderer, 1.0))
            .produce();

        Self {
            quad_handle,
            material,
        }
    }
}

impl Technique for KawaseBlurDownTechnique {
    const PASS_NAME: &'static str = "kawase_blur_down";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::indirect_graphics_nodepth_pass!(
                &shaders::KAWASE_BLUR_DOWN,
                [Renderer::SCENE_FORMAT],
                Some(wgpu::BlendState::REPLACE)
            ),
        )
    }

    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> RenderItem<'a> {
        fullscreen_item(
            Self::PASS_NAME,
            BLOOM_BLUR_DOWN_FRAMEBUFFER,
            context,
            self.quad_handle,
            &self.material,
        )
    }
}

pub struct KawaseBlurUpTechnique {
    quad_handle: StaticMeshHandle,
    material: Material,
}

impl KawaseBlurUpTechnique {
    // radius widens the upsample taps
    pub fn new(
        renderer: &Renderer,
        resources: &ResourceManager,
        quad_handle: StaticMeshHandle,
        radius: f32,
    ) -> Self {
        let material = MaterialBuilder::new(renderer, resources, Self::PASS_NAME)
            .framebuffer_texture_resource(0, 0, BLOOM_BLUR_DOWN_FRAMEBUFFER, 0)
            .sampler_resource(0, 1, linear_clamp_sampler(renderer))
            .buffer_resource(0, 2, params_buffer(renderer, radius))
            .produce();

        Self {
            quad_handle,
            material,
        }
    }
}

impl Technique for KawaseBlurUpTechnique {
    const PASS_NAME: &'static str = "kawase_blur_up";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::indirect_graphics_nodepth_pass!(
                &shaders::KAWASE_BLUR_UP,
                [Renderer::SCENE_FORMAT],
                Some(wgpu::BlendState::REPLACE)
            ),
        )
    }

    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> RenderItem<'a> {
        fullscreen_item(
            Self::PASS_NAME,
            BLOOM_BLUR_UP_FRAMEBUFFER,
            context,
            self.quad_handle,
            &self.material,
        )
    }
}

pub struct CompositeBloomTechnique {
    quad_handle: StaticMeshHandle,
    material: Material,
}

impl CompositeBloomTechnique {
    pub fn new(
        renderer: &Renderer,
        resources: &ResourceManager,
        quad_handle: StaticMeshHandle,
        strength: f32,
    ) -> Self {
        let material = MaterialBuilder::new(renderer, resources, Self::PASS_NAME)
            .framebuffer_texture_resource(0, 0, SCENE_FRAMEBUFFER, 0)
            .framebuffer_texture_resource(0, 1, BLOOM_BLUR_UP_FRAMEBUFFER, 0)
            .sampler_resource(0, 2, linear_clamp_sampler(renderer))
            .buffer_resource(0, 3, params_buffer(renderer, strength))
            .produce();

        Self {
            quad_handle,
            material,
        }
    }
}

impl Technique for CompositeBloomTechnique {
    const PASS_NAME: &'static str = "composite_bloom";

    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        renderer.register_pass(
            Self::PASS_NAME,
            &util::direct_graphics_nodepth_pass!(&shaders::COMPOSITE_BLOOM),
        )
    }

    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> RenderItem<'a> {
        fullscreen_item(
            Self::PASS_NAME,
            Renderer::SURFACE_FRAMEBUFFER,
            context,
            self.quad_handle,
            &self.material,
        )
    }
}
