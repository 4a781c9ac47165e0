pub mod message;
pub mod technique;
pub mod util;

use glam::{Mat4, Vec3};

use crate::error::ShaderError;
use crate::renderer::*;
use crate::resources::static_mesh::StaticMesh;
use crate::resources::*;
use technique::*;

pub use message::MessageDrawable;

pub const SCENE_FRAMEBUFFER: &str = "scene";
pub const BLOOM_BRIGHT_FRAMEBUFFER: &str = "bloom_bright";
pub const BLOOM_BLUR_DOWN_FRAMEBUFFER: &str = "bloom_blur_down";
pub const BLOOM_BLUR_UP_FRAMEBUFFER: &str = "bloom_blur_up";

pub struct RenderContext<'a> {
    pub resources: &'a ResourceManager,
    pub view: Mat4,
    pub proj: Mat4,
}

impl<'a> RenderContext<'a> {
    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }
}

pub fn mesh_item<'a>(
    pass_name: &'a str,
    framebuffer_name: &str,
    static_mesh: &'a StaticMesh,
    bind_group: Vec<&'a wgpu::BindGroup>,
) -> RenderItem<'a> {
    RenderItem {
        pass_name,
        framebuffer_name: framebuffer_name.to_string(),
        num_elements: static_mesh.num_elements(0),
        vertex_buffers: static_mesh.vertex_buffer_slices(0),
        index_buffer: static_mesh.index_buffer_slice(0),
        index_format: static_mesh.index_format,
        bind_group,
    }
}

/*
 * A drawable adds the render items for one thing in the scene to the frame's job,
 * possibly spanning several techniques.
 */
pub trait Drawable {
    fn register(renderer: &mut Renderer) -> Result<(), ShaderError>;
    fn render_items<'a>(&'a self, context: &RenderContext<'a>, job: &mut RenderJob<'a>);
}

/*
 * The car: every primitive of the imported model plus two glowing tail lights
 * that follow the body. Opaque parts go first so the additive lights can depth
 * test against them.
 */
pub struct CarDrawable {
    parts: Vec<LitMeshTechnique>,
    taillights: Vec<(Mat4, GlowTechnique)>,
}

impl CarDrawable {
    const TAILLIGHT_COLOR: [f32; 3] = [1.0, 42.0 / 255.0, 42.0 / 255.0];
    const TAILLIGHT_OPACITY: f32 = 0.25;
    const TAILLIGHT_OFFSETS: [[f32; 3]; 2] = [[0.54, 0.66, -2.05], [-0.54, 0.66, -2.05]];

    pub fn new(
        renderer: &Renderer,
        resources: &mut ResourceManager,
        model_parts: &[ModelPart],
    ) -> Self {
        let parts = model_parts
            .iter()
            .map(|part| LitMeshTechnique::new(renderer, part.material, part.mesh))
            .collect();

        let light_mesh = resources.upload_mesh(
            renderer,
            "taillight",
            &primitives::sphere(0.1, 24, 24),
        );
        let taillights = Self::TAILLIGHT_OFFSETS
            .iter()
            .map(|offset| {
                (
                    Mat4::from_translation(Vec3::from(*offset)),
                    GlowTechnique::new(
                        renderer,
                        light_mesh,
                        Vec3::from(Self::TAILLIGHT_COLOR),
                        Self::TAILLIGHT_OPACITY,
                    ),
                )
            })
            .collect();

        Self { parts, taillights }
    }

    pub fn update_model(&self, renderer: &Renderer, view_proj: Mat4, model: Mat4) {
        for part in self.parts.iter() {
            part.update_model(renderer, view_proj, model);
        }
        for (offset, light) in self.taillights.iter() {
            light.update_model(renderer, view_proj, model * *offset);
        }
    }
}

impl Drawable for CarDrawable {
    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        LitMeshTechnique::register(renderer)?;
        GlowTechnique::register(renderer)
    }

    fn render_items<'a>(&'a self, context: &RenderContext<'a>, job: &mut RenderJob<'a>) {
        for part in self.parts.iter() {
            job.add_item(part.render_item(context));
        }
        for (_, light) in self.taillights.iter() {
            job.add_item(light.render_item(context));
        }
    }
}

// The post processing chain that ends on the surface
pub struct BloomDrawable {
    bright: BloomBrightTechnique,
    blur_down: KawaseBlurDownTechnique,
    blur_up: KawaseBlurUpTechnique,
    composite: CompositeBloomTechnique,
}

pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl BloomDrawable {
    pub fn new(
        renderer: &Renderer,
        resources: &ResourceManager,
        quad_handle: StaticMeshHandle,
        settings: &BloomSettings,
    ) -> Self {
        Self {
            bright: BloomBrightTechnique::new(renderer, resources, quad_handle, settings.threshold),
            blur_down: KawaseBlurDownTechnique::new(renderer, resources, quad_handle),
            blur_up: KawaseBlurUpTechnique::new(renderer, resources, quad_handle, settings.radius),
            composite: CompositeBloomTechnique::new(
                renderer,
                resources,
                quad_handle,
                settings.strength,
            ),
        }
    }
}

impl Drawable for BloomDrawable {
    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        BloomBrightTechnique::register(renderer)?;
        KawaseBlurDownTechnique::register(renderer)?;
        KawaseBlurUpTechnique::register(renderer)?;
        CompositeBloomTechnique::register(renderer)
    }

    fn render_items<'a>(&'a self, context: &RenderContext<'a>, job: &mut RenderJob<'a>) {
        job.add_item(self.bright.render_item(context));
        job.add_item(self.blur_down.render_item(context));
        job.add_item(self.blur_up.render_item(context));
        job.add_item(self.composite.render_item(context));
    }
}
