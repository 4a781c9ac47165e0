use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use tracing::debug;
use wgpu::util::DeviceExt;

pub mod framebuffer;
pub mod glyph_cache;
pub mod material;
pub mod model;
pub mod primitives;
pub mod static_mesh;

use material::*;
use model::{MaterialData, ModelData};
use primitives::MeshData;
use static_mesh::*;

use crate::renderer::Renderer;

// This file has the ResourceManager, which owns GPU resources and hands out handles to them

/*
 * Techniques refer to meshes, materials and textures by handle rather than by reference,
 * so the resource manager can keep owning them while render items borrow them each frame.
 */

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct TextureHandle(usize);
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MaterialHandle(usize);
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct StaticMeshHandle(usize);

pub trait Handle {
    fn unique() -> Self;
}

impl Handle for TextureHandle {
    fn unique() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Handle for MaterialHandle {
    fn unique() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Handle for StaticMeshHandle {
    fn unique() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

// One drawable piece of an uploaded model
pub struct ModelPart {
    pub mesh: StaticMeshHandle,
    pub material: MaterialHandle,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialFactors {
    base_color: [f32; 4],
}

#[derive(Default)]
pub struct ResourceManager {
    pub framebuffers: HashMap<String, Vec<TextureHandle>>,
    pub textures: HashMap<TextureHandle, wgpu::Texture>,
    pub materials: HashMap<MaterialHandle, Material>,
    pub meshes: HashMap<StaticMeshHandle, StaticMesh>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    // shorthand for registering a texture
    pub fn register_texture(&mut self, texture: wgpu::Texture) -> TextureHandle {
        let handle = TextureHandle::unique();
        self.textures.insert(handle, texture);
        handle
    }

    pub fn register_material(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle::unique();
        self.materials.insert(handle, material);
        handle
    }

    pub fn upload_mesh(
        &mut self,
        renderer: &Renderer,
        label: &str,
        mesh: &MeshData,
    ) -> StaticMeshHandle {
        let static_mesh = MeshBuilder::new(renderer, Some(label))
            .mesh_data(mesh)
            .produce_static_mesh();

        let mesh_handle = StaticMeshHandle::unique();
        self.meshes.insert(mesh_handle, static_mesh);
        mesh_handle
    }

    // Fullscreen quad in clip space, for post processing
    pub fn create_quad_mesh(&mut self, renderer: &Renderer) -> StaticMeshHandle {
        self.upload_mesh(renderer, "quad", &primitives::plane(2.0, 2.0, 1, 1))
    }

    /*
     * The GPU half of gltf loading: uploads what model::read_gltf produced. Must run on
     * the thread that owns the renderer. The pass named by `pass_name` needs the base
     * color texture, sampler and factor at group 1, bindings 0, 1 and 2.
     */
    pub fn upload_model(
        &mut self,
        renderer: &Renderer,
        pass_name: &str,
        model: &ModelData,
    ) -> Vec<ModelPart> {
        let image_textures: Vec<TextureHandle> = model
            .images
            .iter()
            .enumerate()
            .map(|(idx, img)| {
                let texture = renderer.create_texture2d_init(
                    format!("model_tex_{}", idx).as_str(),
                    winit::dpi::PhysicalSize::new(img.width, img.height),
                    wgpu::TextureFormat::Rgba8UnormSrgb,
                    wgpu::TextureUsages::TEXTURE_BINDING,
                    &img.rgba,
                );
                self.register_texture(texture)
            })
            .collect();

        let mut material_handles = HashMap::<usize, MaterialHandle>::new();
        let mut parts = Vec::new();

        for (prim_idx, primitive) in model.primitives.iter().enumerate() {
            let material_handle = match primitive.material {
                Some(material_idx) => match material_handles.get(&material_idx) {
                    Some(handle) => *handle,
                    None => {
                        let handle = self.import_material(
                            renderer,
                            pass_name,
                            &image_textures,
                            &model.materials[material_idx],
                        );
                        material_handles.insert(material_idx, handle);
                        handle
                    }
                },
                None => {
                    debug!("primitive {} has no material, using plain white", prim_idx);
                    self.import_material(
                        renderer,
                        pass_name,
                        &image_textures,
                        &MaterialData {
                            name: None,
                            base_color_factor: [1.0; 4],
                            base_color_image: None,
                        },
                    )
                }
            };

            let mesh_handle = self.upload_mesh(
                renderer,
                format!("model_prim_{}", prim_idx).as_str(),
                &primitive.mesh,
            );
            parts.push(ModelPart {
                mesh: mesh_handle,
                material: material_handle,
            });
        }

        parts
    }

    fn import_material(
        &mut self,
        renderer: &Renderer,
        pass_name: &str,
        images: &[TextureHandle],
        material: &MaterialData,
    ) -> MaterialHandle {
        let image_texture = material
            .base_color_image
            .and_then(|idx| images.get(idx))
            .and_then(|handle| self.textures.get(handle));

        // without a texture the factor alone gives the color
        let base_color_view = match image_texture {
            Some(texture) => texture.create_view(&wgpu::TextureViewDescriptor::default()),
            None => {
                let white = renderer.create_texture2d_init(
                    material.name.as_deref().unwrap_or("unnamed"),
                    winit::dpi::PhysicalSize::new(1, 1),
                    wgpu::TextureFormat::Rgba8UnormSrgb,
                    wgpu::TextureUsages::TEXTURE_BINDING,
                    &[255, 255, 255, 255],
                );
                let view = white.create_view(&wgpu::TextureViewDescriptor::default());
                self.register_texture(white);
                view
            }
        };

        let factors_buf = renderer
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("material_factors"),
                contents: bytemuck::bytes_of(&MaterialFactors {
                    base_color: material.base_color_factor,
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let sampler = renderer.device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let material = MaterialBuilder::new(renderer, self, pass_name)
            .texture_resource(1, 0, base_color_view)
            .sampler_resource(1, 1, sampler)
            .buffer_resource(1, 2, factors_buf)
            .produce();

        self.register_material(material)
    }
}
