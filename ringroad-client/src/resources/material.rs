use std::collections::{BTreeMap, HashMap};

use crate::renderer::Renderer;

use super::ResourceManager;

/*
 * A material encapsulates the render pass it should be a part of and the resources it should bind.
 */
pub struct Material {
    pub pass_name: String,
    bind_groups: BTreeMap<u32, wgpu::BindGroup>,
    // kept alive for the bind groups
    _buffers: Vec<wgpu::Buffer>,
    _textures: Vec<wgpu::TextureView>,
    _samplers: Vec<wgpu::Sampler>,
}

impl Material {
    // in group order
    pub fn bind_groups(&self) -> Vec<&wgpu::BindGroup> {
        self.bind_groups.values().collect()
    }
}

enum MatResourceIdx {
    Buffer(usize),
    Texture(usize),
    Sampler(usize),
}

// Helper struct for building materials
pub struct MaterialBuilder<'a> {
    pass_name: &'a str,
    renderer: &'a Renderer,
    resources: &'a ResourceManager,
    bind_group_resources: BTreeMap<u32, HashMap<u32, MatResourceIdx>>,

    buffers: Vec<wgpu::Buffer>,
    textures: Vec<wgpu::TextureView>,
    samplers: Vec<wgpu::Sampler>,
}

impl<'a> MaterialBuilder<'a> {
    pub fn new(renderer: &'a Renderer, resources: &'a ResourceManager, pass_name: &'a str) -> Self {
        MaterialBuilder {
            pass_name,
            renderer,
            resources,
            bind_group_resources: BTreeMap::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
            samplers: Vec::new(),
        }
    }

    pub fn buffer_resource(&mut self, group: u32, binding: u32, buffer: wgpu::Buffer) -> &mut Self {
        self.buffers.push(buffer);

        self.bind_group_resources
            .entry(group)
            .or_default()
            .insert(binding, MatResourceIdx::Buffer(self.buffers.len() - 1));
        self
    }

    pub fn texture_resource(
        &mut self,
        group: u32,
        binding: u32,
        texture: wgpu::TextureView,
    ) -> &mut Self {
        self.textures.push(texture);

        self.bind_group_resources
            .entry(group)
            .or_default()
            .insert(binding, MatResourceIdx::Texture(self.textures.len() - 1));
        self
    }

    /// Binds color attachment `index` of a framebuffer registered with the resource manager.
    /// Panics if there is no such framebuffer.
    pub fn framebuffer_texture_resource(
        &mut self,
        group: u32,
        binding: u32,
        framebuffer_name: &str,
        index: usize,
    ) -> &mut Self {
        let view = self.resources.framebuffer_tex(framebuffer_name, index).map_or_else(
            || panic!("no framebuffer texture {}[{}]", framebuffer_name, index),
            |tex| tex.create_view(&wgpu::TextureViewDescriptor::default()),
        );
        self.texture_resource(group, binding, view)
    }

    pub fn sampler_resource(
        &mut self,
        group: u32,
        binding: u32,
        sampler: wgpu::Sampler,
    ) -> &mut Self {
        self.samplers.push(sampler);

        self.bind_group_resources
            .entry(group)
            .or_default()
            .insert(binding, MatResourceIdx::Sampler(self.samplers.len() - 1));
        self
    }

    pub fn produce(&mut self) -> Material {
        let lookup_binding_resource =
            |(binding, resource_idx): (&u32, &MatResourceIdx)| match resource_idx {
                MatResourceIdx::Buffer(idx) => (*binding, self.buffers[*idx].as_entire_binding()),
                MatResourceIdx::Texture(idx) => (
                    *binding,
                    wgpu::BindingResource::TextureView(&self.textures[*idx]),
                ),
                MatResourceIdx::Sampler(idx) => (
                    *binding,
                    wgpu::BindingResource::Sampler(&self.samplers[*idx]),
                ),
            };

        let create_bind_group = |(group, resource_map): (&u32, &HashMap<u32, MatResourceIdx>)| {
            let binding_resources = resource_map
                .iter()
                .map(lookup_binding_resource)
                .collect::<Vec<(u32, wgpu::BindingResource)>>();
            (
                *group,
                self.renderer
                    .create_bind_group(self.pass_name, *group, &binding_resources),
            )
        };

        let bind_groups = self
            .bind_group_resources
            .iter()
            .map(create_bind_group)
            .collect::<BTreeMap<u32, wgpu::BindGroup>>();

        Material {
            pass_name: String::from(self.pass_name),
            bind_groups,
            _buffers: std::mem::take(&mut self.buffers),
            _textures: std::mem::take(&mut self.textures),
            _samplers: std::mem::take(&mut self.samplers),
        }
    }
}

pub fn linear_clamp_sampler(renderer: &Renderer) -> wgpu::Sampler {
    renderer.device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
