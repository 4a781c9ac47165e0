use std::marker::PhantomData;

use wgpu::util::DeviceExt;

use crate::renderer::Renderer;

pub struct TransformUniform<const NUM_ELEMS: usize> {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl<const NUM_ELEMS: usize> TransformUniform<NUM_ELEMS> {
    pub fn new(renderer: &Renderer, pass_name: &str, group: u32) -> Self {
        let uniform_init = [glam::Mat4::IDENTITY; NUM_ELEMS];
        let xform_buffer = renderer
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("uniform_buf"),
                contents: bytemuck::cast_slice(&uniform_init),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let xform_bind_group =
            renderer.create_bind_group(pass_name, group, &[(0, xform_buffer.as_entire_binding())]);

        TransformUniform {
            buffer: xform_buffer,
            bind_group: xform_bind_group,
        }
    }

    pub fn update(&self, renderer: &Renderer, data: &[glam::Mat4; NUM_ELEMS]) {
        renderer.write_buffer(&self.buffer, data);
    }
}

pub struct StructUniform<T> {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    _x: PhantomData<T>,
}

impl<T: bytemuck::Pod> StructUniform<T> {
    pub fn new(renderer: &Renderer, pass_name: &str, group: u32, init: &T) -> Self {
        let buffer = renderer
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("uniform_buf"),
                contents: bytemuck::bytes_of(init),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group =
            renderer.create_bind_group(pass_name, group, &[(0, buffer.as_entire_binding())]);

        Self {
            buffer,
            bind_group,
            _x: PhantomData,
        }
    }

    pub fn update(&self, renderer: &Renderer, data: &T) {
        renderer.write_buffer(&self.buffer, std::slice::from_ref(data));
    }
}

// rgb plus opacity, one vec4 on the shader side
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColorUniform {
    pub color: [f32; 4],
}

impl ColorUniform {
    pub fn new(color: glam::Vec3, alpha: f32) -> Self {
        Self {
            color: color.extend(alpha).to_array(),
        }
    }
}
