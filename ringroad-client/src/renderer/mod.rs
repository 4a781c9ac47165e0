use std::{
    borrow::Cow,
    collections::HashMap,
    num::NonZeroU32,
    sync::atomic::{AtomicUsize, Ordering},
};

use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

pub mod context;
pub(crate) mod reflection;
pub mod render_job;
pub mod util;

use crate::error::{GraphicsError, ShaderError};
use context::*;
use reflection::shader_metadata;
pub use render_job::*;

/*
 * The renderer handles the state setup and transitions when sending commands to the GPU.
 * A frame is described by a RenderJob: an ordered list of RenderItems, each naming the
 * pass (pipeline) and framebuffer it draws with. The renderer walks the list like this:
 *
 * GPU command                   | RenderItem field  | value
 * ------------------------------------------------------------------------------
 * begin render pass             | framebuffer_name  | "scene"
 *     bind pipeline             | pass_name         | "sky"
 *         bind vertex buffers   | vertex_buffers    | plane positions, uvs
 *         bind index buffer     | index_buffer      | plane indices
 *         bind uniform sets     | bind_group        | view/proj uniform
 *             draw()
 *     bind pipeline             | pass_name         | "road"
 *         ...
 * begin render pass             | framebuffer_name  | "bloom_bright"
 *     ...
 *
 * A new render pass is only begun when the framebuffer changes between neighbouring
 * items, and a pipeline is only re-bound when the pass changes. Buffers and bind groups
 * are bound for every item.
 */

pub struct Renderer {
    context: Context,
    pub device: wgpu::Device,
    queue: wgpu::Queue,
    passes: HashMap<String, RenderPass>,
    framebuffers: HashMap<String, FramebufferDescriptor>,
    bind_group_layouts: HashMap<String, Vec<wgpu::BindGroupLayout>>,
    surface_config: wgpu::SurfaceConfiguration,
}

impl Renderer {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
    pub const SURFACE_FRAMEBUFFER: &'static str = "surface";

    pub fn new(context: Context) -> Result<Self, GraphicsError> {
        let (device, queue) = pollster::block_on(context.adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                features: wgpu::Features::empty(),
                // texture resolution limits from the adapter, so framebuffers can match the window
                limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(context.adapter.limits()),
            },
            None,
        ))?;

        let size = context.window.inner_size();
        let surface_format = context
            .surface
            .get_preferred_format(&context.adapter)
            .ok_or(GraphicsError::IncompatibleSurface)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            // one frame per display refresh
            present_mode: wgpu::PresentMode::Fifo,
        };
        context.surface.configure(&device, &surface_config);

        debug!(
            "configured {}x{} surface with {:?}",
            surface_config.width, surface_config.height, surface_format
        );

        Ok(Renderer {
            context,
            device,
            queue,
            passes: HashMap::new(),
            framebuffers: HashMap::new(),
            bind_group_layouts: HashMap::new(),
            surface_config,
        })
    }

    pub fn set_title(&self, title: &str) {
        self.context.window.set_title(title)
    }

    pub fn register_framebuffer(&mut self, name: &str, framebuffer_desc: FramebufferDescriptor) {
        self.framebuffers
            .insert(String::from(name), framebuffer_desc);
    }

    pub fn register_pass(
        &mut self,
        name: &str,
        render_pass_desc: &RenderPassDescriptor,
    ) -> Result<(), ShaderError> {
        if self.passes.contains_key(name) {
            return Ok(());
        }

        let shader_metadata = shader_metadata(name, render_pass_desc.source)?;
        let shader = self
            .device
            .create_shader_module(&wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(render_pass_desc.source)),
            });

        let bind_group_layouts = shader_metadata
            .bind_group_layouts
            .iter()
            .map(|(group_num, entries)| {
                self.device
                    .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some(format!("{}_bind_group_layout_{}", name, group_num).as_str()),
                        entries,
                    })
            })
            .collect::<Vec<wgpu::BindGroupLayout>>();

        let vertex_buffer_layouts = shader_metadata
            .vertex_attributes
            .iter()
            .map(|attrib| wgpu::VertexBufferLayout {
                array_stride: attrib.format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: std::slice::from_ref(attrib),
            })
            .collect::<Vec<wgpu::VertexBufferLayout>>();

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &bind_group_layouts
                    .iter()
                    .collect::<Vec<&wgpu::BindGroupLayout>>(),
                push_constant_ranges: render_pass_desc.push_constant_ranges,
            });

        let surface_target: &[wgpu::ColorTargetState] = &[wgpu::ColorTargetState {
            format: self.surface_config.format,
            blend: Some(render_pass_desc.surface_blend),
            write_mask: wgpu::ColorWrites::ALL,
        }];
        let target_formats = render_pass_desc.targets.unwrap_or(surface_target);

        let render_pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(name),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &vertex_buffer_layouts,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: target_formats,
                }),
                primitive: render_pass_desc.primitive_state,
                depth_stencil: render_pass_desc.depth_stencil_state.clone(),
                multisample: render_pass_desc.multisample_state,
                multiview: render_pass_desc.multiview,
            });

        self.bind_group_layouts
            .insert(name.to_string(), bind_group_layouts);
        self.passes
            .insert(String::from(name), RenderPass { render_pipeline });

        debug!("registered pass {}", name);
        Ok(())
    }

    /// Panics if `pass_name` was never registered or has no group `group_num`.
    pub fn create_bind_group(
        &self,
        pass_name: &str,
        group_num: u32,
        data: &[(u32, wgpu::BindingResource)],
    ) -> wgpu::BindGroup {
        let bind_group_entries = data
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: resource.clone(),
            })
            .collect::<Vec<wgpu::BindGroupEntry>>();

        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(
                format!(
                    "{}_bind_group_{}",
                    pass_name,
                    COUNTER.fetch_add(1, Ordering::Relaxed)
                )
                .as_str(),
            ),
            layout: &self.bind_group_layouts[pass_name][group_num as usize],
            entries: &bind_group_entries,
        })
    }

    pub fn create_texture2d_init(
        &self,
        name: &str,
        size: PhysicalSize<u32>,
        format: wgpu::TextureFormat,
        usages: wgpu::TextureUsages,
        data: &[u8],
    ) -> wgpu::Texture {
        self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some(name),
                size: wgpu::Extent3d {
                    width: size.width,
                    height: size.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: usages,
            },
            data,
        )
    }

    pub fn create_texture2d(
        &self,
        name: &str,
        size: PhysicalSize<u32>,
        format: wgpu::TextureFormat,
        usages: wgpu::TextureUsages,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: usages,
        })
    }

    /// Overwrites a whole RGBA8 texture.
    pub fn write_texture2d(&self, texture: &wgpu::Texture, size: PhysicalSize<u32>, data: &[u8]) {
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: NonZeroU32::new(4 * size.width),
                rows_per_image: NonZeroU32::new(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn write_buffer<T: bytemuck::Pod>(&self, buffer: &wgpu::Buffer, data: &[T]) {
        self.queue
            .write_buffer(buffer, 0, bytemuck::cast_slice(data));
    }

    fn new_wgpu_render_pass<'a>(
        framebuffer_desc: &'a FramebufferDescriptor,
        encoder: &'a mut wgpu::CommandEncoder,
    ) -> wgpu::RenderPass<'a> {
        let color_attachments = framebuffer_desc
            .color_attachments
            .iter()
            .map(|color_tex_view| wgpu::RenderPassColorAttachment {
                view: color_tex_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: match framebuffer_desc.clear_color {
                        Some(color) => wgpu::LoadOp::Clear(color),
                        None => wgpu::LoadOp::Load,
                    },
                    store: true,
                },
            })
            .collect::<Vec<wgpu::RenderPassColorAttachment>>();

        let depth_stencil_attachment =
            framebuffer_desc
                .depth_stencil_attachment
                .as_ref()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: if framebuffer_desc.clear_depth {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: true,
                    }),
                    stencil_ops: None,
                });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &color_attachments,
            depth_stencil_attachment,
        })
    }

    fn encode_graphics_pass<'a>(
        wgpu_rpass: &mut wgpu::RenderPass<'a>,
        render_pass: &'a RenderPass,
        items: &[RenderItem<'a>],
    ) {
        wgpu_rpass.set_pipeline(&render_pass.render_pipeline);

        for render_item in items.iter() {
            for (idx, buffer) in render_item.vertex_buffers.iter().enumerate() {
                wgpu_rpass.set_vertex_buffer(idx as u32, *buffer);
            }

            if let Some(buffer_slice) = render_item.index_buffer {
                wgpu_rpass.set_index_buffer(buffer_slice, render_item.index_format)
            }

            for (idx, bind_group) in render_item.bind_group.iter().enumerate() {
                wgpu_rpass.set_bind_group(idx as u32, *bind_group, &[]);
            }

            match render_item.index_buffer {
                Some(_) => wgpu_rpass.draw_indexed(0..render_item.num_elements, 0, 0..1),
                None => wgpu_rpass.draw(0..render_item.num_elements, 0..1),
            }
        }
    }

    pub fn render(&mut self, render_job: &RenderJob) -> Result<(), wgpu::SurfaceError> {
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.context
                    .surface
                    .configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        // the swapchain image changes every frame
        self.framebuffers.insert(
            String::from(Self::SURFACE_FRAMEBUFFER),
            FramebufferDescriptor {
                color_attachments: vec![frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default())],
                depth_stencil_attachment: None,
                clear_color: Some(wgpu::Color::TRANSPARENT),
                clear_depth: false,
            },
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        for batch in render_job.framebuffer_batches() {
            let fb_name = batch[0].framebuffer_name.as_str();
            let framebuffer_desc = match self.framebuffers.get(fb_name) {
                Some(desc) => desc,
                None => {
                    warn!("skipping draws into unknown framebuffer {}", fb_name);
                    continue;
                }
            };

            let mut wgpu_rpass = Renderer::new_wgpu_render_pass(framebuffer_desc, &mut encoder);
            for pass_items in render_job::batch_by_key(batch, |item| item.pass_name) {
                match self.passes.get(pass_items[0].pass_name) {
                    Some(render_pass) => {
                        Renderer::encode_graphics_pass(&mut wgpu_rpass, render_pass, pass_items)
                    }
                    None => warn!("skipping draws with unknown pass {}", pass_items[0].pass_name),
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn handle_surface_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }

        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.context
            .surface
            .configure(&self.device, &self.surface_config);
    }

    pub fn surface_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.surface_config.width, self.surface_config.height)
    }
}
