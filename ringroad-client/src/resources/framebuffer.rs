use winit::dpi::PhysicalSize;

use crate::renderer::{FramebufferDescriptor, Renderer};

use super::{ResourceManager, TextureHandle};

/*
 * Offscreen framebuffers. The backing textures live in the resource manager so
 * later passes can sample them; the renderer only keeps the views it draws into.
 * Registering a name again (on resize) replaces the old textures.
 */
impl ResourceManager {
    fn create_framebuffer_textures(
        &mut self,
        name: &str,
        renderer: &mut Renderer,
        size: PhysicalSize<u32>,
        formats: &[wgpu::TextureFormat],
        clear_color: Option<wgpu::Color>,
        with_depth: bool,
    ) -> Vec<TextureHandle> {
        let usages = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        let color_textures: Vec<wgpu::Texture> = formats
            .iter()
            .enumerate()
            .map(|(idx, format)| {
                renderer.create_texture2d(
                    format!("{}_tex_{}", name, idx).as_str(),
                    size,
                    *format,
                    usages,
                )
            })
            .collect();

        let depth_texture = with_depth.then(|| {
            renderer.create_texture2d(
                format!("{}_tex_depth", name).as_str(),
                size,
                Renderer::DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
        });

        let desc = FramebufferDescriptor {
            color_attachments: color_textures
                .iter()
                .map(|tex| tex.create_view(&wgpu::TextureViewDescriptor::default()))
                .collect(),
            depth_stencil_attachment: depth_texture
                .as_ref()
                .map(|tex| tex.create_view(&wgpu::TextureViewDescriptor::default())),
            clear_color,
            clear_depth: with_depth,
        };
        renderer.register_framebuffer(name, desc);

        // depth goes last so color indices line up with attachment indices
        let handles: Vec<TextureHandle> = color_textures
            .into_iter()
            .chain(depth_texture.into_iter())
            .map(|tex| self.register_texture(tex))
            .collect();

        handles
    }

    fn replace_framebuffer(&mut self, name: &str, handles: Vec<TextureHandle>) {
        if let Some(old_handles) = self.framebuffers.insert(name.to_string(), handles) {
            for handle in old_handles {
                self.textures.remove(&handle);
            }
        }
    }

    pub fn register_framebuffer(
        &mut self,
        name: &str,
        renderer: &mut Renderer,
        size: PhysicalSize<u32>,
        formats: &[wgpu::TextureFormat],
        clear_color: Option<wgpu::Color>,
    ) {
        let handles =
            self.create_framebuffer_textures(name, renderer, size, formats, clear_color, false);
        self.replace_framebuffer(name, handles);
    }

    pub fn register_depth_surface_framebuffer(
        &mut self,
        name: &str,
        renderer: &mut Renderer,
        formats: &[wgpu::TextureFormat],
        clear_color: Option<wgpu::Color>,
    ) {
        let surface_size = renderer.surface_size();
        let handles = self.create_framebuffer_textures(
            name,
            renderer,
            surface_size,
            formats,
            clear_color,
            true,
        );
        self.replace_framebuffer(name, handles);
    }

    pub fn framebuffer_tex(&self, name: &str, index: usize) -> Option<&wgpu::Texture> {
        let handle = self.framebuffers.get(name)?.get(index)?;
        self.textures.get(handle)
    }
}

// Framebuffer size at 1/`divisor` of the surface, never collapsing to zero
pub fn scaled_size(size: PhysicalSize<u32>, divisor: u32) -> PhysicalSize<u32> {
    PhysicalSize::new((size.width / divisor).max(1), (size.height / divisor).max(1))
}
