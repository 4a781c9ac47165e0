use glam::{UVec2, Vec2, Vec3};
use tracing::warn;
use winit::dpi::PhysicalSize;

use super::technique::*;
use super::util::ColorUniform;
use super::{Drawable, RenderContext};
use crate::error::ShaderError;
use crate::renderer::*;
use crate::resources::glyph_cache::GlyphCache;
use crate::resources::primitives::MeshData;
use crate::resources::*;
use crate::ui::layout::layout_spans;
use crate::ui::markup::Span;

const POINT_SIZE: f32 = 22.0;
const PADDING: f32 = 14.0;
const MARGIN: f32 = 24.0;
const MAX_TEXT_WIDTH: f32 = 640.0;

const PANEL_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.6];
const TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const LINK_COLOR: [f32; 4] = [0.55, 0.75, 1.0, 1.0];

// Panel around a block of text, centered horizontally near the top edge.
fn panel_rect(text_size: Vec2, surface: Vec2) -> (Vec2, Vec2) {
    let size = text_size + Vec2::splat(2.0 * PADDING);
    let min = Vec2::new(((surface.x - size.x) / 2.0).max(0.0), MARGIN);
    (min, min + size)
}

fn text_width_limit(surface: Vec2) -> f32 {
    (surface.x - 2.0 * (MARGIN + PADDING))
        .min(MAX_TEXT_WIDTH)
        .max(POINT_SIZE)
}

/*
 * The waypoint message box: a translucent panel with the message on top, links
 * in their own color. Geometry is rebuilt whenever the message or the surface
 * size changes. Without a usable system font nothing is drawn.
 */
pub struct MessageDrawable {
    glyphs: Option<GlyphCache>,
    atlas: wgpu::Texture,
    spans: Vec<Span>,
    layers: Vec<UiLayerTechnique>,
}

impl MessageDrawable {
    pub fn new(renderer: &Renderer) -> Self {
        let glyphs = match GlyphCache::system_sans_serif(POINT_SIZE) {
            Ok(glyphs) => Some(glyphs),
            Err(err) => {
                warn!("messages only go to the window title: {}", err);
                None
            }
        };

        let atlas_size = glyphs
            .as_ref()
            .map_or(UVec2::ONE, |glyphs| glyphs.atlas().size());
        let atlas = renderer.create_texture2d(
            "glyph_atlas",
            PhysicalSize::new(atlas_size.x, atlas_size.y),
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );

        Self {
            glyphs,
            atlas,
            spans: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn set_message(
        &mut self,
        renderer: &Renderer,
        resources: &mut ResourceManager,
        spans: Vec<Span>,
    ) {
        self.spans = spans;
        self.rebuild(renderer, resources);
    }

    pub fn rebuild(&mut self, renderer: &Renderer, resources: &mut ResourceManager) {
        for layer in self.layers.drain(..) {
            resources.meshes.remove(&layer.mesh());
        }

        let glyphs = match self.glyphs.as_mut() {
            Some(glyphs) => glyphs,
            None => return,
        };
        if self.spans.is_empty() {
            return;
        }

        let surface_size = renderer.surface_size();
        let surface = Vec2::new(surface_size.width as f32, surface_size.height as f32);
        let line_height = glyphs.line_height();
        let layout = layout_spans(
            &self.spans,
            text_width_limit(surface),
            line_height,
            |character| glyphs.advance(character),
        );

        let panel = panel_rect(layout.size, surface);
        let text_origin = panel.0 + Vec2::splat(PADDING);
        let atlas_size = glyphs.atlas().size().as_vec2();
        let solid = glyphs.atlas().solid_uv();

        let mut panel_mesh = MeshData::default();
        ui_layer::push_quad(&mut panel_mesh, panel, (solid, solid), surface);

        let mut text_mesh = MeshData::default();
        let mut link_mesh = MeshData::default();
        for placed in layout.chars.iter() {
            let glyph = match glyphs.glyph(placed.character) {
                Some(glyph) if glyph.size != UVec2::ZERO => glyph,
                _ => continue,
            };

            let baseline = text_origin + placed.pen + Vec2::new(0.0, glyphs.ascent());
            let min = (baseline + glyph.bearing).round();
            let uv_min = glyph.atlas_offset.as_vec2() / atlas_size;
            let uv_max = (glyph.atlas_offset + glyph.size).as_vec2() / atlas_size;
            let mesh = if placed.link {
                &mut link_mesh
            } else {
                &mut text_mesh
            };
            ui_layer::push_quad(
                mesh,
                (min, min + glyph.size.as_vec2()),
                (uv_min, uv_max),
                surface,
            );
        }

        if glyphs.take_dirty() {
            let size = glyphs.atlas().size();
            renderer.write_texture2d(
                &self.atlas,
                PhysicalSize::new(size.x, size.y),
                glyphs.atlas().pixels(),
            );
        }

        for (mesh, color) in [
            (panel_mesh, PANEL_COLOR),
            (text_mesh, TEXT_COLOR),
            (link_mesh, LINK_COLOR),
        ] {
            if mesh.indices.is_empty() {
                continue;
            }
            let handle = resources.upload_mesh(renderer, "message", &mesh);
            let color = ColorUniform::new(Vec3::from_slice(&color), color[3]);
            self.layers.push(UiLayerTechnique::new(
                renderer,
                resources,
                &self.atlas,
                handle,
                color,
            ));
        }
    }
}

impl Drawable for MessageDrawable {
    fn register(renderer: &mut Renderer) -> Result<(), ShaderError> {
        UiLayerTechnique::register(renderer)
    }

    fn render_items<'a>(&'a self, context: &RenderContext<'a>, job: &mut RenderJob<'a>) {
        for layer in self.layers.iter() {
            job.add_item(layer.render_item(context));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_hangs_centered_from_the_top() {
        let (min, max) = panel_rect(Vec2::new(200.0, 30.0), Vec2::new(1280.0, 720.0));

        assert_eq!(min, Vec2::new(526.0, MARGIN));
        assert_eq!(max, Vec2::new(754.0, MARGIN + 58.0));
    }

    #[test]
    fn test_panel_never_starts_off_screen() {
        let (min, _) = panel_rect(Vec2::new(500.0, 30.0), Vec2::new(300.0, 200.0));
        assert_eq!(min.x, 0.0);
    }

    #[test]
    fn test_text_width_follows_the_window() {
        assert_eq!(text_width_limit(Vec2::new(1920.0, 1080.0)), MAX_TEXT_WIDTH);
        assert_eq!(text_width_limit(Vec2::new(400.0, 300.0)), 324.0);
        assert_eq!(text_width_limit(Vec2::new(50.0, 50.0)), POINT_SIZE);
    }
}
