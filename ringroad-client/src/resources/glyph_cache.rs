use std::collections::HashMap;

use font_kit::canvas::{Canvas, Format, RasterizationOptions};
use font_kit::family_name::FamilyName;
use font_kit::font::Font;
use font_kit::hinting::HintingOptions;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use glam::{UVec2, Vec2};
use pathfinder_geometry::transform2d::Transform2F;
use tracing::{info, warn};

use crate::error::AssetError;

// gap between atlas entries so linear filtering never picks up a neighbour
const PADDING: u32 = 1;
const WHITE_BLOCK: u32 = 4;

/*
 * CPU copy of the glyph texture: white RGBA texels whose alpha is the glyph
 * coverage. Glyphs are packed left to right on shelves as tall as the tallest
 * glyph on them. The top left corner holds a solid block for drawing plain
 * rectangles with the same texture.
 */
pub struct GlyphAtlas {
    size: UVec2,
    pixels: Vec<u8>,
    cursor: UVec2,
    shelf_height: u32,
}

impl GlyphAtlas {
    pub fn new(size: UVec2) -> Self {
        let mut atlas = Self {
            size,
            pixels: vec![0; (size.x * size.y * 4) as usize],
            cursor: UVec2::new(WHITE_BLOCK + PADDING, 0),
            shelf_height: WHITE_BLOCK,
        };
        let block = vec![255; (WHITE_BLOCK * WHITE_BLOCK) as usize];
        atlas.blit(UVec2::ZERO, UVec2::splat(WHITE_BLOCK), &block, WHITE_BLOCK as usize);
        atlas
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Texture coordinate of a fully covered texel.
    pub fn solid_uv(&self) -> Vec2 {
        Vec2::splat(WHITE_BLOCK as f32 / 2.0) / self.size.as_vec2()
    }

    /// Finds room for a `size` pixel rectangle, or None once the atlas is full.
    pub fn allocate(&mut self, size: UVec2) -> Option<UVec2> {
        if size.x > self.size.x {
            return None;
        }
        if self.cursor.x + size.x > self.size.x {
            self.cursor = UVec2::new(0, self.cursor.y + self.shelf_height + PADDING);
            self.shelf_height = 0;
        }
        if self.cursor.y + size.y > self.size.y {
            return None;
        }

        let at = self.cursor;
        self.cursor.x += size.x + PADDING;
        self.shelf_height = self.shelf_height.max(size.y);
        Some(at)
    }

    /// Copies rows of single channel coverage into the alpha channel at `at`.
    pub fn blit(&mut self, at: UVec2, size: UVec2, coverage: &[u8], stride: usize) {
        for row in 0..size.y {
            for col in 0..size.x {
                let alpha = coverage[row as usize * stride + col as usize];
                let texel = (((at.y + row) * self.size.x + at.x + col) * 4) as usize;
                self.pixels[texel..texel + 4].copy_from_slice(&[255, 255, 255, alpha]);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphInfo {
    /// Top left corner in the atlas, in pixels.
    pub atlas_offset: UVec2,
    pub size: UVec2,
    /// From the pen on the baseline to the top left corner, y pointing down.
    pub bearing: Vec2,
    pub advance: f32,
}

pub struct GlyphCache {
    font: Font,
    point_size: f32,
    ascent: f32,
    line_height: f32,
    glyphs: HashMap<char, Option<GlyphInfo>>,
    atlas: GlyphAtlas,
    dirty: bool,
}

impl GlyphCache {
    const ATLAS_SIZE: u32 = 512;

    /// Rasterizes with whatever sans-serif face the system picks.
    pub fn system_sans_serif(point_size: f32) -> Result<Self, AssetError> {
        let font = SystemSource::new()
            .select_best_match(&[FamilyName::SansSerif], &Properties::new())?
            .load()?;
        info!("drawing text with {}", font.full_name());

        let metrics = font.metrics();
        let scale = point_size / metrics.units_per_em as f32;
        Ok(Self {
            font,
            point_size,
            ascent: metrics.ascent * scale,
            line_height: (metrics.ascent - metrics.descent + metrics.line_gap) * scale,
            glyphs: HashMap::new(),
            atlas: GlyphAtlas::new(UVec2::splat(Self::ATLAS_SIZE)),
            dirty: true,
        })
    }

    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Whether glyphs were added since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn advance(&mut self, character: char) -> f32 {
        self.glyph(character).map_or(0.0, |glyph| glyph.advance)
    }

    /// Looks up a glyph, rasterizing it into the atlas on first use. Characters
    /// the font has no glyph for fall back to '?'.
    pub fn glyph(&mut self, character: char) -> Option<GlyphInfo> {
        if let Some(glyph) = self.glyphs.get(&character) {
            return *glyph;
        }

        let glyph = self.rasterize(character);
        self.glyphs.insert(character, glyph);
        glyph
    }

    fn rasterize(&mut self, character: char) -> Option<GlyphInfo> {
        let glyph_id = match self.font.glyph_for_char(character) {
            Some(glyph_id) => glyph_id,
            None if character != '?' => return self.glyph('?'),
            None => return None,
        };

        let hinting = HintingOptions::None;
        let options = RasterizationOptions::GrayscaleAa;
        let bounds = match self.font.raster_bounds(
            glyph_id,
            self.point_size,
            Transform2F::default(),
            hinting,
            options,
        ) {
            Ok(bounds) => bounds,
            Err(err) => {
                warn!("no raster bounds for {:?}: {:?}", character, err);
                return None;
            }
        };
        let advance = match self.font.advance(glyph_id) {
            Ok(advance) => advance.x() * self.point_size / self.font.metrics().units_per_em as f32,
            Err(err) => {
                warn!("no advance for {:?}: {:?}", character, err);
                return None;
            }
        };

        let size = UVec2::new(bounds.width().max(0) as u32, bounds.height().max(0) as u32);
        let mut glyph = GlyphInfo {
            atlas_offset: UVec2::ZERO,
            size,
            bearing: Vec2::new(bounds.origin_x() as f32, bounds.origin_y() as f32),
            advance,
        };
        // whitespace only moves the pen
        if size.x == 0 || size.y == 0 {
            glyph.size = UVec2::ZERO;
            return Some(glyph);
        }

        glyph.atlas_offset = match self.atlas.allocate(size) {
            Some(offset) => offset,
            None => {
                warn!("glyph atlas is full, {:?} is left blank", character);
                glyph.size = UVec2::ZERO;
                return Some(glyph);
            }
        };

        let mut canvas = Canvas::new(bounds.size(), Format::A8);
        if let Err(err) = self.font.rasterize_glyph(
            &mut canvas,
            glyph_id,
            self.point_size,
            Transform2F::from_translation(-bounds.origin().to_f32()),
            hinting,
            options,
        ) {
            warn!("failed to rasterize {:?}: {:?}", character, err);
            glyph.size = UVec2::ZERO;
            return Some(glyph);
        }

        self.atlas
            .blit(glyph.atlas_offset, size, &canvas.pixels, canvas.stride);
        self.dirty = true;
        Some(glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_block_is_opaque_white() {
        let atlas = GlyphAtlas::new(UVec2::splat(16));

        let uv = atlas.solid_uv() * 16.0;
        let texel = ((uv.y as u32 * 16 + uv.x as u32) * 4) as usize;
        assert_eq!(&atlas.pixels()[texel..texel + 4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_allocations_fill_shelves() {
        let mut atlas = GlyphAtlas::new(UVec2::splat(32));

        // the first shelf starts after the solid block
        assert_eq!(atlas.allocate(UVec2::new(10, 6)), Some(UVec2::new(5, 0)));
        assert_eq!(atlas.allocate(UVec2::new(10, 3)), Some(UVec2::new(16, 0)));
        // no room left on the first shelf, the next one starts below its tallest entry
        assert_eq!(atlas.allocate(UVec2::new(10, 3)), Some(UVec2::new(0, 7)));
        assert_eq!(atlas.allocate(UVec2::new(40, 1)), None);
        assert_eq!(atlas.allocate(UVec2::new(8, 30)), None);
    }

    #[test]
    fn test_blit_writes_coverage_to_alpha() {
        let mut atlas = GlyphAtlas::new(UVec2::splat(16));
        // 2x2 glyph stored with a padded stride of 3
        atlas.blit(UVec2::new(8, 8), UVec2::new(2, 2), &[10, 20, 0, 30, 40, 0], 3);

        let alpha = |x: u32, y: u32| atlas.pixels()[((y * 16 + x) * 4 + 3) as usize];
        assert_eq!([alpha(8, 8), alpha(9, 8), alpha(8, 9), alpha(9, 9)], [10, 20, 30, 40]);
        assert_eq!(alpha(10, 8), 0);
    }
}
