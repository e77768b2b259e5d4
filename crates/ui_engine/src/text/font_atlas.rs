//! Glyph atlas baking
//!
//! A [`GlyphAtlas`] is one font rasterized at one pixel size: a single-channel
//! bitmap holding every glyph of the printable ASCII range plus a metrics table
//! indexed by `char - FIRST_CHAR`. Glyphs are rasterized with `fontdue` at
//! twice the requested size and packed with a [`ShelfPacker`]; all metrics are
//! reported back in requested-size pixels, so layout never has to know about
//! the oversampling.
//!
//! Metrics use a y-up convention relative to the pen position on the
//! baseline: `bearing_min` is the bottom-left corner of the glyph quad and
//! `bearing_max` its top-right corner.

use std::cell::Cell;
use std::path::Path;

use fontdue::{Font, FontSettings};

use super::shelf_packer::ShelfPacker;
use crate::backend::{RenderDevice, TextureFormat, TextureHandle};
use crate::foundation::math::Vec2;

/// First character code stored in the atlas (space)
pub const FIRST_CHAR: u32 = 32;

/// Number of consecutive character codes stored in the atlas
pub const GLYPH_COUNT: usize = 96;

/// Rasterization scale relative to the requested pixel size
pub const OVERSAMPLE: f32 = 2.0;

const INITIAL_ATLAS_SIZE: u32 = 512;
const MAX_ATLAS_SIZE: u32 = 4096;
const GLYPH_PADDING: u32 = 1;

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Font file could not be read
    #[error("Failed to read font '{path}': {source}")]
    Io {
        /// Path that was requested
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Font data could not be parsed
    #[error("Failed to load font: {0}")]
    Load(String),

    /// Glyphs did not fit in the largest supported atlas
    #[error("Glyphs do not fit in a {0}x{0} atlas")]
    AtlasFull(u32),

    /// Atlas has no bitmap to export
    #[error("Atlas has no bitmap (font failed to load or metrics are synthetic)")]
    NoBitmap,

    /// Writing the debug image failed
    #[error("Failed to export atlas image: {0}")]
    ImageExport(String),
}

/// Placement and metrics of one baked glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Atlas UV of the bitmap's top-left corner
    pub uv_min: Vec2,
    /// Atlas UV of the bitmap's bottom-right corner
    pub uv_max: Vec2,
    /// Bottom-left corner of the glyph quad relative to the pen (y-up)
    pub bearing_min: Vec2,
    /// Top-right corner of the glyph quad relative to the pen (y-up)
    pub bearing_max: Vec2,
    /// Horizontal pen advance
    pub advance: f32,
    /// Bitmap width in atlas pixels
    pub pixel_width: u32,
    /// Bitmap height in atlas pixels
    pub pixel_height: u32,
}

impl GlyphMetrics {
    /// Whether the glyph produces a visible quad
    pub fn has_area(&self) -> bool {
        self.bearing_max.x > self.bearing_min.x && self.bearing_max.y > self.bearing_min.y
    }
}

/// Single-channel coverage bitmap, row-major, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasBitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Coverage values, `width * height` bytes
    pub pixels: Vec<u8>,
}

/// One font baked at one pixel size
///
/// An atlas whose font failed to load is still a valid value: it reports
/// [`is_valid`](Self::is_valid) as `false` and has no glyphs, so text laid out
/// with it is simply empty.
#[derive(Debug)]
pub struct GlyphAtlas {
    font_size: f32,
    ascent: f32,
    descent: f32,
    line_height: f32,
    glyphs: Vec<Option<GlyphMetrics>>,
    bitmap: Option<AtlasBitmap>,
    texture: Cell<Option<TextureHandle>>,
}

impl GlyphAtlas {
    /// Rasterize and pack the ASCII range of a TrueType/OpenType font
    ///
    /// # Arguments
    ///
    /// * `font_data` - Raw font file bytes (TTF or OTF format)
    /// * `font_size` - Size in pixels the metrics are reported at
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ui_engine::text::GlyphAtlas;
    ///
    /// let font_bytes = std::fs::read("assets/fonts/DejaVuSansMono.ttf")?;
    /// let atlas = GlyphAtlas::bake(&font_bytes, 32.0)?;
    /// assert!(atlas.get_glyph('A').is_some());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn bake(font_data: &[u8], font_size: f32) -> FontResult<Self> {
        let raster_size = font_size * OVERSAMPLE;
        let settings = FontSettings { scale: raster_size, ..FontSettings::default() };
        let font = Font::from_bytes(font_data, settings)
            .map_err(|e| FontError::Load(format!("fontdue error: {e}")))?;
        let line = font
            .horizontal_line_metrics(font_size)
            .ok_or_else(|| FontError::Load("font has no horizontal line metrics".to_string()))?;

        log::info!("Baking {} glyphs at {}px ({}x oversampled)", GLYPH_COUNT, font_size, OVERSAMPLE);

        let mut rasterized: Vec<RasterGlyph> = (0..GLYPH_COUNT)
            .filter_map(|slot| {
                let ch = char::from_u32(FIRST_CHAR + slot as u32)?;
                if ch != ' ' && font.lookup_glyph_index(ch) == 0 {
                    return None;
                }
                let (metrics, coverage) = font.rasterize(ch, raster_size);
                Some(RasterGlyph {
                    slot,
                    width: metrics.width,
                    height: metrics.height,
                    xmin: metrics.xmin,
                    ymin: metrics.ymin,
                    advance: metrics.advance_width,
                    coverage,
                })
            })
            .collect();
        // Tallest first keeps shelves tight
        rasterized.sort_by(|a, b| b.height.cmp(&a.height));

        let mut size = INITIAL_ATLAS_SIZE;
        let (glyphs, bitmap) = loop {
            match pack(&rasterized, size) {
                Some(packed) => break packed,
                None if size < MAX_ATLAS_SIZE => {
                    log::debug!("{}x{} atlas too small, doubling", size, size);
                    size *= 2;
                }
                None => return Err(FontError::AtlasFull(size)),
            }
        };

        let baked = glyphs.iter().filter(|g| g.is_some()).count();
        log::info!("Atlas packed: {}x{}, {} glyphs", bitmap.width, bitmap.height, baked);

        Ok(Self {
            font_size,
            ascent: line.ascent,
            descent: line.descent,
            line_height: line.ascent - line.descent + line.line_gap,
            glyphs,
            bitmap: Some(bitmap),
            texture: Cell::new(None),
        })
    }

    /// Atlas for a font that failed to load: no glyphs, zero advances
    pub fn invalid(font_size: f32) -> Self {
        Self {
            font_size,
            ascent: 0.0,
            descent: 0.0,
            line_height: font_size,
            glyphs: Vec::new(),
            bitmap: None,
            texture: Cell::new(None),
        }
    }

    /// Atlas from precomputed metrics, without a bitmap
    ///
    /// Used for bitmap fonts whose metrics are known ahead of time and for
    /// headless layout. Characters outside the atlas range are ignored.
    pub fn from_metrics(
        font_size: f32,
        ascent: f32,
        descent: f32,
        line_gap: f32,
        glyphs: impl IntoIterator<Item = (char, GlyphMetrics)>,
    ) -> Self {
        let mut table = vec![None; GLYPH_COUNT];
        for (ch, metrics) in glyphs {
            if let Some(slot) = slot_of(ch) {
                table[slot] = Some(metrics);
            }
        }
        Self {
            font_size,
            ascent,
            descent,
            line_height: ascent - descent + line_gap,
            glyphs: table,
            bitmap: None,
            texture: Cell::new(None),
        }
    }

    /// Fixed-pitch metrics where every printable glyph fills its whole cell
    ///
    /// Each glyph quad spans `[0, advance] x [descent, ascent]`; space has an
    /// advance but no quad.
    pub fn fixed_pitch(advance: f32, ascent: f32, descent: f32) -> Self {
        let cell = GlyphMetrics {
            uv_min: Vec2::zeros(),
            uv_max: Vec2::zeros(),
            bearing_min: Vec2::new(0.0, descent),
            bearing_max: Vec2::new(advance, ascent),
            advance,
            pixel_width: (advance * OVERSAMPLE).round() as u32,
            pixel_height: ((ascent - descent) * OVERSAMPLE).round() as u32,
        };
        let space = GlyphMetrics {
            bearing_min: Vec2::zeros(),
            bearing_max: Vec2::zeros(),
            pixel_width: 0,
            pixel_height: 0,
            ..cell
        };
        let glyphs = (FIRST_CHAR..FIRST_CHAR + GLYPH_COUNT as u32 - 1)
            .filter_map(char::from_u32)
            .map(|ch| (ch, if ch == ' ' { space } else { cell }));
        Self::from_metrics(ascent - descent, ascent, descent, 0.0, glyphs)
    }

    /// Whether the font loaded and produced glyphs
    pub fn is_valid(&self) -> bool {
        !self.glyphs.is_empty()
    }

    /// Metrics for `ch`, or `None` if it is outside the baked range or absent from the font
    pub fn get_glyph(&self, ch: char) -> Option<&GlyphMetrics> {
        slot_of(ch).and_then(|slot| self.glyphs.get(slot)).and_then(Option::as_ref)
    }

    /// Pen advance for `ch`; zero for missing glyphs
    pub fn advance(&self, ch: char) -> f32 {
        self.get_glyph(ch).map_or(0.0, |g| g.advance)
    }

    /// Single-line extent of `text`: summed advances by line height
    pub fn measure_text(&self, text: &str) -> Vec2 {
        Vec2::new(text.chars().map(|ch| self.advance(ch)).sum(), self.line_height)
    }

    /// Pixel size the metrics are expressed in
    pub const fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Distance from baseline to the top of the tallest glyphs
    pub const fn ascent(&self) -> f32 {
        self.ascent
    }

    /// Distance from baseline to the bottom of descenders (negative)
    pub const fn descent(&self) -> f32 {
        self.descent
    }

    /// Distance between consecutive baselines
    pub const fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Baked coverage bitmap
    pub const fn bitmap(&self) -> Option<&AtlasBitmap> {
        self.bitmap.as_ref()
    }

    /// Texture holding the bitmap, uploading it on first use
    ///
    /// Returns `None` for atlases without a bitmap or when the device
    /// refuses the upload.
    pub fn ensure_texture(&self, device: &mut dyn RenderDevice) -> Option<TextureHandle> {
        if let Some(texture) = self.texture.get() {
            return Some(texture);
        }
        let bitmap = self.bitmap.as_ref()?;
        let texture = device.create_texture(bitmap.width, bitmap.height, TextureFormat::R8Unorm, &bitmap.pixels);
        if texture.is_none() {
            log::warn!("Atlas texture upload failed ({}x{})", bitmap.width, bitmap.height);
        }
        self.texture.set(texture);
        texture
    }

    /// Release the uploaded texture, if any
    pub fn release_texture(&self, device: &mut dyn RenderDevice) {
        if let Some(texture) = self.texture.take() {
            device.release_texture(texture);
        }
    }

    /// Save the atlas bitmap as a grayscale PNG for debugging
    pub fn save_debug_image(&self, path: impl AsRef<Path>) -> FontResult<()> {
        let bitmap = self.bitmap.as_ref().ok_or(FontError::NoBitmap)?;
        let image = image::GrayImage::from_raw(bitmap.width, bitmap.height, bitmap.pixels.clone())
            .ok_or_else(|| FontError::ImageExport("bitmap size mismatch".to_string()))?;
        image.save(path.as_ref()).map_err(|e| FontError::ImageExport(e.to_string()))?;
        log::info!("Atlas written to {}", path.as_ref().display());
        Ok(())
    }
}

fn slot_of(ch: char) -> Option<usize> {
    let slot = (ch as u32).checked_sub(FIRST_CHAR)? as usize;
    (slot < GLYPH_COUNT).then_some(slot)
}

/// A glyph rasterized at the oversampled size, before packing
#[derive(Debug, Clone)]
struct RasterGlyph {
    slot: usize,
    width: usize,
    height: usize,
    xmin: i32,
    ymin: i32,
    advance: f32,
    coverage: Vec<u8>,
}

/// Pack rasterized glyphs into a `size` x `size` bitmap, or `None` if they do not fit
fn pack(rasterized: &[RasterGlyph], size: u32) -> Option<(Vec<Option<GlyphMetrics>>, AtlasBitmap)> {
    let mut packer = ShelfPacker::new(size, size, GLYPH_PADDING);
    let mut pixels = vec![0u8; (size as usize) * (size as usize)];
    let mut glyphs = vec![None; GLYPH_COUNT];
    let inv = 1.0 / size as f32;

    for glyph in rasterized {
        let width = glyph.width as u32;
        let height = glyph.height as u32;
        let rect = packer.place(width, height)?;

        for (row, src) in glyph.coverage.chunks_exact(glyph.width.max(1)).take(glyph.height).enumerate() {
            let dst_start = (rect.y as usize + row) * size as usize + rect.x as usize;
            pixels[dst_start..dst_start + glyph.width].copy_from_slice(&src[..glyph.width]);
        }

        let x0 = glyph.xmin as f32 / OVERSAMPLE;
        let y0 = glyph.ymin as f32 / OVERSAMPLE;
        glyphs[glyph.slot] = Some(GlyphMetrics {
            uv_min: Vec2::new(rect.x as f32 * inv, rect.y as f32 * inv),
            uv_max: Vec2::new((rect.x + width) as f32 * inv, (rect.y + height) as f32 * inv),
            bearing_min: Vec2::new(x0, y0),
            bearing_max: Vec2::new(x0 + width as f32 / OVERSAMPLE, y0 + height as f32 / OVERSAMPLE),
            advance: glyph.advance / OVERSAMPLE,
            pixel_width: width,
            pixel_height: height,
        });
    }

    Some((glyphs, AtlasBitmap { width: size, height: size, pixels }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingDevice;
    use approx::assert_relative_eq;

    fn raster(slot: usize, width: usize, height: usize, coverage: Vec<u8>) -> RasterGlyph {
        RasterGlyph { slot, width, height, xmin: 0, ymin: 0, advance: 0.0, coverage }
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let result = GlyphAtlas::bake(b"definitely not a font", 16.0);
        assert!(matches!(result, Err(FontError::Load(_))));
    }

    #[test]
    fn test_invalid_atlas_has_no_glyphs() {
        let atlas = GlyphAtlas::invalid(16.0);
        assert!(!atlas.is_valid());
        assert!(atlas.get_glyph('A').is_none());
        assert_eq!(atlas.advance('A'), 0.0);
        assert!(atlas.save_debug_image("unused.png").is_err());
    }

    #[test]
    fn test_range_is_ascii_32_through_127() {
        let atlas = GlyphAtlas::fixed_pitch(10.0, 8.0, -2.0);
        assert!(atlas.get_glyph(' ').is_some());
        assert!(atlas.get_glyph('~').is_some());
        assert!(atlas.get_glyph('\n').is_none());
        assert!(atlas.get_glyph('\u{e9}').is_none());
        assert!(atlas.get_glyph('\u{1F600}').is_none());
    }

    #[test]
    fn test_fixed_pitch_metrics() {
        let atlas = GlyphAtlas::fixed_pitch(10.0, 8.0, -2.0);
        assert_relative_eq!(atlas.line_height(), 10.0);

        let a = atlas.get_glyph('A').unwrap();
        assert!(a.has_area());
        assert_relative_eq!(a.bearing_max.y - a.bearing_min.y, 10.0);

        let space = atlas.get_glyph(' ').unwrap();
        assert!(!space.has_area());
        assert_relative_eq!(space.advance, 10.0);
    }

    #[test]
    fn test_measure_text_skips_missing_glyphs() {
        let atlas = GlyphAtlas::fixed_pitch(10.0, 8.0, -2.0);
        assert_eq!(atlas.measure_text("AB\u{e9}C"), Vec2::new(30.0, 10.0));
        assert_eq!(atlas.measure_text(""), Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_texture_upload_is_lazy_and_single() {
        let mut device = RecordingDevice::new();
        let metrics_only = GlyphAtlas::fixed_pitch(10.0, 8.0, -2.0);
        assert!(metrics_only.ensure_texture(&mut device).is_none());

        let rasterized = vec![raster(33, 2, 2, vec![255u8; 4])];
        let (glyphs, bitmap) = pack(&rasterized, 16).unwrap();
        let atlas = GlyphAtlas { bitmap: Some(bitmap), glyphs, ..GlyphAtlas::invalid(8.0) };

        let first = atlas.ensure_texture(&mut device);
        assert!(first.is_some());
        assert_eq!(atlas.ensure_texture(&mut device), first);
        assert_eq!(device.texture_count(), 1);

        atlas.release_texture(&mut device);
        assert_eq!(device.texture_count(), 0);
    }

    #[test]
    fn test_pack_copies_coverage_and_uvs() {
        let rasterized = vec![RasterGlyph {
            xmin: 2,
            ymin: -4,
            advance: 12.0,
            ..raster(1, 3, 2, vec![1, 2, 3, 4, 5, 6])
        }];
        let (glyphs, bitmap) = pack(&rasterized, 8).unwrap();
        let glyph = glyphs[1].unwrap();

        // Padding of one pixel puts the bitmap at (1, 1)
        assert_eq!(&bitmap.pixels[9..12], &[1, 2, 3]);
        assert_eq!(&bitmap.pixels[17..20], &[4, 5, 6]);
        assert_relative_eq!(glyph.uv_min.x, 1.0 / 8.0);
        assert_relative_eq!(glyph.uv_max.y, 3.0 / 8.0);
        // Metrics come back at the requested (non-oversampled) size
        assert_relative_eq!(glyph.advance, 6.0);
        assert_relative_eq!(glyph.bearing_min.x, 1.0);
        assert_relative_eq!(glyph.bearing_min.y, -2.0);
        assert_relative_eq!(glyph.bearing_max.x, 2.5);
        assert_relative_eq!(glyph.bearing_max.y, -1.0);
    }

    #[test]
    fn test_pack_reports_overflow() {
        let rasterized = vec![raster(0, 20, 20, vec![0u8; 400])];
        assert!(pack(&rasterized, 16).is_none());
    }
}
