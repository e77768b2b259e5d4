//! Text layout engine
//!
//! Converts a string plus an optional pixel box into glyph quads. Layout is
//! pure: it reads metrics from a [`GlyphAtlas`] and returns [`MeshData`]; the
//! caller decides when to upload.
//!
//! # Layout Coordinate System
//!
//! - `origin` is the bottom-left corner of the text box
//! - +X axis points right, +Y axis points up
//! - Lines stack downwards from the top of the block, one `line_height` apart

use super::font_atlas::GlyphAtlas;
use crate::foundation::math::Vec2;
use crate::render::mesh::{MeshData, UiVertex};

/// Horizontal placement of each line inside the box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum TextAlign {
    /// Flush left
    #[default]
    Start,
    /// Centered
    Center,
    /// Flush right
    End,
}

/// Vertical placement of the line block inside the box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum TextJustify {
    /// Block hangs from the top edge
    #[default]
    Start,
    /// Block is centered vertically
    Center,
    /// Block sits on the bottom edge
    End,
}

/// Parameters controlling one layout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayoutOptions {
    /// Bottom-left corner of the text box
    pub origin: Vec2,
    /// Box to align, wrap and clip against; `None` sizes the box to the text
    pub box_size: Option<Vec2>,
    /// Horizontal alignment
    pub align: TextAlign,
    /// Vertical justification
    pub justify: TextJustify,
    /// Greedy word wrap at this width; `None` splits on newlines only
    pub wrap_width: Option<f32>,
    /// Drop lines that do not fit vertically in the box
    pub clip: bool,
}

impl Default for TextLayoutOptions {
    fn default() -> Self {
        Self {
            origin: Vec2::zeros(),
            box_size: None,
            align: TextAlign::Start,
            justify: TextJustify::Start,
            wrap_width: None,
            clip: false,
        }
    }
}

impl TextLayoutOptions {
    fn wrap_width(&self) -> Option<f32> {
        self.wrap_width.filter(|&width| width > 0.0)
    }
}

/// Bounding box for text layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBounds {
    /// Minimum X coordinate
    pub min_x: f32,
    /// Minimum Y coordinate
    pub min_y: f32,
    /// Maximum X coordinate
    pub max_x: f32,
    /// Maximum Y coordinate
    pub max_y: f32,
}

impl TextBounds {
    /// Calculate width of bounding box
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Calculate height of bounding box
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Result of a layout pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutText {
    /// Glyph quads, empty when nothing is visible
    pub mesh: MeshData,
    /// Number of quads emitted
    pub glyph_count: usize,
    /// Number of lines laid out (including clipped ones)
    pub line_count: usize,
    /// Union of the emitted quads
    pub bounds: Option<TextBounds>,
}

/// Text layout engine over one glyph atlas
#[derive(Debug, Clone, Copy)]
pub struct TextLayout<'a> {
    atlas: &'a GlyphAtlas,
}

impl<'a> TextLayout<'a> {
    /// Create a new text layout engine
    pub const fn new(atlas: &'a GlyphAtlas) -> Self {
        Self { atlas }
    }

    /// Summed advance of `line`; missing glyphs contribute nothing
    pub fn line_width(&self, line: &str) -> f32 {
        line.chars().map(|ch| self.atlas.advance(ch)).sum()
    }

    /// Advance of `line` up to its last visible character
    fn visible_width(&self, line: &str) -> f32 {
        self.line_width(line.trim_end_matches(is_blank))
    }

    /// Split `text` into lines according to `options`
    pub fn lines(&self, text: &str, options: &TextLayoutOptions) -> Vec<String> {
        match options.wrap_width() {
            Some(max_width) => self.wrap_lines(text, max_width),
            None => text.split('\n').map(str::to_string).collect(),
        }
    }

    /// Greedy word wrap
    ///
    /// Words are never broken: a word wider than `max_width` sits alone on
    /// its line. No line starts with the space that caused the break, and
    /// trailing spaces are trimmed. Newlines always break. Characters without
    /// a glyph are dropped.
    pub fn wrap_lines(&self, text: &str, max_width: f32) -> Vec<String> {
        let mut wrapper = Wrapper::new(max_width);

        for ch in text.chars() {
            if ch == '\n' {
                wrapper.place_word();
                wrapper.break_line();
                continue;
            }
            if is_blank(ch) {
                wrapper.place_word();
                wrapper.push_space(ch, self.atlas.advance(ch));
                continue;
            }
            if let Some(glyph) = self.atlas.get_glyph(ch) {
                wrapper.push_char(ch, glyph.advance);
            }
        }

        wrapper.finish()
    }

    /// Width and height the text occupies: widest line by `lines * line_height`
    ///
    /// Empty text measures as one empty line, `(0, line_height)`.
    pub fn measure(&self, text: &str, options: &TextLayoutOptions) -> Vec2 {
        let lines = self.lines(text, options);
        let width = lines.iter().map(|line| self.visible_width(line)).fold(0.0, f32::max);
        Vec2::new(width, lines.len() as f32 * self.atlas.line_height())
    }

    /// Lay out `text` into glyph quads
    pub fn build(&self, text: &str, options: &TextLayoutOptions) -> LaidOutText {
        let lines = self.lines(text, options);
        let line_height = self.atlas.line_height();
        let widths: Vec<f32> = lines.iter().map(|line| self.visible_width(line)).collect();
        let block_width = widths.iter().copied().fold(0.0, f32::max);
        let block_height = lines.len() as f32 * line_height;
        let box_size = options.box_size.unwrap_or_else(|| Vec2::new(block_width, block_height));
        let origin = options.origin;

        let top = match options.justify {
            TextJustify::Start => origin.y + box_size.y,
            TextJustify::Center => origin.y + (box_size.y + block_height) * 0.5,
            TextJustify::End => origin.y + block_height,
        };

        let mut out = LaidOutText { line_count: lines.len(), ..LaidOutText::default() };

        for (index, (line, width)) in lines.iter().zip(&widths).enumerate() {
            let line_top = top - index as f32 * line_height;
            if options.clip && options.box_size.is_some() && !fits_vertically(line_top, line_height, origin.y, box_size.y) {
                continue;
            }
            let baseline = line_top - self.atlas.ascent();
            let mut pen_x = match options.align {
                TextAlign::Start => origin.x,
                TextAlign::Center => origin.x + (box_size.x - width) * 0.5,
                TextAlign::End => origin.x + box_size.x - width,
            };

            for ch in line.chars() {
                let Some(glyph) = self.atlas.get_glyph(ch) else {
                    continue;
                };
                if !ch.is_whitespace() && glyph.has_area() {
                    let quad = TextBounds {
                        min_x: pen_x + glyph.bearing_min.x,
                        min_y: baseline + glyph.bearing_min.y,
                        max_x: pen_x + glyph.bearing_max.x,
                        max_y: baseline + glyph.bearing_max.y,
                    };
                    push_quad(&mut out.mesh, &quad, glyph.uv_min, glyph.uv_max);
                    out.glyph_count += 1;
                    out.bounds = Some(out.bounds.map_or(quad, |b| b.union(quad)));
                }
                pen_x += glyph.advance;
            }
        }

        out
    }
}

const fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t')
}

fn fits_vertically(line_top: f32, line_height: f32, box_bottom: f32, box_height: f32) -> bool {
    const SLACK: f32 = 0.01;
    line_top - line_height >= box_bottom - SLACK && line_top <= box_bottom + box_height + SLACK
}

fn push_quad(mesh: &mut MeshData, quad: &TextBounds, uv_min: Vec2, uv_max: Vec2) {
    let base = mesh.vertices.len() as u32;
    // uv_min is the bitmap's top-left, so the quad's top edge samples v = uv_min.y
    mesh.vertices.extend_from_slice(&[
        UiVertex::textured(quad.min_x, quad.min_y, uv_min.x, uv_max.y),
        UiVertex::textured(quad.max_x, quad.min_y, uv_max.x, uv_max.y),
        UiVertex::textured(quad.max_x, quad.max_y, uv_max.x, uv_min.y),
        UiVertex::textured(quad.min_x, quad.max_y, uv_min.x, uv_min.y),
    ]);
    mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
}

/// Line-building state for [`TextLayout::wrap_lines`]
struct Wrapper {
    max_width: f32,
    lines: Vec<String>,
    line: String,
    line_width: f32,
    word: String,
    word_width: f32,
}

impl Wrapper {
    const fn new(max_width: f32) -> Self {
        Self {
            max_width,
            lines: Vec::new(),
            line: String::new(),
            line_width: 0.0,
            word: String::new(),
            word_width: 0.0,
        }
    }

    fn push_char(&mut self, ch: char, advance: f32) {
        self.word.push(ch);
        self.word_width += advance;
    }

    fn push_space(&mut self, ch: char, advance: f32) {
        if self.line_width + advance <= self.max_width {
            self.line.push(ch);
            self.line_width += advance;
        }
    }

    /// Move the pending word onto the current line, breaking first if it would overflow
    fn place_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        if self.line_width + self.word_width > self.max_width && !self.line.is_empty() {
            self.break_line();
        }
        self.line.push_str(&self.word);
        self.line_width += self.word_width;
        self.word.clear();
        self.word_width = 0.0;
    }

    fn break_line(&mut self) {
        let line = std::mem::take(&mut self.line);
        self.lines.push(line.trim_end_matches(is_blank).to_string());
        self.line_width = 0.0;
    }

    fn finish(mut self) -> Vec<String> {
        self.place_word();
        if !self.line.is_empty() {
            self.break_line();
        }
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines
    }
}
