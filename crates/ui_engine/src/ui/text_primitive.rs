//! Text run drawn from a glyph atlas

use std::any::Any;
use std::rc::Rc;

use super::primitive::{
    DrawContext, Positionable, PrimitiveKind, PrimitiveState, RenderSlot, RenderablePrimitive,
};
use crate::backend::{BackendResult, RenderDevice};
use crate::foundation::math::{Vec2, Vec4};
use crate::render::renderable::Material;
use crate::text::{GlyphAtlas, TextAlign, TextJustify, TextLayout, TextLayoutOptions};
use crate::ui::transform::TransformArena;

/// A string laid out into one textured quad per visible glyph
///
/// With no box the position is the bottom-left of the text block. With a
/// box the position is the box's bottom-left and the text is aligned,
/// justified, wrapped and clipped against it.
pub struct TextPrimitive {
    atlas: Rc<GlyphAtlas>,
    text: String,
    position: Vec2,
    box_size: Option<Vec2>,
    wrap_width: Option<f32>,
    wrap: bool,
    align: TextAlign,
    justify: TextJustify,
    clip: bool,
    glyph_count: usize,
    state: PrimitiveState,
    slot: RenderSlot,
}

impl TextPrimitive {
    /// Text at `(x, y)` in `color`
    pub fn new(atlas: Rc<GlyphAtlas>, text: impl Into<String>, x: f32, y: f32, color: Vec4) -> Self {
        Self {
            atlas,
            text: text.into(),
            position: Vec2::new(x, y),
            box_size: None,
            wrap_width: None,
            wrap: false,
            align: TextAlign::Start,
            justify: TextJustify::Start,
            clip: false,
            glyph_count: 0,
            state: PrimitiveState::new(color),
            slot: RenderSlot::new(),
        }
    }

    /// Current string
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the string; unchanged text does not rebuild
    pub fn set_text(&mut self, text: &str) {
        if text != self.text {
            self.text.clear();
            self.text.push_str(text);
            self.slot.invalidate();
        }
    }

    /// Atlas the glyphs come from
    pub fn atlas(&self) -> &Rc<GlyphAtlas> {
        &self.atlas
    }

    /// Swap the atlas
    pub fn set_atlas(&mut self, atlas: Rc<GlyphAtlas>) {
        if !Rc::ptr_eq(&atlas, &self.atlas) {
            self.atlas = atlas;
            self.slot.invalidate();
        }
    }

    /// Box to lay out against, or `None` to size to the text
    pub fn set_box_size(&mut self, box_size: Option<Vec2>) {
        if box_size != self.box_size {
            self.box_size = box_size;
            self.slot.invalidate();
        }
    }

    /// Current layout box
    pub const fn box_size(&self) -> Option<Vec2> {
        self.box_size
    }

    /// Wrap at the box width
    pub fn set_wrap(&mut self, wrap: bool) {
        if wrap != self.wrap {
            self.wrap = wrap;
            self.slot.invalidate();
        }
    }

    /// Wrap at an explicit width instead of the box width
    pub fn set_wrap_width(&mut self, wrap_width: Option<f32>) {
        if wrap_width != self.wrap_width {
            self.wrap_width = wrap_width;
            self.slot.invalidate();
        }
    }

    /// Horizontal alignment inside the box
    pub fn set_alignment(&mut self, align: TextAlign) {
        if align != self.align {
            self.align = align;
            self.slot.invalidate();
        }
    }

    /// Vertical justification inside the box
    pub fn set_justification(&mut self, justify: TextJustify) {
        if justify != self.justify {
            self.justify = justify;
            self.slot.invalidate();
        }
    }

    /// Drop lines that fall outside the box
    pub fn set_clip(&mut self, clip: bool) {
        if clip != self.clip {
            self.clip = clip;
            self.slot.invalidate();
        }
    }

    /// Glyph quads in the last built mesh
    pub const fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    /// Whether the mesh will be rebuilt on the next draw
    pub fn needs_rebuild(&self) -> bool {
        self.slot.is_dirty()
    }

    /// Layout options for the current parameters
    pub fn layout_options(&self) -> TextLayoutOptions {
        let wrap_width = if self.wrap {
            self.wrap_width.or_else(|| self.box_size.map(|size| size.x))
        } else {
            None
        };
        TextLayoutOptions {
            origin: self.position,
            box_size: self.box_size,
            align: self.align,
            justify: self.justify,
            wrap_width,
            clip: self.clip,
        }
    }

    /// Size of the text block under the current wrapping
    pub fn measure(&self) -> Vec2 {
        TextLayout::new(&self.atlas).measure(&self.text, &self.layout_options())
    }

    /// Size of the text block if wrapped at `max_width` (unwrapped for `None`)
    pub fn measure_within(&self, max_width: Option<f32>) -> Vec2 {
        let options = TextLayoutOptions {
            wrap_width: max_width,
            ..TextLayoutOptions::default()
        };
        TextLayout::new(&self.atlas).measure(&self.text, &options)
    }
}

impl Positionable for TextPrimitive {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        if position != self.position {
            self.position = position;
            self.slot.invalidate();
        }
    }
}

impl RenderablePrimitive for TextPrimitive {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Text
    }

    fn state(&self) -> &PrimitiveState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PrimitiveState {
        &mut self.state
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        let options = self.layout_options();
        let color = self.state.color();
        let atlas = Rc::clone(&self.atlas);
        let text = &self.text;
        let glyph_count = &mut self.glyph_count;
        self.slot.draw_with(&mut self.state, ctx, |device| {
            let laid_out = TextLayout::new(&atlas).build(text, &options);
            *glyph_count = laid_out.glyph_count;
            let texture = if laid_out.glyph_count > 0 { atlas.ensure_texture(device) } else { None };
            (laid_out.mesh, Material::text(color, texture))
        })
    }

    fn content_size(&self) -> Vec2 {
        self.box_size.unwrap_or_else(|| self.measure())
    }

    fn release(&mut self, device: &mut dyn RenderDevice, _transforms: &mut TransformArena) {
        self.slot.release(device);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{RecordingDevice, RecordingEncoder};
    use crate::foundation::math::Mat4;
    use crate::input::InputState;

    fn atlas() -> Rc<GlyphAtlas> {
        Rc::new(GlyphAtlas::fixed_pitch(10.0, 8.0, -2.0))
    }

    fn draw(text: &mut TextPrimitive, device: &mut RecordingDevice, encoder: &mut RecordingEncoder, frame: u64) {
        let input = InputState::default();
        let transforms = TransformArena::new();
        let mut ctx = DrawContext {
            device,
            encoder,
            input: &input,
            transforms: &transforms,
            projection: Mat4::identity(),
            view: Mat4::identity(),
            frame,
        };
        text.draw(&mut ctx).unwrap();
    }

    #[test]
    fn test_draws_one_textured_mesh() {
        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        let mut text = TextPrimitive::new(atlas(), "Hi you", 0.0, 0.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        draw(&mut text, &mut device, &mut encoder, 0);

        assert_eq!(text.glyph_count(), 5);
        let call = &encoder.draws()[0].call;
        assert_eq!(call.index_buffer.map(|(_, count)| count), Some(30));
        // metrics-only atlas: nothing to upload
        assert!(call.texture.is_none());
        assert_eq!(device.texture_count(), 0);
    }

    #[test]
    fn test_empty_and_invalid_text_allocate_nothing() {
        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        let mut empty = TextPrimitive::new(atlas(), "", 0.0, 0.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        let mut invalid = TextPrimitive::new(Rc::new(GlyphAtlas::invalid(16.0)), "abc", 0.0, 0.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        draw(&mut empty, &mut device, &mut encoder, 0);
        draw(&mut invalid, &mut device, &mut encoder, 0);

        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.texture_count(), 0);
        assert!(encoder.draws().is_empty());
    }

    #[test]
    fn test_same_text_does_not_rebuild() {
        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        let mut text = TextPrimitive::new(atlas(), "FPS: 60", 0.0, 0.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        draw(&mut text, &mut device, &mut encoder, 0);

        text.set_text("FPS: 60");
        assert!(!text.needs_rebuild());
        text.set_text("FPS: 59");
        assert!(text.needs_rebuild());
    }

    #[test]
    fn test_shrinking_text_reuses_buffers() {
        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        let mut text = TextPrimitive::new(atlas(), "longer line", 0.0, 0.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        draw(&mut text, &mut device, &mut encoder, 0);
        let allocations = device.total_allocations();

        text.set_text("short");
        draw(&mut text, &mut device, &mut encoder, 1);
        assert_eq!(device.total_allocations(), allocations);
        assert_eq!(text.glyph_count(), 5);
    }

    #[test]
    fn test_content_size_prefers_box() {
        let mut text = TextPrimitive::new(atlas(), "abcd", 0.0, 0.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(text.content_size(), Vec2::new(40.0, 10.0));
        text.set_box_size(Some(Vec2::new(100.0, 50.0)));
        assert_eq!(text.content_size(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_measure_within_wraps() {
        let text = TextPrimitive::new(atlas(), "aaaa bbbb", 0.0, 0.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(text.measure_within(None), Vec2::new(90.0, 10.0));
        assert_eq!(text.measure_within(Some(50.0)), Vec2::new(50.0, 20.0));
    }
}
