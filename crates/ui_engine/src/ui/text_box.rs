//! Padded text on a rounded background
//!
//! A text box is a composite of a [`RoundedRectanglePrimitive`] and a
//! [`TextPrimitive`]. In fixed mode the box keeps the size it was given and
//! clips the text; in auto mode it grows to fit the text (plus padding), up
//! to an optional maximum.

use std::any::Any;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::primitive::{
    forward_state, DrawContext, Positionable, PrimitiveKind, PrimitiveState, RenderablePrimitive,
    StateChange,
};
use super::shapes::RoundedRectanglePrimitive;
use super::text_primitive::TextPrimitive;
use crate::backend::{BackendResult, DepthBias, RenderDevice};
use crate::config::Config;
use crate::foundation::math::{Vec2, Vec4};
use crate::text::{GlyphAtlas, TextAlign, TextJustify};
use crate::ui::transform::TransformArena;

/// Bias that keeps the background behind coplanar text
pub const BACKGROUND_DEPTH_BIAS: DepthBias = DepthBias::new(10.0, 10.0);

/// Styling and sizing for a [`TextBoxPrimitive`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBoxConfig {
    /// Space between the left edge and the text
    pub padding_left: f32,
    /// Space between the right edge and the text
    pub padding_right: f32,
    /// Space between the top edge and the text
    pub padding_top: f32,
    /// Space between the bottom edge and the text
    pub padding_bottom: f32,
    /// Background corner radius
    pub corner_radius: f32,
    /// Full-circle resolution of the corners
    pub corner_segments: u32,
    /// Background color (RGBA)
    pub background_color: [f32; 4],
    /// Text color (RGBA)
    pub text_color: [f32; 4],
    /// Word wrap inside the box
    pub wrap: bool,
    /// Size the box to its text
    pub auto_size: bool,
    /// Upper bound on the auto width; zero means unbounded
    pub max_width: f32,
    /// Upper bound on the auto height; zero means unbounded
    pub max_height: f32,
    /// Horizontal text alignment
    pub align: TextAlign,
    /// Vertical text justification
    pub justify: TextJustify,
}

impl Default for TextBoxConfig {
    fn default() -> Self {
        Self {
            padding_left: 15.0,
            padding_right: 15.0,
            padding_top: 15.0,
            padding_bottom: 15.0,
            corner_radius: 12.0,
            corner_segments: 32,
            background_color: [0.1, 0.1, 0.1, 0.85],
            text_color: [0.9, 0.9, 0.9, 1.0],
            wrap: true,
            auto_size: false,
            max_width: 0.0,
            max_height: 0.0,
            align: TextAlign::Start,
            justify: TextJustify::Start,
        }
    }
}

impl TextBoxConfig {
    /// Same padding on every side
    #[must_use]
    pub const fn with_padding(mut self, padding: f32) -> Self {
        self.padding_left = padding;
        self.padding_right = padding;
        self.padding_top = padding;
        self.padding_bottom = padding;
        self
    }

    /// Auto-size with the given maximum (zero for unbounded)
    #[must_use]
    pub const fn auto_sized(mut self, max_width: f32, max_height: f32) -> Self {
        self.auto_size = true;
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Total horizontal and vertical padding
    pub fn padding(&self) -> Vec2 {
        Vec2::new(self.padding_left + self.padding_right, self.padding_top + self.padding_bottom)
    }

    /// Wrap width for auto-sizing, if wrapping is bounded
    fn auto_wrap_width(&self) -> Option<f32> {
        (self.wrap && self.max_width > 0.0).then(|| (self.max_width - self.padding().x).max(0.0))
    }
}

impl Config for TextBoxConfig {}

/// Rounded background with padded, aligned text
pub struct TextBoxPrimitive {
    config: TextBoxConfig,
    position: Vec2,
    size: Vec2,
    background: RoundedRectanglePrimitive,
    text: TextPrimitive,
    state: PrimitiveState,
}

impl TextBoxPrimitive {
    /// Text box at `(x, y)`
    ///
    /// `width` and `height` are used in fixed mode; in auto mode
    /// (`config.auto_size`) the size comes from the text.
    pub fn new(
        atlas: Rc<GlyphAtlas>,
        text: &str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        config: TextBoxConfig,
    ) -> Self {
        let background_color = Vec4::from(config.background_color);
        let mut background =
            RoundedRectanglePrimitive::new(x, y, width, height, config.corner_radius, background_color);
        background.set_depth_bias(BACKGROUND_DEPTH_BIAS);
        let text = TextPrimitive::new(atlas, text, x, y, Vec4::from(config.text_color));

        let mut text_box = Self {
            config,
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            background,
            text,
            state: PrimitiveState::new(background_color),
        };
        text_box.recompute_size();
        text_box.update_layout();
        text_box
    }

    /// Auto-sized text box at `(x, y)`
    pub fn auto_sized(atlas: Rc<GlyphAtlas>, text: &str, x: f32, y: f32, config: TextBoxConfig) -> Self {
        let config = TextBoxConfig { auto_size: true, ..config };
        Self::new(atlas, text, x, y, 0.0, 0.0, config)
    }

    /// Current string
    pub fn text(&self) -> &str {
        self.text.text()
    }

    /// Replace the string, resizing in auto mode
    pub fn set_text(&mut self, text: &str) {
        if text == self.text.text() {
            return;
        }
        self.text.set_text(text);
        self.recompute_size();
        self.update_layout();
    }

    /// Box size including padding
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Fix the size; switches auto-sizing off
    pub fn set_size(&mut self, size: Vec2) {
        self.config.auto_size = false;
        self.size = size;
        self.update_layout();
    }

    /// Whether the box sizes itself to its text
    pub const fn is_auto_size(&self) -> bool {
        self.config.auto_size
    }

    /// Turn auto-sizing on or off
    pub fn set_auto_size(&mut self, auto_size: bool) {
        self.config.auto_size = auto_size;
        self.recompute_size();
        self.update_layout();
    }

    /// Bound the auto size; zero leaves a dimension unbounded
    pub fn set_max_size(&mut self, max_width: f32, max_height: f32) {
        self.config.max_width = max_width;
        self.config.max_height = max_height;
        self.recompute_size();
        self.update_layout();
    }

    /// Per-side padding
    pub fn set_padding(&mut self, left: f32, right: f32, top: f32, bottom: f32) {
        self.config.padding_left = left;
        self.config.padding_right = right;
        self.config.padding_top = top;
        self.config.padding_bottom = bottom;
        self.recompute_size();
        self.update_layout();
    }

    /// Background corner radius
    pub fn set_corner_radius(&mut self, corner_radius: f32) {
        self.config.corner_radius = corner_radius;
        self.background.set_corner_radius(corner_radius);
    }

    /// Word wrap inside the box
    pub fn set_wrap(&mut self, wrap: bool) {
        self.config.wrap = wrap;
        self.recompute_size();
        self.update_layout();
    }

    /// Horizontal text alignment
    pub fn set_alignment(&mut self, align: TextAlign) {
        self.config.align = align;
        self.text.set_alignment(align);
    }

    /// Vertical text justification
    pub fn set_justification(&mut self, justify: TextJustify) {
        self.config.justify = justify;
        self.text.set_justification(justify);
    }

    /// Background color
    pub fn set_background_color(&mut self, color: Vec4) {
        self.set_color(color);
    }

    /// Text color
    pub fn set_text_color(&mut self, color: Vec4) {
        self.config.text_color = color.into();
        self.text.set_color(color);
    }

    /// Current settings
    pub const fn config(&self) -> &TextBoxConfig {
        &self.config
    }

    /// Background primitive
    pub const fn background(&self) -> &RoundedRectanglePrimitive {
        &self.background
    }

    /// Text primitive
    pub const fn text_primitive(&self) -> &TextPrimitive {
        &self.text
    }

    fn recompute_size(&mut self) {
        if !self.config.auto_size {
            return;
        }
        let measured = self.text.measure_within(self.config.auto_wrap_width());
        let mut size = measured + self.config.padding();
        if self.config.max_width > 0.0 {
            size.x = size.x.min(self.config.max_width);
        }
        if self.config.max_height > 0.0 {
            size.y = size.y.min(self.config.max_height);
        }
        self.size = size;
    }

    /// Push position, size and padding into the children
    fn update_layout(&mut self) {
        let config = &self.config;
        self.background.set_position(self.position);
        self.background.set_size(self.size);
        self.background.set_corner_radius(config.corner_radius);
        self.background.set_segments(config.corner_segments);

        let padding = config.padding();
        let inner = Vec2::new((self.size.x - padding.x).max(0.0), (self.size.y - padding.y).max(0.0));
        self.text.set_position(self.position + Vec2::new(config.padding_left, config.padding_bottom));
        self.text.set_box_size(Some(inner));
        self.text.set_clip(true);
        self.text.set_alignment(config.align);
        self.text.set_justification(config.justify);

        if config.auto_size {
            // keep the breaks the size was measured with
            let wrap_width = config.auto_wrap_width();
            self.text.set_wrap(wrap_width.is_some());
            self.text.set_wrap_width(wrap_width);
        } else {
            self.text.set_wrap(config.wrap);
            self.text.set_wrap_width(None);
        }
    }
}

impl Positionable for TextBoxPrimitive {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        if position != self.position {
            self.position = position;
            self.update_layout();
        }
    }
}

impl RenderablePrimitive for TextBoxPrimitive {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::TextBox
    }

    fn state(&self) -> &PrimitiveState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PrimitiveState {
        &mut self.state
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        self.background.draw(ctx)?;
        self.text.draw(ctx)
    }

    fn content_size(&self) -> Vec2 {
        self.size
    }

    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena) {
        self.background.release(device, transforms);
        self.text.release(device, transforms);
    }

    fn state_changed(&mut self, change: StateChange) {
        match change {
            StateChange::Color => {
                self.config.background_color = self.state.color().into();
                forward_state(&self.state, &mut self.background, change);
            }
            // the background keeps its own bias
            StateChange::DepthBias => forward_state(&self.state, &mut self.text, change),
            _ => {
                forward_state(&self.state, &mut self.background, change);
                forward_state(&self.state, &mut self.text, change);
            }
        }
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
    use approx::assert_relative_eq;

    /// 10px advance, 10px line height
    fn atlas() -> Rc<GlyphAtlas> {
        Rc::new(GlyphAtlas::fixed_pitch(10.0, 8.0, -2.0))
    }

    fn draw(text_box: &mut TextBoxPrimitive) -> RecordingEncoder {
        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        let input = InputState::default();
        let transforms = TransformArena::new();
        let mut ctx = DrawContext {
            device: &mut device,
            encoder: &mut encoder,
            input: &input,
            transforms: &transforms,
            projection: Mat4::identity(),
            view: Mat4::identity(),
            frame: 0,
        };
        text_box.draw(&mut ctx).unwrap();
        encoder
    }

    #[test]
    fn test_fixed_mode_insets_text_by_padding() {
        let config = TextBoxConfig { padding_bottom: 5.0, ..TextBoxConfig::default() };
        let text_box = TextBoxPrimitive::new(atlas(), "hi", 100.0, 50.0, 200.0, 80.0, config);

        let text = text_box.text_primitive();
        assert_eq!(text.position(), Vec2::new(115.0, 55.0));
        assert_eq!(text.box_size(), Some(Vec2::new(170.0, 60.0)));
        assert_eq!(text_box.content_size(), Vec2::new(200.0, 80.0));
        assert_eq!(text_box.background().size(), Vec2::new(200.0, 80.0));
    }

    #[test]
    fn test_auto_size_is_text_plus_padding() {
        let text_box = TextBoxPrimitive::auto_sized(atlas(), "Hello", 0.0, 0.0, TextBoxConfig::default());
        assert_eq!(text_box.size(), Vec2::new(80.0, 40.0));
    }

    #[test]
    fn test_auto_size_wraps_and_clamps_to_max() {
        let config = TextBoxConfig::default().auto_sized(100.0, 45.0);
        let text_box = TextBoxPrimitive::new(atlas(), "aaaa bbbb cccc", 0.0, 0.0, 0.0, 0.0, config);

        // wraps at 70px into three lines (30px tall), then clamps to 45
        assert_eq!(text_box.size(), Vec2::new(80.0, 45.0));
        assert_eq!(text_box.text.layout_options().wrap_width, Some(70.0));
    }

    #[test]
    fn test_auto_size_grows_with_text() {
        let mut text_box = TextBoxPrimitive::auto_sized(atlas(), "", 0.0, 0.0, TextBoxConfig::default().auto_sized(200.0, 0.0));
        let mut previous = text_box.size();
        let mut text = String::new();
        for word in ["one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten"] {
            text.push_str(word);
            text.push(' ');
            text_box.set_text(&text);
            let size = text_box.size();
            assert!(size.x >= previous.x && size.y >= previous.y, "{:?} shrank to {:?}", previous, size);
            assert!(size.x <= 200.0);
            previous = size;
        }
        assert!(previous.y > 40.0);
    }

    #[test]
    fn test_set_text_relayouts_children() {
        let mut text_box = TextBoxPrimitive::auto_sized(atlas(), "ab", 0.0, 0.0, TextBoxConfig::default());
        text_box.set_text("abcdef");

        assert_eq!(text_box.size(), Vec2::new(90.0, 40.0));
        assert_eq!(text_box.background().size(), Vec2::new(90.0, 40.0));
        assert_eq!(text_box.text_primitive().box_size(), Some(Vec2::new(60.0, 10.0)));
    }

    #[test]
    fn test_background_draws_first_with_bias() {
        let mut text_box = TextBoxPrimitive::auto_sized(atlas(), "xyz", 0.0, 0.0, TextBoxConfig::default());
        let encoder = draw(&mut text_box);

        let draws = encoder.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].call.depth_bias, BACKGROUND_DEPTH_BIAS);
        assert!(!draws[1].call.depth_bias.is_active());
        let background = Vec4::from(TextBoxConfig::default().background_color);
        assert_relative_eq!(Vec4::from(draws[0].call.color), background);
    }

    #[test]
    fn test_screen_space_reaches_children() {
        let mut text_box = TextBoxPrimitive::auto_sized(atlas(), "xyz", 0.0, 0.0, TextBoxConfig::default());
        text_box.set_screen_space(false);
        text_box.set_transform(Mat4::new_scaling(2.0));

        assert!(!text_box.background().is_screen_space());
        assert!(!text_box.text_primitive().is_screen_space());
        assert_eq!(text_box.text_primitive().state().transform(), Some(&Mat4::new_scaling(2.0)));
    }

    #[test]
    fn test_text_clipped_in_fixed_mode() {
        let mut text_box = TextBoxPrimitive::new(atlas(), "a\nb\nc\nd", 0.0, 0.0, 100.0, 50.0, TextBoxConfig::default());
        let encoder = draw(&mut text_box);

        // 20px of room: two of the four lines survive
        let text_indices = encoder.draws()[1].call.index_buffer.map(|(_, count)| count);
        assert_eq!(text_indices, Some(12));
    }
}
