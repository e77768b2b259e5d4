//! On-screen debug overlay
//!
//! Shows smoothed FPS, window size, mouse and keyboard state in a text box
//! pinned to the top-right corner of the window.

use std::any::Any;
use std::fmt::Write as _;
use std::rc::Rc;

use super::element::{PrimitiveHandle, ScreenCorner, UiContainer, UiElement};
use super::placement::ScreenPlaced;
use super::primitive::{DrawContext, LayoutContext};
use super::text_box::{TextBoxConfig, TextBoxPrimitive};
use super::transform::{AnchorPoint, AnchorSpec, LayoutResult, TransformArena};
use crate::backend::{BackendResult, RenderDevice};
use crate::foundation::math::Vec2;
use crate::input::{InputState, MouseButtons};
use crate::text::GlyphAtlas;

/// Seconds between text refreshes
pub const REFRESH_INTERVAL: f32 = 0.25;

/// Weight of the previous FPS value in the running average
const FPS_SMOOTHING: f32 = 0.8;

/// Distance from the window edges
const MARGIN: f32 = 10.0;

/// Widest the overlay grows before wrapping
pub const MAX_WIDTH: f32 = 400.0;

type MonitorText = ScreenPlaced<TextBoxPrimitive>;

/// Frame-rate and input overlay
pub struct DebugMonitor {
    element: UiElement,
    text: PrimitiveHandle,
    elapsed: f32,
    frames: u32,
    smoothed_fps: Option<f32>,
}

impl DebugMonitor {
    /// Build the overlay; `atlas` is typically the 16px default font
    pub fn new(transforms: &mut TransformArena, atlas: Rc<GlyphAtlas>, style: &TextBoxConfig) -> LayoutResult<Self> {
        let mut element = UiElement::new(transforms, Vec2::zeros(), Vec2::zeros());
        element.enable_auto_anchor(transforms, ScreenCorner::TopRight, MARGIN, MARGIN)?;
        element.set_size_to_content(true);

        let config = style.clone().auto_sized(MAX_WIDTH, 0.0);
        let text_box = TextBoxPrimitive::new(atlas, "FPS: --", 0.0, 0.0, 0.0, 0.0, config);
        let anchor = AnchorSpec::parent(AnchorPoint::TopRight, 0.0, 0.0);
        let placed = ScreenPlaced::anchored(transforms, text_box, Some(element.transform()), anchor)?;
        let text = element.add_primitive(Box::new(placed));
        element.update_size_from_primitives(transforms)?;

        Ok(Self {
            element,
            text,
            elapsed: 0.0,
            frames: 0,
            smoothed_fps: None,
        })
    }

    /// Smoothed frames per second, once the first interval has elapsed
    pub const fn fps(&self) -> Option<f32> {
        self.smoothed_fps
    }

    /// Text currently shown
    pub fn text(&self) -> &str {
        self.element
            .primitive::<MonitorText>(self.text)
            .map_or("", |placed| placed.inner().text())
    }

    /// The element holding the overlay
    pub const fn element(&self) -> &UiElement {
        &self.element
    }

    fn sample(&mut self, delta_seconds: f32) -> bool {
        self.elapsed += delta_seconds;
        self.frames += 1;
        if self.elapsed < REFRESH_INTERVAL {
            return false;
        }
        let instant = self.frames as f32 / self.elapsed;
        self.smoothed_fps = Some(match self.smoothed_fps {
            Some(previous) => previous * FPS_SMOOTHING + instant * (1.0 - FPS_SMOOTHING),
            None => instant,
        });
        self.elapsed = 0.0;
        self.frames = 0;
        true
    }
}

/// Overlay text for one refresh
pub fn format_report(fps: f32, input: &InputState) -> String {
    let mouse = input.mouse_position();
    let delta = input.mouse_delta();
    let flag = |button| if input.is_mouse_pressed(button) { "[x]" } else { "[ ]" };

    let mut report = String::new();
    let _ = writeln!(report, "FPS: {:.1}", fps);
    let _ = writeln!(report, "Resolution: {}x{}", input.window_width(), input.window_height());
    let _ = writeln!(report, "Mouse: ({:.0}, {:.0}) delta ({:.0}, {:.0})", mouse.x, mouse.y, delta.x, delta.y);
    let _ = writeln!(
        report,
        "Buttons: L{} R{} M{}",
        flag(MouseButtons::LEFT),
        flag(MouseButtons::RIGHT),
        flag(MouseButtons::MIDDLE)
    );
    let keys: Vec<String> = input.pressed_keys().map(|key| key.to_string()).collect();
    if keys.is_empty() {
        report.push_str("Keys: none");
    } else {
        let _ = write!(report, "Keys: {}", keys.join(" "));
    }
    report
}

impl UiContainer for DebugMonitor {
    fn update(&mut self, ctx: &mut LayoutContext<'_>) -> LayoutResult<()> {
        if self.sample(ctx.delta_seconds) {
            let report = format_report(self.smoothed_fps.unwrap_or(0.0), ctx.input);
            if let Some(placed) = self.element.primitive_mut::<MonitorText>(self.text) {
                placed.inner_mut().set_text(&report);
            }
        }
        self.element.update(ctx)
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        self.element.draw(ctx)
    }

    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena) {
        self.element.release(device, transforms);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn monitor(transforms: &mut TransformArena) -> DebugMonitor {
        let atlas = Rc::new(GlyphAtlas::fixed_pitch(8.0, 12.0, -4.0));
        DebugMonitor::new(transforms, atlas, &TextBoxConfig::default()).unwrap()
    }

    fn tick(monitor: &mut DebugMonitor, transforms: &mut TransformArena, input: &InputState, dt: f32) {
        let mut ctx = LayoutContext { transforms, input, delta_seconds: dt };
        monitor.update(&mut ctx).unwrap();
    }

    #[test]
    fn test_refreshes_every_quarter_second() {
        let mut transforms = TransformArena::new();
        let mut monitor = monitor(&mut transforms);
        let input = InputState::default();

        for _ in 0..12 {
            tick(&mut monitor, &mut transforms, &input, 0.02);
        }
        assert!(monitor.fps().is_none());
        assert_eq!(monitor.text(), "FPS: --");

        tick(&mut monitor, &mut transforms, &input, 0.02);
        assert_relative_eq!(monitor.fps().unwrap(), 50.0, epsilon = 1e-2);
        assert!(monitor.text().starts_with("FPS: 50.0"));
    }

    #[test]
    fn test_fps_is_smoothed() {
        let mut transforms = TransformArena::new();
        let mut monitor = monitor(&mut transforms);
        let input = InputState::default();

        tick(&mut monitor, &mut transforms, &input, 0.25);
        assert_relative_eq!(monitor.fps().unwrap(), 4.0);
        tick(&mut monitor, &mut transforms, &input, 0.5);
        assert_relative_eq!(monitor.fps().unwrap(), 4.0 * 0.8 + 2.0 * 0.2);
    }

    #[test]
    fn test_report_lists_input_state() {
        let mut input = InputState::new(1024.0, 768.0);
        input.update_mouse(10.0, 20.0);
        input.update_mouse(15.0, 18.0);
        input.set_mouse_button(MouseButtons::RIGHT, true);
        input.set_key(65, true);
        input.set_key(32, true);

        let report = format_report(59.94, &input);
        assert_eq!(
            report,
            "FPS: 59.9\nResolution: 1024x768\nMouse: (15, 18) delta (5, -2)\nButtons: L[ ] R[x] M[ ]\nKeys: 32 65"
        );
        assert!(report.is_ascii());
    }

    #[test]
    fn test_element_tracks_text_size_in_top_right() {
        let mut transforms = TransformArena::new();
        let mut monitor = monitor(&mut transforms);
        let input = InputState::default();
        tick(&mut monitor, &mut transforms, &input, 0.3);

        let element = monitor.element().transform();
        let size = transforms.size(element).unwrap();
        assert!(size.x > 0.0 && size.x <= MAX_WIDTH);
        // five lines of 16px plus padding
        assert_relative_eq!(size.y, 5.0 * 16.0 + 30.0);

        let position = transforms.absolute_position(element, input.screen_size()).unwrap();
        assert_relative_eq!(position.x + size.x, 790.0);
        assert_relative_eq!(position.y + size.y, 590.0);
    }
}
