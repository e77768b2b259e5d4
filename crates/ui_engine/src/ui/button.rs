//! Clickable text box

use std::any::Any;
use std::rc::Rc;

use super::primitive::{
    forward_state, DrawContext, Positionable, PrimitiveKind, PrimitiveState, RenderablePrimitive,
    StateChange,
};
use super::text_box::{TextBoxConfig, TextBoxPrimitive};
use crate::backend::{BackendResult, RenderDevice};
use crate::foundation::math::{project_to_window, Mat4, Vec2, Vec3, Vec4};
use crate::input::collision::{bounding_rect, point_in_rect};
use crate::input::MouseButtons;
use crate::text::GlyphAtlas;
use crate::ui::transform::TransformArena;

/// Brightness factor while hovered
const HOVER_SHADE: f32 = 0.9;
/// Brightness factor while pressed
const PRESSED_SHADE: f32 = 0.75;

/// Button state for visual feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    /// Normal resting state
    #[default]
    Normal,
    /// Mouse is hovering over button
    Hovered,
    /// Button is being pressed
    Pressed,
}

impl ButtonState {
    /// Background color for this state given the resting color
    pub fn shade(self, base: Vec4) -> Vec4 {
        let factor = match self {
            Self::Normal => return base,
            Self::Hovered => HOVER_SHADE,
            Self::Pressed => PRESSED_SHADE,
        };
        Vec4::new(base.x * factor, base.y * factor, base.z * factor, base.w)
    }
}

/// Text box that reacts to the left mouse button
///
/// Interaction is evaluated while drawing, against the matrices of the pass
/// the button is drawn in, so the same type works on screen and on a
/// billboard. A click fires when the button is released over the button it
/// was pressed on.
pub struct ButtonPrimitive {
    text_box: TextBoxPrimitive,
    button_state: ButtonState,
    pressed: bool,
    mouse_was_down: bool,
    clicked: bool,
    on_click: Option<Box<dyn FnMut()>>,
    state: PrimitiveState,
}

impl ButtonPrimitive {
    /// Fixed-size button at `(x, y)`
    pub fn new(
        atlas: Rc<GlyphAtlas>,
        label: &str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        config: TextBoxConfig,
    ) -> Self {
        let base_color = Vec4::from(config.background_color);
        Self {
            text_box: TextBoxPrimitive::new(atlas, label, x, y, width, height, config),
            button_state: ButtonState::Normal,
            pressed: false,
            mouse_was_down: false,
            clicked: false,
            on_click: None,
            state: PrimitiveState::new(base_color),
        }
    }

    /// Call `callback` on every click
    pub fn set_on_click(&mut self, callback: impl FnMut() + 'static) {
        self.on_click = Some(Box::new(callback));
    }

    /// Whether a click happened since the last call
    pub fn take_clicked(&mut self) -> bool {
        std::mem::take(&mut self.clicked)
    }

    /// Visual state
    pub const fn button_state(&self) -> ButtonState {
        self.button_state
    }

    /// Label text
    pub fn label(&self) -> &str {
        self.text_box.text()
    }

    /// Replace the label
    pub fn set_label(&mut self, label: &str) {
        self.text_box.set_text(label);
    }

    /// The underlying text box
    pub const fn text_box(&self) -> &TextBoxPrimitive {
        &self.text_box
    }

    /// The underlying text box, mutable
    pub fn text_box_mut(&mut self) -> &mut TextBoxPrimitive {
        &mut self.text_box
    }

    /// Whether `cursor` (window pixels, bottom-left origin) is over the button
    ///
    /// The button rectangle is projected through `view_projection` and the
    /// model transform; a corner behind the camera counts as a miss.
    pub fn hit_test(&self, view_projection: &Mat4, window: Vec2, cursor: Vec2) -> bool {
        let mvp = view_projection * self.state.model_matrix();
        let origin = self.text_box.position();
        let size = self.text_box.size();
        let corners = [
            origin,
            origin + Vec2::new(size.x, 0.0),
            origin + size,
            origin + Vec2::new(0.0, size.y),
        ];
        let projected: Option<Vec<Vec2>> = corners
            .iter()
            .map(|corner| project_to_window(&mvp, Vec3::new(corner.x, corner.y, 0.0), window.x, window.y))
            .collect();
        projected
            .and_then(bounding_rect)
            .is_some_and(|(min, max)| point_in_rect(cursor, min, max - min))
    }

    fn update_interaction(&mut self, ctx: &DrawContext<'_>) {
        let view_projection = ctx.projection * ctx.view;
        let hovered = self.hit_test(&view_projection, ctx.screen_size(), ctx.input.mouse_position_bottom_left());
        let down = ctx.input.is_mouse_pressed(MouseButtons::LEFT);
        let just_pressed = down && !self.mouse_was_down;
        self.mouse_was_down = down;

        if just_pressed && hovered {
            self.pressed = true;
        }
        if self.pressed && !down {
            self.pressed = false;
            if hovered {
                self.fire_click();
            }
        }

        let next = if self.pressed && hovered {
            ButtonState::Pressed
        } else if hovered {
            ButtonState::Hovered
        } else {
            ButtonState::Normal
        };
        if next != self.button_state {
            self.button_state = next;
            self.apply_shade();
        }
    }

    fn fire_click(&mut self) {
        log::debug!("Button '{}' clicked", self.text_box.text());
        self.clicked = true;
        if let Some(callback) = self.on_click.as_mut() {
            callback();
        }
    }

    fn apply_shade(&mut self) {
        let color = self.button_state.shade(self.state.color());
        self.text_box.set_background_color(color);
    }
}

impl Positionable for ButtonPrimitive {
    fn position(&self) -> Vec2 {
        self.text_box.position()
    }

    fn set_position(&mut self, position: Vec2) {
        self.text_box.set_position(position);
    }
}

impl RenderablePrimitive for ButtonPrimitive {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Button
    }

    fn state(&self) -> &PrimitiveState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PrimitiveState {
        &mut self.state
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        self.update_interaction(ctx);
        self.text_box.draw(ctx)
    }

    fn content_size(&self) -> Vec2 {
        self.text_box.size()
    }

    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena) {
        self.text_box.release(device, transforms);
    }

    fn state_changed(&mut self, change: StateChange) {
        match change {
            StateChange::Color => self.apply_shade(),
            _ => forward_state(&self.state, &mut self.text_box, change),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
