//! Text label floating in the world

use std::any::Any;
use std::rc::Rc;

use super::element::{PrimitiveHandle, WorldContainer, WorldElement};
use super::placement::Billboard;
use super::primitive::{DrawContext, LayoutContext};
use super::text_box::{TextBoxConfig, TextBoxPrimitive};
use super::transform::{LayoutResult, TransformArena};
use crate::backend::{BackendResult, RenderDevice};
use crate::foundation::math::{Vec2, Vec3};
use crate::text::GlyphAtlas;

/// World size of a label quad
pub const LABEL_WORLD_SIZE: f32 = 2.0;

type LabelBillboard = Billboard<TextBoxPrimitive>;

/// A 2x2 world-unit text box at a point, turned by pitch and yaw
pub struct WorldLabel {
    element: WorldElement,
    label: PrimitiveHandle,
}

impl WorldLabel {
    /// Label at `position` facing +Z
    pub fn new(atlas: Rc<GlyphAtlas>, text: &str, position: Vec3, style: &TextBoxConfig) -> Self {
        let mut element = WorldElement::new(position);
        let size = Vec2::new(LABEL_WORLD_SIZE, LABEL_WORLD_SIZE);
        let billboard = Billboard::text_box(atlas, text, position, size, style.clone());
        let label = element.add_primitive(Box::new(billboard));
        Self { element, label }
    }

    /// Turn the label; radians
    pub fn set_rotation(&mut self, pitch: f32, yaw: f32) {
        self.element.set_rotation(pitch, yaw, 0.0);
        let (forward, up) = self.element.facing();
        if let Some(billboard) = self.billboard_mut() {
            billboard.set_orientation(forward, up);
        }
    }

    /// Move the label
    pub fn set_position(&mut self, position: Vec3) {
        self.element.set_position(position);
        if let Some(billboard) = self.billboard_mut() {
            billboard.set_position(position);
        }
    }

    /// Replace the text
    pub fn set_text(&mut self, text: &str) {
        if let Some(billboard) = self.billboard_mut() {
            billboard.inner_mut().set_text(text);
        }
    }

    /// Text currently shown
    pub fn text(&self) -> &str {
        self.billboard().map_or("", |billboard| billboard.inner().text())
    }

    /// The billboard carrying the text box
    pub fn billboard(&self) -> Option<&LabelBillboard> {
        self.element.primitive::<LabelBillboard>(self.label)
    }

    fn billboard_mut(&mut self) -> Option<&mut LabelBillboard> {
        self.element.primitive_mut::<LabelBillboard>(self.label)
    }
}

impl WorldContainer for WorldLabel {
    fn update(&mut self, ctx: &mut LayoutContext<'_>) -> LayoutResult<()> {
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
