//! Containers: screen-space elements and world-space elements
//!
//! Containers own their primitives outright and are owned by the engine.
//! Each frame the engine calls `update` (layout, timers) on every
//! container, then `draw` inside the matching compositor pass.

use std::any::Any;

use super::primitive::{DrawContext, LayoutContext, RenderablePrimitive};
use super::transform::{AnchorPoint, AnchorSpec, LayoutResult, TransformArena, TransformId};
use crate::backend::{BackendResult, RenderDevice};
use crate::foundation::math::{facing_from_pitch_yaw, Vec2, Vec3, Vec4};
use crate::input::collision::bounding_rect;
use crate::render::mesh::{quad_vertices, MeshData};
use crate::render::renderable::{Material, Renderable, SharedRenderable};

/// Index of a primitive inside its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveHandle(usize);

/// A container drawn in the screen-space overlay pass
pub trait UiContainer: Any {
    /// Layout and timers for this frame
    fn update(&mut self, ctx: &mut LayoutContext<'_>) -> LayoutResult<()>;

    /// Record draws
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()>;

    /// Release GPU resources and transforms
    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena);

    /// Upcast for downcasting to the concrete container
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A container drawn in the depth-tested world pass
pub trait WorldContainer: Any {
    /// Per-frame update
    fn update(&mut self, ctx: &mut LayoutContext<'_>) -> LayoutResult<()>;

    /// Record draws
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()>;

    /// Release GPU resources and transforms
    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena);

    /// Upcast for downcasting to the concrete container
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Window corner an element can snap to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScreenCorner {
    /// Top-left corner
    TopLeft,
    /// Top-right corner
    TopRight,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom-right corner
    BottomRight,
}

impl ScreenCorner {
    /// Matching anchor point
    pub const fn anchor_point(self) -> AnchorPoint {
        match self {
            Self::TopLeft => AnchorPoint::TopLeft,
            Self::TopRight => AnchorPoint::TopRight,
            Self::BottomLeft => AnchorPoint::BottomLeft,
            Self::BottomRight => AnchorPoint::BottomRight,
        }
    }

    /// Bottom-left position of a `size` box inset by `margin` from this corner
    pub fn place(self, screen: Vec2, size: Vec2, margin: Vec2) -> Vec2 {
        let right = screen.x - size.x - margin.x;
        let top = screen.y - size.y - margin.y;
        match self {
            Self::BottomLeft => margin,
            Self::BottomRight => Vec2::new(right, margin.y),
            Self::TopLeft => Vec2::new(margin.x, top),
            Self::TopRight => Vec2::new(right, top),
        }
    }

    /// Anchor offset that insets by `margin` towards the screen center
    pub fn inset_offset(self, margin: Vec2) -> Vec2 {
        match self {
            Self::BottomLeft => margin,
            Self::BottomRight => Vec2::new(-margin.x, margin.y),
            Self::TopLeft => Vec2::new(margin.x, -margin.y),
            Self::TopRight => -margin,
        }
    }
}

/// Auto-anchor settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoAnchor {
    /// Corner to stick to
    pub corner: ScreenCorner,
    /// Distance from the window edges
    pub margin: Vec2,
}

/// A solid quad whose vertices are rewritten only when it moves
#[derive(Debug)]
struct CachedQuad {
    color: Vec4,
    renderable: Option<SharedRenderable>,
    placed: Option<(Vec2, Vec2)>,
}

impl CachedQuad {
    const fn new(color: Vec4) -> Self {
        Self { color, renderable: None, placed: None }
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>, position: Vec2, size: Vec2) -> BackendResult<()> {
        if size.x <= 0.0 || size.y <= 0.0 {
            return Ok(());
        }
        // Built while out of buffers: start over
        if self.renderable.as_ref().is_some_and(|r| !r.borrow().has_mesh()) {
            self.renderable = None;
            self.placed = None;
        }
        match &self.renderable {
            None => {
                let mesh = MeshData::quad(position.x, position.y, size.x, size.y);
                let mut renderable = Renderable::new(&mut *ctx.device, &mesh, Material::flat(self.color))?;
                renderable.set_screen_space(true);
                self.renderable = Some(renderable.into_shared());
                self.placed = Some((position, size));
            }
            Some(renderable) if self.placed != Some((position, size)) => {
                let vertices = quad_vertices(position.x, position.y, size.x, size.y);
                renderable.borrow_mut().write_vertices(&mut *ctx.device, &vertices)?;
                self.placed = Some((position, size));
            }
            Some(_) => {}
        }
        match &self.renderable {
            Some(renderable) => renderable.borrow().draw(&mut *ctx.encoder, &ctx.projection, &ctx.view),
            None => Ok(()),
        }
    }

    fn set_color(&mut self, color: Vec4) {
        self.color = color;
        if let Some(renderable) = &self.renderable {
            renderable.borrow_mut().set_color(color);
        }
    }

    fn release(&mut self, device: &mut dyn RenderDevice) {
        if let Some(renderable) = self.renderable.take() {
            renderable.borrow_mut().release(device);
        }
        self.placed = None;
    }
}

/// Screen-space element: a layout transform plus the primitives drawn with it
pub struct UiElement {
    transform: TransformId,
    primitives: Vec<Box<dyn RenderablePrimitive>>,
    auto_anchor: Option<AutoAnchor>,
    cached_position: Option<Vec2>,
    background: Option<CachedQuad>,
    size_to_content: bool,
    visible: bool,
}

impl UiElement {
    /// Element at `position` with `size`
    pub fn new(transforms: &mut TransformArena, position: Vec2, size: Vec2) -> Self {
        Self {
            transform: transforms.insert(position, size),
            primitives: Vec::new(),
            auto_anchor: None,
            cached_position: None,
            background: None,
            size_to_content: false,
            visible: true,
        }
    }

    /// Layout transform; parent children to it to move with the element
    pub const fn transform(&self) -> TransformId {
        self.transform
    }

    /// Take ownership of a primitive
    pub fn add_primitive(&mut self, primitive: Box<dyn RenderablePrimitive>) -> PrimitiveHandle {
        self.primitives.push(primitive);
        PrimitiveHandle(self.primitives.len() - 1)
    }

    /// Primitive behind `handle` as its concrete type
    pub fn primitive<T: RenderablePrimitive>(&self, handle: PrimitiveHandle) -> Option<&T> {
        self.primitives.get(handle.0)?.as_any().downcast_ref()
    }

    /// Primitive behind `handle` as its concrete type, mutable
    pub fn primitive_mut<T: RenderablePrimitive>(&mut self, handle: PrimitiveHandle) -> Option<&mut T> {
        self.primitives.get_mut(handle.0)?.as_any_mut().downcast_mut()
    }

    /// Number of primitives
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Move the element (ignored while auto-anchored)
    pub fn set_position(&mut self, transforms: &mut TransformArena, position: Vec2) -> LayoutResult<()> {
        transforms.set_position(self.transform, position)
    }

    /// Resize the element
    pub fn set_size(&mut self, transforms: &mut TransformArena, size: Vec2) -> LayoutResult<()> {
        transforms.set_size(self.transform, size)
    }

    /// Show or hide the element
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether the element is drawn
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Keep the element's size equal to its primitives' extent on every update
    pub fn set_size_to_content(&mut self, size_to_content: bool) {
        self.size_to_content = size_to_content;
    }

    /// Draw a solid quad of `color` behind the primitives
    pub fn set_background(&mut self, color: Vec4) {
        match self.background.as_mut() {
            Some(background) => background.set_color(color),
            None => self.background = Some(CachedQuad::new(color)),
        }
    }

    /// Remove the background quad
    pub fn clear_background(&mut self, device: &mut dyn RenderDevice) {
        if let Some(mut background) = self.background.take() {
            background.release(device);
        }
    }

    /// Snap to `corner`, inset by the margins, re-evaluated every frame
    ///
    /// Also anchors the layout transform so children anchored to the element
    /// resolve against the snapped position.
    pub fn enable_auto_anchor(
        &mut self,
        transforms: &mut TransformArena,
        corner: ScreenCorner,
        margin_x: f32,
        margin_y: f32,
    ) -> LayoutResult<()> {
        let margin = Vec2::new(margin_x, margin_y);
        let offset = corner.inset_offset(margin);
        transforms.set_anchor(self.transform, Some(AnchorSpec::screen(corner.anchor_point(), offset.x, offset.y)))?;
        self.auto_anchor = Some(AutoAnchor { corner, margin });
        self.cached_position = None;
        Ok(())
    }

    /// Stop snapping; the element keeps its local position
    pub fn disable_auto_anchor(&mut self, transforms: &mut TransformArena) -> LayoutResult<()> {
        self.auto_anchor = None;
        transforms.set_anchor(self.transform, None)
    }

    /// Current auto-anchor settings
    pub const fn auto_anchor(&self) -> Option<AutoAnchor> {
        self.auto_anchor
    }

    /// Position used for the last draw
    pub const fn cached_position(&self) -> Option<Vec2> {
        self.cached_position
    }

    /// Resize the element to the extent of its primitives
    ///
    /// Each primitive contributes a box at the origin of its content size;
    /// the element takes the size of their union.
    pub fn update_size_from_primitives(&mut self, transforms: &mut TransformArena) -> LayoutResult<Vec2> {
        let size = content_extent(&self.primitives);
        transforms.set_size(self.transform, size)?;
        Ok(size)
    }

    /// Position the element should draw at this frame
    fn resolve_position(&self, ctx: &DrawContext<'_>) -> Option<Vec2> {
        match self.auto_anchor {
            Some(AutoAnchor { corner, margin }) => {
                let size = ctx.transforms.size(self.transform)?;
                Some(corner.place(ctx.screen_size(), size, margin))
            }
            None => ctx.transforms.absolute_position(self.transform, ctx.screen_size()),
        }
    }
}

impl UiContainer for UiElement {
    fn update(&mut self, ctx: &mut LayoutContext<'_>) -> LayoutResult<()> {
        for primitive in &mut self.primitives {
            primitive.sync_layout(ctx.transforms);
        }
        if self.size_to_content {
            self.update_size_from_primitives(ctx.transforms)?;
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        if !self.visible {
            return Ok(());
        }
        let Some(position) = self.resolve_position(ctx) else {
            return Ok(());
        };
        if self.cached_position != Some(position) {
            log::trace!("Element moved to ({}, {})", position.x, position.y);
            self.cached_position = Some(position);
        }

        if let Some(background) = self.background.as_mut() {
            let size = ctx.transforms.size(self.transform).unwrap_or_else(Vec2::zeros);
            background.draw(ctx, position, size)?;
        }
        for primitive in &mut self.primitives {
            primitive.draw(ctx)?;
        }
        Ok(())
    }

    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena) {
        if let Some(background) = self.background.as_mut() {
            background.release(device);
        }
        for primitive in &mut self.primitives {
            primitive.release(device, transforms);
        }
        transforms.remove(self.transform);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// World-space element: a position and orientation plus the primitives
/// drawn in the world pass
///
/// Primitives added here are switched to world space; their model
/// transforms are their own.
pub struct WorldElement {
    position: Vec3,
    rotation: Vec3,
    primitives: Vec<Box<dyn RenderablePrimitive>>,
    visible: bool,
}

impl WorldElement {
    /// Element at `position` facing +Z
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::zeros(),
            primitives: Vec::new(),
            visible: true,
        }
    }

    /// Take ownership of a primitive, switching it to world space
    pub fn add_primitive(&mut self, mut primitive: Box<dyn RenderablePrimitive>) -> PrimitiveHandle {
        primitive.set_screen_space(false);
        self.primitives.push(primitive);
        PrimitiveHandle(self.primitives.len() - 1)
    }

    /// Primitive behind `handle` as its concrete type
    pub fn primitive<T: RenderablePrimitive>(&self, handle: PrimitiveHandle) -> Option<&T> {
        self.primitives.get(handle.0)?.as_any().downcast_ref()
    }

    /// Primitive behind `handle` as its concrete type, mutable
    pub fn primitive_mut<T: RenderablePrimitive>(&mut self, handle: PrimitiveHandle) -> Option<&mut T> {
        self.primitives.get_mut(handle.0)?.as_any_mut().downcast_mut()
    }

    /// World position
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the element
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Euler rotation (pitch, yaw, roll) in radians
    pub const fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Set the Euler rotation (pitch, yaw, roll) in radians
    pub fn set_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.rotation = Vec3::new(pitch, yaw, roll);
    }

    /// Forward and up vectors for the current pitch and yaw
    pub fn facing(&self) -> (Vec3, Vec3) {
        facing_from_pitch_yaw(self.rotation.x, self.rotation.y)
    }

    /// Show or hide the element
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Extent covering every primitive's content, in pixels
    pub fn content_size(&self) -> Vec2 {
        content_extent(&self.primitives)
    }
}

/// Box from the origin out to the largest primitive content size
fn content_extent(primitives: &[Box<dyn RenderablePrimitive>]) -> Vec2 {
    let corners = primitives
        .iter()
        .flat_map(|primitive| [Vec2::zeros(), primitive.content_size()]);
    bounding_rect(corners).map_or_else(Vec2::zeros, |(min, max)| max - min)
}

impl WorldContainer for WorldElement {
    fn update(&mut self, ctx: &mut LayoutContext<'_>) -> LayoutResult<()> {
        for primitive in &mut self.primitives {
            primitive.sync_layout(ctx.transforms);
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        if !self.visible {
            return Ok(());
        }
        for primitive in &mut self.primitives {
            primitive.draw(ctx)?;
        }
        Ok(())
    }

    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena) {
        for primitive in &mut self.primitives {
            primitive.release(device, transforms);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
