//! Wrappers that place a primitive on screen or in the world
//!
//! [`ScreenPlaced`] gives a primitive a node in the [`TransformArena`] so it
//! can be anchored to the screen or to a parent element. [`Billboard`] maps a
//! pixel-space primitive onto a quad of a given world size.

use std::any::Any;
use std::rc::Rc;

use super::primitive::{
    DrawContext, Positionable, PrimitiveKind, PrimitiveState, RenderablePrimitive, StateChange,
};
use super::text_box::{TextBoxConfig, TextBoxPrimitive};
use super::transform::{AnchorSpec, LayoutResult, TransformArena, TransformId};
use crate::backend::{BackendResult, RenderDevice};
use crate::foundation::math::{Mat4, Mat4Ext, Vec2, Vec3};
use crate::text::GlyphAtlas;

/// Pixel extent world text boxes are laid out in
pub const WORLD_PIXEL_EXTENT: f32 = 512.0;

/// Font size world text boxes are meant to be baked at
pub const WORLD_FONT_SIZE: f32 = 32.0;

/// A primitive positioned by a layout transform
///
/// Before each draw the primitive is moved to the transform's absolute
/// position; during layout the transform is resized to the primitive's
/// content.
pub struct ScreenPlaced<P> {
    transform: TransformId,
    inner: P,
}

impl<P: RenderablePrimitive + Positionable> ScreenPlaced<P> {
    /// Register a transform at the primitive's current position and size
    pub fn new(transforms: &mut TransformArena, inner: P) -> Self {
        let transform = transforms.insert(inner.position(), inner.content_size());
        Self { transform, inner }
    }

    /// Register and attach to `parent` with `anchor`
    pub fn anchored(
        transforms: &mut TransformArena,
        inner: P,
        parent: Option<TransformId>,
        anchor: AnchorSpec,
    ) -> LayoutResult<Self> {
        let placed = Self::new(transforms, inner);
        transforms.set_parent(placed.transform, parent)?;
        transforms.set_anchor(placed.transform, Some(anchor))?;
        Ok(placed)
    }

    /// Layout transform
    pub const fn transform(&self) -> TransformId {
        self.transform
    }

    /// Wrapped primitive
    pub const fn inner(&self) -> &P {
        &self.inner
    }

    /// Wrapped primitive, mutable
    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }
}

impl<P: RenderablePrimitive + Positionable> RenderablePrimitive for ScreenPlaced<P> {
    fn kind(&self) -> PrimitiveKind {
        self.inner.kind()
    }

    fn state(&self) -> &PrimitiveState {
        self.inner.state()
    }

    fn state_mut(&mut self) -> &mut PrimitiveState {
        self.inner.state_mut()
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        if let Some(position) = ctx.transforms.absolute_position(self.transform, ctx.screen_size()) {
            if position != self.inner.position() {
                self.inner.set_position(position);
            }
        }
        self.inner.draw(ctx)
    }

    fn content_size(&self) -> Vec2 {
        self.inner.content_size()
    }

    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena) {
        self.inner.release(device, transforms);
        transforms.remove(self.transform);
    }

    fn state_changed(&mut self, change: StateChange) {
        self.inner.state_changed(change);
    }

    fn sync_layout(&mut self, transforms: &mut TransformArena) {
        self.inner.sync_layout(transforms);
        if !transforms.contains(self.transform) {
            return;
        }
        let size = self.inner.content_size();
        if transforms.size(self.transform) != Some(size) {
            if let Err(err) = transforms.set_size(self.transform, size) {
                log::warn!("Failed to resize placed primitive: {}", err);
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

/// A pixel-space primitive mapped onto a world-space quad
///
/// The inner primitive is laid out in `pixel_extent` pixels with its
/// bottom-left at the origin; the billboard scales that extent to
/// `world_size` and centers it on `position`, facing along `forward`.
pub struct Billboard<P> {
    inner: P,
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    world_size: Vec2,
    pixel_extent: Vec2,
}

impl<P: RenderablePrimitive> Billboard<P> {
    /// Wrap `inner` (drawn in `pixel_extent` pixels) as a `world_size` quad at `position`
    pub fn new(inner: P, position: Vec3, world_size: Vec2, pixel_extent: Vec2) -> Self {
        let mut billboard = Self {
            inner,
            position,
            forward: Vec3::z(),
            up: Vec3::y(),
            world_size,
            pixel_extent,
        };
        billboard.inner.set_screen_space(false);
        billboard.apply_transform();
        billboard
    }

    /// World position of the quad's center
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the quad
    pub fn set_position(&mut self, position: Vec3) {
        if position != self.position {
            self.position = position;
            self.apply_transform();
        }
    }

    /// Point the quad's normal along `forward` with `up` as its vertical
    pub fn set_orientation(&mut self, forward: Vec3, up: Vec3) {
        if forward != self.forward || up != self.up {
            self.forward = forward;
            self.up = up;
            self.apply_transform();
        }
    }

    /// World size of the quad
    pub const fn world_size(&self) -> Vec2 {
        self.world_size
    }

    /// Change the world size
    pub fn set_world_size(&mut self, world_size: Vec2) {
        if world_size != self.world_size {
            self.world_size = world_size;
            self.apply_transform();
        }
    }

    /// Wrapped primitive
    pub const fn inner(&self) -> &P {
        &self.inner
    }

    /// Wrapped primitive, mutable
    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }

    /// Model matrix mapping inner pixels to world space
    pub fn model_matrix(&self) -> Mat4 {
        let extent = Vec2::new(self.pixel_extent.x.max(1.0), self.pixel_extent.y.max(1.0));
        let scale = Vec3::new(self.world_size.x / extent.x, self.world_size.y / extent.y, 1.0);
        let centered = Mat4::new_translation(&Vec3::new(-extent.x * 0.5, -extent.y * 0.5, 0.0));
        Mat4::billboard(self.position, self.forward, self.up, scale) * centered
    }

    fn apply_transform(&mut self) {
        let model = self.model_matrix();
        self.inner.set_transform(model);
    }
}

impl Billboard<TextBoxPrimitive> {
    /// Fixed 512x512-pixel text box shown as a `world_size` quad
    ///
    /// `atlas` should be baked at [`WORLD_FONT_SIZE`] so glyphs stay sharp.
    pub fn text_box(
        atlas: Rc<GlyphAtlas>,
        text: &str,
        position: Vec3,
        world_size: Vec2,
        config: TextBoxConfig,
    ) -> Self {
        let config = TextBoxConfig { auto_size: false, ..config };
        let inner = TextBoxPrimitive::new(atlas, text, 0.0, 0.0, WORLD_PIXEL_EXTENT, WORLD_PIXEL_EXTENT, config);
        Self::new(inner, position, world_size, Vec2::new(WORLD_PIXEL_EXTENT, WORLD_PIXEL_EXTENT))
    }
}

impl<P: RenderablePrimitive> RenderablePrimitive for Billboard<P> {
    fn kind(&self) -> PrimitiveKind {
        self.inner.kind()
    }

    fn state(&self) -> &PrimitiveState {
        self.inner.state()
    }

    fn state_mut(&mut self) -> &mut PrimitiveState {
        self.inner.state_mut()
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        self.inner.draw(ctx)
    }

    fn content_size(&self) -> Vec2 {
        self.world_size
    }

    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena) {
        self.inner.release(device, transforms);
    }

    fn state_changed(&mut self, change: StateChange) {
        self.inner.state_changed(change);
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
    use crate::foundation::math::{Point3, Vec4};
    use crate::input::InputState;
    use crate::ui::shapes::RectanglePrimitive;
    use crate::ui::transform::AnchorPoint;
    use approx::assert_relative_eq;

    fn atlas() -> Rc<GlyphAtlas> {
        Rc::new(GlyphAtlas::fixed_pitch(10.0, 8.0, -2.0))
    }

    #[test]
    fn test_screen_placed_follows_anchor() {
        let mut transforms = TransformArena::new();
        let rect = RectanglePrimitive::new(0.0, 0.0, 50.0, 20.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        let anchor = AnchorSpec::screen(AnchorPoint::TopRight, -10.0, -10.0);
        let mut placed = ScreenPlaced::anchored(&mut transforms, rect, None, anchor).unwrap();

        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        let input = InputState::new(800.0, 600.0);
        let mut ctx = DrawContext {
            device: &mut device,
            encoder: &mut encoder,
            input: &input,
            transforms: &transforms,
            projection: Mat4::identity(),
            view: Mat4::identity(),
            frame: 0,
        };
        placed.draw(&mut ctx).unwrap();

        assert_eq!(placed.inner().position(), Vec2::new(740.0, 570.0));
        assert_eq!(encoder.draws().len(), 1);
    }

    #[test]
    fn test_sync_layout_tracks_content_size() {
        let mut transforms = TransformArena::new();
        let text_box = TextBoxPrimitive::auto_sized(atlas(), "ab", 0.0, 0.0, TextBoxConfig::default());
        let mut placed = ScreenPlaced::new(&mut transforms, text_box);
        assert_eq!(transforms.size(placed.transform()), Some(Vec2::new(50.0, 40.0)));

        placed.inner_mut().set_text("abcd");
        placed.sync_layout(&mut transforms);
        assert_eq!(transforms.size(placed.transform()), Some(Vec2::new(70.0, 40.0)));
        assert!(transforms.get(placed.transform()).is_some_and(|t| t.anchor.is_none()));
    }

    #[test]
    fn test_sync_layout_ignores_removed_transform() {
        let mut transforms = TransformArena::new();
        let text_box = TextBoxPrimitive::auto_sized(atlas(), "ab", 0.0, 0.0, TextBoxConfig::default());
        let mut placed = ScreenPlaced::new(&mut transforms, text_box);
        transforms.remove(placed.transform());

        placed.inner_mut().set_text("abcd");
        placed.sync_layout(&mut transforms);
        assert!(!transforms.contains(placed.transform()));
        assert!(transforms.is_empty());
    }

    #[test]
    fn test_release_removes_transform() {
        let mut transforms = TransformArena::new();
        let mut device = RecordingDevice::new();
        let rect = RectanglePrimitive::new(0.0, 0.0, 5.0, 5.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        let mut placed = ScreenPlaced::new(&mut transforms, rect);

        placed.release(&mut device, &mut transforms);
        assert!(transforms.is_empty());
    }

    #[test]
    fn test_billboard_maps_pixels_to_world_units() {
        let label = Billboard::text_box(atlas(), "hi", Vec3::new(0.0, 1.0, -5.0), Vec2::new(2.0, 2.0), TextBoxConfig::default());
        let model = label.model_matrix();

        let corner = model.transform_point(&Point3::new(512.0, 512.0, 0.0));
        assert_relative_eq!(corner, Point3::new(1.0, 2.0, -5.0), epsilon = 1e-5);
        let center = model.transform_point(&Point3::new(256.0, 256.0, 0.0));
        assert_relative_eq!(center, Point3::new(0.0, 1.0, -5.0), epsilon = 1e-5);

        assert!(!label.is_screen_space());
        assert_eq!(label.content_size(), Vec2::new(2.0, 2.0));
        assert_eq!(label.inner().size(), Vec2::new(512.0, 512.0));
    }

    #[test]
    fn test_billboard_orientation_updates_inner_transform() {
        let mut label = Billboard::text_box(atlas(), "hi", Vec3::zeros(), Vec2::new(2.0, 2.0), TextBoxConfig::default());
        label.set_orientation(Vec3::x(), Vec3::y());

        let inner_transform = label.inner().state().transform().copied().unwrap();
        assert_relative_eq!(inner_transform, label.model_matrix());
        // facing +X: the quad's width runs along -Z
        let right = inner_transform.transform_vector(&Vec3::new(512.0, 0.0, 0.0));
        assert_relative_eq!(right, Vec3::new(0.0, 0.0, -2.0), epsilon = 1e-5);
    }
}
