//! Flat-colored shape primitives

use std::any::Any;

use super::geometry;
use super::primitive::{
    DrawContext, Positionable, PrimitiveKind, PrimitiveState, RenderSlot, RenderablePrimitive,
};
use crate::backend::{BackendResult, RenderDevice};
use crate::foundation::math::{Vec2, Vec4};
use crate::render::mesh::MeshData;
use crate::render::renderable::Material;
use crate::ui::transform::TransformArena;

/// Default full-circle resolution for round shapes
pub const DEFAULT_SEGMENTS: u32 = 32;

macro_rules! primitive_plumbing {
    () => {
        fn state(&self) -> &PrimitiveState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut PrimitiveState {
            &mut self.state
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
    };
}

/// Axis-aligned filled rectangle
pub struct RectanglePrimitive {
    position: Vec2,
    size: Vec2,
    state: PrimitiveState,
    slot: RenderSlot,
}

impl RectanglePrimitive {
    /// Rectangle with its bottom-left corner at `(x, y)`
    pub fn new(x: f32, y: f32, width: f32, height: f32, color: Vec4) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            state: PrimitiveState::new(color),
            slot: RenderSlot::new(),
        }
    }

    /// Size in pixels
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Resize; geometry is rebuilt on the next draw
    pub fn set_size(&mut self, size: Vec2) {
        if size != self.size {
            self.size = size;
            self.slot.invalidate();
        }
    }

    /// Whether the geometry will be rebuilt on the next draw
    pub fn needs_rebuild(&self) -> bool {
        self.slot.is_dirty()
    }
}

impl Positionable for RectanglePrimitive {
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

impl RenderablePrimitive for RectanglePrimitive {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Rectangle
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        let (position, size, color) = (self.position, self.size, self.state.color());
        self.slot.draw_with(&mut self.state, ctx, |_| {
            let mesh = if size.x > 0.0 && size.y > 0.0 {
                MeshData::quad(position.x, position.y, size.x, size.y)
            } else {
                MeshData::default()
            };
            (mesh, Material::flat(color))
        })
    }

    fn content_size(&self) -> Vec2 {
        self.size
    }

    primitive_plumbing!();
}

/// Filled rectangle with rounded corners
pub struct RoundedRectanglePrimitive {
    position: Vec2,
    size: Vec2,
    corner_radius: f32,
    segments: u32,
    state: PrimitiveState,
    slot: RenderSlot,
}

impl RoundedRectanglePrimitive {
    /// Rounded rectangle with its bottom-left corner at `(x, y)`
    pub fn new(x: f32, y: f32, width: f32, height: f32, corner_radius: f32, color: Vec4) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            corner_radius,
            segments: DEFAULT_SEGMENTS,
            state: PrimitiveState::new(color),
            slot: RenderSlot::new(),
        }
    }

    /// Size in pixels
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Resize; geometry is rebuilt on the next draw
    pub fn set_size(&mut self, size: Vec2) {
        if size != self.size {
            self.size = size;
            self.slot.invalidate();
        }
    }

    /// Corner radius before clamping
    pub const fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    /// Change the corner radius
    pub fn set_corner_radius(&mut self, corner_radius: f32) {
        if corner_radius != self.corner_radius {
            self.corner_radius = corner_radius;
            self.slot.invalidate();
        }
    }

    /// Change the full-circle resolution of the corners
    pub fn set_segments(&mut self, segments: u32) {
        if segments != self.segments {
            self.segments = segments;
            self.slot.invalidate();
        }
    }

    /// Whether the geometry will be rebuilt on the next draw
    pub fn needs_rebuild(&self) -> bool {
        self.slot.is_dirty()
    }
}

impl Positionable for RoundedRectanglePrimitive {
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

impl RenderablePrimitive for RoundedRectanglePrimitive {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::RoundedRectangle
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        let (position, size, radius, segments) = (self.position, self.size, self.corner_radius, self.segments);
        let color = self.state.color();
        self.slot.draw_with(&mut self.state, ctx, |_| {
            (geometry::rounded_rectangle(position, size, radius, segments), Material::flat(color))
        })
    }

    fn content_size(&self) -> Vec2 {
        self.size
    }

    primitive_plumbing!();
}

/// Filled circle
pub struct CirclePrimitive {
    center: Vec2,
    radius: f32,
    segments: u32,
    state: PrimitiveState,
    slot: RenderSlot,
}

impl CirclePrimitive {
    /// Circle around `(x, y)`
    pub fn new(x: f32, y: f32, radius: f32, color: Vec4) -> Self {
        Self {
            center: Vec2::new(x, y),
            radius,
            segments: DEFAULT_SEGMENTS,
            state: PrimitiveState::new(color),
            slot: RenderSlot::new(),
        }
    }

    /// Center in local pixels
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Radius in pixels
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Change the radius
    pub fn set_radius(&mut self, radius: f32) {
        if radius != self.radius {
            self.radius = radius;
            self.slot.invalidate();
        }
    }

    /// Change the number of rim segments
    pub fn set_segments(&mut self, segments: u32) {
        if segments != self.segments {
            self.segments = segments;
            self.slot.invalidate();
        }
    }
}

/// Position is the bottom-left of the bounding square
impl Positionable for CirclePrimitive {
    fn position(&self) -> Vec2 {
        self.center - Vec2::new(self.radius, self.radius)
    }

    fn set_position(&mut self, position: Vec2) {
        let center = position + Vec2::new(self.radius, self.radius);
        if center != self.center {
            self.center = center;
            self.slot.invalidate();
        }
    }
}

impl RenderablePrimitive for CirclePrimitive {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Circle
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        let (center, radius, segments, color) = (self.center, self.radius, self.segments, self.state.color());
        self.slot.draw_with(&mut self.state, ctx, |_| {
            (geometry::circle(center, radius, segments), Material::flat(color))
        })
    }

    fn content_size(&self) -> Vec2 {
        Vec2::new(self.radius * 2.0, self.radius * 2.0)
    }

    primitive_plumbing!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DepthBias, RecordingDevice, RecordingEncoder};
    use crate::foundation::math::Mat4;
    use crate::input::InputState;

    struct Frame {
        device: RecordingDevice,
        encoder: RecordingEncoder,
        input: InputState,
        transforms: TransformArena,
    }

    impl Frame {
        fn new() -> Self {
            Self {
                device: RecordingDevice::new(),
                encoder: RecordingEncoder::new(),
                input: InputState::default(),
                transforms: TransformArena::new(),
            }
        }

        fn draw(&mut self, primitive: &mut dyn RenderablePrimitive, frame: u64) {
            let mut ctx = DrawContext {
                device: &mut self.device,
                encoder: &mut self.encoder,
                input: &self.input,
                transforms: &self.transforms,
                projection: Mat4::identity(),
                view: Mat4::identity(),
                frame,
            };
            primitive.draw(&mut ctx).unwrap();
        }
    }

    #[test]
    fn test_color_change_does_not_rebuild() {
        let mut frame = Frame::new();
        let mut rect = RectanglePrimitive::new(0.0, 0.0, 10.0, 10.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        frame.draw(&mut rect, 0);
        let uploads = frame.device.upload_count();

        rect.set_color(Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert!(!rect.needs_rebuild());
        frame.draw(&mut rect, 1);

        assert_eq!(frame.device.upload_count(), uploads);
        assert_eq!(frame.encoder.draws()[1].call.color, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_move_rebuilds_in_place() {
        let mut frame = Frame::new();
        let mut rect = RectanglePrimitive::new(0.0, 0.0, 10.0, 10.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        frame.draw(&mut rect, 0);
        let allocations = frame.device.total_allocations();

        rect.set_position(Vec2::new(5.0, 5.0));
        assert!(rect.needs_rebuild());
        frame.draw(&mut rect, 1);

        assert!(!rect.needs_rebuild());
        assert_eq!(frame.device.total_allocations(), allocations);
    }

    #[test]
    fn test_rounded_rectangle_keeps_depth_bias() {
        let mut frame = Frame::new();
        let mut rounded = RoundedRectanglePrimitive::new(0.0, 0.0, 50.0, 20.0, 8.0, Vec4::new(0.1, 0.1, 0.1, 1.0));
        rounded.set_depth_bias(DepthBias::new(10.0, 10.0));
        frame.draw(&mut rounded, 0);

        let draw = &frame.encoder.draws()[0].call;
        assert_eq!(draw.depth_bias, DepthBias::new(10.0, 10.0));
        assert_eq!(rounded.kind(), PrimitiveKind::RoundedRectangle);
    }

    #[test]
    fn test_circle_position_is_bounding_square() {
        let mut circle = CirclePrimitive::new(10.0, 10.0, 4.0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(circle.position(), Vec2::new(6.0, 6.0));
        circle.set_position(Vec2::zeros());
        assert_eq!(circle.center(), Vec2::new(4.0, 4.0));
        assert_eq!(circle.content_size(), Vec2::new(8.0, 8.0));
    }

    #[test]
    fn test_release_frees_buffers() {
        let mut frame = Frame::new();
        let mut circle = CirclePrimitive::new(0.0, 0.0, 3.0, Vec4::new(1.0, 1.0, 1.0, 1.0));
        frame.draw(&mut circle, 0);
        assert_eq!(frame.device.live_buffers(), 2);

        circle.release(&mut frame.device, &mut frame.transforms);
        assert_eq!(frame.device.live_buffers(), 0);
    }
}
