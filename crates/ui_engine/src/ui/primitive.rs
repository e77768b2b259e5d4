//! Primitive trait, shared primitive state and per-frame contexts
//!
//! A primitive is a drawable UI building block (shape, text, text box,
//! button, composite). Each one owns its [`Renderable`]s exclusively and
//! keeps a [`PrimitiveState`] whose changes are pushed straight into the
//! renderable it is bound to.

use std::any::Any;
use std::rc::{Rc, Weak};

use std::cell::RefCell;

use crate::backend::{BackendResult, DepthBias, PrimitiveTopology, RenderDevice, RenderEncoder};
use crate::foundation::math::{Mat4, Vec2, Vec4};
use crate::input::InputState;
use crate::render::mesh::MeshData;
use crate::render::renderable::{Material, Renderable, SharedRenderable};
use crate::ui::transform::TransformArena;

/// Kind tag for a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Axis-aligned rectangle
    Rectangle,
    /// Rectangle with rounded corners
    RoundedRectangle,
    /// Filled circle
    Circle,
    /// Single run of text
    Text,
    /// Background plus padded text
    TextBox,
    /// Clickable text box
    Button,
    /// Group of child primitives
    Composite,
}

/// Which piece of [`PrimitiveState`] changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Material color
    Color,
    /// Primitive topology
    Topology,
    /// Screen-space flag
    ScreenSpace,
    /// Model transform override
    Transform,
    /// Depth bias
    DepthBias,
}

/// Where a primitive stands with respect to its GPU geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildState {
    /// Geometry matches the primitive's parameters
    Clean,
    /// Parameters changed since the last build
    #[default]
    Dirty,
}

/// Tracks geometry staleness and rebuilds at most once per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct RebuildTracker {
    state: RebuildState,
    last_rebuild_frame: Option<u64>,
}

impl RebuildTracker {
    /// Mark geometry as stale
    pub fn invalidate(&mut self) {
        self.state = RebuildState::Dirty;
    }

    /// Current state
    pub const fn state(&self) -> RebuildState {
        self.state
    }

    /// Whether a rebuild is pending
    pub fn is_dirty(&self) -> bool {
        self.state == RebuildState::Dirty
    }

    /// Claim the rebuild for `frame`
    ///
    /// Returns false when nothing is stale or a rebuild already ran this frame.
    pub fn begin_rebuild(&mut self, frame: u64) -> bool {
        if self.state == RebuildState::Clean || self.last_rebuild_frame == Some(frame) {
            return false;
        }
        self.last_rebuild_frame = Some(frame);
        true
    }

    /// Mark the claimed rebuild as done
    pub fn finish(&mut self) {
        self.state = RebuildState::Clean;
    }
}

/// Render state every primitive carries
///
/// Setters forward to the bound renderable immediately, so a color change
/// never needs a geometry rebuild.
#[derive(Debug)]
pub struct PrimitiveState {
    color: Vec4,
    topology: PrimitiveTopology,
    screen_space: bool,
    transform: Option<Mat4>,
    depth_bias: DepthBias,
    bound: Weak<RefCell<Renderable>>,
}

impl PrimitiveState {
    /// Screen-space state with the given color
    pub fn new(color: Vec4) -> Self {
        Self {
            color,
            topology: PrimitiveTopology::TriangleList,
            screen_space: true,
            transform: None,
            depth_bias: DepthBias::default(),
            bound: Weak::new(),
        }
    }

    /// Attach a renderable and push the current state into it
    pub fn bind(&mut self, renderable: &SharedRenderable) {
        self.bound = Rc::downgrade(renderable);
        self.apply(&mut renderable.borrow_mut());
    }

    /// Whether a live renderable is attached
    pub fn is_bound(&self) -> bool {
        self.bound.strong_count() > 0
    }

    /// Write every field into `renderable`
    pub fn apply(&self, renderable: &mut Renderable) {
        renderable.set_color(self.color);
        renderable.set_topology(self.topology);
        renderable.set_screen_space(self.screen_space);
        renderable.set_transform(self.transform.unwrap_or_else(Mat4::identity));
        renderable.set_depth_bias(self.depth_bias);
    }

    fn with_bound(&self, update: impl FnOnce(&mut Renderable)) {
        if let Some(renderable) = self.bound.upgrade() {
            update(&mut renderable.borrow_mut());
        }
    }

    /// Color
    pub const fn color(&self) -> Vec4 {
        self.color
    }

    /// Set the color
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
        self.with_bound(|r| r.set_color(color));
    }

    /// Topology
    pub const fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Set the topology
    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
        self.with_bound(|r| r.set_topology(topology));
    }

    /// Whether drawn as a screen overlay
    pub const fn is_screen_space(&self) -> bool {
        self.screen_space
    }

    /// Set the screen-space flag
    pub fn set_screen_space(&mut self, screen_space: bool) {
        self.screen_space = screen_space;
        self.with_bound(|r| r.set_screen_space(screen_space));
    }

    /// Model transform override
    pub const fn transform(&self) -> Option<&Mat4> {
        self.transform.as_ref()
    }

    /// Model matrix actually used for drawing
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.unwrap_or_else(Mat4::identity)
    }

    /// Set or clear the model transform override
    pub fn set_transform(&mut self, transform: Option<Mat4>) {
        self.transform = transform;
        let matrix = self.model_matrix();
        self.with_bound(|r| r.set_transform(matrix));
    }

    /// Depth bias
    pub const fn depth_bias(&self) -> DepthBias {
        self.depth_bias
    }

    /// Set the depth bias
    pub fn set_depth_bias(&mut self, depth_bias: DepthBias) {
        self.depth_bias = depth_bias;
        self.with_bound(|r| r.set_depth_bias(depth_bias));
    }
}

/// Everything a primitive needs while drawing
pub struct DrawContext<'a> {
    /// Resource side of the backend
    pub device: &'a mut dyn RenderDevice,
    /// Command side of the backend
    pub encoder: &'a mut dyn RenderEncoder,
    /// Input snapshot for this frame
    pub input: &'a InputState,
    /// Screen-layout transforms
    pub transforms: &'a TransformArena,
    /// Projection for the current pass
    pub projection: Mat4,
    /// View for the current pass
    pub view: Mat4,
    /// Monotonic frame counter
    pub frame: u64,
}

impl DrawContext<'_> {
    /// Current window size in pixels
    pub fn screen_size(&self) -> Vec2 {
        self.input.screen_size()
    }
}

/// Everything a container needs during the update phase
pub struct LayoutContext<'a> {
    /// Screen-layout transforms
    pub transforms: &'a mut TransformArena,
    /// Input snapshot for this frame
    pub input: &'a InputState,
    /// Seconds since the previous frame
    pub delta_seconds: f32,
}

impl LayoutContext<'_> {
    /// Current window size in pixels
    pub fn screen_size(&self) -> Vec2 {
        self.input.screen_size()
    }
}

/// A drawable UI building block
pub trait RenderablePrimitive: Any {
    /// Kind tag
    fn kind(&self) -> PrimitiveKind;

    /// Shared render state
    fn state(&self) -> &PrimitiveState;

    /// Shared render state, mutable
    fn state_mut(&mut self) -> &mut PrimitiveState;

    /// Rebuild geometry if stale and record draws
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()>;

    /// Local size in pixels (world units for billboards)
    fn content_size(&self) -> Vec2;

    /// Release GPU resources and any transforms owned by the primitive
    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena);

    /// Called after a state setter; composites forward the change to children
    fn state_changed(&mut self, _change: StateChange) {}

    /// Push content size into owned layout transforms
    fn sync_layout(&mut self, _transforms: &mut TransformArena) {}

    /// Upcast for downcasting to the concrete primitive
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete primitive
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Color
    fn color(&self) -> Vec4 {
        self.state().color()
    }

    /// Set the color
    fn set_color(&mut self, color: Vec4) {
        self.state_mut().set_color(color);
        self.state_changed(StateChange::Color);
    }

    /// Set the topology
    fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.state_mut().set_topology(topology);
        self.state_changed(StateChange::Topology);
    }

    /// Whether drawn as a screen overlay
    fn is_screen_space(&self) -> bool {
        self.state().is_screen_space()
    }

    /// Choose between screen overlay and world geometry
    fn set_screen_space(&mut self, screen_space: bool) {
        self.state_mut().set_screen_space(screen_space);
        self.state_changed(StateChange::ScreenSpace);
    }

    /// Override the model transform
    fn set_transform(&mut self, transform: Mat4) {
        self.state_mut().set_transform(Some(transform));
        self.state_changed(StateChange::Transform);
    }

    /// Drop the model transform override
    fn clear_transform(&mut self) {
        self.state_mut().set_transform(None);
        self.state_changed(StateChange::Transform);
    }

    /// Set the depth bias
    fn set_depth_bias(&mut self, depth_bias: DepthBias) {
        self.state_mut().set_depth_bias(depth_bias);
        self.state_changed(StateChange::DepthBias);
    }
}

/// Copy one changed field of `source` onto `target`
pub fn forward_state(source: &PrimitiveState, target: &mut dyn RenderablePrimitive, change: StateChange) {
    match change {
        StateChange::Color => target.set_color(source.color()),
        StateChange::Topology => target.set_topology(source.topology()),
        StateChange::ScreenSpace => target.set_screen_space(source.is_screen_space()),
        StateChange::Transform => match source.transform() {
            Some(matrix) => target.set_transform(*matrix),
            None => target.clear_transform(),
        },
        StateChange::DepthBias => target.set_depth_bias(source.depth_bias()),
    }
}

/// Primitives whose bottom-left corner can be moved
pub trait Positionable {
    /// Bottom-left corner in local pixels
    fn position(&self) -> Vec2;

    /// Move the bottom-left corner
    fn set_position(&mut self, position: Vec2);
}

/// The single renderable a leaf primitive drives
#[derive(Debug, Default)]
pub struct RenderSlot {
    renderable: Option<SharedRenderable>,
    tracker: RebuildTracker,
}

impl RenderSlot {
    /// Empty slot; the first draw builds
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a geometry rebuild on the next draw
    pub fn invalidate(&mut self) {
        self.tracker.invalidate();
    }

    /// Whether a rebuild is pending
    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Renderable built so far
    pub const fn renderable(&self) -> Option<&SharedRenderable> {
        self.renderable.as_ref()
    }

    /// Rebuild if stale, then draw
    ///
    /// `build` produces the mesh and material; it runs at most once per frame.
    pub fn draw_with(
        &mut self,
        state: &mut PrimitiveState,
        ctx: &mut DrawContext<'_>,
        build: impl FnOnce(&mut dyn RenderDevice) -> (MeshData, Material),
    ) -> BackendResult<()> {
        if self.tracker.begin_rebuild(ctx.frame) {
            let (mesh, material) = build(&mut *ctx.device);
            match &self.renderable {
                Some(renderable) => {
                    let mut renderable = renderable.borrow_mut();
                    renderable.update_mesh(&mut *ctx.device, &mesh)?;
                    renderable.set_texture(material.texture);
                }
                None => {
                    let renderable = Renderable::new(&mut *ctx.device, &mesh, material)?.into_shared();
                    state.bind(&renderable);
                    self.renderable = Some(renderable);
                }
            }
            self.tracker.finish();
            // Out of buffers: retry the upload next frame
            if !mesh.is_empty() && self.renderable.as_ref().is_some_and(|r| !r.borrow().has_mesh()) {
                log::debug!("Mesh upload deferred to the next frame");
                self.tracker.invalidate();
            }
        }
        match &self.renderable {
            Some(renderable) => renderable.borrow().draw(&mut *ctx.encoder, &ctx.projection, &ctx.view),
            None => Ok(()),
        }
    }

    /// Release GPU buffers; the next draw rebuilds
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        if let Some(renderable) = self.renderable.take() {
            renderable.borrow_mut().release(device);
        }
        self.tracker.invalidate();
    }
}
