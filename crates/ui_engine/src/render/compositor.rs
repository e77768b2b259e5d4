//! Per-frame pass ordering
//!
//! [`MeshRenderer`] draws one frame in three passes: standalone renderables,
//! world containers, then UI containers on top of everything.

use super::renderable::SharedRenderable;
use crate::backend::{BackendResult, DepthState, DrawCall, RenderDevice, RenderEncoder};
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::ui::element::{UiContainer, WorldContainer};
use crate::ui::primitive::DrawContext;

/// Camera for the world passes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// Projection matrix
    pub projection: Mat4,
    /// View matrix
    pub view: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            projection: Mat4::identity(),
            view: Mat4::identity(),
        }
    }
}

/// Draw counts for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draws from standalone renderables
    pub standalone_draws: usize,
    /// Draws from world containers
    pub world_draws: usize,
    /// Draws from UI containers
    pub ui_draws: usize,
}

impl FrameStats {
    /// Draws across all passes
    pub const fn total(&self) -> usize {
        self.standalone_draws + self.world_draws + self.ui_draws
    }
}

/// Encoder adapter that counts submitted draws
struct CountingEncoder<'a> {
    inner: &'a mut dyn RenderEncoder,
    draws: usize,
}

impl<'a> CountingEncoder<'a> {
    fn new(inner: &'a mut dyn RenderEncoder) -> Self {
        Self { inner, draws: 0 }
    }
}

impl RenderEncoder for CountingEncoder<'_> {
    fn set_depth_state(&mut self, state: DepthState) {
        self.inner.set_depth_state(state);
    }

    fn submit_draw(&mut self, call: &DrawCall) -> BackendResult<()> {
        self.inner.submit_draw(call)?;
        self.draws += 1;
        Ok(())
    }
}

/// Frame compositor
///
/// Holds renderables registered outside any container (debug geometry,
/// scene meshes) and orders every draw of a frame.
#[derive(Debug, Default)]
pub struct MeshRenderer {
    renderables: Vec<SharedRenderable>,
}

impl MeshRenderer {
    /// Create an empty compositor
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a standalone renderable
    pub fn add_renderable(&mut self, renderable: SharedRenderable) {
        self.renderables.push(renderable);
    }

    /// Unregister a standalone renderable; returns whether it was registered
    pub fn remove_renderable(&mut self, renderable: &SharedRenderable) -> bool {
        let before = self.renderables.len();
        self.renderables.retain(|r| !std::rc::Rc::ptr_eq(r, renderable));
        self.renderables.len() != before
    }

    /// Number of standalone renderables
    pub fn renderable_count(&self) -> usize {
        self.renderables.len()
    }

    /// Release the buffers of every standalone renderable and forget them
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        for renderable in self.renderables.drain(..) {
            renderable.borrow_mut().release(device);
        }
    }

    /// Draw a frame
    ///
    /// 1. Standalone renderables: screen-space ones with a pixel ortho
    ///    projection and depth testing off, the rest with `camera`
    /// 2. World containers with `camera` and depth testing on
    /// 3. UI containers with the pixel ortho projection and depth `Always`
    ///
    /// The first failed submission aborts the frame.
    pub fn draw_frame(
        &mut self,
        ctx: &mut DrawContext<'_>,
        camera: &CameraMatrices,
        world: &mut [Box<dyn WorldContainer>],
        ui: &mut [Box<dyn UiContainer>],
    ) -> BackendResult<FrameStats> {
        let screen = ctx.screen_size();
        let overlay = Mat4::screen_ortho(screen.x, screen.y);
        let mut stats = FrameStats::default();

        {
            let mut counting = CountingEncoder::new(&mut *ctx.encoder);
            counting.set_depth_state(DepthState::Enabled);
            for renderable in &self.renderables {
                let renderable = renderable.borrow();
                if renderable.is_screen_space() {
                    counting.set_depth_state(DepthState::Disabled);
                    renderable.draw(&mut counting, &overlay, &Mat4::identity())?;
                    counting.set_depth_state(DepthState::Enabled);
                } else {
                    renderable.draw(&mut counting, &camera.projection, &camera.view)?;
                }
            }
            stats.standalone_draws = counting.draws;
        }

        {
            let mut counting = CountingEncoder::new(&mut *ctx.encoder);
            counting.set_depth_state(DepthState::Enabled);
            let mut pass = DrawContext {
                device: &mut *ctx.device,
                encoder: &mut counting,
                input: ctx.input,
                transforms: ctx.transforms,
                projection: camera.projection,
                view: camera.view,
                frame: ctx.frame,
            };
            for container in world.iter_mut() {
                container.draw(&mut pass)?;
            }
            stats.world_draws = counting.draws;
        }

        {
            let mut counting = CountingEncoder::new(&mut *ctx.encoder);
            counting.set_depth_state(DepthState::Always);
            let mut pass = DrawContext {
                device: &mut *ctx.device,
                encoder: &mut counting,
                input: ctx.input,
                transforms: ctx.transforms,
                projection: overlay,
                view: Mat4::identity(),
                frame: ctx.frame,
            };
            for container in ui.iter_mut() {
                container.draw(&mut pass)?;
            }
            stats.ui_draws = counting.draws;
        }

        log::trace!("Frame {}: {:?}", ctx.frame, stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, RecordingDevice, RecordingEncoder};
    use crate::foundation::math::{Vec2, Vec3, Vec4};
    use crate::input::InputState;
    use crate::render::mesh::MeshData;
    use crate::render::renderable::{Material, Renderable};
    use crate::ui::element::{UiElement, WorldElement};
    use crate::ui::shapes::RectanglePrimitive;
    use crate::ui::transform::TransformArena;

    struct Scene {
        device: RecordingDevice,
        encoder: RecordingEncoder,
        input: InputState,
        transforms: TransformArena,
        renderer: MeshRenderer,
        world: Vec<Box<dyn WorldContainer>>,
        ui: Vec<Box<dyn UiContainer>>,
    }

    impl Scene {
        fn new(encoder: RecordingEncoder) -> Self {
            let mut transforms = TransformArena::new();
            let mut device = RecordingDevice::new();

            let mut hud = UiElement::new(&mut transforms, Vec2::new(10.0, 10.0), Vec2::new(50.0, 50.0));
            hud.add_primitive(Box::new(RectanglePrimitive::new(10.0, 10.0, 50.0, 50.0, Vec4::new(0.0, 1.0, 0.0, 1.0))));

            let mut props = WorldElement::new(Vec3::zeros());
            props.add_primitive(Box::new(RectanglePrimitive::new(0.0, 0.0, 1.0, 1.0, Vec4::new(0.0, 0.0, 1.0, 1.0))));

            let mut renderer = MeshRenderer::new();
            let overlay = Renderable::new(&mut device, &MeshData::quad(0.0, 0.0, 5.0, 5.0), Material::flat(Vec4::new(1.0, 0.0, 0.0, 1.0))).unwrap();
            let overlay = overlay.into_shared();
            overlay.borrow_mut().set_screen_space(true);
            renderer.add_renderable(overlay);
            let mesh = Renderable::new(&mut device, &MeshData::quad(0.0, 0.0, 5.0, 5.0), Material::flat(Vec4::new(1.0, 1.0, 1.0, 1.0))).unwrap();
            renderer.add_renderable(mesh.into_shared());

            Self {
                device,
                encoder,
                input: InputState::new(800.0, 600.0),
                transforms,
                renderer,
                world: vec![Box::new(props)],
                ui: vec![Box::new(hud)],
            }
        }

        fn draw(&mut self, camera: &CameraMatrices) -> BackendResult<FrameStats> {
            let mut ctx = DrawContext {
                device: &mut self.device,
                encoder: &mut self.encoder,
                input: &self.input,
                transforms: &self.transforms,
                projection: camera.projection,
                view: camera.view,
                frame: 0,
            };
            self.renderer.draw_frame(&mut ctx, camera, &mut self.world, &mut self.ui)
        }
    }

    fn camera() -> CameraMatrices {
        CameraMatrices {
            projection: Mat4::perspective(1.0, 4.0 / 3.0, 0.1, 100.0),
            view: Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), Vec3::y()),
        }
    }

    #[test]
    fn test_pass_order_and_depth_states() {
        let mut scene = Scene::new(RecordingEncoder::new());
        let stats = scene.draw(&camera()).unwrap();

        assert_eq!(stats, FrameStats { standalone_draws: 2, world_draws: 1, ui_draws: 1 });
        let draws = scene.encoder.draws();
        let depth: Vec<DepthState> = draws.iter().map(|d| d.depth_state).collect();
        assert_eq!(depth, vec![DepthState::Disabled, DepthState::Enabled, DepthState::Enabled, DepthState::Always]);
        let colors: Vec<[f32; 4]> = draws.iter().map(|d| d.call.color).collect();
        assert_eq!(colors[2], [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(colors[3], [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_matrices_per_pass() {
        let mut scene = Scene::new(RecordingEncoder::new());
        let camera = camera();
        scene.draw(&camera).unwrap();

        let overlay = crate::foundation::math::to_cols_array(&Mat4::screen_ortho(800.0, 600.0));
        let perspective = crate::foundation::math::to_cols_array(&camera.projection);
        let draws = scene.encoder.draws();
        assert_eq!(draws[0].call.projection, overlay);
        assert_eq!(draws[1].call.projection, perspective);
        assert_eq!(draws[2].call.projection, perspective);
        assert_eq!(draws[3].call.projection, overlay);
        assert_eq!(draws[3].call.view, crate::foundation::math::to_cols_array(&Mat4::identity()));
    }

    #[test]
    fn test_submission_failure_aborts_frame() {
        let mut scene = Scene::new(RecordingEncoder::failing_after(3));
        let result = scene.draw(&camera());

        assert!(matches!(result, Err(BackendError::DeviceLost(_))));
        assert_eq!(scene.encoder.draws().len(), 3);
    }

    #[test]
    fn test_remove_renderable() {
        let mut device = RecordingDevice::new();
        let mut renderer = MeshRenderer::new();
        let renderable = Renderable::new(&mut device, &MeshData::default(), Material::flat(Vec4::zeros()))
            .unwrap()
            .into_shared();
        renderer.add_renderable(renderable.clone());

        assert!(renderer.remove_renderable(&renderable));
        assert!(!renderer.remove_renderable(&renderable));
        assert_eq!(renderer.renderable_count(), 0);
    }

    #[test]
    fn test_release_frees_standalone_buffers() {
        let mut scene = Scene::new(RecordingEncoder::new());
        assert_eq!(scene.device.live_buffers(), 4);

        scene.renderer.release(&mut scene.device);
        assert_eq!(scene.device.live_buffers(), 0);
        assert_eq!(scene.renderer.renderable_count(), 0);
    }
}
