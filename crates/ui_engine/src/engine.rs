//! Engine glue
//!
//! [`UiEngine`] owns every piece of per-process UI state and steps it one
//! frame at a time against a caller-supplied backend.

use thiserror::Error;

use crate::backend::{BackendError, RenderDevice, RenderEncoder};
use crate::config::{ConfigError, EngineConfig};
use crate::input::InputState;
use crate::render::{CameraMatrices, FrameStats, MeshRenderer};
use crate::text::{FontCache, FontError};
use crate::ui::element::{UiContainer, WorldContainer};
use crate::ui::monitor::DebugMonitor;
use crate::ui::primitive::{DrawContext, LayoutContext};
use crate::ui::transform::{LayoutError, TransformArena};

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// GPU backend failure
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Transform tree edit failure
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Configuration failure
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Font failure
    #[error("Font error: {0}")]
    Font(#[from] FontError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// UI engine
///
/// Holds the font cache, the layout transforms, the input snapshot, the
/// compositor and both container lists.
pub struct UiEngine {
    config: EngineConfig,
    fonts: FontCache,
    transforms: TransformArena,
    input: InputState,
    renderer: MeshRenderer,
    ui: Vec<Box<dyn UiContainer>>,
    world: Vec<Box<dyn WorldContainer>>,
    frame_index: u64,
}

impl UiEngine {
    /// Engine reading fonts from the filesystem
    pub fn new(config: EngineConfig) -> Self {
        Self::with_font_cache(config, FontCache::default())
    }

    /// Engine using an existing font cache
    pub fn with_font_cache(config: EngineConfig, fonts: FontCache) -> Self {
        log::info!(
            "Initializing UI engine ({}x{})",
            config.window_width,
            config.window_height
        );
        let input = InputState::new(config.window_width as f32, config.window_height as f32);
        Self {
            config,
            fonts,
            transforms: TransformArena::new(),
            input,
            renderer: MeshRenderer::new(),
            ui: Vec::new(),
            world: Vec::new(),
            frame_index: 0,
        }
    }

    /// Engine configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Input snapshot, written by the windowing glue once per frame
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Input snapshot
    pub const fn input(&self) -> &InputState {
        &self.input
    }

    /// Layout transforms
    pub fn transforms_mut(&mut self) -> &mut TransformArena {
        &mut self.transforms
    }

    /// Font cache
    pub fn fonts_mut(&mut self) -> &mut FontCache {
        &mut self.fonts
    }

    /// Compositor, for registering standalone renderables
    pub fn renderer_mut(&mut self) -> &mut MeshRenderer {
        &mut self.renderer
    }

    /// Frames rendered so far
    pub const fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Add a screen-space container; returns its index
    pub fn add_ui_container(&mut self, container: Box<dyn UiContainer>) -> usize {
        self.ui.push(container);
        self.ui.len() - 1
    }

    /// Add a world-space container; returns its index
    pub fn add_world_container(&mut self, container: Box<dyn WorldContainer>) -> usize {
        self.world.push(container);
        self.world.len() - 1
    }

    /// Screen-space container at `index`, if it is a `T`
    pub fn ui_container_mut<T: UiContainer>(&mut self, index: usize) -> Option<&mut T> {
        self.ui.get_mut(index)?.as_any_mut().downcast_mut::<T>()
    }

    /// World-space container at `index`, if it is a `T`
    pub fn world_container_mut<T: WorldContainer>(&mut self, index: usize) -> Option<&mut T> {
        self.world.get_mut(index)?.as_any_mut().downcast_mut::<T>()
    }

    /// Attach the debug overlay using the configured default font
    ///
    /// A missing font leaves the overlay background visible with empty text.
    pub fn enable_debug_monitor(&mut self) -> EngineResult<usize> {
        let atlas = self
            .fonts
            .get_font(&self.config.default_font_path, self.config.default_font_size);
        let monitor = DebugMonitor::new(&mut self.transforms, atlas, &self.config.text_box)?;
        log::info!("Debug monitor enabled");
        Ok(self.add_ui_container(Box::new(monitor)))
    }

    /// Lay out and draw one frame
    ///
    /// 1. Update every container (layout, monitors, content sizing)
    /// 2. Composite standalone renderables, world and UI containers
    pub fn render_frame(
        &mut self,
        device: &mut dyn RenderDevice,
        encoder: &mut dyn RenderEncoder,
        camera: &CameraMatrices,
        delta_seconds: f32,
    ) -> EngineResult<FrameStats> {
        {
            let mut layout = LayoutContext {
                transforms: &mut self.transforms,
                input: &self.input,
                delta_seconds,
            };
            for container in &mut self.world {
                container.update(&mut layout)?;
            }
            for container in &mut self.ui {
                container.update(&mut layout)?;
            }
        }

        let mut ctx = DrawContext {
            device,
            encoder,
            input: &self.input,
            transforms: &self.transforms,
            projection: camera.projection,
            view: camera.view,
            frame: self.frame_index,
        };
        let stats = self
            .renderer
            .draw_frame(&mut ctx, camera, &mut self.world, &mut self.ui)?;

        self.frame_index += 1;
        Ok(stats)
    }

    /// Release every GPU resource and drop all containers and fonts
    pub fn shutdown(&mut self, device: &mut dyn RenderDevice) {
        log::info!("Shutting down UI engine after {} frames", self.frame_index);
        for mut container in self.ui.drain(..) {
            container.release(device, &mut self.transforms);
        }
        for mut container in self.world.drain(..) {
            container.release(device, &mut self.transforms);
        }
        self.renderer.release(device);
        self.fonts.clear(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DepthState, RecordingDevice, RecordingEncoder};
    use crate::foundation::math::{Mat4, Mat4Ext, Vec2, Vec3, Vec4};
    use crate::text::{GlyphAtlas, MemorySource};
    use crate::ui::element::{ScreenCorner, UiElement, WorldElement};
    use crate::ui::shapes::RectanglePrimitive;

    const FONT: &str = "fonts/test.ttf";

    fn engine() -> UiEngine {
        let config = EngineConfig::default().with_default_font(FONT, 16.0);
        let mut engine = UiEngine::with_font_cache(config, FontCache::new(MemorySource::default()));
        engine.fonts_mut().insert(FONT, 16.0, GlyphAtlas::fixed_pitch(8.0, 12.0, -4.0));
        engine
    }

    fn camera() -> CameraMatrices {
        CameraMatrices {
            projection: Mat4::perspective(1.0, 4.0 / 3.0, 0.1, 100.0),
            view: Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), Vec3::y()),
        }
    }

    fn populate(engine: &mut UiEngine) {
        let mut panel = UiElement::new(engine.transforms_mut(), Vec2::zeros(), Vec2::new(200.0, 50.0));
        panel
            .enable_auto_anchor(engine.transforms_mut(), ScreenCorner::BottomRight, 10.0, 10.0)
            .unwrap();
        panel.set_background(Vec4::new(0.2, 0.2, 0.2, 1.0));
        engine.add_ui_container(Box::new(panel));

        let mut prop = WorldElement::new(Vec3::zeros());
        prop.add_primitive(Box::new(RectanglePrimitive::new(0.0, 0.0, 1.0, 1.0, Vec4::new(1.0, 0.0, 0.0, 1.0))));
        engine.add_world_container(Box::new(prop));
    }

    #[test]
    fn test_world_before_ui() {
        let mut engine = engine();
        populate(&mut engine);
        engine.enable_debug_monitor().unwrap();

        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        let stats = engine.render_frame(&mut device, &mut encoder, &camera(), 0.016).unwrap();

        assert_eq!(stats.world_draws, 1);
        assert!(stats.ui_draws >= 2);
        let depth: Vec<DepthState> = encoder.draws().iter().map(|d| d.depth_state).collect();
        assert_eq!(depth[0], DepthState::Enabled);
        assert!(depth[1..].iter().all(|d| *d == DepthState::Always));
        assert_eq!(engine.frame_index(), 1);
    }

    #[test]
    fn test_panel_anchored_bottom_right() {
        let mut engine = engine();
        populate(&mut engine);
        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        engine.render_frame(&mut device, &mut encoder, &camera(), 0.016).unwrap();

        let panel = engine.ui_container_mut::<UiElement>(0).unwrap();
        assert_eq!(panel.cached_position(), Some(Vec2::new(590.0, 10.0)));
        assert!(engine.ui_container_mut::<DebugMonitor>(0).is_none());
    }

    #[test]
    fn test_encoder_failure_is_a_frame_error() {
        let mut engine = engine();
        populate(&mut engine);
        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::failing_after(0);

        let result = engine.render_frame(&mut device, &mut encoder, &camera(), 0.016);
        assert!(matches!(result, Err(EngineError::Backend(BackendError::DeviceLost(_)))));
        assert_eq!(engine.frame_index(), 0);
    }

    #[test]
    fn test_buffer_exhaustion_draws_nothing() {
        let mut engine = engine();
        populate(&mut engine);
        let mut device = RecordingDevice::with_buffer_budget(0);
        let mut encoder = RecordingEncoder::new();

        let stats = engine.render_frame(&mut device, &mut encoder, &camera(), 0.016).unwrap();
        assert_eq!(stats.total(), 0);
        assert!(encoder.draws().is_empty());
    }

    #[test]
    fn test_frame_recovers_once_buffers_free_up() {
        let mut engine = engine();
        populate(&mut engine);
        let mut device = RecordingDevice::with_buffer_budget(4);
        let held: Vec<_> = (0..4).map(|_| device.allocate_buffer(16).unwrap()).collect();
        let mut encoder = RecordingEncoder::new();

        let stats = engine.render_frame(&mut device, &mut encoder, &camera(), 0.016).unwrap();
        assert_eq!(stats.total(), 0);

        for buffer in held {
            device.release_buffer(buffer);
        }
        let stats = engine.render_frame(&mut device, &mut encoder, &camera(), 0.016).unwrap();
        assert_eq!(stats.world_draws, 1);
        assert_eq!(stats.ui_draws, 1);
        assert_eq!(device.live_buffers(), 4);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut engine = engine();
        populate(&mut engine);
        engine.enable_debug_monitor().unwrap();
        let mut device = RecordingDevice::new();
        let mut encoder = RecordingEncoder::new();
        for _ in 0..3 {
            engine.render_frame(&mut device, &mut encoder, &camera(), 0.1).unwrap();
        }
        assert!(device.live_buffers() > 0);

        engine.shutdown(&mut device);
        assert_eq!(device.live_buffers(), 0);
        assert!(engine.fonts_mut().is_empty());
        assert!(engine.transforms_mut().is_empty());
    }
}
