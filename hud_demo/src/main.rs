//! Headless HUD demo
//!
//! Builds a debug monitor, a clickable button and a world label, then steps
//! the engine for a fixed number of frames against the recording backend
//! while scripting mouse input.
//!
//! Usage: `hud_demo [config.toml|config.ron] [frames]`

use std::cell::Cell;
use std::rc::Rc;

use ui_engine::foundation::logging;
use ui_engine::prelude::*;
use ui_engine::ui::{Positionable, PrimitiveHandle, ScreenPlaced};
use ui_engine::EngineResult;

const DEFAULT_FRAMES: u32 = 120;
const FRAME_TIME: f32 = 1.0 / 60.0;

/// Frame on which the scripted cursor presses the button
const PRESS_FRAME: u32 = 30;

struct HudDemo {
    engine: UiEngine,
    device: RecordingDevice,
    encoder: RecordingEncoder,
    camera: CameraMatrices,
    toolbar: usize,
    button: PrimitiveHandle,
    label: usize,
    clicks: Rc<Cell<u32>>,
}

impl HudDemo {
    fn new(config: EngineConfig) -> EngineResult<Self> {
        let mut engine = UiEngine::new(config);
        let font = load_default_font(&mut engine);
        let style = engine.config().text_box.clone();

        engine.enable_debug_monitor()?;

        let mut toolbar = UiElement::new(engine.transforms_mut(), Vec2::zeros(), Vec2::new(180.0, 68.0));
        toolbar.enable_auto_anchor(engine.transforms_mut(), ScreenCorner::BottomLeft, 20.0, 20.0)?;
        toolbar.set_background(Vec4::new(0.15, 0.15, 0.2, 0.9));

        let clicks = Rc::new(Cell::new(0));
        let mut button = ButtonPrimitive::new(Rc::clone(&font), "Launch", 0.0, 0.0, 160.0, 48.0, style.clone());
        let counter = Rc::clone(&clicks);
        button.set_on_click(move || counter.set(counter.get() + 1));
        let anchor = AnchorSpec::parent(AnchorPoint::Center, 0.0, 0.0);
        let placed = ScreenPlaced::anchored(engine.transforms_mut(), button, Some(toolbar.transform()), anchor)?;
        let button = toolbar.add_primitive(Box::new(placed));
        let toolbar = engine.add_ui_container(Box::new(toolbar));

        let label = WorldLabel::new(font, "Waypoint", Vec3::new(0.0, 1.0, -4.0), &style);
        let label = engine.add_world_container(Box::new(label));

        let window = engine.input().screen_size();
        let camera = CameraMatrices {
            projection: Mat4::perspective(std::f32::consts::FRAC_PI_3, window.x / window.y, 0.1, 100.0),
            view: Mat4::look_at(Vec3::new(0.0, 1.0, 2.0), Vec3::new(0.0, 1.0, -4.0), Vec3::y()),
        };

        Ok(Self {
            engine,
            device: RecordingDevice::new(),
            encoder: RecordingEncoder::new(),
            camera,
            toolbar,
            button,
            label,
            clicks,
        })
    }

    fn run(&mut self, frames: u32) -> EngineResult<()> {
        log::info!("Running {} frames", frames);
        for frame in 0..frames {
            self.script_input(frame);
            self.encoder.clear();
            let stats = self
                .engine
                .render_frame(&mut self.device, &mut self.encoder, &self.camera, FRAME_TIME)?;
            log::debug!(
                "Frame {}: {} standalone, {} world, {} ui draws",
                frame,
                stats.standalone_draws,
                stats.world_draws,
                stats.ui_draws
            );

            if self.take_button_click() {
                log::info!("Button clicked on frame {}", frame);
                if let Some(label) = self.engine.world_container_mut::<WorldLabel>(self.label) {
                    label.set_text("Launched");
                }
            }
            if let Some(label) = self.engine.world_container_mut::<WorldLabel>(self.label) {
                label.set_rotation(0.0, frame as f32 * 0.02);
            }
        }

        log::info!(
            "Finished: {} clicks, {} live buffers, {} draws last frame",
            self.clicks.get(),
            self.device.live_buffers(),
            self.encoder.draws().len()
        );
        Ok(())
    }

    /// Sweep the cursor onto the button, click once, then move away
    fn script_input(&mut self, frame: u32) {
        let button_center = self.button_center();
        let input = self.engine.input_mut();
        let height = input.window_height();
        let (x, y) = if frame < PRESS_FRAME - 10 {
            (400.0, 300.0)
        } else if frame < PRESS_FRAME + 10 {
            (button_center.x, height - button_center.y)
        } else {
            (600.0, 100.0)
        };
        input.update_mouse(x, y);
        input.set_mouse_button(MouseButtons::LEFT, frame == PRESS_FRAME);
        input.set_key(32, frame == PRESS_FRAME);
    }

    fn button_center(&mut self) -> Vec2 {
        let handle = self.button;
        self.engine
            .ui_container_mut::<UiElement>(self.toolbar)
            .and_then(|toolbar| toolbar.primitive::<UiButton>(handle))
            .map_or_else(Vec2::zeros, |button| {
                let button = button.inner();
                button.position() + button.text_box().size() * 0.5
            })
    }

    fn take_button_click(&mut self) -> bool {
        let handle = self.button;
        self.engine
            .ui_container_mut::<UiElement>(self.toolbar)
            .and_then(|toolbar| toolbar.primitive_mut::<UiButton>(handle))
            .is_some_and(|button| button.inner_mut().take_clicked())
    }

    fn shutdown(&mut self) {
        self.engine.shutdown(&mut self.device);
        log::info!("Shutdown left {} live buffers", self.device.live_buffers());
    }
}

/// Bake the configured font, or fall back to a fixed-pitch atlas without a bitmap
fn load_default_font(engine: &mut UiEngine) -> Rc<GlyphAtlas> {
    let path = engine.config().default_font_path.clone();
    let size = engine.config().default_font_size;
    match engine.fonts_mut().try_load(&path, size) {
        Ok(atlas) => atlas,
        Err(err) => {
            log::warn!("Using fixed-pitch fallback for '{}': {}", path, err);
            let atlas = GlyphAtlas::fixed_pitch(size * 0.5, size * 0.75, -size * 0.25);
            engine.fonts_mut().insert(&path, size, atlas)
        }
    }
}

fn load_config(path: Option<&str>) -> EngineResult<EngineConfig> {
    match path {
        Some(path) => {
            log::info!("Loading config from {}", path);
            Ok(EngineConfig::load_from_file(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn run() -> EngineResult<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let frames = args
        .get(1)
        .and_then(|frames| frames.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut demo = HudDemo::new(config)?;
    let result = demo.run(frames);
    demo.shutdown();
    result
}

fn main() {
    logging::init();
    log::info!("Starting HUD demo");

    if let Err(err) = run() {
        log::error!("HUD demo failed: {}", err);
        std::process::exit(1);
    }
    log::info!("HUD demo finished successfully");
}
