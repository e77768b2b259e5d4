//! # UI Engine
//!
//! Anchored UI composition and text layout for a real-time renderer.
//!
//! ## Features
//!
//! - **Anchored layout**: screen or parent anchors on nine reference points
//! - **Font atlases**: glyph baking with `fontdue`, shared through a font cache
//! - **Text layout**: word wrap, alignment, measurement and clipping
//! - **Widgets**: shapes, text boxes, buttons and composites
//! - **Two passes**: depth-tested world geometry, overlay UI on top
//!
//! The GPU is reached only through the [`backend::RenderDevice`] and
//! [`backend::RenderEncoder`] traits; [`backend::RecordingDevice`] is a
//! headless implementation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ui_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = UiEngine::new(EngineConfig::default());
//!     engine.enable_debug_monitor()?;
//!
//!     let mut device = RecordingDevice::new();
//!     let mut encoder = RecordingEncoder::new();
//!     let stats = engine.render_frame(&mut device, &mut encoder, &CameraMatrices::default(), 1.0 / 60.0)?;
//!     log::info!("{} draws", stats.total());
//!
//!     engine.shutdown(&mut device);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod backend;
pub mod config;
pub mod foundation;
pub mod input;
pub mod render;
pub mod text;
pub mod ui;

mod engine;

pub use engine::{EngineError, EngineResult, UiEngine};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        backend::{RecordingDevice, RecordingEncoder, RenderDevice, RenderEncoder},
        config::{Config, EngineConfig},
        foundation::math::{Mat4, Mat4Ext, Vec2, Vec3, Vec4},
        input::{InputState, MouseButtons},
        render::{CameraMatrices, FrameStats},
        text::{FontCache, GlyphAtlas, TextAlign, TextJustify},
        ui::{
            AnchorPoint, AnchorSpec, ButtonPrimitive, DebugMonitor, RenderablePrimitive, ScreenCorner,
            TextBoxConfig, TextBoxPrimitive, UiButton, UiElement, UiTextBox, WorldElement, WorldLabel,
        },
        EngineError, UiEngine,
    };
}
