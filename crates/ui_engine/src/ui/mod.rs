//! UI layer: layout transforms, primitives and containers
//!
//! Architecture:
//! - transform: anchor resolution over a slot-map arena
//! - primitive: the `RenderablePrimitive` trait and per-frame contexts
//! - shapes / text_primitive / text_box / button / composite: concrete primitives
//! - placement: screen (`ScreenPlaced`) and world (`Billboard`) wrappers
//! - element: `UiElement` and `WorldElement` containers
//! - monitor / world_label: ready-made containers

pub mod button;
pub mod composite;
pub mod element;
pub mod geometry;
pub mod monitor;
pub mod placement;
pub mod primitive;
pub mod shapes;
pub mod text_box;
pub mod text_primitive;
pub mod transform;
pub mod world_label;

pub use button::{ButtonPrimitive, ButtonState};
pub use composite::CompositePrimitive;
pub use element::{AutoAnchor, PrimitiveHandle, ScreenCorner, UiContainer, UiElement, WorldContainer, WorldElement};
pub use monitor::DebugMonitor;
pub use placement::{Billboard, ScreenPlaced};
pub use primitive::{
    DrawContext, LayoutContext, Positionable, PrimitiveKind, PrimitiveState, RebuildState, RebuildTracker,
    RenderablePrimitive, StateChange,
};
pub use shapes::{CirclePrimitive, RectanglePrimitive, RoundedRectanglePrimitive};
pub use text_box::{TextBoxConfig, TextBoxPrimitive};
pub use text_primitive::TextPrimitive;
pub use transform::{
    AnchorPoint, AnchorSpec, AnchorTarget, LayoutError, LayoutResult, Transform, TransformArena, TransformId,
};
pub use world_label::WorldLabel;

/// Screen-space text box anchored by a layout transform
pub type UiTextBox = ScreenPlaced<TextBoxPrimitive>;
/// Screen-space button anchored by a layout transform
pub type UiButton = ScreenPlaced<ButtonPrimitive>;
/// Text box shown on a world-space quad
pub type WorldTextBox = Billboard<TextBoxPrimitive>;
/// Button shown on a world-space quad
pub type WorldButton = Billboard<ButtonPrimitive>;
