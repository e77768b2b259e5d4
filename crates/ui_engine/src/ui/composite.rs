//! Group of primitives drawn and styled together

use std::any::Any;

use super::primitive::{
    forward_state, DrawContext, PrimitiveKind, PrimitiveState, RenderablePrimitive, StateChange,
};
use crate::backend::{BackendResult, RenderDevice};
use crate::foundation::math::{Vec2, Vec4};
use crate::ui::transform::TransformArena;

/// Owns a list of child primitives and draws them in insertion order
///
/// State set on the composite (screen space, transform, topology, color,
/// depth bias) is copied onto every child.
pub struct CompositePrimitive {
    children: Vec<Box<dyn RenderablePrimitive>>,
    state: PrimitiveState,
}

impl Default for CompositePrimitive {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositePrimitive {
    /// Empty composite
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            state: PrimitiveState::new(Vec4::new(1.0, 1.0, 1.0, 1.0)),
        }
    }

    /// Take ownership of `child`, matching its screen-space flag and transform to the composite
    pub fn add_child(&mut self, mut child: Box<dyn RenderablePrimitive>) -> usize {
        forward_state(&self.state, child.as_mut(), StateChange::ScreenSpace);
        if self.state.transform().is_some() {
            forward_state(&self.state, child.as_mut(), StateChange::Transform);
        }
        self.children.push(child);
        self.children.len() - 1
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child at `index` as its concrete type
    pub fn child<T: RenderablePrimitive>(&self, index: usize) -> Option<&T> {
        self.children.get(index)?.as_any().downcast_ref()
    }

    /// Child at `index` as its concrete type, mutable
    pub fn child_mut<T: RenderablePrimitive>(&mut self, index: usize) -> Option<&mut T> {
        self.children.get_mut(index)?.as_any_mut().downcast_mut()
    }

    /// Children in draw order
    pub fn children(&self) -> impl Iterator<Item = &dyn RenderablePrimitive> {
        self.children.iter().map(AsRef::as_ref)
    }
}

impl RenderablePrimitive for CompositePrimitive {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Composite
    }

    fn state(&self) -> &PrimitiveState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PrimitiveState {
        &mut self.state
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> BackendResult<()> {
        for child in &mut self.children {
            child.draw(ctx)?;
        }
        Ok(())
    }

    /// Extent of the union of the children's sizes
    fn content_size(&self) -> Vec2 {
        self.children
            .iter()
            .map(|child| child.content_size())
            .fold(Vec2::zeros(), |acc, size| acc.sup(&size))
    }

    fn release(&mut self, device: &mut dyn RenderDevice, transforms: &mut TransformArena) {
        for child in &mut self.children {
            child.release(device, transforms);
        }
    }

    fn state_changed(&mut self, change: StateChange) {
        for child in &mut self.children {
            forward_state(&self.state, child.as_mut(), change);
        }
    }

    fn sync_layout(&mut self, transforms: &mut TransformArena) {
        for child in &mut self.children {
            child.sync_layout(transforms);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
