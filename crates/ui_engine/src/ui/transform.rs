//! Transform arena and anchor resolution
//!
//! Every UI transform lives in one [`TransformArena`] and is addressed by a
//! [`TransformId`]. Parents are plain ids resolved at lookup time, so removing
//! a transform can never leave a child pointing at freed memory: a child whose
//! parent is gone simply resolves as a root.
//!
//! Coordinates are pixels with a bottom-left origin.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::Vec2;

new_key_type! {
    /// Handle to a transform in a [`TransformArena`]
    pub struct TransformId;
}

/// Result type for transform operations
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors from structural transform edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Id does not refer to a live transform
    #[error("Unknown transform {0:?}")]
    UnknownTransform(TransformId),

    /// Parenting would make a transform its own ancestor
    #[error("Parenting {child:?} under {parent:?} would create a cycle")]
    ParentCycle {
        /// Transform being re-parented
        child: TransformId,
        /// Requested parent
        parent: TransformId,
    },
}

/// One of the nine reference points of a box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AnchorPoint {
    /// Top-left corner
    TopLeft,
    /// Middle of the top edge
    TopCenter,
    /// Top-right corner
    TopRight,
    /// Middle of the left edge
    CenterLeft,
    /// Center of the box
    Center,
    /// Middle of the right edge
    CenterRight,
    /// Bottom-left corner
    BottomLeft,
    /// Middle of the bottom edge
    BottomCenter,
    /// Bottom-right corner
    BottomRight,
}

impl AnchorPoint {
    /// All nine points
    pub const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::CenterLeft,
        Self::Center,
        Self::CenterRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// Get the normalized position (0.0 to 1.0, bottom-left origin)
    pub const fn to_normalized(self) -> (f32, f32) {
        match self {
            Self::TopLeft => (0.0, 1.0),
            Self::TopCenter => (0.5, 1.0),
            Self::TopRight => (1.0, 1.0),
            Self::CenterLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 0.0),
            Self::BottomCenter => (0.5, 0.0),
            Self::BottomRight => (1.0, 0.0),
        }
    }

    /// Offset of this point from the bottom-left corner of a `width` x `height` box
    pub fn offset(self, width: f32, height: f32) -> Vec2 {
        let (nx, ny) = self.to_normalized();
        Vec2::new(nx * width, ny * height)
    }
}

/// Box an anchor measures against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AnchorTarget {
    /// The window
    Screen,
    /// The parent transform's box (the window if there is no parent)
    Parent,
}

/// Binds a transform's position to a reference point of its target
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnchorSpec {
    /// Box to anchor against
    pub target: AnchorTarget,
    /// Point shared by the target box and the element box
    pub point: AnchorPoint,
    /// Extra offset applied after alignment
    pub offset: Vec2,
}

impl AnchorSpec {
    /// Anchor to the screen
    pub fn screen(point: AnchorPoint, offset_x: f32, offset_y: f32) -> Self {
        Self { target: AnchorTarget::Screen, point, offset: Vec2::new(offset_x, offset_y) }
    }

    /// Anchor to the parent's box
    pub fn parent(point: AnchorPoint, offset_x: f32, offset_y: f32) -> Self {
        Self { target: AnchorTarget::Parent, point, offset: Vec2::new(offset_x, offset_y) }
    }
}

/// Local placement of one UI element
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent (ignored while anchored)
    pub local_position: Vec2,
    /// Size in pixels
    pub size: Vec2,
    /// Anchor rule overriding `local_position`
    pub anchor: Option<AnchorSpec>,
    parent: Option<TransformId>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            local_position: Vec2::zeros(),
            size: Vec2::zeros(),
            anchor: None,
            parent: None,
        }
    }
}

impl Transform {
    /// Parent id, if any
    pub const fn parent(&self) -> Option<TransformId> {
        self.parent
    }
}

/// Owner of all UI transforms
#[derive(Debug, Default)]
pub struct TransformArena {
    transforms: SlotMap<TransformId, Transform>,
}

impl TransformArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root transform at `position` with `size`
    pub fn insert(&mut self, position: Vec2, size: Vec2) -> TransformId {
        self.transforms.insert(Transform { local_position: position, size, ..Transform::default() })
    }

    /// Remove a transform; children keep their ids and resolve as roots
    pub fn remove(&mut self, id: TransformId) -> Option<Transform> {
        self.transforms.remove(id)
    }

    /// Whether `id` is live
    pub fn contains(&self, id: TransformId) -> bool {
        self.transforms.contains_key(id)
    }

    /// Number of live transforms
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Borrow a transform
    pub fn get(&self, id: TransformId) -> Option<&Transform> {
        self.transforms.get(id)
    }

    fn get_mut(&mut self, id: TransformId) -> LayoutResult<&mut Transform> {
        self.transforms.get_mut(id).ok_or(LayoutError::UnknownTransform(id))
    }

    /// Set the local position
    pub fn set_position(&mut self, id: TransformId, position: Vec2) -> LayoutResult<()> {
        self.get_mut(id)?.local_position = position;
        Ok(())
    }

    /// Set the size
    pub fn set_size(&mut self, id: TransformId, size: Vec2) -> LayoutResult<()> {
        self.get_mut(id)?.size = size;
        Ok(())
    }

    /// Set or clear the anchor
    pub fn set_anchor(&mut self, id: TransformId, anchor: Option<AnchorSpec>) -> LayoutResult<()> {
        self.get_mut(id)?.anchor = anchor;
        Ok(())
    }

    /// Set or clear the parent
    ///
    /// Fails if either id is unknown or if `parent` is `id` or one of its
    /// descendants.
    pub fn set_parent(&mut self, id: TransformId, parent: Option<TransformId>) -> LayoutResult<()> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(LayoutError::UnknownTransform(parent));
            }
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                if ancestor == id {
                    return Err(LayoutError::ParentCycle { child: id, parent });
                }
                cursor = self.live_parent(ancestor);
            }
        }
        self.get_mut(id)?.parent = parent;
        Ok(())
    }

    /// Size of a transform
    pub fn size(&self, id: TransformId) -> Option<Vec2> {
        self.get(id).map(|t| t.size)
    }

    /// Absolute bottom-left position in window pixels
    ///
    /// Without an anchor this is the parent's absolute position plus the
    /// local position. With one, the element's reference point is placed on
    /// the target box's reference point, then shifted by the anchor offset.
    /// Returns `None` for an unknown id.
    pub fn absolute_position(&self, id: TransformId, screen: Vec2) -> Option<Vec2> {
        let transform = self.get(id)?;
        let parent = transform.parent.filter(|&p| self.contains(p));

        let Some(anchor) = transform.anchor else {
            return Some(match parent {
                Some(parent) => self.absolute_position(parent, screen)? + transform.local_position,
                None => transform.local_position,
            });
        };

        let (base, reference) = match (anchor.target, parent) {
            (AnchorTarget::Parent, Some(parent)) => self.absolute_bounds(parent, screen)?,
            _ => (Vec2::zeros(), screen),
        };

        Some(
            base + anchor.point.offset(reference.x, reference.y)
                - anchor.point.offset(transform.size.x, transform.size.y)
                + anchor.offset,
        )
    }

    /// Absolute position and size
    pub fn absolute_bounds(&self, id: TransformId, screen: Vec2) -> Option<(Vec2, Vec2)> {
        let position = self.absolute_position(id, screen)?;
        Some((position, self.get(id)?.size))
    }

    fn live_parent(&self, id: TransformId) -> Option<TransformId> {
        self.get(id)?.parent.filter(|&p| self.contains(p))
    }
}
