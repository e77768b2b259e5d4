//! Hit testing helpers
//!
//! Pure point-in-shape queries used by interactive widgets. All rectangles
//! are given by their bottom-left corner and size.

use crate::foundation::math::Vec2;

/// Check if a point is inside a rectangular region (edges inclusive)
///
/// # Arguments
/// * `point` - Point to test
/// * `origin` - Bottom-left corner of the rectangle
/// * `size` - Width and height of the rectangle
pub fn point_in_rect(point: Vec2, origin: Vec2, size: Vec2) -> bool {
    point.x >= origin.x
        && point.x <= origin.x + size.x
        && point.y >= origin.y
        && point.y <= origin.y + size.y
}

/// Check if a point is inside a circle (edge inclusive)
pub fn point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    (point - center).norm_squared() <= radius * radius
}

/// Axis-aligned bounds `(min, max)` enclosing a set of points
///
/// Returns `None` for an empty set.
pub fn bounding_rect(points: impl IntoIterator<Item = Vec2>) -> Option<(Vec2, Vec2)> {
    points.into_iter().fold(None, |bounds, p| match bounds {
        None => Some((p, p)),
        Some((min, max)) => Some((min.inf(&p), max.sup(&p))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_in_rect() {
        let origin = Vec2::new(100.0, 100.0);
        let size = Vec2::new(200.0, 100.0);

        // Point inside
        assert!(point_in_rect(Vec2::new(150.0, 150.0), origin, size));
        // Edges are inclusive
        assert!(point_in_rect(Vec2::new(300.0, 200.0), origin, size));
        // Outside
        assert!(!point_in_rect(Vec2::new(99.0, 150.0), origin, size));
        assert!(!point_in_rect(Vec2::new(150.0, 201.0), origin, size));
    }

    #[test]
    fn test_point_in_circle() {
        let center = Vec2::new(10.0, 10.0);
        assert!(point_in_circle(Vec2::new(13.0, 14.0), center, 5.0));
        assert!(!point_in_circle(Vec2::new(14.0, 14.0), center, 5.0));
    }

    #[test]
    fn test_bounding_rect() {
        assert!(bounding_rect(Vec::new()).is_none());
        let (min, max) = bounding_rect([
            Vec2::new(3.0, -1.0),
            Vec2::new(-2.0, 4.0),
            Vec2::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(min, Vec2::new(-2.0, -1.0));
        assert_eq!(max, Vec2::new(3.0, 4.0));
    }
}
