//! Triangle-fan geometry for round shapes

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::foundation::math::Vec2;
use crate::render::mesh::{MeshData, UiVertex};

/// Smallest segment count that still reads as a circle
pub const MIN_CIRCLE_SEGMENTS: u32 = 3;

/// Fan around a center vertex; `outline` is walked counter-clockwise and closed
fn fan(center: Vec2, outline: &[Vec2]) -> MeshData {
    if outline.len() < 2 {
        return MeshData::default();
    }
    let mut vertices = Vec::with_capacity(outline.len() + 1);
    vertices.push(UiVertex::flat(center.x, center.y));
    vertices.extend(outline.iter().map(|p| UiVertex::flat(p.x, p.y)));

    let rim = outline.len() as u32;
    let mut indices = Vec::with_capacity(outline.len() * 3);
    for i in 0..rim {
        indices.extend([0, 1 + i, 1 + (i + 1) % rim]);
    }
    MeshData::new(vertices, indices)
}

/// Filled circle as `segments` triangles
pub fn circle(center: Vec2, radius: f32, segments: u32) -> MeshData {
    if radius <= 0.0 {
        return MeshData::default();
    }
    let segments = segments.max(MIN_CIRCLE_SEGMENTS);
    let outline: Vec<Vec2> = (0..segments)
        .map(|i| {
            let angle = TAU * i as f32 / segments as f32;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect();
    fan(center, &outline)
}

/// Filled rounded rectangle with its bottom-left corner at `origin`
///
/// `segments` is the resolution of a full circle; each corner gets a quarter
/// of it. The radius is clamped to half the shorter side, and a zero radius
/// degenerates into a plain four-corner fan.
pub fn rounded_rectangle(origin: Vec2, size: Vec2, radius: f32, segments: u32) -> MeshData {
    if size.x <= 0.0 || size.y <= 0.0 {
        return MeshData::default();
    }
    let radius = radius.clamp(0.0, size.x.min(size.y) * 0.5);
    let center = origin + size * 0.5;
    if radius == 0.0 {
        let outline = [
            origin,
            origin + Vec2::new(size.x, 0.0),
            origin + size,
            origin + Vec2::new(0.0, size.y),
        ];
        return fan(center, &outline);
    }

    let steps = (segments / 4).max(1);
    // (arc center, start angle) for each corner, counter-clockwise from bottom-right
    let corners = [
        (origin + Vec2::new(size.x - radius, radius), -FRAC_PI_2),
        (origin + Vec2::new(size.x - radius, size.y - radius), 0.0),
        (origin + Vec2::new(radius, size.y - radius), FRAC_PI_2),
        (origin + Vec2::new(radius, radius), PI),
    ];
    let mut outline = Vec::with_capacity(corners.len() * (steps as usize + 1));
    for (arc_center, start) in corners {
        for step in 0..=steps {
            let angle = start + FRAC_PI_2 * step as f32 / steps as f32;
            outline.push(arc_center + Vec2::new(angle.cos(), angle.sin()) * radius);
        }
    }
    fan(center, &outline)
}
