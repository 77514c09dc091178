//! Geometry aliases shared by layout, rendering and hit-testing.
//!
//! All coordinates are in pixels with the Y axis pointing down.

use euclid::default::{Box2D, Point2D, Size2D, Vector2D};

pub type Point = Point2D<f32>;
pub type Vector = Vector2D<f32>;
pub type Size = Size2D<f32>;
pub type Rect = Box2D<f32>;

pub fn point(x: f32, y: f32) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f32, y: f32) -> Vector {
    euclid::vec2(x, y)
}

/// Operations on [`Rect`] that treat an inverted box as "nothing yet".
///
/// Boundaries are accumulated by repeatedly unioning glyph rectangles into an
/// accumulator that starts out inverted, so a zero-width rectangle (a newline
/// or a soft hyphen) still contributes its vertical extent.
pub trait RectExt: Sized {
    /// A box with `min = +MAX` and `max = -MAX`; the identity for [`RectExt::union_valid`].
    fn inverted() -> Self;

    fn from_origin_and_size(origin: Point, size: Size) -> Self;

    /// `true` when `min <= max` on both axes.
    fn is_valid(&self) -> bool;

    /// Union that ignores inverted operands.
    fn union_valid(&self, other: &Self) -> Self;

    /// Width, or 0 for an inverted box.
    fn valid_width(&self) -> f32;

    /// Height, or 0 for an inverted box.
    fn valid_height(&self) -> f32;
}

impl RectExt for Rect {
    fn inverted() -> Self {
        Box2D::new(point(f32::MAX, f32::MAX), point(f32::MIN, f32::MIN))
    }

    fn from_origin_and_size(origin: Point, size: Size) -> Self {
        Box2D::new(origin, origin + size)
    }

    fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    fn union_valid(&self, other: &Self) -> Self {
        match (self.is_valid(), other.is_valid()) {
            (false, _) => *other,
            (true, false) => *self,
            (true, true) => Box2D::new(self.min.min(other.min), self.max.max(other.max)),
        }
    }

    fn valid_width(&self) -> f32 {
        if self.is_valid() { self.max.x - self.min.x } else { 0.0 }
    }

    fn valid_height(&self) -> f32 {
        if self.is_valid() { self.max.y - self.min.y } else { 0.0 }
    }
}
