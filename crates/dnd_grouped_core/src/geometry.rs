use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `to`.
    #[inline]
    pub fn delta(self, to: Point) -> Point {
        to - self
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle; `origin` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.height()
    }

    /// Height clamped to zero; NaN heights count as zero.
    #[inline]
    pub fn height(&self) -> f32 {
        if self.size.height.is_finite() {
            self.size.height.max(0.0)
        } else {
            0.0
        }
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        self.origin.y + self.height() / 2.0
    }

    /// A rect of a detached or collapsed element: zero area or non-finite coordinates.
    pub fn is_degenerate(&self) -> bool {
        !self.origin.is_finite()
            || !self.size.width.is_finite()
            || !self.size.height.is_finite()
            || self.size.width <= 0.0
            || self.size.height <= 0.0
    }

    /// Inclusive vertical containment.
    #[inline]
    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.top() && y <= self.bottom()
    }
}

/// The two-edge vertical collision test used for drop targeting.
///
/// `dragged_top` is the top of the dragged rect at its overlay position. The dragged bottom edge
/// (pulled up by `padding`) is tested against the candidate span, then the dragged top edge
/// (pushed down by `padding`).
pub fn collides(dragged_top: f32, dragged_height: f32, candidate: &Rect, padding: f32) -> bool {
    if !dragged_top.is_finite() || !candidate.origin.y.is_finite() {
        return false;
    }
    let dragged_height = if dragged_height.is_finite() {
        dragged_height.max(0.0)
    } else {
        0.0
    };

    let bottom_edge = dragged_top - padding + dragged_height;
    let top_edge = dragged_top + padding;
    candidate.contains_y(bottom_edge) || candidate.contains_y(top_edge)
}

/// Absolute distance from a vertical center line to the candidate's top edge.
#[inline]
pub fn distance_to_top(center_y: f32, candidate: &Rect) -> f32 {
    (candidate.top() - center_y).abs()
}
