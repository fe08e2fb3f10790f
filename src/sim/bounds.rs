//! Axis-aligned bounds for rectangles and circles
//!
//! Every game object owns one of these shapes, positioned by its centre:
//! - `Rect`: centre + full size
//! - `Circle`: centre + radius
//!
//! Both expose the same four edges, which is all collision needs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Anything with four axis-aligned edges (y grows downward)
pub trait Bounds {
    fn left(&self) -> f32;
    fn right(&self) -> f32;
    fn top(&self) -> f32;
    fn bottom(&self) -> f32;
}

/// Centre-anchored rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Build from edge coordinates
    pub fn from_edges(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            center: Vec2::new((left + right) / 2.0, (top + bottom) / 2.0),
            size: Vec2::new(right - left, bottom - top),
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.center.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.center.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }
}

impl Bounds for Rect {
    #[inline]
    fn left(&self) -> f32 {
        self.center.x - self.size.x / 2.0
    }

    #[inline]
    fn right(&self) -> f32 {
        self.center.x + self.size.x / 2.0
    }

    #[inline]
    fn top(&self) -> f32 {
        self.center.y - self.size.y / 2.0
    }

    #[inline]
    fn bottom(&self) -> f32 {
        self.center.y + self.size.y / 2.0
    }
}

/// Centre-anchored circle (bounded by its enclosing square)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.center.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.center.y
    }
}

impl Bounds for Circle {
    #[inline]
    fn left(&self) -> f32 {
        self.center.x - self.radius
    }

    #[inline]
    fn right(&self) -> f32 {
        self.center.x + self.radius
    }

    #[inline]
    fn top(&self) -> f32 {
        self.center.y - self.radius
    }

    #[inline]
    fn bottom(&self) -> f32 {
        self.center.y + self.radius
    }
}

/// AABB overlap; touching edges count as contact
#[inline]
pub fn intersects(a: &impl Bounds, b: &impl Bounds) -> bool {
    a.right() >= b.left() && a.left() <= b.right() && a.bottom() >= b.top() && a.top() <= b.bottom()
}
