//! Draw commands for 2D primitives

use super::Rgba;
use crate::sim::bounds::{Circle, Rect};

/// Stroke around a rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub color: Rgba,
    pub thickness: f32,
}

/// A single shape draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect {
        rect: Rect,
        /// Degrees, clockwise, about the centre
        rotation: f32,
        fill: Rgba,
        outline: Option<Outline>,
    },
    Circle {
        circle: Circle,
        fill: Rgba,
    },
}

impl Shape {
    /// Plain filled rectangle
    pub fn rect(rect: Rect, fill: Rgba) -> Self {
        Shape::Rect {
            rect,
            rotation: 0.0,
            fill,
            outline: None,
        }
    }

    pub fn circle(circle: Circle, fill: Rgba) -> Self {
        Shape::Circle { circle, fill }
    }

    pub fn with_rotation(self, degrees: f32) -> Self {
        match self {
            Shape::Rect {
                rect, fill, outline, ..
            } => Shape::Rect {
                rect,
                rotation: degrees,
                fill,
                outline,
            },
            other => other,
        }
    }

    pub fn with_outline(self, color: Rgba, thickness: f32) -> Self {
        match self {
            Shape::Rect {
                rect,
                rotation,
                fill,
                ..
            } => Shape::Rect {
                rect,
                rotation,
                fill,
                outline: Some(Outline { color, thickness }),
            },
            other => other,
        }
    }

    pub fn fill(&self) -> Rgba {
        match self {
            Shape::Rect { fill, .. } | Shape::Circle { fill, .. } => *fill,
        }
    }
}

/// Fade a brick tint by remaining hits (1 = faint, 2 = medium, 3+ = solid)
pub fn brick_color(tint: Rgba, hits_remaining: u32) -> Rgba {
    let alpha = match hits_remaining {
        0 | 1 => 80.0 / 255.0,
        2 => 170.0 / 255.0,
        _ => 1.0,
    };
    [tint[0], tint[1], tint[2], alpha]
}
