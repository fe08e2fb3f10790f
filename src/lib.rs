//! Arkanoid - a breakout game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity registry, collisions, game state)
//! - `runtime`: Frame loop with inline or worker-thread update scheduling
//! - `platform`: Input collaborator abstraction
//! - `renderer`: Rendering collaborator abstraction and HUD text
//! - `audio`: Sound buffers and effect playback
//! - `settings`: Data-driven configuration

pub mod audio;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod runtime;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result};
pub use settings::{BottomEdge, BrokenBrick, Rules, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Window dimensions
    pub const WINDOW_WIDTH: f32 = 800.0;
    pub const WINDOW_HEIGHT: f32 = 600.0;
    pub const FRAMERATE_LIMIT: u32 = 60;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 5.0;
    pub const BALL_SPEED: f32 = 4.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 60.0;
    pub const PADDLE_HEIGHT: f32 = 20.0;
    pub const PADDLE_SPEED: f32 = 8.0;
    /// Distance of the paddle centre from the bottom edge
    pub const PADDLE_BOTTOM_OFFSET: f32 = 50.0;

    /// Brick defaults
    pub const BRICK_WIDTH: f32 = 60.0;
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_FLING_SPEED: f32 = 4.0;
    /// Degrees per frame while flung
    pub const BRICK_FLING_SPIN: f32 = 10.0;

    /// Brick wall layout
    pub const BRICK_COLUMNS: u32 = 11;
    pub const BRICK_ROWS: u32 = 4;
    pub const BRICK_START_COLUMN: f32 = 0.7;
    pub const BRICK_START_ROW: u32 = 2;
    pub const BRICK_SPACING: f32 = 6.0;
    pub const BRICK_OFFSET_X: f32 = 22.0;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 5.0;
    pub const BULLET_SPEED: f32 = 10.0;

    /// Life indicator row (top right corner)
    pub const LIFE_RADIUS: f32 = 5.0;
    pub const LIFE_ROW_X: f32 = 720.0;
    pub const LIFE_ROW_Y: f32 = 12.0;
    pub const LIFE_SPACING: f32 = 2.0;

    /// Autopilot aims this far behind the predicted intercept
    pub const AUTOPILOT_NUDGE: f32 = 5.0;
}

/// Window size as a vector
#[inline]
pub fn window_size() -> Vec2 {
    Vec2::new(consts::WINDOW_WIDTH, consts::WINDOW_HEIGHT)
}
