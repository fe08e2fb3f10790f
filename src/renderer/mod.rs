//! Rendering collaborator
//!
//! The game never touches pixels: it submits shape and text draw calls to a
//! `RenderTarget` supplied by the windowing layer.

pub mod hud;
pub mod recording;
pub mod shapes;

pub use hud::{Font, Hud, TextLabel};
pub use recording::RecordingSurface;
pub use shapes::{Outline, Shape};

/// Linear RGBA colour
pub type Rgba = [f32; 4];

/// Colors for game elements
pub mod colors {
    use super::Rgba;

    pub const BACKGROUND: Rgba = [0.0, 0.0, 0.0, 1.0];
    pub const TEXT: Rgba = [1.0, 1.0, 1.0, 1.0];
    pub const BALL: Rgba = [0.0, 1.0, 0.0, 1.0];
    pub const PADDLE: Rgba = [1.0, 1.0, 1.0, 1.0];
    pub const BULLET: Rgba = [1.0, 0.0, 0.0, 1.0];
    pub const LIFE: Rgba = [1.0, 1.0, 1.0, 1.0];
    pub const BRICK_OUTLINE: Rgba = [1.0, 1.0, 1.0, 1.0];
    /// Tint for single-hit bricks
    pub const BRICK_SOFT: Rgba = [0.0, 1.0, 1.0, 1.0];
    /// Tint for multi-hit bricks
    pub const BRICK_HARD: Rgba = [1.0, 0.0, 1.0, 1.0];
}

/// Window/surface collaborator
pub trait RenderTarget {
    /// Start a frame
    fn clear(&mut self, color: Rgba);
    fn draw(&mut self, shape: &Shape);
    fn draw_text(&mut self, text: &TextLabel);
    /// Present the frame
    fn display(&mut self);
    fn set_framerate_limit(&mut self, fps: u32);
}
