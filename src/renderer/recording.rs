//! Headless render target that records draw calls per frame

use super::{RenderTarget, Rgba, Shape, TextLabel};

/// Everything submitted between `clear` and `display`
#[derive(Debug, Clone, Default)]
pub struct RecordedFrame {
    pub clear_color: Option<Rgba>,
    pub shapes: Vec<Shape>,
    pub texts: Vec<TextLabel>,
}

/// Keeps the last presented frame and a running count
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pending: RecordedFrame,
    last: RecordedFrame,
    frames_presented: u64,
    framerate_limit: Option<u32>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> &RecordedFrame {
        &self.last
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn framerate_limit(&self) -> Option<u32> {
        self.framerate_limit
    }
}

impl RenderTarget for RecordingSurface {
    fn clear(&mut self, color: Rgba) {
        self.pending = RecordedFrame {
            clear_color: Some(color),
            ..RecordedFrame::default()
        };
    }

    fn draw(&mut self, shape: &Shape) {
        self.pending.shapes.push(*shape);
    }

    fn draw_text(&mut self, text: &TextLabel) {
        self.pending.texts.push(text.clone());
    }

    fn display(&mut self) {
        self.last = std::mem::take(&mut self.pending);
        self.frames_presented += 1;
        log::trace!(
            "Frame {} presented: {} shapes, {} texts",
            self.frames_presented,
            self.last.shapes.len(),
            self.last.texts.len()
        );
    }

    fn set_framerate_limit(&mut self, fps: u32) {
        self.framerate_limit = Some(fps);
    }
}
