//! HUD text: score, lives caption, timer/stage line and state banners

use std::path::{Path, PathBuf};

use glam::Vec2;

use super::{RenderTarget, Rgba, colors};
use crate::error::{GameError, Result};
use crate::sim::{GamePhase, GameStats};

/// Default text size in points
pub const CHARACTER_SIZE: u32 = 15;

/// How long "Stage: N" stays up at the start of a stage (2 s at 60 fps)
pub const STAGE_TITLE_FRAMES: u64 = 120;

/// Loaded font face (bytes handed to the text collaborator)
#[derive(Debug, Clone)]
pub struct Font {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

impl Font {
    /// Read a font file, failing fast when it is missing
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path).map_err(|source| GameError::AssetLoad {
            path: path.clone(),
            source,
        })?;
        log::info!("Loaded font {} ({} bytes)", path.display(), data.len());
        Ok(Self { path, data })
    }
}

/// A positioned string
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub string: String,
    pub position: Vec2,
    pub character_size: u32,
    pub color: Rgba,
}

impl TextLabel {
    pub fn new(position: Vec2) -> Self {
        Self {
            string: String::new(),
            position,
            character_size: CHARACTER_SIZE,
            color: colors::TEXT,
        }
    }

    pub fn set_string(&mut self, string: impl Into<String>) {
        self.string = string.into();
    }
}

/// All on-screen text, rebuilt from game stats each frame
#[derive(Debug, Clone)]
pub struct Hud {
    font: Option<Font>,
    score: TextLabel,
    lives: TextLabel,
    time: TextLabel,
    banner: TextLabel,
}

impl Hud {
    pub fn new(font: Option<Font>) -> Self {
        let center = crate::window_size() / 2.0;
        Self {
            font,
            score: TextLabel::new(Vec2::new(2.0, 2.0)),
            lives: TextLabel::new(Vec2::new(650.0, 2.0)),
            time: TextLabel::new(Vec2::new(center.x - 100.0, 2.0)),
            banner: TextLabel::new(Vec2::new(center.x - 100.0, center.y)),
        }
    }

    pub fn font(&self) -> Option<&Font> {
        self.font.as_ref()
    }

    /// Refresh every label from the current stats
    pub fn update(&mut self, phase: GamePhase, stats: &GameStats) {
        self.score.set_string(format!("Score:{}", stats.score));
        self.lives.set_string("Balls:");
        self.time.set_string(format!(
            "Time:{}          Stage:{}",
            stats.time_left, stats.stage
        ));
        self.banner.set_string(banner_text(phase, stats));
    }

    pub fn banner(&self) -> &str {
        &self.banner.string
    }

    pub fn draw(&self, target: &mut dyn RenderTarget) {
        for label in [&self.score, &self.lives, &self.time] {
            target.draw_text(label);
        }
        if !self.banner.string.is_empty() {
            target.draw_text(&self.banner);
        }
    }
}

/// Centre-screen message for a phase
pub fn banner_text(phase: GamePhase, stats: &GameStats) -> String {
    match phase {
        GamePhase::Paused => "Paused".to_string(),
        GamePhase::Victory => "You Won!!".to_string(),
        GamePhase::Lost => "You Lost!!".to_string(),
        GamePhase::GameOver => "Game over!".to_string(),
        GamePhase::InProgress | GamePhase::NewLife if stats.frame_in_stage < STAGE_TITLE_FRAMES => {
            format!("Stage: {}", stats.stage)
        }
        _ => String::new(),
    }
}
