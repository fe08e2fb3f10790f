//! Game settings
//!
//! Defaults reproduce the full game (drop rule, flung bricks, worker threads).
//! A JSON file named by `ARKANOID_SETTINGS` overrides any subset of fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{BALL_SPEED, FRAMERATE_LIMIT};
use crate::error::{GameError, Result};

/// Environment variable naming a settings file
pub const SETTINGS_ENV: &str = "ARKANOID_SETTINGS";

/// What the bottom window edge does to the ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BottomEdge {
    /// Reflect like the other three edges
    Bounce,
    /// Ball is lost
    #[default]
    Drop,
}

/// What happens when a brick's hit counter reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrokenBrick {
    /// Destroyed on the spot
    Vanish,
    /// Spins and drifts off the left edge before it is destroyed
    #[default]
    Fling,
}

/// Rule variant switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub bottom_edge: BottomEdge,
    pub broken_brick: BrokenBrick,
}

impl Rules {
    /// Bouncing floor, bricks vanish
    pub fn tutorial() -> Self {
        Self {
            bottom_edge: BottomEdge::Bounce,
            broken_brick: BrokenBrick::Vanish,
        }
    }

    /// Ball drops, bricks fling
    pub fn extended() -> Self {
        Self::default()
    }
}

/// Optional asset files; a configured file that cannot be read is fatal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub font: Option<PathBuf>,
    pub bounce_sound: Option<PathBuf>,
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    // === Gameplay ===
    /// Lives at the start of a game
    pub starting_lives: u32,
    /// Countdown per stage (seconds)
    pub stage_seconds: u32,
    /// Ball speed per axis (px/frame)
    pub ball_speed: f32,
    /// Paddle follows the predicted intercept instead of the keys
    pub autopilot: bool,
    /// Frames between bullets while fire is held
    pub fire_cooldown_frames: u32,
    /// Frames after a launch before bullets are allowed
    pub transit_frames: u32,
    /// Frames the victory/defeat banner stays up
    pub banner_frames: u32,
    /// Leftward drift of intact bricks from stage 2 on (px/frame)
    pub brick_drift_speed: f32,
    pub rules: Rules,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Runtime ===
    /// Run simulation, autopilot and timer on worker threads
    pub threaded: bool,
    pub framerate: u32,
    /// Stop after this many frames (headless runs)
    pub max_frames: Option<u64>,
    /// Seed for the headless random player
    pub input_seed: u64,

    pub assets: AssetPaths,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            stage_seconds: 1000,
            ball_speed: BALL_SPEED,
            autopilot: true,
            fire_cooldown_frames: 12,
            transit_frames: 12,
            banner_frames: 120,
            brick_drift_speed: 1.0,
            rules: Rules::default(),

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            threaded: true,
            framerate: FRAMERATE_LIMIT,
            max_frames: None,
            input_seed: 0x5eed,

            assets: AssetPaths::default(),
        }
    }
}

impl Settings {
    /// Parse a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Read settings from a JSON file
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GameError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Settings from `ARKANOID_SETTINGS` if set, defaults otherwise
    pub fn load() -> Result<Self> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => Self::load_from_path(PathBuf::from(path)),
            None => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
        }
    }

    /// Clamp out-of-range values
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.framerate = self.framerate.max(1);
        self.starting_lives = self.starting_lives.max(1);
        self.ball_speed = self.ball_speed.abs().max(0.5);
        self.brick_drift_speed = self.brick_drift_speed.max(0.0);
        self
    }
}
