//! Audio system
//!
//! Game events are mapped to sound effects and handed to an `AudioOutput`
//! supplied by the platform layer. The bounce sound may come from a file;
//! a configured file that cannot be read stops startup.

use std::path::{Path, PathBuf};

use crate::error::{GameError, Result};
use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Ball hits paddle
    PaddleHit,
    /// Ball hits wall
    WallHit,
    /// Ball or bullet hits brick (doesn't break)
    BrickHit,
    /// Brick counter reached zero
    BrickBreak,
    /// Bullet fired
    Fire,
    /// Ball launched from the paddle
    Launch,
    /// Ball fell out of the window
    BallLost,
    /// Stage cleared
    StageClear,
    /// Game over
    GameOver,
}

impl SoundEffect {
    pub const COUNT: usize = 9;

    /// Effect for a game event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::WallBounce => Some(SoundEffect::WallHit),
            GameEvent::PaddleBounce => Some(SoundEffect::PaddleHit),
            GameEvent::BrickHit { broken: false } => Some(SoundEffect::BrickHit),
            GameEvent::BrickHit { broken: true } => Some(SoundEffect::BrickBreak),
            GameEvent::BulletFired => Some(SoundEffect::Fire),
            GameEvent::BallLaunched => Some(SoundEffect::Launch),
            GameEvent::BallLost => Some(SoundEffect::BallLost),
            GameEvent::StageCleared { .. } => Some(SoundEffect::StageClear),
            GameEvent::GameOver => Some(SoundEffect::GameOver),
            GameEvent::TimeUp => None,
        }
    }

    /// Contact sounds share the bounce sample
    pub fn is_bounce(self) -> bool {
        matches!(
            self,
            SoundEffect::PaddleHit | SoundEffect::WallHit | SoundEffect::BrickHit
        )
    }
}

/// Raw sample data loaded from disk
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

impl SoundBuffer {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path).map_err(|source| GameError::AssetLoad {
            path: path.clone(),
            source,
        })?;
        log::info!("Loaded sound {} ({} bytes)", path.display(), data.len());
        Ok(Self { path, data })
    }
}

/// Audio collaborator
pub trait AudioOutput {
    /// Start playing `effect`; `sample` is the loaded buffer when there is one
    fn play(&mut self, effect: SoundEffect, sample: Option<&SoundBuffer>, volume: f32);
}

/// Headless output: logs and counts what would have played
#[derive(Debug, Clone, Default)]
pub struct LoggingOutput {
    counts: [u64; SoundEffect::COUNT],
}

impl LoggingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, effect: SoundEffect) -> u64 {
        self.counts[effect as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl AudioOutput for LoggingOutput {
    fn play(&mut self, effect: SoundEffect, sample: Option<&SoundBuffer>, volume: f32) {
        self.counts[effect as usize] += 1;
        log::trace!(
            "Play {:?} at {:.2} ({})",
            effect,
            volume,
            sample.map_or_else(|| String::from("synth"), |s| s.path.display().to_string())
        );
    }
}

/// Audio manager for the game
#[derive(Debug)]
pub struct AudioManager<O: AudioOutput = LoggingOutput> {
    output: O,
    bounce: Option<SoundBuffer>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl<O: AudioOutput> AudioManager<O> {
    pub fn new(settings: &Settings, output: O) -> Result<Self> {
        let bounce = settings
            .assets
            .bounce_sound
            .as_ref()
            .map(SoundBuffer::load_from_file)
            .transpose()?;
        Ok(Self {
            output,
            bounce,
            master_volume: settings.master_volume,
            sfx_volume: settings.sfx_volume,
            muted: settings.muted,
        })
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let sample = if effect.is_bounce() {
            self.bounce.as_ref()
        } else {
            None
        };
        self.output.play(effect, sample, vol);
    }

    /// Play the effects for one frame's events
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        for effect in events.iter().filter_map(SoundEffect::for_event) {
            self.play(effect);
        }
    }
}
