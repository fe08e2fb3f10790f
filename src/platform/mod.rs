//! Platform abstraction layer
//!
//! The window system owns the keyboard; the game only asks whether a small
//! set of logical keys is held, once per frame. Two headless sources are
//! provided for demos and tests:
//! - `ScriptedInput`: fixed per-frame key schedule
//! - `RandomInput`: seeded random key presses

use std::ops::Range;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Logical keys the game polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    MoveLeft,
    MoveRight,
    Pause,
    Restart,
    Quit,
    Fire,
}

impl Key {
    pub const COUNT: usize = 6;

    pub const ALL: [Key; Self::COUNT] = [
        Key::MoveLeft,
        Key::MoveRight,
        Key::Pause,
        Key::Restart,
        Key::Quit,
        Key::Fire,
    ];
}

/// Keys held during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySnapshot {
    held: [bool; Key::COUNT],
}

impl KeySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form, handy in tests
    pub fn with(mut self, key: Key) -> Self {
        self.press(key);
        self
    }

    pub fn press(&mut self, key: Key) {
        self.held[key as usize] = true;
    }

    #[inline]
    pub fn is_held(&self, key: Key) -> bool {
        self.held[key as usize]
    }
}

/// Keyboard collaborator
pub trait InputSource {
    /// Whether `key` is currently held
    fn is_key_pressed(&self, key: Key) -> bool;

    /// Called once before each frame's poll
    fn next_frame(&mut self) {}

    /// Poll every logical key once
    fn poll(&mut self) -> KeySnapshot {
        self.next_frame();
        let mut snapshot = KeySnapshot::new();
        for key in Key::ALL {
            if self.is_key_pressed(key) {
                snapshot.press(key);
            }
        }
        snapshot
    }
}

/// Fixed schedule of held keys by frame number
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    schedule: Vec<(Range<u64>, Key)>,
    /// Frame of the current poll (0-based)
    frame: Option<u64>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `key` for the frames in `frames`
    pub fn hold(mut self, key: Key, frames: Range<u64>) -> Self {
        self.schedule.push((frames, key));
        self
    }

    /// Press `key` for exactly one frame
    pub fn tap(self, key: Key, frame: u64) -> Self {
        self.hold(key, frame..frame + 1)
    }

    pub fn frame(&self) -> u64 {
        self.frame.unwrap_or(0)
    }
}

impl InputSource for ScriptedInput {
    fn is_key_pressed(&self, key: Key) -> bool {
        let frame = self.frame();
        self.schedule
            .iter()
            .any(|(frames, k)| *k == key && frames.contains(&frame))
    }

    fn next_frame(&mut self) {
        self.frame = Some(self.frame.map_or(0, |f| f + 1));
    }
}

/// How long a random movement key stays held
const MOVE_HOLD_FRAMES: Range<u32> = 4..40;

/// Seeded random presses, a stand-in player for headless runs
#[derive(Debug, Clone)]
pub struct RandomInput {
    rng: Pcg32,
    snapshot: KeySnapshot,
    move_key: Option<Key>,
    move_frames_left: u32,
    fire_chance: f64,
    pause_chance: f64,
}

impl RandomInput {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            snapshot: KeySnapshot::new(),
            move_key: None,
            move_frames_left: 0,
            fire_chance: 0.05,
            pause_chance: 0.0,
        }
    }

    /// Also press pause now and then
    pub fn with_pause_chance(mut self, chance: f64) -> Self {
        self.pause_chance = chance.clamp(0.0, 1.0);
        self
    }
}

impl InputSource for RandomInput {
    fn is_key_pressed(&self, key: Key) -> bool {
        self.snapshot.is_held(key)
    }

    fn next_frame(&mut self) {
        if self.move_frames_left == 0 {
            self.move_key = match self.rng.random_range(0..3) {
                0 => Some(Key::MoveLeft),
                1 => Some(Key::MoveRight),
                _ => None,
            };
            self.move_frames_left = self.rng.random_range(MOVE_HOLD_FRAMES);
        }
        self.move_frames_left -= 1;

        let mut snapshot = KeySnapshot::new();
        if let Some(key) = self.move_key {
            snapshot.press(key);
        }
        if self.rng.random_bool(self.fire_chance) {
            snapshot.press(Key::Fire);
        }
        if self.pause_chance > 0.0 && self.rng.random_bool(self.pause_chance) {
            snapshot.press(Key::Pause);
        }
        self.snapshot = snapshot;
    }
}
