//! Frame loop
//!
//! Each frame polls input, steps the game, plays the frame's sounds and
//! draws the finished state. Update, collision and draw never overlap: in
//! threaded mode the simulation worker holds the registry only while the
//! main loop waits for it.

pub mod workers;

use std::time::Duration;

use serde::Serialize;

use crate::audio::{AudioManager, AudioOutput, LoggingOutput};
use crate::error::Result;
use crate::platform::InputSource;
use crate::renderer::{Font, Hud, RenderTarget, colors};
use crate::settings::Settings;
use crate::sim::{ControlEvent, Game, GamePhase, InlineUpdate, TickInput};

pub use workers::Workers;

/// Stage timer period
const TIMER_PERIOD: Duration = Duration::from_secs(1);

/// How updates and side tasks are run
#[derive(Debug)]
pub enum Scheduler {
    /// Everything on the calling thread; the timer counts frames
    Inline { frames_since_tick: u32 },
    /// Simulation, autopilot and timer on worker threads
    Threaded(Workers),
}

/// End-of-run report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub stage: u32,
    pub score: u64,
    pub lives: u32,
    pub phase: GamePhase,
    pub quit: bool,
    pub threaded: bool,
    /// Per-frame errors that were logged and skipped
    pub recovered_errors: u64,
}

/// Game plus its collaborators
pub struct Runtime<I: InputSource, R: RenderTarget, O: AudioOutput = LoggingOutput> {
    game: Game,
    input: I,
    target: R,
    audio: AudioManager<O>,
    hud: Hud,
    scheduler: Scheduler,
    frames: u64,
    recovered_errors: u64,
}

impl<I: InputSource, R: RenderTarget, O: AudioOutput> Runtime<I, R, O> {
    /// Load assets, start workers when configured, build stage 1.
    ///
    /// A configured font or sound that cannot be read fails here.
    pub fn new(settings: Settings, input: I, mut target: R, output: O) -> Result<Self> {
        let font = settings
            .assets
            .font
            .as_ref()
            .map(Font::load_from_file)
            .transpose()?;
        let audio = AudioManager::new(&settings, output)?;
        target.set_framerate_limit(settings.framerate);

        let scheduler = if settings.threaded {
            Scheduler::Threaded(Workers::spawn(TIMER_PERIOD)?)
        } else {
            Scheduler::Inline {
                frames_since_tick: 0,
            }
        };
        log::info!(
            "Runtime ready ({}, autopilot {})",
            if settings.threaded { "threaded" } else { "inline" },
            if settings.autopilot { "on" } else { "off" }
        );

        Ok(Self {
            game: Game::new(settings),
            input,
            target,
            audio,
            hud: Hud::new(font),
            scheduler,
            frames: 0,
            recovered_errors: 0,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn audio(&self) -> &AudioManager<O> {
        &self.audio
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn is_threaded(&self) -> bool {
        matches!(self.scheduler, Scheduler::Threaded(_))
    }

    /// Timer and autopilot messages for this frame
    fn collect_controls(&mut self) -> Vec<ControlEvent> {
        match &mut self.scheduler {
            Scheduler::Threaded(workers) => workers.drain_controls(),
            Scheduler::Inline { frames_since_tick } => {
                let mut controls = Vec::new();
                *frames_since_tick += 1;
                if *frames_since_tick >= self.game.settings().framerate {
                    *frames_since_tick = 0;
                    controls.push(ControlEvent::TimerTick);
                }
                if let Some(x) = self.game.autopilot_query().and_then(|q| q.predict()) {
                    controls.push(ControlEvent::PaddleTarget(x));
                }
                controls
            }
        }
    }

    /// Run one frame; `false` once the player has quit
    pub fn frame(&mut self) -> Result<bool> {
        let keys = self.input.poll();
        let input = TickInput {
            keys,
            controls: self.collect_controls(),
        };

        let stepped = match &mut self.scheduler {
            Scheduler::Inline { .. } => self.game.step(&input, &mut InlineUpdate),
            Scheduler::Threaded(workers) => self.game.step(&input, &mut workers.simulation),
        };
        match stepped {
            Ok(events) => self.audio.handle_events(&events),
            Err(err) if err.is_recoverable() => {
                log::warn!("Frame {}: {}", self.frames, err);
                self.recovered_errors += 1;
            }
            Err(err) => return Err(err),
        }

        if let Err(err) = self.game.check_invariants() {
            log::warn!("Frame {}: {}", self.frames, err);
            self.recovered_errors += 1;
        }

        if let Scheduler::Threaded(workers) = &self.scheduler {
            if let Some(query) = self.game.autopilot_query() {
                workers.autopilot.submit(query)?;
            }
        }

        self.render();
        self.frames += 1;
        Ok(!self.game.quit_requested())
    }

    fn render(&mut self) {
        self.target.clear(colors::BACKGROUND);
        self.game.manager().draw(&mut self.target);
        self.hud.update(self.game.phase(), self.game.stats());
        self.hud.draw(&mut self.target);
        self.target.display();
    }

    /// Frame until quit or `max_frames`, then stop the workers
    pub fn run(&mut self, max_frames: Option<u64>) -> Result<RunSummary> {
        let result = self.run_frames(max_frames);
        self.shutdown();
        result?;
        let summary = self.summary();
        log::info!(
            "Run finished after {} frames: stage {}, score {}",
            summary.frames,
            summary.stage,
            summary.score
        );
        Ok(summary)
    }

    fn run_frames(&mut self, max_frames: Option<u64>) -> Result<()> {
        while max_frames.is_none_or(|max| self.frames < max) {
            if !self.frame()? {
                break;
            }
        }
        Ok(())
    }

    /// Signal and join the workers, if any
    pub fn shutdown(&mut self) {
        if let Scheduler::Threaded(workers) = &mut self.scheduler {
            workers.shutdown();
        }
    }

    pub fn summary(&self) -> RunSummary {
        let stats = self.game.stats();
        RunSummary {
            frames: self.frames,
            stage: stats.stage,
            score: stats.score,
            lives: stats.lives,
            phase: self.game.phase(),
            quit: self.game.quit_requested(),
            threaded: self.is_threaded(),
            recovered_errors: self.recovered_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::platform::{Key, RandomInput, ScriptedInput};
    use crate::renderer::RecordingSurface;
    use crate::settings::AssetPaths;
    use crate::sim::{Ball, Brick};

    fn inline_settings() -> Settings {
        Settings {
            threaded: false,
            autopilot: false,
            ..Settings::default()
        }
    }

    fn runtime<I: InputSource>(settings: Settings, input: I) -> Runtime<I, RecordingSurface> {
        Runtime::new(settings, input, RecordingSurface::new(), LoggingOutput::new()).unwrap()
    }

    #[test]
    fn test_inline_run_draws_every_frame() {
        let mut rt = runtime(inline_settings(), ScriptedInput::new());
        let summary = rt.run(Some(10)).unwrap();
        assert_eq!(summary.frames, 10);
        assert!(!summary.quit);
        assert!(!summary.threaded);
        assert_eq!(rt.target().frames_presented(), 10);
        assert_eq!(rt.target().framerate_limit(), Some(60));

        // 44 bricks, paddle, ball, 3 lives
        let frame = rt.target().last_frame();
        assert_eq!(frame.shapes.len(), 49);
        assert_eq!(frame.clear_color, Some(colors::BACKGROUND));
        assert!(frame.texts.iter().any(|t| t.string == "Stage: 1"));
    }

    #[test]
    fn test_inline_timer_counts_frames() {
        let mut rt = runtime(inline_settings(), ScriptedInput::new());
        rt.run(Some(120)).unwrap();
        assert_eq!(rt.game().stats().time_left, 998);
    }

    #[test]
    fn test_quit_key_ends_run() {
        let input = ScriptedInput::new().tap(Key::Quit, 5);
        let mut rt = runtime(inline_settings(), input);
        let summary = rt.run(Some(100)).unwrap();
        assert!(summary.quit);
        assert_eq!(summary.frames, 6);
    }

    #[test]
    fn test_launch_plays_sound() {
        let input = ScriptedInput::new().tap(Key::Fire, 0);
        let mut rt = runtime(inline_settings(), input);
        rt.run(Some(3)).unwrap();
        assert_eq!(rt.audio().output().count(crate::audio::SoundEffect::Launch), 1);
        assert!(!rt.game().manager().single::<Ball>().unwrap().is_resting());
    }

    #[test]
    fn test_missing_font_fails_startup() {
        let settings = Settings {
            assets: AssetPaths {
                font: Some("/no/such/font.ttf".into()),
                ..AssetPaths::default()
            },
            ..inline_settings()
        };
        let err = Runtime::new(
            settings,
            ScriptedInput::new(),
            RecordingSurface::new(),
            LoggingOutput::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, GameError::AssetLoad { .. }));
    }

    #[test]
    fn test_autopilot_inline_keeps_invariants() {
        let settings = Settings {
            autopilot: true,
            ..inline_settings()
        };
        let mut rt = runtime(settings, ScriptedInput::new());
        let summary = rt.run(Some(2_000)).unwrap();
        assert_eq!(summary.frames, 2_000);
        assert_eq!(summary.recovered_errors, 0);
        rt.game().check_invariants().unwrap();
        assert!(rt.game().manager().count::<Brick>() <= 44);
    }

    #[test]
    fn test_threaded_run_shuts_down_cleanly() {
        let settings = Settings {
            threaded: true,
            autopilot: true,
            ..Settings::default()
        };
        let mut rt = runtime(settings, RandomInput::new(3));
        let summary = rt.run(Some(300)).unwrap();
        assert!(summary.threaded);
        assert_eq!(summary.frames, 300);
        assert_eq!(rt.target().frames_presented(), 300);
        rt.game().check_invariants().unwrap();

        // Second shutdown is a no-op
        rt.shutdown();
    }

    #[test]
    fn test_threaded_and_inline_agree_without_side_tasks() {
        let script = || {
            ScriptedInput::new()
                .hold(Key::MoveLeft, 0..20)
                .tap(Key::Fire, 25)
                .hold(Key::MoveRight, 30..60)
        };
        let mut inline = runtime(inline_settings(), script());
        let mut threaded = runtime(
            Settings {
                threaded: true,
                ..inline_settings()
            },
            script(),
        );
        inline.run(Some(90)).unwrap();
        threaded.run(Some(90)).unwrap();

        let ball = |rt: &Runtime<ScriptedInput, RecordingSurface>| {
            rt.game().manager().single::<Ball>().map(|b| b.position()).ok()
        };
        assert_eq!(ball(&inline), ball(&threaded));
        assert_eq!(inline.game().stats().score, threaded.game().stats().score);
    }
}
