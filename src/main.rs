//! Arkanoid headless entry point
//!
//! Runs the game against a recording surface and a logging audio output,
//! with seeded random key presses standing in for a player. With the
//! autopilot on, those presses only fire bullets. Settings come from
//! `ARKANOID_SETTINGS`.

use std::process::ExitCode;

use arkanoid::audio::LoggingOutput;
use arkanoid::platform::RandomInput;
use arkanoid::renderer::RecordingSurface;
use arkanoid::runtime::{RunSummary, Runtime};
use arkanoid::{Result, Settings};

/// Frames to run when the settings leave it open (one minute at 60 fps)
const DEFAULT_DEMO_FRAMES: u64 = 3_600;

fn run() -> Result<RunSummary> {
    let settings = Settings::load()?;
    let max_frames = settings.max_frames.unwrap_or(DEFAULT_DEMO_FRAMES);
    let input = RandomInput::new(settings.input_seed);

    let mut runtime = Runtime::new(settings, input, RecordingSurface::new(), LoggingOutput::new())?;
    let summary = runtime.run(Some(max_frames))?;
    log::info!(
        "{} sounds played, {} frames presented",
        runtime.audio().output().total(),
        runtime.target().frames_presented()
    );
    Ok(summary)
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Arkanoid (headless) starting...");

    match run() {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => log::info!("Run summary:\n{}", json),
                Err(err) => log::warn!("Could not encode run summary: {}", err),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Fatal: {}", err);
            ExitCode::FAILURE
        }
    }
}
