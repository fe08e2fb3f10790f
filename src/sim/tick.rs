//! Per-frame game step
//!
//! Owns the registry and drives the phase machine. Within one frame the
//! order is fixed: controls, keys, entity update, collision resolution, ball
//! drop, refresh, victory check. Drawing happens afterwards on the finished
//! state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::autopilot::AutopilotQuery;
use super::collision::resolve_all;
use super::entity::{GameEvent, UpdateContext};
use super::manager::Manager;
use super::state::{Ball, Brick, Bullet, GamePhase, GameStats, LifeIndicator, Paddle};
use crate::consts::*;
use crate::error::{GameError, Result};
use crate::platform::{Key, KeySnapshot};
use crate::renderer::colors;
use crate::settings::Settings;

/// Messages from the timer and autopilot tasks, applied at the start of a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlEvent {
    /// One second of stage time elapsed
    TimerTick,
    /// Predicted paddle position
    PaddleTarget(f32),
}

/// Input commands for a single step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Keys held this frame
    pub keys: KeySnapshot,
    pub controls: Vec<ControlEvent>,
}

impl TickInput {
    pub fn keys(keys: KeySnapshot) -> Self {
        Self {
            keys,
            controls: Vec::new(),
        }
    }
}

/// Runs the entity update pass, inline or elsewhere
pub trait UpdateDriver {
    fn update(&mut self, manager: &mut Manager, ctx: &UpdateContext) -> Result<Vec<GameEvent>>;
}

/// Update on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineUpdate;

impl UpdateDriver for InlineUpdate {
    fn update(&mut self, manager: &mut Manager, ctx: &UpdateContext) -> Result<Vec<GameEvent>> {
        let mut events = Vec::new();
        manager.update(ctx, &mut events);
        Ok(events)
    }
}

/// Log and swallow per-frame errors the game can live with
fn recover(result: Result<()>) -> Result<()> {
    match result {
        Err(err) if err.is_recoverable() => {
            log::warn!("Skipping frame logic: {}", err);
            Ok(())
        }
        other => other,
    }
}

/// Whole game: registry, phase and statistics
#[derive(Debug, Clone)]
pub struct Game {
    settings: Settings,
    manager: Manager,
    phase: GamePhase,
    /// Phase to resume when unpausing
    paused_from: GamePhase,
    stats: GameStats,
    pause_held: bool,
    restart_held: bool,
    fire_cooldown: u32,
    transit_left: u32,
    banner_left: u32,
    quit_requested: bool,
}

impl Game {
    pub fn new(settings: Settings) -> Self {
        let mut game = Self {
            settings,
            manager: Manager::new(),
            phase: GamePhase::NewLife,
            paused_from: GamePhase::NewLife,
            stats: GameStats::default(),
            pause_held: false,
            restart_held: false,
            fire_cooldown: 0,
            transit_left: 0,
            banner_left: 0,
            quit_requested: false,
        };
        game.restart();
        game
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn arena(&self) -> Vec2 {
        crate::window_size()
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::debug!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// New game from stage 1
    pub fn restart(&mut self) {
        self.stats = GameStats {
            score: 0,
            lives: self.settings.starting_lives,
            stage: 1,
            time_left: self.settings.stage_seconds,
            frame_in_stage: 0,
        };
        self.fire_cooldown = 0;
        log::info!("Starting game with {} lives", self.stats.lives);
        self.build_stage();
    }

    /// Rebuild the brick wall, paddle, ball and lives row for the current stage
    pub fn build_stage(&mut self) {
        let stage = self.stats.stage;
        self.manager.clear();

        let pitch = Vec2::new(BRICK_WIDTH + BRICK_SPACING, BRICK_HEIGHT + BRICK_SPACING);
        for column in 0..BRICK_COLUMNS {
            for row in 0..BRICK_ROWS {
                let center = Vec2::new(
                    BRICK_OFFSET_X + (column as f32 + BRICK_START_COLUMN) * pitch.x,
                    (row + BRICK_START_ROW) as f32 * pitch.y,
                );
                let (hits, tint) = if column % 2 == 0 {
                    (1, colors::BRICK_SOFT)
                } else {
                    (3, colors::BRICK_HARD)
                };
                self.manager.create(Brick::new(center, hits, tint).in_stage(stage));
            }
        }

        let arena = self.arena();
        let mut paddle = Paddle::new(Vec2::new(arena.x / 2.0, arena.y - PADDLE_BOTTOM_OFFSET));
        if self.settings.autopilot {
            paddle = paddle.autopiloted();
        }
        let ball = Ball::resting_on(&paddle);
        self.manager.create(paddle);
        self.manager.create(ball);

        for i in 0..self.stats.lives {
            self.manager.create(LifeIndicator::new(LifeIndicator::slot(i)));
        }

        self.stats.time_left = self.settings.stage_seconds;
        self.stats.frame_in_stage = 0;
        self.transit_left = 0;
        self.banner_left = 0;
        self.paused_from = GamePhase::NewLife;
        self.set_phase(GamePhase::NewLife);
        log::info!(
            "Stage {} built with {} bricks",
            stage,
            self.manager.count::<Brick>()
        );
    }

    /// Snapshot for the paddle-position predictor, when the autopilot has work
    pub fn autopilot_query(&self) -> Option<AutopilotQuery> {
        if !self.settings.autopilot || !self.phase.is_live() {
            return None;
        }
        match self.manager.autopilot_query(self.arena()) {
            Ok(query) => Some(query),
            Err(err) => {
                log::debug!("No autopilot query this frame: {}", err);
                None
            }
        }
    }

    /// Advance one frame
    pub fn step(&mut self, input: &TickInput, driver: &mut dyn UpdateDriver) -> Result<Vec<GameEvent>> {
        let mut events = Vec::new();

        for control in &input.controls {
            self.apply_control(*control, &mut events)?;
        }

        let keys = &input.keys;
        if keys.is_held(Key::Quit) {
            log::info!("Quit requested");
            self.quit_requested = true;
            return Ok(events);
        }

        let restart_pressed = keys.is_held(Key::Restart) && !self.restart_held;
        self.restart_held = keys.is_held(Key::Restart);
        if restart_pressed {
            self.restart();
            return Ok(events);
        }

        let pause_pressed = keys.is_held(Key::Pause) && !self.pause_held;
        self.pause_held = keys.is_held(Key::Pause);
        if pause_pressed {
            self.toggle_pause();
        }

        match self.phase {
            GamePhase::Paused | GamePhase::GameOver => {}
            GamePhase::Victory => {
                if self.count_down_banner() {
                    self.stats.stage += 1;
                    self.build_stage();
                }
            }
            GamePhase::Lost => {
                if self.count_down_banner() {
                    log::info!("Game over with score {}", self.stats.score);
                    events.push(GameEvent::GameOver);
                    self.set_phase(GamePhase::GameOver);
                }
            }
            GamePhase::InProgress | GamePhase::NewLife | GamePhase::Transit => {
                self.simulate(keys, driver, &mut events)?;
                self.stats.frame_in_stage += 1;
            }
        }

        Ok(events)
    }

    fn apply_control(&mut self, control: ControlEvent, events: &mut Vec<GameEvent>) -> Result<()> {
        match control {
            ControlEvent::TimerTick => {
                if !self.phase.is_live() || self.stats.time_left == 0 {
                    return Ok(());
                }
                self.stats.time_left -= 1;
                if self.stats.time_left == 0 {
                    log::info!("Stage {} timer ran out", self.stats.stage);
                    events.push(GameEvent::TimeUp);
                    self.enter_lost();
                }
                Ok(())
            }
            ControlEvent::PaddleTarget(x) => recover(self.manager.steer_paddle(x)),
        }
    }

    fn toggle_pause(&mut self) {
        if self.phase.is_live() {
            self.paused_from = self.phase;
            self.set_phase(GamePhase::Paused);
            log::info!("Paused");
        } else if self.phase == GamePhase::Paused {
            self.set_phase(self.paused_from);
            log::info!("Resumed");
        }
    }

    /// True once the banner has been up long enough
    fn count_down_banner(&mut self) -> bool {
        self.banner_left = self.banner_left.saturating_sub(1);
        self.banner_left == 0
    }

    fn enter_lost(&mut self) {
        self.banner_left = self.settings.banner_frames.max(1);
        self.set_phase(GamePhase::Lost);
    }

    fn simulate(&mut self, keys: &KeySnapshot, driver: &mut dyn UpdateDriver, events: &mut Vec<GameEvent>) -> Result<()> {
        let arena = self.arena();
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);

        match self.phase {
            GamePhase::NewLife => {
                if keys.is_held(Key::Fire) || self.settings.autopilot {
                    recover(self.launch_ball(events))?;
                }
            }
            GamePhase::Transit => {
                self.transit_left = self.transit_left.saturating_sub(1);
                if self.transit_left == 0 {
                    self.set_phase(GamePhase::InProgress);
                }
            }
            GamePhase::InProgress => {
                if keys.is_held(Key::Fire) && self.fire_cooldown == 0 {
                    recover(self.fire_bullet(events))?;
                }
            }
            _ => {}
        }

        let ctx = UpdateContext {
            keys: *keys,
            arena,
            rules: self.settings.rules,
            stage: self.stats.stage,
            brick_drift: self.settings.brick_drift_speed,
        };
        events.extend(driver.update(&mut self.manager, &ctx)?);

        if self.phase == GamePhase::NewLife {
            recover(self.carry_resting_ball())?;
        }

        self.stats.score += resolve_all(&mut self.manager, self.settings.rules.broken_brick, events);

        if self.manager.check_ball_dropped(arena, self.settings.rules.bottom_edge) {
            self.lose_ball(events);
        }

        self.manager.refresh();

        if self.phase.is_live() && !self.manager.iter::<Brick>().any(Brick::is_intact) {
            log::info!(
                "Stage {} cleared with score {}",
                self.stats.stage,
                self.stats.score
            );
            events.push(GameEvent::StageCleared {
                stage: self.stats.stage,
            });
            self.banner_left = self.settings.banner_frames.max(1);
            self.set_phase(GamePhase::Victory);
        }

        Ok(())
    }

    fn launch_ball(&mut self, events: &mut Vec<GameEvent>) -> Result<()> {
        let speed = self.settings.ball_speed;
        if self.manager.single_mut::<Ball>()?.launch(speed) {
            events.push(GameEvent::BallLaunched);
            self.transit_left = self.settings.transit_frames.max(1);
            self.set_phase(GamePhase::Transit);
        }
        Ok(())
    }

    fn fire_bullet(&mut self, events: &mut Vec<GameEvent>) -> Result<()> {
        let paddle = self.manager.single::<Paddle>()?;
        let muzzle = Vec2::new(paddle.x(), paddle.shape.center.y - paddle.shape.height() / 2.0);
        self.manager.create(Bullet::new(muzzle));
        self.fire_cooldown = self.settings.fire_cooldown_frames;
        events.push(GameEvent::BulletFired);
        Ok(())
    }

    fn carry_resting_ball(&mut self) -> Result<()> {
        let paddle = self.manager.single::<Paddle>()?.clone();
        self.manager.for_each::<Ball>(|ball| ball.follow(&paddle));
        Ok(())
    }

    fn lose_ball(&mut self, events: &mut Vec<GameEvent>) {
        self.manager.handle_ball_drop();
        self.stats.lives = self.manager.count::<LifeIndicator>() as u32;
        events.push(GameEvent::BallLost);
        log::info!("Ball lost, {} lives left", self.stats.lives);

        if self.stats.lives == 0 {
            self.enter_lost();
            return;
        }
        match self.manager.single::<Paddle>().map(Ball::resting_on) {
            Ok(ball) => {
                self.manager.create(ball);
                self.set_phase(GamePhase::NewLife);
            }
            Err(err) => {
                log::warn!("Cannot respawn ball: {}", err);
                self.enter_lost();
            }
        }
    }

    /// Consistency check used by the runtime after each frame
    pub fn check_invariants(&self) -> Result<()> {
        self.manager.check_invariants()?;
        if self.manager.count::<Ball>() > 1 {
            return Err(GameError::InvariantViolation(format!(
                "{} balls in play",
                self.manager.count::<Ball>()
            )));
        }
        Ok(())
    }
}
