//! Game objects, phases and run statistics

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bounds::{Bounds, Circle, Rect};
use super::entity::{Entity, EntityMeta, GameEvent, UpdateContext};
use crate::consts::*;
use crate::platform::{Key, KeySnapshot};
use crate::renderer::shapes::brick_color;
use crate::renderer::{RenderTarget, Rgba, Shape, colors};
use crate::settings::{BottomEdge, BrokenBrick};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    InProgress,
    /// Frozen; entities drawn but not updated
    Paused,
    /// Stage cleared, banner showing
    Victory,
    /// Out of lives or time, banner showing
    Lost,
    /// Fresh ball resting on the paddle, waiting for fire
    NewLife,
    /// Ball just launched; bullets held back
    Transit,
    /// Run ended; waits for restart
    GameOver,
}

impl GamePhase {
    /// Phases in which the simulation advances
    pub fn is_live(self) -> bool {
        matches!(self, GamePhase::InProgress | GamePhase::NewLife | GamePhase::Transit)
    }
}

/// Score, lives, stage and countdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub score: u64,
    pub lives: u32,
    /// 1-based stage number
    pub stage: u32,
    /// Seconds left on the stage timer
    pub time_left: u32,
    /// Frames since the stage was built
    pub frame_in_stage: u64,
}

/// Ball sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    /// Sitting on the paddle, carried along until launched
    Resting,
    /// Moving under its own velocity
    Free,
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub meta: EntityMeta,
    pub shape: Circle,
    pub velocity: Vec2,
    pub state: BallState,
}

impl Ball {
    /// A free ball at `pos`
    pub fn new(pos: Vec2, velocity: Vec2) -> Self {
        Self {
            meta: EntityMeta::default(),
            shape: Circle::new(pos, BALL_RADIUS),
            velocity,
            state: BallState::Free,
        }
    }

    /// A ball resting on top of `paddle`
    pub fn resting_on(paddle: &Paddle) -> Self {
        let mut ball = Self {
            meta: EntityMeta::default(),
            shape: Circle::new(Vec2::ZERO, BALL_RADIUS),
            velocity: Vec2::ZERO,
            state: BallState::Resting,
        };
        ball.follow(paddle);
        ball
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.shape.center
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.shape.center.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.shape.center.y
    }

    pub fn is_resting(&self) -> bool {
        self.state == BallState::Resting
    }

    /// Keep a resting ball centred on top of the paddle
    pub fn follow(&mut self, paddle: &Paddle) {
        if self.is_resting() {
            self.shape.center = Vec2::new(paddle.x(), paddle.top() - self.shape.radius);
        }
    }

    /// Leave the paddle: up and to the left at `speed` per axis
    pub fn launch(&mut self, speed: f32) -> bool {
        if !self.is_resting() {
            return false;
        }
        self.velocity = Vec2::new(-speed, -speed);
        self.state = BallState::Free;
        true
    }

    /// Reflect off the window edges
    fn solve_bound_collisions(&mut self, ctx: &UpdateContext, events: &mut Vec<GameEvent>) {
        if self.left() < 0.0 {
            self.velocity.x = self.velocity.x.abs();
            events.push(GameEvent::WallBounce);
        } else if self.right() > ctx.arena.x {
            self.velocity.x = -self.velocity.x.abs();
            events.push(GameEvent::WallBounce);
        }

        if self.top() < 0.0 {
            self.velocity.y = self.velocity.y.abs();
            events.push(GameEvent::WallBounce);
        } else if self.bottom() > ctx.arena.y {
            match ctx.rules.bottom_edge {
                BottomEdge::Bounce => {
                    self.velocity.y = -self.velocity.y.abs();
                    events.push(GameEvent::WallBounce);
                }
                BottomEdge::Drop => self.meta.destroy(),
            }
        }
    }
}

impl Bounds for Ball {
    fn left(&self) -> f32 {
        self.shape.left()
    }
    fn right(&self) -> f32 {
        self.shape.right()
    }
    fn top(&self) -> f32 {
        self.shape.top()
    }
    fn bottom(&self) -> f32 {
        self.shape.bottom()
    }
}

impl Entity for Ball {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn update(&mut self, ctx: &UpdateContext, events: &mut Vec<GameEvent>) {
        if self.is_resting() {
            return;
        }
        self.shape.center += self.velocity;
        self.solve_bound_collisions(ctx, events);
    }

    fn has_died(&self, arena: Vec2) -> bool {
        self.bottom() > arena.y
    }

    fn draw(&self, target: &mut dyn RenderTarget) {
        target.draw(&Shape::circle(self.shape, colors::BALL));
    }
}

/// Who moves the paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaddleControl {
    /// Left/right keys
    Keyboard,
    /// Steers toward the last commanded x position
    Autopilot,
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub meta: EntityMeta,
    pub shape: Rect,
    pub velocity: Vec2,
    pub control: PaddleControl,
    /// Last x position commanded by the autopilot
    pub last_command: Option<f32>,
    pub speed: f32,
}

impl Paddle {
    pub fn new(center: Vec2) -> Self {
        Self::with_size(center, Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT))
    }

    pub fn with_size(center: Vec2, size: Vec2) -> Self {
        Self {
            meta: EntityMeta::default(),
            shape: Rect::new(center, size),
            velocity: Vec2::ZERO,
            control: PaddleControl::Keyboard,
            last_command: None,
            speed: PADDLE_SPEED,
        }
    }

    pub fn autopiloted(mut self) -> Self {
        self.control = PaddleControl::Autopilot;
        self
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.shape.center.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.shape.center.y
    }

    /// Autopilot target; ignored under keyboard control
    pub fn command(&mut self, x: f32) {
        if self.control == PaddleControl::Autopilot {
            self.last_command = Some(x);
        }
    }

    /// Velocity from held keys; a move that would cross a window edge is refused
    pub fn process_input(&mut self, keys: &KeySnapshot, arena: Vec2) {
        self.velocity.x = if keys.is_held(Key::MoveLeft) && self.left() - self.speed >= 0.0 {
            -self.speed
        } else if keys.is_held(Key::MoveRight) && self.right() + self.speed <= arena.x {
            self.speed
        } else {
            0.0
        };
    }

    /// Velocity toward the commanded position, same edge policy as the keys
    fn seek_command(&mut self, arena: Vec2) {
        let step = match self.last_command {
            Some(target) => (target - self.x()).clamp(-self.speed, self.speed),
            None => 0.0,
        };
        let stays_inside = self.left() + step >= 0.0 && self.right() + step <= arena.x;
        self.velocity.x = if stays_inside { step } else { 0.0 };
    }
}

impl Bounds for Paddle {
    fn left(&self) -> f32 {
        self.shape.left()
    }
    fn right(&self) -> f32 {
        self.shape.right()
    }
    fn top(&self) -> f32 {
        self.shape.top()
    }
    fn bottom(&self) -> f32 {
        self.shape.bottom()
    }
}

impl Entity for Paddle {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn update(&mut self, ctx: &UpdateContext, _events: &mut Vec<GameEvent>) {
        match self.control {
            PaddleControl::Keyboard => self.process_input(&ctx.keys, ctx.arena),
            PaddleControl::Autopilot => self.seek_command(ctx.arena),
        }
        self.shape.center += self.velocity;
    }

    fn has_died(&self, _arena: Vec2) -> bool {
        false
    }

    fn draw(&self, target: &mut dyn RenderTarget) {
        target.draw(&Shape::rect(self.shape, colors::PADDLE));
    }
}

/// Result of striking a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Already broken; nothing changed
    Ignored,
    /// Counter decreased, still standing
    Damaged,
    /// Counter reached zero on this hit
    Broken,
}

/// A brick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub meta: EntityMeta,
    pub shape: Rect,
    pub tint: Rgba,
    /// Hits still needed; zero means broken
    pub hits_remaining: u32,
    /// Hits needed when built; awarded as score on break
    pub strength: u32,
    /// Degrees
    pub rotation: f32,
    flinging: bool,
}

impl Brick {
    pub fn new(center: Vec2, hits: u32, tint: Rgba) -> Self {
        let hits = hits.max(1);
        Self {
            meta: EntityMeta::default(),
            shape: Rect::new(center, Vec2::new(BRICK_WIDTH, BRICK_HEIGHT)),
            tint,
            hits_remaining: hits,
            strength: hits,
            rotation: 0.0,
            flinging: false,
        }
    }

    pub fn in_stage(mut self, stage: u32) -> Self {
        self.meta.stage = stage;
        self
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.shape.center.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.shape.center.y
    }

    pub fn is_flying(&self) -> bool {
        self.flinging
    }

    /// Still has hits left (counts toward clearing the stage)
    pub fn is_intact(&self) -> bool {
        self.hits_remaining > 0 && !self.meta.destroyed
    }

    /// Take one hit; the zero transition happens exactly once
    pub fn take_hit(&mut self, rule: BrokenBrick) -> HitOutcome {
        if !self.is_intact() {
            return HitOutcome::Ignored;
        }
        self.hits_remaining -= 1;
        if self.hits_remaining > 0 {
            return HitOutcome::Damaged;
        }
        match rule {
            BrokenBrick::Vanish => self.meta.destroy(),
            BrokenBrick::Fling => self.flinging = true,
        }
        HitOutcome::Broken
    }
}

impl Bounds for Brick {
    fn left(&self) -> f32 {
        self.shape.left()
    }
    fn right(&self) -> f32 {
        self.shape.right()
    }
    fn top(&self) -> f32 {
        self.shape.top()
    }
    fn bottom(&self) -> f32 {
        self.shape.bottom()
    }
}

impl Entity for Brick {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn update(&mut self, ctx: &UpdateContext, _events: &mut Vec<GameEvent>) {
        if self.flinging {
            self.rotation = (self.rotation + BRICK_FLING_SPIN) % 360.0;
            self.shape.center += Vec2::new(-BRICK_FLING_SPEED, -BRICK_FLING_SPEED);
        } else if self.meta.stage >= 2 && ctx.brick_drift > 0.0 {
            self.shape.center.x -= ctx.brick_drift;
            if self.left() < 0.0 {
                self.shape.center.x = self.left() + ctx.arena.x;
            }
        }

        if self.x() < 0.0 {
            self.meta.destroy();
        }
    }

    fn has_died(&self, _arena: Vec2) -> bool {
        self.hits_remaining == 0
    }

    fn draw(&self, target: &mut dyn RenderTarget) {
        let shape = Shape::rect(self.shape, brick_color(self.tint, self.hits_remaining))
            .with_rotation(self.rotation)
            .with_outline(colors::BRICK_OUTLINE, 2.0);
        target.draw(&shape);
    }
}

/// A bullet fired straight up from the paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub meta: EntityMeta,
    pub shape: Circle,
    pub velocity: Vec2,
    pub struck: bool,
}

impl Bullet {
    pub fn new(pos: Vec2) -> Self {
        Self {
            meta: EntityMeta::default(),
            shape: Circle::new(pos, BULLET_RADIUS),
            velocity: Vec2::new(0.0, -BULLET_SPEED),
            struck: false,
        }
    }

    /// Spent on a brick
    pub fn strike(&mut self) {
        self.struck = true;
        self.meta.destroy();
    }
}

impl Bounds for Bullet {
    fn left(&self) -> f32 {
        self.shape.left()
    }
    fn right(&self) -> f32 {
        self.shape.right()
    }
    fn top(&self) -> f32 {
        self.shape.top()
    }
    fn bottom(&self) -> f32 {
        self.shape.bottom()
    }
}

impl Entity for Bullet {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn update(&mut self, ctx: &UpdateContext, _events: &mut Vec<GameEvent>) {
        self.shape.center += self.velocity;
        if self.has_died(ctx.arena) {
            self.meta.destroy();
        }
    }

    fn has_died(&self, _arena: Vec2) -> bool {
        self.shape.center.y < 0.0 || self.struck
    }

    fn draw(&self, target: &mut dyn RenderTarget) {
        target.draw(&Shape::circle(self.shape, colors::BULLET));
    }
}

/// One dot in the lives row; passive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifeIndicator {
    pub meta: EntityMeta,
    pub shape: Circle,
}

impl LifeIndicator {
    pub fn new(pos: Vec2) -> Self {
        Self {
            meta: EntityMeta::parked(),
            shape: Circle::new(pos, LIFE_RADIUS),
        }
    }

    /// Position of the `index`-th dot in the row
    pub fn slot(index: u32) -> Vec2 {
        let step = 2.0 * LIFE_RADIUS + LIFE_SPACING;
        Vec2::new(LIFE_ROW_X + index as f32 * step, LIFE_ROW_Y)
    }
}

impl Entity for LifeIndicator {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn update(&mut self, _ctx: &UpdateContext, _events: &mut Vec<GameEvent>) {}

    fn has_died(&self, _arena: Vec2) -> bool {
        false
    }

    fn draw(&self, target: &mut dyn RenderTarget) {
        target.draw(&Shape::circle(self.shape, colors::LIFE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Rules;
    use proptest::prelude::*;

    fn ctx() -> UpdateContext {
        UpdateContext::new(KeySnapshot::new(), Rules::extended())
    }

    #[test]
    fn test_ball_moves_by_velocity() {
        let mut ball = Ball::new(Vec2::new(400.0, 300.0), Vec2::new(8.0, 8.0));
        let mut events = Vec::new();
        ball.update(&ctx(), &mut events);
        assert_eq!(ball.position(), Vec2::new(408.0, 308.0));
        assert!(events.is_empty());
    }

    #[test]
    fn test_ball_bounces_off_left_and_top() {
        let mut ball = Ball::new(Vec2::new(6.0, 6.0), Vec2::new(-4.0, -4.0));
        let mut events = Vec::new();
        ball.update(&ctx(), &mut events);
        assert_eq!(ball.velocity, Vec2::new(4.0, 4.0));
        assert_eq!(events, vec![GameEvent::WallBounce, GameEvent::WallBounce]);
    }

    #[test]
    fn test_ball_bottom_edge_rules() {
        let start = Vec2::new(400.0, 594.0);
        let mut dropped = Ball::new(start, Vec2::new(4.0, 4.0));
        dropped.update(&ctx(), &mut Vec::new());
        assert!(dropped.meta.destroyed);
        assert!(dropped.has_died(crate::window_size()));
        assert_eq!(dropped.velocity.y, 4.0);

        let tutorial = UpdateContext::new(KeySnapshot::new(), Rules::tutorial());
        let mut bounced = Ball::new(start, Vec2::new(4.0, 4.0));
        let mut events = Vec::new();
        bounced.update(&tutorial, &mut events);
        assert!(!bounced.meta.destroyed);
        assert_eq!(bounced.velocity.y, -4.0);
        assert_eq!(events, vec![GameEvent::WallBounce]);
    }

    #[test]
    fn test_resting_ball_follows_and_launches() {
        let paddle = Paddle::new(Vec2::new(400.0, 550.0));
        let mut ball = Ball::resting_on(&paddle);
        assert_eq!(ball.position(), Vec2::new(400.0, 540.0 - BALL_RADIUS));

        ball.update(&ctx(), &mut Vec::new());
        assert_eq!(ball.velocity, Vec2::ZERO);

        let mut moved = paddle.clone();
        moved.shape.center.x = 300.0;
        ball.follow(&moved);
        assert_eq!(ball.x(), 300.0);

        assert!(ball.launch(4.0));
        assert_eq!(ball.velocity, Vec2::new(-4.0, -4.0));
        assert!(!ball.launch(4.0));
    }

    #[test]
    fn test_paddle_left_key_respects_bound() {
        let keys = KeySnapshot::new().with(Key::MoveLeft);
        let arena = crate::window_size();

        let mut paddle = Paddle::new(Vec2::new(400.0, 550.0));
        assert_eq!(paddle.left(), 370.0);
        paddle.process_input(&keys, arena);
        assert_eq!(paddle.velocity.x, -8.0);

        let mut edge = Paddle::new(Vec2::new(25.0, 550.0));
        assert_eq!(edge.left(), -5.0);
        edge.process_input(&keys, arena);
        assert_eq!(edge.velocity.x, 0.0);
    }

    #[test]
    fn test_paddle_right_key_respects_bound() {
        let keys = KeySnapshot::new().with(Key::MoveRight);
        let mut paddle = Paddle::new(Vec2::new(766.0, 550.0));
        paddle.update(
            &UpdateContext::new(keys, Rules::extended()),
            &mut Vec::new(),
        );
        assert_eq!(paddle.velocity.x, 0.0);
        assert_eq!(paddle.x(), 766.0);
    }

    #[test]
    fn test_autopilot_paddle_steps_toward_command() {
        let mut paddle = Paddle::new(Vec2::new(400.0, 550.0)).autopiloted();
        paddle.command(395.0);
        paddle.update(&ctx(), &mut Vec::new());
        assert_eq!(paddle.x(), 395.0);

        paddle.command(100.0);
        paddle.update(&ctx(), &mut Vec::new());
        assert_eq!(paddle.x(), 387.0);

        // Keyboard paddles ignore commands
        let mut manual = Paddle::new(Vec2::new(400.0, 550.0));
        manual.command(100.0);
        assert_eq!(manual.last_command, None);
    }

    #[test]
    fn test_brick_break_happens_once() {
        let mut brick = Brick::new(Vec2::new(100.0, 100.0), 2, colors::BRICK_HARD);
        assert_eq!(brick.take_hit(BrokenBrick::Fling), HitOutcome::Damaged);
        assert_eq!(brick.take_hit(BrokenBrick::Fling), HitOutcome::Broken);
        assert!(brick.is_flying());
        assert!(!brick.meta.destroyed);
        assert_eq!(brick.take_hit(BrokenBrick::Fling), HitOutcome::Ignored);
        assert_eq!(brick.hits_remaining, 0);
        assert_eq!(brick.strength, 2);

        let mut vanishing = Brick::new(Vec2::new(100.0, 100.0), 1, colors::BRICK_SOFT);
        assert_eq!(vanishing.take_hit(BrokenBrick::Vanish), HitOutcome::Broken);
        assert!(vanishing.meta.destroyed);
        assert!(!vanishing.is_flying());
        assert_eq!(vanishing.take_hit(BrokenBrick::Vanish), HitOutcome::Ignored);
    }

    #[test]
    fn test_flung_brick_leaves_left_edge() {
        let mut brick = Brick::new(Vec2::new(10.0, 100.0), 1, colors::BRICK_SOFT);
        brick.take_hit(BrokenBrick::Fling);
        brick.update(&ctx(), &mut Vec::new());
        assert_eq!(brick.x(), 6.0);
        assert_eq!(brick.rotation, BRICK_FLING_SPIN);
        assert!(!brick.meta.destroyed);
        brick.update(&ctx(), &mut Vec::new());
        brick.update(&ctx(), &mut Vec::new());
        assert!(brick.meta.destroyed);
    }

    #[test]
    fn test_drifting_brick_wraps() {
        let mut ctx = ctx();
        ctx.brick_drift = 1.0;
        let mut stage_one = Brick::new(Vec2::new(31.0, 100.0), 1, colors::BRICK_SOFT);
        stage_one.update(&ctx, &mut Vec::new());
        assert_eq!(stage_one.x(), 31.0);

        let mut stage_two = Brick::new(Vec2::new(30.5, 100.0), 1, colors::BRICK_SOFT).in_stage(2);
        stage_two.update(&ctx, &mut Vec::new());
        assert_eq!(stage_two.x(), WINDOW_WIDTH - 0.5);
        assert!(!stage_two.meta.destroyed);
    }

    #[test]
    fn test_bullet_leaves_top() {
        let mut bullet = Bullet::new(Vec2::new(100.0, 15.0));
        bullet.update(&ctx(), &mut Vec::new());
        assert!(!bullet.meta.destroyed);
        bullet.update(&ctx(), &mut Vec::new());
        assert!(bullet.meta.destroyed);
    }

    #[test]
    fn test_life_indicator_slots() {
        let first = LifeIndicator::slot(0);
        let second = LifeIndicator::slot(1);
        assert_eq!(first, Vec2::new(LIFE_ROW_X, LIFE_ROW_Y));
        assert_eq!(second.x - first.x, 12.0);
        assert!(LifeIndicator::new(first).meta.skip_update);
    }

    #[test]
    fn test_phase_liveness() {
        assert!(GamePhase::InProgress.is_live());
        assert!(GamePhase::NewLife.is_live());
        assert!(GamePhase::Transit.is_live());
        assert!(!GamePhase::Paused.is_live());
        assert!(!GamePhase::GameOver.is_live());
    }

    proptest! {
        #[test]
        fn test_free_ball_integration_is_exact(
            x in 50.0f32..750.0,
            y in 50.0f32..550.0,
            vx in -8.0f32..8.0,
            vy in -8.0f32..8.0,
        ) {
            let mut ball = Ball::new(Vec2::new(x, y), Vec2::new(vx, vy));
            ball.update(&ctx(), &mut Vec::new());
            prop_assert_eq!(ball.position(), Vec2::new(x, y) + Vec2::new(vx, vy));
        }

        #[test]
        fn test_brick_counter_never_underflows(hits in 1u32..5, strikes in 0usize..12) {
            let mut brick = Brick::new(Vec2::new(100.0, 100.0), hits, colors::BRICK_SOFT);
            let broken = (0..strikes)
                .filter(|_| brick.take_hit(BrokenBrick::Fling) == HitOutcome::Broken)
                .count();
            prop_assert_eq!(brick.hits_remaining, hits.saturating_sub(strikes as u32));
            prop_assert_eq!(broken, usize::from(strikes as u32 >= hits));
        }
    }
}
