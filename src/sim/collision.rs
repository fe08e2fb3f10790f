//! Collision detection and response
//!
//! Every pair test is an AABB overlap first; nothing happens without contact.
//! Ball vs brick resolves along a single axis chosen by penetration depth,
//! the shallower side wins and the horizontal axis takes ties.

use super::bounds::{Bounds, intersects};
use super::entity::GameEvent;
use super::manager::Manager;
use super::state::{Ball, Brick, Bullet, HitOutcome, Paddle};
use crate::settings::BrokenBrick;

/// Axis a ball was deflected along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Result of a ball/bullet striking a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrickStrike {
    /// Axis the ball bounced along (`None` for bullets)
    pub axis: Option<Axis>,
    pub outcome: HitOutcome,
    /// Score awarded by this strike
    pub points: u32,
}

impl BrickStrike {
    fn new(brick: &Brick, axis: Option<Axis>, outcome: HitOutcome) -> Self {
        let points = if outcome == HitOutcome::Broken {
            brick.strength
        } else {
            0
        };
        Self {
            axis,
            outcome,
            points,
        }
    }

    pub fn broken(&self) -> bool {
        self.outcome == HitOutcome::Broken
    }
}

/// Send the ball up, and left or right by which half of the paddle it hit
pub fn resolve_ball_paddle(ball: &mut Ball, paddle: &Paddle) -> bool {
    if ball.is_resting() || !intersects(ball, paddle) {
        return false;
    }
    ball.velocity.y = -ball.velocity.y.abs();
    ball.velocity.x = if ball.x() < paddle.x() {
        -ball.velocity.x.abs()
    } else {
        ball.velocity.x.abs()
    };
    true
}

/// Axis of least penetration between `ball` and `brick`
pub fn penetration_axis(ball: &impl Bounds, brick: &impl Bounds) -> Axis {
    let overlap_left = ball.right() - brick.left();
    let overlap_right = brick.right() - ball.left();
    let overlap_top = ball.bottom() - brick.top();
    let overlap_bottom = brick.bottom() - ball.top();

    let min_x = overlap_left.abs().min(overlap_right.abs());
    let min_y = overlap_top.abs().min(overlap_bottom.abs());

    if min_x <= min_y {
        Axis::Horizontal
    } else {
        Axis::Vertical
    }
}

/// Bounce the ball off an intact brick and take one hit from it.
///
/// Flung and already broken bricks are not solid.
pub fn resolve_ball_brick(ball: &mut Ball, brick: &mut Brick, rule: BrokenBrick) -> Option<BrickStrike> {
    if brick.is_flying() || !brick.is_intact() || !intersects(ball, brick) {
        return None;
    }

    let axis = penetration_axis(ball, brick);
    match axis {
        Axis::Horizontal => ball.velocity.x = -ball.velocity.x,
        Axis::Vertical => ball.velocity.y = -ball.velocity.y,
    }

    let outcome = brick.take_hit(rule);
    Some(BrickStrike::new(brick, Some(axis), outcome))
}

/// A bullet is spent on any brick it touches
pub fn resolve_bullet_brick(bullet: &mut Bullet, brick: &mut Brick, rule: BrokenBrick) -> Option<BrickStrike> {
    if !intersects(bullet, brick) {
        return None;
    }
    bullet.strike();
    let outcome = brick.take_hit(rule);
    Some(BrickStrike::new(brick, None, outcome))
}

/// Run every collision pass over the registry.
///
/// Returns the score earned this frame.
pub fn resolve_all(manager: &mut Manager, rule: BrokenBrick, events: &mut Vec<GameEvent>) -> u64 {
    let mut points = 0u64;

    manager.for_each_pair::<Ball, Paddle>(|ball, paddle| {
        if resolve_ball_paddle(ball, paddle) {
            events.push(GameEvent::PaddleBounce);
        }
    });

    let mut record = |strike: BrickStrike, events: &mut Vec<GameEvent>| {
        points += u64::from(strike.points);
        if strike.outcome != HitOutcome::Ignored {
            events.push(GameEvent::BrickHit {
                broken: strike.broken(),
            });
        }
    };

    manager.for_each_pair::<Ball, Brick>(|ball, brick| {
        if let Some(strike) = resolve_ball_brick(ball, brick, rule) {
            record(strike, events);
        }
    });

    manager.for_each_pair::<Bullet, Brick>(|bullet, brick| {
        if let Some(strike) = resolve_bullet_brick(bullet, brick, rule) {
            record(strike, events);
        }
    });

    points
}
