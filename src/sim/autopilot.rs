//! Paddle-position prediction
//!
//! The ball always travels on a 45 degree line, so its path is `y = x + c`
//! when moving right and `y = -x + c` when moving left. Solving for `c` at the
//! current position gives the x where that line crosses the paddle's row.
//! Bounces between now and arrival are ignored: the answer is only right for
//! the final downward leg.

use glam::Vec2;

use crate::consts::AUTOPILOT_NUDGE;

/// Where the paddle should go to meet the ball on row `intercept_y`.
///
/// `None` while the ball rises, moves straight down, or would cross the row
/// outside `0..arena_width`.
pub fn predict_intercept(
    position: Vec2,
    velocity: Vec2,
    intercept_y: f32,
    arena_width: f32,
) -> Option<f32> {
    if velocity.y <= 0.0 || velocity.x == 0.0 {
        return None;
    }

    let (intercept_x, target) = if velocity.x > 0.0 {
        let c = position.y - position.x;
        let x = intercept_y - c;
        (x, x - AUTOPILOT_NUDGE)
    } else {
        let c = position.y + position.x;
        let x = c - intercept_y;
        (x, x + AUTOPILOT_NUDGE)
    };

    (intercept_x > 0.0 && intercept_x < arena_width).then_some(target)
}

/// Snapshot handed to the autopilot task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutopilotQuery {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Paddle row
    pub intercept_y: f32,
    pub arena_width: f32,
}

impl AutopilotQuery {
    pub fn predict(&self) -> Option<f32> {
        predict_intercept(self.position, self.velocity, self.intercept_y, self.arena_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_intercept_moving_right() {
        // c = 300 - 400 = -100, crosses y=550 at x=650
        let target = predict_intercept(Vec2::new(400.0, 300.0), Vec2::new(4.0, 4.0), 550.0, 800.0);
        assert_eq!(target, Some(645.0));
    }

    #[test]
    fn test_intercept_moving_left() {
        // c = 300 + 400 = 700, crosses y=550 at x=150
        let target =
            predict_intercept(Vec2::new(400.0, 300.0), Vec2::new(-4.0, 4.0), 550.0, 800.0);
        assert_eq!(target, Some(155.0));
    }

    #[test]
    fn test_no_prediction_while_rising_or_vertical() {
        let pos = Vec2::new(400.0, 300.0);
        assert_eq!(predict_intercept(pos, Vec2::new(4.0, -4.0), 550.0, 800.0), None);
        assert_eq!(predict_intercept(pos, Vec2::new(0.0, 4.0), 550.0, 800.0), None);
    }

    #[test]
    fn test_no_prediction_outside_window() {
        // c = 100 - 700 = -600, crosses at x=1150
        let target = predict_intercept(Vec2::new(700.0, 100.0), Vec2::new(4.0, 4.0), 550.0, 800.0);
        assert_eq!(target, None);
    }

    proptest! {
        #[test]
        fn test_prediction_lies_on_trajectory(
            x in 0.0f32..800.0,
            y in 0.0f32..550.0,
            right in any::<bool>(),
        ) {
            let vx = if right { 4.0 } else { -4.0 };
            if let Some(target) = predict_intercept(Vec2::new(x, y), Vec2::new(vx, 4.0), 550.0, 800.0) {
                let crossing = if right { target + AUTOPILOT_NUDGE } else { target - AUTOPILOT_NUDGE };
                let frames = (550.0 - y) / 4.0;
                prop_assert!((x + vx * frames - crossing).abs() < 1e-2);
                prop_assert!(crossing > 0.0 && crossing < 800.0);
            }
        }
    }
}
