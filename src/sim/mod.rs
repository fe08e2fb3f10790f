//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Fixed frame step only
//! - Stable iteration order (insertion order in the registry)
//! - No windowing, audio or thread dependencies; collaborators are traits

pub mod autopilot;
pub mod bounds;
pub mod collision;
pub mod entity;
pub mod manager;
pub mod state;
pub mod tick;

pub use autopilot::{AutopilotQuery, predict_intercept};
pub use bounds::{Bounds, Circle, Rect, intersects};
pub use collision::{
    Axis, BrickStrike, resolve_all, resolve_ball_brick, resolve_ball_paddle, resolve_bullet_brick,
};
pub use entity::{Entity, EntityBody, EntityKind, EntityMeta, GameEvent, UpdateContext, Variant};
pub use manager::{Handle, Manager};
pub use state::{
    Ball, BallState, Brick, Bullet, GamePhase, GameStats, HitOutcome, LifeIndicator, Paddle,
    PaddleControl,
};
pub use tick::{ControlEvent, Game, InlineUpdate, TickInput, UpdateDriver};
