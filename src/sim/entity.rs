//! Entity capability and the closed set of game-object variants
//!
//! Every game object embeds an `EntityMeta` and implements `Entity`. The
//! registry stores objects as `EntityBody`, a closed enum, and hands out typed
//! access through `Variant`, so no runtime type identity or downcasting is
//! involved.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Ball, Brick, Bullet, LifeIndicator, Paddle};
use crate::platform::KeySnapshot;
use crate::renderer::RenderTarget;
use crate::settings::Rules;

/// Variant tag, one per game-object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Ball,
    Paddle,
    Brick,
    Bullet,
    LifeIndicator,
}

impl EntityKind {
    pub const COUNT: usize = 5;

    pub const ALL: [EntityKind; Self::COUNT] = [
        EntityKind::Ball,
        EntityKind::Paddle,
        EntityKind::Brick,
        EntityKind::Bullet,
        EntityKind::LifeIndicator,
    ];

    /// Group slot in the registry
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Lifecycle flags shared by every game object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Marked for removal on the next `refresh()`
    pub destroyed: bool,
    /// Parked: `Manager::update` leaves this entity alone
    pub skip_update: bool,
    /// Stage the entity was created in
    pub stage: u32,
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self {
            destroyed: false,
            skip_update: false,
            stage: 1,
        }
    }
}

impl EntityMeta {
    pub fn in_stage(stage: u32) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    pub fn parked() -> Self {
        Self {
            skip_update: true,
            ..Self::default()
        }
    }

    #[inline]
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }
}

/// Things that happened during a frame (drives audio and HUD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Ball bounced off a window edge
    WallBounce,
    /// Ball bounced off the paddle
    PaddleBounce,
    /// Brick struck; `broken` when its counter reached zero
    BrickHit { broken: bool },
    BulletFired,
    BallLaunched,
    BallLost,
    StageCleared { stage: u32 },
    TimeUp,
    GameOver,
}

/// Read-only inputs for one simulation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateContext {
    /// Keys held this frame
    pub keys: KeySnapshot,
    /// Window size
    pub arena: Vec2,
    pub rules: Rules,
    /// Current stage number (1-based)
    pub stage: u32,
    /// Horizontal drift of intact bricks from stage 2 on (px/frame)
    pub brick_drift: f32,
}

impl UpdateContext {
    pub fn new(keys: KeySnapshot, rules: Rules) -> Self {
        Self {
            keys,
            arena: crate::window_size(),
            rules,
            stage: 1,
            brick_drift: 0.0,
        }
    }
}

/// Capability implemented by every game object
pub trait Entity {
    fn meta(&self) -> &EntityMeta;
    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Advance one frame
    fn update(&mut self, ctx: &UpdateContext, events: &mut Vec<GameEvent>);

    /// Whether the object has left play (e.g. ball below the window)
    fn has_died(&self, arena: Vec2) -> bool;

    /// Submit draw calls
    fn draw(&self, target: &mut dyn RenderTarget);

    fn is_destroyed(&self) -> bool {
        self.meta().destroyed
    }
}

/// Registry storage: one closed enum over all variants
#[derive(Debug, Clone)]
pub enum EntityBody {
    Ball(Ball),
    Paddle(Paddle),
    Brick(Brick),
    Bullet(Bullet),
    LifeIndicator(LifeIndicator),
}

macro_rules! dispatch {
    ($body:expr, $inner:ident => $call:expr) => {
        match $body {
            EntityBody::Ball($inner) => $call,
            EntityBody::Paddle($inner) => $call,
            EntityBody::Brick($inner) => $call,
            EntityBody::Bullet($inner) => $call,
            EntityBody::LifeIndicator($inner) => $call,
        }
    };
}

impl EntityBody {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityBody::Ball(_) => EntityKind::Ball,
            EntityBody::Paddle(_) => EntityKind::Paddle,
            EntityBody::Brick(_) => EntityKind::Brick,
            EntityBody::Bullet(_) => EntityKind::Bullet,
            EntityBody::LifeIndicator(_) => EntityKind::LifeIndicator,
        }
    }
}

impl Entity for EntityBody {
    fn meta(&self) -> &EntityMeta {
        dispatch!(self, e => e.meta())
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        dispatch!(self, e => e.meta_mut())
    }

    fn update(&mut self, ctx: &UpdateContext, events: &mut Vec<GameEvent>) {
        dispatch!(self, e => e.update(ctx, events))
    }

    fn has_died(&self, arena: Vec2) -> bool {
        dispatch!(self, e => e.has_died(arena))
    }

    fn draw(&self, target: &mut dyn RenderTarget) {
        dispatch!(self, e => e.draw(target))
    }
}

/// Typed view into `EntityBody`
pub trait Variant: Entity + Sized + 'static {
    const KIND: EntityKind;

    fn wrap(self) -> EntityBody;
    fn peek(body: &EntityBody) -> Option<&Self>;
    fn peek_mut(body: &mut EntityBody) -> Option<&mut Self>;
}

macro_rules! variant {
    ($ty:ident) => {
        impl Variant for $ty {
            const KIND: EntityKind = EntityKind::$ty;

            fn wrap(self) -> EntityBody {
                EntityBody::$ty(self)
            }

            fn peek(body: &EntityBody) -> Option<&Self> {
                match body {
                    EntityBody::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn peek_mut(body: &mut EntityBody) -> Option<&mut Self> {
                match body {
                    EntityBody::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

variant!(Ball);
variant!(Paddle);
variant!(Brick);
variant!(Bullet);
variant!(LifeIndicator);
