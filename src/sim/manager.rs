//! Entity registry
//!
//! One primary store in insertion order (which is also draw order) plus a
//! per-variant group of indices into it. Destruction is a flag; `refresh()`
//! sweeps flagged entities out of both. Every compaction that removes
//! something bumps the registry epoch, so a `Handle` taken before it is
//! rejected instead of aliasing whatever slid into its slot.

use std::fmt;
use std::marker::PhantomData;

use glam::Vec2;

use super::autopilot::AutopilotQuery;
use super::entity::{Entity, EntityBody, EntityKind, GameEvent, UpdateContext, Variant};
use super::state::{Ball, LifeIndicator, Paddle};
use crate::error::{GameError, Result};
use crate::renderer::RenderTarget;
use crate::settings::BottomEdge;

/// Non-owning typed reference into the registry
pub struct Handle<T> {
    index: usize,
    epoch: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.epoch == other.epoch
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("epoch", &self.epoch)
            .finish()
    }
}

/// Owns every game object
#[derive(Debug, Clone, Default)]
pub struct Manager {
    entities: Vec<EntityBody>,
    groups: [Vec<usize>; EntityKind::COUNT],
    epoch: u64,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Entities in the primary store, including ones awaiting `refresh()`
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Take ownership of `entity` and register it in its group
    pub fn create<T: Variant>(&mut self, entity: T) -> Handle<T> {
        let index = self.entities.len();
        self.entities.push(entity.wrap());
        self.groups[T::KIND.index()].push(index);
        Handle {
            index,
            epoch: self.epoch,
            _marker: PhantomData,
        }
    }

    fn check_handle<T: Variant>(&self, handle: Handle<T>) -> Result<()> {
        if handle.epoch == self.epoch {
            Ok(())
        } else {
            Err(GameError::StaleHandle {
                kind: T::KIND,
                handle_epoch: handle.epoch,
                current_epoch: self.epoch,
            })
        }
    }

    pub fn get<T: Variant>(&self, handle: Handle<T>) -> Result<&T> {
        self.check_handle(handle)?;
        self.entities
            .get(handle.index)
            .and_then(T::peek)
            .ok_or_else(|| {
                GameError::InvariantViolation(format!(
                    "handle slot {} does not hold a {:?}",
                    handle.index,
                    T::KIND
                ))
            })
    }

    pub fn get_mut<T: Variant>(&mut self, handle: Handle<T>) -> Result<&mut T> {
        self.check_handle(handle)?;
        self.entities
            .get_mut(handle.index)
            .and_then(T::peek_mut)
            .ok_or_else(|| {
                GameError::InvariantViolation(format!(
                    "handle slot {} does not hold a {:?}",
                    handle.index,
                    T::KIND
                ))
            })
    }

    /// Visit every live `T` in insertion order.
    ///
    /// The group is fixed at call time; an entity destroyed by an earlier
    /// visit is skipped.
    pub fn for_each<T: Variant>(&mut self, mut visitor: impl FnMut(&mut T)) {
        let group = &self.groups[T::KIND.index()];
        for &index in group {
            match self.entities.get_mut(index).and_then(T::peek_mut) {
                Some(entity) if !entity.is_destroyed() => visitor(entity),
                _ => {}
            }
        }
    }

    /// Visit every live `(A, B)` pair; both are mutable
    pub fn for_each_pair<A: Variant, B: Variant>(&mut self, mut visitor: impl FnMut(&mut A, &mut B)) {
        if A::KIND == B::KIND {
            return;
        }
        let Self {
            entities, groups, ..
        } = self;
        for &a in &groups[A::KIND.index()] {
            for &b in &groups[B::KIND.index()] {
                let Some((left, right)) = pair_mut(entities.as_mut_slice(), a, b) else {
                    continue;
                };
                let (Some(first), Some(second)) = (A::peek_mut(left), B::peek_mut(right)) else {
                    continue;
                };
                if first.is_destroyed() {
                    break;
                }
                if !second.is_destroyed() {
                    visitor(first, second);
                }
            }
        }
    }

    /// The whole group view, destroyed-but-unswept entries included
    pub fn get_all<T: Variant>(&self) -> Vec<&T> {
        self.groups[T::KIND.index()]
            .iter()
            .filter_map(|&index| self.entities.get(index).and_then(T::peek))
            .collect()
    }

    /// Live entities of one variant
    pub fn iter<T: Variant>(&self) -> impl Iterator<Item = &T> + '_ {
        self.groups[T::KIND.index()]
            .iter()
            .filter_map(|&index| self.entities.get(index).and_then(T::peek))
            .filter(|entity| !entity.is_destroyed())
    }

    /// Number of live entities of one variant
    pub fn count<T: Variant>(&self) -> usize {
        self.iter::<T>().count()
    }

    /// Size of a group view, destroyed-but-unswept entries included
    pub fn group_len(&self, kind: EntityKind) -> usize {
        self.groups[kind.index()].len()
    }

    /// First live entity of a variant
    pub fn single<T: Variant>(&self) -> Result<&T> {
        self.iter::<T>()
            .next()
            .ok_or(GameError::EmptyQuery { kind: T::KIND })
    }

    pub fn single_mut<T: Variant>(&mut self) -> Result<&mut T> {
        let group = &self.groups[T::KIND.index()];
        for &index in group {
            let live = self
                .entities
                .get(index)
                .and_then(T::peek)
                .is_some_and(|entity| !entity.is_destroyed());
            if live {
                return self
                    .entities
                    .get_mut(index)
                    .and_then(T::peek_mut)
                    .ok_or(GameError::EmptyQuery { kind: T::KIND });
            }
        }
        Err(GameError::EmptyQuery { kind: T::KIND })
    }

    /// Sweep destroyed entities out of the store and every group.
    ///
    /// Returns how many were removed.
    pub fn refresh(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|entity| !entity.is_destroyed());
        let removed = before - self.entities.len();
        if removed == 0 {
            return 0;
        }

        for group in &mut self.groups {
            group.clear();
        }
        for (index, entity) in self.entities.iter().enumerate() {
            self.groups[entity.kind().index()].push(index);
        }
        self.epoch += 1;
        log::trace!("Refresh removed {} entities (epoch {})", removed, self.epoch);
        removed
    }

    /// Drop everything; all outstanding handles go stale
    pub fn clear(&mut self) {
        self.entities.clear();
        for group in &mut self.groups {
            group.clear();
        }
        self.epoch += 1;
    }

    /// Advance every live, non-parked entity one frame
    pub fn update(&mut self, ctx: &UpdateContext, events: &mut Vec<GameEvent>) {
        for entity in &mut self.entities {
            let meta = entity.meta();
            if meta.destroyed || meta.skip_update {
                continue;
            }
            entity.update(ctx, events);
        }
    }

    /// Draw live entities in insertion order
    pub fn draw(&self, target: &mut dyn RenderTarget) {
        for entity in self.entities.iter().filter(|e| !e.is_destroyed()) {
            entity.draw(target);
        }
    }

    /// True only when there is exactly one ball and it has left the window.
    ///
    /// Never true under `BottomEdge::Bounce`: the ball reflects off the
    /// bottom edge like any other wall.
    pub fn check_ball_dropped(&self, arena: Vec2, bottom_edge: BottomEdge) -> bool {
        if bottom_edge == BottomEdge::Bounce {
            return false;
        }
        match self.get_all::<Ball>().as_slice() {
            [ball] => ball.has_died(arena),
            _ => false,
        }
    }

    /// Destroy the ball and the right-most live life indicator.
    ///
    /// Returns whether an indicator was taken.
    pub fn handle_ball_drop(&mut self) -> bool {
        if let Ok(ball) = self.single_mut::<Ball>() {
            ball.meta.destroy();
        }

        let group = &self.groups[EntityKind::LifeIndicator.index()];
        for &index in group.iter().rev() {
            match self.entities.get_mut(index).and_then(LifeIndicator::peek_mut) {
                Some(life) if !life.meta.destroyed => {
                    life.meta.destroy();
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Ball and paddle snapshot for the paddle-position predictor
    pub fn autopilot_query(&self, arena: Vec2) -> Result<AutopilotQuery> {
        let ball = self.single::<Ball>()?;
        let paddle = self.single::<Paddle>()?;
        Ok(AutopilotQuery {
            position: ball.position(),
            velocity: ball.velocity,
            intercept_y: paddle.y(),
            arena_width: arena.x,
        })
    }

    /// Predicted paddle position for the current ball, if any
    pub fn autopilot_target(&self, arena: Vec2) -> Result<Option<f32>> {
        Ok(self.autopilot_query(arena)?.predict())
    }

    /// Hand a commanded x position to the paddle
    pub fn steer_paddle(&mut self, x: f32) -> Result<()> {
        self.single_mut::<Paddle>()?.command(x);
        Ok(())
    }

    /// Every group entry points at its own variant and every entity is in
    /// exactly one group
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = vec![false; self.entities.len()];
        for kind in EntityKind::ALL {
            for &index in &self.groups[kind.index()] {
                let entity = self.entities.get(index).ok_or_else(|| {
                    GameError::InvariantViolation(format!(
                        "{kind:?} group points past the store ({index})"
                    ))
                })?;
                if entity.kind() != kind {
                    return Err(GameError::InvariantViolation(format!(
                        "{kind:?} group holds a {:?} at {index}",
                        entity.kind()
                    )));
                }
                if std::mem::replace(&mut seen[index], true) {
                    return Err(GameError::InvariantViolation(format!(
                        "entity {index} listed twice"
                    )));
                }
            }
        }
        match seen.iter().position(|listed| !listed) {
            Some(index) => Err(GameError::InvariantViolation(format!(
                "entity {index} is in no group"
            ))),
            None => Ok(()),
        }
    }
}

/// Two distinct mutable slots of one slice
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a >= items.len() || b >= items.len() {
        return None;
    }
    if a < b {
        let (head, tail) = items.split_at_mut(b);
        Some((&mut head[a], &mut tail[0]))
    } else {
        let (head, tail) = items.split_at_mut(a);
        Some((&mut tail[0], &mut head[b]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::KeySnapshot;
    use crate::renderer::{RecordingSurface, colors};
    use crate::settings::Rules;
    use crate::sim::state::{Brick, Bullet};
    use proptest::prelude::*;

    fn with_lives(count: u32) -> Manager {
        let mut manager = Manager::new();
        for i in 0..count {
            manager.create(LifeIndicator::new(LifeIndicator::slot(i)));
        }
        manager
    }

    #[test]
    fn test_create_and_get() {
        let mut manager = Manager::new();
        let ball = manager.create(Ball::new(Vec2::new(10.0, 10.0), Vec2::ONE));
        let paddle = manager.create(Paddle::new(Vec2::new(400.0, 550.0)));
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.get(ball).unwrap().x(), 10.0);
        manager.get_mut(paddle).unwrap().velocity.x = 3.0;
        assert_eq!(manager.single::<Paddle>().unwrap().velocity.x, 3.0);
        manager.check_invariants().unwrap();
    }

    #[test]
    fn test_single_on_empty_group_is_empty_query() {
        let mut manager = Manager::new();
        let err = manager.single::<Ball>().unwrap_err();
        assert!(matches!(err, GameError::EmptyQuery { kind: EntityKind::Ball }));
        assert!(manager.single_mut::<Paddle>().is_err());
        assert!(manager.autopilot_target(crate::window_size()).is_err());
        assert!(manager.steer_paddle(100.0).is_err());
    }

    #[test]
    fn test_single_skips_destroyed() {
        let mut manager = Manager::new();
        manager.create(Brick::new(Vec2::new(10.0, 10.0), 1, colors::BRICK_SOFT));
        manager.create(Brick::new(Vec2::new(90.0, 10.0), 1, colors::BRICK_SOFT));
        manager.single_mut::<Brick>().unwrap().meta.destroy();
        assert_eq!(manager.single::<Brick>().unwrap().x(), 90.0);
        assert_eq!(manager.get_all::<Brick>().len(), 2);
        assert_eq!(manager.count::<Brick>(), 1);
    }

    #[test]
    fn test_stale_handle_detected_after_refresh() {
        let mut manager = Manager::new();
        let first = manager.create(Bullet::new(Vec2::new(1.0, 100.0)));
        let second = manager.create(Bullet::new(Vec2::new(2.0, 100.0)));
        manager.get_mut(first).unwrap().meta.destroy();
        assert_eq!(manager.refresh(), 1);

        let err = manager.get(second).unwrap_err();
        assert!(matches!(err, GameError::StaleHandle { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_refresh_without_removal_keeps_handles() {
        let mut manager = Manager::new();
        let ball = manager.create(Ball::new(Vec2::new(1.0, 1.0), Vec2::ONE));
        assert_eq!(manager.refresh(), 0);
        assert!(manager.get(ball).is_ok());

        manager.clear();
        assert!(manager.is_empty());
        assert!(manager.get(ball).is_err());
    }

    #[test]
    fn test_for_each_visits_live_in_order() {
        let mut manager = Manager::new();
        for x in [10.0, 20.0, 30.0] {
            manager.create(Bullet::new(Vec2::new(x, 100.0)));
        }
        manager.create(Ball::new(Vec2::ZERO, Vec2::ONE));
        manager.for_each::<Bullet>(|bullet| {
            if bullet.shape.x() == 20.0 {
                bullet.meta.destroy();
            }
        });

        let mut seen = Vec::new();
        manager.for_each::<Bullet>(|bullet| seen.push(bullet.shape.x()));
        assert_eq!(seen, vec![10.0, 30.0]);
    }

    #[test]
    fn test_for_each_pair_skips_destroyed() {
        let mut manager = Manager::new();
        manager.create(Bullet::new(Vec2::new(10.0, 100.0)));
        manager.create(Brick::new(Vec2::new(10.0, 100.0), 1, colors::BRICK_SOFT));
        manager.create(Brick::new(Vec2::new(10.0, 100.0), 1, colors::BRICK_SOFT));

        let mut visits = 0;
        manager.for_each_pair::<Bullet, Brick>(|bullet, brick| {
            visits += 1;
            bullet.strike();
            brick.hits_remaining = 0;
        });
        // Bullet spent on the first brick
        assert_eq!(visits, 1);
    }

    #[test]
    fn test_update_skips_parked_and_destroyed() {
        let mut manager = with_lives(1);
        let bullet = manager.create(Bullet::new(Vec2::new(100.0, 100.0)));
        let dead = manager.create(Bullet::new(Vec2::new(200.0, 100.0)));
        manager.get_mut(dead).unwrap().meta.destroy();

        let ctx = UpdateContext::new(KeySnapshot::new(), Rules::extended());
        manager.update(&ctx, &mut Vec::new());
        assert_eq!(manager.get(bullet).unwrap().shape.y(), 90.0);
        assert_eq!(manager.get(dead).unwrap().shape.y(), 100.0);
        assert_eq!(
            manager.single::<LifeIndicator>().unwrap().shape.center,
            LifeIndicator::slot(0)
        );
    }

    #[test]
    fn test_draw_in_insertion_order() {
        let mut manager = Manager::new();
        manager.create(Paddle::new(Vec2::new(400.0, 550.0)));
        manager.create(Ball::new(Vec2::new(400.0, 300.0), Vec2::ONE));
        let mut surface = RecordingSurface::new();
        surface.clear(colors::BACKGROUND);
        manager.draw(&mut surface);
        surface.display();
        let fills: Vec<_> = surface.last_frame().shapes.iter().map(|s| s.fill()).collect();
        assert_eq!(fills, vec![colors::PADDLE, colors::BALL]);
    }

    #[test]
    fn test_ball_drop_takes_lives_right_to_left() {
        let mut manager = with_lives(3);
        for expected_left in [2, 1, 0] {
            assert!(manager.handle_ball_drop());
            assert_eq!(manager.count::<LifeIndicator>(), expected_left);
        }
        let remaining: Vec<_> = manager
            .get_all::<LifeIndicator>()
            .iter()
            .map(|life| life.meta.destroyed)
            .collect();
        assert_eq!(remaining, vec![true, true, true]);

        // Fourth call is a no-op
        assert!(!manager.handle_ball_drop());
        assert_eq!(manager.group_len(EntityKind::LifeIndicator), 3);
    }

    #[test]
    fn test_ball_drop_destroys_ball() {
        let mut manager = with_lives(2);
        manager.create(Ball::new(Vec2::new(400.0, 610.0), Vec2::ONE));
        assert!(manager.check_ball_dropped(crate::window_size(), BottomEdge::Drop));
        assert!(manager.handle_ball_drop());
        assert_eq!(manager.count::<Ball>(), 0);
        assert_eq!(manager.count::<LifeIndicator>(), 1);
    }

    #[test]
    fn test_check_ball_dropped_needs_exactly_one_ball() {
        let arena = crate::window_size();
        let mut manager = Manager::new();
        assert!(!manager.check_ball_dropped(arena, BottomEdge::Drop));

        manager.create(Ball::new(Vec2::new(400.0, 300.0), Vec2::ONE));
        assert!(!manager.check_ball_dropped(arena, BottomEdge::Drop));

        manager.create(Ball::new(Vec2::new(400.0, 700.0), Vec2::ONE));
        assert!(!manager.check_ball_dropped(arena, BottomEdge::Drop));
    }

    #[test]
    fn test_bounce_rule_never_drops_ball() {
        let mut manager = Manager::new();
        manager.create(Ball::new(Vec2::new(400.0, 610.0), Vec2::ONE));
        let arena = crate::window_size();
        assert!(manager.check_ball_dropped(arena, BottomEdge::Drop));
        assert!(!manager.check_ball_dropped(arena, BottomEdge::Bounce));
    }

    #[test]
    fn test_autopilot_target_steers_paddle() {
        let mut manager = Manager::new();
        manager.create(Ball::new(Vec2::new(400.0, 300.0), Vec2::new(4.0, 4.0)));
        manager.create(Paddle::new(Vec2::new(400.0, 550.0)).autopiloted());

        let target = manager.autopilot_target(crate::window_size()).unwrap();
        assert_eq!(target, Some(645.0));
        manager.steer_paddle(645.0).unwrap();
        assert_eq!(manager.single::<Paddle>().unwrap().last_command, Some(645.0));
    }

    #[test]
    fn test_pair_mut_rejects_same_slot() {
        let mut items = [1, 2, 3];
        assert!(pair_mut(&mut items, 1, 1).is_none());
        assert!(pair_mut(&mut items, 0, 3).is_none());
        let (a, b) = pair_mut(&mut items, 2, 0).unwrap();
        assert_eq!((*a, *b), (3, 1));
    }

    #[derive(Debug, Clone)]
    enum Spawn {
        Ball,
        Brick,
        Bullet,
        Life,
    }

    fn spawn_strategy() -> impl Strategy<Value = (Spawn, bool)> {
        (
            prop_oneof![
                Just(Spawn::Ball),
                Just(Spawn::Brick),
                Just(Spawn::Bullet),
                Just(Spawn::Life),
            ],
            any::<bool>(),
        )
    }

    fn add<T: Variant>(manager: &mut Manager, mut entity: T, destroyed: bool) {
        entity.meta_mut().destroyed = destroyed;
        manager.create(entity);
    }

    fn populate(spawns: &[(Spawn, bool)]) -> Manager {
        let mut manager = Manager::new();
        for (i, (spawn, destroyed)) in spawns.iter().enumerate() {
            let pos = Vec2::new(i as f32, 100.0);
            match spawn {
                Spawn::Ball => add(&mut manager, Ball::new(pos, Vec2::ONE), *destroyed),
                Spawn::Brick => add(
                    &mut manager,
                    Brick::new(pos, 1, colors::BRICK_SOFT),
                    *destroyed,
                ),
                Spawn::Bullet => add(&mut manager, Bullet::new(pos), *destroyed),
                Spawn::Life => add(&mut manager, LifeIndicator::new(pos), *destroyed),
            }
        }
        manager
    }

    proptest! {
        #[test]
        fn test_refresh_is_idempotent(spawns in prop::collection::vec(spawn_strategy(), 0..40)) {
            let mut manager = populate(&spawns);
            manager.refresh();
            let epoch = manager.epoch();
            let xs: Vec<f32> = manager.get_all::<Bullet>().iter().map(|b| b.shape.x()).collect();

            prop_assert_eq!(manager.refresh(), 0);
            prop_assert_eq!(manager.epoch(), epoch);
            let again: Vec<f32> = manager.get_all::<Bullet>().iter().map(|b| b.shape.x()).collect();
            prop_assert_eq!(xs, again);
        }

        #[test]
        fn test_groups_match_store_after_refresh(spawns in prop::collection::vec(spawn_strategy(), 0..40)) {
            let mut manager = populate(&spawns);
            manager.check_invariants().unwrap();
            let live = spawns.iter().filter(|(_, destroyed)| !destroyed).count();

            manager.refresh();
            manager.check_invariants().unwrap();
            prop_assert_eq!(manager.len(), live);
            let grouped: usize = EntityKind::ALL.iter().map(|&k| manager.group_len(k)).sum();
            prop_assert_eq!(grouped, live);
            prop_assert_eq!(manager.group_len(EntityKind::Ball), manager.count::<Ball>());
            prop_assert_eq!(manager.group_len(EntityKind::Brick), manager.count::<Brick>());
        }
    }
}
