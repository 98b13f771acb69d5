//! Grounded / FallingOff / Airborne bookkeeping.

use crate::api::CollisionObserver;
use crate::entity::Entity;
use crate::types::{CollidableRef, SpatialState};

impl Entity {
    /// Switch to `next` and restart the state timer. Leaving `Grounded` drops the ground ref.
    ///
    /// Re-entering the current state still restarts the timer, so a fresh landing
    /// always counts from zero.
    pub fn enter_spatial_state(&mut self, next: SpatialState, observer: Option<&mut dyn CollisionObserver>) {
        let prev = self.spatial_state;
        self.spatial_state = next;
        self.spatial_state_timer = 0.0;
        if next != SpatialState::Grounded {
            self.grounded = CollidableRef::None;
        }
        if prev != next {
            log::trace!("entity {:?}: {:?} -> {:?}", self.handle, prev, next);
            if let Some(obs) = observer {
                obs.spatial_transition(self.handle, prev, next);
            }
        }
    }

    /// Advance the state timer; `FallingOff` decays to `Airborne` after `falling_off_duration`.
    pub fn advance_spatial_timer(
        &mut self,
        dt: f32,
        falling_off_duration: f32,
        observer: &mut dyn CollisionObserver,
    ) {
        self.spatial_state_timer += dt;
        if self.spatial_state == SpatialState::FallingOff && self.spatial_state_timer >= falling_off_duration {
            self.enter_spatial_state(SpatialState::Airborne, Some(observer));
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.spatial_state == SpatialState::Grounded
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::entity::EntityTraits;
    use crate::geometry::Aab;
    use crate::observer::CollisionStats;

    fn entity() -> Entity {
        Entity::new(EntityTraits::default(), Aab::new(0.0, 0.0, 1.0, 1.0), Vec2::ZERO)
    }

    #[test]
    fn test_falling_off_decays_to_airborne() {
        let mut stats = CollisionStats::default();
        let mut e = entity();
        e.enter_spatial_state(SpatialState::Grounded, Some(&mut stats));
        e.grounded = CollidableRef::Tile { index: 3 };
        e.enter_spatial_state(SpatialState::FallingOff, Some(&mut stats));
        assert!(e.grounded.is_none());

        for _ in 0..4 {
            e.advance_spatial_timer(1.0, 5.0, &mut stats);
            assert_eq!(e.spatial_state, SpatialState::FallingOff);
        }
        e.advance_spatial_timer(1.0, 5.0, &mut stats);
        assert_eq!(e.spatial_state, SpatialState::Airborne);
        assert_eq!(e.spatial_state_timer, 0.0);
        assert_eq!(stats.transitions, 3);
    }

    #[test]
    fn test_reentering_grounded_resets_timer_without_event() {
        let mut stats = CollisionStats::default();
        let mut e = entity();
        e.enter_spatial_state(SpatialState::Grounded, Some(&mut stats));
        e.advance_spatial_timer(2.5, 5.0, &mut stats);
        assert_eq!(e.spatial_state_timer, 2.5);
        e.enter_spatial_state(SpatialState::Grounded, Some(&mut stats));
        assert_eq!(e.spatial_state_timer, 0.0);
        assert_eq!(stats.transitions, 1);
    }
}
