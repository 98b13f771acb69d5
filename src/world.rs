use std::time::Instant;

use crate::api::CollisionObserver;
use crate::broadphase::CollisionScene;
use crate::config::PhysicsConfig;
use crate::entity::{Entity, EntityArray};
use crate::error::CollisionError;
use crate::resolve::process_collidables;
use crate::tile_grid::{TileGrid, TileInfo};
use crate::types::*;

/// Tile map plus the two entity sets, stepped in the fixed dynamics-then-statics order.
pub struct PhysicsWorld {
    pub cfg: PhysicsConfig,
    pub frame_counter: u32,

    grid: TileGrid,
    tile_infos: Vec<TileInfo>,

    // Moving platforms and other bodies that others stand on. Resolved against tiles only.
    dynamics: EntityArray,
    // Everything else. Resolved against tiles and the already-moved dynamics.
    statics: EntityArray,

    last_timing: Option<WorldTiming>,
}

impl PhysicsWorld {
    /// Build a world. Entity storage is reserved here and never grows afterwards.
    pub fn new(
        cfg: PhysicsConfig,
        grid: TileGrid,
        tile_infos: Vec<TileInfo>,
        dynamic_capacity: usize,
        static_capacity: usize,
    ) -> Result<Self, CollisionError> {
        cfg.validate()?;
        grid.validate_infos(&tile_infos)?;
        Ok(Self {
            cfg,
            frame_counter: 0,
            grid,
            tile_infos,
            dynamics: EntityArray::with_capacity(dynamic_capacity),
            statics: EntityArray::with_capacity(static_capacity),
            last_timing: None,
        })
    }

    pub fn spawn_dynamic(&mut self, entity: Entity) -> Result<EntityHandle, CollisionError> {
        self.dynamics.push(entity)
    }

    pub fn spawn_static(&mut self, entity: Entity) -> Result<EntityHandle, CollisionError> {
        self.statics.push(entity)
    }

    pub fn dynamic(&self, handle: EntityHandle) -> Option<&Entity> {
        self.dynamics.get(handle)
    }

    pub fn dynamic_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.dynamics.get_mut(handle)
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        self.statics.get(handle)
    }

    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.statics.get_mut(handle)
    }

    pub fn dynamics(&self) -> &[Entity] {
        self.dynamics.as_slice()
    }

    pub fn statics(&self) -> &[Entity] {
        self.statics.as_slice()
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn tile_infos(&self) -> &[TileInfo] {
        &self.tile_infos
    }

    /// Change one tile. Ids without a `TileInfo` are rejected.
    pub fn set_tile(&mut self, x: u32, y: u32, id: u16) -> Result<(), CollisionError> {
        if id as usize >= self.tile_infos.len() {
            return Err(CollisionError::UnknownTile {
                id,
                index: self.grid.index_of(x, y),
            });
        }
        self.grid.set(x, y, id);
        Ok(())
    }

    /// Advance every live entity by `dt`.
    pub fn step(&mut self, dt: f32, observer: &mut dyn CollisionObserver) {
        self.frame_counter = self.frame_counter.wrapping_add(1);
        let t0 = self.cfg.enable_timing.then(Instant::now);

        let tiles_only = CollisionScene {
            grid: &self.grid,
            tile_infos: &self.tile_infos,
            dynamics: &[],
        };
        process_collidables(self.dynamics.as_mut_slice(), &tiles_only, true, dt, &self.cfg, observer);
        let t1 = self.cfg.enable_timing.then(Instant::now);

        let full = CollisionScene {
            grid: &self.grid,
            tile_infos: &self.tile_infos,
            dynamics: self.dynamics.as_slice(),
        };
        process_collidables(self.statics.as_mut_slice(), &full, false, dt, &self.cfg, observer);

        if let (Some(t0), Some(t1)) = (t0, t1) {
            let ms = |a: Instant, b: Instant| (b - a).as_secs_f64() * 1000.0;
            let t2 = Instant::now();
            self.last_timing = Some(WorldTiming {
                step_ms: ms(t0, t2),
                dynamic_pass_ms: ms(t0, t1),
                static_pass_ms: ms(t1, t2),
            });
        }
    }

    /// Drop dead entities from both sets. Surviving dynamics may change slot; refs to them
    /// are recovered by handle on the next step.
    pub fn remove_dead(&mut self) -> usize {
        let removed = self.dynamics.remove_dead() + self.statics.remove_dead();
        if removed > 0 {
            log::debug!("frame {}: removed {removed} dead entities", self.frame_counter);
        }
        removed
    }

    /// Return debug stats for the current world state.
    pub fn debug_stats(&self) -> WorldStats {
        let all = self.dynamics.as_slice().iter().chain(self.statics.as_slice());
        let solid_tiles = (0..self.grid.width() as usize * self.grid.height() as usize)
            .filter(|&i| self.grid.is_solid_index(i))
            .count();
        WorldStats {
            dynamics: self.dynamics.len(),
            statics: self.statics.len(),
            dead: all.filter(|e| e.dead).count(),
            solid_tiles,
        }
    }

    /// Return timing for the last `step`, when `cfg.enable_timing` is set.
    pub fn timing(&self) -> Option<WorldTiming> { self.last_timing }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::entity::EntityTraits;
    use crate::geometry::Aab;
    use crate::observer::CollisionStats;
    use approx::assert_abs_diff_eq;

    fn infos() -> Vec<TileInfo> {
        vec![TileInfo { friction: 0.0 }, TileInfo { friction: 1.0 }]
    }

    fn world(grid: TileGrid) -> PhysicsWorld {
        PhysicsWorld::new(PhysicsConfig::default(), grid, infos(), 4, 4).unwrap()
    }

    fn platform(position: Vec2, velocity: Vec2) -> Entity {
        let traits = EntityTraits {
            movement: MovementKind::Straight,
            gravity_modifier: 0.0,
            ..Default::default()
        };
        Entity::new(traits, Aab::new(0.0, 0.0, 32.0, 8.0), position).with_velocity(velocity)
    }

    fn rider() -> Entity {
        Entity::new(
            EntityTraits::default(),
            Aab::new(-5.0, 0.0, 5.0, 24.0),
            Vec2::new(16.0, 32.0 - 24.0 - SAFETY_DISTANCE),
        )
    }

    #[test]
    fn test_rider_moves_with_platform() {
        let mut w = world(TileGrid::new(16, 8));
        let p = w.spawn_dynamic(platform(Vec2::new(0.0, 32.0), Vec2::new(2.0, 0.0))).unwrap();
        let r = w.spawn_static(rider()).unwrap();
        let mut stats = CollisionStats::default();

        w.step(1.0, &mut stats);
        let e = w.entity(r).unwrap();
        assert!(e.is_grounded());
        assert!(matches!(e.grounded, CollidableRef::Dynamic { handle, .. } if handle == p));
        assert_abs_diff_eq!(e.position.x, 16.0);

        w.step(1.0, &mut stats);
        w.step(1.0, &mut stats);
        let e = w.entity(r).unwrap();
        assert!(e.is_grounded());
        assert_abs_diff_eq!(e.position.x, 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(e.position.y, 32.0 - 24.0 - SAFETY_DISTANCE, epsilon = 1e-4);
        assert_abs_diff_eq!(w.dynamic(p).unwrap().position.x, 6.0);
        assert_eq!(stats.landings, 1);
        assert_eq!(w.frame_counter, 3);
    }

    #[test]
    fn test_ground_ref_survives_dynamic_reorder() {
        let mut w = world(TileGrid::new(16, 8));
        let doomed = w.spawn_dynamic(platform(Vec2::new(100.0, 0.0), Vec2::ZERO)).unwrap();
        let p = w.spawn_dynamic(platform(Vec2::new(0.0, 32.0), Vec2::ZERO)).unwrap();
        let r = w.spawn_static(rider()).unwrap();
        let mut stats = CollisionStats::default();

        w.step(1.0, &mut stats);
        assert_eq!(
            w.entity(r).unwrap().grounded,
            CollidableRef::Dynamic { index: 1, handle: p }
        );

        w.dynamic_mut(doomed).unwrap().dead = true;
        assert_eq!(w.debug_stats().dead, 1);
        assert_eq!(w.remove_dead(), 1);
        w.step(1.0, &mut stats);

        let e = w.entity(r).unwrap();
        assert!(e.is_grounded());
        assert_eq!(e.grounded, CollidableRef::Dynamic { index: 0, handle: p });
        assert_eq!(stats.stale_refs, 0);
    }

    #[test]
    fn test_spawn_past_capacity_fails() {
        let mut w = PhysicsWorld::new(PhysicsConfig::default(), TileGrid::new(4, 4), infos(), 1, 0).unwrap();
        w.spawn_dynamic(platform(Vec2::ZERO, Vec2::ZERO)).unwrap();
        assert!(matches!(
            w.spawn_dynamic(platform(Vec2::ZERO, Vec2::ZERO)),
            Err(CollisionError::CapacityExhausted { capacity: 1 })
        ));
        assert!(w.spawn_static(rider()).is_err());
    }

    #[test]
    fn test_new_rejects_unknown_tiles_and_bad_config() {
        let grid = TileGrid::from_cells(2, 1, vec![0, 5]).unwrap();
        assert!(matches!(
            PhysicsWorld::new(PhysicsConfig::default(), grid, infos(), 1, 1),
            Err(CollisionError::UnknownTile { id: 5, index: 1 })
        ));

        let cfg = PhysicsConfig {
            max_resolve_iterations: 0,
            ..Default::default()
        };
        assert!(PhysicsWorld::new(cfg, TileGrid::new(2, 2), infos(), 1, 1).is_err());
    }

    #[test]
    fn test_set_tile_and_timing() {
        let cfg = PhysicsConfig {
            enable_timing: true,
            ..Default::default()
        };
        let mut w = PhysicsWorld::new(cfg, TileGrid::new(4, 4), infos(), 1, 1).unwrap();
        assert!(w.set_tile(1, 1, 7).is_err());
        w.set_tile(1, 1, 1).unwrap();
        assert_eq!(w.debug_stats().solid_tiles, 1);

        assert!(w.timing().is_none());
        w.step(1.0, &mut CollisionStats::default());
        let t = w.timing().unwrap();
        assert!(t.step_ms >= t.dynamic_pass_ms);
    }
}
