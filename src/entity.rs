use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::error::CollisionError;
use crate::geometry::Aab;
use crate::tile_grid::{TileGrid, TileInfo};
use crate::types::*;

/// Static per-type configuration shared by every entity of a kind.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityTraits {
    pub movement: MovementKind,
    pub response: ResponsePolicy,
    /// Treat every contact as if it had this normal (sign-matched to the real one).
    pub forced_normal: Option<Vec2>,
    pub can_wall_jump: bool,
    pub gravity_modifier: f32,
    /// 0 absorbs, 1 slides, 2 reflects.
    pub bounce_modifier: f32,
    pub air_friction: f32,
    pub wallslide_friction: f32,
    /// How quickly horizontal speed bleeds off on the ground with no input.
    pub ground_friction: f32,
    /// Friction this entity offers to things standing on or sliding along it.
    pub surface_friction: f32,
    pub max_speed: Vec2,
}

impl Default for EntityTraits {
    fn default() -> Self {
        Self {
            movement: MovementKind::Grounded,
            response: ResponsePolicy::FullStop,
            forced_normal: None,
            can_wall_jump: false,
            gravity_modifier: 1.0,
            bounce_modifier: 1.0,
            air_friction: 0.0,
            wallslide_friction: 0.0,
            ground_friction: 0.0,
            surface_friction: 1.0,
            max_speed: Vec2::splat(f32::MAX),
        }
    }
}

/// A collidable body. Only the fields the movement core reads or writes live here.
#[derive(Clone, Debug)]
pub struct Entity {
    pub handle: EntityHandle,
    pub traits: EntityTraits,

    /// Collision box relative to `position`.
    pub aab: Aab,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub max_speed: Vec2,
    /// Displacement actually applied during the last update.
    pub position_delta: Vec2,

    pub grounded: CollidableRef,
    pub wallslide_collidable: CollidableRef,
    pub wallslide_side: Option<WallSide>,
    pub last_collision: CollidableRef,

    /// Time left to honour a wall jump after touching a wall.
    pub walljump_window: f32,
    /// Time left in the forced push-off of a wall jump.
    pub walljump_duration: f32,
    /// Wall the current wall jump pushed off from.
    pub walljump_from: Option<WallSide>,

    pub spatial_state: SpatialState,
    pub spatial_state_timer: f32,

    pub gravity_modifier: f32,
    pub bounce_modifier: f32,
    pub air_friction: f32,
    pub wallslide_friction: f32,
    pub ground_friction: f32,
    pub surface_friction: f32,

    /// Remaining lifetime; the entity dies partway through the frame it runs out.
    pub alive_countdown: Option<f32>,
    pub dead: bool,
    pub facing: Facing,
}

impl Entity {
    /// New entity with coefficients taken from `traits`. The handle is assigned by `EntityArray`.
    pub fn new(traits: EntityTraits, aab: Aab, position: Vec2) -> Self {
        Self {
            handle: EntityHandle::default(),
            traits,
            aab,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            max_speed: traits.max_speed,
            position_delta: Vec2::ZERO,
            grounded: CollidableRef::None,
            wallslide_collidable: CollidableRef::None,
            wallslide_side: None,
            last_collision: CollidableRef::None,
            walljump_window: 0.0,
            walljump_duration: 0.0,
            walljump_from: None,
            spatial_state: SpatialState::Airborne,
            spatial_state_timer: 0.0,
            gravity_modifier: traits.gravity_modifier,
            bounce_modifier: traits.bounce_modifier,
            air_friction: traits.air_friction,
            wallslide_friction: traits.wallslide_friction,
            ground_friction: traits.ground_friction,
            surface_friction: traits.surface_friction,
            alive_countdown: None,
            dead: false,
            facing: Facing::default(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn world_aab(&self) -> Aab {
        self.aab.translated(self.position)
    }

    pub fn is_wall_sliding(&self) -> bool {
        self.wallslide_collidable.is_some()
    }

    /// Honour a wall-jump input if the walljump window is still open.
    pub fn try_wall_jump(&mut self, cfg: &PhysicsConfig) -> bool {
        let side = match self.wallslide_side {
            Some(side) if self.walljump_window > 0.0 => side,
            _ => return false,
        };
        let away = -side.dir();
        self.velocity = Vec2::new(away * cfg.walljump_escape_speed, -cfg.walljump_jump_speed);
        self.walljump_duration = cfg.walljump_duration;
        self.walljump_from = Some(side);
        self.walljump_window = 0.0;
        self.wallslide_collidable = CollidableRef::None;
        self.facing = side.facing_away();
        self.enter_spatial_state(SpatialState::Airborne, None);
        log::trace!("entity {:?} wall-jumped off {:?} wall", self.handle, side);
        true
    }
}

/// Look up a dynamic by slot index, falling back to a search by handle when the slot
/// was reused after the array was reordered.
pub fn resolve_dynamic(dynamics: &[Entity], index: usize, handle: EntityHandle) -> Option<(usize, &Entity)> {
    if let Some(e) = dynamics.get(index) {
        if e.handle == handle {
            return Some((index, e));
        }
    }
    dynamics
        .iter()
        .position(|e| e.handle == handle)
        .map(|i| (i, &dynamics[i]))
}

/// Friction offered by whatever `r` points at. Unknown or missing targets yield 0.
pub fn friction_from_collidable(
    dynamics: &[Entity],
    grid: &TileGrid,
    tile_infos: &[TileInfo],
    r: CollidableRef,
) -> f32 {
    match r {
        CollidableRef::None => 0.0,
        CollidableRef::Tile { index } => {
            let id = grid.tile_at_index(index) as usize;
            tile_infos.get(id).map(|info| info.friction).unwrap_or(0.0)
        }
        CollidableRef::Dynamic { index, handle } => resolve_dynamic(dynamics, index, handle)
            .map(|(_, e)| e.surface_friction)
            .unwrap_or(0.0),
    }
}

/// Fixed-capacity entity storage. Memory is reserved once and never grows.
#[derive(Debug)]
pub struct EntityArray {
    entities: Vec<Entity>,
    capacity: usize,
    next_handle: u32,
}

impl EntityArray {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            capacity,
            next_handle: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.entities.len()
    }

    /// Insert `entity`, assigning it a fresh handle.
    pub fn push(&mut self, mut entity: Entity) -> Result<EntityHandle, CollisionError> {
        if self.remaining_capacity() == 0 {
            return Err(CollisionError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        let handle = EntityHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        entity.handle = handle;
        self.entities.push(entity);
        Ok(handle)
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.iter().find(|e| e.handle == handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.handle == handle)
    }

    /// Drop dead entities. Uses swap-removal, so surviving entities may change slot.
    pub fn remove_dead(&mut self) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.entities.len() {
            if self.entities[i].dead {
                self.entities.swap_remove(i);
                removed += 1;
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Remove one entity by handle (swap-removal).
    pub fn remove(&mut self, handle: EntityHandle) -> Option<Entity> {
        let i = self.entities.iter().position(|e| e.handle == handle)?;
        Some(self.entities.swap_remove(i))
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn as_mut_slice(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}
