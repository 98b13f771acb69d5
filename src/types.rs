use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Gap kept between a resolved body and whatever it collided with.
pub const SAFETY_DISTANCE: f32 = 0.01;

/// World-space width of one tile cell.
pub const TILE_WIDTH: f32 = 16.0;
/// World-space height of one tile cell.
pub const TILE_HEIGHT: f32 = 16.0;

/// Stable identity of an entity, independent of its slot in an `EntityArray`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityHandle(pub u32);

/// What an entity is touching: nothing, a tile cell, or another entity.
///
/// `Dynamic` carries both the slot index at the time the ref was taken and the
/// handle. The index is a fast path; the handle is authoritative.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CollidableRef {
    #[default]
    None,
    Tile { index: usize },
    Dynamic { index: usize, handle: EntityHandle },
}

impl CollidableRef {
    pub fn is_none(self) -> bool {
        matches!(self, CollidableRef::None)
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// Narrowphase outcome.
///
/// `t == -1` means the body is already inside the obstacle or its safety skin, and `push`
/// moves it back out to `SAFETY_DISTANCE`. Otherwise `t` is the fraction of the tested
/// displacement that stops the body `SAFETY_DISTANCE` short of the obstacle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionInfo {
    pub t: f32,
    /// One of the four cardinal unit vectors, pointing from the obstacle into the body.
    pub normal: Vec2,
    pub push: Vec2,
}

impl CollisionInfo {
    /// A "nothing hit before `max_t`" placeholder used to seed min-scans.
    pub fn miss(max_t: f32) -> Self {
        Self {
            t: max_t,
            normal: Vec2::ZERO,
            push: Vec2::ZERO,
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.t < 0.0
    }

    /// Embedded only in the safety skin, not in the obstacle itself.
    pub fn within_skin(&self) -> bool {
        self.is_embedded() && self.push.length() <= SAFETY_DISTANCE
    }

    /// Displacement that leaves a body tested along `delta` resting on the skin.
    pub fn settle_offset(&self, delta: Vec2) -> Vec2 {
        if self.is_embedded() { self.push } else { delta * self.t }
    }
}

/// Broadphase + narrowphase result for one query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionResult {
    pub collided: bool,
    pub info: CollisionInfo,
    pub collidable: CollidableRef,
    /// Set when an embedded-in-dynamic push is itself blocked by an embedded tile.
    pub squished: bool,
}

impl CollisionResult {
    pub fn miss(max_t: f32) -> Self {
        Self {
            collided: false,
            info: CollisionInfo::miss(max_t),
            collidable: CollidableRef::None,
            squished: false,
        }
    }
}

/// Support status of an entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpatialState {
    Grounded,
    /// Just lost support; still counts as "recently grounded" until the timer runs out.
    FallingOff,
    #[default]
    Airborne,
}

/// How an entity integrates its velocity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementKind {
    /// Walks on ground; gravity is only applied while unsupported.
    #[default]
    Grounded,
    /// Flies in a straight line; gravity (scaled by its modifier) always applies.
    Straight,
}

/// What happens to velocity on contact.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponsePolicy {
    /// Stop moving into the obstacle and end the move for this frame.
    #[default]
    FullStop,
    /// Respond with `bounce_modifier` and keep moving with the remaining time.
    Bounce,
}

/// Which side of the entity a wall is on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallSide {
    Left,
    Right,
}

impl WallSide {
    /// Unit x direction pointing towards the wall.
    pub fn dir(self) -> f32 {
        match self {
            WallSide::Left => -1.0,
            WallSide::Right => 1.0,
        }
    }

    /// Side of the wall for a contact normal (normal points out of the wall).
    pub fn from_normal(normal: Vec2) -> Option<Self> {
        if normal.x > 0.0 {
            Some(WallSide::Left)
        } else if normal.x < 0.0 {
            Some(WallSide::Right)
        } else {
            None
        }
    }

    pub fn facing_away(self) -> Facing {
        match self {
            WallSide::Left => Facing::Right,
            WallSide::Right => Facing::Left,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Snapshot of world occupancy for debug overlays.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub dynamics: usize,
    pub statics: usize,
    /// Entities flagged dead but not yet removed.
    pub dead: usize,
    pub solid_tiles: usize,
}

/// Timing breakdown of the last `PhysicsWorld::step`, in milliseconds.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub step_ms: f64,
    pub dynamic_pass_ms: f64,
    pub static_pass_ms: f64,
}
