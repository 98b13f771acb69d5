//! platbonk: swept-AABB movement and collision core for tile-based 2D platformers

pub mod types;
pub mod api;
pub mod error;
pub mod config;
pub mod geometry;
pub mod tile_grid;
pub mod narrowphase;
pub mod entity;
pub mod spatial;
pub mod observer;
pub mod broadphase;
pub mod resolve;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::CollisionError;
pub use crate::config::PhysicsConfig;
pub use crate::geometry::Aab;
pub use crate::tile_grid::{TileGrid, TileInfo, TileRect, EMPTY_TILE};
pub use crate::narrowphase::{test_aab_vs_aab, Narrowphase};
pub use crate::entity::{friction_from_collidable, resolve_dynamic, Entity, EntityArray, EntityTraits};
pub use crate::observer::{CollisionStats, NoopObserver};
pub use crate::broadphase::{
    detect_collision_vs_dynamics, detect_collision_vs_tile_grid, find_collision, swept_tile_grid_region,
    CollisionScene,
};
pub use crate::resolve::{bounce_velocity, clip_velocity, process_collidables};
pub use crate::world::PhysicsWorld;
