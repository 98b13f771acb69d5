use glam::Vec2;

use crate::api::CollisionObserver;
use crate::entity::Entity;
use crate::geometry::Aab;
use crate::narrowphase::test_aab_vs_aab;
use crate::tile_grid::{TileGrid, TileInfo, TileRect};
use crate::types::*;

/// Read-only world state an entity is resolved against.
#[derive(Copy, Clone)]
pub struct CollisionScene<'a> {
    pub grid: &'a TileGrid,
    pub tile_infos: &'a [TileInfo],
    /// Moving bodies, already resolved for this frame.
    pub dynamics: &'a [Entity],
}

/// Tile cells that the box could touch while moving by `delta`.
///
/// Over-approximates by `SAFETY_DISTANCE` so resting contacts stay inside the region.
pub fn swept_tile_grid_region(aab: Aab, position: Vec2, delta: Vec2, grid: &TileGrid) -> TileRect {
    let bounds = aab
        .translated(position)
        .swept(delta)
        .inflated(SAFETY_DISTANCE);
    grid.region_for(bounds)
}

/// Earliest hit against the solid cells of `region`.
pub fn detect_collision_vs_tile_grid(
    aab: Aab,
    position: Vec2,
    delta: Vec2,
    grid: &TileGrid,
    region: TileRect,
    max_t: f32,
    observer: &mut dyn CollisionObserver,
) -> CollisionResult {
    let mut result = CollisionResult::miss(max_t);
    for (x, y) in region.cells() {
        if !grid.is_solid(x, y) {
            continue;
        }
        let index = grid.index_of(x, y);
        let target = CollidableRef::Tile { index };
        let hit = test_aab_vs_aab(aab, position, delta, grid.tile_bounds(index), max_t);
        observer.narrowphase_test(target, hit.as_ref());
        if let Some(info) = hit {
            if info.t < result.info.t {
                result = CollisionResult {
                    collided: true,
                    info,
                    collidable: target,
                    squished: false,
                };
            }
        }
    }
    result
}

/// Earliest hit against every live dynamic except `skip`.
pub fn detect_collision_vs_dynamics(
    aab: Aab,
    position: Vec2,
    delta: Vec2,
    dynamics: &[Entity],
    skip: Option<EntityHandle>,
    max_t: f32,
    observer: &mut dyn CollisionObserver,
) -> CollisionResult {
    let mut result = CollisionResult::miss(max_t);
    for (index, other) in dynamics.iter().enumerate() {
        if other.dead || Some(other.handle) == skip {
            continue;
        }
        let target = CollidableRef::Dynamic {
            index,
            handle: other.handle,
        };
        let hit = test_aab_vs_aab(aab, position, delta, other.world_aab(), max_t);
        observer.narrowphase_test(target, hit.as_ref());
        if let Some(info) = hit {
            if info.t < result.info.t {
                result = CollisionResult {
                    collided: true,
                    info,
                    collidable: target,
                    squished: false,
                };
            }
        }
    }
    result
}

/// Earliest collision against tiles and (outside the dynamic pass) dynamics.
///
/// When the body is embedded in a dynamic, the dynamic's push is re-swept against
/// the tiles so it can't shove the body into a wall.
#[allow(clippy::too_many_arguments)]
pub fn find_collision(
    aab: Aab,
    position: Vec2,
    delta: Vec2,
    scene: &CollisionScene<'_>,
    region: TileRect,
    max_t: f32,
    is_dynamic_phase: bool,
    skip: Option<EntityHandle>,
    observer: &mut dyn CollisionObserver,
) -> CollisionResult {
    let tile = detect_collision_vs_tile_grid(aab, position, delta, scene.grid, region, max_t, observer);
    if is_dynamic_phase || (tile.collided && tile.info.t <= 0.0) {
        return tile;
    }

    let dynamic = detect_collision_vs_dynamics(aab, position, delta, scene.dynamics, skip, max_t, observer);
    if !dynamic.collided || dynamic.info.t >= tile.info.t {
        return tile;
    }
    if !dynamic.info.is_embedded() {
        return dynamic;
    }
    correct_dynamic_push(aab, position, scene.grid, dynamic, observer)
}

fn correct_dynamic_push(
    aab: Aab,
    position: Vec2,
    grid: &TileGrid,
    mut hit: CollisionResult,
    observer: &mut dyn CollisionObserver,
) -> CollisionResult {
    let adjusted = hit.info.push;
    let region = swept_tile_grid_region(aab, position, adjusted, grid);
    let wall = detect_collision_vs_tile_grid(aab, position, adjusted, grid, region, 1.0, observer);
    if !wall.collided {
        return hit;
    }
    if wall.info.t > 0.0 {
        // Stop a safety gap short of the wall instead.
        hit.info.push = adjusted * wall.info.t;
    } else {
        log::debug!(
            "squished between {:?} and {:?} at {:?}",
            hit.collidable,
            wall.collidable,
            position
        );
        hit.info.push = Vec2::ZERO;
        hit.squished = true;
    }
    hit
}
