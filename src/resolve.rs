//! Per-entity frame update: integrate, keep ground contact, move-and-resolve, wall contact.

use glam::Vec2;

use crate::api::CollisionObserver;
use crate::broadphase::{
    CollisionScene, detect_collision_vs_dynamics, detect_collision_vs_tile_grid, find_collision,
    swept_tile_grid_region,
};
use crate::config::PhysicsConfig;
use crate::entity::{Entity, friction_from_collidable, resolve_dynamic};
use crate::narrowphase::test_aab_vs_aab;
use crate::types::*;

/// TOIs below this count as "didn't move" when deciding to stop bouncing.
const MIN_TOI: f32 = 1e-4;

/// Remove the part of `velocity` that drives into a surface with `normal`.
pub fn clip_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    let into = velocity.dot(normal);
    if into < 0.0 { velocity - normal * into } else { velocity }
}

/// Bounce response: `modifier` 0 absorbs, 1 slides along the surface, 2 reflects.
/// Values in between blend linearly.
pub fn bounce_velocity(velocity: Vec2, normal: Vec2, modifier: f32) -> Vec2 {
    let vn = normal * velocity.dot(normal);
    let vt = velocity - vn;
    vt * modifier.min(1.0) - vn * (modifier - 1.0).max(0.0)
}

/// Update every live entity in `entries` for one frame.
///
/// Call once with the dynamic bodies (`is_dynamic_pass = true`, `scene.dynamics` empty),
/// then once with everything else against the freshly moved dynamics.
pub fn process_collidables(
    entries: &mut [Entity],
    scene: &CollisionScene<'_>,
    is_dynamic_pass: bool,
    dt: f32,
    cfg: &PhysicsConfig,
    observer: &mut dyn CollisionObserver,
) {
    for entity in entries.iter_mut() {
        if entity.dead {
            continue;
        }
        update_entity(entity, scene, is_dynamic_pass, dt, cfg, observer);
    }
}

fn update_entity(
    entity: &mut Entity,
    scene: &CollisionScene<'_>,
    is_dynamic_pass: bool,
    dt: f32,
    cfg: &PhysicsConfig,
    observer: &mut dyn CollisionObserver,
) {
    let traits = entity.traits;
    let old_position = entity.position;

    let mut remaining = advance_timers(entity, dt);

    if entity.walljump_duration > cfg.walljump_move_threshold && !entity.is_grounded() {
        if let Some(side) = entity.walljump_from {
            let away = -side.dir();
            if entity.velocity.x * away < cfg.walljump_escape_speed {
                entity.velocity.x = away * cfg.walljump_escape_speed;
            }
        }
    }

    integrate(entity, scene, dt, cfg);
    entity.advance_spatial_timer(dt, cfg.falling_off_duration, observer);

    let mut swept = entity.velocity * dt;

    if (entity.grounded.is_some() || entity.is_grounded())
        && !ground_still_valid(entity, scene, cfg, observer)
        && !reacquire_ground(entity, scene, is_dynamic_pass, cfg, observer)
    {
        entity.enter_spatial_state(SpatialState::FallingOff, Some(&mut *observer));
    }

    // Ride along with a moving platform.
    if let CollidableRef::Dynamic { index, handle } = entity.grounded {
        if let Some((_, ground)) = resolve_dynamic(scene.dynamics, index, handle) {
            swept += ground.position_delta;
        }
    }

    let mut settled = false;
    let mut frozen = false;
    for _ in 0..cfg.max_resolve_iterations {
        if remaining <= 0.0 {
            settled = true;
            break;
        }
        let region = swept_tile_grid_region(entity.aab, entity.position, swept * remaining, scene.grid);
        let result = find_collision(
            entity.aab,
            entity.position,
            swept,
            scene,
            region,
            remaining,
            is_dynamic_pass,
            Some(entity.handle),
            observer,
        );

        if !result.collided {
            entity.position += swept * remaining;
            remaining = 0.0;
            settled = true;
            break;
        }

        entity.last_collision = result.collidable;
        if result.squished {
            // Pinned between a dynamic and a tile: frozen for the rest of the frame.
            log::debug!("entity {:?} squished, freezing for the frame", entity.handle);
            observer.squished(entity.handle, &result);
            entity.velocity = Vec2::ZERO;
            settled = true;
            frozen = true;
            break;
        }
        observer.resolved(entity.handle, &result);

        let info = result.info;
        let normal = match traits.forced_normal {
            Some(forced) if forced.dot(info.normal) < 0.0 => -forced,
            Some(forced) => forced,
            None => info.normal,
        };

        if info.t > 0.0 {
            entity.position += swept * info.t;
            remaining -= info.t;
        } else {
            entity.position += info.push;
        }

        if normal.y < 0.0 {
            entity.enter_spatial_state(SpatialState::Grounded, Some(&mut *observer));
            entity.grounded = result.collidable;
        }

        match traits.response {
            ResponsePolicy::FullStop => {
                entity.velocity = clip_velocity(entity.velocity, normal);
                settled = true;
                break;
            }
            ResponsePolicy::Bounce => {
                let into_wall = normal.y == 0.0 && entity.velocity.x * normal.x < 0.0;
                if into_wall && traits.can_wall_jump && !entity.is_grounded() {
                    start_wall_slide(entity, result.collidable, normal, cfg);
                }
                entity.velocity = bounce_velocity(entity.velocity, normal, entity.bounce_modifier);
                swept = bounce_velocity(swept, normal, entity.bounce_modifier);
                if entity.velocity.length() < cfg.rest_speed || (info.t >= 0.0 && info.t < MIN_TOI) {
                    settled = true;
                    break;
                }
            }
        }
    }

    if !settled && remaining > 0.0 {
        log::trace!(
            "entity {:?} hit the resolve cap with {remaining} of the frame left",
            entity.handle
        );
        observer.iteration_cap(entity.handle, remaining);
        entity.position += swept * remaining;
    }

    entity.position_delta = entity.position - old_position;

    if entity.walljump_window <= 0.0 || entity.is_grounded() {
        entity.wallslide_collidable = CollidableRef::None;
        entity.wallslide_side = None;
        entity.walljump_window = 0.0;
    }
    if entity.is_grounded() {
        entity.walljump_from = None;
    }

    if traits.can_wall_jump && traits.movement == MovementKind::Grounded && !frozen {
        update_wall_contact(entity, scene, is_dynamic_pass, cfg, observer);
    }
}

/// Count down walljump/lifetime timers. Returns the fraction of the frame the entity lives for.
fn advance_timers(entity: &mut Entity, dt: f32) -> f32 {
    entity.walljump_window = (entity.walljump_window - dt).max(0.0);
    entity.walljump_duration = (entity.walljump_duration - dt).max(0.0);
    if entity.walljump_duration <= 0.0 {
        entity.walljump_from = None;
    }

    match entity.alive_countdown {
        Some(left) if left <= dt => {
            entity.alive_countdown = Some(0.0);
            entity.dead = true;
            if dt > 0.0 { (left / dt).clamp(0.0, 1.0) } else { 0.0 }
        }
        Some(left) => {
            entity.alive_countdown = Some(left - dt);
            1.0
        }
        None => 1.0,
    }
}

fn integrate(entity: &mut Entity, scene: &CollisionScene<'_>, dt: f32, cfg: &PhysicsConfig) {
    entity.velocity += entity.acceleration * dt;

    let supported = entity.is_grounded() && entity.traits.movement == MovementKind::Grounded;
    if !supported {
        entity.velocity.y += cfg.gravity * entity.gravity_modifier * dt;
        entity.velocity *= (1.0 - entity.air_friction * dt).max(0.0);
        if entity.is_wall_sliding() && entity.velocity.y > 0.0 {
            let wall = friction_from_collidable(
                scene.dynamics,
                scene.grid,
                scene.tile_infos,
                entity.wallslide_collidable,
            );
            entity.velocity.y *= (1.0 - wall * entity.wallslide_friction * dt).max(0.0);
        }
    } else if entity.acceleration.x == 0.0 {
        let ground = friction_from_collidable(scene.dynamics, scene.grid, scene.tile_infos, entity.grounded);
        entity.velocity.x *= (1.0 - ground * entity.ground_friction * dt).max(0.0);
    }

    entity.velocity = entity.velocity.clamp(-entity.max_speed, entity.max_speed);
}

/// A one-unit probe touches when the body sits in the obstacle's skin or at most `limit` past it.
fn probe_touches(info: &CollisionInfo, limit: f32) -> bool {
    info.within_skin() || (info.t >= 0.0 && info.t <= limit)
}

/// Re-test the current ground one unit below.
fn ground_still_valid(
    entity: &mut Entity,
    scene: &CollisionScene<'_>,
    cfg: &PhysicsConfig,
    observer: &mut dyn CollisionObserver,
) -> bool {
    let limit = SAFETY_DISTANCE + cfg.probe_epsilon;
    let hit = match entity.grounded {
        CollidableRef::None => return false,
        CollidableRef::Tile { index } => {
            if !scene.grid.is_solid_index(index) {
                log::debug!("entity {:?} stood on empty tile {index}", entity.handle);
                observer.stale_ref(entity.handle, entity.grounded);
                entity.grounded = CollidableRef::None;
                return false;
            }
            test_aab_vs_aab(entity.aab, entity.position, Vec2::Y, scene.grid.tile_bounds(index), 1.0)
        }
        CollidableRef::Dynamic { index, handle } => {
            let Some((found, ground)) = resolve_dynamic(scene.dynamics, index, handle) else {
                log::debug!("entity {:?} lost dynamic ground {handle:?}", entity.handle);
                observer.stale_ref(entity.handle, entity.grounded);
                entity.grounded = CollidableRef::None;
                return false;
            };
            if ground.dead {
                entity.grounded = CollidableRef::None;
                return false;
            }
            entity.grounded = CollidableRef::Dynamic { index: found, handle };
            // The rider was placed against where the platform stood before it moved.
            let before = ground.world_aab().translated(-ground.position_delta);
            test_aab_vs_aab(entity.aab, entity.position, Vec2::Y, before, 1.0)
        }
    };
    observer.narrowphase_test(entity.grounded, hit.as_ref());
    matches!(hit, Some(info) if info.normal.y < 0.0 && probe_touches(&info, limit))
}

/// Look for new ground directly underneath, tiles first. Snaps onto it on success.
fn reacquire_ground(
    entity: &mut Entity,
    scene: &CollisionScene<'_>,
    is_dynamic_pass: bool,
    cfg: &PhysicsConfig,
    observer: &mut dyn CollisionObserver,
) -> bool {
    let limit = SAFETY_DISTANCE + cfg.probe_epsilon;
    let accept = |r: &CollisionResult| {
        r.collided && r.info.normal.y < 0.0 && (r.info.within_skin() || (r.info.t >= 0.0 && r.info.t < limit))
    };

    let region = swept_tile_grid_region(entity.aab, entity.position, Vec2::Y, scene.grid);
    let mut found =
        detect_collision_vs_tile_grid(entity.aab, entity.position, Vec2::Y, scene.grid, region, 1.0, observer);
    if !accept(&found) && !is_dynamic_pass {
        found = detect_collision_vs_dynamics(
            entity.aab,
            entity.position,
            Vec2::Y,
            scene.dynamics,
            Some(entity.handle),
            1.0,
            observer,
        );
    }
    if !accept(&found) {
        return false;
    }

    entity.position.y += found.info.settle_offset(Vec2::Y).y;
    if !entity.is_grounded() {
        entity.enter_spatial_state(SpatialState::Grounded, Some(&mut *observer));
    }
    entity.grounded = found.collidable;
    true
}

fn start_wall_slide(entity: &mut Entity, wall: CollidableRef, normal: Vec2, cfg: &PhysicsConfig) {
    if let Some(side) = WallSide::from_normal(normal) {
        entity.wallslide_collidable = wall;
        entity.wallslide_side = Some(side);
        entity.walljump_window = cfg.walljump_window;
        entity.facing = side.facing_away();
    }
}

/// Probe sideways for a wall to slide on, keep the slide alive, and keep a safety gap from it.
fn update_wall_contact(
    entity: &mut Entity,
    scene: &CollisionScene<'_>,
    is_dynamic_pass: bool,
    cfg: &PhysicsConfig,
    observer: &mut dyn CollisionObserver,
) {
    let dir = match entity.wallslide_side {
        Some(side) if entity.is_wall_sliding() => side.dir(),
        _ => {
            let intent = if entity.velocity.x != 0.0 {
                entity.velocity.x
            } else {
                entity.acceleration.x
            };
            if intent > 0.0 {
                1.0
            } else if intent < 0.0 {
                -1.0
            } else {
                return;
            }
        }
    };

    let probe = Vec2::new(dir, 0.0);
    let region = swept_tile_grid_region(entity.aab, entity.position, probe, scene.grid);
    let hit = find_collision(
        entity.aab,
        entity.position,
        probe,
        scene,
        region,
        1.0,
        is_dynamic_pass,
        Some(entity.handle),
        observer,
    );
    let is_wall = hit.collided
        && !hit.squished
        && hit.info.normal.x == -dir
        && (hit.info.t >= 0.0 || hit.info.within_skin());
    if !is_wall {
        if entity.is_wall_sliding() {
            log::trace!("entity {:?} left the wall", entity.handle);
        }
        entity.wallslide_collidable = CollidableRef::None;
        return;
    }

    let pressing = entity.velocity.x * dir > 0.0 || entity.acceleration.x * dir > 0.0;
    if entity.is_wall_sliding() || (!entity.is_grounded() && pressing) {
        start_wall_slide(entity, hit.collidable, hit.info.normal, cfg);
    }

    if probe_touches(&hit.info, SAFETY_DISTANCE + cfg.probe_epsilon) {
        entity.position.x += hit.info.settle_offset(probe).x;
        if entity.velocity.x * dir > 0.0 {
            entity.velocity.x = 0.0;
        }
    }
}
