use glam::Vec2;
use platbonk::*;
use std::time::Instant;

const CONFIG: &str = r#"
gravity = 0.5
max_resolve_iterations = 4
falling_off_duration = 5.0
enable_timing = true
"#;

fn main() -> Result<(), CollisionError> {
    env_logger::init();
    let cfg = PhysicsConfig::from_toml_str(CONFIG)?;

    // 128x48 map: floor, a few ledges, pillars every 16 cells
    let w = 128u32; let h = 48u32;
    let mut grid = TileGrid::new(w, h);
    grid.fill(0, h - 2, w - 1, h - 1, 1);
    for x in (8..w).step_by(16) { grid.fill(x, h - 8, x, h - 3, 2); }
    for x in (4..w - 8).step_by(24) { grid.fill(x, h - 14, x + 5, h - 14, 1); }
    let infos = vec![TileInfo { friction: 0.0 }, TileInfo { friction: 1.0 }, TileInfo { friction: 0.3 }];

    let n_walkers = 2_000usize;
    let mut world = PhysicsWorld::new(cfg, grid, infos, 8, n_walkers + 64)?;

    let lift = EntityTraits { movement: MovementKind::Straight, gravity_modifier: 0.0, ..Default::default() };
    for i in 0..4 {
        let x = 64.0 + i as f32 * 480.0;
        world.spawn_dynamic(Entity::new(lift, Aab::new(0.0, 0.0, 48.0, 8.0), Vec2::new(x, 500.0)).with_velocity(Vec2::new(1.0, 0.0)))?;
    }

    let walker = EntityTraits { can_wall_jump: true, ground_friction: 0.2, wallslide_friction: 0.5, ..Default::default() };
    let ball = EntityTraits { movement: MovementKind::Straight, response: ResponsePolicy::Bounce, bounce_modifier: 1.8, ..Default::default() };
    for i in 0..n_walkers {
        let a = i as f32 * 0.37;
        let pos = Vec2::new(24.0 + (i % 120) as f32 * 16.0, 64.0 + (i / 120) as f32 * 20.0);
        let vel = Vec2::new(3.0 * a.sin(), -2.0 * a.cos().abs());
        let traits = if i % 5 == 0 { ball } else { walker };
        let mut e = Entity::new(traits, Aab::new(-5.0, 0.0, 5.0, 14.0), pos).with_velocity(vel);
        e.acceleration.x = if i % 2 == 0 { 0.1 } else { -0.1 };
        world.spawn_static(e)?;
    }

    let frames = 600;
    let mut stats = CollisionStats::default();
    let mut jumps = 0usize;
    let mut pass_ms = (0.0f64, 0.0f64);
    let t0 = Instant::now();
    for frame in 0..frames {
        // Lifts patrol back and forth.
        if frame % 120 == 0 {
            let handles: Vec<EntityHandle> = world.dynamics().iter().map(|e| e.handle).collect();
            for hnd in handles { if let Some(d) = world.dynamic_mut(hnd) { d.velocity.x = -d.velocity.x; } }
        }
        world.step(1.0, &mut stats);
        if let Some(t) = world.timing() { pass_ms.0 += t.dynamic_pass_ms; pass_ms.1 += t.static_pass_ms; }

        // Jump off walls whenever allowed.
        let cfg = world.cfg.clone();
        let sliding: Vec<EntityHandle> = world.statics().iter().filter(|e| e.is_wall_sliding()).map(|e| e.handle).collect();
        for hnd in sliding { if let Some(e) = world.entity_mut(hnd) { if e.try_wall_jump(&cfg) { jumps += 1; } } }
    }
    let dt = t0.elapsed().as_secs_f64();

    let grounded = world.statics().iter().filter(|e| e.is_grounded()).count();
    let ws = world.debug_stats();
    println!("platformer_frame: entities={} frames={} secs={:.3} throughput={:.0} entity-updates/s", ws.statics + ws.dynamics, frames, dt, ((ws.statics * frames) as f64 / dt));
    println!("passes: dynamic_ms={:.3} static_ms={:.3}", pass_ms.0, pass_ms.1);
    println!("grounded={} wall_jumps={} solid_tiles={}", grounded, jumps, ws.solid_tiles);
    println!("{:?}", stats);
    Ok(())
}
