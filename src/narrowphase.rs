use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::geometry::Aab;
use crate::types::*;

/// Swept box-vs-box test via the Minkowski difference.
pub struct Narrowphase;

/// Outward edge normals of the Minkowski rectangle, in tie-break order.
const EDGE_NORMALS: [Vec2; 4] = [Vec2::NEG_X, Vec2::NEG_Y, Vec2::X, Vec2::Y];

impl NarrowphaseApi for Narrowphase {
    fn test_aab_vs_aab(
        a_local: Aab,
        a_position: Vec2,
        delta: Vec2,
        b_world: Aab,
        max_t: f32,
    ) -> Option<CollisionInfo> {
        // Every position of A's anchor that overlaps B.
        let sum = b_world.minkowski_difference(a_local);
        // Same, grown by the gap resolved bodies keep from B.
        let skin = sum.inflated(SAFETY_DISTANCE);
        let p = a_position;

        if sum.contains_strict(p) {
            // Distance out to the left, top, right, bottom edge of the skin.
            let push = [
                p.x - skin.min.x,
                p.y - skin.min.y,
                skin.max.x - p.x,
                skin.max.y - p.y,
            ];
            let mut best = 0;
            for i in 1..4 {
                if push[i] < push[best] {
                    best = i;
                }
            }
            let normal = EDGE_NORMALS[best];
            let magnitude = push[best];
            // Already leaving faster than the push would move us.
            if delta.dot(normal) > magnitude {
                return None;
            }
            return Some(CollisionInfo {
                t: -1.0,
                normal,
                push: normal * magnitude,
            });
        }

        let mut best: Option<CollisionInfo> = None;
        let mut best_t = max_t;
        // `gap` is the distance to the face of `sum` along the motion, `speed` the closing speed.
        let mut consider = |gap: f32, speed: f32, cross: f32, cross_speed: f32, lo: f32, hi: f32, normal: Vec2| {
            if gap < 0.0 {
                return;
            }
            let touch = gap / speed;
            let at = cross + cross_speed * touch;
            if at < lo || at > hi {
                return;
            }
            let t = (gap - SAFETY_DISTANCE) / speed;
            // Starting inside the skin and closing in: push back out to the skin.
            let info = if t <= 0.0 {
                CollisionInfo {
                    t: -1.0,
                    normal,
                    push: normal * (SAFETY_DISTANCE - gap),
                }
            } else {
                CollisionInfo {
                    t,
                    normal,
                    push: Vec2::ZERO,
                }
            };
            if info.t < best_t {
                best_t = info.t;
                best = Some(info);
            }
        };

        // Left, top, right, bottom; only the face the motion closes on can be entered.
        if delta.x > 0.0 {
            consider(sum.min.x - p.x, delta.x, p.y, delta.y, sum.min.y, sum.max.y, Vec2::NEG_X);
        }
        if delta.y > 0.0 {
            consider(sum.min.y - p.y, delta.y, p.x, delta.x, sum.min.x, sum.max.x, Vec2::NEG_Y);
        }
        if delta.x < 0.0 {
            consider(p.x - sum.max.x, -delta.x, p.y, delta.y, sum.min.y, sum.max.y, Vec2::X);
        }
        if delta.y < 0.0 {
            consider(p.y - sum.max.y, -delta.y, p.x, delta.x, sum.min.x, sum.max.x, Vec2::Y);
        }

        best
    }
}

/// Free-function form of [`Narrowphase::test_aab_vs_aab`].
#[inline]
pub fn test_aab_vs_aab(
    a_local: Aab,
    a_position: Vec2,
    delta: Vec2,
    b_world: Aab,
    max_t: f32,
) -> Option<CollisionInfo> {
    Narrowphase::test_aab_vs_aab(a_local, a_position, delta, b_world, max_t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn player() -> Aab {
        Aab::new(-5.0, 0.0, 5.0, 24.0)
    }

    fn floor_tile() -> Aab {
        Aab::new(0.0, 32.0, 16.0, 48.0)
    }

    #[test]
    fn test_embedded_push_is_min_distance_to_edge() {
        // Feet 3 units into the top of the tile.
        let info = test_aab_vs_aab(player(), Vec2::new(8.0, 11.0), Vec2::ZERO, floor_tile(), 1.0).unwrap();
        assert_eq!(info.t, -1.0);
        assert_eq!(info.normal, Vec2::NEG_Y);
        assert_abs_diff_eq!(info.push.x, 0.0);
        assert_abs_diff_eq!(info.push.y, -(3.0 + SAFETY_DISTANCE), epsilon = 1e-5);
        assert!(!info.within_skin());
    }

    #[test]
    fn test_embedded_tie_prefers_left_then_up() {
        let a = Aab::new(0.0, 0.0, 2.0, 2.0);
        let b = Aab::new(0.0, 0.0, 2.0, 2.0);
        // Sum is [-2,2]^2; at the origin all four distances are 2.
        let info = test_aab_vs_aab(a, Vec2::ZERO, Vec2::ZERO, b, 1.0).unwrap();
        assert_eq!(info.normal, Vec2::NEG_X);
        // Up and right tie at 1.5; up comes first.
        let info = test_aab_vs_aab(a, Vec2::new(0.5, -0.5), Vec2::ZERO, b, 1.0).unwrap();
        assert_eq!(info.normal, Vec2::NEG_Y);
    }

    #[test]
    fn test_embedded_rejected_when_separating_fast_enough() {
        // Push would be (0,-3.01); moving up by 5 already clears it.
        let hit = test_aab_vs_aab(player(), Vec2::new(8.0, 11.0), Vec2::new(0.0, -5.0), floor_tile(), 1.0);
        assert!(hit.is_none());
        // Moving up slower than the push still resolves.
        let hit = test_aab_vs_aab(player(), Vec2::new(8.0, 11.0), Vec2::new(0.0, -1.0), floor_tile(), 1.0);
        assert!(hit.is_some());
    }

    #[test]
    fn test_sweep_stops_a_safety_gap_short_of_floor() {
        let pos = Vec2::new(8.0, 0.0);
        let delta = Vec2::new(0.0, 10.0);
        let info = test_aab_vs_aab(player(), pos, delta, floor_tile(), 1.0).unwrap();
        assert!(info.t > 0.0 && info.t <= 1.0);
        assert_eq!(info.normal, Vec2::NEG_Y);
        let bottom = pos.y + delta.y * info.t + player().max.y;
        assert_abs_diff_eq!(bottom, floor_tile().min.y - SAFETY_DISTANCE, epsilon = 1e-4);
    }

    #[test]
    fn test_sweep_respects_max_t() {
        let pos = Vec2::new(8.0, 0.0);
        // Contact at t = 0.799.
        let delta = Vec2::new(0.0, 10.0);
        assert!(test_aab_vs_aab(player(), pos, delta, floor_tile(), 0.5).is_none());
        assert!(test_aab_vs_aab(player(), pos, delta, floor_tile(), 0.9).is_some());
    }

    #[test]
    fn test_zero_velocity_never_reports_toi() {
        let pos = Vec2::new(8.0, 7.99);
        assert!(test_aab_vs_aab(player(), pos, Vec2::ZERO, floor_tile(), 1.0).is_none());
    }

    #[test]
    fn test_sweep_wall_from_left() {
        let a = Aab::new(0.0, 0.0, 10.0, 10.0);
        let wall = Aab::new(20.0, -50.0, 36.0, 50.0);
        let info = test_aab_vs_aab(a, Vec2::ZERO, Vec2::new(20.0, 0.0), wall, 1.0).unwrap();
        assert_abs_diff_eq!(info.t, (10.0 - SAFETY_DISTANCE) / 20.0, epsilon = 1e-6);
        assert_eq!(info.normal, Vec2::NEG_X);
    }

    #[test]
    fn test_touching_and_closing_in_is_embedded() {
        let a = Aab::new(0.0, 0.0, 8.0, 8.0);
        let wall = Aab::new(32.0, 0.0, 48.0, 16.0);
        // Right edge exactly on the wall face.
        let info = test_aab_vs_aab(a, Vec2::new(24.0, 0.0), Vec2::new(40.0, 0.0), wall, 1.0).unwrap();
        assert_eq!(info.t, -1.0);
        assert_eq!(info.normal, Vec2::NEG_X);
        assert_abs_diff_eq!(info.push.x, -SAFETY_DISTANCE, epsilon = 1e-6);
        assert!(info.within_skin());

        // Half-way into the skin: pushed back out to the skin.
        let info = test_aab_vs_aab(a, Vec2::new(23.995, 0.0), Vec2::new(1.0, 0.0), wall, 1.0).unwrap();
        assert_eq!(info.t, -1.0);
        assert_abs_diff_eq!(info.push.x, -0.005, epsilon = 1e-4);

        // Moving away or along the face is not a contact.
        assert!(test_aab_vs_aab(a, Vec2::new(24.0, 0.0), Vec2::new(-4.0, 0.0), wall, 1.0).is_none());
        assert!(test_aab_vs_aab(a, Vec2::new(24.0, 0.0), Vec2::new(0.0, 4.0), wall, 1.0).is_none());
    }

    #[test]
    fn test_sliding_along_floor_does_not_snag_on_next_tile() {
        let next_tile = Aab::new(16.0, 32.0, 32.0, 48.0);
        // Resting a safety gap above the floor line, walking right.
        let pos = Vec2::new(8.0, 32.0 - 24.0 - SAFETY_DISTANCE);
        assert!(test_aab_vs_aab(player(), pos, Vec2::new(4.0, 0.0), next_tile, 1.0).is_none());
    }

    #[test]
    fn test_corner_tie_goes_to_x_edge() {
        let a = Aab::new(0.0, 0.0, 1.0, 1.0);
        let b = Aab::new(2.0, 2.0, 3.0, 3.0);
        let info = test_aab_vs_aab(a, Vec2::ZERO, Vec2::new(2.0, 2.0), b, 1.0).unwrap();
        assert_abs_diff_eq!(info.t, (1.0 - SAFETY_DISTANCE) / 2.0, epsilon = 1e-6);
        assert_eq!(info.normal, Vec2::NEG_X);
    }
}
