use glam::Vec2;

use crate::geometry::Aab;
use crate::types::*;

/// Narrowphase primitive tests.
pub trait NarrowphaseApi {
    /// Swept test of box `a` (local space, anchored at `a_position`, moving by `delta`)
    /// against the stationary world-space box `b`, bounded by `max_t`.
    ///
    /// Returns `t == -1` with a push vector when the boxes already overlap, or when `a`
    /// is closing on `b` from within `SAFETY_DISTANCE`. Otherwise returns the earliest
    /// `t` in `(0, max_t)` at which `a` comes to rest `SAFETY_DISTANCE` away from `b`.
    fn test_aab_vs_aab(
        a_local: Aab,
        a_position: Vec2,
        delta: Vec2,
        b_world: Aab,
        max_t: f32,
    ) -> Option<CollisionInfo>;
}

/// Optional telemetry sink threaded through the resolver.
///
/// Every method has an empty default so sinks only implement what they record.
pub trait CollisionObserver {
    /// A narrowphase test was run against `target`.
    fn narrowphase_test(&mut self, _target: CollidableRef, _hit: Option<&CollisionInfo>) {}

    /// The resolve loop accepted `result` for `entity`.
    fn resolved(&mut self, _entity: EntityHandle, _result: &CollisionResult) {}

    fn spatial_transition(&mut self, _entity: EntityHandle, _from: SpatialState, _to: SpatialState) {}

    /// `entity` was trapped between a dynamic body and a tile and froze for the frame.
    fn squished(&mut self, _entity: EntityHandle, _result: &CollisionResult) {}

    /// The resolve loop ran out of iterations with time left over.
    fn iteration_cap(&mut self, _entity: EntityHandle, _remaining: f32) {}

    /// A stale ground or wall reference was dropped.
    fn stale_ref(&mut self, _entity: EntityHandle, _stale: CollidableRef) {}
}
