use crate::api::CollisionObserver;
use crate::types::*;

/// Observer that records nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopObserver;

impl CollisionObserver for NoopObserver {}

/// Counters for a run of frames, for debug overlays and perf checks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionStats {
    pub tile_tests: usize,
    pub dynamic_tests: usize,
    /// Narrowphase tests that reported a hit (before min-selection).
    pub narrowphase_hits: usize,
    /// Collisions accepted by the resolve loop.
    pub resolved: usize,
    pub embedded_resolved: usize,
    pub transitions: usize,
    pub landings: usize,
    pub squished: usize,
    pub iteration_caps: usize,
    pub stale_refs: usize,
}

impl CollisionObserver for CollisionStats {
    fn narrowphase_test(&mut self, target: CollidableRef, hit: Option<&CollisionInfo>) {
        match target {
            CollidableRef::Tile { .. } => self.tile_tests += 1,
            CollidableRef::Dynamic { .. } => self.dynamic_tests += 1,
            CollidableRef::None => {}
        }
        if hit.is_some() {
            self.narrowphase_hits += 1;
        }
    }

    fn resolved(&mut self, _entity: EntityHandle, result: &CollisionResult) {
        self.resolved += 1;
        if result.info.is_embedded() {
            self.embedded_resolved += 1;
        }
    }

    fn spatial_transition(&mut self, _entity: EntityHandle, _from: SpatialState, to: SpatialState) {
        self.transitions += 1;
        if to == SpatialState::Grounded {
            self.landings += 1;
        }
    }

    fn squished(&mut self, _entity: EntityHandle, _result: &CollisionResult) {
        self.squished += 1;
    }

    fn iteration_cap(&mut self, _entity: EntityHandle, _remaining: f32) {
        self.iteration_caps += 1;
    }

    fn stale_ref(&mut self, _entity: EntityHandle, _stale: CollidableRef) {
        self.stale_refs += 1;
    }
}
