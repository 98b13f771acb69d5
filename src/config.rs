//! Tunables for the movement/collision core.

use serde::{Deserialize, Serialize};

use crate::error::CollisionError;

/// World-level movement configuration.
///
/// Time values are in simulation time units (the same unit as `dt`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration before the per-entity gravity modifier.
    pub gravity: f32,
    /// Hard ceiling on move-and-resolve iterations per entity per frame.
    pub max_resolve_iterations: u32,
    /// Time spent in `FallingOff` before an entity counts as `Airborne`.
    pub falling_off_duration: f32,
    /// Slack added on top of `SAFETY_DISTANCE` when probing for ground or walls.
    pub probe_epsilon: f32,
    /// Grace period after touching a wall during which a wall jump is honoured.
    pub walljump_window: f32,
    /// Length of the forced push-off after a wall jump.
    pub walljump_duration: f32,
    /// While `walljump_duration` is above this, horizontal velocity is forced away from the wall.
    pub walljump_move_threshold: f32,
    pub walljump_escape_speed: f32,
    pub walljump_jump_speed: f32,
    /// Speeds below this count as stopped when deciding to end a bounce.
    pub rest_speed: f32,
    /// Record per-pass timings in `PhysicsWorld::timing`.
    pub enable_timing: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            max_resolve_iterations: 4,
            falling_off_duration: 5.0,
            probe_epsilon: 1e-3,
            walljump_window: 8.0,
            walljump_duration: 10.0,
            walljump_move_threshold: 4.0,
            walljump_escape_speed: 3.0,
            walljump_jump_speed: 6.0,
            rest_speed: 1e-3,
            enable_timing: false,
        }
    }
}

impl PhysicsConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, CollisionError> {
        let cfg: PhysicsConfig = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CollisionError> {
        if self.max_resolve_iterations == 0 {
            return Err(CollisionError::InvalidConfig(
                "max_resolve_iterations must be at least 1".into(),
            ));
        }
        let non_negative = [
            ("falling_off_duration", self.falling_off_duration),
            ("probe_epsilon", self.probe_epsilon),
            ("walljump_window", self.walljump_window),
            ("walljump_duration", self.walljump_duration),
            ("walljump_move_threshold", self.walljump_move_threshold),
            ("walljump_escape_speed", self.walljump_escape_speed),
            ("walljump_jump_speed", self.walljump_jump_speed),
            ("rest_speed", self.rest_speed),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CollisionError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !self.gravity.is_finite() {
            return Err(CollisionError::InvalidConfig("gravity must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = PhysicsConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_resolve_iterations, 4);
        assert_eq!(cfg.falling_off_duration, 5.0);
    }

    #[test]
    fn test_toml_partial_override() {
        let cfg = PhysicsConfig::from_toml_str("gravity = 0.25\nwalljump_window = 3.0\n").unwrap();
        assert_eq!(cfg.gravity, 0.25);
        assert_eq!(cfg.walljump_window, 3.0);
        assert_eq!(cfg.max_resolve_iterations, 4);
    }

    #[test]
    fn test_toml_rejects_zero_iterations() {
        let err = PhysicsConfig::from_toml_str("max_resolve_iterations = 0").unwrap_err();
        assert!(matches!(err, CollisionError::InvalidConfig(_)));
    }

    #[test]
    fn test_toml_syntax_error() {
        let err = PhysicsConfig::from_toml_str("gravity = = 1").unwrap_err();
        assert!(matches!(err, CollisionError::ConfigParse(_)));
    }

    #[test]
    fn test_negative_window_rejected() {
        let cfg = PhysicsConfig {
            walljump_window: -1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
