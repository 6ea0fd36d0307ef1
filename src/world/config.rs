use serde::{Deserialize, Serialize};

use crate::common::error::{self, PhysicsError, Result};
use crate::math::Vec2;

/// Tunables of a [`Space`](super::Space).
///
/// Missing fields take their defaults when deserializing, so a config file
/// only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Acceleration applied to every dynamic body, scaled by its `gravity_scale`.
    pub gravity: Vec2,
    /// Solver passes over the constraints per step.
    pub iterations: usize,
    /// Fraction of velocity kept after one second.
    pub damping: f64,
    /// Speed below which a body counts as idle. 0 derives it from gravity and dt.
    pub idle_speed_threshold: f64,
    /// Seconds a whole island must idle before it sleeps. `None` disables sleeping.
    pub sleep_time_threshold: Option<f64>,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            iterations: 10,
            damping: 1.0,
            idle_speed_threshold: 0.0,
            sleep_time_threshold: None,
        }
    }
}

impl SpaceConfig {
    pub fn validate(&self) -> Result<()> {
        validate_gravity(self.gravity)?;
        validate_iterations(self.iterations)?;
        validate_damping(self.damping)?;
        validate_idle_speed_threshold(self.idle_speed_threshold)?;
        if let Some(threshold) = self.sleep_time_threshold {
            validate_sleep_time_threshold(threshold)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_gravity(gravity: Vec2) -> Result<Vec2> {
    error::finite("gravity.x", gravity.x)?;
    error::finite("gravity.y", gravity.y)?;
    Ok(gravity)
}

pub(crate) fn validate_iterations(iterations: usize) -> Result<usize> {
    if iterations == 0 {
        return Err(PhysicsError::InvalidParameter {
            name: "iterations",
            value: 0.0,
            reason: "must be >= 1",
        });
    }
    Ok(iterations)
}

pub(crate) fn validate_damping(damping: f64) -> Result<f64> {
    if damping.is_nan() || !(0.0..=1.0).contains(&damping) {
        return Err(PhysicsError::InvalidParameter {
            name: "damping",
            value: damping,
            reason: "must be in [0, 1]",
        });
    }
    Ok(damping)
}

pub(crate) fn validate_idle_speed_threshold(threshold: f64) -> Result<f64> {
    error::non_negative("idle_speed_threshold", error::finite("idle_speed_threshold", threshold)?)
}

/// Infinity is allowed here and means "never sleep".
pub(crate) fn validate_sleep_time_threshold(threshold: f64) -> Result<f64> {
    error::non_negative("sleep_time_threshold", threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SpaceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.iterations, 10);
        assert_eq!(config.damping, 1.0);
        assert_eq!(config.sleep_time_threshold, None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            SpaceConfig { iterations: 0, ..Default::default() },
            SpaceConfig { damping: 1.5, ..Default::default() },
            SpaceConfig { damping: f64::NAN, ..Default::default() },
            SpaceConfig { idle_speed_threshold: -1.0, ..Default::default() },
            SpaceConfig { sleep_time_threshold: Some(-0.5), ..Default::default() },
            SpaceConfig { gravity: Vec2::new(f64::INFINITY, 0.0), ..Default::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SpaceConfig =
            serde_json::from_str(r#"{ "gravity": { "x": 0.0, "y": -9.8 }, "sleep_time_threshold": 0.5 }"#)
                .unwrap();
        assert_eq!(config.gravity, Vec2::new(0.0, -9.8));
        assert_eq!(config.sleep_time_threshold, Some(0.5));
        assert_eq!(config.iterations, 10);
    }
}
