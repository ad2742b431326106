use serde::{Deserialize, Serialize};

use crate::bodies::EarthModel;
use crate::error::{KernelError, Result};
use crate::orbital::two_body::DEFAULT_MAX_ITERATIONS;
use crate::orbital::LagrangeConfig;

/// Default slant range reported by a gimbal that is not tracking, m.
pub const DEFAULT_GIMBAL_RANGE: f64 = 45_000_000.0;

/// Universe-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub earth_model: EarthModel,
    pub lagrange: LagrangeConfig,
    pub default_gimbal_range: f64, // m
    pub max_kepler_iterations: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            earth_model: EarthModel::Teme,
            lagrange: LagrangeConfig::default(),
            default_gimbal_range: DEFAULT_GIMBAL_RANGE,
            max_kepler_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl UniverseConfig {
    /// Parse from JSON; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| KernelError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = UniverseConfig::from_json(r#"{"earth_model":"iau76_fk5","lagrange":{"lookbehind":3}}"#)
            .unwrap();
        assert_eq!(cfg.earth_model, EarthModel::Iau76Fk5);
        assert_eq!(cfg.lagrange.lookbehind, 3);
        assert_eq!(cfg.lagrange.samples, 7);
        assert_eq!(cfg.max_kepler_iterations, 350);
        assert_eq!(cfg.default_gimbal_range, 45_000_000.0);
    }

    #[test]
    fn rejects_unknown_model() {
        assert!(UniverseConfig::from_json(r#"{"earth_model":"flat"}"#).is_err());
    }
}
