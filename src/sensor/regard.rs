use serde::{Deserialize, Serialize};

use crate::math::AzElRange;

/// One field-of-regard window in site look angles.
///
/// Both intervals are open. A clock interval with `clock[0] > clock[1]`
/// wraps through north, so `[350, 10]` covers 350..360 and 0..10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfRegard {
    pub clock: [f64; 2],     // deg azimuth
    pub elevation: [f64; 2], // deg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>, // m, inclusive limit
}

impl FieldOfRegard {
    pub fn new(clock: [f64; 2], elevation: [f64; 2]) -> Self {
        Self { clock, elevation, range: None }
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = Some(range);
        self
    }

    /// Whole sky above the horizon.
    pub fn hemisphere() -> Self {
        Self::new([-1.0, 361.0], [0.0, 91.0])
    }

    pub fn contains(&self, look: &AzElRange) -> bool {
        let [c0, c1] = self.clock;
        let in_clock = if c0 <= c1 {
            c0 < look.az && look.az < c1
        } else {
            look.az > c0 || look.az < c1
        };
        let [e0, e1] = self.elevation;
        let in_elevation = e0 < look.el && look.el < e1;
        let in_range = self.range.map_or(true, |max| look.range <= max);
        in_clock && in_elevation && in_range
    }
}

/// True when any entry of `regard` contains `look`.
pub fn in_regard(regard: &[FieldOfRegard], look: &AzElRange) -> bool {
    regard.iter().any(|f| f.contains(look))
}
