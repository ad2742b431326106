use std::f64::consts::TAU;
use std::fmt::Display;

use nalgebra::Vector3;
use tracing::warn;

use super::propagator::Propagator;
use crate::error::{KernelError, Result};
use crate::math::JulianDate;

const MINUTES_PER_DAY: f64 = 1440.0;

/// SGP4 propagation of a two-line element set.
///
/// Output is TEME, used directly as the kernel's inertial frame.
pub struct Sgp4Propagator {
    name: String,
    elements: sgp4::Elements,
    constants: sgp4::Constants,
    epoch: JulianDate,
    period: f64, // s
}

impl Sgp4Propagator {
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> Result<Self> {
        let elements = sgp4::Elements::from_tle(
            Some(name.to_string()),
            line1.trim().as_bytes(),
            line2.trim().as_bytes(),
        )
        .map_err(|e| KernelError::Tle { name: name.to_string(), reason: e.to_string() })?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| KernelError::Sgp4Model { name: name.to_string(), reason: e.to_string() })?;

        let epoch = JulianDate::from_datetime(&elements.datetime.and_utc());
        // mean motion is rev/day; period = 2*pi / n with n in rad/min, scaled to seconds
        let n_rad_per_min = elements.mean_motion * TAU / MINUTES_PER_DAY;
        let period = TAU / n_rad_per_min * 60.0;

        Ok(Self { name: name.to_string(), elements, constants, epoch, period })
    }

    pub fn epoch(&self) -> &JulianDate {
        &self.epoch
    }

    pub fn elements(&self) -> &sgp4::Elements {
        &self.elements
    }

    /// Minutes from the element-set epoch to `t`.
    pub fn minutes_since_epoch(&self, t: &JulianDate) -> f64 {
        t.seconds_since(&self.epoch) / 60.0
    }
}

impl Propagator for Sgp4Propagator {
    fn propagate(&mut self, t: &JulianDate) -> (Vector3<f64>, Vector3<f64>) {
        let minutes = self.minutes_since_epoch(t);
        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes))
            .map(|p| (p.position, p.velocity));
        state_or_zero(&self.name, minutes, prediction)
    }

    fn period(&self) -> Option<f64> {
        Some(self.period)
    }

    fn eccentricity(&self) -> Option<f64> {
        Some(self.elements.eccentricity)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// SGP4 km and km/s to m and m/s; a failed or non-finite prediction becomes
/// zero vectors so the satellite stays live in the scene.
fn state_or_zero<E: Display>(
    name: &str,
    minutes: f64,
    prediction: std::result::Result<([f64; 3], [f64; 3]), E>,
) -> (Vector3<f64>, Vector3<f64>) {
    match prediction {
        Ok((p, v)) if p.iter().chain(v.iter()).all(|c| c.is_finite()) => (
            Vector3::new(p[0], p[1], p[2]) * 1000.0,
            Vector3::new(v[0], v[1], v[2]) * 1000.0,
        ),
        Ok(_) => {
            warn!(satellite = name, minutes, "SGP4 returned a non-finite state");
            (Vector3::zeros(), Vector3::zeros())
        }
        Err(e) => {
            warn!(satellite = name, minutes, error = %e, "SGP4 propagation failed");
            (Vector3::zeros(), Vector3::zeros())
        }
    }
}
