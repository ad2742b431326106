use nalgebra::Vector3;
use tracing::warn;

use super::elements::{rv2ecc, rv2period};
use super::propagator::{OrbitalState, Propagator};
use crate::error::{KernelError, Result};
use crate::math::{lagrange, JulianDate};
use crate::physics::constants::MU_EARTH;

/// Degree used to interpolate tabulated states.
const EPHEMERIS_DEGREE: usize = 3;

/// Samples closer together than this are treated as the same instant, s.
const DUPLICATE_TOLERANCE: f64 = 1e-9;

/// Tabulated inertial states, interpolated with a cubic Lagrange polynomial.
#[derive(Debug, Clone)]
pub struct EphemerisPropagator {
    name: String,
    epoch: JulianDate,
    times: Vec<f64>,      // s from epoch, ascending
    positions: Vec<f64>,  // x,y,z interleaved
    velocities: Vec<f64>, // x,y,z interleaved
    period: f64,
    ecc: f64,
}

impl EphemerisPropagator {
    /// Samples may arrive in any order; they are sorted by time and only the
    /// first sample at each instant is kept.
    pub fn new(name: &str, mut samples: Vec<OrbitalState>) -> Result<Self> {
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        let count = samples.len();
        samples.dedup_by(|later, kept| later.time.seconds_since(&kept.time).abs() < DUPLICATE_TOLERANCE);
        if samples.len() < count {
            warn!(ephemeris = name, dropped = count - samples.len(), "duplicate sample times dropped");
        }
        let first = *samples
            .first()
            .ok_or_else(|| KernelError::EmptyEphemeris(name.to_string()))?;

        let times = samples.iter().map(|s| s.time.seconds_since(&first.time)).collect();
        let positions = samples.iter().flat_map(|s| s.pos.iter().copied()).collect();
        let velocities = samples.iter().flat_map(|s| s.vel.iter().copied()).collect();

        Ok(Self {
            name: name.to_string(),
            epoch: first.time,
            times,
            positions,
            velocities,
            period: rv2period(MU_EARTH, &first.pos, &first.vel),
            ecc: rv2ecc(MU_EARTH, &first.pos, &first.vel),
        })
    }

    pub fn epoch(&self) -> &JulianDate {
        &self.epoch
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Seconds covered by the table.
    pub fn span(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

impl Propagator for EphemerisPropagator {
    fn propagate(&mut self, t: &JulianDate) -> (Vector3<f64>, Vector3<f64>) {
        let dt = t.seconds_since(&self.epoch);
        (
            lagrange::interpolate(&self.times, &self.positions, dt, EPHEMERIS_DEGREE),
            lagrange::interpolate(&self.times, &self.velocities, dt, EPHEMERIS_DEGREE),
        )
    }

    fn period(&self) -> Option<f64> {
        Some(self.period)
    }

    fn eccentricity(&self) -> Option<f64> {
        Some(self.ecc)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbital::two_body::TwoBodyPropagator;

    fn sampled_orbit(step: f64, count: usize) -> (TwoBodyPropagator, Vec<OrbitalState>) {
        let r0 = Vector3::new(-605_792.216_60, -5_870_229.511_08, 3_493_053.198_96);
        let v0 = Vector3::new(-1_568.254_29, -3_702.348_91, -6_479.483_95);
        let t0 = JulianDate::j2000();
        let mut truth = TwoBodyPropagator::new(r0, v0, t0);
        let samples = (0..count)
            .map(|i| {
                let time = t0.add_seconds(i as f64 * step);
                let (pos, vel) = truth.propagate(&time);
                OrbitalState { time, pos, vel }
            })
            .collect();
        (truth, samples)
    }

    #[test]
    fn interpolates_between_samples() {
        let (mut truth, mut samples) = sampled_orbit(30.0, 20);
        samples.reverse();
        let mut eph = EphemerisPropagator::new("table", samples).unwrap();
        assert_eq!(eph.len(), 20);
        assert!((eph.span() - 570.0).abs() < 1e-9);

        let t = JulianDate::j2000().add_seconds(250.0);
        let (p, v) = eph.propagate(&t);
        let (pt, vt) = truth.propagate(&t);
        assert!((p - pt).norm() < 5.0, "position error {:.3} m", (p - pt).norm());
        assert!((v - vt).norm() < 0.05, "velocity error {:.5} m/s", (v - vt).norm());
    }

    #[test]
    fn exact_at_sample_times() {
        let (_, samples) = sampled_orbit(60.0, 8);
        let expected = samples[3];
        let mut eph = EphemerisPropagator::new("table", samples).unwrap();
        let (p, _) = eph.propagate(&expected.time);
        assert!((p - expected.pos).norm() < 1e-6);
    }

    #[test]
    fn derives_period_from_first_sample() {
        let (truth, samples) = sampled_orbit(60.0, 4);
        let eph = EphemerisPropagator::new("table", samples).unwrap();
        assert!((eph.period().unwrap() - truth.period().unwrap()).abs() < 1e-6);
        assert!(eph.eccentricity().unwrap() < 1.0);
        assert_eq!(eph.epoch(), &JulianDate::j2000());
    }

    #[test]
    fn duplicate_times_are_dropped() {
        let (mut truth, mut samples) = sampled_orbit(60.0, 6);
        let mut copy = samples[2];
        copy.pos += Vector3::new(1.0, 0.0, 0.0);
        samples.push(copy);
        let mut eph = EphemerisPropagator::new("table", samples).unwrap();
        assert_eq!(eph.len(), 6);

        let t = JulianDate::j2000().add_seconds(150.0);
        let (p, v) = eph.propagate(&t);
        assert!(p.iter().chain(v.iter()).all(|c| c.is_finite()), "non-finite state {p} {v}");
        let (pt, _) = truth.propagate(&t);
        assert!((p - pt).norm() < 50.0, "position error {:.3} m", (p - pt).norm());
    }

    #[test]
    fn empty_table_is_an_error() {
        assert!(matches!(
            EphemerisPropagator::new("none", vec![]),
            Err(KernelError::EmptyEphemeris(_))
        ));
    }
}
