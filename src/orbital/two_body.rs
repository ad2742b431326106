//! Universal-variable Kepler solver (Vallado, "Fundamentals of Astrodynamics
//! and Applications", algorithm 8) and a two-body propagator built on it.

use std::f64::consts::{FRAC_PI_2, TAU};

use nalgebra::Vector3;
use tracing::warn;

use super::elements::{rv2ecc, rv2period};
use super::propagator::{OrbitalState, Propagator};
use crate::math::JulianDate;
use crate::physics::constants::MU_EARTH;

const SMALL: f64 = 1e-10;
/// |z| below this switches the Stumpff functions to their power series.
const STUMPFF_SERIES_LIMIT: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: usize = 350;

/// Result of one universal-variable solve.
#[derive(Debug, Clone, Copy)]
pub struct KeplerSolution {
    pub pos: Vector3<f64>, // m
    pub vel: Vector3<f64>, // m/s
    pub iterations: usize,
    pub converged: bool,
}

/// Stumpff functions `(c2, c3)`.
pub fn stumpff(z: f64) -> (f64, f64) {
    if z > STUMPFF_SERIES_LIMIT {
        let s = z.sqrt();
        ((1.0 - s.cos()) / z, (s - s.sin()) / (s * s * s))
    } else if z < -STUMPFF_SERIES_LIMIT {
        let s = (-z).sqrt();
        ((1.0 - s.cosh()) / z, (s.sinh() - s) / (s * s * s))
    } else {
        let z2 = z * z;
        (
            0.5 - z / 24.0 + z2 / 720.0 - z2 * z / 40_320.0,
            1.0 / 6.0 - z / 120.0 + z2 / 5_040.0 - z2 * z / 362_880.0,
        )
    }
}

/// Propagate `(r0, v0)` by `dt` seconds on a two-body conic.
///
/// Non-convergence within `max_iter` is logged and the last iterate is
/// returned with `converged == false`.
pub fn vallado(
    mu: f64,
    r0: &Vector3<f64>,
    v0: &Vector3<f64>,
    dt: f64,
    max_iter: usize,
) -> KeplerSolution {
    if dt.abs() < SMALL {
        return KeplerSolution { pos: *r0, vel: *v0, iterations: 0, converged: true };
    }

    let r0_mag = r0.norm();
    let rdotv = r0.dot(v0);
    let sqrt_mu = mu.sqrt();
    let inv_sqrt_mu = 1.0 / sqrt_mu;

    let sme = 0.5 * v0.norm_squared() - mu / r0_mag;
    let mut alpha = -2.0 * sme / mu;
    let a = if sme.abs() > SMALL { -mu / (2.0 * sme) } else { f64::INFINITY };
    if alpha.abs() < SMALL {
        alpha = 0.0;
    }

    let mut dt = dt;
    let mut x = if alpha >= SMALL {
        // Ellipse
        let period = TAU * (a.abs().powi(3) / mu).sqrt();
        if dt.abs() > period {
            dt %= period;
        }
        sqrt_mu * dt * alpha
    } else if alpha == 0.0 {
        // Parabola: Barker's equation seed
        let h = r0.cross(v0);
        let p = h.norm_squared() / mu;
        let s = 0.5 * (FRAC_PI_2 - (3.0 * (mu / (p * p * p)).sqrt() * dt).atan());
        let w = s.tan().cbrt().atan();
        p.sqrt() * 2.0 / (2.0 * w).tan()
    } else {
        // Hyperbola
        let sign = dt.signum();
        let temp = -2.0 * mu * dt
            / (a * (rdotv + sign * (-mu * a).sqrt() * (1.0 - r0_mag * alpha)));
        sign * (-a).sqrt() * temp.ln()
    };

    let mut iterations = 0;
    let mut dt_new = -10.0;
    let (mut z, mut c2, mut c3) = (0.0, 0.5, 1.0 / 6.0);
    while (dt_new * inv_sqrt_mu - dt).abs() >= SMALL && iterations < max_iter {
        let x2 = x * x;
        z = x2 * alpha;
        (c2, c3) = stumpff(z);
        let r = x2 * c2 + rdotv * inv_sqrt_mu * x * (1.0 - z * c3) + r0_mag * (1.0 - z * c2);
        dt_new = x2 * x * c3 + rdotv * inv_sqrt_mu * x2 * c2 + r0_mag * x * (1.0 - z * c3);

        let mut x_new = x + (dt * sqrt_mu - dt_new) / r;
        if x_new < 0.0 && dt > 0.0 {
            x_new = x * 0.5;
        }
        x = x_new;
        iterations += 1;
    }

    let converged = (dt_new * inv_sqrt_mu - dt).abs() < SMALL;
    if !converged {
        warn!(iterations, dt, "universal-variable solve did not converge");
    }

    let x2 = x * x;
    let f = 1.0 - x2 * c2 / r0_mag;
    let g = dt - x2 * x * c3 * inv_sqrt_mu;
    let pos = f * r0 + g * v0;
    let r_mag = pos.norm();
    let g_dot = 1.0 - x2 * c2 / r_mag;
    let f_dot = sqrt_mu * x / (r0_mag * r_mag) * (z * c3 - 1.0);
    let vel = f_dot * r0 + g_dot * v0;

    KeplerSolution { pos, vel, iterations, converged }
}

// ---------------------------------------------------------------------------
// Two-body propagator
// ---------------------------------------------------------------------------

/// Unperturbed Keplerian motion from an epoch state.
#[derive(Debug, Clone)]
pub struct TwoBodyPropagator {
    epoch: OrbitalState,
    mu: f64,
    max_iter: usize,
    period: f64,
    ecc: f64,
}

impl TwoBodyPropagator {
    pub fn new(pos: Vector3<f64>, vel: Vector3<f64>, time: JulianDate) -> Self {
        Self::with_mu(OrbitalState { time, pos, vel }, MU_EARTH, DEFAULT_MAX_ITERATIONS)
    }

    pub fn with_mu(epoch: OrbitalState, mu: f64, max_iter: usize) -> Self {
        let period = rv2period(mu, &epoch.pos, &epoch.vel);
        let ecc = rv2ecc(mu, &epoch.pos, &epoch.vel);
        Self { epoch, mu, max_iter, period, ecc }
    }

    pub fn epoch(&self) -> &OrbitalState {
        &self.epoch
    }
}

impl Propagator for TwoBodyPropagator {
    fn propagate(&mut self, t: &JulianDate) -> (Vector3<f64>, Vector3<f64>) {
        let dt = t.seconds_since(&self.epoch.time);
        let s = vallado(self.mu, &self.epoch.pos, &self.epoch.vel, dt, self.max_iter);
        (s.pos, s.vel)
    }

    fn period(&self) -> Option<f64> {
        Some(self.period)
    }

    fn eccentricity(&self) -> Option<f64> {
        Some(self.ecc)
    }

    fn name(&self) -> &str {
        "two-body"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s1_state() -> (Vector3<f64>, Vector3<f64>) {
        (
            Vector3::new(-605_792.216_60, -5_870_229.511_08, 3_493_053.198_96),
            Vector3::new(-1_568.254_29, -3_702.348_91, -6_479.483_95),
        )
    }

    #[test]
    fn zero_step_is_identity() {
        let (r0, v0) = s1_state();
        let s = vallado(MU_EARTH, &r0, &v0, 0.0, 350);
        assert_eq!(s.pos, r0);
        assert_eq!(s.vel, v0);
        assert!(s.converged);
    }

    #[test]
    fn thousand_second_step() {
        let (r0, v0) = s1_state();
        let s = vallado(MU_EARTH, &r0, &v0, 1000.0, 350);
        let expected = Vector3::new(-1_533_838.933, -5_590_928.262, -3_677_189.271);
        for i in 0..3 {
            assert!((s.pos[i] - expected[i]).abs() < 1e-3, "axis {}: {}", i, s.pos[i]);
        }
        assert!(s.converged);
    }

    #[test]
    fn full_period_returns_to_start() {
        let (r0, v0) = s1_state();
        let period = rv2period(MU_EARTH, &r0, &v0);
        let s = vallado(MU_EARTH, &r0, &v0, period, 350);
        for i in 0..3 {
            assert!((s.pos[i] - r0[i]).abs() <= 1e-6, "axis {} off by {:e}", i, s.pos[i] - r0[i]);
            assert!((s.vel[i] - v0[i]).abs() <= 1e-9);
        }
    }

    #[test]
    fn backwards_then_forwards() {
        let (r0, v0) = s1_state();
        let back = vallado(MU_EARTH, &r0, &v0, -1234.5, 350);
        let fwd = vallado(MU_EARTH, &back.pos, &back.vel, 1234.5, 350);
        assert!((fwd.pos - r0).norm() < 1e-5);
    }

    #[test]
    fn multi_rev_reduces_modulo_period() {
        let (r0, v0) = s1_state();
        let period = rv2period(MU_EARTH, &r0, &v0);
        let long = vallado(MU_EARTH, &r0, &v0, 3.0 * period + 100.0, 350);
        let short = vallado(MU_EARTH, &r0, &v0, 100.0, 350);
        assert!((long.pos - short.pos).norm() < 1e-5);
    }

    #[test]
    fn hyperbola_conserves_energy() {
        let r0 = Vector3::new(-27_739_093.33, -2_692_255.91, 9_510_190.37);
        let v0 = Vector3::new(-1886.889, -2370.851, 5779.199);
        let s = vallado(MU_EARTH, &r0, &v0, 3600.0, 350);
        assert!(s.converged);
        let e0 = 0.5 * v0.norm_squared() - MU_EARTH / r0.norm();
        let e1 = 0.5 * s.vel.norm_squared() - MU_EARTH / s.pos.norm();
        assert!((e1 - e0).abs() / e0.abs() < 1e-9);
        let h0 = r0.cross(&v0);
        let h1 = s.pos.cross(&s.vel);
        assert!((h1 - h0).norm() / h0.norm() < 1e-9);
    }

    #[test]
    fn non_convergence_returns_partial_state() {
        let (r0, v0) = s1_state();
        let s = vallado(MU_EARTH, &r0, &v0, 2000.0, 1);
        assert!(!s.converged);
        assert_eq!(s.iterations, 1);
        assert!(s.pos.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn stumpff_series_matches_closed_form() {
        for z in [2e-6, -2e-6] {
            let (c2, c3) = stumpff(z);
            assert!((c2 - 0.5).abs() < 1e-6 && (c3 - 1.0 / 6.0).abs() < 1e-6);
        }
        let (c2, c3) = stumpff(5e-7);
        assert!((c2 - (0.5 - 5e-7 / 24.0)).abs() < 1e-15);
        assert!((c3 - (1.0 / 6.0 - 5e-7 / 120.0)).abs() < 1e-15);
    }

    #[test]
    fn propagator_uses_epoch_offset() {
        let (r0, v0) = s1_state();
        let t0 = JulianDate::j2000();
        let mut prop = TwoBodyPropagator::new(r0, v0, t0);
        let (p, _) = prop.propagate(&t0.add_seconds(1000.0));
        let direct = vallado(MU_EARTH, &r0, &v0, 1000.0, 350);
        assert!((p - direct.pos).norm() < 1e-6);
        assert!(prop.eccentricity().unwrap() < 1.0);
        assert!(prop.period().unwrap().is_finite());
    }
}
