//! Earth orientation: the inertial to Earth-fixed rotation.
//!
//! Two models are available. `Teme` rotates about the pole by Greenwich mean
//! sidereal time only (the pseudo-fixed frame SGP4 output lives in).
//! `Iau76Fk5` applies IAU-76 precession, a truncated IAU-1980 nutation series
//! and the equation of the equinoxes. Polar motion is ignored in both.

use std::f64::consts::TAU;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::JulianDate;
use crate::physics::constants::SECONDS_PER_DAY;

const ARCSEC: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Which rotation the Earth node uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarthModel {
    #[default]
    Teme,
    Iau76Fk5,
}

/// Current inertial/fixed rotation pair.
#[derive(Debug, Clone)]
pub struct Earth {
    model: EarthModel,
    r_if: Matrix3<f64>, // inertial -> fixed
    r_fi: Matrix3<f64>, // fixed -> inertial
}

impl Earth {
    pub fn new(model: EarthModel) -> Self {
        Self { model, r_if: Matrix3::identity(), r_fi: Matrix3::identity() }
    }

    pub fn model(&self) -> EarthModel {
        self.model
    }

    /// Recompute the rotation for `t`; returns `R_fi`, the node's local rotation.
    pub fn update(&mut self, t: &JulianDate) -> Matrix3<f64> {
        self.r_if = inertial_to_fixed(self.model, t);
        self.r_fi = self.r_if.transpose();
        self.r_fi
    }

    pub fn inertial_to_fixed(&self) -> &Matrix3<f64> {
        &self.r_if
    }

    pub fn fixed_to_inertial(&self) -> &Matrix3<f64> {
        &self.r_fi
    }

    // The Earth node sits at the world origin, so points and vectors share
    // the same rotation.

    pub fn transform_point_to_world(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.r_fi * p
    }

    pub fn transform_point_from_world(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.r_if * p
    }

    pub fn transform_vector_to_world(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.r_fi * v
    }

    pub fn transform_vector_from_world(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.r_if * v
    }
}

/// Inertial to Earth-fixed rotation at `t` for the given model.
pub fn inertial_to_fixed(model: EarthModel, t: &JulianDate) -> Matrix3<f64> {
    match model {
        EarthModel::Teme => rot3(gmst(t)),
        EarthModel::Iau76Fk5 => {
            let tt = t.centuries_tt();
            let nutation = nutation(tt);
            let gast = gmst(t) + nutation.equation_of_equinoxes;
            rot3(gast) * nutation.matrix * precession(tt)
        }
    }
}

/// Greenwich mean sidereal time (IAU-82), radians in `[0, 2pi)`.
pub fn gmst(t: &JulianDate) -> f64 {
    let tu = t.centuries_ut1();
    // The 876600 h * T term is whole days plus the seconds since noon.
    let seconds = 67_310.548_41
        + t.seconds_of_day()
        + (8_640_184.812_866 + (0.093_104 - 6.2e-6 * tu) * tu) * tu;
    (seconds.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_DAY) * TAU
}

/// IAU-76 precession from the J2000 mean equator to the mean equator of date.
pub fn precession(tt: f64) -> Matrix3<f64> {
    let zeta = (2306.2181 + (0.30188 + 0.017998 * tt) * tt) * tt * ARCSEC;
    let theta = (2004.3109 - (0.42665 + 0.041833 * tt) * tt) * tt * ARCSEC;
    let z = (2306.2181 + (1.09468 + 0.018203 * tt) * tt) * tt * ARCSEC;
    rot3(-z) * rot2(theta) * rot3(-zeta)
}

/// Mean-of-date to true-of-date rotation plus the equation of the equinoxes.
#[derive(Debug, Clone, Copy)]
pub struct Nutation {
    pub matrix: Matrix3<f64>,
    pub delta_psi: f64,             // rad
    pub delta_eps: f64,             // rad
    pub mean_obliquity: f64,        // rad
    pub equation_of_equinoxes: f64, // rad
}

// (l, l', F, D, Omega) multipliers; dpsi = (a + b T) sin, deps = (c + d T) cos, 0.1 mas
const NUTATION_TERMS: [([i32; 5], [f64; 4]); 10] = [
    ([0, 0, 0, 0, 1], [-171_996.0, -174.2, 92_025.0, 8.9]),
    ([0, 0, 2, -2, 2], [-13_187.0, -1.6, 5_736.0, -3.1]),
    ([0, 0, 2, 0, 2], [-2_274.0, -0.2, 977.0, -0.5]),
    ([0, 0, 0, 0, 2], [2_062.0, 0.2, -895.0, 0.5]),
    ([0, 1, 0, 0, 0], [1_426.0, -3.4, 54.0, -0.1]),
    ([1, 0, 0, 0, 0], [712.0, 0.1, -7.0, 0.0]),
    ([0, 1, 2, -2, 2], [-517.0, 1.2, 224.0, -0.6]),
    ([0, 0, 2, 0, 1], [-386.0, -0.4, 200.0, 0.0]),
    ([1, 0, 2, 0, 2], [-301.0, 0.0, 129.0, -0.1]),
    ([0, -1, 2, -2, 2], [217.0, -0.5, -95.0, 0.3]),
];

pub fn nutation(tt: f64) -> Nutation {
    let eps_bar = (84_381.448 + (-46.8150 + (-0.000_59 + 0.001_813 * tt) * tt) * tt) * ARCSEC;

    // Delaunay arguments, degrees
    let rev = 360.0;
    let delaunay = [
        134.962_981_39 + ((1325.0 * rev + 198.867_398_1) + (0.008_697_2 + 1.78e-5 * tt) * tt) * tt,
        357.527_723_33 + ((99.0 * rev + 359.050_340_0) + (-0.000_160_3 - 3.3e-6 * tt) * tt) * tt,
        93.271_910_28 + ((1342.0 * rev + 82.017_538_1) + (-0.003_682_5 + 3.1e-6 * tt) * tt) * tt,
        297.850_363_06 + ((1236.0 * rev + 307.111_480_0) + (-0.001_914_2 + 5.3e-6 * tt) * tt) * tt,
        125.044_522_22 + (-(5.0 * rev + 134.136_260_8) + (0.002_070_8 + 2.2e-6 * tt) * tt) * tt,
    ]
    .map(|deg| deg.rem_euclid(360.0).to_radians());

    let (mut dpsi, mut deps) = (0.0, 0.0);
    for (mult, [a, b, c, d]) in NUTATION_TERMS {
        let arg: f64 = mult.iter().zip(delaunay.iter()).map(|(&m, &x)| m as f64 * x).sum();
        dpsi += (a + b * tt) * arg.sin();
        deps += (c + d * tt) * arg.cos();
    }
    let delta_psi = dpsi * 1e-4 * ARCSEC;
    let delta_eps = deps * 1e-4 * ARCSEC;
    let eps = eps_bar + delta_eps;

    let omega = delaunay[4];
    let equation_of_equinoxes = delta_psi * eps_bar.cos()
        + (0.002_64 * omega.sin() + 0.000_063 * (2.0 * omega).sin()) * ARCSEC;

    Nutation {
        matrix: rot1(-eps) * rot3(-delta_psi) * rot1(eps_bar),
        delta_psi,
        delta_eps,
        mean_obliquity: eps_bar,
        equation_of_equinoxes,
    }
}

// Frame (passive) rotations.

fn rot1(a: f64) -> Matrix3<f64> {
    let (s, c) = a.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

fn rot2(a: f64) -> Matrix3<f64> {
    let (s, c) = a.sin_cos();
    Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
}

fn rot3(a: f64) -> Matrix3<f64> {
    let (s, c) = a.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}
