use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

use crate::physics::constants::{MU_EARTH, R_EARTH};

/// Default tolerance for the circular/equatorial branches of [`rv2coe`].
pub const ELEMENT_TOLERANCE: f64 = 1e-10;

/// Which angles are well defined for a given orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitType {
    EllipticalInclined,
    /// argp undefined: `nu` holds the argument of latitude.
    CircularInclined,
    /// raan and argp undefined: `nu` holds the true longitude.
    CircularEquatorial,
    /// raan undefined: `argp` holds the longitude of periapsis.
    EllipticalEquatorial,
}

/// Classical orbital elements (semi-latus rectum form, valid for all conics).
#[derive(Debug, Clone, Copy)]
pub struct ClassicalElements {
    pub p: f64,    // semi-latus rectum, m
    pub ecc: f64,  // eccentricity
    pub inc: f64,  // inclination, rad
    pub raan: f64, // right ascension of ascending node, rad
    pub argp: f64, // argument of periapsis, rad
    pub nu: f64,   // true anomaly, rad, (-pi, pi]
    pub orbit_type: OrbitType,
}

impl ClassicalElements {
    /// Convert an inertial state vector to elements (Vallado's RV2COE).
    pub fn from_state_vector_mu(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64, tol: f64) -> Self {
        let r = pos.norm();
        let v = vel.norm();
        let rdotv = pos.dot(vel);

        let h = pos.cross(vel);
        let h_mag = h.norm();
        let e_vec = ((v * v - mu / r) * pos - rdotv * vel) / mu;
        let ecc = e_vec.norm();

        if h_mag <= tol {
            // Rectilinear motion: only the eccentricity means anything.
            return ClassicalElements {
                p: 0.0,
                ecc,
                inc: 0.0,
                raan: 0.0,
                argp: 0.0,
                nu: 0.0,
                orbit_type: OrbitType::EllipticalInclined,
            };
        }

        let n = Vector3::new(-h.y, h.x, 0.0);
        let n_mag = n.norm();
        let p = h_mag * h_mag / mu;
        let inc = (h.z / h_mag).clamp(-1.0, 1.0).acos();
        let equatorial = inc < tol || (inc - PI).abs() < tol;

        let orbit_type = match (ecc < tol, equatorial) {
            (true, true) => OrbitType::CircularEquatorial,
            (true, false) => OrbitType::CircularInclined,
            (false, true) => OrbitType::EllipticalEquatorial,
            (false, false) => OrbitType::EllipticalInclined,
        };

        let raan = if n_mag > tol {
            let omega = (n.x / n_mag).clamp(-1.0, 1.0).acos();
            if n.y < 0.0 { TAU - omega } else { omega }
        } else {
            0.0
        };

        let (argp, nu) = match orbit_type {
            OrbitType::EllipticalInclined => {
                let w = angle_between(&n, &e_vec);
                let argp = if e_vec.z < 0.0 { TAU - w } else { w };
                (argp, true_anomaly(&e_vec, pos, rdotv))
            }
            OrbitType::EllipticalEquatorial => {
                let mut lonper = (e_vec.x / ecc).clamp(-1.0, 1.0).acos();
                if e_vec.y < 0.0 {
                    lonper = TAU - lonper;
                }
                if inc > PI / 2.0 {
                    lonper = TAU - lonper;
                }
                (lonper, true_anomaly(&e_vec, pos, rdotv))
            }
            OrbitType::CircularInclined => {
                let u = angle_between(&n, pos);
                (0.0, if pos.z < 0.0 { TAU - u } else { u })
            }
            OrbitType::CircularEquatorial => {
                let mut truelon = (pos.x / r).clamp(-1.0, 1.0).acos();
                if pos.y < 0.0 {
                    truelon = TAU - truelon;
                }
                if inc > PI / 2.0 {
                    truelon = TAU - truelon;
                }
                (0.0, truelon)
            }
        };

        ClassicalElements {
            p,
            ecc,
            inc,
            raan,
            argp,
            nu: wrap_pi(nu),
            orbit_type,
        }
    }

    pub fn from_state_vector(pos: &Vector3<f64>, vel: &Vector3<f64>) -> Self {
        Self::from_state_vector_mu(pos, vel, MU_EARTH, ELEMENT_TOLERANCE)
    }

    /// Convert elements back to an inertial state vector (perifocal rotation).
    pub fn to_state_vector_mu(&self, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let (snu, cnu) = self.nu.sin_cos();
        let r_pqw = self.p / (1.0 + self.ecc * cnu);
        let r_vec = Vector3::new(r_pqw * cnu, r_pqw * snu, 0.0);

        let sqrt_mu_p = (mu / self.p).sqrt();
        let v_vec = Vector3::new(-sqrt_mu_p * snu, sqrt_mu_p * (self.ecc + cnu), 0.0);

        let (sr, cr) = self.raan.sin_cos();
        let (sw, cw) = self.argp.sin_cos();
        let (si, ci) = self.inc.sin_cos();

        let rot = |v: &Vector3<f64>| -> Vector3<f64> {
            Vector3::new(
                (cr * cw - sr * sw * ci) * v.x + (-cr * sw - sr * cw * ci) * v.y,
                (sr * cw + cr * sw * ci) * v.x + (-sr * sw + cr * cw * ci) * v.y,
                (sw * si) * v.x + (cw * si) * v.y,
            )
        };

        (rot(&r_vec), rot(&v_vec))
    }

    pub fn to_state_vector(&self) -> (Vector3<f64>, Vector3<f64>) {
        self.to_state_vector_mu(MU_EARTH)
    }

    /// Semi-major axis; infinite for parabolas, negative for hyperbolas.
    pub fn sma(&self) -> f64 {
        let denom = 1.0 - self.ecc * self.ecc;
        if denom.abs() < ELEMENT_TOLERANCE {
            f64::INFINITY
        } else {
            self.p / denom
        }
    }

    /// `[p, e, i, raan, argp, nu]`
    pub fn to_array(&self) -> [f64; 6] {
        [self.p, self.ecc, self.inc, self.raan, self.argp, self.nu]
    }

    /// Circular orbit at the given altitude and inclination.
    pub fn circular(altitude: f64, inc: f64) -> Self {
        ClassicalElements {
            p: R_EARTH + altitude,
            ecc: 0.0,
            inc,
            raan: 0.0,
            argp: 0.0,
            nu: 0.0,
            orbit_type: OrbitType::CircularInclined,
        }
    }
}

/// `[p, e, i, raan, argp, nu]` for an inertial state vector.
pub fn rv2coe(mu: f64, pos: &Vector3<f64>, vel: &Vector3<f64>, tol: f64) -> [f64; 6] {
    ClassicalElements::from_state_vector_mu(pos, vel, mu, tol).to_array()
}

/// Inertial state vector for `[p, e, i, raan, argp, nu]`.
pub fn coe2rv(mu: f64, coe: &[f64; 6]) -> (Vector3<f64>, Vector3<f64>) {
    let [p, ecc, inc, raan, argp, nu] = *coe;
    ClassicalElements { p, ecc, inc, raan, argp, nu, orbit_type: OrbitType::EllipticalInclined }
        .to_state_vector_mu(mu)
}

/// Eccentricity magnitude for an inertial state vector.
pub fn rv2ecc(mu: f64, pos: &Vector3<f64>, vel: &Vector3<f64>) -> f64 {
    let r = pos.norm();
    let v2 = vel.norm_squared();
    (((v2 - mu / r) * pos - pos.dot(vel) * vel) / mu).norm()
}

/// Orbital period in seconds; `+inf` for open (e >= 1) trajectories.
pub fn rv2period(mu: f64, pos: &Vector3<f64>, vel: &Vector3<f64>) -> f64 {
    if rv2ecc(mu, pos, vel) >= 1.0 {
        return f64::INFINITY;
    }
    let sme = 0.5 * vel.norm_squared() - mu / pos.norm();
    let a = -mu / (2.0 * sme);
    TAU * (a.powi(3) / mu).sqrt()
}

fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a.dot(b) / (a.norm() * b.norm())).clamp(-1.0, 1.0).acos()
}

fn true_anomaly(e_vec: &Vector3<f64>, pos: &Vector3<f64>, rdotv: f64) -> f64 {
    let nu = angle_between(e_vec, pos);
    if rdotv < 0.0 { TAU - nu } else { nu }
}

/// Map an angle in `[0, 2pi)` onto `(-pi, pi]`.
fn wrap_pi(angle: f64) -> f64 {
    if angle > PI { angle - TAU } else { angle }
}
