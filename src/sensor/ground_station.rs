use nalgebra::{Matrix3, Vector3};

use crate::math::{geodetic_to_ecef, south_east_zenith_basis, south_east_zenith_to_az_el, AzElRange};
use crate::physics::constants::OMEGA_EARTH;

/// Fixed site on the WGS-84 ellipsoid.
///
/// Its node sits under the Earth node with local axes South, East, Zenith.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundStation {
    lat: f64, // deg, geodetic
    lon: f64, // deg
    alt: f64, // m above the ellipsoid
    ecef: Vector3<f64>,
    sez: Matrix3<f64>,
}

impl GroundStation {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat: lat_deg,
            lon: lon_deg,
            alt: alt_m,
            ecef: geodetic_to_ecef(lat_deg, lon_deg, alt_m),
            sez: south_east_zenith_basis(lat_deg, lon_deg),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn alt(&self) -> f64 {
        self.alt
    }

    /// Earth-fixed position, m.
    pub fn ecef(&self) -> &Vector3<f64> {
        &self.ecef
    }

    /// Columns are South, East, Zenith in Earth-fixed axes.
    pub fn sez_basis(&self) -> &Matrix3<f64> {
        &self.sez
    }

    /// Look angles to an Earth-fixed point.
    pub fn look_angles(&self, target_ecef: &Vector3<f64>) -> AzElRange {
        south_east_zenith_to_az_el(&(self.sez.transpose() * (target_ecef - self.ecef)))
    }

    /// Velocity due to Earth rotation, still in Earth-fixed axes.
    pub fn rotation_velocity(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, OMEGA_EARTH).cross(&self.ecef)
    }
}
