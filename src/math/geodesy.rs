use std::f64::consts::TAU;

use nalgebra::{Matrix3, Vector3};

use crate::physics::constants::{R_EARTH, WGS84_FLATTENING};

/// Azimuth/elevation/range look angles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AzElRange {
    pub az: f64,    // deg, clockwise from north, [0, 360)
    pub el: f64,    // deg above the local horizon
    pub range: f64, // m
}

/// WGS-84 geodetic coordinates to Earth-fixed Cartesian.
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Vector3<f64> {
    let (slat, clat) = lat_deg.to_radians().sin_cos();
    let (slon, clon) = lon_deg.to_radians().sin_cos();
    let e2 = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);
    let n = R_EARTH / (1.0 - e2 * slat * slat).sqrt(); // prime-vertical radius
    Vector3::new(
        (n + alt_m) * clat * clon,
        (n + alt_m) * clat * slon,
        (n * (1.0 - e2) + alt_m) * slat,
    )
}

/// Columns are the South, East and Zenith unit vectors in Earth-fixed axes.
pub fn south_east_zenith_basis(lat_deg: f64, lon_deg: f64) -> Matrix3<f64> {
    let (slat, clat) = lat_deg.to_radians().sin_cos();
    let (slon, clon) = lon_deg.to_radians().sin_cos();
    let south = Vector3::new(slat * clon, slat * slon, -clat);
    let east = Vector3::new(-slon, clon, 0.0);
    let zenith = Vector3::new(clat * clon, clat * slon, slat);
    Matrix3::from_columns(&[south, east, zenith])
}

/// Topocentric South-East-Zenith vector to azimuth, elevation and range.
pub fn south_east_zenith_to_az_el(v: &Vector3<f64>) -> AzElRange {
    let range = v.norm();
    let az = if v.x == 0.0 && v.y == 0.0 {
        0.0
    } else {
        v.y.atan2(-v.x).rem_euclid(TAU)
    };
    let el = if range < 1e-9 {
        0.0
    } else {
        (v.z / range).clamp(-1.0, 1.0).asin()
    };
    AzElRange {
        az: az.to_degrees(),
        el: el.to_degrees(),
        range,
    }
}

/// Inverse of [`south_east_zenith_to_az_el`].
pub fn az_el_to_south_east_zenith(look: &AzElRange) -> Vector3<f64> {
    let (saz, caz) = look.az.to_radians().sin_cos();
    let (sel, cel) = look.el.to_radians().sin_cos();
    look.range * Vector3::new(-cel * caz, cel * saz, sel)
}
