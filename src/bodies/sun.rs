use nalgebra::{Matrix3, Vector3};

use crate::math::JulianDate;
use crate::physics::constants::{AU, EARTH_MOON_MASS_RATIO, OBLIQUITY_J2000};

const ARCSEC_DEG: f64 = 1.0 / 3600.0;
const MOON_DISTANCE: f64 = 385_000.0e3; // m, mean
const KEPLER_TOLERANCE: f64 = 1e-14;

/// Geocentric Sun position in the J2000 equatorial frame, m.
///
/// Heliocentric Earth-Moon barycentre from the Simon et al. (1994) mean
/// elements, shifted to the geocentre with a low-precision lunar position.
/// Good to a few arcminutes over the twenty-first century.
pub fn sun_position(t: &JulianDate) -> Vector3<f64> {
    let tt = t.centuries_tt();
    let emb = earth_moon_barycentre(tt / 10.0);
    let earth = emb - moon_position_ecliptic(tt) / (1.0 + EARTH_MOON_MASS_RATIO);
    ecliptic_to_equatorial() * -earth
}

/// Heliocentric EMB position, J2000 ecliptic, `tm` in TT millennia.
fn earth_moon_barycentre(tm: f64) -> Vector3<f64> {
    let a = 1.000_001_017_8 * AU;
    let mean_longitude = (100.466_456_83 + 1_295_977_422.834_29 * ARCSEC_DEG * tm).to_radians();
    let e = 0.016_708_634_2 - 0.000_420_365_4 * tm;
    let perihelion = (102.937_348_08 + 11_612.352_9 * ARCSEC_DEG * tm).to_radians();
    let inc = (469.972_89 * ARCSEC_DEG * tm).to_radians();
    let node = (174.873_175_77 - 8_679.270_34 * ARCSEC_DEG * tm).to_radians();

    let m = (mean_longitude - perihelion).rem_euclid(std::f64::consts::TAU);
    let big_e = eccentric_anomaly(m, e);
    let (se, ce) = big_e.sin_cos();
    let in_plane = Vector3::new(a * (ce - e), a * (1.0 - e * e).sqrt() * se, 0.0);

    // perifocal -> ecliptic: R3(-node) R1(-inc) R3(-argp)
    let argp = perihelion - node;
    let (so, co) = node.sin_cos();
    let (si, ci) = inc.sin_cos();
    let (sw, cw) = argp.sin_cos();
    let pqw = Matrix3::new(
        co * cw - so * sw * ci, -co * sw - so * cw * ci, so * si,
        so * cw + co * sw * ci, -so * sw + co * cw * ci, -co * si,
        sw * si,                cw * si,                 ci,
    );
    pqw * in_plane
}

fn eccentric_anomaly(m: f64, e: f64) -> f64 {
    let mut big_e = m;
    for _ in 0..20 {
        let step = (big_e - e * big_e.sin() - m) / (1.0 - e * big_e.cos());
        big_e -= step;
        if step.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    big_e
}

/// Geocentric Moon, J2000 ecliptic, three-term longitude series.
fn moon_position_ecliptic(tt: f64) -> Vector3<f64> {
    let m_moon = (134.9 + 477_198.85 * tt).to_radians();
    let d = (297.85 + 445_267.11 * tt).to_radians();
    let f = (93.27 + 483_202.02 * tt).to_radians();
    let lon = (218.32 + 481_267.881 * tt + 6.29 * m_moon.sin() - 1.27 * (m_moon - 2.0 * d).sin()
        + 0.66 * (2.0 * d).sin())
    .to_radians();
    let lat = (5.13 * f.sin()).to_radians();
    let (sl, cl) = lon.sin_cos();
    let (sb, cb) = lat.sin_cos();
    MOON_DISTANCE * Vector3::new(cb * cl, cb * sl, sb)
}

fn ecliptic_to_equatorial() -> Matrix3<f64> {
    let (s, c) = OBLIQUITY_J2000.to_radians().sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
}
