// ---------------------------------------------------------------------------
// Earth
// ---------------------------------------------------------------------------

pub const MU_EARTH: f64 = 3.986_004_418e14;      // m^3/s^2
pub const R_EARTH: f64 = 6_378_137.0;            // WGS-84 equatorial radius, m
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;
pub const OMEGA_EARTH: f64 = 7.292_115_146_7e-5; // rad/s about +Z

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;
pub const J2000_JD: f64 = 2_451_545.0;
/// TT - UTC, seconds (32.184 s + 37 leap seconds since 2017).
pub const TT_MINUS_UTC: f64 = 69.184;

// ---------------------------------------------------------------------------
// Solar system
// ---------------------------------------------------------------------------

pub const AU: f64 = 1.495_978_706_91e11;         // m
pub const EARTH_MOON_MASS_RATIO: f64 = 81.300_568;
pub const OBLIQUITY_J2000: f64 = 23.439_291_11;  // deg
