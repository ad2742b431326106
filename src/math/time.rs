use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use crate::physics::constants::{DAYS_PER_JULIAN_CENTURY, SECONDS_PER_DAY, TT_MINUS_UTC};

/// Julian day number of the Unix epoch at noon (JD 2440587.5 is midnight).
const UNIX_EPOCH_JULIAN_DAY: i64 = 2_440_587;
const J2000_JULIAN_DAY: i64 = 2_451_545;

// ---------------------------------------------------------------------------
// JulianDate: integer day + seconds of day
// ---------------------------------------------------------------------------

/// A UTC instant held as (Julian day number, seconds since that day's noon).
///
/// Keeping the day as an integer means differences across multi-year spans
/// keep full sub-microsecond resolution in the seconds part. The seconds
/// field is always normalised into `[0, 86400)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct JulianDate {
    day: i64,
    seconds: f64, // s since noon of `day`
}

impl JulianDate {
    pub fn new(day: i64, seconds: f64) -> Self {
        let carry = (seconds / SECONDS_PER_DAY).floor();
        let mut day = day + carry as i64;
        let mut seconds = seconds - carry * SECONDS_PER_DAY;
        // Rounding can land exactly on the upper bound.
        if seconds >= SECONDS_PER_DAY {
            day += 1;
            seconds -= SECONDS_PER_DAY;
        }
        Self { day, seconds }
    }

    /// J2000.0 epoch (2000-01-01T12:00:00 UTC, ignoring the TT offset).
    pub fn j2000() -> Self {
        Self::new(J2000_JULIAN_DAY, 0.0)
    }

    pub fn from_julian_days(jd: f64) -> Self {
        let day = jd.floor();
        Self::new(day as i64, (jd - day) * SECONDS_PER_DAY)
    }

    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        // Seconds counted from the noon preceding the Unix epoch.
        let secs = dt.timestamp() + (SECONDS_PER_DAY as i64) / 2;
        let day = UNIX_EPOCH_JULIAN_DAY + secs.div_euclid(SECONDS_PER_DAY as i64);
        let sod = secs.rem_euclid(SECONDS_PER_DAY as i64) as f64
            + dt.timestamp_subsec_nanos() as f64 * 1e-9;
        Self::new(day, sod)
    }

    /// Convenience constructor for whole-second UTC calendar instants.
    pub fn from_utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .map(|dt| Self::from_datetime(&dt))
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        let whole = self.seconds.floor();
        let nanos = ((self.seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
        let secs = (self.day - UNIX_EPOCH_JULIAN_DAY) * SECONDS_PER_DAY as i64
            - (SECONDS_PER_DAY as i64) / 2
            + whole as i64;
        DateTime::from_timestamp(secs, nanos).unwrap_or_default()
    }

    pub fn day(&self) -> i64 {
        self.day
    }

    pub fn seconds_of_day(&self) -> f64 {
        self.seconds
    }

    /// Julian date as a single float (loses precision; use for slow-varying models only).
    pub fn julian_days(&self) -> f64 {
        self.day as f64 + self.seconds / SECONDS_PER_DAY
    }

    pub fn add_seconds(&self, seconds: f64) -> Self {
        Self::new(self.day, self.seconds + seconds)
    }

    /// `self - earlier` in seconds.
    pub fn seconds_since(&self, earlier: &JulianDate) -> f64 {
        (self.day - earlier.day) as f64 * SECONDS_PER_DAY + (self.seconds - earlier.seconds)
    }

    /// Days since J2000.0 on the UTC scale.
    pub fn days_since_j2000(&self) -> f64 {
        (self.day - J2000_JULIAN_DAY) as f64 + self.seconds / SECONDS_PER_DAY
    }

    /// Julian centuries since J2000.0, UT1 taken equal to UTC.
    pub fn centuries_ut1(&self) -> f64 {
        self.days_since_j2000() / DAYS_PER_JULIAN_CENTURY
    }

    /// Julian centuries since J2000.0 on the TT scale (TDB taken equal to TT).
    pub fn centuries_tt(&self) -> f64 {
        (self.days_since_j2000() + TT_MINUS_UTC / SECONDS_PER_DAY) / DAYS_PER_JULIAN_CENTURY
    }

    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.day
            .cmp(&other.day)
            .then_with(|| self.seconds.total_cmp(&other.seconds))
    }
}

impl fmt::Display for JulianDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%dT%H:%M:%S%.3fZ"))
    }
}

impl From<DateTime<Utc>> for JulianDate {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(&dt)
    }
}
