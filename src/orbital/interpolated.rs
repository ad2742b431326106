use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::propagator::Propagator;
use crate::math::{lagrange, JulianDate};

/// Half-width of the central difference used for the cached velocity, s.
const VELOCITY_STEP: f64 = 0.5;
/// Slack on the window edges so sample times that land exactly on an edge
/// are not lost to rounding in the day/seconds arithmetic.
const EDGE_SLACK: f64 = 1e-9;

/// Sliding-window settings for [`LagrangeInterpolated`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LagrangeConfig {
    /// Samples held in the window.
    pub samples: usize,
    /// Polynomial degree; clamped to `samples - 1` by the interpolator.
    pub degree: usize,
    /// Samples placed before the requested time when the window is refilled.
    /// `(samples - 1) / 2` centres the window on that time; the default of 1
    /// keeps most of the window ahead of it.
    pub lookbehind: usize,
    /// Sample spacing when the inner propagator has no finite period, s.
    pub default_interval: f64,
}

impl Default for LagrangeConfig {
    fn default() -> Self {
        Self { samples: 7, degree: 6, lookbehind: 1, default_interval: 100.0 }
    }
}

/// Caches an expensive propagator behind a Lagrange polynomial.
///
/// The inner propagator is only evaluated when the requested time leaves the
/// current window, and then exactly `samples` times.
pub struct LagrangeInterpolated<P: Propagator = Box<dyn Propagator>> {
    inner: P,
    config: LagrangeConfig,
    interval: f64,              // s
    epoch: Option<JulianDate>, // absolute time of times[0]
    times: Vec<f64>,            // s from epoch
    positions: Vec<f64>,        // x,y,z interleaved
    refreshes: usize,
}

impl<P: Propagator> LagrangeInterpolated<P> {
    /// Sample interval is a sixtieth of the inner period, or
    /// `config.default_interval` when that period is not finite.
    pub fn new(inner: P, config: LagrangeConfig) -> Self {
        let interval = match inner.period() {
            Some(period) if period.is_finite() && period > 0.0 => period / 60.0,
            _ => config.default_interval,
        };
        Self::with_interval(inner, interval, config)
    }

    pub fn with_interval(inner: P, interval: f64, config: LagrangeConfig) -> Self {
        let samples = config.samples.max(1);
        Self {
            inner,
            config: LagrangeConfig { samples, ..config },
            interval,
            epoch: None,
            times: Vec::with_capacity(samples),
            positions: Vec::with_capacity(3 * samples),
            refreshes: 0,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn config(&self) -> &LagrangeConfig {
        &self.config
    }

    /// Absolute time of the first sample in the window, once filled.
    pub fn epoch(&self) -> Option<&JulianDate> {
        self.epoch.as_ref()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of times the window has been refilled.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    /// Offset of `t` into the current window, or `None` when a refill is due.
    fn window_offset(&self, t: &JulianDate) -> Option<f64> {
        let epoch = self.epoch?;
        if self.times.len() < self.config.samples {
            return None;
        }
        let dt = t.seconds_since(&epoch);
        let first = self.times[0];
        let last = self.times[self.times.len() - 1];
        if dt < first - EDGE_SLACK || dt > last + EDGE_SLACK {
            None
        } else {
            Some(dt)
        }
    }

    fn refill(&mut self, t: &JulianDate) {
        let lookbehind = self.config.lookbehind.min(self.config.samples - 1);
        let start = t.add_seconds(-(lookbehind as f64) * self.interval);

        self.times.clear();
        self.positions.clear();
        for i in 0..self.config.samples {
            let offset = i as f64 * self.interval;
            let (pos, _) = self.inner.propagate(&start.add_seconds(offset));
            self.times.push(offset);
            self.positions.extend(pos.iter().copied());
        }
        self.epoch = Some(start);
        self.refreshes += 1;
        debug!(
            propagator = self.inner.name(),
            start = %start,
            interval = self.interval,
            refreshes = self.refreshes,
            "lagrange window refilled"
        );
    }

    fn evaluate(&self, dt: f64) -> Vector3<f64> {
        lagrange::interpolate(&self.times, &self.positions, dt, self.config.degree)
    }
}

impl<P: Propagator> Propagator for LagrangeInterpolated<P> {
    fn propagate(&mut self, t: &JulianDate) -> (Vector3<f64>, Vector3<f64>) {
        let dt = match self.window_offset(t) {
            Some(dt) => dt,
            None => {
                self.refill(t);
                self.window_offset(t).unwrap_or(0.0)
            }
        };
        let pos = self.evaluate(dt);
        let vel = (self.evaluate(dt + VELOCITY_STEP) - self.evaluate(dt - VELOCITY_STEP))
            / (2.0 * VELOCITY_STEP);
        (pos, vel)
    }

    fn period(&self) -> Option<f64> {
        self.inner.period()
    }

    fn eccentricity(&self) -> Option<f64> {
        self.inner.eccentricity()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::orbital::two_body::TwoBodyPropagator;

    /// Counts calls into the wrapped propagator.
    struct Counting {
        inner: TwoBodyPropagator,
        calls: Rc<Cell<usize>>,
    }

    impl Propagator for Counting {
        fn propagate(&mut self, t: &JulianDate) -> (Vector3<f64>, Vector3<f64>) {
            self.calls.set(self.calls.get() + 1);
            self.inner.propagate(t)
        }

        fn period(&self) -> Option<f64> {
            self.inner.period()
        }
    }

    fn counting() -> (Counting, Rc<Cell<usize>>, TwoBodyPropagator) {
        let r0 = Vector3::new(-605_792.216_60, -5_870_229.511_08, 3_493_053.198_96);
        let v0 = Vector3::new(-1_568.254_29, -3_702.348_91, -6_479.483_95);
        let truth = TwoBodyPropagator::new(r0, v0, JulianDate::j2000());
        let calls = Rc::new(Cell::new(0));
        (Counting { inner: truth.clone(), calls: calls.clone() }, calls, truth)
    }

    #[test]
    fn window_refills_only_on_exit() {
        let (inner, calls, _) = counting();
        let mut cache = LagrangeInterpolated::with_interval(inner, 60.0, LagrangeConfig::default());
        let t = JulianDate::j2000().add_seconds(1_000.0);

        for k in 0..=30 {
            cache.propagate(&t.add_seconds(10.0 * k as f64));
        }
        assert_eq!(calls.get(), 7, "one refill for t..t+300");
        assert_eq!(cache.refreshes(), 1);

        cache.propagate(&t.add_seconds(400.0));
        assert_eq!(calls.get(), 14, "leaving the window refills once");
        assert_eq!(cache.refreshes(), 2);
    }

    #[test]
    fn going_backwards_refills() {
        let (inner, calls, _) = counting();
        let mut cache = LagrangeInterpolated::with_interval(inner, 60.0, LagrangeConfig::default());
        let t = JulianDate::j2000();
        cache.propagate(&t);
        cache.propagate(&t.add_seconds(-30.0));
        assert_eq!(calls.get(), 7, "lookbehind sample covers t-60");
        cache.propagate(&t.add_seconds(-61.0));
        assert_eq!(calls.get(), 14);
    }

    #[test]
    fn tracks_the_inner_orbit() {
        let (inner, _, mut truth) = counting();
        let mut cache = LagrangeInterpolated::new(inner, LagrangeConfig::default());
        let period = truth.period().unwrap();
        assert!((cache.interval() - period / 60.0).abs() < 1e-9);

        let t0 = JulianDate::j2000().add_seconds(500.0);
        cache.propagate(&t0);
        for k in 0..20 {
            let t = t0.add_seconds(13.7 * k as f64);
            let (p, v) = cache.propagate(&t);
            let (pt, vt) = truth.propagate(&t);
            assert!((p - pt).norm() < 1.0, "k={} position error {:.4} m", k, (p - pt).norm());
            assert!((v - vt).norm() < 0.01, "k={} velocity error {:.5} m/s", k, (v - vt).norm());
        }
    }

    #[test]
    fn centred_window_with_wider_lookbehind() {
        let (inner, _, _) = counting();
        let config = LagrangeConfig { lookbehind: 3, ..LagrangeConfig::default() };
        let mut cache = LagrangeInterpolated::with_interval(inner, 60.0, config);
        let t = JulianDate::j2000();
        cache.propagate(&t);
        let epoch = *cache.epoch().unwrap();
        assert!((t.seconds_since(&epoch) - 180.0).abs() < 1e-9);
        assert_eq!(cache.times().len(), 7);
        assert!((cache.times()[6] - 360.0).abs() < 1e-12);
    }

    struct Unbounded;

    impl Propagator for Unbounded {
        fn propagate(&mut self, _t: &JulianDate) -> (Vector3<f64>, Vector3<f64>) {
            (Vector3::zeros(), Vector3::zeros())
        }
    }

    #[test]
    fn falls_back_to_default_interval() {
        let cache = LagrangeInterpolated::new(Unbounded, LagrangeConfig::default());
        assert_eq!(cache.interval(), 100.0);
        assert!(cache.epoch().is_none());
    }
}
