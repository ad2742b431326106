use nalgebra::Vector3;

use crate::math::JulianDate;
use crate::physics::constants::R_EARTH;

/// Inertial position/velocity sample at an instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalState {
    pub time: JulianDate,
    pub pos: Vector3<f64>, // m, ECI
    pub vel: Vector3<f64>, // m/s, ECI
}

impl OrbitalState {
    pub fn altitude(&self) -> f64 {
        self.pos.norm() - R_EARTH
    }

    pub fn speed(&self) -> f64 {
        self.vel.norm()
    }
}

/// Trait for orbit propagators.
///
/// Implement this to plug a new source of inertial states into a satellite
/// object. `propagate` takes `&mut self` so implementations may cache work
/// between calls (see `LagrangeInterpolated`).
pub trait Propagator {
    /// Inertial `(position, velocity)` at `t`, in m and m/s.
    fn propagate(&mut self, t: &JulianDate) -> (Vector3<f64>, Vector3<f64>);

    /// Orbital period in seconds, when the model defines one.
    fn period(&self) -> Option<f64> {
        None
    }

    fn eccentricity(&self) -> Option<f64> {
        None
    }

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

impl Propagator for Box<dyn Propagator> {
    fn propagate(&mut self, t: &JulianDate) -> (Vector3<f64>, Vector3<f64>) {
        (**self).propagate(t)
    }

    fn period(&self) -> Option<f64> {
        (**self).period()
    }

    fn eccentricity(&self) -> Option<f64> {
        (**self).eccentricity()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parked;

    impl Propagator for Parked {
        fn propagate(&mut self, _t: &JulianDate) -> (Vector3<f64>, Vector3<f64>) {
            (Vector3::new(R_EARTH + 1000.0, 0.0, 0.0), Vector3::zeros())
        }
    }

    #[test]
    fn defaults_are_undefined() {
        let p = Parked;
        assert!(p.period().is_none());
        assert!(p.eccentricity().is_none());
        assert_eq!(p.name(), "unnamed");
    }

    #[test]
    fn boxed_propagator_delegates() {
        let mut boxed: Box<dyn Propagator> = Box::new(Parked);
        let (pos, _) = boxed.propagate(&JulianDate::j2000());
        let state = OrbitalState { time: JulianDate::j2000(), pos, vel: Vector3::zeros() };
        assert!((state.altitude() - 1000.0).abs() < 1e-9);
        assert_eq!(state.speed(), 0.0);
    }
}
