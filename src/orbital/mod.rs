pub mod elements;
pub mod ephemeris;
pub mod interpolated;
pub mod propagator;
pub mod tle;
pub mod two_body;

pub use elements::{coe2rv, rv2coe, rv2ecc, rv2period, ClassicalElements, OrbitType};
pub use ephemeris::EphemerisPropagator;
pub use interpolated::{LagrangeConfig, LagrangeInterpolated};
pub use propagator::{OrbitalState, Propagator};
pub use tle::Sgp4Propagator;
pub use two_body::{vallado, KeplerSolution, TwoBodyPropagator};
