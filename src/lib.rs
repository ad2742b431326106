//! Simulation kernel for a space-situational-awareness sandbox.
//!
//! A [`Universe`] owns a scene graph of Earth, Sun, ground sites, satellites
//! and ground observatories (site, az/el gimbal, electro-optical sensor) and
//! advances it to caller-supplied times. Scheduled events fire before each
//! tick's state updates.

pub mod bodies;
pub mod error;
pub mod io;
pub mod math;
pub mod object;
pub mod orbital;
pub mod physics;
pub mod scene;
pub mod sensor;
pub mod sim;

pub use error::{KernelError, Result};
pub use math::{AzElRange, JulianDate};
pub use object::{Kind, Orientation, SimObject};
pub use orbital::{OrbitalState, Propagator};
pub use scene::{ObjectId, ReferenceFrame};
pub use sim::{Event, Observatory, SatelliteOptions, Universe, UniverseConfig};
