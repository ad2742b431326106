pub mod config;
pub mod event;
pub mod observatory;
mod runner;
pub mod universe;
pub mod visibility;

pub use config::UniverseConfig;
pub use event::{Event, EventHandler, EventId, EventQueue, TRACK_OBJECT};
pub use observatory::Observatory;
pub use universe::{SatelliteOptions, Universe};
pub use visibility::{VisibilityClass, VisibilityHit, VisibilityReport};
