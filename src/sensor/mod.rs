pub mod eo;
pub mod gimbal;
pub mod ground_station;
pub mod regard;

pub use eo::ElectroOpticalSensor;
pub use gimbal::{AzElGimbal, GimbalType, TrackMode};
pub use ground_station::GroundStation;
pub use regard::{in_regard, FieldOfRegard};
