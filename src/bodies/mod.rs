pub mod earth;
pub mod sun;

pub use earth::{gmst, Earth, EarthModel};
pub use sun::sun_position;
