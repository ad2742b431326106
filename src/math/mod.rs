pub mod geodesy;
pub mod lagrange;
pub mod rigid;
pub mod time;

pub use geodesy::{
    az_el_to_south_east_zenith, geodetic_to_ecef, south_east_zenith_basis,
    south_east_zenith_to_az_el, AzElRange,
};
pub use time::JulianDate;
