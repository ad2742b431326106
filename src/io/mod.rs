pub mod csv;
pub mod json;

pub use csv::{write_pointing, write_pointing_file, PointingSample};
pub use json::{events_from_json, parse_records, EventRecord, RecordTime};
