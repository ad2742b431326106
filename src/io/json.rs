use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::math::JulianDate;
use crate::sim::Event;

/// When a scenario event fires: an absolute instant or seconds after the
/// scenario start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTime {
    Absolute(DateTime<Utc>),
    Offset(f64),
}

/// Scenario event as it appears in JSON:
/// `{"time": "2024-05-01T00:00:05Z", "type": "trackObject", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub time: RecordTime,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl EventRecord {
    pub fn time_at(&self, start: &JulianDate) -> JulianDate {
        match self.time {
            RecordTime::Absolute(dt) => JulianDate::from_datetime(&dt),
            RecordTime::Offset(seconds) => start.add_seconds(seconds),
        }
    }

    pub fn into_event(self, start: &JulianDate) -> Event {
        let time = self.time_at(start);
        Event::new(time, &self.kind, self.data)
    }
}

/// Parse a JSON array of event records.
pub fn parse_records(text: &str) -> Result<Vec<EventRecord>> {
    Ok(serde_json::from_str(text)?)
}

/// Parse a JSON array of event records into events relative to `start`.
pub fn events_from_json(text: &str, start: &JulianDate) -> Result<Vec<Event>> {
    Ok(parse_records(text)?
        .into_iter()
        .map(|record| record.into_event(start))
        .collect())
}
