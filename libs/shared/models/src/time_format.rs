//! `HH:MM` wire format for times of day.
//!
//! chrono's default `NaiveTime` serialization includes seconds, the booking
//! API does not. Parsing also accepts `HH:MM:SS` since some hospital systems
//! send it.

use chrono::NaiveTime;
use serde::{de, Deserialize, Deserializer, Serializer};

pub const TIME_FORMAT: &str = "%H:%M";

pub fn format(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
}

pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(time))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(|e| de::Error::custom(format!("invalid time {:?}: {}", raw, e)))
}
