//! Calendar-day handling.
//!
//! Every date crossing the boundary is a calendar day in `YYYY-MM-DD` form.
//! Backends occasionally send full timestamps; those are accepted and the
//! time-of-day is dropped, so all comparisons stay at day granularity.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

pub const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid calendar day: {input:?} (expected YYYY-MM-DD)")]
pub struct DayParseError {
    pub input: String,
}

pub fn parse_day(raw: &str) -> Result<NaiveDate, DayParseError> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, DAY_FORMAT) {
        return Ok(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.date());
    }
    Err(DayParseError {
        input: raw.to_string(),
    })
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// `#[serde(with = "day::required")]` for mandatory day fields.
pub mod required {
    use super::{format_day, parse_day};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_day(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(default, with = "day::optional")]` for nullable day fields.
///
/// Empty strings are treated as absent, the way form payloads send cleared dates.
pub mod optional {
    use super::{format_day, parse_day};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        day: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match day {
            Some(day) => serializer.serialize_str(&format_day(*day)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_day(value).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_day() {
        let day = parse_day("2024-01-10").unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(format_day(day), "2024-01-10");
    }

    #[test]
    fn test_parse_timestamp_drops_time_of_day() {
        let day = parse_day("2024-02-01T23:59:59+00:00").unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let day = parse_day("2024-02-01T08:30:00").unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_day("01/10/2024").unwrap_err();
        assert_eq!(err.input, "01/10/2024");
    }
}
