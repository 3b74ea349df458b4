//! Timestamp normalization to naive UTC.
//!
//! OAI-PMH works exclusively in UTC, so every timestamp coming out of a
//! backend is converted to UTC and stripped of its offset.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{HarvesterError, Result};

/// Formats carrying an explicit offset, tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
];

/// Formats without an offset. These are taken to already be UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// The instant used when a timestamp is unknown: `0001-01-01T00:00:00`.
#[must_use]
pub fn zero_instant() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Parse an ISO-8601-ish timestamp and return it as naive UTC.
///
/// Accepts full RFC 3339 timestamps, offsets without a colon, space-separated
/// date and time, bare dates (`2020-05-01`), year-months (`2020-05`) and bare
/// years (`2020`). Partial dates resolve to the first instant they cover.
///
/// # Examples
/// ```
/// use metaharvest_harvester::temporal::parse_utc;
///
/// let ts = parse_utc("2019-03-01T12:00:00+02:00").unwrap();
/// assert_eq!(ts.to_string(), "2019-03-01 10:00:00");
/// ```
pub fn parse_utc(raw: &str) -> Result<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(HarvesterError::InvalidTimestamp(raw.to_string()));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc).naive_utc());
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Ok(parsed.with_timezone(&Utc).naive_utc());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    parse_partial_date(value)
        .map(|date| date.and_time(NaiveTime::MIN))
        .ok_or_else(|| HarvesterError::InvalidTimestamp(raw.to_string()))
}

/// Parse `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    let mut parts = value.splitn(2, '-');
    let year_part = parts.next()?;
    if year_part.len() != 4 {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(month) if month.len() == 2 => month.parse().ok()?,
        Some(_) => return None,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Normalize a timestamp, falling back to [`zero_instant`] when missing or unparseable.
pub fn normalize_or_zero(raw: Option<&str>) -> NaiveDateTime {
    match raw {
        Some(value) => parse_utc(value).unwrap_or_else(|_| {
            tracing::warn!(timestamp = value, "Unparseable timestamp, using zero instant");
            zero_instant()
        }),
        None => zero_instant(),
    }
}

/// Format an instant the way the registry query language expects.
#[must_use]
pub fn format_query_instant(instant: &NaiveDateTime) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S").to_string()
}
