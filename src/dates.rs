use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

// Upstream payloads carry UTC timestamps in one of two shapes; both are tried
// in order before falling back to a date-only salvage.
const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.3fZ"];

/// Outcome of parsing an upstream date string.
///
/// `DateOnly` is the degraded-success path: the time-of-day could not be
/// recovered, so only the calendar date is reported rather than fabricating a
/// midnight timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    Timestamp(DateTime<Utc>),
    DateOnly(NaiveDate),
}

impl ParsedDate {
    /// The full instant, when one was recovered.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            ParsedDate::Timestamp(dt) => Some(*dt),
            ParsedDate::DateOnly(_) => None,
        }
    }

    pub fn is_date_only(&self) -> bool {
        matches!(self, ParsedDate::DateOnly(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized date string: {0:?}")]
    Unrecognized(String),
}

/// Parse an upstream date string.
///
/// Attempts whole-second then millisecond ISO-8601 UTC formats; if neither
/// matches, splits on the `T` separator and salvages the date component.
/// Only when all three strategies fail does this return
/// [`ParseError::Unrecognized`]; the result is never defaulted to "now" or
/// epoch zero.
pub fn parse(raw: &str) -> Result<ParsedDate, ParseError> {
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ParsedDate::Timestamp(naive.and_utc()));
        }
    }
    if let Some(date) = salvage_date(raw) {
        return Ok(ParsedDate::DateOnly(date));
    }
    Err(ParseError::Unrecognized(raw.to_string()))
}

fn salvage_date(raw: &str) -> Option<NaiveDate> {
    let (date_part, _) = raw.split_once('T')?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
