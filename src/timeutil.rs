//! Time utilities for parsing query time and step parameters.
//!
//! This module resolves the `time`, `start`, `end` and `step` request parameters
//! into unix seconds and durations, including relative expressions like
//! "now-15m".

use std::time::Duration as StdDuration;

use thiserror::Error;
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};

/// Errors from resolving time and step parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParamError {
    #[error("cannot parse {0:?} to a valid timestamp")]
    Timestamp(String),
    #[error("cannot parse {0:?} to a valid duration")]
    Step(String),
}

/// Resolve a time parameter to unix seconds.
///
/// Supports:
/// - UNIX seconds, integer or fractional (fractions are truncated)
/// - ISO-8601 (RFC3339)
/// - "now", "now-15m", "now-1h", "now-30s", "now-2d"
///
/// # Parameters
///
/// - `input` - Time expression string to resolve
/// - `now` - Reference time for relative expressions
///
/// # Returns
///
/// Returns the resolved timestamp in seconds.
///
/// # Errors
///
/// Returns `TimeParamError::Timestamp` if the format is not recognized.
pub fn resolve_timestamp(input: &str, now: OffsetDateTime) -> Result<i64, TimeParamError> {
    let s = input.trim();
    let invalid = || TimeParamError::Timestamp(s.to_string());

    // UNIX seconds
    if let Ok(secs) = s.parse::<i64>() {
        return Ok(secs);
    }
    if let Ok(secs) = s.parse::<f64>() {
        if secs.is_finite() && secs.abs() < i64::MAX as f64 {
            return Ok(secs.trunc() as i64);
        }
        return Err(invalid());
    }

    // ISO-8601
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(ts.unix_timestamp());
    }

    // now / now-<N><unit>
    if s == "now" {
        return Ok(now.unix_timestamp());
    }
    if let Some(rest) = s.strip_prefix("now-") {
        let (num, unit) = split_num_unit(rest).ok_or_else(invalid)?;
        let n = num.parse::<i64>().map_err(|_| invalid())?;
        let dur = match unit {
            "s" => Duration::seconds(n),
            "m" => Duration::minutes(n),
            "h" => Duration::hours(n),
            "d" => Duration::days(n),
            _ => return Err(invalid()),
        };
        return now.checked_sub(dur).map(OffsetDateTime::unix_timestamp).ok_or_else(invalid);
    }

    Err(invalid())
}

/// Parse a range step given as float seconds ("15", "0.5") or a duration ("30s", "5m").
///
/// # Errors
///
/// Returns `TimeParamError::Step` for unparseable or negative values.
pub fn parse_step(input: &str) -> Result<StdDuration, TimeParamError> {
    let s = input.trim();
    if let Ok(secs) = s.parse::<f64>() {
        return StdDuration::try_from_secs_f64(secs).map_err(|_| TimeParamError::Step(s.into()));
    }
    humantime::parse_duration(s).map_err(|_| TimeParamError::Step(s.into()))
}

fn split_num_unit(s: &str) -> Option<(&str, &str)> {
    let i = s.find(|c: char| !c.is_ascii_digit())?;
    Some((&s[..i], &s[i..]))
}
