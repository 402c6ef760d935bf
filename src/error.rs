//! Error types surfaced by the synthesis core.

use thiserror::Error;

use crate::modifiers::ParseError;

/// Hard failures of a synthesis request.
///
/// Simulated failures (malformed bodies, non-200 codes) are never reported
/// here; they are ordinary output requested through directives.
#[derive(Debug, Error)]
pub enum SynthError {
    /// The query selector could not be parsed.
    #[error("parse: {0}")]
    Parse(#[from] ParseError),
    /// `max_value` is below `min_value`.
    #[error("max_value {max} is below min_value {min}")]
    Range { min: i64, max: i64 },
    /// Range step is zero or below one second.
    #[error("step must be at least one second")]
    InvalidStep,
    /// Range end precedes its start.
    #[error("end timestamp {end} must not be before start time {start}")]
    InvertedTimeRange { start: i64, end: i64 },
    /// The range would produce more points per series than allowed.
    #[error("exceeded maximum resolution of {max} points per timeseries, got {requested}")]
    TooManyPoints { requested: u128, max: usize },
    /// All series together would hold more points than allowed.
    #[error("query would load {requested} samples, above the limit of {max}")]
    TooManySamples { requested: usize, max: usize },
    /// Response body serialization failed.
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}
