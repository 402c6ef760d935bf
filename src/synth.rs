//! Series synthesizer.
//!
//! Values are a pure function of the query's canonical string, the series id
//! and the timestamp, so identical requests always produce identical series
//! without any shared generator state.

use std::hash::Hasher;
use std::time::Duration;

use fnv::FnvHasher;
use tracing::debug;

use crate::error::SynthError;
use crate::modifiers::{LinePattern, Modifiers};
use crate::series::{Point, SyntheticSeries};

/// Maximum number of points per series in a range result.
pub const MAX_POINTS_PER_SERIES: usize = 11_000;

/// Maximum number of points across all series of one result.
pub const MAX_SAMPLES: usize = 5_000_000;

/// Salt separating the curve amplitude stream from per-point values.
const AMPLITUDE_SALT: i64 = i64::MIN;

/// Produces the value of one series at one timestamp.
///
/// Implementations must be deterministic: the same inputs always give the same
/// value, whatever thread or order they are called in.
pub trait ValueGenerator: Send + Sync + std::fmt::Debug {
    /// Value of series `series_id` at `timestamp` (unix seconds).
    fn value_at(&self, series_id: u64, timestamp: i64) -> i64;
}

/// Independent pseudo-random integers in `[min, max]`.
#[derive(Debug, Clone)]
pub struct RandomValues {
    seed: u64,
    min: i64,
    max: i64,
}

impl RandomValues {
    pub fn new(seed: u64, min: i64, max: i64) -> Self {
        Self { seed, min, max }
    }
}

impl ValueGenerator for RandomValues {
    fn value_at(&self, series_id: u64, timestamp: i64) -> i64 {
        reduce(mix(self.seed, series_id, timestamp), self.min, self.max)
    }
}

/// Triangular day curve over `[start, end]`.
///
/// Each series peaks at its own amplitude on both edges of the span and falls
/// linearly to zero at the midpoint. Series 0 peaks at `max`; every other
/// series gets a hash-derived amplitude in `[max(min, 1), max)`.
#[derive(Debug, Clone)]
pub struct UsageCurve {
    seed: u64,
    min: i64,
    max: i64,
    start: i64,
    end: i64,
}

impl UsageCurve {
    pub fn new(seed: u64, min: i64, max: i64, start: i64, end: i64) -> Self {
        Self { seed, min, max, start, end }
    }

    /// Peak value reached by series `series_id` at the span edges.
    pub fn amplitude(&self, series_id: u64) -> i64 {
        let low = self.min.max(1);
        if series_id == 0 || self.max <= low {
            return self.max;
        }

        let span = (i128::from(self.max) - i128::from(low)) as u128;
        let offset = 1 + u128::from(mix(self.seed, series_id, AMPLITUDE_SALT)) % span;
        (i128::from(self.max) - offset as i128) as i64
    }
}

impl ValueGenerator for UsageCurve {
    fn value_at(&self, series_id: u64, timestamp: i64) -> i64 {
        let amplitude = i128::from(self.amplitude(series_id));
        let width = i128::from(self.end) - i128::from(self.start);
        if width <= 0 {
            return amplitude as i64;
        }

        let distance = (2 * (i128::from(timestamp) - i128::from(self.start)) - width).abs();
        round_div(amplitude * distance, width) as i64
    }
}

/// Synthesize series for a range query.
///
/// # Parameters
///
/// - `modifiers` - Parsed query
/// - `start` - First timestamp (unix seconds, inclusive)
/// - `end` - Last timestamp (unix seconds, inclusive)
/// - `step` - Distance between points, whole seconds
///
/// # Returns
///
/// Returns `series_count` series in ascending id order, each with one point per
/// step from `start` to `end`, both endpoints included.
///
/// # Errors
///
/// Returns `SynthError::Range` if `max_value < min_value`, or a time axis error
/// for an inverted range, a sub-second step or too many points, and
/// `SynthError::TooManySamples` if all series together exceed `MAX_SAMPLES`.
pub fn synthesize_range(
    modifiers: &Modifiers,
    start: i64,
    end: i64,
    step: Duration,
) -> Result<Vec<SyntheticSeries>, SynthError> {
    check_bounds(modifiers)?;
    let axis = time_axis(start, end, step)?;
    let requested = modifiers.directives().series_count.saturating_mul(axis.len());
    if requested > MAX_SAMPLES {
        return Err(SynthError::TooManySamples { requested, max: MAX_SAMPLES });
    }
    Ok(build_series(modifiers, &axis, start, end))
}

/// Synthesize series for an instant query at `at`.
///
/// # Errors
///
/// Returns `SynthError::Range` if `max_value < min_value`.
pub fn synthesize_instant(
    modifiers: &Modifiers,
    at: i64,
) -> Result<Vec<SyntheticSeries>, SynthError> {
    check_bounds(modifiers)?;
    Ok(build_series(modifiers, &[at], at, at))
}

/// Timestamps every `step` seconds from `start`, always ending on `end`.
///
/// # Errors
///
/// Returns an error if `end < start`, `step` is below one second, or the axis
/// would exceed `MAX_POINTS_PER_SERIES`.
pub fn time_axis(start: i64, end: i64, step: Duration) -> Result<Vec<i64>, SynthError> {
    if end < start {
        return Err(SynthError::InvertedTimeRange { start, end });
    }
    if step.as_secs() == 0 {
        return Err(SynthError::InvalidStep);
    }

    let step = i64::try_from(step.as_secs()).unwrap_or(i64::MAX);
    let width = (i128::from(end) - i128::from(start)) as u128;
    let requested = width.div_ceil(step as u128) + 1;
    if requested > MAX_POINTS_PER_SERIES as u128 {
        return Err(SynthError::TooManyPoints { requested, max: MAX_POINTS_PER_SERIES });
    }

    let mut axis = Vec::with_capacity(requested as usize);
    let mut t = start;
    while t < end {
        axis.push(t);
        t = match t.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    axis.push(end);
    Ok(axis)
}

fn check_bounds(modifiers: &Modifiers) -> Result<(), SynthError> {
    let d = modifiers.directives();
    if d.max_value < d.min_value {
        return Err(SynthError::Range { min: d.min_value, max: d.max_value });
    }
    Ok(())
}

fn build_series(
    modifiers: &Modifiers,
    axis: &[i64],
    start: i64,
    end: i64,
) -> Vec<SyntheticSeries> {
    let d = modifiers.directives();
    let seed = seed_of(modifiers.raw_string());
    let generator: Box<dyn ValueGenerator> = match d.line_pattern {
        LinePattern::Random => Box::new(RandomValues::new(seed, d.min_value, d.max_value)),
        LinePattern::UsageCurve => {
            Box::new(UsageCurve::new(seed, d.min_value, d.max_value, start, end))
        }
    };

    debug!(
        "synthesizing {} series x {} points ({:?})",
        d.series_count,
        axis.len(),
        d.line_pattern
    );

    // Parsing guarantees the pinned range of ids does not overflow.
    let first_id = d.series_id.unwrap_or(0);
    (0..d.series_count as u64)
        .map(|index| first_id + index)
        .map(|id| {
            let points = axis.iter().map(|&t| Point::new(t, generator.value_at(id, t))).collect();
            SyntheticSeries::new(modifiers.labels(), id, points)
        })
        .collect()
}

fn seed_of(raw: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(raw.as_bytes());
    hasher.finish()
}

/// Hash `(seed, series_id, n)` to a well-spread 64-bit value.
fn mix(seed: u64, series_id: u64, n: i64) -> u64 {
    let mut hasher = FnvHasher::with_key(seed);
    hasher.write(&series_id.to_le_bytes());
    hasher.write(&n.to_le_bytes());
    finalize(hasher.finish())
}

/// splitmix64 finalizer; FNV alone leaves the low bits poorly mixed.
fn finalize(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Map `h` onto `[min, max]`; requires `min <= max`.
fn reduce(h: u64, min: i64, max: i64) -> i64 {
    let span = (i128::from(max) - i128::from(min) + 1) as u128;
    (i128::from(min) + (u128::from(h) % span) as i128) as i64
}

/// `n / d` rounded half away from zero; `d` must be positive.
fn round_div(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        -((-n + d / 2) / d)
    }
}
