//! Entry points tying parser, synthesizer and assembler together.
//!
//! These are the two operations an HTTP layer calls. Both are pure: time is
//! passed in, nothing is shared between calls, and the simulated delay comes
//! back as data.

use std::time::Duration;

use tracing::debug;

use crate::assembler::{assemble, MockResponse, QueryKind};
use crate::error::SynthError;
use crate::modifiers::Modifiers;
use crate::synth::{synthesize_instant, synthesize_range};

/// Answer a range query.
///
/// # Parameters
///
/// - `query` - Selector with pass-through labels and directives
/// - `start` - Range start, unix seconds
/// - `end` - Range end, unix seconds
/// - `step` - Resolution step
///
/// # Returns
///
/// Returns the `matrix` response (or the malformed body) with status and delay.
///
/// # Errors
///
/// Returns `SynthError` for unparseable queries, inverted value bounds and
/// invalid time ranges.
pub fn get_time_series_data(
    query: &str,
    start: i64,
    end: i64,
    step: Duration,
) -> Result<MockResponse, SynthError> {
    let modifiers = Modifiers::parse(query)?;
    debug!("range query seed={} start={start} end={end} step={step:?}", modifiers.raw_string());

    let series = if modifiers.directives().invalid_response_body {
        Vec::new()
    } else {
        synthesize_range(&modifiers, start, end, step)?
    };
    assemble(&series, QueryKind::Range, &modifiers)
}

/// Answer an instant query at `at` (unix seconds).
///
/// # Errors
///
/// Returns `SynthError` for unparseable queries and inverted value bounds.
pub fn get_instant_data(query: &str, at: i64) -> Result<MockResponse, SynthError> {
    let modifiers = Modifiers::parse(query)?;
    debug!("instant query seed={} at={at}", modifiers.raw_string());

    let series = if modifiers.directives().invalid_response_body {
        Vec::new()
    } else {
        synthesize_instant(&modifiers, at)?
    };
    assemble(&series, QueryKind::Instant, &modifiers)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    const TEST_QUERY: &str =
        "myQuery{other_label=5,latency_ms=1,range_latency_ms=1,series_count=1,test}";
    const TEST_QUERY_USAGE_CURVE: &str = r#"myQuery{other_label=5,latency_ms=1,range_latency_ms=1,series_count=2,line_pattern="usage_curve",test}"#;
    const TEST_QUERY_INVALID_RESPONSE: &str = "myQuery{invalid_response_body=1}";

    /// 1977-05-25T20:00:00Z
    const CURVE_START: i64 = 233_438_400;
    const SECONDS_PER_DAY: i64 = 86_400;

    fn parse_body(body: &str) -> Value {
        serde_json::from_str(body).expect("parse JSON")
    }

    /// Test range output layout for the reference query.
    #[test]
    fn test_get_time_series_data_random_vals() {
        let out =
            get_time_series_data(TEST_QUERY, 0, 3600, Duration::from_secs(1800)).expect("valid");
        assert_eq!(out.status_code, 200);
        assert_eq!(out.delay, Duration::from_millis(1));

        let prefix = r#"{"status":"success","data":{"resultType":"matrix","result":[{"metric":{"other_label":"5","latency_ms":"1","range_latency_ms":"1","series_count":"1","test":"","series_id":"0"},"values":[[0,""#;
        assert!(out.body.starts_with(prefix), "{}", out.body);

        let json = parse_body(&out.body);
        let values = json["data"]["result"][0]["values"].as_array().expect("values array");
        let timestamps: Vec<i64> = values.iter().filter_map(|v| v[0].as_i64()).collect();
        assert_eq!(timestamps, vec![0, 1800, 3600]);
        for v in values {
            let value: i64 = v[1].as_str().expect("string value").parse().expect("integer");
            assert!((0..=100).contains(&value));
        }
    }

    /// Test byte-identical output across calls.
    #[test]
    fn test_determinism() {
        let a = get_time_series_data(TEST_QUERY, 0, 7200, Duration::from_secs(60)).expect("ok");
        let b = get_time_series_data(TEST_QUERY, 0, 7200, Duration::from_secs(60)).expect("ok");
        assert_eq!(a, b);
    }

    /// Test the usage curve against the reference day span.
    #[test]
    fn test_get_time_series_data_usage_curve() {
        let out = get_time_series_data(
            TEST_QUERY_USAGE_CURVE,
            CURVE_START,
            CURVE_START + SECONDS_PER_DAY,
            Duration::from_secs((SECONDS_PER_DAY / 2) as u64),
        )
        .expect("valid");

        let json = parse_body(&out.body);
        let result = json["data"]["result"].as_array().expect("result array");
        assert_eq!(result.len(), 2);
        assert_eq!(
            result[0]["values"],
            serde_json::json!([[233_438_400, "100"], [233_481_600, "0"], [233_524_800, "100"]])
        );
        assert_eq!(result[1]["metric"]["line_pattern"], "usage_curve");
        assert_eq!(result[1]["metric"]["series_id"], "1");
        assert_eq!(result[1]["values"][1][1], "0");
        assert_ne!(result[1]["values"][0][1], "0");
        assert_eq!(result[1]["values"][0][1], result[1]["values"][2][1]);
    }

    /// Test the malformed body on both query kinds.
    #[test]
    fn test_invalid_response_body() {
        let out = get_time_series_data(TEST_QUERY_INVALID_RESPONSE, 0, 3600, Duration::from_secs(1800))
            .expect("valid");
        assert_eq!(out.status_code, 200);
        assert_eq!(out.body, "foo");

        let out = get_instant_data(TEST_QUERY_INVALID_RESPONSE, 0).expect("valid");
        assert_eq!(out.status_code, 200);
        assert_eq!(out.body, "foo");

        // The override wins over everything else, including bad bounds
        let out = get_instant_data(
            "q{invalid_response_body,series_count=3,min_value=9,max_value=1}",
            0,
        )
        .expect("valid");
        assert_eq!(out.body, "foo");
    }

    /// Test instant output for the reference query.
    #[test]
    fn test_get_instant_data() {
        let out = get_instant_data(TEST_QUERY, 0).expect("valid");
        assert_eq!(out.status_code, 200);

        let prefix = r#"{"status":"success","data":{"resultType":"vector","result":[{"metric":{"other_label":"5","latency_ms":"1","range_latency_ms":"1","series_count":"1","test":"","series_id":"0"},"value":[0,""#;
        assert!(out.body.starts_with(prefix), "{}", out.body);

        // Instant value equals the range value at the same timestamp
        let range =
            get_time_series_data(TEST_QUERY, 0, 3600, Duration::from_secs(1800)).expect("valid");
        let instant_json = parse_body(&out.body);
        let range_json = parse_body(&range.body);
        assert_eq!(instant_json["data"]["result"][0]["value"], range_json["data"]["result"][0]["values"][0]);
    }

    /// Test that generator failures surface as hard errors.
    #[test]
    fn test_errors() {
        assert!(matches!(get_instant_data("q{a=1", 0), Err(SynthError::Parse(_))));
        assert!(matches!(
            get_time_series_data("q{min_value=5,max_value=4}", 0, 60, Duration::from_secs(30)),
            Err(SynthError::Range { .. })
        ));
        assert!(matches!(
            get_time_series_data("q", 60, 0, Duration::from_secs(30)),
            Err(SynthError::InvertedTimeRange { .. })
        ));
    }
}
