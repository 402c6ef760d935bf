//! Response assembler.
//!
//! Wraps synthesized series into the Prometheus success envelope, or swaps in a
//! malformed body when asked to. The simulated delay is reported, never slept.

use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::SynthError;
use crate::modifiers::Modifiers;
use crate::series::{Label, SyntheticSeries};

/// Body returned in place of the JSON envelope for `invalid_response_body`.
pub const INVALID_RESPONSE_BODY: &str = "foo";

/// Status code reported when no `status_code` directive is given.
pub const DEFAULT_STATUS_CODE: u16 = 200;

/// Kind of query being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Single point in time, rendered as a `vector`.
    Instant,
    /// Points over a time range, rendered as a `matrix`.
    Range,
}

impl QueryKind {
    /// Prometheus `resultType` for this kind.
    pub const fn result_type(self) -> &'static str {
        match self {
            Self::Instant => "vector",
            Self::Range => "matrix",
        }
    }
}

/// A fully assembled response, ready for a transport to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    /// Response body, normally JSON.
    pub body: String,
    /// HTTP status code to reply with.
    pub status_code: u16,
    /// Delay the transport should apply before replying.
    pub delay: Duration,
}

/// Prometheus success envelope.
#[derive(Debug, Serialize)]
struct Envelope<T> {
    status: &'static str,
    data: ResultData<T>,
}

#[derive(Debug, Serialize)]
struct ResultData<T> {
    #[serde(rename = "resultType")]
    result_type: &'static str,
    result: Vec<T>,
}

#[derive(Debug, Serialize)]
struct MatrixSeries<'a> {
    metric: Metric<'a>,
    values: Vec<(i64, String)>,
}

#[derive(Debug, Serialize)]
struct VectorSeries<'a> {
    metric: Metric<'a>,
    value: (i64, String),
}

/// Label set serialized as a JSON object in label order.
#[derive(Debug)]
struct Metric<'a>(&'a [Label]);

impl Serialize for Metric<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for label in self.0 {
            map.serialize_entry(&label.name, &label.value)?;
        }
        map.end()
    }
}

/// Build the response for a set of synthesized series.
///
/// # Parameters
///
/// - `series` - Series in ascending `series_id` order
/// - `kind` - Whether this answers an instant or a range query
/// - `modifiers` - Parsed query, consulted for status, latency and body directives
///
/// # Returns
///
/// Returns the body, status code and advisory delay.
///
/// # Errors
///
/// Returns `SynthError::Encode` if the envelope cannot be serialized.
pub fn assemble(
    series: &[SyntheticSeries],
    kind: QueryKind,
    modifiers: &Modifiers,
) -> Result<MockResponse, SynthError> {
    let d = modifiers.directives();
    let status_code = d.status_code.unwrap_or(DEFAULT_STATUS_CODE);
    let delay = match kind {
        QueryKind::Instant => d.latency,
        QueryKind::Range => d.range_latency,
    }
    .unwrap_or_default();

    let body = if d.invalid_response_body {
        INVALID_RESPONSE_BODY.to_string()
    } else {
        match kind {
            QueryKind::Instant => render_vector(series)?,
            QueryKind::Range => render_matrix(series)?,
        }
    };

    Ok(MockResponse { body, status_code, delay })
}

fn render_vector(series: &[SyntheticSeries]) -> Result<String, serde_json::Error> {
    let result: Vec<VectorSeries<'_>> = series
        .iter()
        .filter_map(|s| {
            s.points.first().map(|p| VectorSeries { metric: Metric(&s.labels), value: p.to_pair() })
        })
        .collect();
    serde_json::to_string(&Envelope {
        status: "success",
        data: ResultData { result_type: QueryKind::Instant.result_type(), result },
    })
}

fn render_matrix(series: &[SyntheticSeries]) -> Result<String, serde_json::Error> {
    let result: Vec<MatrixSeries<'_>> = series
        .iter()
        .map(|s| MatrixSeries {
            metric: Metric(&s.labels),
            values: s.points.iter().map(|p| p.to_pair()).collect(),
        })
        .collect();
    serde_json::to_string(&Envelope {
        status: "success",
        data: ResultData { result_type: QueryKind::Range.result_type(), result },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Point;

    fn series() -> Vec<SyntheticSeries> {
        let labels = vec![Label::new("other_label", "5"), Label::new("test", "")];
        vec![
            SyntheticSeries::new(&labels, 0, vec![Point::new(0, 25), Point::new(1800, 92)]),
            SyntheticSeries::new(&labels, 1, vec![Point::new(0, 3), Point::new(1800, 4)]),
        ]
    }

    /// Test the exact matrix body layout.
    #[test]
    fn test_matrix_body() {
        let modifiers = Modifiers::parse("q{other_label=5,test}").expect("valid syntax");
        let response = assemble(&series(), QueryKind::Range, &modifiers).expect("encodes");

        assert_eq!(response.status_code, 200);
        assert_eq!(response.delay, Duration::ZERO);
        assert_eq!(
            response.body,
            r#"{"status":"success","data":{"resultType":"matrix","result":[{"metric":{"other_label":"5","test":"","series_id":"0"},"values":[[0,"25"],[1800,"92"]]},{"metric":{"other_label":"5","test":"","series_id":"1"},"values":[[0,"3"],[1800,"4"]]}]}}"#
        );
    }

    /// Test the exact vector body layout.
    #[test]
    fn test_vector_body() {
        let modifiers = Modifiers::parse("q{other_label=5,test}").expect("valid syntax");
        let response = assemble(&series()[..1], QueryKind::Instant, &modifiers).expect("encodes");
        assert_eq!(
            response.body,
            r#"{"status":"success","data":{"resultType":"vector","result":[{"metric":{"other_label":"5","test":"","series_id":"0"},"value":[0,"25"]}]}}"#
        );
    }

    /// Test that an empty result still produces a valid envelope.
    #[test]
    fn test_empty_result() {
        let response = assemble(&[], QueryKind::Range, &Modifiers::default()).expect("encodes");
        assert_eq!(response.body, r#"{"status":"success","data":{"resultType":"matrix","result":[]}}"#);
    }

    /// Test latency selection by query kind and status override.
    #[test]
    fn test_delay_and_status() {
        let modifiers = Modifiers::parse("q{latency_ms=5,range_latency_ms=9,status_code=503}")
            .expect("valid syntax");

        let instant = assemble(&[], QueryKind::Instant, &modifiers).expect("encodes");
        assert_eq!(instant.delay, Duration::from_millis(5));
        assert_eq!(instant.status_code, 503);

        let range = assemble(&[], QueryKind::Range, &modifiers).expect("encodes");
        assert_eq!(range.delay, Duration::from_millis(9));
        assert_eq!(range.status_code, 503);
    }

    /// Test the malformed body replaces the envelope but keeps the status.
    #[test]
    fn test_invalid_body() {
        let modifiers =
            Modifiers::parse("q{invalid_response_body=1,status_code=202}").expect("valid syntax");
        let response = assemble(&series(), QueryKind::Range, &modifiers).expect("encodes");

        assert_eq!(response.body, INVALID_RESPONSE_BODY);
        assert_eq!(response.status_code, 202);
        assert!(serde_json::from_str::<serde_json::Value>(&response.body).is_err());
    }
}
