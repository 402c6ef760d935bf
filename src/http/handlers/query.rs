//! Synthetic query handlers for instant and range queries.
//!
//! Both endpoints accept GET query strings and POST form bodies, as the
//! Prometheus HTTP API does.

use std::fmt::Display;

use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::assembler::MockResponse;
use crate::engine::{get_instant_data, get_time_series_data};
use crate::http::handlers::health::maybe_latency_and_error;
use crate::http::state::AppState;
use crate::http::types::{PromApiResponse, QueryParams, QueryRangeParams};
use crate::timeutil::{parse_step, resolve_timestamp};

/// Handle instant queries passed as URL parameters.
pub async fn query(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Response {
    instant(&state, params).await
}

/// Handle instant queries passed as a form body.
pub async fn query_form(
    State(state): State<AppState>,
    Form(params): Form<QueryParams>,
) -> Response {
    instant(&state, params).await
}

/// Handle range queries passed as URL parameters.
pub async fn query_range(
    State(state): State<AppState>,
    Query(params): Query<QueryRangeParams>,
) -> Response {
    range(&state, params).await
}

/// Handle range queries passed as a form body.
pub async fn query_range_form(
    State(state): State<AppState>,
    Form(params): Form<QueryRangeParams>,
) -> Response {
    range(&state, params).await
}

/// Resolve the evaluation time and synthesize a `vector` response.
async fn instant(state: &AppState, params: QueryParams) -> Response {
    if let Err(code) = maybe_latency_and_error(state).await {
        return (code, "simulated failure").into_response();
    }

    let at = match params.time.as_deref() {
        Some(time) => match resolve_timestamp(time, state.now()) {
            Ok(at) => at,
            Err(e) => return build_error_response(e),
        },
        None => state.now().unix_timestamp(),
    };

    match get_instant_data(&params.query, at) {
        Ok(response) => send(response).await,
        Err(e) => build_error_response(e),
    }
}

/// Resolve start, end and step and synthesize a `matrix` response.
async fn range(state: &AppState, params: QueryRangeParams) -> Response {
    if let Err(code) = maybe_latency_and_error(state).await {
        return (code, "simulated failure").into_response();
    }

    let now = state.now();
    let resolved = resolve_timestamp(&params.start, now).and_then(|start| {
        let end = resolve_timestamp(&params.end, now)?;
        let step = parse_step(&params.step)?;
        Ok((start, end, step))
    });
    let (start, end, step) = match resolved {
        Ok(resolved) => resolved,
        Err(e) => return build_error_response(e),
    };

    match get_time_series_data(&params.query, start, end, step) {
        Ok(response) => send(response).await,
        Err(e) => build_error_response(e),
    }
}

/// Honor the simulated delay, then reply with the synthesized status and body.
async fn send(response: MockResponse) -> Response {
    if !response.delay.is_zero() {
        debug!("delaying response by {:?}", response.delay);
        sleep(response.delay).await;
    }

    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::OK);
    (status, [(header::CONTENT_TYPE, "application/json")], response.body).into_response()
}

/// Build an error response for rejected queries.
fn build_error_response(error: impl Display) -> Response {
    warn!("query error: {}", error);

    let message = error.to_string();
    (StatusCode::BAD_REQUEST, Json(PromApiResponse::error("bad_data", &message))).into_response()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::macros::datetime;

    use super::*;

    const TEST_QUERY: &str =
        "myQuery{other_label=5,latency_ms=1,range_latency_ms=1,series_count=1,test}";

    fn create_test_state() -> AppState {
        AppState::builder()
            .with_fixed_now(datetime!(2022-01-01 00:00:00 UTC))
            .build()
            .expect("valid configuration")
    }

    async fn read_body(response: Response) -> (StatusCode, String) {
        let (parts, body) = response.into_parts();
        let body_bytes = axum::body::to_bytes(body, usize::MAX).await.expect("read body");
        (parts.status, String::from_utf8(body_bytes.to_vec()).expect("utf-8 body"))
    }

    /// Test instant query with explicit time.
    #[tokio::test]
    async fn test_query_with_time() {
        let params = QueryParams { query: TEST_QUERY.to_string(), time: Some("0".to_string()) };

        let (status, body) = read_body(query(State(create_test_state()), Query(params)).await).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).expect("parse JSON");
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["resultType"], "vector");
        assert_eq!(json["data"]["result"][0]["value"][0], 0);
        assert_eq!(json["data"]["result"][0]["metric"]["series_id"], "0");
    }

    /// Test that a missing time falls back to the fixed clock.
    #[tokio::test]
    async fn test_query_defaults_to_fixed_now() {
        let params = QueryParams { query: "up".to_string(), time: None };

        let (_, body) = read_body(query(State(create_test_state()), Query(params)).await).await;
        let json: serde_json::Value = serde_json::from_str(&body).expect("parse JSON");
        assert_eq!(json["data"]["result"][0]["value"][0], 1_640_995_200);
    }

    /// Test range query via form body.
    #[tokio::test]
    async fn test_query_range_form() {
        let params = QueryRangeParams {
            query: TEST_QUERY.to_string(),
            start: "0".to_string(),
            end: "3600".to_string(),
            step: "30m".to_string(),
        };

        let (status, body) =
            read_body(query_range_form(State(create_test_state()), Form(params)).await).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).expect("parse JSON");
        assert_eq!(json["data"]["resultType"], "matrix");
        assert_eq!(json["data"]["result"][0]["values"].as_array().map(Vec::len), Some(3));
    }

    /// Test status override and malformed body directives.
    #[tokio::test]
    async fn test_simulated_failures() {
        let params = QueryParams {
            query: "q{status_code=503,invalid_response_body}".to_string(),
            time: None,
        };

        let (status, body) = read_body(query(State(create_test_state()), Query(params)).await).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "foo");
    }

    /// Test that the directive latency is honored before replying.
    #[tokio::test]
    async fn test_directive_latency() {
        let params = QueryRangeParams {
            query: "q{range_latency_ms=50}".to_string(),
            start: "0".to_string(),
            end: "60".to_string(),
            step: "30".to_string(),
        };

        let started = std::time::Instant::now();
        let (status, _) =
            read_body(query_range(State(create_test_state()), Query(params)).await).await;
        assert_eq!(status, StatusCode::OK);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    /// Test bad parameters and generator errors map to bad_data.
    #[tokio::test]
    async fn test_bad_data() {
        let cases = [
            ("q{a=1", "0", "60", "30"),
            ("q{min_value=3,max_value=1}", "0", "60", "30"),
            ("q", "later", "60", "30"),
            ("q", "0", "60", "fast"),
            ("q", "60", "0", "30"),
        ];

        for (q, start, end, step) in cases {
            let params = QueryRangeParams {
                query: q.to_string(),
                start: start.to_string(),
                end: end.to_string(),
                step: step.to_string(),
            };
            let (status, body) =
                read_body(query_range(State(create_test_state()), Query(params)).await).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{q}");

            let json: serde_json::Value = serde_json::from_str(&body).expect("parse JSON");
            assert_eq!(json["status"], "error");
            assert_eq!(json["errorType"], "bad_data");
        }
    }

    /// Test server-wide error simulation.
    #[tokio::test]
    async fn test_query_with_error_simulation() {
        let state = AppState::builder()
            .with_error_rate(1.0) // 100% error rate
            .build()
            .expect("valid configuration");

        let params = QueryParams { query: "up".to_string(), time: None };
        let response = query(State(state), Query(params)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
