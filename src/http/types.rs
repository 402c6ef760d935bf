//! API types and parameters for HTTP handlers.

use serde::{Deserialize, Serialize};

/// Query parameters for the `/api/v1/query` endpoint.
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Selector with labels and directives
    pub query: String,
    /// Evaluation time (Unix timestamp, RFC3339 or relative); defaults to now
    pub time: Option<String>,
}

/// Query range parameters for the `/api/v1/query_range` endpoint.
#[derive(Debug, Deserialize)]
pub struct QueryRangeParams {
    /// Selector with labels and directives
    pub query: String,
    /// Start time (Unix timestamp or relative)
    pub start: String,
    /// End time (Unix timestamp or relative)
    pub end: String,
    /// Query resolution step
    pub step: String,
}

/// Prometheus API error response.
#[derive(Debug, Serialize)]
pub struct PromApiResponse<'a> {
    /// Response status ("success" | "error")
    pub status: &'a str,
    /// Error type
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "errorType")]
    pub error_type: Option<&'a str>,
    /// Error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> PromApiResponse<'a> {
    /// Build an error response with the given Prometheus error type.
    pub fn error(error_type: &'a str, error: &'a str) -> Self {
        Self { status: "error", error_type: Some(error_type), error: Some(error) }
    }
}
