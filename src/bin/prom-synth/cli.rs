//! Command-line interface definitions for the synthetic Prometheus server.

use clap::Parser;
use time::OffsetDateTime;

/// Command-line arguments for the synthetic Prometheus server.
#[derive(Debug, Parser)]
#[command(name = "prom-synth")]
#[command(
    author,
    version,
    about = "Synthetic Prometheus API: query and query_range driven by label directives"
)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:19090")]
    pub listen: String,

    /// Fixed "now" time (ISO-8601, e.g. 2025-08-03T00:00:00Z)
    #[arg(long, value_parser = parse_time)]
    pub fixed_now: Option<OffsetDateTime>,

    /// Artificial latency added to every request (e.g. 100ms, 1s)
    #[arg(long, value_parser = humantime::parse_duration, default_value = "0s")]
    pub latency: std::time::Duration,

    /// Error probability (0.0..1.0). When triggered, returns 503.
    #[arg(long, default_value_t = 0.0)]
    pub error_rate: f32,
}

/// Parse time string into `OffsetDateTime`.
///
/// # Errors
///
/// Returns error if the input string is not a valid RFC3339 timestamp.
fn parse_time(s: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339)
        .map_err(|e| format!("invalid datetime: {e}"))
}
