//! # Prometheus Synthetic Data Library
//!
//! A library for serving synthetic Prometheus query results to integration tests.
//!
//! Queries carry their own generation parameters as pseudo-labels:
//!
//! ```text
//! myQuery{job="api",series_count=3,min_value=10,max_value=20,latency_ms=250}
//! ```
//!
//! This library provides components for:
//! - **Directive Parsing**: Splits a selector into labels and typed directives
//! - **Series Synthesis**: Deterministic random or usage-curve series
//! - **Response Assembly**: Prometheus `vector`/`matrix` bodies, simulated status,
//!   latency and malformed bodies
//! - **HTTP Server**: `/api/v1/query` and `/api/v1/query_range` endpoints
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! let response = prom_synth_rs::get_time_series_data(
//!     "myQuery{job=api,series_count=2}",
//!     0,
//!     3600,
//!     Duration::from_secs(1800),
//! )?;
//! assert_eq!(response.status_code, 200);
//! assert!(response.body.contains(r#""resultType":"matrix""#));
//! # Ok::<(), prom_synth_rs::SynthError>(())
//! ```

pub mod assembler;
pub mod engine;
pub mod error;
pub mod http;
pub mod modifiers;
pub mod series;
pub mod synth;
pub mod timeutil;

// Re-export commonly used types for convenience
pub use assembler::{assemble, MockResponse, QueryKind};
pub use engine::{get_instant_data, get_time_series_data};
pub use error::SynthError;
pub use modifiers::{Directive, Directives, LinePattern, Modifiers, ParseError};
pub use series::{Label, Point, SyntheticSeries};
pub use synth::{synthesize_instant, synthesize_range, RandomValues, UsageCurve, ValueGenerator};
