//! HTTP handlers for different API endpoints.

pub mod health;
pub mod query;

// Re-export handlers for easier access
pub use health::healthz;
pub use query::{query, query_form, query_range, query_range_form};
