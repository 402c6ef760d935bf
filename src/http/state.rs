//! Application state and configuration for the HTTP server.

use std::io;
use std::time::Duration;

use time::OffsetDateTime;

/// Server-wide fault injection, applied on top of per-query directives.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Artificial delay added to all responses
    pub latency: Duration,
    /// Probability (0.0-1.0) of returning 503 errors
    pub error_rate: f32,
}

/// Application state shared across all HTTP handlers.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Fault injection configuration
    pub mock: MockConfig,
    /// Fixed timestamp used when a request omits `time` (testing only)
    pub fixed_now: Option<OffsetDateTime>,
}

impl AppState {
    /// Get a builder for configuring application state step by step.
    ///
    /// # Returns
    ///
    /// Returns an `AppStateBuilder` for fluent configuration.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Current time for relative expressions: the fixed clock if set, else wall clock.
    pub fn now(&self) -> OffsetDateTime {
        self.fixed_now.unwrap_or_else(OffsetDateTime::now_utc)
    }
}

/// Builder for constructing AppState with fluent interface.
#[derive(Debug, Default)]
pub struct AppStateBuilder {
    fixed_now: Option<OffsetDateTime>,
    latency: Option<Duration>,
    error_rate: Option<f32>,
}

impl AppStateBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed timestamp for deterministic testing.
    ///
    /// # Parameters
    ///
    /// - `fixed_now` - Fixed timestamp to use
    ///
    /// # Returns
    ///
    /// Returns the builder for method chaining.
    pub fn with_fixed_now(mut self, fixed_now: OffsetDateTime) -> Self {
        self.fixed_now = Some(fixed_now);
        self
    }

    /// Set artificial latency added to every response.
    ///
    /// # Parameters
    ///
    /// - `latency` - Delay to add to responses
    ///
    /// # Returns
    ///
    /// Returns the builder for method chaining.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set error rate for response simulation.
    ///
    /// # Parameters
    ///
    /// - `error_rate` - Probability (0.0-1.0) of returning errors
    ///
    /// # Returns
    ///
    /// Returns the builder for method chaining.
    pub fn with_error_rate(mut self, error_rate: f32) -> Self {
        self.error_rate = Some(error_rate);
        self
    }

    /// Build the final AppState with validation.
    ///
    /// # Errors
    ///
    /// Returns error if error_rate is outside `0.0..=1.0`.
    pub fn build(self) -> io::Result<AppState> {
        if let Some(rate) = self.error_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Error rate must be between 0.0 and 1.0, got: {rate}"),
                ));
            }
        }

        let mock = MockConfig {
            latency: self.latency.unwrap_or_default(),
            error_rate: self.error_rate.unwrap_or(0.0),
        };
        Ok(AppState { mock, fixed_now: self.fixed_now })
    }
}
