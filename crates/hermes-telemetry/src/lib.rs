//! Observability for Hermes services.
//!
//! - [`logging`]: `tracing-subscriber` setup
//! - [`metrics`]: request counters and latency histograms through the
//!   `metrics` facade
//!
//! Installing a metrics exporter is left to the host; without one the
//! recording calls are no-ops.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `hermes_requests_total` | Counter | `handler`, `outcome` |
//! | `hermes_request_duration_seconds` | Histogram | `handler` |
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(handler = "Users.get", "ready");
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{describe_metrics, record_request, RequestOutcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
