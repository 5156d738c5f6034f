//! Typed configuration for Hermes.
//!
//! [`HermesConfig`] holds three sections:
//!
//! - [`DispatchConfig`] - mount path and trace-id handling
//! - [`ServerConfig`] - HTTP adapter settings
//! - [`LoggingConfig`] - log level and format
//!
//! Unknown fields are rejected in every section.
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! println!("mounting controllers under {}", config.dispatch.mount_path);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! mount_path = "/api"
//! trace_header = "x-trace-id"
//! trust_incoming_trace_id = false
//! expose_internal_errors = false
//!
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! max_body_bytes = 1048576
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values are overridden with `PREFIX__SECTION__KEY`, for example
//! `HERMES__DISPATCH__MOUNT_PATH=/v2`.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HermesConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{DispatchConfig, LogFormat, LoggingConfig, ServerConfig};
