//! Configuration sections.

use serde::{Deserialize, Serialize};

/// How controllers are mounted and how requests are traced.
///
/// # Example
///
/// ```
/// use hermes_config::DispatchConfig;
///
/// let config = DispatchConfig::default();
/// assert_eq!(config.mount_path, "/");
/// assert_eq!(config.trace_header, "x-trace-id");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Prefix placed in front of every controller base path.
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    /// Header that carries the trace id on responses.
    #[serde(default = "default_trace_header")]
    pub trace_header: String,

    /// Reuse a well-formed incoming trace header instead of generating one.
    #[serde(default)]
    pub trust_incoming_trace_id: bool,

    /// Send 5xx error messages to clients verbatim.
    #[serde(default)]
    pub expose_internal_errors: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mount_path: default_mount_path(),
            trace_header: default_trace_header(),
            trust_incoming_trace_id: false,
            expose_internal_errors: false,
        }
    }
}

fn default_mount_path() -> String {
    "/".to_string()
}

fn default_trace_header() -> String {
    "x-trace-id".to_string()
}

/// HTTP adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `EnvFilter` directive, e.g. `info` or `hermes_dispatch=debug`.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: DispatchConfig = toml::from_str(r#"mount_path = "/api""#).unwrap();
        assert_eq!(config.mount_path, "/api");
        assert_eq!(config.trace_header, "x-trace-id");
        assert!(!config.trust_incoming_trace_id);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ServerConfig, _> = toml::from_str("port = 80");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_lowercase() {
        let config: LoggingConfig = serde_json::from_str(r#"{"format":"pretty"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "info");
    }
}
