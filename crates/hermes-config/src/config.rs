//! The root configuration type.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::{ConfigError, DispatchConfig, LogFormat, LoggingConfig, ServerConfig};

/// Complete Hermes configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// HTTP adapter settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HermesConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the trace header is empty or
    /// not a valid header name, the mount path does not start with `/`, or
    /// the bind address does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let header = &self.dispatch.trace_header;
        if header.is_empty() {
            return Err(ConfigError::invalid_value(
                "dispatch.trace_header",
                "must not be empty",
            ));
        }
        if !header
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ConfigError::invalid_value(
                "dispatch.trace_header",
                format!("not a valid header name: {header}"),
            ));
        }

        if !self.dispatch.mount_path.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "dispatch.mount_path",
                format!("must start with '/': {}", self.dispatch.mount_path),
            ));
        }

        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Local development preset: pretty debug logs, internal errors shown.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.dispatch.expose_internal_errors = true;
        config
    }

    /// Production preset: JSON logs, internal errors masked.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.dispatch.expose_internal_errors = false;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(HermesConfig::default().validate().is_ok());
        assert!(HermesConfig::development().validate().is_ok());
    }

    #[test]
    fn test_empty_trace_header_rejected() {
        let mut config = HermesConfig::default();
        config.dispatch.trace_header = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "dispatch.trace_header"
        ));
    }

    #[test]
    fn test_relative_mount_path_rejected() {
        let mut config = HermesConfig::default();
        config.dispatch.mount_path = "api".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "dispatch.mount_path"
        ));
    }

    #[test]
    fn test_bad_address_rejected() {
        let mut config = HermesConfig::default();
        config.server.http_addr = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(HermesConfig::development().logging.format, LogFormat::Pretty);
        assert!(!HermesConfig::production().dispatch.expose_internal_errors);
    }
}
