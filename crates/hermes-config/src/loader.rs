//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{ConfigError, HermesConfig, LogFormat};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_name(extension)
    }

    fn parse(self, content: &str) -> Result<HermesConfig, ConfigError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse {
                format: "toml",
                message: e.message().to_string(),
            }),
            Self::Json => serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                format: "json",
                message: e.to_string(),
            }),
        }
    }
}

/// Builds a [`HermesConfig`] from layers, each overriding the one before:
///
/// 1. Defaults, or the development / production preset
/// 2. A TOML or JSON document
/// 3. Environment variables named `PREFIX__SECTION__KEY`
///
/// `load` validates the result.
///
/// # Example
///
/// ```
/// use hermes_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_string("[dispatch]\nmount_path = \"/api\"", "toml")
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.dispatch.mount_path, "/api");
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: HermesConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Starts from [`HermesConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from [`HermesConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HermesConfig::development();
        self
    }

    /// Starts from [`HermesConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HermesConfig::production();
        self
    }

    /// Replaces the configuration with the document at `path`. The format
    /// follows the file extension.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`], [`ConfigError::Read`],
    /// [`ConfigError::UnsupportedFormat`] or [`ConfigError::Parse`].
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }
        let format = Format::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.config = format.parse(&content)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file keeps the
    /// current layer.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            tracing::debug!(path = %path.as_ref().display(), "no configuration file, using defaults");
            Ok(self)
        }
    }

    /// Replaces the configuration with an in-memory document in `format`
    /// (`toml` or `json`).
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Format::from_name(format)?.parse(content)?;
        Ok(self)
    }

    /// Reads overrides from variables starting with `prefix` when loading.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_ascii_uppercase());
        self
    }

    /// Loads `.env` into the process environment if the file exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                tracing::warn!(%error, "ignoring unreadable .env file");
            }
        }
        self
    }

    /// Applies environment overrides, then validates.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Env`] for an unparsable override, or whatever
    /// [`HermesConfig::validate`] reports.
    pub fn load(mut self) -> Result<HermesConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let mut overrides: Vec<(String, String)> = env::vars()
                .filter(|(name, _)| name.starts_with(&prefix))
                .collect();
            overrides.sort();
            for (name, value) in &overrides {
                if let Some(key) = name
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_prefix("__"))
                {
                    self.apply_override(name, key, value)?;
                }
            }
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the current layer as is.
    #[must_use]
    pub fn load_unvalidated(self) -> HermesConfig {
        self.config
    }

    fn apply_override(&mut self, var: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let dispatch = &mut self.config.dispatch;
        let server = &mut self.config.server;
        let logging = &mut self.config.logging;

        match key {
            "DISPATCH__MOUNT_PATH" => dispatch.mount_path = value.to_string(),
            "DISPATCH__TRACE_HEADER" => dispatch.trace_header = value.to_ascii_lowercase(),
            "DISPATCH__TRUST_INCOMING_TRACE_ID" => {
                dispatch.trust_incoming_trace_id = flag(var, value)?;
            }
            "DISPATCH__EXPOSE_INTERNAL_ERRORS" => {
                dispatch.expose_internal_errors = flag(var, value)?;
            }
            "SERVER__HTTP_ADDR" => server.http_addr = value.to_string(),
            "SERVER__SHUTDOWN_TIMEOUT_SECS" => server.shutdown_timeout_secs = number(var, value)?,
            "SERVER__MAX_BODY_BYTES" => server.max_body_bytes = number(var, value)?,
            "LOGGING__ENABLED" => logging.enabled = flag(var, value)?,
            "LOGGING__LEVEL" => logging.level = value.to_string(),
            "LOGGING__FORMAT" => {
                logging.format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env(var, "'json' or 'pretty'")),
                };
            }
            _ => tracing::debug!(var, "ignoring unknown configuration override"),
        }
        Ok(())
    }
}

fn flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env(var, "a boolean")),
    }
}

fn number<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::env(var, "an integer"))
}
