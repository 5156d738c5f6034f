//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a [`HermesConfig`](crate::HermesConfig) could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was pointed at a path that does not exist.
    #[error("no configuration file at {}", path.display())]
    Missing {
        /// The path that was asked for.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read configuration file {}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The format is neither TOML nor JSON.
    #[error("unsupported configuration format '{0}'")]
    UnsupportedFormat(String),

    /// The document does not deserialize into the configuration schema.
    #[error("invalid {format} configuration: {message}")]
    Parse {
        /// `toml` or `json`.
        format: &'static str,
        /// The deserializer's message.
        message: String,
    },

    /// A field holds a value the dispatcher cannot use.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `dispatch.mount_path`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment override does not parse as the field's type.
    #[error("environment override {var} is not {expected}")]
    Env {
        /// The environment variable.
        var: String,
        /// The kind of value the field takes.
        expected: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: &str, expected: &'static str) -> Self {
        Self::Env {
            var: var.to_string(),
            expected,
        }
    }
}
