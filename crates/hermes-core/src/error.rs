//! Error types for Hermes.
//!
//! [`DispatchError`] is the single request-time error type. Everything raised
//! while a request is being dispatched (parameter extraction, casting,
//! pre-execution hooks, the handler body, response serialization) is
//! normalized into one of its variants before it reaches the error channel.
//!
//! | Variant | Code | Category |
//! |---|---|---|
//! | `CannotCast` | `CANNOT_CAST` | `Validation` |
//! | `InvalidParamType` | `INVALID_PARAM_TYPE` | `Validation` |
//! | `Extraction` | `EXTRACTION_ERROR` | `Validation` |
//! | `Configuration` | `CONFIGURATION_ERROR` | `Configuration` |
//! | `Handler` | `HANDLER_ERROR` | `Internal` |
//! | `NonErrorThrown` | `NON_ERROR_THROWN` | `Internal` |
//! | `Serialization` | `SERIALIZATION_ERROR` | `Internal` |
//! | `Http` | `HTTP_ERROR` | `Http` |

use crate::context::RequestContext;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Categories of errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request carried input the endpoint cannot accept.
    Validation,
    /// The endpoint was compiled from inconsistent metadata.
    Configuration,
    /// Handler, hook or serialization failure.
    Internal,
    /// An explicit HTTP status raised by application code.
    Http,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Configuration | Self::Internal | Self::Http => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Request-time error raised anywhere inside the dispatcher.
///
/// # Example
///
/// ```
/// use hermes_core::{DispatchError, ErrorCategory};
///
/// let err = DispatchError::invalid_param_type("id", "Number");
/// assert_eq!(err.category(), ErrorCategory::Validation);
/// assert_eq!(err.error_code(), "INVALID_PARAM_TYPE");
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A raw value does not satisfy a named coercion's syntax.
    #[error("cannot cast {value} to {type_name}")]
    CannotCast {
        /// Stringified raw value.
        value: String,
        /// Name of the coercion that rejected it.
        type_name: String,
    },

    /// A bound parameter could not be coerced to its declared type.
    #[error("invalid type for parameter '{name}': expected {type_name}")]
    InvalidParamType {
        /// Parameter name (or `#<index>` for unnamed bindings).
        name: String,
        /// Declared type name.
        type_name: String,
    },

    /// Request input could not be read (malformed body, bad query string).
    #[error("extraction error: {message}")]
    Extraction {
        /// Human-readable error message.
        message: String,
    },

    /// Metadata is inconsistent or a required collaborator is missing.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// A hook or handler returned an error.
    #[error("{message}")]
    Handler {
        /// Stringified original error.
        message: String,
        /// The original error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A panic escaped an extractor, hook or handler.
    #[error("non-error value thrown: {payload}")]
    NonErrorThrown {
        /// Stringified panic payload.
        payload: String,
    },

    /// The handler's return value could not be serialized.
    #[error("serialization error: {message}")]
    Serialization {
        /// Human-readable error message.
        message: String,
    },

    /// An explicit HTTP error.
    #[error("{message}")]
    Http {
        /// Status code to answer with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },
}

impl DispatchError {
    /// Creates a `CANNOT_CAST` error.
    #[must_use]
    pub fn cannot_cast(value: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::CannotCast {
            value: value.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates an `INVALID_PARAM_TYPE` error.
    #[must_use]
    pub fn invalid_param_type(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::InvalidParamType {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates an extraction error.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a handler error without a source.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates an explicit HTTP error.
    #[must_use]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a `404 Not Found` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(StatusCode::NOT_FOUND, message)
    }

    /// Normalizes an arbitrary error into a `DispatchError`.
    ///
    /// An error that already is a `DispatchError` is returned as is; anything
    /// else becomes [`DispatchError::Handler`] carrying the stringified
    /// original as its message and the original as its source.
    #[must_use]
    pub fn normalize(error: anyhow::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(err) => err,
            Err(other) => Self::Handler {
                message: other.to_string(),
                source: Some(other),
            },
        }
    }

    /// Converts a caught panic payload into [`DispatchError::NonErrorThrown`].
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<opaque panic payload>".to_string()
        };
        Self::NonErrorThrown { payload }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::CannotCast { .. } | Self::InvalidParamType { .. } | Self::Extraction { .. } => {
                ErrorCategory::Validation
            }
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Handler { .. } | Self::NonErrorThrown { .. } | Self::Serialization { .. } => {
                ErrorCategory::Internal
            }
            Self::Http { .. } => ErrorCategory::Http,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            _ => self.category().default_status_code(),
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CannotCast { .. } => "CANNOT_CAST",
            Self::InvalidParamType { .. } => "INVALID_PARAM_TYPE",
            Self::Extraction { .. } => "EXTRACTION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Handler { .. } => "HANDLER_ERROR",
            Self::NonErrorThrown { .. } => "NON_ERROR_THROWN",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Http { .. } => "HTTP_ERROR",
        }
    }

    /// Returns the error class name used in log lines.
    #[must_use]
    pub const fn class_name(&self) -> &'static str {
        match self {
            Self::CannotCast { .. } => "CannotCast",
            Self::InvalidParamType { .. } => "InvalidParamType",
            Self::Extraction { .. } => "Extraction",
            Self::Configuration { .. } => "Configuration",
            Self::Handler { .. } => "Handler",
            Self::NonErrorThrown { .. } => "NonErrorThrown",
            Self::Serialization { .. } => "Serialization",
            Self::Http { .. } => "Http",
        }
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// When `expose_internal` is false, messages of 5xx errors are replaced by
    /// a generic text so internals never leak to clients.
    #[must_use]
    pub fn to_envelope(&self, trace_id: Option<&str>, expose_internal: bool) -> ErrorEnvelope {
        let message = if self.status_code().is_server_error() && !expose_internal {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                category: self.category(),
                details: self.error_details(),
            },
            trace_id: trace_id.map(ToString::to_string),
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidParamType { name, type_name } => Some(serde_json::json!({
                "param": name,
                "type": type_name
            })),
            Self::CannotCast { value, type_name } => Some(serde_json::json!({
                "value": value,
                "type": type_name
            })),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The trace id for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// A failed request on its way to the error channel.
///
/// Carries the normalized error and, when the failure happened inside the
/// dispatcher, the request context so the error response can repeat the
/// request's trace id.
#[derive(Debug)]
pub struct Rejection {
    /// The normalized error.
    pub error: DispatchError,
    /// The request context, if one had been created.
    pub context: Option<RequestContext>,
}

impl Rejection {
    /// Creates a rejection without request context.
    #[must_use]
    pub fn new(error: DispatchError) -> Self {
        Self {
            error,
            context: None,
        }
    }

    /// Attaches the request context.
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns the trace id of the attached context.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.context.as_ref().map(|ctx| ctx.trace_id().as_str())
    }
}

impl From<DispatchError> for Rejection {
    fn from(error: DispatchError) -> Self {
        Self::new(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_type() {
        let error = DispatchError::invalid_param_type("age", "Number");
        assert_eq!(error.category(), ErrorCategory::Validation);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("age"));
        assert!(error.to_string().contains("Number"));
    }

    #[test]
    fn test_normalize_keeps_structured_errors() {
        let original = anyhow::Error::new(DispatchError::not_found("no such user"));
        let normalized = DispatchError::normalize(original);
        assert_eq!(normalized.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(normalized.error_code(), "HTTP_ERROR");
    }

    #[test]
    fn test_normalize_wraps_foreign_errors() {
        let original = anyhow::anyhow!("database unavailable");
        let normalized = DispatchError::normalize(original);
        match &normalized {
            DispatchError::Handler { message, source } => {
                assert_eq!(message, "database unavailable");
                assert!(source.is_some());
            }
            other => panic!("expected Handler, got {other:?}"),
        }
        assert_eq!(normalized.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_panic_payloads() {
        let err = DispatchError::from_panic(Box::new("boom"));
        assert!(matches!(err, DispatchError::NonErrorThrown { ref payload } if payload == "boom"));

        let err = DispatchError::from_panic(Box::new(String::from("owned boom")));
        assert!(
            matches!(err, DispatchError::NonErrorThrown { ref payload } if payload == "owned boom")
        );

        let err = DispatchError::from_panic(Box::new(42_u8));
        assert_eq!(err.error_code(), "NON_ERROR_THROWN");
    }

    #[test]
    fn test_envelope_masks_internal_messages() {
        let error = DispatchError::handler("secret connection string");
        let envelope = error.to_envelope(Some("ABCD-EFGH"), false);
        assert_eq!(envelope.error.code, "HANDLER_ERROR");
        assert_eq!(envelope.error.message, "An internal error occurred");
        assert_eq!(envelope.trace_id.as_deref(), Some("ABCD-EFGH"));

        let exposed = error.to_envelope(None, true);
        assert_eq!(exposed.error.message, "secret connection string");
    }

    #[test]
    fn test_envelope_serialization() {
        let error = DispatchError::invalid_param_type("id", "Number");
        let json = serde_json::to_string(&error.to_envelope(Some("T-1"), false))
            .expect("serialization should work");
        assert!(json.contains("\"code\":\"INVALID_PARAM_TYPE\""));
        assert!(json.contains("\"trace_id\":\"T-1\""));
        assert!(json.contains("\"category\":\"validation\""));
        assert!(json.contains("\"param\":\"id\""));
    }

    #[test]
    fn test_http_error_uses_its_status() {
        let error = DispatchError::http(StatusCode::CONFLICT, "already exists");
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert_eq!(error.class_name(), "Http");
    }
}
