//! Compile-time errors.

use hermes_core::{DispatchError, ErrorCategory};
use hermes_router::RouteError;
use thiserror::Error;

/// Errors raised while compiling a controller's endpoints.
///
/// Every variant is a configuration error: nothing of the affected
/// controller is registered.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The controller never declared a base path.
    #[error("controller {controller} has no base path")]
    MissingBasePath {
        /// Controller name.
        controller: String,
    },

    /// A base path or endpoint sub-path is not a valid route template.
    #[error("{controller}.{member}: malformed path {path}: {reason}")]
    MalformedPath {
        /// Controller name.
        controller: String,
        /// Endpoint method name, or `<base>` for the base path.
        member: String,
        /// The offending path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two bindings were declared for the same parameter index.
    #[error("{controller}.{member}: parameter #{index} is bound twice")]
    DuplicateBinding {
        /// Controller name.
        controller: String,
        /// Endpoint method name.
        member: String,
        /// The index.
        index: usize,
    },

    /// Metadata was attached to a member that is not an endpoint.
    #[error("{controller}.{member}: {what} attached to a member that is not an endpoint")]
    UnknownMember {
        /// Controller name.
        controller: String,
        /// The member name.
        member: String,
        /// What was attached (`binding`, `hook`, `middleware option`, `middleware`).
        what: &'static str,
    },

    /// The same method name was declared as an endpoint twice.
    #[error("{controller}.{member} is declared as an endpoint twice")]
    DuplicateEndpoint {
        /// Controller name.
        controller: String,
        /// The method name.
        member: String,
    },

    /// The middleware generator refused the option maps.
    #[error("{controller}.{member}: middleware generator failed: {message}")]
    Generator {
        /// Controller name.
        controller: String,
        /// Endpoint method name.
        member: String,
        /// The generator's error, stringified.
        message: String,
    },

    /// The route table rejected a route.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Invalid dispatcher settings.
    #[error("invalid dispatch settings: {0}")]
    Settings(String),
}

impl CompileError {
    /// Returns the error category; always configuration.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "CONFIGURATION_ERROR"
    }
}

impl From<CompileError> for DispatchError {
    fn from(error: CompileError) -> Self {
        DispatchError::configuration(error.to_string())
    }
}
