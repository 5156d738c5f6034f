//! Leveled logger scoped to a call site.

use crate::context::TraceId;
use std::sync::Arc;

/// A leveled logger labelled with a `<Controller>.<method>` identity.
///
/// Every event carries the `logger` field, plus `trace_id` and `path` when
/// they are known. Events go through the `tracing` facade, so whatever
/// subscriber the host installs decides where they end up.
///
/// # Example
///
/// ```
/// use hermes_core::ScopedLogger;
///
/// let log = ScopedLogger::new("UserController.get_user").with_path("/users/:id");
/// log.info("looking up user");
/// assert_eq!(log.label(), "UserController.get_user");
/// ```
#[derive(Debug, Clone)]
pub struct ScopedLogger {
    label: Arc<str>,
    path: Option<Arc<str>>,
    trace_id: Option<TraceId>,
}

impl ScopedLogger {
    /// Creates a logger for the given function label.
    #[must_use]
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            path: None,
            trace_id: None,
        }
    }

    /// Attaches a route path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<Arc<str>>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches a trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the attached path.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the attached trace id.
    #[must_use]
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    fn trace_field(&self) -> &str {
        self.trace_id.as_ref().map_or("", TraceId::as_str)
    }

    fn path_field(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }

    /// Emits a debug event.
    pub fn debug(&self, message: &str) {
        tracing::debug!(
            logger = %self.label,
            trace_id = %self.trace_field(),
            path = %self.path_field(),
            "{message}"
        );
    }

    /// Emits an info event.
    pub fn info(&self, message: &str) {
        tracing::info!(
            logger = %self.label,
            trace_id = %self.trace_field(),
            path = %self.path_field(),
            "{message}"
        );
    }

    /// Emits a warn event.
    pub fn warn(&self, message: &str) {
        tracing::warn!(
            logger = %self.label,
            trace_id = %self.trace_field(),
            path = %self.path_field(),
            "{message}"
        );
    }

    /// Emits an error event.
    pub fn error(&self, message: &str) {
        tracing::error!(
            logger = %self.label,
            trace_id = %self.trace_field(),
            path = %self.path_field(),
            "{message}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_logger_fields() {
        let trace = TraceId::from_raw("ABCD");
        let log = ScopedLogger::new("Orders.list")
            .with_path("/orders")
            .with_trace_id(trace.clone());
        assert_eq!(log.label(), "Orders.list");
        assert_eq!(log.path(), Some("/orders"));
        assert_eq!(log.trace_id(), Some(&trace));

        // no subscriber installed; must not panic
        log.debug("d");
        log.info("i");
        log.warn("w");
        log.error("e");
    }
}
