//! Dispatcher settings.

use crate::error::CompileError;
use hermes_config::DispatchConfig;
use hermes_core::TRACE_ID_HEADER;
use http::header::HeaderName;

/// Settings shared by every endpoint an [`Application`](crate::Application)
/// compiles.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Prefix placed in front of every controller base path.
    pub mount_path: String,
    /// Header carrying the trace id.
    pub trace_header: HeaderName,
    /// Reuse a well-formed incoming trace header.
    pub trust_incoming_trace_id: bool,
    /// Send 5xx error messages to clients verbatim.
    pub expose_internal_errors: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            mount_path: "/".to_string(),
            trace_header: HeaderName::from_static(TRACE_ID_HEADER),
            trust_incoming_trace_id: false,
            expose_internal_errors: false,
        }
    }
}

impl DispatchSettings {
    /// Builds settings from the `[dispatch]` configuration section.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, CompileError> {
        let trace_header = HeaderName::try_from(config.trace_header.as_str()).map_err(|e| {
            CompileError::Settings(format!("trace header {:?}: {e}", config.trace_header))
        })?;
        Ok(Self {
            mount_path: config.mount_path.clone(),
            trace_header,
            trust_incoming_trace_id: config.trust_incoming_trace_id,
            expose_internal_errors: config.expose_internal_errors,
        })
    }
}
