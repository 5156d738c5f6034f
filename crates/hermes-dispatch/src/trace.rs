//! Trace-id derivation.

use hermes_core::{Request, TraceId, TRACE_ID_HEADER};
use http::header::{HeaderName, HeaderValue};
use std::fmt;
use std::sync::Arc;

/// A host-supplied function that picks the trace id for a request.
pub type TraceIdFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// How each request obtains its trace id.
///
/// In order of preference: the host's trace-id function, a well-formed
/// incoming trace header (only when trusted), a freshly generated id.
#[derive(Clone)]
pub struct TraceSettings {
    header: HeaderName,
    trust_incoming: bool,
    custom: Option<TraceIdFn>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self::new(HeaderName::from_static(TRACE_ID_HEADER))
    }
}

impl TraceSettings {
    /// Uses `header` for incoming and outgoing trace ids.
    #[must_use]
    pub fn new(header: HeaderName) -> Self {
        Self {
            header,
            trust_incoming: false,
            custom: None,
        }
    }

    /// Reuses a well-formed incoming trace header.
    #[must_use]
    pub fn trust_incoming(mut self, trust: bool) -> Self {
        self.trust_incoming = trust;
        self
    }

    /// Installs a host trace-id function.
    #[must_use]
    pub fn with_trace_id_fn(mut self, f: TraceIdFn) -> Self {
        self.custom = Some(f);
        self
    }

    /// Returns the trace header name.
    #[must_use]
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Picks the trace id for `request`.
    ///
    /// A host id that is empty or cannot be sent as a header value is
    /// dropped in favour of the next source.
    #[must_use]
    pub fn derive(&self, request: &Request) -> TraceId {
        if let Some(custom) = &self.custom {
            let id = custom(request);
            if !id.is_empty() && HeaderValue::from_str(&id).is_ok() {
                return TraceId::from_raw(id);
            }
            if !id.is_empty() {
                tracing::warn!(trace_id = ?id, "host trace id is not a valid header value, ignoring it");
            }
        }
        if self.trust_incoming {
            if let Some(id) = request.header(self.header.as_str()).and_then(TraceId::parse) {
                return id;
            }
        }
        TraceId::generate()
    }
}

impl fmt::Debug for TraceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceSettings")
            .field("header", &self.header)
            .field("trust_incoming", &self.trust_incoming)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_header(value: &str) -> Request {
        Request::builder().uri("/").header(TRACE_ID_HEADER, value).build()
    }

    #[test]
    fn test_generated_when_nothing_configured() {
        let settings = TraceSettings::default();
        let id = settings.derive(&with_header("INCOMING-1"));
        assert_ne!(id.as_str(), "INCOMING-1");
    }

    #[test]
    fn test_trusted_incoming_is_reused() {
        let settings = TraceSettings::default().trust_incoming(true);
        assert_eq!(settings.derive(&with_header("INCOMING-1")).as_str(), "INCOMING-1");

        let malformed = settings.derive(&with_header("has spaces"));
        assert_ne!(malformed.as_str(), "has spaces");
    }

    #[test]
    fn test_custom_function_wins() {
        let settings = TraceSettings::default()
            .trust_incoming(true)
            .with_trace_id_fn(Arc::new(|req: &Request| format!("custom{}", req.path())));
        assert_eq!(settings.derive(&with_header("INCOMING-1")).as_str(), "custom/");
    }

    #[test]
    fn test_custom_id_that_is_not_a_header_value_falls_through() {
        let settings = TraceSettings::default()
            .trust_incoming(true)
            .with_trace_id_fn(Arc::new(|_: &Request| "trace\nid".to_string()));
        assert_eq!(settings.derive(&with_header("INCOMING-1")).as_str(), "INCOMING-1");

        let untrusted = TraceSettings::default()
            .with_trace_id_fn(Arc::new(|_: &Request| "trace\nid".to_string()));
        let generated = untrusted.derive(&with_header("INCOMING-1"));
        assert!(HeaderValue::from_str(generated.as_str()).is_ok());
        assert_ne!(generated.as_str(), "trace\nid");
    }
}
