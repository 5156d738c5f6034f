//! The error-propagation channel.
//!
//! Every rejection produced behind the route table, whether by middleware
//! or the dispatcher, is handed to the [`ErrorChannel`] exactly once. Host
//! handlers are tried in registration order; the first one that returns a
//! response answers the request. Otherwise the default JSON envelope is
//! sent.

use bytes::Bytes;
use hermes_core::{Rejection, Response, TRACE_ID_HEADER};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Uri};
use http_body_util::Full;
use std::fmt;
use std::sync::Arc;

/// The parts of a request an error handler may look at.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
}

/// A host-registered error handler.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Returns a response for the rejection, or `None` to pass.
    fn handle(&self, rejection: &Rejection, head: &RequestHead) -> Option<Response>;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Rejection, &RequestHead) -> Option<Response> + Send + Sync + 'static,
{
    fn handle(&self, rejection: &Rejection, head: &RequestHead) -> Option<Response> {
        self(rejection, head)
    }
}

/// Ordered error handlers plus the default envelope response.
#[derive(Clone)]
pub struct ErrorChannel {
    handlers: Vec<Arc<dyn ErrorHandler>>,
    trace_header: HeaderName,
    expose_internal: bool,
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            trace_header: HeaderName::from_static(TRACE_ID_HEADER),
            expose_internal: false,
        }
    }
}

impl ErrorChannel {
    /// Creates a channel with no host handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the header that carries the trace id.
    #[must_use]
    pub fn with_trace_header(mut self, header: HeaderName) -> Self {
        self.trace_header = header;
        self
    }

    /// Shows 5xx error messages to clients instead of a generic text.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal = expose;
        self
    }

    /// Registers a handler after the existing ones.
    pub fn register(&mut self, handler: impl ErrorHandler) {
        self.handlers.push(Arc::new(handler));
    }

    /// Returns the number of host handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no host handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Answers a rejection.
    pub fn respond(&self, rejection: &Rejection, head: &RequestHead) -> Response {
        for handler in &self.handlers {
            if let Some(response) = handler.handle(rejection, head) {
                return response;
            }
        }
        self.default_response(rejection)
    }

    /// Renders the default JSON error envelope.
    #[must_use]
    pub fn default_response(&self, rejection: &Rejection) -> Response {
        let error = &rejection.error;
        let trace_id = rejection.trace_id();
        let envelope = error.to_envelope(trace_id, self.expose_internal);
        let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| {
            br#"{"error":{"code":"SERIALIZATION_ERROR","message":"error envelope could not be rendered","category":"internal"}}"#.to_vec()
        });

        let mut response = http::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = error.status_code();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(value) = trace_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            response
                .headers_mut()
                .insert(self.trace_header.clone(), value);
        }
        response
    }
}

impl fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorChannel")
            .field("handlers", &self.handlers.len())
            .field("trace_header", &self.trace_header)
            .field("expose_internal", &self.expose_internal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{DispatchError, RequestContext, TraceId};
    use http::StatusCode;

    fn head() -> RequestHead {
        RequestHead {
            method: Method::GET,
            uri: Uri::from_static("/x"),
            headers: HeaderMap::new(),
        }
    }

    fn rejection(error: DispatchError) -> Rejection {
        Rejection::new(error).with_context(RequestContext::new(TraceId::from_raw("TRACE-1")))
    }

    #[test]
    fn test_default_response_carries_trace_id() {
        let channel = ErrorChannel::new();
        let response = channel.respond(&rejection(DispatchError::invalid_param_type("id", "Number")), &head());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[TRACE_ID_HEADER], "TRACE-1");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_custom_trace_header() {
        let channel = ErrorChannel::new().with_trace_header(HeaderName::from_static("x-request-id"));
        let response = channel.default_response(&rejection(DispatchError::handler("x")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-request-id"], "TRACE-1");
    }

    #[test]
    fn test_first_answering_handler_wins() {
        let mut channel = ErrorChannel::new();
        channel.register(|_: &Rejection, _: &RequestHead| -> Option<Response> { None });
        channel.register(|r: &Rejection, _: &RequestHead| -> Option<Response> {
            let mut response = http::Response::new(Full::new(Bytes::from(r.error.error_code())));
            *response.status_mut() = StatusCode::IM_A_TEAPOT;
            Some(response)
        });
        channel.register(|_: &Rejection, _: &RequestHead| -> Option<Response> {
            panic!("never reached")
        });
        assert_eq!(channel.len(), 3);

        let response = channel.respond(&rejection(DispatchError::handler("x")), &head());
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
