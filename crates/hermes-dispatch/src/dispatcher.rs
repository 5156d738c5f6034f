//! The request dispatcher.
//!
//! A [`Dispatcher`] is the terminal [`Endpoint`] of every compiled route.
//! Per request it runs, strictly in order:
//!
//! 1. trace-id derivation and request context setup
//! 2. argument resolution
//! 3. pre-execution hooks
//! 4. the handler
//! 5. the response (serialized automatically, or written by the handler)
//!
//! Any error or panic in steps 2 to 5 is normalized and returned as a
//! [`Rejection`] for the error channel. The completion log line and the
//! request metrics are recorded exactly once, whatever the outcome.

use crate::controller::Controller;
use crate::endpoint::{EndpointDescriptor, HandlerOutput};
use crate::trace::TraceSettings;
use futures_util::FutureExt;
use hermes_core::{
    BoxFuture, DispatchError, DispatchResult, Rejection, Request, RequestContext, Response,
    ResponseHandle,
};
use hermes_extract::{resolve_arguments, CasterRegistry, ParamBindings};
use hermes_middleware::{run_hooks, Endpoint, HookBinding, Outcome};
use hermes_telemetry::{record_request, RequestOutcome};
use http::header::HeaderValue;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

/// Everything a dispatcher needs besides the controller and endpoint.
pub(crate) struct DispatchParts {
    pub(crate) label: Arc<str>,
    pub(crate) bundle: Option<Arc<str>>,
    pub(crate) bindings: ParamBindings,
    pub(crate) hooks: Vec<HookBinding>,
    pub(crate) casters: Arc<CasterRegistry>,
    pub(crate) trace: Arc<TraceSettings>,
}

/// Serves one compiled endpoint.
pub struct Dispatcher<C> {
    controller: Arc<C>,
    endpoint: EndpointDescriptor<C>,
    parts: DispatchParts,
}

impl<C: Controller> Dispatcher<C> {
    pub(crate) fn new(controller: Arc<C>, endpoint: EndpointDescriptor<C>, parts: DispatchParts) -> Self {
        Self {
            controller,
            endpoint,
            parts,
        }
    }

    /// Returns the `<Controller>.<method>` label.
    pub fn label(&self) -> &str {
        &self.parts.label
    }

    async fn dispatch(&self, mut request: Request) -> Outcome {
        let trace_id = self.parts.trace.derive(&request);
        let mut context =
            RequestContext::new(trace_id).with_handler(Arc::clone(&self.parts.label));
        if let Some(bundle) = &self.parts.bundle {
            context = context.with_bundle(Arc::clone(bundle));
        }
        request.extensions_mut().insert(context.clone());

        let path = request.path().to_string();
        let span = tracing::info_span!(
            "dispatch",
            trace_id = %context.trace_id(),
            bundle = context.bundle().unwrap_or("-"),
            handler = %self.parts.label,
            http.method = %request.method(),
            http.path = %path,
        );

        let request = Arc::new(request);
        let response = ResponseHandle::new();

        let result = AssertUnwindSafe(self.run(&request, &response, &context))
            .catch_unwind()
            .instrument(span.clone())
            .await
            .unwrap_or_else(|payload| {
                let error = DispatchError::from_panic(payload);
                span.in_scope(|| {
                    tracing::error!(error.message = %error, "non-error value thrown");
                });
                Err(error)
            });

        let elapsed = context.elapsed();
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        span.in_scope(|| match &result {
            Ok(_) => {
                tracing::info!(outcome = "success", duration_ms, "request completed");
            }
            Err(error) => {
                tracing::error!(
                    path = %path,
                    handler = %self.parts.label,
                    error.class = error.class_name(),
                    error.message = %error,
                    "dispatch error"
                );
                tracing::error!(outcome = "failure", duration_ms, "request failed");
            }
        });
        let outcome = if result.is_ok() {
            RequestOutcome::Success
        } else {
            RequestOutcome::Failure
        };
        record_request(&self.parts.label, outcome, elapsed);

        result.map_err(|error| Rejection::new(error).with_context(context))
    }

    async fn run(
        &self,
        request: &Arc<Request>,
        response: &ResponseHandle,
        context: &RequestContext,
    ) -> DispatchResult<Response> {
        let parts = &self.parts;
        let args =
            resolve_arguments(&parts.bindings, request, response, &parts.casters, context).await?;
        run_hooks(&parts.hooks, &args, request, response, &parts.bindings, context).await?;
        let output = (self.endpoint.handler())(Arc::clone(&self.controller), args).await?;
        self.respond(output, response, context)
    }

    fn respond(
        &self,
        output: HandlerOutput,
        response: &ResponseHandle,
        context: &RequestContext,
    ) -> DispatchResult<Response> {
        if self.endpoint.is_auto_response() {
            let value = output.into_json()?;
            let trace_id = HeaderValue::from_str(context.trace_id().as_str())
                .map_err(|e| DispatchError::serialization(format!("trace id header: {e}")))?;
            response.insert_header(self.parts.trace.header().clone(), trace_id);
            response.json(&value)?;
        } else if !response.is_written() {
            context
                .logger()
                .debug("handler returned without writing a response");
        }
        Ok(response.clone().into_response())
    }
}

impl<C: Controller> Endpoint for Dispatcher<C> {
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Outcome> {
        Box::pin(self.dispatch(request))
    }
}

impl<C> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("label", &self.parts.label)
            .field("bundle", &self.parts.bundle)
            .field("endpoint", &self.endpoint)
            .field("hooks", &self.parts.hooks.len())
            .finish_non_exhaustive()
    }
}
