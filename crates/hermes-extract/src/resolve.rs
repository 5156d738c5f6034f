//! Argument resolution.
//!
//! [`resolve_arguments`] turns a binding list into the positional argument
//! vector for one handler call. Extractions run concurrently; the result is
//! always in parameter order.

use crate::args::{Arg, Arguments};
use crate::binding::{BindingKind, ParamBinding, ParamBindings};
use crate::caster::CasterRegistry;
use futures_util::future::{self, try_join_all};
use hermes_core::{BoxFuture, DispatchError, DispatchResult, Request, RequestContext, ResponseHandle};
use serde_json::Value;
use std::sync::Arc;

/// Everything a single extraction may look at.
#[derive(Debug, Clone, Copy)]
pub struct ExtractScope<'a> {
    /// The request being served.
    pub request: &'a Arc<Request>,
    /// The response handle.
    pub response: &'a ResponseHandle,
    /// The binding being resolved.
    pub binding: &'a ParamBinding,
    /// The request context.
    pub context: &'a RequestContext,
    /// The caster registry.
    pub casters: &'a CasterRegistry,
}

/// Resolves every slot of `bindings` for one request.
///
/// A hole logs a warning and leaves the slot unset. The first failing
/// extraction or cast aborts resolution with its error.
pub async fn resolve_arguments(
    bindings: &ParamBindings,
    request: &Arc<Request>,
    response: &ResponseHandle,
    casters: &CasterRegistry,
    context: &RequestContext,
) -> DispatchResult<Arguments> {
    let pending: Vec<BoxFuture<'_, DispatchResult<Option<Arg>>>> = bindings
        .slots()
        .enumerate()
        .map(|(index, slot)| match slot {
            None => {
                context
                    .logger()
                    .with_path(request.path().to_string())
                    .warn(&format!("no binding declared for parameter #{index}; leaving it unset"));
                Box::pin(future::ready(Ok(None))) as BoxFuture<'_, _>
            }
            Some(binding) => Box::pin(resolve_one(ExtractScope {
                request,
                response,
                binding,
                context,
                casters,
            })) as BoxFuture<'_, _>,
        })
        .collect();

    let slots = try_join_all(pending).await?;
    Ok(Arguments::new(slots))
}

async fn resolve_one(scope: ExtractScope<'_>) -> DispatchResult<Option<Arg>> {
    let binding = scope.binding;
    let name = binding.name.as_deref();

    let raw = match &binding.kind {
        BindingKind::Logger => {
            let logger = scope
                .context
                .logger()
                .with_path(scope.request.path().to_string());
            return Ok(Some(Arg::Logger(logger)));
        }
        BindingKind::Request => return Ok(Some(Arg::Request(Arc::clone(scope.request)))),
        BindingKind::Response => return Ok(Some(Arg::Response(scope.response.clone()))),
        BindingKind::Body => {
            let body = scope.request.body_json()?;
            match name {
                Some(field) => body.and_then(|b| b.get(field)).cloned(),
                None => body.cloned(),
            }
        }
        BindingKind::Query => {
            let query = scope.request.query()?;
            match name {
                Some(key) => query.get(key).cloned(),
                None => Some(Value::Object(query.clone())),
            }
        }
        BindingKind::Param => {
            let params = scope.request.path_params();
            match name {
                Some(key) => params.get(key).map(Value::from),
                None => Some(params.to_json()),
            }
        }
        BindingKind::Custom(extractor) => extractor
            .extract(scope)
            .await
            .map_err(DispatchError::normalize)?,
    };

    Ok(scope.casters.cast(binding, raw)?.map(Arg::Value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    fn run(bindings: &ParamBindings, request: Request) -> DispatchResult<Arguments> {
        let request = Arc::new(request);
        let response = ResponseHandle::new();
        let casters = CasterRegistry::with_defaults();
        let context = RequestContext::mock().with_handler("Test.handler");
        futures_util::FutureExt::now_or_never(resolve_arguments(
            bindings, &request, &response, &casters, &context,
        ))
        .expect("synchronous extractors resolve immediately")
    }

    #[test]
    fn test_resolves_each_kind() {
        let bindings = ParamBindings::from_bindings([
            ParamBinding::body_field(0, "name"),
            ParamBinding::query(1, "limit").cast_to("Number"),
            ParamBinding::param(2, "id"),
            ParamBinding::logger(3),
            ParamBinding::request(4),
            ParamBinding::response(5),
            ParamBinding::custom_fn(6, |scope| {
                Ok(scope.request.header("x-tenant").map(Value::from))
            }),
        ])
        .unwrap();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/users/7?limit=10")
            .header("x-tenant", "acme")
            .param("id", "7")
            .json(&json!({ "name": "ada" }))
            .build();

        let args = run(&bindings, request).unwrap();
        assert_eq!(args.raw(0), Some(&json!("ada")));
        assert_eq!(args.raw(1), Some(&json!(10)));
        assert_eq!(args.raw(2), Some(&json!("7")));
        assert_eq!(args.logger(3).map(|l| l.label()), Some("Test.handler"));
        assert_eq!(args.request(4).map(|r| r.path()), Some("/users/7"));
        assert!(args.response(5).is_some());
        assert_eq!(args.raw(6), Some(&json!("acme")));
    }

    #[test]
    fn test_hole_leaves_slot_unset() {
        let bindings = ParamBindings::from_bindings([ParamBinding::query(1, "q")]).unwrap();
        let args = run(&bindings, Request::builder().uri("/?q=x").build()).unwrap();
        assert_eq!(args.len(), 2);
        assert!(args.is_unset(0));
        assert_eq!(args.raw(1), Some(&json!("x")));
    }

    #[test]
    fn test_missing_source_is_unset_not_error() {
        let bindings = ParamBindings::from_bindings([
            ParamBinding::body(0),
            ParamBinding::query(1, "absent").cast_to("Number"),
        ])
        .unwrap();
        let args = run(&bindings, Request::builder().build()).unwrap();
        assert!(args.is_unset(0));
        assert!(args.is_unset(1));
    }

    #[test]
    fn test_cast_failure_aborts() {
        let bindings =
            ParamBindings::from_bindings([ParamBinding::query(0, "page").cast_to("Number")])
                .unwrap();
        let err = run(&bindings, Request::builder().uri("/?page=abc").build()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParamType { ref name, .. } if name == "page"));
    }

    #[test]
    fn test_malformed_body_only_fails_when_read() {
        let request = || Request::builder().body("{oops").build();

        let query_only = ParamBindings::from_bindings([ParamBinding::query(0, "q")]).unwrap();
        assert!(run(&query_only, request()).is_ok());

        let body = ParamBindings::from_bindings([ParamBinding::body(0)]).unwrap();
        let err = run(&body, request()).unwrap_err();
        assert_eq!(err.error_code(), "EXTRACTION_ERROR");
    }

    #[test]
    fn test_custom_extractor_errors_are_normalized() {
        let bindings = ParamBindings::from_bindings([ParamBinding::custom_fn(0, |_| {
            Err(anyhow::anyhow!("lookup failed"))
        })])
        .unwrap();
        let err = run(&bindings, Request::builder().build()).unwrap_err();
        assert_eq!(err.error_code(), "HANDLER_ERROR");
        assert_eq!(err.to_string(), "lookup failed");
    }
}
