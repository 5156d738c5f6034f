//! Pre-execution hooks.
//!
//! Hooks run after argument resolution and before the handler. All hooks
//! of an endpoint run concurrently; the handler only starts once every
//! hook has finished, and the first failure aborts the request.

use futures_util::future::try_join_all;
use hermes_core::{BoxFuture, DispatchError, DispatchResult, Request, RequestContext, ResponseHandle};
use hermes_extract::{Arguments, ParamBindings};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// What a hook gets to see.
#[derive(Debug, Clone, Copy)]
pub struct HookInvocation<'a> {
    /// Options attached together with the hook.
    pub params: &'a [Value],
    /// The resolved handler arguments.
    pub args: &'a Arguments,
    /// The request.
    pub request: &'a Arc<Request>,
    /// The response handle.
    pub response: &'a ResponseHandle,
    /// The endpoint's binding list.
    pub bindings: &'a ParamBindings,
    /// The request context.
    pub context: &'a RequestContext,
}

/// A check or side effect that runs before the handler.
pub trait PreExecutionHook: Send + Sync + 'static {
    /// Runs the hook. An `Err` aborts the request.
    fn run<'a>(&'a self, invocation: HookInvocation<'a>) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Adapts a synchronous closure into a [`PreExecutionHook`].
pub struct FnHook<F> {
    f: F,
}

impl<F> FnHook<F>
where
    F: Fn(&HookInvocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> PreExecutionHook for FnHook<F>
where
    F: Fn(&HookInvocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn run<'a>(&'a self, invocation: HookInvocation<'a>) -> BoxFuture<'a, anyhow::Result<()>> {
        let result = (self.f)(&invocation);
        Box::pin(async move { result })
    }
}

/// A hook attached to one endpoint, together with its parameters.
#[derive(Clone)]
pub struct HookBinding {
    /// The hook.
    pub hook: Arc<dyn PreExecutionHook>,
    /// Parameters handed to the hook on every call.
    pub params: Vec<Value>,
}

impl HookBinding {
    /// Attaches a hook with parameters.
    pub fn new(hook: impl PreExecutionHook, params: Vec<Value>) -> Self {
        Self {
            hook: Arc::new(hook),
            params,
        }
    }
}

impl fmt::Debug for HookBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBinding")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Runs every hook concurrently and waits for all of them.
///
/// Hook errors are normalized into [`DispatchError`].
pub async fn run_hooks(
    hooks: &[HookBinding],
    args: &Arguments,
    request: &Arc<Request>,
    response: &ResponseHandle,
    bindings: &ParamBindings,
    context: &RequestContext,
) -> DispatchResult<()> {
    if hooks.is_empty() {
        return Ok(());
    }
    let pending = hooks.iter().map(|binding| {
        binding.hook.run(HookInvocation {
            params: &binding.params,
            args,
            request,
            response,
            bindings,
            context,
        })
    });
    try_join_all(pending)
        .await
        .map(|_| ())
        .map_err(DispatchError::normalize)
}
