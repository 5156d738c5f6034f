//! Endpoint descriptors.

use futures_util::future;
use hermes_core::{BoxFuture, DispatchError, DispatchResult, Verb};
use hermes_extract::Arguments;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A type-erased handler method bound to its controller type.
pub type HandlerFn<C> =
    Arc<dyn Fn(Arc<C>, Arguments) -> BoxFuture<'static, DispatchResult<HandlerOutput>> + Send + Sync>;

/// The `Ok` value of a settled handler.
///
/// It is converted to JSON only when the dispatcher answers with it, so an
/// endpoint with auto-response off never serializes its return value.
pub struct HandlerOutput(Box<dyn FnOnce() -> DispatchResult<Value> + Send>);

impl HandlerOutput {
    /// Wraps a serializable value.
    pub fn new<T: Serialize + Send + 'static>(value: T) -> Self {
        Self(Box::new(move || Ok(serde_json::to_value(value)?)))
    }

    /// Serializes the value.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Serialization`] if the value does not serialize.
    pub fn into_json(self) -> DispatchResult<Value> {
        (self.0)()
    }
}

impl fmt::Debug for HandlerOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerOutput(..)")
    }
}

/// One handler method of a controller.
///
/// # Example
///
/// ```
/// use hermes_core::Verb;
/// use hermes_dispatch::EndpointDescriptor;
///
/// struct Users;
///
/// let endpoint = EndpointDescriptor::<Users>::new("list", "/list", |_ctrl, _args| async {
///     Ok(vec!["ada", "grace"])
/// });
/// assert_eq!(endpoint.declared_verb(), None);
///
/// let endpoint = endpoint.verb(Verb::Get);
/// assert_eq!(endpoint.declared_verb(), Some(Verb::Get));
/// ```
pub struct EndpointDescriptor<C> {
    method_name: String,
    path: String,
    verb: Option<Verb>,
    auto_response: bool,
    handler: HandlerFn<C>,
}

impl<C: Send + Sync + 'static> EndpointDescriptor<C> {
    /// Describes an async handler method.
    ///
    /// With auto-response on (the default), the handler's `Ok` value becomes
    /// the JSON response body.
    pub fn new<F, Fut, T>(method_name: impl Into<String>, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let handler: HandlerFn<C> = Arc::new(
            move |controller: Arc<C>, args: Arguments| -> BoxFuture<'static, DispatchResult<HandlerOutput>> {
                let pending = handler(controller, args);
                Box::pin(async move {
                    let value = pending.await.map_err(DispatchError::normalize)?;
                    Ok(HandlerOutput::new(value))
                })
            },
        );
        Self::from_handler(method_name, path, handler)
    }

    /// Describes a synchronous handler method.
    pub fn sync<F, T>(method_name: impl Into<String>, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&C, Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Serialize + Send + 'static,
    {
        let handler: HandlerFn<C> = Arc::new(
            move |controller: Arc<C>, args: Arguments| -> BoxFuture<'static, DispatchResult<HandlerOutput>> {
                let result = handler(&controller, args)
                    .map(HandlerOutput::new)
                    .map_err(DispatchError::normalize);
                Box::pin(future::ready(result))
            },
        );
        Self::from_handler(method_name, path, handler)
    }

    /// Describes a handler that is already type-erased.
    pub fn from_handler(
        method_name: impl Into<String>,
        path: impl Into<String>,
        handler: HandlerFn<C>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            path: path.into(),
            verb: None,
            auto_response: true,
            handler,
        }
    }
}

impl<C> EndpointDescriptor<C> {
    /// Declares the HTTP verb. Without one, the verb is inferred from the
    /// sub-path when the controller is compiled.
    pub fn verb(mut self, verb: Verb) -> Self {
        self.verb = Some(verb);
        self
    }

    /// Turns automatic JSON responses on or off.
    ///
    /// With auto-response off, the handler writes the response itself
    /// through a `RESPONSE` binding and its return value is discarded
    /// without being serialized.
    pub fn auto_response(mut self, enabled: bool) -> Self {
        self.auto_response = enabled;
        self
    }

    /// Returns the method name.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns the declared sub-path, as written.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the declared verb.
    pub fn declared_verb(&self) -> Option<Verb> {
        self.verb
    }

    /// Returns true if the handler result is serialized automatically.
    pub fn is_auto_response(&self) -> bool {
        self.auto_response
    }

    pub(crate) fn handler(&self) -> &HandlerFn<C> {
        &self.handler
    }
}

impl<C> Clone for EndpointDescriptor<C> {
    fn clone(&self) -> Self {
        Self {
            method_name: self.method_name.clone(),
            path: self.path.clone(),
            verb: self.verb,
            auto_response: self.auto_response,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<C> fmt::Debug for EndpointDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("method_name", &self.method_name)
            .field("path", &self.path)
            .field("verb", &self.verb)
            .field("auto_response", &self.auto_response)
            .finish_non_exhaustive()
    }
}
