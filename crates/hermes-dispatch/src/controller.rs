//! The controller capability and its declaration API.

use crate::endpoint::EndpointDescriptor;
use crate::metadata::{ControllerDescriptor, MetadataStore};
use hermes_extract::{BindingError, ParamBinding, ParamBindings};
use hermes_middleware::{HookBinding, Middleware, PreExecutionHook};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type whose methods are served as HTTP endpoints.
///
/// `declare` runs once per type, the first time an instance is mounted,
/// and records the controller's base path, endpoints, bindings, hooks and
/// middleware.
///
/// # Example
///
/// ```
/// use hermes_core::Verb;
/// use hermes_dispatch::{Controller, Declaration, EndpointDescriptor};
/// use hermes_extract::ParamBinding;
///
/// struct Greeter;
///
/// impl Controller for Greeter {
///     fn declare(meta: &mut Declaration<'_, Self>) {
///         meta.base_path("/greet")
///             .endpoint(
///                 EndpointDescriptor::new("hello", "/:name", |_ctrl, args| async move {
///                     let name: String = args.value(0)?;
///                     Ok(format!("hello {name}"))
///                 })
///                 .verb(Verb::Get),
///             )
///             .bind("hello", ParamBinding::param(0, "name"));
///     }
/// }
/// ```
pub trait Controller: Send + Sync + Sized + 'static {
    /// Records this controller's metadata.
    fn declare(meta: &mut Declaration<'_, Self>);

    /// Returns the name used in handler labels and logs.
    fn name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}

/// Fluent writer over the [`MetadataStore`] entries of one controller type.
pub struct Declaration<'s, C> {
    store: &'s mut MetadataStore,
    _controller: PhantomData<fn() -> C>,
}

impl<'s, C: Controller> Declaration<'s, C> {
    pub(crate) fn new(store: &'s mut MetadataStore) -> Self {
        Self {
            store,
            _controller: PhantomData,
        }
    }

    /// Sets the controller's base path.
    pub fn base_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.store
            .set_controller_meta::<C>(ControllerDescriptor::new(path));
        self
    }

    /// Adds an endpoint.
    pub fn endpoint(&mut self, endpoint: EndpointDescriptor<C>) -> &mut Self {
        self.store.push_endpoint(endpoint);
        self
    }

    /// Binds one parameter of `member`.
    ///
    /// Binding an index twice is reported when the controller is compiled.
    pub fn bind(&mut self, member: &str, binding: ParamBinding) -> &mut Self {
        if let Err(BindingError::DuplicateIndex { index }) =
            self.store.param_meta_mut::<C>(member).insert(binding)
        {
            self.store.record_duplicate_binding::<C>(member, index);
        }
        self
    }

    /// Replaces every binding of `member`.
    pub fn bindings(&mut self, member: &str, bindings: ParamBindings) -> &mut Self {
        self.store.set_param_meta::<C>(member, bindings);
        self
    }

    /// Declares that `member` takes `arity` parameters.
    ///
    /// Positions without a binding stay unset at request time.
    pub fn arity(&mut self, member: &str, arity: usize) -> &mut Self {
        self.store.param_meta_mut::<C>(member).pad_to(arity);
        self
    }

    /// Attaches a pre-execution hook to `member`.
    pub fn hook(&mut self, member: &str, hook: impl PreExecutionHook, params: Vec<Value>) -> &mut Self {
        self.store
            .push_hook::<C>(member, HookBinding::new(hook, params));
        self
    }

    /// Adds a controller-scope middleware option.
    pub fn option(&mut self, kind: &str, value: Value) -> &mut Self {
        self.store.push_controller_option::<C>(kind, value);
        self
    }

    /// Adds an endpoint-scope middleware option to `member`.
    pub fn endpoint_option(&mut self, member: &str, kind: &str, value: Value) -> &mut Self {
        self.store.push_endpoint_option::<C>(member, kind, value);
        self
    }

    /// Attaches middleware to every endpoint of the controller.
    pub fn middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.store
            .push_controller_middleware::<C>(Arc::new(middleware));
        self
    }

    /// Attaches middleware to `member`.
    pub fn endpoint_middleware(&mut self, member: &str, middleware: impl Middleware) -> &mut Self {
        self.store
            .push_endpoint_middleware::<C>(member, Arc::new(middleware));
        self
    }
}
