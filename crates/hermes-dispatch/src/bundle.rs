//! Bundles: named groups of controllers mounted together.

use crate::compiler::EndpointCompiler;
use crate::controller::Controller;
use crate::error::CompileError;
use crate::metadata::MetadataStore;
use hermes_router::RouteRegistration;
use std::fmt;
use std::sync::Arc;

/// A controller instance with its type erased.
pub(crate) trait Mountable: Send + Sync {
    fn declare(&self, store: &mut MetadataStore);

    fn compile(
        &self,
        compiler: &EndpointCompiler<'_>,
        prefix: &str,
        bundle: Option<&str>,
    ) -> Result<Vec<RouteRegistration>, CompileError>;

    fn name(&self) -> &'static str;
}

pub(crate) struct Mounted<C>(pub(crate) Arc<C>);

impl<C: Controller> Mountable for Mounted<C> {
    fn declare(&self, store: &mut MetadataStore) {
        store.declare::<C>();
    }

    fn compile(
        &self,
        compiler: &EndpointCompiler<'_>,
        prefix: &str,
        bundle: Option<&str>,
    ) -> Result<Vec<RouteRegistration>, CompileError> {
        compiler.compile(&self.0, prefix, bundle)
    }

    fn name(&self) -> &'static str {
        C::name()
    }
}

/// A named group of controllers sharing a path prefix.
///
/// Requests served by a bundle's endpoints carry the bundle name in their
/// [`RequestContext`](hermes_core::RequestContext). A bundle is mounted
/// atomically: if any of its controllers fails to compile, none of its
/// routes is registered.
///
/// # Example
///
/// ```
/// use hermes_dispatch::Bundle;
///
/// let bundle = Bundle::new("admin").prefix("/admin");
/// assert_eq!(bundle.name(), "admin");
/// assert!(bundle.is_empty());
/// ```
pub struct Bundle {
    name: String,
    prefix: String,
    controllers: Vec<Box<dyn Mountable>>,
}

impl Bundle {
    /// Creates an empty bundle without a prefix.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            controllers: Vec::new(),
        }
    }

    /// Sets the path prefix placed between the mount path and each
    /// controller's base path.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Adds a controller instance.
    #[must_use]
    pub fn controller<C: Controller>(mut self, controller: Arc<C>) -> Self {
        self.controllers.push(Box::new(Mounted(controller)));
        self
    }

    /// Returns the bundle name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path prefix.
    pub fn path_prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the number of controllers.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns true if the bundle has no controllers.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub(crate) fn controllers(&self) -> &[Box<dyn Mountable>] {
        &self.controllers
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.controllers.iter().map(|c| c.name()).collect();
        f.debug_struct("Bundle")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("controllers", &names)
            .finish()
    }
}
