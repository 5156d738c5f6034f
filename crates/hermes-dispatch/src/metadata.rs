//! The metadata store.
//!
//! Descriptors are keyed by the controller's [`TypeId`], and member-level
//! descriptors by `(TypeId, member name)`. Every write replaces the value
//! for its key; every read of an unset key returns `None` or an empty
//! slice.
//!
//! The store is written while controllers declare themselves and is only
//! read afterwards, so it carries no synchronization.

use crate::controller::{Controller, Declaration};
use crate::endpoint::EndpointDescriptor;
use hermes_extract::ParamBindings;
use hermes_middleware::{BoxedMiddleware, HookBinding, MiddlewareOptions};
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;

type MemberKey = (TypeId, String);

/// Controller-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerDescriptor {
    /// Path every endpoint of the controller is mounted under.
    pub base_path: String,
}

impl ControllerDescriptor {
    /// Creates a descriptor with the given base path.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

/// Declared metadata for every controller type.
///
/// # Example
///
/// ```
/// use hermes_dispatch::{ControllerDescriptor, MetadataStore};
///
/// struct Users;
///
/// let mut store = MetadataStore::new();
/// assert!(store.controller_meta::<Users>().is_none());
/// assert!(store.endpoint_meta::<Users>().is_empty());
///
/// store.set_controller_meta::<Users>(ControllerDescriptor::new("/users"));
/// assert_eq!(store.controller_meta::<Users>().unwrap().base_path, "/users");
/// ```
#[derive(Default)]
pub struct MetadataStore {
    controllers: HashMap<TypeId, ControllerDescriptor>,
    // Each value is a `Vec<EndpointDescriptor<C>>` for the keyed `C`.
    endpoints: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    params: HashMap<MemberKey, ParamBindings>,
    hooks: HashMap<MemberKey, Vec<HookBinding>>,
    controller_options: HashMap<TypeId, MiddlewareOptions>,
    endpoint_options: HashMap<MemberKey, MiddlewareOptions>,
    controller_middleware: HashMap<TypeId, Vec<BoxedMiddleware>>,
    endpoint_middleware: HashMap<MemberKey, Vec<BoxedMiddleware>>,
    duplicate_bindings: HashMap<TypeId, Vec<(String, usize)>>,
    declared: HashSet<TypeId>,
}

fn key<C: 'static>(member: &str) -> MemberKey {
    (TypeId::of::<C>(), member.to_string())
}

impl MetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `C::declare` the first time `C` is seen.
    pub fn declare<C: Controller>(&mut self) {
        if self.declared.insert(TypeId::of::<C>()) {
            let mut declaration = Declaration::new(self);
            C::declare(&mut declaration);
            tracing::debug!(controller = C::name(), "controller metadata declared");
        }
    }

    /// Returns true if `C` has been declared.
    pub fn is_declared<C: 'static>(&self) -> bool {
        self.declared.contains(&TypeId::of::<C>())
    }

    /// Sets the controller descriptor of `C`.
    pub fn set_controller_meta<C: 'static>(&mut self, descriptor: ControllerDescriptor) {
        self.controllers.insert(TypeId::of::<C>(), descriptor);
    }

    /// Returns the controller descriptor of `C`.
    pub fn controller_meta<C: 'static>(&self) -> Option<&ControllerDescriptor> {
        self.controllers.get(&TypeId::of::<C>())
    }

    /// Replaces the endpoint list of `C`.
    pub fn set_endpoint_meta<C: Send + Sync + 'static>(&mut self, endpoints: Vec<EndpointDescriptor<C>>) {
        self.endpoints.insert(TypeId::of::<C>(), Box::new(endpoints));
    }

    /// Returns the endpoint list of `C`, in declaration order.
    pub fn endpoint_meta<C: 'static>(&self) -> &[EndpointDescriptor<C>] {
        self.endpoints
            .get(&TypeId::of::<C>())
            .and_then(|list| list.downcast_ref::<Vec<EndpointDescriptor<C>>>())
            .map_or(&[][..], Vec::as_slice)
    }

    pub(crate) fn push_endpoint<C: Send + Sync + 'static>(&mut self, endpoint: EndpointDescriptor<C>) {
        let list = self
            .endpoints
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(Vec::<EndpointDescriptor<C>>::new()));
        if let Some(list) = list.downcast_mut::<Vec<EndpointDescriptor<C>>>() {
            list.push(endpoint);
        }
    }

    /// Replaces the parameter bindings of `C::member`.
    pub fn set_param_meta<C: 'static>(&mut self, member: &str, bindings: ParamBindings) {
        self.params.insert(key::<C>(member), bindings);
    }

    /// Returns the parameter bindings of `C::member`.
    pub fn param_meta<C: 'static>(&self, member: &str) -> Option<&ParamBindings> {
        self.params.get(&key::<C>(member))
    }

    pub(crate) fn param_meta_mut<C: 'static>(&mut self, member: &str) -> &mut ParamBindings {
        self.params.entry(key::<C>(member)).or_default()
    }

    pub(crate) fn record_duplicate_binding<C: 'static>(&mut self, member: &str, index: usize) {
        self.duplicate_bindings
            .entry(TypeId::of::<C>())
            .or_default()
            .push((member.to_string(), index));
    }

    /// Returns `(member, index)` pairs that were bound more than once.
    pub fn duplicate_bindings<C: 'static>(&self) -> &[(String, usize)] {
        self.duplicate_bindings
            .get(&TypeId::of::<C>())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Attaches a pre-execution hook to `C::member`.
    pub fn push_hook<C: 'static>(&mut self, member: &str, hook: HookBinding) {
        self.hooks.entry(key::<C>(member)).or_default().push(hook);
    }

    /// Returns the hooks of `C::member`, in attachment order.
    pub fn hooks<C: 'static>(&self, member: &str) -> &[HookBinding] {
        self.hooks.get(&key::<C>(member)).map_or(&[][..], Vec::as_slice)
    }

    /// Adds a controller-scope middleware option.
    pub fn push_controller_option<C: 'static>(&mut self, kind: &str, value: serde_json::Value) {
        self.controller_options
            .entry(TypeId::of::<C>())
            .or_default()
            .push(kind, value);
    }

    /// Returns the controller-scope middleware options of `C`.
    pub fn controller_options<C: 'static>(&self) -> Option<&MiddlewareOptions> {
        self.controller_options.get(&TypeId::of::<C>())
    }

    /// Adds an endpoint-scope middleware option to `C::member`.
    pub fn push_endpoint_option<C: 'static>(&mut self, member: &str, kind: &str, value: serde_json::Value) {
        self.endpoint_options
            .entry(key::<C>(member))
            .or_default()
            .push(kind, value);
    }

    /// Returns the endpoint-scope middleware options of `C::member`.
    pub fn endpoint_options<C: 'static>(&self, member: &str) -> Option<&MiddlewareOptions> {
        self.endpoint_options.get(&key::<C>(member))
    }

    /// Attaches middleware to every endpoint of `C`.
    pub fn push_controller_middleware<C: 'static>(&mut self, middleware: BoxedMiddleware) {
        self.controller_middleware
            .entry(TypeId::of::<C>())
            .or_default()
            .push(middleware);
    }

    /// Returns the middleware attached to every endpoint of `C`.
    pub fn controller_middleware<C: 'static>(&self) -> &[BoxedMiddleware] {
        self.controller_middleware
            .get(&TypeId::of::<C>())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Attaches middleware to `C::member`.
    pub fn push_endpoint_middleware<C: 'static>(&mut self, member: &str, middleware: BoxedMiddleware) {
        self.endpoint_middleware
            .entry(key::<C>(member))
            .or_default()
            .push(middleware);
    }

    /// Returns the middleware attached to `C::member`.
    pub fn endpoint_middleware<C: 'static>(&self, member: &str) -> &[BoxedMiddleware] {
        self.endpoint_middleware
            .get(&key::<C>(member))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Lists `(member, what)` for every member-level entry of `C`.
    pub(crate) fn attached_members<C: 'static>(&self) -> Vec<(&str, &'static str)> {
        let id = TypeId::of::<C>();
        let mut members: Vec<(&str, &'static str)> = Vec::new();
        members.extend(
            self.params
                .keys()
                .filter(|(t, _)| *t == id)
                .map(|(_, m)| (m.as_str(), "binding")),
        );
        members.extend(
            self.hooks
                .keys()
                .filter(|(t, _)| *t == id)
                .map(|(_, m)| (m.as_str(), "hook")),
        );
        members.extend(
            self.endpoint_options
                .keys()
                .filter(|(t, _)| *t == id)
                .map(|(_, m)| (m.as_str(), "middleware option")),
        );
        members.extend(
            self.endpoint_middleware
                .keys()
                .filter(|(t, _)| *t == id)
                .map(|(_, m)| (m.as_str(), "middleware")),
        );
        members.sort_unstable();
        members
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStore")
            .field("controllers", &self.controllers.len())
            .field("members", &self.params.len())
            .field("declared", &self.declared.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_extract::ParamBinding;
    use serde_json::json;

    struct Users;
    struct Orders;

    fn endpoint<C: Send + Sync + 'static>(name: &str) -> EndpointDescriptor<C> {
        EndpointDescriptor::new(name, format!("/{name}"), |_: std::sync::Arc<C>, _| async {
            Ok(())
        })
    }

    #[test]
    fn test_unset_keys_read_empty() {
        let store = MetadataStore::new();
        assert!(store.controller_meta::<Users>().is_none());
        assert!(store.endpoint_meta::<Users>().is_empty());
        assert!(store.param_meta::<Users>("get").is_none());
        assert!(store.hooks::<Users>("get").is_empty());
        assert!(store.controller_middleware::<Users>().is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = MetadataStore::new();
        store.set_controller_meta::<Users>(ControllerDescriptor::new("/a"));
        store.set_controller_meta::<Users>(ControllerDescriptor::new("/b"));
        assert_eq!(store.controller_meta::<Users>().unwrap().base_path, "/b");

        store.set_endpoint_meta::<Users>(vec![endpoint("one"), endpoint("two")]);
        store.set_endpoint_meta::<Users>(vec![endpoint("three")]);
        let names: Vec<&str> = store
            .endpoint_meta::<Users>()
            .iter()
            .map(EndpointDescriptor::method_name)
            .collect();
        assert_eq!(names, vec!["three"]);

        let first = ParamBindings::from_bindings([ParamBinding::body(0)]).unwrap();
        let second = ParamBindings::from_bindings([ParamBinding::query(0, "q"), ParamBinding::logger(1)]).unwrap();
        store.set_param_meta::<Users>("get", first);
        store.set_param_meta::<Users>("get", second);
        assert_eq!(store.param_meta::<Users>("get").unwrap().len(), 2);
    }

    #[test]
    fn test_keys_are_per_type() {
        let mut store = MetadataStore::new();
        store.set_controller_meta::<Users>(ControllerDescriptor::new("/users"));
        store.push_endpoint::<Users>(endpoint("list"));
        store.push_endpoint_option::<Users>("list", "auth", json!("admin"));

        assert!(store.controller_meta::<Orders>().is_none());
        assert!(store.endpoint_meta::<Orders>().is_empty());
        assert!(store.endpoint_options::<Orders>("list").is_none());
        assert_eq!(store.endpoint_meta::<Users>().len(), 1);
    }

    #[test]
    fn test_attached_members_are_listed() {
        let mut store = MetadataStore::new();
        store.param_meta_mut::<Users>("get").pad_to(1);
        store.push_endpoint_option::<Users>("remove", "auth", json!(true));
        store.param_meta_mut::<Orders>("other").pad_to(1);

        let members = store.attached_members::<Users>();
        assert_eq!(members, vec![("get", "binding"), ("remove", "middleware option")]);
    }
}
