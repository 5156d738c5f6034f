//! Parameter-binding descriptors.
//!
//! A [`ParamBinding`] describes where the value of one positional handler
//! parameter comes from. The set of sources is closed ([`BindingKind`]);
//! only [`BindingKind::Custom`] carries host code.

use crate::resolve::ExtractScope;
use hermes_core::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A host-supplied extractor for [`BindingKind::Custom`] bindings.
///
/// The returned value goes through the caster registry like any other
/// extracted value. `Ok(None)` leaves the parameter unset.
///
/// # Example
///
/// ```
/// use hermes_core::BoxFuture;
/// use hermes_extract::{CustomExtractor, ExtractScope};
/// use serde_json::Value;
///
/// struct TenantHeader;
///
/// impl CustomExtractor for TenantHeader {
///     fn extract<'a>(
///         &'a self,
///         scope: ExtractScope<'a>,
///     ) -> BoxFuture<'a, anyhow::Result<Option<Value>>> {
///         Box::pin(async move { Ok(scope.request.header("x-tenant").map(Value::from)) })
///     }
/// }
/// ```
pub trait CustomExtractor: Send + Sync + 'static {
    /// Produces the raw value for one parameter.
    fn extract<'a>(&'a self, scope: ExtractScope<'a>) -> BoxFuture<'a, anyhow::Result<Option<Value>>>;
}

/// Adapts a synchronous closure into a [`CustomExtractor`].
pub struct FnExtractor<F> {
    f: F,
}

impl<F> CustomExtractor for FnExtractor<F>
where
    F: Fn(&ExtractScope<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
{
    fn extract<'a>(&'a self, scope: ExtractScope<'a>) -> BoxFuture<'a, anyhow::Result<Option<Value>>> {
        let result = (self.f)(&scope);
        Box::pin(async move { result })
    }
}

/// Where a parameter's value comes from.
#[derive(Clone)]
pub enum BindingKind {
    /// The request body, or one field of it when the binding is named.
    Body,
    /// The query string object, or one key of it when named.
    Query,
    /// The path parameters, or one of them when named.
    Param,
    /// A [`ScopedLogger`](hermes_core::ScopedLogger) for the handler.
    Logger,
    /// The request itself.
    Request,
    /// The shared response handle.
    Response,
    /// A host-supplied extractor.
    Custom(Arc<dyn CustomExtractor>),
}

impl BindingKind {
    /// Returns the upper-case tag used in diagnostics.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Body => "BODY",
            Self::Query => "QUERY",
            Self::Param => "PARAM",
            Self::Logger => "LOGGER",
            Self::Request => "REQUEST",
            Self::Response => "RESPONSE",
            Self::Custom(_) => "CUSTOM",
        }
    }

    /// Returns true for kinds that yield a JSON value eligible for casting.
    #[must_use]
    pub const fn yields_value(&self) -> bool {
        matches!(
            self,
            Self::Body | Self::Query | Self::Param | Self::Custom(_)
        )
    }
}

impl fmt::Debug for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Describes how one positional handler parameter is produced.
///
/// # Example
///
/// ```
/// use hermes_extract::ParamBinding;
///
/// let id = ParamBinding::param(0, "id").cast_to("Number");
/// assert_eq!(id.display_name(), "id");
/// assert!(id.cast);
/// ```
#[derive(Debug, Clone)]
pub struct ParamBinding {
    /// Zero-based parameter position.
    pub index: usize,
    /// Value source.
    pub kind: BindingKind,
    /// Field, key or parameter name, if the binding selects one.
    pub name: Option<String>,
    /// Declared type name, looked up in the caster registry.
    pub type_name: Option<String>,
    /// Whether the value is coerced to `type_name`.
    pub cast: bool,
}

impl ParamBinding {
    /// Creates a binding of the given kind.
    #[must_use]
    pub fn new(index: usize, kind: BindingKind) -> Self {
        Self {
            index,
            kind,
            name: None,
            type_name: None,
            cast: false,
        }
    }

    /// Binds the whole request body.
    #[must_use]
    pub fn body(index: usize) -> Self {
        Self::new(index, BindingKind::Body)
    }

    /// Binds one field of the request body.
    #[must_use]
    pub fn body_field(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, BindingKind::Body).named(name)
    }

    /// Binds one query key.
    #[must_use]
    pub fn query(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, BindingKind::Query).named(name)
    }

    /// Binds one path parameter.
    #[must_use]
    pub fn param(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, BindingKind::Param).named(name)
    }

    /// Binds the handler's scoped logger.
    #[must_use]
    pub fn logger(index: usize) -> Self {
        Self::new(index, BindingKind::Logger)
    }

    /// Binds the request.
    #[must_use]
    pub fn request(index: usize) -> Self {
        Self::new(index, BindingKind::Request)
    }

    /// Binds the response handle.
    #[must_use]
    pub fn response(index: usize) -> Self {
        Self::new(index, BindingKind::Response)
    }

    /// Binds a custom extractor.
    #[must_use]
    pub fn custom(index: usize, extractor: impl CustomExtractor) -> Self {
        Self::new(index, BindingKind::Custom(Arc::new(extractor)))
    }

    /// Binds a synchronous closure as a custom extractor.
    #[must_use]
    pub fn custom_fn<F>(index: usize, f: F) -> Self
    where
        F: Fn(&ExtractScope<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        Self::custom(index, FnExtractor { f })
    }

    /// Sets the selected name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares a type name without enabling casting.
    #[must_use]
    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Declares a type name and enables casting to it.
    #[must_use]
    pub fn cast_to(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self.cast = true;
        self
    }

    /// Returns the name used in errors: the bound name, or `#<index>`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.index))
    }

    /// Returns a serializable summary.
    #[must_use]
    pub fn summary(&self) -> BindingSummary {
        BindingSummary {
            index: self.index,
            kind: self.kind.tag(),
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            cast: self.cast,
        }
    }
}

/// A serializable view of a [`ParamBinding`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingSummary {
    /// Parameter position.
    pub index: usize,
    /// Binding kind tag.
    pub kind: &'static str,
    /// Selected name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Declared type name.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Cast flag.
    pub cast: bool,
}

/// Errors raised while assembling a binding list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    /// Two bindings claim the same parameter position.
    #[error("parameter index {index} is bound more than once")]
    DuplicateIndex {
        /// The duplicated index.
        index: usize,
    },
}

/// The positional binding list of one endpoint.
///
/// Slots are indexed by parameter position. A `None` slot is a hole: no
/// binding was declared for that parameter.
#[derive(Debug, Clone, Default)]
pub struct ParamBindings {
    slots: Vec<Option<ParamBinding>>,
}

impl ParamBindings {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from bindings in any order.
    pub fn from_bindings(
        bindings: impl IntoIterator<Item = ParamBinding>,
    ) -> Result<Self, BindingError> {
        let mut list = Self::new();
        for binding in bindings {
            list.insert(binding)?;
        }
        Ok(list)
    }

    /// Inserts a binding at its index.
    pub fn insert(&mut self, binding: ParamBinding) -> Result<(), BindingError> {
        let index = binding.index;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        if self.slots[index].is_some() {
            return Err(BindingError::DuplicateIndex { index });
        }
        self.slots[index] = Some(binding);
        Ok(())
    }

    /// Extends the list with trailing holes up to `arity` parameters.
    pub fn pad_to(&mut self, arity: usize) {
        if arity > self.slots.len() {
            self.slots.resize(arity, None);
        }
    }

    /// Returns the number of positional slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the binding at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ParamBinding> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Iterates over the slots in position order.
    pub fn slots(&self) -> impl Iterator<Item = Option<&ParamBinding>> {
        self.slots.iter().map(Option::as_ref)
    }

    /// Returns summaries of the declared bindings.
    #[must_use]
    pub fn summaries(&self) -> Vec<BindingSummary> {
        self.slots
            .iter()
            .flatten()
            .map(ParamBinding::summary)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_are_stored_by_index() {
        let list = ParamBindings::from_bindings([
            ParamBinding::query(2, "page"),
            ParamBinding::body(0),
            ParamBinding::param(1, "id"),
        ])
        .unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0).map(|b| b.kind.tag()), Some("BODY"));
        assert_eq!(list.get(1).and_then(|b| b.name.as_deref()), Some("id"));
        assert_eq!(list.get(2).map(|b| b.kind.tag()), Some("QUERY"));
    }

    #[test]
    fn test_sparse_bindings_leave_holes() {
        let mut list = ParamBindings::from_bindings([ParamBinding::body(2)]).unwrap();
        list.pad_to(4);
        let holes: Vec<bool> = list.slots().map(|s| s.is_none()).collect();
        assert_eq!(holes, vec![true, true, false, true]);
    }

    #[test]
    fn test_duplicate_index_is_rejected() {
        let err = ParamBindings::from_bindings([ParamBinding::body(0), ParamBinding::logger(0)])
            .unwrap_err();
        assert_eq!(err, BindingError::DuplicateIndex { index: 0 });
    }

    #[test]
    fn test_summary_serializes() {
        let summary = ParamBinding::query(1, "limit").cast_to("Number").summary();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "index": 1, "kind": "QUERY", "name": "limit", "type": "Number", "cast": true })
        );
    }

    #[test]
    fn test_display_name_falls_back_to_index() {
        assert_eq!(ParamBinding::body(3).display_name(), "#3");
        assert_eq!(ParamBinding::custom_fn(0, |_| Ok(None)).kind.tag(), "CUSTOM");
    }
}
