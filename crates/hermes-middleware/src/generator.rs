//! The middleware generator protocol.
//!
//! A generator owns one or more middleware kinds. Controllers and endpoints
//! attach options to a kind; at compile time the generator receives the
//! options gathered for one endpoint and materializes the middleware that
//! run in front of it.

use crate::chain::BoxedMiddleware;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Option lists keyed by middleware-kind identifier.
///
/// Each kind maps to the values of every option attached for it, in
/// attachment order.
///
/// # Example
///
/// ```
/// use hermes_middleware::MiddlewareOptions;
/// use serde_json::json;
///
/// let mut options = MiddlewareOptions::new();
/// options.push("rate-limit", json!({ "per_minute": 60 }));
/// options.push("rate-limit", json!({ "burst": 10 }));
///
/// assert_eq!(options.get("rate-limit").len(), 2);
/// assert!(options.get("auth").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MiddlewareOptions {
    kinds: IndexMap<String, Vec<Value>>,
}

impl MiddlewareOptions {
    /// Creates an empty option map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one option value for a kind.
    pub fn push(&mut self, kind: impl Into<String>, value: Value) {
        self.kinds.entry(kind.into()).or_default().push(value);
    }

    /// Returns the options attached for a kind.
    #[must_use]
    pub fn get(&self, kind: &str) -> &[Value] {
        self.kinds.get(kind).map_or(&[][..], Vec::as_slice)
    }

    /// Returns true if no options are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Iterates over `(kind, options)` pairs in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.kinds.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Keeps only the kinds listed in `identifiers`.
    #[must_use]
    pub fn select(&self, identifiers: &[String]) -> Self {
        Self {
            kinds: self
                .kinds
                .iter()
                .filter(|(kind, _)| identifiers.iter().any(|id| id == *kind))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Materializes middleware from option maps.
pub trait MiddlewareGenerator: Send + Sync + 'static {
    /// Returns the middleware kinds this generator understands.
    fn identifiers(&self) -> Vec<String>;

    /// Produces the middleware for one endpoint, in run order.
    ///
    /// Both maps only contain kinds returned by [`identifiers`](Self::identifiers).
    fn middleware(
        &self,
        controller: &MiddlewareOptions,
        endpoint: &MiddlewareOptions,
    ) -> anyhow::Result<Vec<BoxedMiddleware>>;
}

impl<G: MiddlewareGenerator> MiddlewareGenerator for Arc<G> {
    fn identifiers(&self) -> Vec<String> {
        (**self).identifiers()
    }

    fn middleware(
        &self,
        controller: &MiddlewareOptions,
        endpoint: &MiddlewareOptions,
    ) -> anyhow::Result<Vec<BoxedMiddleware>> {
        (**self).middleware(controller, endpoint)
    }
}
