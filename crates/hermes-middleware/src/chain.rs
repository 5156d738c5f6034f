//! Ordered middleware chains.

use crate::middleware::{Endpoint, Middleware, Next, Outcome};
use hermes_core::{BoxFuture, Request};
use std::fmt;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered list of middleware run in front of one endpoint.
///
/// The first middleware in the list sees the request first.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain from stages in run order.
    #[must_use]
    pub fn from_stages(stages: Vec<BoxedMiddleware>) -> Self {
        Self { stages }
    }

    /// Appends a stage.
    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.stages.push(middleware);
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stage names in run order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Runs the request through every stage and then the endpoint.
    pub fn handle<'a>(&'a self, request: Request, endpoint: &'a dyn Endpoint) -> BoxFuture<'a, Outcome> {
        // Build the chain from back to front
        let mut next = Next::endpoint(endpoint);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        Box::pin(next.run(request))
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("stages", &self.names())
            .finish()
    }
}
