//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait implemented by every stage
//! that runs in front of an endpoint, and the [`Endpoint`] trait that
//! terminates a chain.
//!
//! A middleware either hands the request on with [`Next::run`] or answers
//! on its own. Returning `Err(Rejection)` forwards the request to the error
//! channel instead of producing a response.
//!
//! # Example
//!
//! ```
//! use hermes_core::{BoxFuture, Request};
//! use hermes_middleware::{Middleware, Next, Outcome};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let outcome = next.run(request).await;
//!             tracing::debug!(elapsed_us = start.elapsed().as_micros() as u64, "timed");
//!             outcome
//!         })
//!     }
//! }
//! ```

use hermes_core::{BoxFuture, DispatchError, Rejection, Request, Response};

/// The result of running a request through a chain.
pub type Outcome = Result<Response, Rejection>;

/// The terminal stage of a middleware chain.
pub trait Endpoint: Send + Sync + 'static {
    /// Serves the request.
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Outcome>;
}

/// The middleware trait.
///
/// # Invariants
///
/// - Middleware calls `next.run()` at most once
/// - Middleware does not swallow a downstream `Err`; it may only add to it
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Processes the request.
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome>;
}

/// Callback to invoke the rest of the chain.
///
/// Consumed on use, so the rest of the chain runs at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Endpoint(&'a dyn Endpoint),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that invokes `middleware`, then `next`.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the endpoint.
    pub fn endpoint(endpoint: &'a dyn Endpoint) -> Self {
        Self {
            inner: NextInner::Endpoint(endpoint),
        }
    }

    /// Invokes the next middleware or the endpoint.
    pub async fn run(self, request: Request) -> Outcome {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(request, *next).await,
            NextInner::Endpoint(endpoint) => endpoint.call(request).await,
        }
    }
}

/// A middleware built from a function.
///
/// # Example
///
/// ```
/// use hermes_middleware::FnMiddleware;
///
/// let passthrough = FnMiddleware::new("passthrough", |request, next| {
///     Box::pin(async move { next.run(request).await })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: String,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    /// Creates a new function-based middleware.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        (self.func)(request, next)
    }
}

/// A synchronous check that runs before the rest of the chain.
///
/// The check may edit the request (to add state for later stages). An
/// `Err` short-circuits the chain and forwards the error.
///
/// # Example
///
/// ```
/// use hermes_core::DispatchError;
/// use hermes_middleware::Guard;
/// use http::StatusCode;
///
/// let require_key = Guard::new("api-key", |request| {
///     if request.header("x-api-key").is_some() {
///         Ok(())
///     } else {
///         Err(DispatchError::http(StatusCode::UNAUTHORIZED, "missing api key"))
///     }
/// });
/// ```
pub struct Guard<F> {
    name: String,
    check: F,
}

impl<F> Guard<F>
where
    F: Fn(&mut Request) -> Result<(), DispatchError> + Send + Sync + 'static,
{
    /// Creates a new guard.
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> Middleware for Guard<F>
where
    F: Fn(&mut Request) -> Result<(), DispatchError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            if let Err(error) = (self.check)(&mut request) {
                tracing::debug!(middleware = %self.name, error = %error, "guard rejected request");
                let rejection = match request.context() {
                    Some(ctx) => Rejection::new(error).with_context(ctx.clone()),
                    None => Rejection::new(error),
                };
                return Err(rejection);
            }
            next.run(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    struct Ok200;

    impl Endpoint for Ok200 {
        fn call<'a>(&'a self, _request: Request) -> BoxFuture<'a, Outcome> {
            Box::pin(async { Ok(http::Response::new(Full::new(Bytes::from("OK")))) })
        }
    }

    struct Tagger {
        tag: &'static str,
    }

    impl Middleware for Tagger {
        fn name(&self) -> &str {
            self.tag
        }

        fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
            Box::pin(async move {
                let mut outcome = next.run(request).await;
                if let Ok(response) = &mut outcome {
                    response
                        .headers_mut()
                        .append("x-visited", self.tag.parse().unwrap());
                }
                outcome
            })
        }
    }

    #[tokio::test]
    async fn test_next_endpoint() {
        let response = Next::endpoint(&Ok200)
            .run(Request::builder().build())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chain_unwinds_in_reverse() {
        let first = Tagger { tag: "first" };
        let second = Tagger { tag: "second" };
        let next = Next::new(&first, Next::new(&second, Next::endpoint(&Ok200)));

        let response = next.run(Request::builder().build()).await.unwrap();
        let visited: Vec<_> = response.headers().get_all("x-visited").iter().collect();
        assert_eq!(visited, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_fn_middleware_short_circuits() {
        let deny = FnMiddleware::new("deny", |_request, _next| {
            Box::pin(async { Err(Rejection::new(DispatchError::not_found("gone"))) })
        });
        let rejection = Next::new(&deny, Next::endpoint(&Ok200))
            .run(Request::builder().build())
            .await
            .unwrap_err();
        assert_eq!(rejection.error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(deny.name(), "deny");
    }

    #[tokio::test]
    async fn test_guard() {
        let guard = Guard::new("needs-key", |request: &mut Request| {
            if request.header("x-key").is_some() {
                request.extensions_mut().insert(42_u32);
                Ok(())
            } else {
                Err(DispatchError::http(StatusCode::UNAUTHORIZED, "no key"))
            }
        });

        let allowed = Next::new(&guard, Next::endpoint(&Ok200))
            .run(Request::builder().header("x-key", "k").build())
            .await;
        assert!(allowed.is_ok());

        let denied = Next::new(&guard, Next::endpoint(&Ok200))
            .run(Request::builder().build())
            .await
            .unwrap_err();
        assert_eq!(denied.error.status_code(), StatusCode::UNAUTHORIZED);
    }
}
