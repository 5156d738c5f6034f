//! # Hermes Middleware
//!
//! Middleware and hooks that run in front of a compiled endpoint.
//!
//! ## Run order
//!
//! For every request to an endpoint:
//!
//! 1. Controller-level direct middleware
//! 2. Endpoint-level direct middleware
//! 3. Generated middleware, as produced by the [`MiddlewareGenerator`]
//! 4. The endpoint itself, which resolves arguments, runs
//!    [pre-execution hooks](PreExecutionHook) concurrently and then
//!    invokes the handler
//!
//! Middleware are opaque to the dispatcher: they see the [`Request`](hermes_core::Request),
//! may answer on their own, or forward an error with `Err(Rejection)`.

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod generator;
mod hook;
mod middleware;

pub use chain::{BoxedMiddleware, MiddlewareChain};
pub use generator::{MiddlewareGenerator, MiddlewareOptions};
pub use hook::{run_hooks, FnHook, HookBinding, HookInvocation, PreExecutionHook};
pub use middleware::{Endpoint, FnMiddleware, Guard, Middleware, Next, Outcome};
