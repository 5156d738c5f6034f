//! # Hermes Core
//!
//! Core types shared by every Hermes crate.
//!
//! - [`Request`] / [`ResponseHandle`] - the transport-facing request and response model
//! - [`RequestContext`] - per-request trace id, bundle tag and handler label
//! - [`TraceId`] - the correlation token written to logs and the `x-trace-id` header
//! - [`ScopedLogger`] - a leveled logger labelled `<Controller>.<method>`
//! - [`DispatchError`] - the request-time error taxonomy
//! - [`Verb`] - the closed set of HTTP verbs an endpoint can be compiled to

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod message;
mod logger;

pub use context::{RequestContext, TraceId, TRACE_ID_HEADER};
pub use error::{
    DispatchError, DispatchResult, ErrorCategory, ErrorDetail, ErrorEnvelope, Rejection,
};
pub use message::{
    PathParams, Request, RequestBuilder, Response, ResponseBody, ResponseHandle, Verb,
};
pub use logger::ScopedLogger;

use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
