//! # Hermes Extract
//!
//! Parameter bindings and argument resolution for the Hermes dispatcher.
//!
//! Each handler parameter is described by a [`ParamBinding`] that names its
//! source:
//!
//! | Kind | Source |
//! |------|--------|
//! | `BODY` | the parsed request body, or one field of it |
//! | `QUERY` | the query string object, or one key of it |
//! | `PARAM` | the captured path parameters, or one of them |
//! | `LOGGER` | a [`ScopedLogger`](hermes_core::ScopedLogger) labelled with the handler |
//! | `REQUEST` | the request |
//! | `RESPONSE` | the shared [`ResponseHandle`](hermes_core::ResponseHandle) |
//! | `CUSTOM` | a host [`CustomExtractor`] |
//!
//! Extracted values go through the [`CasterRegistry`] before they reach the
//! handler as [`Arguments`].

#![doc(html_root_url = "https://docs.rs/hermes-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod binding;
mod caster;
mod resolve;

pub use args::{Arg, Arguments};
pub use binding::{
    BindingError, BindingKind, BindingSummary, CustomExtractor, FnExtractor, ParamBinding,
    ParamBindings,
};
pub use caster::{BooleanCaster, Caster, CasterRegistry, NumberCaster};
pub use resolve::{resolve_arguments, ExtractScope};
