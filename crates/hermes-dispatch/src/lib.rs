//! # Hermes Dispatch
//!
//! Compiles controllers into routes and serves them.
//!
//! A [`Controller`] declares its base path, endpoints, parameter bindings,
//! hooks and middleware into the [`MetadataStore`]. The
//! [`EndpointCompiler`] turns that metadata into route registrations whose
//! terminal endpoint is a [`Dispatcher`]. An [`Application`] drives both
//! and owns the resulting route table.
//!
//! ```text
//!  Controller::declare ──▶ MetadataStore ──▶ EndpointCompiler ──▶ RouteTable
//!                                                   │
//!                                                   ▼
//!                    request ──▶ middleware ──▶ Dispatcher ──▶ handler
//! ```
//!
//! # Example
//!
//! ```
//! use hermes_core::{Request, Verb};
//! use hermes_dispatch::{Application, Controller, Declaration, EndpointDescriptor};
//! use hermes_extract::ParamBinding;
//! use std::sync::Arc;
//!
//! struct Users;
//!
//! impl Controller for Users {
//!     fn declare(meta: &mut Declaration<'_, Self>) {
//!         meta.base_path("/users")
//!             .endpoint(EndpointDescriptor::new("get_user", "/:id", |_ctrl, args| async move {
//!                 let id: i64 = args.value(0)?;
//!                 Ok(serde_json::json!({ "id": id }))
//!             }).verb(Verb::Get))
//!             .bind("get_user", ParamBinding::param(0, "id").cast_to("Number"));
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mut app = Application::new();
//! app.mount(Arc::new(Users)).unwrap();
//!
//! let response = app.handle(Request::builder().uri("/users/7").build()).await;
//! assert_eq!(response.status(), 200);
//! assert!(response.headers().contains_key("x-trace-id"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;
mod bundle;
mod compiler;
mod controller;
mod dispatcher;
mod endpoint;
mod error;
mod metadata;
mod settings;
mod trace;

pub use application::Application;
pub use bundle::Bundle;
pub use compiler::EndpointCompiler;
pub use controller::{Controller, Declaration};
pub use dispatcher::Dispatcher;
pub use endpoint::{EndpointDescriptor, HandlerFn, HandlerOutput};
pub use error::CompileError;
pub use metadata::{ControllerDescriptor, MetadataStore};
pub use settings::DispatchSettings;
pub use trace::{TraceIdFn, TraceSettings};
