//! # Hermes
//!
//! **Metadata-driven HTTP endpoint dispatcher**
//!
//! Controllers declare their endpoints, parameter bindings, hooks and
//! middleware once; Hermes compiles that metadata into routes and runs
//! every request through the same pipeline:
//!
//! ```text
//! Request → Middleware → Trace id → Arguments → Casts → Hooks → Handler
//!                                                                  ↓
//! Response ← Error channel (on failure) ← JSON serialization ←─────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//! use std::sync::Arc;
//!
//! struct Users;
//!
//! impl Controller for Users {
//!     fn declare(meta: &mut Declaration<'_, Self>) {
//!         meta.base_path("/users")
//!             .endpoint(EndpointDescriptor::new("getUser", "/:id", |_ctrl, args| async move {
//!                 let id: i64 = args.value(0)?;
//!                 Ok(serde_json::json!({ "id": id }))
//!             }))
//!             .bind("getUser", ParamBinding::param(0, "id").cast_to("Number"));
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hermes::HermesError> {
//!     let config = ConfigLoader::new().with_optional_file("hermes.toml")?.load()?;
//!     let mut app = hermes::bootstrap(&config)?;
//!     app.mount(Arc::new(Users))?;
//!     hermes::serve(app, &config).await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod run;

pub use run::{bootstrap, serve, serve_until, HermesError};

pub use hermes_config as config;
pub use hermes_core as core;
pub use hermes_dispatch as dispatch;
pub use hermes_extract as extract;
pub use hermes_middleware as middleware;
pub use hermes_router as router;
pub use hermes_server as server;
pub use hermes_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use hermes_config::{ConfigLoader, HermesConfig};
    pub use hermes_core::{
        DispatchError, DispatchResult, Rejection, Request, RequestContext, Response,
        ResponseHandle, ScopedLogger, TraceId, Verb,
    };
    pub use hermes_dispatch::{
        Application, Bundle, CompileError, Controller, Declaration, EndpointDescriptor,
    };
    pub use hermes_extract::{Arguments, Caster, CasterRegistry, ParamBinding};
    pub use hermes_middleware::{
        FnHook, FnMiddleware, Guard, Middleware, MiddlewareGenerator, MiddlewareOptions, Next,
        PreExecutionHook,
    };
    pub use hermes_router::{ErrorChannel, RequestHead};
    pub use hermes_server::{Server, ShutdownSignal};
}
