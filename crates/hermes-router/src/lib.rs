//! # Hermes Router
//!
//! Route paths, verb inference and the route table for Hermes.
//!
//! - [`normalize`] / [`join_paths`] collapse separator runs and guarantee a
//!   single leading `/`
//! - [`infer_verb`] classifies endpoints that declare no verb
//! - [`RouteTable`] holds compiled routes and serves requests
//! - [`ErrorChannel`] answers every rejected request
//!
//! # Architecture
//!
//! The table matches paths with a radix tree where each node is one path
//! segment:
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐       "*rest"
//!        │           │
//!   [GET, POST]    ":id"
//!                    │
//!              [GET, DELETE]
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error_channel;
mod node;
mod path;
mod table;
mod verb;

pub use error_channel::{ErrorChannel, ErrorHandler, RequestHead};
pub use path::{join_paths, normalize, validate_template};
pub use table::{CreatedEndpointInfo, RouteError, RouteRegistration, RouteTable};
pub use verb::{infer_verb, resolve_verb};
