//! # Hermes Server
//!
//! Serves a Hermes [`RouteTable`](hermes_router::RouteTable) over HTTP/1.1
//! with Hyper and Tokio.
//!
//! - Request bodies are buffered up to `server.max_body_bytes`; larger
//!   bodies answer `413` through the table's error channel
//! - Shutdown stops accepting connections and waits up to
//!   `server.shutdown_timeout_secs` for in-flight ones
//!
//! ## Example
//!
//! ```rust,ignore
//! use hermes_config::ServerConfig;
//! use hermes_dispatch::Application;
//! use hermes_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Application::new();
//!     Server::new(app.into_table(), ServerConfig::default()).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod server;
pub mod shutdown;

pub use error::ServerError;
pub use server::Server;
pub use shutdown::{ConnectionTracker, ShutdownSignal};
