//! The route table.
//!
//! [`RouteTable`] is the in-process transport: it accepts
//! `(verb, path, middleware chain, endpoint)` registrations and dispatches
//! requests to them. Paths are matched with a radix tree; literal segments
//! take priority over parameters, parameters over catch-alls.

use crate::error_channel::{ErrorChannel, RequestHead};
use crate::node::{Node, PathMatch};
use crate::path::validate_template;
use hermes_core::{DispatchError, Rejection, Request, Response, Verb};
use hermes_extract::BindingSummary;
use hermes_middleware::{Endpoint, MiddlewareChain};
use http::header::{HeaderValue, ALLOW};
use http::StatusCode;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A compile-time record of one registered endpoint, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEndpointInfo {
    /// The HTTP verb.
    pub verb: Verb,
    /// The normalized full path.
    pub full_path: String,
    /// The controller type's name.
    pub controller: String,
    /// The handler method's name.
    pub method_name: String,
    /// The bundle the controller was mounted with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    /// The parameter bindings.
    pub bindings: Vec<BindingSummary>,
    /// The middleware names, in run order.
    pub middleware: Vec<String>,
}

impl fmt::Display for CreatedEndpointInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} {} -> {}.{}",
            self.verb.as_str(),
            self.full_path,
            self.controller,
            self.method_name
        )?;
        if !self.bindings.is_empty() {
            let kinds: Vec<String> = self
                .bindings
                .iter()
                .map(|b| match &b.name {
                    Some(name) => format!("{}:{}({name})", b.index, b.kind),
                    None => format!("{}:{}", b.index, b.kind),
                })
                .collect();
            write!(f, " [{}]", kinds.join(", "))?;
        }
        Ok(())
    }
}

/// One route to register.
#[derive(Clone)]
pub struct RouteRegistration {
    /// Diagnostic record; its verb and path are the route key.
    pub info: CreatedEndpointInfo,
    /// Middleware run in front of the endpoint.
    pub chain: MiddlewareChain,
    /// The terminal endpoint.
    pub endpoint: Arc<dyn Endpoint>,
}

/// Errors raised while registering routes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// A route with the same verb and path exists.
    #[error("duplicate route {verb} {path}")]
    Duplicate {
        /// The verb.
        verb: Verb,
        /// The path.
        path: String,
    },

    /// Two templates name the same parameter position differently.
    #[error("route {path} names parameter '{new}' where '{existing}' is already registered")]
    ConflictingParam {
        /// The offending path.
        path: String,
        /// Name already in the table.
        existing: String,
        /// Name in the new route.
        new: String,
    },

    /// The path template is malformed.
    #[error("malformed route path {path}: {reason}")]
    InvalidTemplate {
        /// The offending path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
}

struct Route {
    info: CreatedEndpointInfo,
    chain: MiddlewareChain,
    endpoint: Arc<dyn Endpoint>,
}

/// Registered routes plus the error channel that answers their rejections.
///
/// # Example
///
/// ```
/// use hermes_router::RouteTable;
///
/// let table = RouteTable::new();
/// assert!(table.is_empty());
/// ```
pub struct RouteTable {
    root: Node,
    routes: Vec<Route>,
    errors: ErrorChannel,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Creates an empty table with the default error channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            routes: Vec::new(),
            errors: ErrorChannel::new(),
        }
    }

    /// Replaces the error channel.
    #[must_use]
    pub fn with_error_channel(mut self, errors: ErrorChannel) -> Self {
        self.errors = errors;
        self
    }

    /// Returns the error channel.
    #[must_use]
    pub fn error_channel(&self) -> &ErrorChannel {
        &self.errors
    }

    /// Returns the error channel mutably.
    pub fn error_channel_mut(&mut self) -> &mut ErrorChannel {
        &mut self.errors
    }

    /// Registers one route.
    pub fn register(&mut self, registration: RouteRegistration) -> Result<(), RouteError> {
        self.register_all(vec![registration])
    }

    /// Registers a batch of routes atomically.
    ///
    /// Either every route is registered or, on the first conflict, none is.
    pub fn register_all(&mut self, registrations: Vec<RouteRegistration>) -> Result<(), RouteError> {
        let mut staged = self.root.clone();
        for (offset, registration) in registrations.iter().enumerate() {
            let info = &registration.info;
            validate_template(&info.full_path).map_err(|reason| RouteError::InvalidTemplate {
                path: info.full_path.clone(),
                reason,
            })?;
            staged.check(info.verb, &info.full_path)?;
            staged.insert(info.verb, &info.full_path, self.routes.len() + offset);
        }

        self.root = staged;
        for registration in registrations {
            tracing::debug!(
                verb = %registration.info.verb,
                path = %registration.info.full_path,
                handler = %format!("{}.{}", registration.info.controller, registration.info.method_name),
                "route registered"
            );
            self.routes.push(Route {
                info: registration.info,
                chain: registration.chain,
                endpoint: registration.endpoint,
            });
        }
        Ok(())
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Lists every registered endpoint in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &CreatedEndpointInfo> {
        self.routes.iter().map(|r| &r.info)
    }

    /// Serves one request.
    ///
    /// Unmatched paths answer `404`, matched paths with an unregistered verb
    /// answer `405` with an `allow` header. Every rejection goes through the
    /// error channel once.
    pub async fn handle(&self, mut request: Request) -> Response {
        let head = RequestHead {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        };
        let verb = Verb::from_method(request.method());

        match self.root.match_path(verb, request.path()) {
            PathMatch::Found { slot, params } => {
                let route = &self.routes[slot];
                request.set_path_params(params);
                match route.chain.handle(request, route.endpoint.as_ref()).await {
                    Ok(response) => response,
                    Err(rejection) => self.errors.respond(&rejection, &head),
                }
            }
            PathMatch::WrongVerb { allowed } => {
                let rejection = Rejection::new(DispatchError::http(
                    StatusCode::METHOD_NOT_ALLOWED,
                    format!("method {} is not allowed on {}", head.method, head.uri.path()),
                ));
                let mut response = self.errors.respond(&rejection, &head);
                let allow: Vec<&str> = allowed.iter().map(Verb::as_str).collect();
                if let Ok(value) = HeaderValue::from_str(&allow.join(", ")) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
            PathMatch::Missing => {
                tracing::debug!(method = %head.method, path = %head.uri.path(), "no route matched");
                let rejection = Rejection::new(DispatchError::not_found(format!(
                    "no route for {} {}",
                    head.method,
                    head.uri.path()
                )));
                self.errors.respond(&rejection, &head)
            }
        }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes.iter().map(|r| &r.info).collect::<Vec<_>>())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
