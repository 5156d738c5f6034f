//! The endpoint compiler.
//!
//! Turns a controller's declared metadata into route registrations. For
//! each endpoint:
//!
//! 1. `full_path = normalize(mount_path + bundle_prefix + base_path + sub_path)`
//! 2. the verb is the declared one, or inferred from the sub-path
//! 3. the parameter bindings are fetched
//! 4. the middleware chain is built: controller-level direct middleware,
//!    endpoint-level direct middleware, then generated middleware
//! 5. a [`Dispatcher`] becomes the route's terminal endpoint
//!
//! Compilation either yields every route of the controller or an error;
//! nothing is registered on failure.

use crate::controller::Controller;
use crate::dispatcher::{DispatchParts, Dispatcher};
use crate::error::CompileError;
use crate::metadata::MetadataStore;
use crate::trace::TraceSettings;
use hermes_extract::CasterRegistry;
use hermes_middleware::{BoxedMiddleware, MiddlewareChain, MiddlewareGenerator, MiddlewareOptions};
use hermes_router::{
    join_paths, normalize, resolve_verb, validate_template, CreatedEndpointInfo, RouteRegistration,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Compiles controllers against one [`MetadataStore`].
pub struct EndpointCompiler<'a> {
    store: &'a MetadataStore,
    casters: &'a Arc<CasterRegistry>,
    trace: &'a Arc<TraceSettings>,
    generator: Option<&'a dyn MiddlewareGenerator>,
    mount_path: &'a str,
}

impl<'a> EndpointCompiler<'a> {
    /// Creates a compiler mounting at `/` with no middleware generator.
    pub fn new(
        store: &'a MetadataStore,
        casters: &'a Arc<CasterRegistry>,
        trace: &'a Arc<TraceSettings>,
    ) -> Self {
        Self {
            store,
            casters,
            trace,
            generator: None,
            mount_path: "/",
        }
    }

    /// Sets the mount path.
    #[must_use]
    pub fn with_mount_path(mut self, mount_path: &'a str) -> Self {
        self.mount_path = mount_path;
        self
    }

    /// Sets the middleware generator.
    #[must_use]
    pub fn with_generator(mut self, generator: Option<&'a dyn MiddlewareGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Compiles every endpoint of `controller`.
    ///
    /// `C` must have been declared in the store.
    pub fn compile<C: Controller>(
        &self,
        controller: &Arc<C>,
        prefix: &str,
        bundle: Option<&str>,
    ) -> Result<Vec<RouteRegistration>, CompileError> {
        let name = C::name();
        let store = self.store;

        let descriptor = store
            .controller_meta::<C>()
            .ok_or_else(|| CompileError::MissingBasePath {
                controller: name.to_string(),
            })?;
        check_template(name, "<base>", &descriptor.base_path)?;

        if let Some((member, index)) = store.duplicate_bindings::<C>().first() {
            return Err(CompileError::DuplicateBinding {
                controller: name.to_string(),
                member: member.clone(),
                index: *index,
            });
        }

        let endpoints = store.endpoint_meta::<C>();
        let mut members = HashSet::new();
        for endpoint in endpoints {
            if !members.insert(endpoint.method_name()) {
                return Err(CompileError::DuplicateEndpoint {
                    controller: name.to_string(),
                    member: endpoint.method_name().to_string(),
                });
            }
        }
        if let Some((member, what)) = store
            .attached_members::<C>()
            .into_iter()
            .find(|(member, _)| !members.contains(member))
        {
            return Err(CompileError::UnknownMember {
                controller: name.to_string(),
                member: member.to_string(),
                what,
            });
        }

        let bundle_name: Option<Arc<str>> = bundle.map(Arc::from);
        let mut registrations = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let member = endpoint.method_name();
            check_template(name, member, endpoint.path())?;

            let full_path = join_paths(&[
                self.mount_path,
                prefix,
                descriptor.base_path.as_str(),
                endpoint.path(),
            ]);
            let verb = resolve_verb(endpoint.declared_verb(), endpoint.path());
            let bindings = store.param_meta::<C>(member).cloned().unwrap_or_default();
            let chain = self.chain_for::<C>(name, member)?;

            let info = CreatedEndpointInfo {
                verb,
                full_path,
                controller: name.to_string(),
                method_name: member.to_string(),
                bundle: bundle.map(ToString::to_string),
                bindings: bindings.summaries(),
                middleware: chain.names().into_iter().map(ToString::to_string).collect(),
            };
            let dispatcher = Dispatcher::new(
                Arc::clone(controller),
                endpoint.clone(),
                DispatchParts {
                    label: Arc::from(format!("{name}.{member}")),
                    bundle: bundle_name.clone(),
                    bindings,
                    hooks: store.hooks::<C>(member).to_vec(),
                    casters: Arc::clone(self.casters),
                    trace: Arc::clone(self.trace),
                },
            );
            registrations.push(RouteRegistration {
                info,
                chain,
                endpoint: Arc::new(dispatcher),
            });
        }

        let listing: Vec<String> = registrations.iter().map(|r| r.info.to_string()).collect();
        tracing::info!(
            controller = name,
            bundle = bundle.unwrap_or("-"),
            endpoints = registrations.len(),
            routes = %listing.join("; "),
            "controller compiled"
        );
        Ok(registrations)
    }

    fn chain_for<C: Controller>(&self, name: &str, member: &str) -> Result<MiddlewareChain, CompileError> {
        let store = self.store;
        let mut stages: Vec<BoxedMiddleware> = store.controller_middleware::<C>().to_vec();
        stages.extend(store.endpoint_middleware::<C>(member).iter().cloned());

        let empty = MiddlewareOptions::new();
        let controller_options = store.controller_options::<C>().unwrap_or(&empty);
        let endpoint_options = store.endpoint_options::<C>(member).unwrap_or(&empty);

        match self.generator {
            Some(generator) => {
                let identifiers = generator.identifiers();
                let generated = generator
                    .middleware(
                        &controller_options.select(&identifiers),
                        &endpoint_options.select(&identifiers),
                    )
                    .map_err(|e| CompileError::Generator {
                        controller: name.to_string(),
                        member: member.to_string(),
                        message: format!("{e:#}"),
                    })?;
                stages.extend(generated);
            }
            None if !controller_options.is_empty() || !endpoint_options.is_empty() => {
                tracing::warn!(
                    controller = name,
                    member,
                    "middleware options declared but no middleware generator is installed"
                );
            }
            None => {}
        }
        Ok(MiddlewareChain::from_stages(stages))
    }
}

fn check_template(controller: &str, member: &str, path: &str) -> Result<(), CompileError> {
    validate_template(&normalize(path)).map_err(|reason| CompileError::MalformedPath {
        controller: controller.to_string(),
        member: member.to_string(),
        path: path.to_string(),
        reason,
    })
}
