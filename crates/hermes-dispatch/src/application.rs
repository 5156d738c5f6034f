//! The application: controllers, bundles and the route table they fill.

use crate::bundle::{Bundle, Mountable, Mounted};
use crate::compiler::EndpointCompiler;
use crate::controller::Controller;
use crate::error::CompileError;
use crate::metadata::MetadataStore;
use crate::settings::DispatchSettings;
use crate::trace::TraceSettings;
use hermes_config::HermesConfig;
use hermes_core::{Request, Response};
use hermes_extract::{Caster, CasterRegistry};
use hermes_middleware::MiddlewareGenerator;
use hermes_router::{CreatedEndpointInfo, ErrorChannel, ErrorHandler, RouteTable};
use std::fmt;
use std::sync::Arc;

/// Mounts controllers onto a [`RouteTable`].
///
/// Casters, the middleware generator and the trace-id function are
/// captured by each endpoint when it is compiled; set them before
/// mounting.
///
/// # Example
///
/// ```
/// use hermes_dispatch::{Application, Controller, Declaration, EndpointDescriptor};
/// use std::sync::Arc;
///
/// struct Health;
///
/// impl Controller for Health {
///     fn declare(meta: &mut Declaration<'_, Self>) {
///         meta.base_path("/health").endpoint(EndpointDescriptor::new(
///             "get_status",
///             "/",
///             |_ctrl, _args| async { Ok("ok") },
///         ));
///     }
/// }
///
/// let mut app = Application::new();
/// app.mount(Arc::new(Health)).unwrap();
///
/// let route = app.routes().next().unwrap();
/// assert_eq!(route.full_path, "/health");
/// assert_eq!(route.verb.as_str(), "POST");
/// ```
pub struct Application {
    settings: DispatchSettings,
    store: MetadataStore,
    table: RouteTable,
    casters: Arc<CasterRegistry>,
    trace: Arc<TraceSettings>,
    generator: Option<Arc<dyn MiddlewareGenerator>>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Creates an application with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DispatchSettings::default())
    }

    /// Creates an application with the given settings.
    #[must_use]
    pub fn with_settings(settings: DispatchSettings) -> Self {
        let errors = ErrorChannel::new()
            .with_trace_header(settings.trace_header.clone())
            .expose_internal_errors(settings.expose_internal_errors);
        let trace = TraceSettings::new(settings.trace_header.clone())
            .trust_incoming(settings.trust_incoming_trace_id);
        Self {
            settings,
            store: MetadataStore::new(),
            table: RouteTable::new().with_error_channel(errors),
            casters: Arc::new(CasterRegistry::with_defaults()),
            trace: Arc::new(trace),
            generator: None,
        }
    }

    /// Creates an application from loaded configuration.
    pub fn from_config(config: &HermesConfig) -> Result<Self, CompileError> {
        Ok(Self::with_settings(DispatchSettings::from_config(&config.dispatch)?))
    }

    /// Replaces the caster registry.
    #[must_use]
    pub fn with_casters(mut self, casters: CasterRegistry) -> Self {
        self.casters = Arc::new(casters);
        self
    }

    /// Adds a caster to the registry.
    pub fn register_caster(&mut self, caster: impl Caster) -> &mut Self {
        Arc::make_mut(&mut self.casters).register(caster);
        self
    }

    /// Installs the middleware generator.
    #[must_use]
    pub fn with_generator(mut self, generator: impl MiddlewareGenerator) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Installs a host trace-id function.
    #[must_use]
    pub fn with_trace_id_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        let trace = (*self.trace).clone().with_trace_id_fn(Arc::new(f));
        self.trace = Arc::new(trace);
        self
    }

    /// Registers an error handler after the existing ones.
    pub fn error_handler(&mut self, handler: impl ErrorHandler) -> &mut Self {
        self.table.error_channel_mut().register(handler);
        self
    }

    /// Mounts one controller outside any bundle.
    pub fn mount<C: Controller>(&mut self, controller: Arc<C>) -> Result<&mut Self, CompileError> {
        let controllers: [Box<dyn Mountable>; 1] = [Box::new(Mounted(controller))];
        self.load(&controllers, "", None)?;
        Ok(self)
    }

    /// Mounts every controller of a bundle, atomically.
    pub fn mount_bundle(&mut self, bundle: Bundle) -> Result<&mut Self, CompileError> {
        tracing::debug!(bundle = bundle.name(), controllers = bundle.len(), "mounting bundle");
        self.load(bundle.controllers(), bundle.path_prefix(), Some(bundle.name()))?;
        Ok(self)
    }

    fn load(
        &mut self,
        controllers: &[Box<dyn Mountable>],
        prefix: &str,
        bundle: Option<&str>,
    ) -> Result<(), CompileError> {
        for controller in controllers {
            controller.declare(&mut self.store);
        }

        let compiler = EndpointCompiler::new(&self.store, &self.casters, &self.trace)
            .with_mount_path(&self.settings.mount_path)
            .with_generator(self.generator.as_deref());
        let mut registrations = Vec::new();
        for controller in controllers {
            registrations.extend(controller.compile(&compiler, prefix, bundle)?);
        }

        self.table.register_all(registrations)?;
        Ok(())
    }

    /// Lists every registered endpoint.
    pub fn routes(&self) -> impl Iterator<Item = &CreatedEndpointInfo> {
        self.table.routes()
    }

    /// Returns the metadata store.
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Returns the settings.
    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Serves one request in-process.
    pub async fn handle(&self, request: Request) -> Response {
        self.table.handle(request).await
    }

    /// Returns the route table, ready to serve.
    pub fn into_table(self) -> RouteTable {
        self.table
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("settings", &self.settings)
            .field("table", &self.table)
            .field("trace", &self.trace)
            .field("generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}
