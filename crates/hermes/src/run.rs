//! Process-level wiring: logging, metrics descriptions and the server.

use hermes_config::{ConfigError, HermesConfig};
use hermes_dispatch::{Application, CompileError};
use hermes_server::{Server, ServerError, ShutdownSignal};
use hermes_telemetry::{describe_metrics, init_logging, LogConfig, TelemetryError};
use thiserror::Error;

/// Anything that can stop a Hermes process from starting or serving.
#[derive(Debug, Error)]
pub enum HermesError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// A controller failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The server failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Initializes logging, describes the request metrics and returns an
/// empty [`Application`] configured from `config`.
///
/// Logging that was already initialized by the host is left in place.
pub fn bootstrap(config: &HermesConfig) -> Result<Application, HermesError> {
    match init_logging(&LogConfig::from(&config.logging)) {
        Ok(()) => {}
        Err(TelemetryError::LoggingInit(reason)) => {
            tracing::debug!(%reason, "keeping the existing subscriber");
        }
        Err(e) => return Err(e.into()),
    }
    describe_metrics();
    Ok(Application::from_config(config)?)
}

/// Serves `app` until SIGTERM or SIGINT.
pub async fn serve(app: Application, config: &HermesConfig) -> Result<(), HermesError> {
    serve_until(app, config, ShutdownSignal::with_os_signals()).await
}

/// Serves `app` until `shutdown` fires.
pub async fn serve_until(
    app: Application,
    config: &HermesConfig,
    shutdown: ShutdownSignal,
) -> Result<(), HermesError> {
    tracing::info!(routes = app.routes().count(), "starting hermes");
    Server::new(app.into_table(), config.server.clone())
        .run_with_shutdown(shutdown)
        .await?;
    Ok(())
}
