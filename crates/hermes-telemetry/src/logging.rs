//! Structured logging.
//!
//! [`init_logging`] installs a `tracing-subscriber` registry with one
//! formatting layer behind an `EnvFilter`. The dispatcher logs each request
//! inside a `dispatch` span carrying `trace_id`, `handler`, `http.method`
//! and `http.path`; scoped loggers add `logger` and `path`.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use hermes_config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// What [`init_logging`] installs.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Install nothing when false.
    pub enabled: bool,
    /// `EnvFilter` directives, e.g. `info,hermes_dispatch=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Emit an event when a span opens and closes.
    pub span_events: bool,
    /// Include file and line of each event.
    pub source_location: bool,
    /// Include the module path of each event.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: String::from("info"),
            format: LogFormat::Json,
            span_events: false,
            source_location: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Pretty, debug-level output with span lifecycle events.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: String::from("debug"),
            format: LogFormat::Pretty,
            span_events: true,
            source_location: true,
            ..Self::default()
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(section: &LoggingConfig) -> Self {
        Self {
            enabled: section.enabled,
            level: section.level.clone(),
            format: section.format,
            ..Self::default()
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// [`TelemetryError::InvalidFilter`] if `level` does not parse, and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = parse_filter(&config.level)?;
    tracing_subscriber::registry()
        .with(output_layer(config).with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses `EnvFilter` directives.
pub fn parse_filter(directives: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| TelemetryError::InvalidFilter(format!("{directives}: {e}")))
}

fn output_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync + 'static> {
    let spans = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(spans)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_target(config.include_target);

    match config.format {
        LogFormat::Json => layer.json().with_current_span(true).boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_json_at_info() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert!(!config.span_events);
    }

    #[test]
    fn logging_section_carries_over() {
        let section = LoggingConfig {
            enabled: true,
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.include_target);
    }

    #[test]
    fn bad_directive_is_rejected() {
        assert!(matches!(
            parse_filter("hermes=notalevel"),
            Err(TelemetryError::InvalidFilter(_))
        ));
        assert!(parse_filter("info,hermes_dispatch=debug").is_ok());
    }

    #[test]
    fn disabled_logging_installs_nothing() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
