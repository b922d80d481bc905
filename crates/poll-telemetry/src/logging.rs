//! Structured logging setup.
//!
//! Installs a global `tracing-subscriber` registry with an `EnvFilter` and
//! either a JSON layer (containers/production) or a pretty layer
//! (development). Logs go to stderr so command output on stdout stays
//! machine-readable.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format chosen for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human-readable (colored on a terminal)
    Pretty,
    /// Console output disabled
    Off,
}

impl LogFormat {
    /// Picks the format a configuration asks for.
    pub fn for_config(config: &TelemetryConfig) -> Self {
        match (config.console_output, config.json_logs) {
            (false, _) => Self::Off,
            (true, true) => Self::Json,
            (true, false) => Self::Pretty,
        }
    }
}

/// Build the env filter from the configured directive.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("bad log filter '{}': {e}", config.log_level)))
}

/// Install the global subscriber.
///
/// Fails with `TelemetryError::LoggingInit` if a subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<LogFormat, TelemetryError> {
    let env_filter = build_filter(config)?;
    let format = LogFormat::for_config(config);

    let json_layer = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    let pretty_layer = (format == LogFormat::Pretty).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(config.ansi_colors)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        format = ?format,
        "Structured logging initialized"
    );

    Ok(format)
}
