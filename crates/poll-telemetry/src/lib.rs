//! # Poll Telemetry
//!
//! Logging and metrics bootstrap for poll ledger binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use poll_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Application code; `tracing` events now reach the subscriber
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `POLL_SERVICE_NAME` | `poll-ledger` | Service name |
//! | `POLL_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `POLL_CONSOLE_OUTPUT` | `true` | Console logging on/off |
//! | `POLL_JSON_LOGS` | `false` (`true` in containers) | JSON log format |
//! | `POLL_LOG_COLOR` | `true` on a terminal | ANSI colors in pretty logs |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, LogFormat};
pub use metrics::encode_metrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to encode Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging for the process.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let format = init_logging(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
        format,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    format: LogFormat,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(
            service = %self.service_name,
            format = ?self.format,
            "Shutting down telemetry"
        );
    }
}
