//! Telemetry configuration from environment variables.

use std::env;
use std::io::IsTerminal;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or a full EnvFilter)
    pub log_level: String,

    /// Whether to write logs to the console at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// ANSI colors in pretty logs (only when stderr is a terminal by default)
    pub ansi_colors: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "poll-ledger".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            ansi_colors: stderr_is_terminal(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `POLL_SERVICE_NAME`: Service name (default: poll-ledger)
    /// - `POLL_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `POLL_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `POLL_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `POLL_LOG_COLOR`: ANSI colors (default: true only if stderr is a terminal)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("POLL_SERVICE_NAME")
                .unwrap_or_else(|_| "poll-ledger".to_string()),

            log_level: env::var("POLL_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("POLL_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("POLL_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            ansi_colors: env::var("POLL_LOG_COLOR")
                .map(|v| parse_flag(&v, stderr_is_terminal()))
                .unwrap_or_else(|_| stderr_is_terminal()),
        }
    }

    /// Override the log level (e.g. from a `--verbose` flag).
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn stderr_is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Lenient boolean: `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off`.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "poll-ledger");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
        assert_eq!(config.ansi_colors, std::io::stderr().is_terminal());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE", false));
        assert!(parse_flag(" on ", false));
        assert!(!parse_flag("0", true));
        assert!(parse_flag("garbage", true));
        assert!(!parse_flag("garbage", false));
    }

    #[test]
    fn test_with_log_level() {
        let config = TelemetryConfig::default().with_log_level("debug");
        assert_eq!(config.log_level, "debug");
    }
}
