//! # Poll CLI
//!
//! Entry point: parse arguments, set up logging, run one command and map
//! the outcome to an exit status.

use std::env;
use std::process::ExitCode;

use clap::Parser;
use poll_cli::{domain_error_report, exit_code, render, Cli};
use poll_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tracing::warn;

/// Logging defaults to `warn` unless the environment or `-v` says otherwise.
fn telemetry_config(verbose: u8) -> TelemetryConfig {
    let config = TelemetryConfig::from_env();
    match verbose {
        0 if env::var("POLL_LOG_LEVEL").is_err() && env::var("RUST_LOG").is_err() => {
            config.with_log_level("warn")
        }
        0 => config,
        1 => config.with_log_level("info"),
        _ => config.with_log_level("debug"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _telemetry = match init_telemetry(telemetry_config(cli.verbose)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e}");
            None
        }
    };

    match poll_cli::run(&cli) {
        Ok(output) => {
            match render(&output, cli.json) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    return ExitCode::from(poll_cli::EXIT_FAILURE);
                }
            }
            if cli.metrics {
                match encode_metrics() {
                    Ok(text) => print!("{text}"),
                    Err(e) => warn!(error = %e, "Failed to encode metrics"),
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            match domain_error_report(&err) {
                Some(report) => match render(&report, cli.json) {
                    Ok(text) => println!("{text}"),
                    Err(_) => eprintln!("Error: {err:#}"),
                },
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::from(exit_code(&err))
        }
    }
}
