//! # Poll CLI
//!
//! Command-line front end over a file-backed poll ledger.
//!
//! Every invocation locks the ledger, restores the registry (validating
//! every invariant), runs one command and, if it changed anything, writes
//! the registry and the extended event log back atomically.
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Usage, configuration, ledger or I/O failure |
//! | 2 | Rejected by the registry (`{"error": kind, "message": ...}` on stdout) |

pub mod commands;
pub mod config;
pub mod ledger;

use anyhow::Context;
use poll_registry::{
    EventJournal, ManualTimeSource, PollError, PollRegistryService, SystemTimeSource, TimeSource,
    TracingEventSink,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub use config::{Cli, CliConfig, CliError, Command};
pub use ledger::{LedgerError, LedgerFile, LedgerLock, LEDGER_VERSION};

/// Exit status for registry rejections.
pub const EXIT_DOMAIN_ERROR: u8 = 2;

/// Exit status for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Run one invocation and return its JSON output.
pub fn run(cli: &Cli) -> anyhow::Result<Value> {
    let config = CliConfig::from_cli(cli)?;
    let caller = if cli.command.is_mutating() {
        Some(config.require_caller()?)
    } else {
        config.caller
    };

    let _lock = LedgerLock::acquire(&config.ledger_path)
        .with_context(|| format!("locking {}", config.ledger_path.display()))?;
    let ledger = LedgerFile::load(&config.ledger_path)?;

    let clock: Arc<dyn TimeSource> = match config.now_override {
        Some(now) => Arc::new(ManualTimeSource::new(now)),
        None => Arc::new(SystemTimeSource),
    };
    let journal = Arc::new(EventJournal::with_history(ledger.events));
    let sink = Arc::new((journal.clone(), TracingEventSink));
    let service = PollRegistryService::from_snapshot(
        config.registry.clone(),
        ledger.registry,
        Arc::new(clock),
        sink,
    )
    .with_context(|| format!("restoring {}", config.ledger_path.display()))?;

    let output = commands::execute(&service, &journal, &cli.command, caller)?;

    if cli.command.is_mutating() {
        let updated = LedgerFile {
            version: LEDGER_VERSION,
            registry: service.snapshot(),
            events: journal.events(),
        };
        updated.save(&config.ledger_path)?;
    } else {
        debug!(command = ?cli.command, "Read-only command, ledger untouched");
    }

    Ok(output)
}

/// Exit status for a failed invocation.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<PollError>().is_some() {
        EXIT_DOMAIN_ERROR
    } else {
        EXIT_FAILURE
    }
}

/// Machine-readable report for a registry rejection.
pub fn domain_error_report(err: &anyhow::Error) -> Option<Value> {
    err.downcast_ref::<PollError>().map(|e| {
        json!({
            "error": e.kind().as_str(),
            "message": e.to_string(),
        })
    })
}

/// Render output as pretty or compact JSON.
pub fn render(value: &Value, compact: bool) -> anyhow::Result<String> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(text)
}
