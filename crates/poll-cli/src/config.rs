//! Command-line arguments and resolved configuration.

use clap::{ArgAction, Parser, Subcommand};
use poll_registry::{Identity, IdentityParseError, OptionIndex, PollId, RegistryConfig, Timestamp};
use std::path::PathBuf;
use thiserror::Error;

/// Default ledger location.
pub const DEFAULT_LEDGER_PATH: &str = "./poll-ledger.json";

/// Poll ledger command-line client
#[derive(Parser, Debug, Clone)]
#[command(name = "poll-cli", version)]
#[command(about = "Create polls, vote and finalize against a local ledger file")]
pub struct Cli {
    /// Ledger file
    #[arg(long, env = "POLL_LEDGER_PATH", default_value = DEFAULT_LEDGER_PATH, global = true)]
    pub ledger: PathBuf,

    /// Acting identity: a 0x-prefixed 20-byte hex address, or a label to hash
    #[arg(long, env = "POLL_CALLER", global = true)]
    pub caller: Option<String>,

    /// Compact single-line JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Print Prometheus metrics after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Pin the clock to this UNIX timestamp (simulations and scripted runs)
    #[arg(long, env = "POLL_NOW", global = true, hide = true)]
    pub now: Option<Timestamp>,

    #[command(subcommand)]
    pub command: Command,
}

/// Ledger operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a poll owned by the caller
    Create {
        /// Poll title
        #[arg(long)]
        title: String,
        /// Poll description
        #[arg(long, default_value = "")]
        description: String,
        /// Seconds until the poll can be finalized
        #[arg(long)]
        duration: u64,
        /// Option name (repeat for each option)
        #[arg(long = "option", value_name = "NAME")]
        options: Vec<String>,
    },
    /// Cast the caller's vote
    Vote {
        poll_id: PollId,
        option_index: OptionIndex,
    },
    /// Close a poll (creator only, after the deadline)
    Finalize { poll_id: PollId },
    /// Show a poll and all of its options
    Info { poll_id: PollId },
    /// Show one option
    #[command(name = "option")]
    OptionInfo { poll_id: PollId, index: OptionIndex },
    /// Show the winner of a finalized poll
    #[command(name = "result")]
    FinalResult { poll_id: PollId },
    /// Check whether an identity voted
    Voted { poll_id: PollId, identity: String },
    /// Number of polls ever created
    Total,
    /// Print the event audit log
    Events {
        /// Only events for this poll
        #[arg(long)]
        poll: Option<PollId>,
    },
}

impl Command {
    /// Whether the command changes the ledger.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Create { .. } | Self::Vote { .. } | Self::Finalize { .. }
        )
    }
}

/// Configuration errors, raised before the ledger is touched
#[derive(Debug, Error)]
pub enum CliError {
    /// Mutating command without an identity
    #[error("No caller identity: pass --caller or set POLL_CALLER")]
    MissingCaller,

    /// `0x…` text that is not a valid identity
    #[error("Invalid identity '{input}': {source}")]
    InvalidIdentity {
        /// Text as given
        input: String,
        /// Parse failure
        source: IdentityParseError,
    },
}

/// Turn `0x…` hex into an identity, or hash anything else as a label.
pub fn resolve_identity(input: &str) -> Result<Identity, CliError> {
    let trimmed = input.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        trimmed
            .parse()
            .map_err(|source| CliError::InvalidIdentity {
                input: input.to_string(),
                source,
            })
    } else {
        Ok(Identity::from_label(trimmed))
    }
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Ledger file
    pub ledger_path: PathBuf,
    /// Acting identity, if given
    pub caller: Option<Identity>,
    /// Fixed clock reading, if pinned
    pub now_override: Option<Timestamp>,
    /// Registry settings
    pub registry: RegistryConfig,
}

impl CliConfig {
    /// Resolve arguments (clap has already merged the environment).
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let caller = cli.caller.as_deref().map(resolve_identity).transpose()?;
        Ok(Self {
            ledger_path: cli.ledger.clone(),
            caller,
            now_override: cli.now,
            registry: RegistryConfig::default(),
        })
    }

    /// The caller, or `MissingCaller`.
    pub fn require_caller(&self) -> Result<Identity, CliError> {
        self.caller.ok_or(CliError::MissingCaller)
    }
}
