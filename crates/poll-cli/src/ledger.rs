//! # File-Backed Ledger
//!
//! The registry snapshot plus the event audit log, stored as pretty JSON.
//!
//! Each command holds an exclusive `fs2` lock on a sidecar `<ledger>.lock`
//! file for its whole duration. Saves write a temporary sibling file and
//! rename it over the ledger, so readers never see a half-written file.

use fs2::FileExt;
use poll_registry::{RegistrySnapshot, SequencedEvent};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Ledger format version written by this build.
pub const LEDGER_VERSION: u32 = 1;

/// How long to wait for another process to release the ledger.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors from reading, writing or locking the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Filesystem failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// File is not a valid ledger document
    #[error("Malformed ledger {}: {source}", .path.display())]
    Malformed {
        /// Ledger path
        path: PathBuf,
        /// Parse error
        source: serde_json::Error,
    },

    /// Written by an incompatible build
    #[error("Unsupported ledger version {found} (this build reads version {supported})")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Version this build understands
        supported: u32,
    },

    /// Another process holds the lock
    #[error("Ledger already in use{} ({})", holder(.pid), .path.display())]
    Locked {
        /// Lock file path
        path: PathBuf,
        /// PID recorded by the holder, if readable
        pid: Option<u32>,
    },
}

/// ` by process <pid>` when the holder's PID is known.
fn holder(pid: &Option<u32>) -> String {
    pid.map(|p| format!(" by process {p}")).unwrap_or_default()
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> LedgerError + '_ {
    move |source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `<ledger file name><suffix>` in the ledger's directory.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "poll-ledger".into());
    name.push(suffix);
    path.with_file_name(name)
}

// =============================================================================
// LEDGER FILE
// =============================================================================

/// On-disk ledger document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFile {
    /// Format version
    pub version: u32,
    /// Every poll
    pub registry: RegistrySnapshot,
    /// Audit log of every successful mutation
    #[serde(default)]
    pub events: Vec<SequencedEvent>,
}

impl Default for LedgerFile {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            registry: RegistrySnapshot::default(),
            events: Vec::new(),
        }
    }
}

impl LedgerFile {
    /// Load a ledger; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No ledger file, starting empty");
                return Ok(Self::default());
            }
            Err(e) => return Err(io_error(path)(e)),
        };

        let ledger: Self =
            serde_json::from_str(&contents).map_err(|source| LedgerError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        if ledger.version != LEDGER_VERSION {
            return Err(LedgerError::UnsupportedVersion {
                found: ledger.version,
                supported: LEDGER_VERSION,
            });
        }

        debug!(
            path = %path.display(),
            polls = ledger.registry.polls.len(),
            events = ledger.events.len(),
            "Ledger loaded"
        );
        Ok(ledger)
    }

    /// Write the ledger atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| LedgerError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let tmp_path = sibling(path, ".tmp");
        {
            let mut tmp = File::create(&tmp_path).map_err(io_error(&tmp_path))?;
            tmp.write_all(json.as_bytes())
                .map_err(io_error(&tmp_path))?;
            tmp.write_all(b"\n").map_err(io_error(&tmp_path))?;
            tmp.sync_all().map_err(io_error(&tmp_path))?;
        }
        fs::rename(&tmp_path, path).map_err(io_error(path))?;

        info!(
            path = %path.display(),
            polls = self.registry.polls.len(),
            events = self.events.len(),
            "Ledger saved"
        );
        Ok(())
    }
}

// =============================================================================
// LEDGER LOCK
// =============================================================================

/// Exclusive lock on a ledger file.
///
/// Released on drop (RAII). The lock file itself is left in place.
#[derive(Debug)]
pub struct LedgerLock {
    /// The lock file handle (kept open to maintain lock)
    file: File,
    /// Path to the lock file
    path: PathBuf,
}

impl LedgerLock {
    /// Acquire the lock for `ledger_path`, waiting up to `DEFAULT_LOCK_TIMEOUT`.
    pub fn acquire(ledger_path: &Path) -> Result<Self, LedgerError> {
        Self::acquire_with_timeout(ledger_path, DEFAULT_LOCK_TIMEOUT)
    }

    /// Acquire the lock, retrying with exponential backoff until `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Locked` if another process still holds the lock
    /// when the timeout expires.
    pub fn acquire_with_timeout(ledger_path: &Path, timeout: Duration) -> Result<Self, LedgerError> {
        let lock_path = sibling(ledger_path, ".lock");
        let deadline = Instant::now() + timeout;
        let mut retry_delay = Duration::from_millis(20);

        loop {
            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(io_error(&lock_path))?;

            match file.try_lock_exclusive() {
                Ok(()) => {
                    // Record our PID for the benefit of whoever waits next
                    file.set_len(0).map_err(io_error(&lock_path))?;
                    writeln!(file, "{}", std::process::id()).map_err(io_error(&lock_path))?;
                    debug!(path = %lock_path.display(), "Ledger lock acquired");
                    return Ok(Self {
                        file,
                        path: lock_path,
                    });
                }
                Err(_) if Instant::now() < deadline => {
                    drop(file);
                    std::thread::sleep(retry_delay);
                    retry_delay = (retry_delay * 2).min(Duration::from_millis(250));
                }
                Err(_) => {
                    let pid = fs::read_to_string(&lock_path)
                        .ok()
                        .and_then(|s| s.trim().parse().ok());
                    return Err(LedgerError::Locked {
                        path: lock_path,
                        pid,
                    });
                }
            }
        }
    }

    /// Get the path to the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
