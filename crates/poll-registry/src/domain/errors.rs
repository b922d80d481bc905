//! # Domain Errors
//!
//! Error types for the Poll Registry.
//!
//! Every `PollError` is synchronous and non-retryable without changed
//! arguments or elapsed time. A failed operation leaves no partial state.

use super::entities::{Identity, PollId, Timestamp};
use thiserror::Error;

/// Result alias for registry operations.
pub type PollResult<T> = Result<T, PollError>;

/// Poll registry error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Malformed input to create or vote.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong
        reason: String,
    },

    /// Referenced poll does not exist.
    #[error("Poll {poll_id} does not exist")]
    NotFound {
        /// Requested poll
        poll_id: PollId,
    },

    /// Identity already voted on this poll.
    #[error("{voter} already voted on poll {poll_id}")]
    AlreadyVoted {
        /// Poll voted on
        poll_id: PollId,
        /// Repeat voter
        voter: Identity,
    },

    /// Finalize attempted before the deadline.
    #[error("Poll {poll_id} cannot be finalized before {deadline} (now {now})")]
    TooEarly {
        /// Poll being finalized
        poll_id: PollId,
        /// Poll deadline
        deadline: Timestamp,
        /// Time of the attempt
        now: Timestamp,
    },

    /// Finalize attempted by someone other than the creator.
    #[error("{caller} is not the creator of poll {poll_id}")]
    Unauthorized {
        /// Poll being finalized
        poll_id: PollId,
        /// Rejected caller
        caller: Identity,
    },

    /// Poll is already closed (finalize twice, or vote after close).
    #[error("Poll {poll_id} is already finalized")]
    AlreadyFinalized {
        /// Closed poll
        poll_id: PollId,
    },

    /// Final result requested before finalization.
    #[error("Poll {poll_id} has not been finalized")]
    NotFinalized {
        /// Open poll
        poll_id: PollId,
    },
}

/// Fieldless discriminant of [`PollError`] for branching and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollErrorKind {
    /// See [`PollError::InvalidArgument`]
    InvalidArgument,
    /// See [`PollError::NotFound`]
    NotFound,
    /// See [`PollError::AlreadyVoted`]
    AlreadyVoted,
    /// See [`PollError::TooEarly`]
    TooEarly,
    /// See [`PollError::Unauthorized`]
    Unauthorized,
    /// See [`PollError::AlreadyFinalized`]
    AlreadyFinalized,
    /// See [`PollError::NotFinalized`]
    NotFinalized,
}

impl PollErrorKind {
    /// Stable snake_case label used in metrics and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::AlreadyVoted => "already_voted",
            Self::TooEarly => "too_early",
            Self::Unauthorized => "unauthorized",
            Self::AlreadyFinalized => "already_finalized",
            Self::NotFinalized => "not_finalized",
        }
    }
}

impl std::fmt::Display for PollErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PollError {
    /// Returns the fieldless kind of this error.
    pub fn kind(&self) -> PollErrorKind {
        match self {
            Self::InvalidArgument { .. } => PollErrorKind::InvalidArgument,
            Self::NotFound { .. } => PollErrorKind::NotFound,
            Self::AlreadyVoted { .. } => PollErrorKind::AlreadyVoted,
            Self::TooEarly { .. } => PollErrorKind::TooEarly,
            Self::Unauthorized { .. } => PollErrorKind::Unauthorized,
            Self::AlreadyFinalized { .. } => PollErrorKind::AlreadyFinalized,
            Self::NotFinalized { .. } => PollErrorKind::NotFinalized,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// A broken registry invariant, found while validating a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invariant '{invariant}' violated by poll {poll_id}: {detail}")]
pub struct InvariantViolation {
    /// Offending poll (or the position it was found at)
    pub poll_id: PollId,
    /// Short invariant name
    pub invariant: &'static str,
    /// Human-readable detail
    pub detail: String,
}

/// Snapshot restore/encode failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot content breaks a registry invariant.
    #[error("Snapshot rejected: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    /// JSON encoding or decoding failed.
    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
