//! Core domain entities for the Poll Registry.
//!
//! A [`Poll`] owns its options and voter set. All mutation goes through
//! [`Poll::cast_vote`] and [`Poll::finalize`], which check their own
//! preconditions; the registry only resolves poll ids.

use super::errors::{PollError, PollResult};
use super::tally::select_winner;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use sha3::{Digest, Keccak256};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sequential poll identifier (dense, 0-based).
pub type PollId = u64;

/// Index into a poll's option list.
pub type OptionIndex = u32;

/// Seconds since UNIX epoch.
pub type Timestamp = u64;

/// Identity byte length (20 bytes, address-sized).
pub const IDENTITY_LEN: usize = 20;

/// Opaque caller identity.
///
/// Rendered as `0x`-prefixed lowercase hex. Uniqueness and authentication are
/// the caller's concern; the registry only compares identities for equality.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// Wraps raw identity bytes.
    pub const fn new(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derives a stable identity from a human label.
    ///
    /// Last 20 bytes of `keccak256(label)`, the same shape as an account
    /// address derived from a public key.
    pub fn from_label(label: &str) -> Self {
        let digest = Keccak256::digest(label.as_bytes());
        let mut bytes = [0u8; IDENTITY_LEN];
        bytes.copy_from_slice(&digest[digest.len() - IDENTITY_LEN..]);
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }
}

impl From<[u8; IDENTITY_LEN]> for Identity {
    fn from(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

/// Failure to parse an [`Identity`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityParseError {
    /// Not valid hex.
    #[error("invalid hex in identity: {0}")]
    InvalidHex(String),

    /// Decoded to the wrong number of bytes.
    #[error("identity must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Decoded length
        actual: usize,
    },
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let decoded =
            hex::decode(digits).map_err(|e| IdentityParseError::InvalidHex(e.to_string()))?;
        let bytes: [u8; IDENTITY_LEN] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| IdentityParseError::InvalidLength {
                    expected: IDENTITY_LEN,
                    actual: decoded.len(),
                })?;
        Ok(Self(bytes))
    }
}

/// Poll lifecycle state.
///
/// ```text
/// [ACTIVE] ──finalize (deadline reached, creator)──→ [FINALIZED] (terminal)
/// ```
///
/// Expiry is not a state: a poll past its deadline stays `Active` until the
/// creator finalizes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollStatus {
    /// Accepting votes.
    #[default]
    Active,
    /// Closed; the winner is frozen.
    Finalized {
        /// Index of the winning option.
        winning_option: OptionIndex,
    },
}

/// A single selectable choice within a poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Option label.
    pub name: String,
    /// Votes received.
    pub vote_count: u64,
}

impl PollOption {
    /// Creates an option with zero votes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vote_count: 0,
        }
    }
}

/// A votable proposition with a fixed, ordered option set.
///
/// INVARIANTS:
/// - `options.len() >= 2`, fixed after creation
/// - `total_votes == Σ options[i].vote_count`
/// - `voters.len() == total_votes` (one vote per identity)
/// - `Finalized` is terminal and its `winning_option` never changes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Sequential identifier.
    pub id: PollId,
    /// Non-empty title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Identity that created the poll (only one allowed to finalize).
    pub creator: Identity,
    /// Creation time.
    pub created_at: Timestamp,
    /// `created_at + duration`.
    pub deadline: Timestamp,
    /// Ordered options.
    pub options: Vec<PollOption>,
    /// Number of votes cast.
    pub total_votes: u64,
    /// Lifecycle state.
    pub status: PollStatus,
    /// Identities that have voted.
    pub voters: BTreeSet<Identity>,
}

impl Poll {
    /// Returns true until the poll is finalized.
    pub fn is_active(&self) -> bool {
        matches!(self.status, PollStatus::Active)
    }

    /// Returns true once the poll is finalized.
    pub fn is_finalized(&self) -> bool {
        matches!(self.status, PollStatus::Finalized { .. })
    }

    /// Winning option index, only once finalized.
    pub fn winning_option(&self) -> Option<OptionIndex> {
        match self.status {
            PollStatus::Active => None,
            PollStatus::Finalized { winning_option } => Some(winning_option),
        }
    }

    /// Number of options (saturates at `OptionIndex::MAX`).
    pub fn option_count(&self) -> OptionIndex {
        OptionIndex::try_from(self.options.len()).unwrap_or(OptionIndex::MAX)
    }

    /// Looks up an option by index.
    pub fn option(&self, index: OptionIndex) -> Option<&PollOption> {
        self.options.get(index as usize)
    }

    /// Returns true if `identity` has voted on this poll.
    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.voters.contains(identity)
    }

    /// Returns true if `now` is at or past the deadline.
    pub fn is_past_deadline(&self, now: Timestamp) -> bool {
        now >= self.deadline
    }

    /// Records a vote.
    ///
    /// Checks run in order: still active, option in range, voter not yet seen.
    /// Nothing is mutated unless every check passes. The deadline is not
    /// consulted; closing is an explicit finalize.
    ///
    /// # Errors
    /// - `AlreadyFinalized` if the poll is closed
    /// - `InvalidArgument` if `option_index` is out of range
    /// - `AlreadyVoted` if `voter` already voted
    pub fn cast_vote(&mut self, option_index: OptionIndex, voter: Identity) -> PollResult<()> {
        if self.is_finalized() {
            return Err(PollError::AlreadyFinalized { poll_id: self.id });
        }

        let option_count = self.option_count();
        let option = self.options.get_mut(option_index as usize).ok_or_else(|| {
            PollError::InvalidArgument {
                reason: format!(
                    "option index {} out of range (poll has {} options)",
                    option_index, option_count
                ),
            }
        })?;

        if self.voters.contains(&voter) {
            return Err(PollError::AlreadyVoted {
                poll_id: self.id,
                voter,
            });
        }

        self.voters.insert(voter);
        option.vote_count += 1;
        self.total_votes += 1;
        Ok(())
    }

    /// Closes the poll and freezes the winner.
    ///
    /// Preconditions in order: deadline reached, caller is the creator, not
    /// already finalized.
    ///
    /// # Errors
    /// - `TooEarly` if `now < deadline`
    /// - `Unauthorized` if `caller` is not the creator
    /// - `AlreadyFinalized` on a second call
    pub fn finalize(&mut self, caller: &Identity, now: Timestamp) -> PollResult<OptionIndex> {
        if !self.is_past_deadline(now) {
            return Err(PollError::TooEarly {
                poll_id: self.id,
                deadline: self.deadline,
                now,
            });
        }

        if *caller != self.creator {
            return Err(PollError::Unauthorized {
                poll_id: self.id,
                caller: *caller,
            });
        }

        if self.is_finalized() {
            return Err(PollError::AlreadyFinalized { poll_id: self.id });
        }

        let winning_option = select_winner(&self.options);
        self.status = PollStatus::Finalized { winning_option };
        Ok(winning_option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(byte: u8) -> Identity {
        Identity::new([byte; IDENTITY_LEN])
    }

    fn create_test_poll() -> Poll {
        Poll {
            id: 7,
            title: "Lunch".to_string(),
            description: String::new(),
            creator: voter(0xC0),
            created_at: 1_000,
            deadline: 1_060,
            options: vec![PollOption::new("Pizza"), PollOption::new("Sushi")],
            total_votes: 0,
            status: PollStatus::Active,
            voters: BTreeSet::new(),
        }
    }

    #[test]
    fn test_identity_display_roundtrip() {
        let id = voter(0xAB);
        let text = id.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 2 + 2 * IDENTITY_LEN);
        assert_eq!(text.parse::<Identity>().unwrap(), id);
    }

    #[test]
    fn test_identity_parse_accepts_uppercase_prefix() {
        let text = format!("0X{}", "11".repeat(IDENTITY_LEN));
        assert_eq!(text.parse::<Identity>().unwrap(), voter(0x11));
    }

    #[test]
    fn test_identity_parse_rejects_wrong_length() {
        let err = "0xdeadbeef".parse::<Identity>().unwrap_err();
        assert_eq!(
            err,
            IdentityParseError::InvalidLength {
                expected: IDENTITY_LEN,
                actual: 4
            }
        );
    }

    #[test]
    fn test_identity_parse_rejects_bad_hex() {
        let err = "0xzz".parse::<Identity>().unwrap_err();
        assert!(matches!(err, IdentityParseError::InvalidHex(_)));
    }

    #[test]
    fn test_identity_from_label_is_stable_and_distinct() {
        assert_eq!(Identity::from_label("alice"), Identity::from_label("alice"));
        assert_ne!(Identity::from_label("alice"), Identity::from_label("bob"));
    }

    #[test]
    fn test_cast_vote_updates_counts() {
        let mut poll = create_test_poll();
        poll.cast_vote(1, voter(1)).unwrap();

        assert_eq!(poll.options[1].vote_count, 1);
        assert_eq!(poll.total_votes, 1);
        assert!(poll.has_voted(&voter(1)));
        assert!(!poll.has_voted(&voter(2)));
    }

    #[test]
    fn test_cast_vote_out_of_range_leaves_state() {
        let mut poll = create_test_poll();
        let err = poll.cast_vote(2, voter(1)).unwrap_err();

        assert!(matches!(err, PollError::InvalidArgument { .. }));
        assert_eq!(poll.total_votes, 0);
        assert!(poll.voters.is_empty());
    }

    #[test]
    fn test_cast_vote_twice_rejected() {
        let mut poll = create_test_poll();
        poll.cast_vote(0, voter(1)).unwrap();
        let err = poll.cast_vote(1, voter(1)).unwrap_err();

        assert!(matches!(err, PollError::AlreadyVoted { poll_id: 7, .. }));
        assert_eq!(poll.options[0].vote_count, 1);
        assert_eq!(poll.options[1].vote_count, 0);
    }

    #[test]
    fn test_vote_after_deadline_still_accepted() {
        let mut poll = create_test_poll();
        // No clock argument: the deadline does not gate voting.
        assert!(poll.is_past_deadline(5_000));
        poll.cast_vote(0, voter(1)).unwrap();
        assert_eq!(poll.total_votes, 1);
    }

    #[test]
    fn test_finalize_order_of_checks() {
        let mut poll = create_test_poll();
        let stranger = voter(0x55);

        // Too early wins over unauthorized
        let err = poll.finalize(&stranger, 1_059).unwrap_err();
        assert!(matches!(err, PollError::TooEarly { deadline: 1_060, now: 1_059, .. }));

        let err = poll.finalize(&stranger, 1_060).unwrap_err();
        assert!(matches!(err, PollError::Unauthorized { .. }));

        let creator = poll.creator;
        assert_eq!(poll.finalize(&creator, 1_060).unwrap(), 0);
        assert!(poll.is_finalized());
        assert!(!poll.is_active());

        let err = poll.finalize(&creator, 2_000).unwrap_err();
        assert!(matches!(err, PollError::AlreadyFinalized { poll_id: 7 }));
    }

    #[test]
    fn test_vote_after_finalize_rejected() {
        let mut poll = create_test_poll();
        let creator = poll.creator;
        poll.finalize(&creator, 1_060).unwrap();

        let err = poll.cast_vote(0, voter(1)).unwrap_err();
        assert!(matches!(err, PollError::AlreadyFinalized { .. }));
        assert_eq!(poll.total_votes, 0);
    }

    #[test]
    fn test_status_serializes_tagged() {
        let json = serde_json::to_string(&PollStatus::Finalized { winning_option: 2 }).unwrap();
        assert_eq!(json, r#"{"state":"finalized","winning_option":2}"#);
    }
}
