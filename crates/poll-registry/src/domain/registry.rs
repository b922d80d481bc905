//! # Poll Registry
//!
//! The authoritative, append-only ledger of polls.
//!
//! Mutations take `&mut self`, the current time and the caller, and return
//! the event to emit. Locking, clock reads and event delivery belong to the
//! service layer.

use super::entities::{Identity, OptionIndex, Poll, PollId, PollOption, PollStatus, Timestamp};
use super::errors::{PollError, PollResult, SnapshotError};
use super::invariants::{self, MIN_OPTIONS};
use super::value_objects::{CreatePollRequest, FinalResult, OptionInfo, PollInfo};
use crate::events::PollEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Option count as an index type; every option must stay addressable.
fn addressable_option_count(len: usize) -> PollResult<OptionIndex> {
    OptionIndex::try_from(len).map_err(|_| {
        PollError::invalid(format!(
            "at most {} options allowed, got {len}",
            OptionIndex::MAX
        ))
    })
}

/// Serializable image of the whole registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Every poll, in id order.
    pub polls: Vec<Poll>,
}

impl RegistrySnapshot {
    /// Encodes as pretty JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes from JSON without validating invariants.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Owned poll store.
///
/// Ids are positions in `polls`, so they are dense by construction and the
/// next id is `polls.len()`.
#[derive(Clone, Debug, Default)]
pub struct PollRegistry {
    polls: Vec<Poll>,
}

impl PollRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of polls ever created (also the next id).
    pub fn total_polls(&self) -> u64 {
        self.polls.len() as u64
    }

    /// Iterates polls in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Poll> {
        self.polls.iter()
    }

    /// Looks up a poll.
    pub fn get(&self, poll_id: PollId) -> PollResult<&Poll> {
        usize::try_from(poll_id)
            .ok()
            .and_then(|index| self.polls.get(index))
            .ok_or(PollError::NotFound { poll_id })
    }

    fn get_mut(&mut self, poll_id: PollId) -> PollResult<&mut Poll> {
        usize::try_from(poll_id)
            .ok()
            .and_then(|index| self.polls.get_mut(index))
            .ok_or(PollError::NotFound { poll_id })
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Creates a poll owned by `creator`.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty title, fewer than two options, an empty
    /// option name, a zero duration, or a deadline past `u64::MAX`. A failed
    /// creation does not consume an id.
    pub fn create_poll(
        &mut self,
        creator: Identity,
        request: CreatePollRequest,
        now: Timestamp,
    ) -> PollResult<(PollId, PollEvent)> {
        if request.title.is_empty() {
            return Err(PollError::invalid("title must not be empty"));
        }
        if request.option_names.len() < MIN_OPTIONS {
            return Err(PollError::invalid(format!(
                "at least {MIN_OPTIONS} options required, got {}",
                request.option_names.len()
            )));
        }
        addressable_option_count(request.option_names.len())?;
        if let Some(index) = request.option_names.iter().position(String::is_empty) {
            return Err(PollError::invalid(format!(
                "option {index} has an empty name"
            )));
        }
        if request.duration_secs == 0 {
            return Err(PollError::invalid("duration must be greater than zero"));
        }
        let deadline = now
            .checked_add(request.duration_secs)
            .ok_or_else(|| PollError::invalid("deadline overflows the timestamp range"))?;

        let poll_id = self.total_polls();
        let poll = Poll {
            id: poll_id,
            title: request.title,
            description: request.description,
            creator,
            created_at: now,
            deadline,
            options: request
                .option_names
                .into_iter()
                .map(PollOption::new)
                .collect(),
            total_votes: 0,
            status: PollStatus::Active,
            voters: BTreeSet::new(),
        };

        let event = PollEvent::PollCreated {
            poll_id,
            title: poll.title.clone(),
            creator,
        };
        self.polls.push(poll);
        Ok((poll_id, event))
    }

    /// Casts `voter`'s vote for `option_index`.
    ///
    /// # Errors
    /// In check order: `NotFound`, `AlreadyFinalized`, `InvalidArgument`,
    /// `AlreadyVoted`.
    pub fn vote(
        &mut self,
        poll_id: PollId,
        option_index: OptionIndex,
        voter: Identity,
    ) -> PollResult<PollEvent> {
        self.get_mut(poll_id)?.cast_vote(option_index, voter)?;
        Ok(PollEvent::VoteCast {
            poll_id,
            voter,
            option_index,
        })
    }

    /// Finalizes a poll and returns the winning option.
    ///
    /// # Errors
    /// In check order: `NotFound`, `TooEarly`, `Unauthorized`,
    /// `AlreadyFinalized`.
    pub fn finalize_poll(
        &mut self,
        poll_id: PollId,
        caller: Identity,
        now: Timestamp,
    ) -> PollResult<(OptionIndex, PollEvent)> {
        let winning_option = self.get_mut(poll_id)?.finalize(&caller, now)?;
        Ok((
            winning_option,
            PollEvent::PollFinalized {
                poll_id,
                winning_option,
            },
        ))
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Poll summary.
    pub fn poll_info(&self, poll_id: PollId) -> PollResult<PollInfo> {
        self.get(poll_id).map(PollInfo::from)
    }

    /// Option lookup; out-of-range indices are a soft miss.
    pub fn option_info(&self, poll_id: PollId, option_index: OptionIndex) -> PollResult<OptionInfo> {
        let poll = self.get(poll_id)?;
        Ok(poll
            .option(option_index)
            .map(OptionInfo::from)
            .unwrap_or_else(OptionInfo::missing))
    }

    /// All options of a poll in index order.
    pub fn options(&self, poll_id: PollId) -> PollResult<Vec<OptionInfo>> {
        let poll = self.get(poll_id)?;
        Ok(poll.options.iter().map(OptionInfo::from).collect())
    }

    /// Winner name and count of a finalized poll.
    ///
    /// # Errors
    /// `NotFound`, or `NotFinalized` while the poll is active.
    pub fn final_result(&self, poll_id: PollId) -> PollResult<FinalResult> {
        let poll = self.get(poll_id)?;
        let option_index = poll
            .winning_option()
            .ok_or(PollError::NotFinalized { poll_id })?;
        let option = poll
            .option(option_index)
            .ok_or(PollError::NotFinalized { poll_id })?;
        Ok(FinalResult {
            option_index,
            name: option.name.clone(),
            vote_count: option.vote_count,
        })
    }

    /// Whether `identity` has voted on the poll.
    pub fn has_voted(&self, poll_id: PollId, identity: &Identity) -> PollResult<bool> {
        Ok(self.get(poll_id)?.has_voted(identity))
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Captures every poll.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            polls: self.polls.clone(),
        }
    }

    /// Rebuilds a registry, rejecting any snapshot that breaks an invariant.
    pub fn restore(snapshot: RegistrySnapshot) -> Result<Self, SnapshotError> {
        invariants::check_all(&snapshot.polls)?;
        Ok(Self {
            polls: snapshot.polls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PollErrorKind;

    fn alice() -> Identity {
        Identity::from_label("alice")
    }

    fn bob() -> Identity {
        Identity::from_label("bob")
    }

    fn request(options: &[&str]) -> CreatePollRequest {
        CreatePollRequest::new("Title", "Desc", 3_600, options.iter().copied())
    }

    fn registry_with_poll() -> PollRegistry {
        let mut registry = PollRegistry::new();
        registry
            .create_poll(alice(), request(&["a", "b", "c"]), 1_000)
            .unwrap();
        registry
    }

    #[test]
    fn test_create_assigns_dense_ids() {
        let mut registry = PollRegistry::new();
        for expected in 0..5 {
            let (id, event) = registry
                .create_poll(alice(), request(&["a", "b"]), 10)
                .unwrap();
            assert_eq!(id, expected);
            assert_eq!(event.poll_id(), expected);
        }
        assert_eq!(registry.total_polls(), 5);
    }

    #[test]
    fn test_create_validation_does_not_consume_ids() {
        let mut registry = PollRegistry::new();
        let bad = [
            CreatePollRequest::new("", "d", 60, ["a", "b"]),
            CreatePollRequest::new("t", "d", 60, ["only"]),
            CreatePollRequest::new("t", "d", 60, ["a", ""]),
            CreatePollRequest::new("t", "d", 0, ["a", "b"]),
        ];
        for req in bad {
            let err = registry.create_poll(alice(), req, 10).unwrap_err();
            assert_eq!(err.kind(), PollErrorKind::InvalidArgument);
        }
        assert_eq!(registry.total_polls(), 0);

        let (id, _) = registry.create_poll(alice(), request(&["a", "b"]), 10).unwrap();
        assert_eq!(id, 0);
    }

    #[test]
    fn test_create_deadline_overflow() {
        let mut registry = PollRegistry::new();
        let req = CreatePollRequest::new("t", "d", u64::MAX, ["a", "b"]);
        let err = registry.create_poll(alice(), req, 1).unwrap_err();
        assert_eq!(err.kind(), PollErrorKind::InvalidArgument);
    }

    #[test]
    fn test_option_count_must_fit_index_type() {
        assert_eq!(addressable_option_count(3), Ok(3));
        assert_eq!(
            addressable_option_count(OptionIndex::MAX as usize),
            Ok(OptionIndex::MAX)
        );
        #[cfg(target_pointer_width = "64")]
        assert_eq!(
            addressable_option_count(OptionIndex::MAX as usize + 1)
                .unwrap_err()
                .kind(),
            PollErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_create_sets_fields() {
        let registry = registry_with_poll();
        let info = registry.poll_info(0).unwrap();
        assert_eq!(info.creator, alice());
        assert_eq!(info.created_at, 1_000);
        assert_eq!(info.deadline, 4_600);
        assert_eq!(info.option_count, 3);
        assert!(info.is_active);
        assert!(!info.is_finalized);
        assert_eq!(info.winning_option, None);
    }

    #[test]
    fn test_vote_check_order() {
        let mut registry = registry_with_poll();

        assert_eq!(
            registry.vote(9, 0, bob()).unwrap_err().kind(),
            PollErrorKind::NotFound
        );
        assert_eq!(
            registry.vote(0, 3, bob()).unwrap_err().kind(),
            PollErrorKind::InvalidArgument
        );

        registry.vote(0, 1, bob()).unwrap();
        // Out-of-range index is reported before the duplicate voter
        assert_eq!(
            registry.vote(0, 3, bob()).unwrap_err().kind(),
            PollErrorKind::InvalidArgument
        );
        assert_eq!(
            registry.vote(0, 1, bob()).unwrap_err().kind(),
            PollErrorKind::AlreadyVoted
        );

        registry.finalize_poll(0, alice(), 4_600).unwrap();
        // Closed poll is reported before anything about the vote itself
        assert_eq!(
            registry.vote(0, 3, bob()).unwrap_err().kind(),
            PollErrorKind::AlreadyFinalized
        );
    }

    #[test]
    fn test_finalize_check_order() {
        let mut registry = registry_with_poll();

        assert_eq!(
            registry.finalize_poll(5, bob(), 0).unwrap_err().kind(),
            PollErrorKind::NotFound
        );
        assert_eq!(
            registry.finalize_poll(0, bob(), 4_599).unwrap_err().kind(),
            PollErrorKind::TooEarly
        );
        assert_eq!(
            registry.finalize_poll(0, bob(), 4_600).unwrap_err().kind(),
            PollErrorKind::Unauthorized
        );
        let (winner, event) = registry.finalize_poll(0, alice(), 4_600).unwrap();
        assert_eq!(winner, 0);
        assert_eq!(
            event,
            PollEvent::PollFinalized {
                poll_id: 0,
                winning_option: 0
            }
        );
        assert_eq!(
            registry.finalize_poll(0, alice(), 9_999).unwrap_err().kind(),
            PollErrorKind::AlreadyFinalized
        );
    }

    #[test]
    fn test_option_info_soft_miss() {
        let registry = registry_with_poll();
        let info = registry.option_info(0, 99).unwrap();
        assert!(!info.exists);
        assert!(info.name.is_empty());

        assert_eq!(
            registry.option_info(1, 0).unwrap_err().kind(),
            PollErrorKind::NotFound
        );
    }

    #[test]
    fn test_final_result() {
        let mut registry = registry_with_poll();
        registry.vote(0, 2, bob()).unwrap();

        assert_eq!(
            registry.final_result(0).unwrap_err().kind(),
            PollErrorKind::NotFinalized
        );

        registry.finalize_poll(0, alice(), 5_000).unwrap();
        let result = registry.final_result(0).unwrap();
        assert_eq!(result.option_index, 2);
        assert_eq!(result.name, "c");
        assert_eq!(result.vote_count, 1);
    }

    #[test]
    fn test_has_voted() {
        let mut registry = registry_with_poll();
        assert!(!registry.has_voted(0, &bob()).unwrap());
        registry.vote(0, 0, bob()).unwrap();
        assert!(registry.has_voted(0, &bob()).unwrap());
        assert!(registry.has_voted(3, &bob()).is_err());
    }

    #[test]
    fn test_snapshot_restore_equivalence() {
        let mut registry = registry_with_poll();
        registry.vote(0, 1, bob()).unwrap();
        registry.finalize_poll(0, alice(), 4_600).unwrap();
        registry
            .create_poll(bob(), request(&["x", "y"]), 5_000)
            .unwrap();

        let json = registry.snapshot().to_json().unwrap();
        let restored = PollRegistry::restore(RegistrySnapshot::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.total_polls(), 2);
        assert_eq!(restored.poll_info(0).unwrap(), registry.poll_info(0).unwrap());
        assert_eq!(restored.options(1).unwrap(), registry.options(1).unwrap());
        assert!(restored.has_voted(0, &bob()).unwrap());
    }

    #[test]
    fn test_restore_rejects_tampered_counts() {
        let mut registry = registry_with_poll();
        registry.vote(0, 0, bob()).unwrap();

        let mut snapshot = registry.snapshot();
        snapshot.polls[0].options[1].vote_count += 1;

        let err = PollRegistry::restore(snapshot).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::InvariantViolation(ref v) if v.invariant == "vote_conservation"
        ));
    }
}
