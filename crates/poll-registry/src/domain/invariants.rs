//! # Domain Invariants
//!
//! Business rules that must hold for every poll at all times.
//!
//! The live registry upholds these by construction. They are checked
//! explicitly when a snapshot is restored and by the randomized tests.

use super::entities::{Poll, PollId, PollStatus};
use super::errors::InvariantViolation;
use super::tally::select_winner;

/// Minimum options per poll.
pub const MIN_OPTIONS: usize = 2;

fn violation(poll_id: PollId, invariant: &'static str, detail: String) -> InvariantViolation {
    InvariantViolation {
        poll_id,
        invariant,
        detail,
    }
}

/// Invariant: ids start at 0 and increase by exactly 1.
pub fn invariant_dense_ids(polls: &[Poll]) -> Result<(), InvariantViolation> {
    for (position, poll) in polls.iter().enumerate() {
        if poll.id != position as PollId {
            return Err(violation(
                poll.id,
                "dense_ids",
                format!("found at position {position}"),
            ));
        }
    }
    Ok(())
}

/// Invariant: at least two options.
pub fn invariant_min_options(poll: &Poll) -> Result<(), InvariantViolation> {
    if poll.options.len() < MIN_OPTIONS {
        return Err(violation(
            poll.id,
            "min_options",
            format!("{} option(s), need {MIN_OPTIONS}", poll.options.len()),
        ));
    }
    Ok(())
}

/// Invariant: title and option names are non-empty.
pub fn invariant_non_empty_text(poll: &Poll) -> Result<(), InvariantViolation> {
    if poll.title.is_empty() {
        return Err(violation(poll.id, "non_empty_text", "empty title".into()));
    }
    if let Some(index) = poll.options.iter().position(|o| o.name.is_empty()) {
        return Err(violation(
            poll.id,
            "non_empty_text",
            format!("option {index} has an empty name"),
        ));
    }
    Ok(())
}

/// Invariant: deadline is strictly after creation (duration > 0).
pub fn invariant_deadline_after_creation(poll: &Poll) -> Result<(), InvariantViolation> {
    if poll.deadline <= poll.created_at {
        return Err(violation(
            poll.id,
            "deadline_after_creation",
            format!("deadline {} <= created_at {}", poll.deadline, poll.created_at),
        ));
    }
    Ok(())
}

/// Invariant: `total_votes == Σ vote_count`.
pub fn invariant_vote_conservation(poll: &Poll) -> Result<(), InvariantViolation> {
    let sum = poll
        .options
        .iter()
        .try_fold(0u64, |acc, o| acc.checked_add(o.vote_count));
    match sum {
        Some(sum) if sum == poll.total_votes => Ok(()),
        Some(sum) => Err(violation(
            poll.id,
            "vote_conservation",
            format!("total {} != sum {sum}", poll.total_votes),
        )),
        None => Err(violation(
            poll.id,
            "vote_conservation",
            "option counts overflow".into(),
        )),
    }
}

/// Invariant: each voter counted exactly once.
///
/// `voters` is a set, so duplicates are impossible; its size must equal
/// the number of votes.
pub fn invariant_one_vote_per_identity(poll: &Poll) -> Result<(), InvariantViolation> {
    if poll.voters.len() as u64 != poll.total_votes {
        return Err(violation(
            poll.id,
            "one_vote_per_identity",
            format!("{} voters for {} votes", poll.voters.len(), poll.total_votes),
        ));
    }
    Ok(())
}

/// Invariant: a finalized winner is in range and matches the tally.
pub fn invariant_winner_consistent(poll: &Poll) -> Result<(), InvariantViolation> {
    if let PollStatus::Finalized { winning_option } = poll.status {
        if winning_option as usize >= poll.options.len() {
            return Err(violation(
                poll.id,
                "winner_consistent",
                format!("winner {winning_option} out of range"),
            ));
        }
        let expected = select_winner(&poll.options);
        if winning_option != expected {
            return Err(violation(
                poll.id,
                "winner_consistent",
                format!("winner {winning_option}, tally says {expected}"),
            ));
        }
    }
    Ok(())
}

/// Runs every per-poll invariant.
pub fn check_poll(poll: &Poll) -> Result<(), InvariantViolation> {
    invariant_min_options(poll)?;
    invariant_non_empty_text(poll)?;
    invariant_deadline_after_creation(poll)?;
    invariant_vote_conservation(poll)?;
    invariant_one_vote_per_identity(poll)?;
    invariant_winner_consistent(poll)?;
    Ok(())
}

/// Runs every invariant over a full poll list.
pub fn check_all(polls: &[Poll]) -> Result<(), InvariantViolation> {
    invariant_dense_ids(polls)?;
    polls.iter().try_for_each(check_poll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Identity, PollOption};
    use std::collections::BTreeSet;

    fn valid_poll(id: PollId) -> Poll {
        let voters: BTreeSet<Identity> = [1u8, 2, 3]
            .iter()
            .map(|b| Identity::new([*b; 20]))
            .collect();
        Poll {
            id,
            title: "Colors".into(),
            description: String::new(),
            creator: Identity::new([9; 20]),
            created_at: 100,
            deadline: 200,
            options: vec![
                PollOption {
                    name: "Red".into(),
                    vote_count: 2,
                },
                PollOption {
                    name: "Blue".into(),
                    vote_count: 1,
                },
            ],
            total_votes: 3,
            status: PollStatus::Active,
            voters,
        }
    }

    #[test]
    fn test_valid_poll_passes() {
        assert!(check_poll(&valid_poll(0)).is_ok());
        assert!(check_all(&[valid_poll(0), valid_poll(1)]).is_ok());
    }

    #[test]
    fn test_dense_ids_detects_gap() {
        let err = check_all(&[valid_poll(0), valid_poll(2)]).unwrap_err();
        assert_eq!(err.invariant, "dense_ids");
    }

    #[test]
    fn test_min_options() {
        let mut poll = valid_poll(0);
        poll.options.truncate(1);
        assert_eq!(invariant_min_options(&poll).unwrap_err().invariant, "min_options");
    }

    #[test]
    fn test_vote_conservation() {
        let mut poll = valid_poll(0);
        poll.total_votes = 4;
        assert_eq!(
            invariant_vote_conservation(&poll).unwrap_err().invariant,
            "vote_conservation"
        );
    }

    #[test]
    fn test_vote_conservation_overflow() {
        let mut poll = valid_poll(0);
        poll.options[0].vote_count = u64::MAX;
        assert!(invariant_vote_conservation(&poll).is_err());
    }

    #[test]
    fn test_voter_count_mismatch() {
        let mut poll = valid_poll(0);
        poll.voters.clear();
        assert_eq!(
            invariant_one_vote_per_identity(&poll).unwrap_err().invariant,
            "one_vote_per_identity"
        );
    }

    #[test]
    fn test_winner_must_match_tally() {
        let mut poll = valid_poll(0);
        poll.status = PollStatus::Finalized { winning_option: 1 };
        assert!(invariant_winner_consistent(&poll).is_err());

        poll.status = PollStatus::Finalized { winning_option: 5 };
        assert!(invariant_winner_consistent(&poll).is_err());

        poll.status = PollStatus::Finalized { winning_option: 0 };
        assert!(invariant_winner_consistent(&poll).is_ok());
    }

    #[test]
    fn test_deadline_and_text() {
        let mut poll = valid_poll(0);
        poll.deadline = poll.created_at;
        assert!(invariant_deadline_after_creation(&poll).is_err());

        let mut poll = valid_poll(0);
        poll.options[1].name.clear();
        assert!(invariant_non_empty_text(&poll).is_err());
    }
}
