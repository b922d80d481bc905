//! # Poll Events
//!
//! Notifications emitted once per successful mutation, in mutation order.
//! Events are a side channel; nothing in the registry reads them back.

use crate::domain::{Identity, OptionIndex, PollId};
use serde::{Deserialize, Serialize};

/// Registry notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PollEvent {
    /// A poll was created.
    PollCreated {
        poll_id: PollId,
        title: String,
        creator: Identity,
    },
    /// A vote was recorded.
    VoteCast {
        poll_id: PollId,
        voter: Identity,
        option_index: OptionIndex,
    },
    /// A poll was closed and its winner frozen.
    PollFinalized {
        poll_id: PollId,
        winning_option: OptionIndex,
    },
}

impl PollEvent {
    /// Poll the event refers to.
    pub fn poll_id(&self) -> PollId {
        match self {
            Self::PollCreated { poll_id, .. }
            | Self::VoteCast { poll_id, .. }
            | Self::PollFinalized { poll_id, .. } => *poll_id,
        }
    }

    /// Stable snake_case event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PollCreated { .. } => "poll_created",
            Self::VoteCast { .. } => "vote_cast",
            Self::PollFinalized { .. } => "poll_finalized",
        }
    }
}

/// Event stamped with its position in the stream (starting at 1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub sequence: u64,
    #[serde(flatten)]
    pub event: PollEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = PollEvent::VoteCast {
            poll_id: 4,
            voter: Identity::from_label("v"),
            option_index: 1,
        };
        assert_eq!(event.poll_id(), 4);
        assert_eq!(event.name(), "vote_cast");
    }

    #[test]
    fn test_sequenced_event_json_shape() {
        let sequenced = SequencedEvent {
            sequence: 3,
            event: PollEvent::PollFinalized {
                poll_id: 0,
                winning_option: 2,
            },
        };
        let value = serde_json::to_value(&sequenced).unwrap();
        assert_eq!(value["sequence"], 3);
        assert_eq!(value["event"], "poll_finalized");
        assert_eq!(value["winning_option"], 2);

        let back: SequencedEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, sequenced);
    }
}
