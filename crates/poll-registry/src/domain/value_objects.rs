//! Request and query value objects.

use super::entities::{Identity, OptionIndex, Poll, PollId, PollOption, Timestamp};
use serde::{Deserialize, Serialize};

/// Arguments to `create_poll`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePollRequest {
    /// Non-empty title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Seconds until the deadline; must be > 0.
    pub duration_secs: u64,
    /// At least two non-empty names.
    pub option_names: Vec<String>,
}

impl CreatePollRequest {
    /// Builds a request from borrowed parts.
    pub fn new<S: Into<String>>(
        title: impl Into<String>,
        description: impl Into<String>,
        duration_secs: u64,
        option_names: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            duration_secs,
            option_names: option_names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Poll summary returned by `get_poll_info`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollInfo {
    pub poll_id: PollId,
    pub title: String,
    pub description: String,
    pub creator: Identity,
    pub total_votes: u64,
    pub is_active: bool,
    pub is_finalized: bool,
    /// `None` until finalized.
    pub winning_option: Option<OptionIndex>,
    pub created_at: Timestamp,
    pub deadline: Timestamp,
    pub option_count: u32,
}

impl From<&Poll> for PollInfo {
    fn from(poll: &Poll) -> Self {
        Self {
            poll_id: poll.id,
            title: poll.title.clone(),
            description: poll.description.clone(),
            creator: poll.creator,
            total_votes: poll.total_votes,
            is_active: poll.is_active(),
            is_finalized: poll.is_finalized(),
            winning_option: poll.winning_option(),
            created_at: poll.created_at,
            deadline: poll.deadline,
            option_count: poll.option_count(),
        }
    }
}

/// Option lookup result.
///
/// An out-of-range index is a soft miss: `exists == false`, empty name and
/// zero count.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInfo {
    pub name: String,
    pub vote_count: u64,
    pub exists: bool,
}

impl OptionInfo {
    /// The soft not-found value.
    pub fn missing() -> Self {
        Self::default()
    }
}

impl From<&PollOption> for OptionInfo {
    fn from(option: &PollOption) -> Self {
        Self {
            name: option.name.clone(),
            vote_count: option.vote_count,
            exists: true,
        }
    }
}

/// Winning option of a finalized poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub option_index: OptionIndex,
    pub name: String,
    pub vote_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = CreatePollRequest::new("t", "d", 60, ["a", "b"]);
        assert_eq!(req.option_names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(req.duration_secs, 60);
    }

    #[test]
    fn test_missing_option_info() {
        let info = OptionInfo::missing();
        assert!(!info.exists);
        assert!(info.name.is_empty());
        assert_eq!(info.vote_count, 0);
    }
}
