//! Driving Ports (API - Inbound)
//!
//! The operations the registry offers. The caller identity is an explicit
//! argument on every mutating call; the clock is read by the implementation.

use crate::domain::{
    CreatePollRequest, FinalResult, Identity, OptionIndex, OptionInfo, PollId, PollInfo,
    PollResult,
};

/// Primary Poll Registry API.
///
/// Mutations are atomic: each either applies all of its changes and emits
/// one event, or changes nothing and returns an error. Queries never mutate.
pub trait PollRegistryApi: Send + Sync {
    /// Create a poll owned by `creator`.
    ///
    /// # Returns
    /// The new poll's id (equal to the number of polls created before it)
    fn create_poll(&self, creator: Identity, request: CreatePollRequest) -> PollResult<PollId>;

    /// Cast `voter`'s single vote on a poll.
    fn vote(&self, poll_id: PollId, option_index: OptionIndex, voter: Identity)
        -> PollResult<()>;

    /// Close a poll once its deadline has passed. Creator only.
    ///
    /// # Returns
    /// The winning option index
    fn finalize_poll(&self, poll_id: PollId, caller: Identity) -> PollResult<OptionIndex>;

    /// Poll summary.
    fn get_poll_info(&self, poll_id: PollId) -> PollResult<PollInfo>;

    /// Option details; out-of-range indices return `exists == false`.
    fn get_option_info(&self, poll_id: PollId, option_index: OptionIndex)
        -> PollResult<OptionInfo>;

    /// Every option of a poll in index order.
    fn get_options(&self, poll_id: PollId) -> PollResult<Vec<OptionInfo>>;

    /// Winning option of a finalized poll.
    fn get_final_result(&self, poll_id: PollId) -> PollResult<FinalResult>;

    /// Whether `identity` voted on the poll.
    fn check_if_voted(&self, poll_id: PollId, identity: &Identity) -> PollResult<bool>;

    /// Number of polls ever created.
    fn get_total_polls(&self) -> u64;
}
