//! Winner selection.

use super::entities::{OptionIndex, PollOption};

/// Picks the winning option index.
///
/// Scans in index order and only replaces the current best on a strictly
/// greater count, so ties go to the lowest index and a poll with no votes
/// is won by option 0. An empty slice also yields 0; polls always carry at
/// least two options.
pub fn select_winner(options: &[PollOption]) -> OptionIndex {
    let mut best_index = 0usize;
    let mut best_count = 0u64;

    for (index, option) in options.iter().enumerate() {
        if option.vote_count > best_count {
            best_index = index;
            best_count = option.vote_count;
        }
    }

    best_index as OptionIndex
}
