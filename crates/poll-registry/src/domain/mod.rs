//! # Domain Layer
//!
//! Pure poll lifecycle logic: no locks, no clocks, no I/O.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod registry;
pub mod tally;
pub mod value_objects;

pub use entities::{
    Identity, IdentityParseError, OptionIndex, Poll, PollId, PollOption, PollStatus, Timestamp,
    IDENTITY_LEN,
};
pub use errors::{InvariantViolation, PollError, PollErrorKind, PollResult, SnapshotError};
pub use registry::{PollRegistry, RegistrySnapshot};
pub use tally::select_winner;
pub use value_objects::{CreatePollRequest, FinalResult, OptionInfo, PollInfo};
