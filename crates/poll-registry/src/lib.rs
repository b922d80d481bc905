//! # Poll Registry
//!
//! Time-bounded polls, one vote per identity, deterministic finalization.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Append-only ledger**: polls get dense sequential ids and are never deleted
//! - **Single vote**: each identity votes at most once per poll
//! - **Time-gated finalization**: only the creator, only at or after the deadline
//! - **Deterministic winner**: highest count, ties to the lowest index
//!
//! ## Architecture
//!
//! ```text
//! caller ──(identity, args)──→ PollRegistryService ──→ PollRegistry (domain)
//!                                   │    │
//!                     TimeSource ───┘    └──→ EventSink (bus / journal / tracing)
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! [ACTIVE] ──finalize (now >= deadline, caller == creator)──→ [FINALIZED]
//!    ↑ │                                                         (terminal)
//!    └─┘ vote (also after the deadline, until finalized)
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | ids dense from 0 | id = position in the ledger |
//! | ≥ 2 options, fixed | checked on create, options never edited |
//! | `total_votes == Σ vote_count` | single vote path updates both |
//! | one vote per identity | voter set checked before counting |
//! | finalization one-way | `PollStatus::Finalized` is terminal |
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use poll_registry::{
//!     CreatePollRequest, EventJournal, Identity, ManualTimeSource, PollRegistryApi,
//!     PollRegistryService, RegistryConfig,
//! };
//!
//! let clock = Arc::new(ManualTimeSource::new(1_000));
//! let journal = Arc::new(EventJournal::new());
//! let service = PollRegistryService::new(RegistryConfig::default(), clock.clone(), journal);
//!
//! let alice = Identity::from_label("alice");
//! let id = service
//!     .create_poll(alice, CreatePollRequest::new("Lunch", "", 60, ["Pizza", "Sushi"]))
//!     .unwrap();
//! service.vote(id, 1, Identity::from_label("bob")).unwrap();
//!
//! clock.advance(60);
//! assert_eq!(service.finalize_poll(id, alice).unwrap(), 1);
//! assert_eq!(service.get_final_result(id).unwrap().name, "Sushi");
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{EventJournal, InMemoryEventBus, NoOpEventSink, TracingEventSink};
pub use config::RegistryConfig;
pub use domain::{
    CreatePollRequest, FinalResult, Identity, IdentityParseError, InvariantViolation,
    OptionIndex, OptionInfo, Poll, PollError, PollErrorKind, PollId, PollInfo, PollOption,
    PollRegistry, PollResult, PollStatus, RegistrySnapshot, SnapshotError, Timestamp,
};
pub use events::{PollEvent, SequencedEvent};
pub use ports::inbound::PollRegistryApi;
pub use ports::outbound::{EventSink, ManualTimeSource, SystemTimeSource, TimeSource};
pub use service::PollRegistryService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
