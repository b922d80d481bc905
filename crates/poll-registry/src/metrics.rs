//! # Poll Registry Metrics
//!
//! Prometheus counters for registry activity.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! poll-registry = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `poll_registry_polls_created_total` - Counter of polls created
//! - `poll_registry_votes_cast_total` - Counter of votes recorded
//! - `poll_registry_polls_finalized_total` - Counter of polls finalized
//! - `poll_registry_operations_rejected_total` - Counter of rejected mutations (by operation, reason)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total polls created
    pub static ref POLLS_CREATED: IntCounter = register_int_counter!(
        "poll_registry_polls_created_total",
        "Total number of polls created"
    )
    .expect("Failed to create POLLS_CREATED metric");

    /// Total votes cast
    pub static ref VOTES_CAST: IntCounter = register_int_counter!(
        "poll_registry_votes_cast_total",
        "Total number of votes recorded"
    )
    .expect("Failed to create VOTES_CAST metric");

    /// Total polls finalized
    pub static ref POLLS_FINALIZED: IntCounter = register_int_counter!(
        "poll_registry_polls_finalized_total",
        "Total number of polls finalized"
    )
    .expect("Failed to create POLLS_FINALIZED metric");

    /// Rejected mutations, labeled by operation and error kind
    pub static ref OPERATIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "poll_registry_operations_rejected_total",
        "Total number of rejected registry mutations",
        &["operation", "reason"]
    )
    .expect("Failed to create OPERATIONS_REJECTED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a poll created
#[cfg(feature = "metrics")]
pub fn record_poll_created() {
    POLLS_CREATED.inc();
}

/// Record a vote cast
#[cfg(feature = "metrics")]
pub fn record_vote_cast() {
    VOTES_CAST.inc();
}

/// Record a poll finalized
#[cfg(feature = "metrics")]
pub fn record_poll_finalized() {
    POLLS_FINALIZED.inc();
}

/// Record a rejected mutation
#[cfg(feature = "metrics")]
pub fn record_operation_rejected(operation: &str, reason: &str) {
    OPERATIONS_REJECTED
        .with_label_values(&[operation, reason])
        .inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_poll_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_vote_cast() {}

#[cfg(not(feature = "metrics"))]
pub fn record_poll_finalized() {}

#[cfg(not(feature = "metrics"))]
pub fn record_operation_rejected(_operation: &str, _reason: &str) {}
