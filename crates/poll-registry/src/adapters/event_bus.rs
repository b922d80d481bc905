//! # In-Memory Event Bus
//!
//! Broadcasts registry events to any number of subscribers.

use crate::config::RegistryConfig;
use crate::events::{PollEvent, SequencedEvent};
use crate::ports::outbound::EventSink;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Event sink backed by `tokio::sync::broadcast`.
///
/// Each event is stamped with a sequence number starting at 1. Slow
/// subscribers that fall more than `capacity` events behind observe
/// `RecvError::Lagged`; the registry is never blocked by them.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<SequencedEvent>,

    /// Total events published (also the last sequence number).
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Create a bus sized by `RegistryConfig::event_bus_capacity`.
    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::with_capacity(config.event_bus_capacity)
    }

    /// Subscribe to every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SequencedEvent> {
        debug!(
            subscribers = self.sender.receiver_count() + 1,
            "New event subscription"
        );
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the total number of events published.
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for InMemoryEventBus {
    fn emit(&self, event: PollEvent) {
        // Always increment counter (event was attempted)
        let sequence = self.events_published.fetch_add(1, Ordering::SeqCst) + 1;
        let name = event.name();
        let poll_id = event.poll_id();

        match self.sender.send(SequencedEvent { sequence, event }) {
            Ok(receivers) => {
                debug!(event = name, poll_id, sequence, receivers, "Event published");
            }
            Err(e) => {
                // No receivers - event is dropped
                warn!(
                    event = name,
                    poll_id,
                    sequence,
                    error = %e,
                    "Event dropped (no receivers)"
                );
            }
        }
    }
}
