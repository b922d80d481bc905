//! Recording, logging and no-op event sinks.

use crate::events::{PollEvent, SequencedEvent};
use crate::ports::outbound::EventSink;
use parking_lot::Mutex;
use tracing::info;

/// Append-only recorded event log.
///
/// Sequence numbers continue from whatever history it was seeded with.
#[derive(Debug, Default)]
pub struct EventJournal {
    events: Mutex<Vec<SequencedEvent>>,
}

impl EventJournal {
    /// Empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal seeded with previously recorded events.
    pub fn with_history(history: Vec<SequencedEvent>) -> Self {
        Self {
            events: Mutex::new(history),
        }
    }

    /// Copy of every recorded event.
    pub fn events(&self) -> Vec<SequencedEvent> {
        self.events.lock().clone()
    }

    /// Consumes the journal, returning its events.
    pub fn into_events(self) -> Vec<SequencedEvent> {
        self.events.into_inner()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Sequence number of the newest event (0 when empty).
    pub fn last_sequence(&self) -> u64 {
        self.events.lock().last().map(|e| e.sequence).unwrap_or(0)
    }
}

impl EventSink for EventJournal {
    fn emit(&self, event: PollEvent) {
        let mut events = self.events.lock();
        let sequence = events.last().map(|e| e.sequence).unwrap_or(0) + 1;
        events.push(SequencedEvent { sequence, event });
    }
}

/// Logs every event at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: PollEvent) {
        match &event {
            PollEvent::PollCreated {
                poll_id,
                title,
                creator,
            } => info!(poll_id, title = %title, creator = %creator, "event: poll_created"),
            PollEvent::VoteCast {
                poll_id,
                voter,
                option_index,
            } => info!(poll_id, voter = %voter, option_index, "event: vote_cast"),
            PollEvent::PollFinalized {
                poll_id,
                winning_option,
            } => info!(poll_id, winning_option, "event: poll_finalized"),
        }
    }
}

/// Discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: PollEvent) {}
}
