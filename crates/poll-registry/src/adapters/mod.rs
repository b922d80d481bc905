//! Adapters for the Poll Registry outbound ports.

pub mod event_bus;
pub mod sinks;

pub use event_bus::{InMemoryEventBus, DEFAULT_CHANNEL_CAPACITY};
pub use sinks::{EventJournal, NoOpEventSink, TracingEventSink};
