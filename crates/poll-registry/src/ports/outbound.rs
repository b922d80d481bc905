//! Outbound (Driven) ports for the Poll Registry.
//!
//! These traits define what the registry needs from its host: a clock and
//! somewhere to send events.

use crate::domain::Timestamp;
use crate::events::PollEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Time source for deadline checks.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in seconds since the UNIX epoch.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    time: AtomicU64,
}

impl ManualTimeSource {
    /// Starts the clock at `initial`.
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    /// Moves the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.time.fetch_add(secs, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute value (may go backwards).
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Destination for registry events.
///
/// Called exactly once per successful mutation, while the registry write
/// lock is held. Implementations must not block and cannot fail.
pub trait EventSink: Send + Sync {
    /// Delivers one event.
    fn emit(&self, event: PollEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: PollEvent) {
        (**self).emit(event)
    }
}

/// Fan-out: every event goes to both sinks, left first.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&self, event: PollEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}
