//! Poll Registry Service - serialized access to the ledger
//!
//! Wraps the owned [`PollRegistry`] with a lock, a clock and an event sink.
//! Every mutation runs under one write lock: read the clock, check, mutate,
//! emit. Event order therefore equals mutation order.

use crate::config::RegistryConfig;
use crate::domain::{
    CreatePollRequest, FinalResult, Identity, OptionIndex, OptionInfo, PollError, PollId,
    PollInfo, PollRegistry, PollResult, RegistrySnapshot, SnapshotError, Timestamp,
};
use crate::metrics;
use crate::ports::inbound::PollRegistryApi;
use crate::ports::outbound::{EventSink, TimeSource};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Internal state guarded by the service lock
struct PollServiceState {
    /// The ledger
    registry: PollRegistry,
    /// Highest clock reading seen so far
    last_seen_time: Timestamp,
}

/// Poll Registry Service implementation
pub struct PollRegistryService<T, E>
where
    T: TimeSource,
    E: EventSink,
{
    config: RegistryConfig,
    state: Arc<RwLock<PollServiceState>>,
    time_source: Arc<T>,
    event_sink: Arc<E>,
}

impl<T, E> PollRegistryService<T, E>
where
    T: TimeSource,
    E: EventSink,
{
    /// Create a service over an empty registry
    pub fn new(config: RegistryConfig, time_source: Arc<T>, event_sink: Arc<E>) -> Self {
        Self::with_registry(config, PollRegistry::new(), time_source, event_sink)
    }

    /// Restore a service from a snapshot, validating every invariant
    pub fn from_snapshot(
        config: RegistryConfig,
        snapshot: RegistrySnapshot,
        time_source: Arc<T>,
        event_sink: Arc<E>,
    ) -> Result<Self, SnapshotError> {
        let registry = PollRegistry::restore(snapshot)?;
        info!(
            polls = registry.total_polls(),
            "Poll registry restored from snapshot"
        );
        Ok(Self::with_registry(config, registry, time_source, event_sink))
    }

    fn with_registry(
        config: RegistryConfig,
        registry: PollRegistry,
        time_source: Arc<T>,
        event_sink: Arc<E>,
    ) -> Self {
        // A restored ledger must not see a clock earlier than its newest poll
        let last_seen_time = registry.iter().map(|p| p.created_at).max().unwrap_or(0);
        Self {
            config,
            state: Arc::new(RwLock::new(PollServiceState {
                registry,
                last_seen_time,
            })),
            time_source,
            event_sink,
        }
    }

    /// Capture the current ledger
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state.read().registry.snapshot()
    }

    /// Read the clock, clamping regressions when configured.
    fn read_clock(&self, state: &mut PollServiceState) -> Timestamp {
        let reading = self.time_source.now();
        if reading < state.last_seen_time {
            if self.config.clamp_clock_regressions {
                warn!(
                    reading,
                    last_seen = state.last_seen_time,
                    "Clock regression detected, clamping"
                );
                return state.last_seen_time;
            }
            warn!(
                reading,
                last_seen = state.last_seen_time,
                "Clock regression detected"
            );
            return reading;
        }
        state.last_seen_time = reading;
        reading
    }

    fn rejected<R>(operation: &'static str, err: PollError) -> PollResult<R> {
        let reason = err.kind().as_str();
        warn!(operation, reason, error = %err, "Poll operation rejected");
        metrics::record_operation_rejected(operation, reason);
        Err(err)
    }
}

impl<T, E> PollRegistryApi for PollRegistryService<T, E>
where
    T: TimeSource,
    E: EventSink,
{
    fn create_poll(&self, creator: Identity, request: CreatePollRequest) -> PollResult<PollId> {
        let mut state = self.state.write();
        let now = self.read_clock(&mut state);

        let (poll_id, event) = match state.registry.create_poll(creator, request, now) {
            Ok(created) => created,
            Err(err) => return Self::rejected("create", err),
        };

        info!(poll_id, creator = %creator, created_at = now, "Poll created");
        metrics::record_poll_created();
        self.event_sink.emit(event);
        Ok(poll_id)
    }

    fn vote(
        &self,
        poll_id: PollId,
        option_index: OptionIndex,
        voter: Identity,
    ) -> PollResult<()> {
        let mut state = self.state.write();
        // Voting is not deadline-gated; the reading only advances the clamp
        let _ = self.read_clock(&mut state);

        let event = match state.registry.vote(poll_id, option_index, voter) {
            Ok(event) => event,
            Err(err) => return Self::rejected("vote", err),
        };

        debug!(poll_id, option_index, voter = %voter, "Vote cast");
        metrics::record_vote_cast();
        self.event_sink.emit(event);
        Ok(())
    }

    fn finalize_poll(&self, poll_id: PollId, caller: Identity) -> PollResult<OptionIndex> {
        let mut state = self.state.write();
        let now = self.read_clock(&mut state);

        let (winning_option, event) = match state.registry.finalize_poll(poll_id, caller, now) {
            Ok(finalized) => finalized,
            Err(err) => return Self::rejected("finalize", err),
        };

        info!(poll_id, winning_option, finalized_at = now, "Poll finalized");
        metrics::record_poll_finalized();
        self.event_sink.emit(event);
        Ok(winning_option)
    }

    fn get_poll_info(&self, poll_id: PollId) -> PollResult<PollInfo> {
        self.state.read().registry.poll_info(poll_id)
    }

    fn get_option_info(
        &self,
        poll_id: PollId,
        option_index: OptionIndex,
    ) -> PollResult<OptionInfo> {
        let info = self.state.read().registry.option_info(poll_id, option_index)?;
        if !info.exists {
            debug!(poll_id, option_index, "Option lookup out of range");
        }
        Ok(info)
    }

    fn get_options(&self, poll_id: PollId) -> PollResult<Vec<OptionInfo>> {
        self.state.read().registry.options(poll_id)
    }

    fn get_final_result(&self, poll_id: PollId) -> PollResult<FinalResult> {
        self.state.read().registry.final_result(poll_id)
    }

    fn check_if_voted(&self, poll_id: PollId, identity: &Identity) -> PollResult<bool> {
        self.state.read().registry.has_voted(poll_id, identity)
    }

    fn get_total_polls(&self) -> u64 {
        self.state.read().registry.total_polls()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::EventJournal;
    use crate::domain::PollErrorKind;
    use crate::events::PollEvent;
    use crate::ports::outbound::ManualTimeSource;

    type TestService = PollRegistryService<ManualTimeSource, EventJournal>;

    fn create_test_service(start: Timestamp) -> (TestService, Arc<ManualTimeSource>, Arc<EventJournal>) {
        let clock = Arc::new(ManualTimeSource::new(start));
        let journal = Arc::new(EventJournal::new());
        let service = PollRegistryService::new(
            RegistryConfig::default(),
            clock.clone(),
            journal.clone(),
        );
        (service, clock, journal)
    }

    fn creator() -> Identity {
        Identity::from_label("creator")
    }

    fn sample_request() -> CreatePollRequest {
        CreatePollRequest::new("Lunch", "", 60, ["Pizza", "Tacos"])
    }

    #[test]
    fn test_create_uses_clock() {
        let (service, _clock, journal) = create_test_service(1_000);
        let id = service.create_poll(creator(), sample_request()).unwrap();

        let info = service.get_poll_info(id).unwrap();
        assert_eq!(info.created_at, 1_000);
        assert_eq!(info.deadline, 1_060);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_failed_mutations_emit_nothing() {
        let (service, _clock, journal) = create_test_service(0);
        let empty_title = CreatePollRequest::new("", "", 60, ["a", "b"]);
        assert!(service.create_poll(creator(), empty_title).is_err());
        assert!(service.vote(0, 0, creator()).is_err());
        assert!(service.finalize_poll(0, creator()).is_err());
        assert!(journal.is_empty());
    }

    #[test]
    fn test_clock_regression_is_clamped() {
        let (service, clock, _journal) = create_test_service(1_000);
        let id = service.create_poll(creator(), sample_request()).unwrap();

        clock.set(1_060);
        // Observed once at the deadline...
        let voter = Identity::from_label("v");
        service.vote(id, 0, voter).unwrap();

        // ...so a clock that jumps back cannot make finalize too early again
        clock.set(900);
        assert_eq!(service.finalize_poll(id, creator()).unwrap(), 0);
    }

    #[test]
    fn test_clock_regression_unclamped() {
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let journal = Arc::new(EventJournal::new());
        let config = RegistryConfig {
            clamp_clock_regressions: false,
            ..RegistryConfig::default()
        };
        let service = PollRegistryService::new(config, clock.clone(), journal);
        let id = service.create_poll(creator(), sample_request()).unwrap();

        clock.set(1_060);
        service.vote(id, 1, Identity::from_label("v")).unwrap();
        clock.set(900);

        let err = service.finalize_poll(id, creator()).unwrap_err();
        assert_eq!(err.kind(), PollErrorKind::TooEarly);
    }

    #[test]
    fn test_events_in_mutation_order() {
        let (service, clock, journal) = create_test_service(10);
        let id = service.create_poll(creator(), sample_request()).unwrap();
        let voter = Identity::from_label("v");
        service.vote(id, 1, voter).unwrap();
        clock.advance(60);
        service.finalize_poll(id, creator()).unwrap();

        let events: Vec<PollEvent> = journal.events().into_iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                PollEvent::PollCreated {
                    poll_id: 0,
                    title: "Lunch".into(),
                    creator: creator(),
                },
                PollEvent::VoteCast {
                    poll_id: 0,
                    voter,
                    option_index: 1,
                },
                PollEvent::PollFinalized {
                    poll_id: 0,
                    winning_option: 1,
                },
            ]
        );
    }

    #[test]
    fn test_snapshot_roundtrip_through_service() {
        let (service, clock, _journal) = create_test_service(500);
        let id = service.create_poll(creator(), sample_request()).unwrap();
        service.vote(id, 0, Identity::from_label("v")).unwrap();

        let restored = PollRegistryService::from_snapshot(
            RegistryConfig::default(),
            service.snapshot(),
            clock.clone(),
            Arc::new(EventJournal::new()),
        )
        .unwrap();

        assert_eq!(restored.get_total_polls(), 1);
        assert_eq!(
            restored.get_poll_info(id).unwrap(),
            service.get_poll_info(id).unwrap()
        );
        assert!(restored
            .check_if_voted(id, &Identity::from_label("v"))
            .unwrap());
    }

    #[test]
    fn test_concurrent_votes_are_serialized() {
        let (service, _clock, journal) = create_test_service(0);
        let service = Arc::new(service);
        let id = service.create_poll(creator(), sample_request()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let voter = Identity::from_label(&format!("voter-{t}-{i}"));
                        service.vote(id, (i % 2) as OptionIndex, voter).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let info = service.get_poll_info(id).unwrap();
        assert_eq!(info.total_votes, 200);
        let options = service.get_options(id).unwrap();
        assert_eq!(options[0].vote_count + options[1].vote_count, 200);
        // One creation event plus one per vote, sequenced without gaps
        let sequences: Vec<u64> = journal.events().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (1..=201).collect::<Vec<_>>());
    }
}
