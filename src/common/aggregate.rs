use crate::common::{DomainEvent, DomainResult, EventEnvelope, EventMetadata};
use serde::{Deserialize, Serialize};

pub trait AggregateRoot: Send + Sync + Clone {
    type Event: DomainEvent + Serialize + for<'de> Deserialize<'de>;

    const AGGREGATE_TYPE: &'static str;

    fn aggregate_id(&self) -> &str;

    /// Number of events applied to this aggregate so far, committed or not.
    fn version(&self) -> u64;

    /// Apply an event to update the aggregate state
    fn apply(&mut self, event: &Self::Event) -> DomainResult<()>;

    fn uncommitted_events(&self) -> &[Self::Event];

    fn mark_events_as_committed(&mut self);

    fn add_event(&mut self, event: Self::Event);

    /// Record an event and apply it in one step.
    fn raise(&mut self, event: Self::Event) -> DomainResult<()> {
        self.apply(&event)?;
        self.add_event(event);
        Ok(())
    }

    /// Version the event store holds before the uncommitted events are appended.
    fn committed_version(&self) -> u64 {
        self.version() - self.uncommitted_events().len() as u64
    }

    /// Wrap the uncommitted events into envelopes ready for an `EventStore`.
    fn pending_envelopes(&self, metadata: &EventMetadata) -> Result<Vec<EventEnvelope>, serde_json::Error> {
        let base = self.committed_version();
        self.uncommitted_events()
            .iter()
            .enumerate()
            .map(|(i, event)| {
                EventEnvelope::new(event, Self::AGGREGATE_TYPE, base + i as u64 + 1, metadata.clone())
            })
            .collect()
    }
}
