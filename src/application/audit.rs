use crate::common::{AggregateRoot, ApplicationError, ApplicationResult, EventMetadata, EventStore};

/// Append an aggregate's uncommitted events to the audit log and mark them committed.
pub(crate) async fn commit_events<A: AggregateRoot>(
    store: &dyn EventStore,
    aggregate: &mut A,
    metadata: EventMetadata,
) -> ApplicationResult<()> {
    if aggregate.uncommitted_events().is_empty() {
        return Ok(());
    }
    let envelopes = aggregate
        .pending_envelopes(&metadata)
        .map_err(|e| ApplicationError::EventStore(format!("Failed to build event envelopes: {}", e)))?;

    store
        .append_events(aggregate.aggregate_id(), aggregate.committed_version(), envelopes)
        .await
        .map_err(ApplicationError::EventStore)?;

    aggregate.mark_events_as_committed();
    Ok(())
}
