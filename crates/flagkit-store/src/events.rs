use async_trait::async_trait;
use flagkit_types::Event;

use crate::error::StoreError;

/// Append-only audit log.
///
/// Emission is fire-and-forget relative to the caller's business result: a
/// sink failure never rolls back the mutation that produced the event.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append a single event.
    async fn store_event(&self, event: Event) -> Result<(), StoreError>;

    /// Append a batch of events in order.
    async fn store_events(&self, events: Vec<Event>) -> Result<(), StoreError>;
}
