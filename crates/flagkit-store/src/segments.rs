use async_trait::async_trait;
use flagkit_types::Segment;
use uuid::Uuid;

use crate::error::StoreError;

/// Segment lookups and strategy-segment attachment.
///
/// Segment contents (their constraints) are managed outside the engine;
/// only identity and project scoping are visible here.
#[async_trait]
pub trait SegmentService: Send + Sync {
    /// Fetch a segment by id.
    async fn get(&self, id: u64) -> Result<Option<Segment>, StoreError>;

    /// Segments currently attached to a strategy.
    async fn get_for_strategy(&self, strategy_id: Uuid) -> Result<Vec<Segment>, StoreError>;

    /// Replace a strategy's segment references.
    async fn set_strategy_segments(
        &self,
        strategy_id: Uuid,
        segments: &[u64],
    ) -> Result<(), StoreError>;
}
