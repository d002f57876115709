use async_trait::async_trait;
use flagkit_types::ResourceLimits;

use crate::error::StoreError;

/// Source of the current quota configuration.
#[async_trait]
pub trait ResourceLimitProvider: Send + Sync {
    /// Current quotas; re-read per mutation so configuration changes apply
    /// without a restart.
    async fn resource_limits(&self) -> Result<ResourceLimits, StoreError>;
}
