use async_trait::async_trait;
use flagkit_types::StrategyCreate;

use crate::error::StoreError;

/// Read model for per-project configuration the engine consults.
#[async_trait]
pub trait ProjectReadModel: Send + Sync {
    /// True when the project exists.
    async fn exists(&self, project: &str) -> Result<bool, StoreError>;

    /// Optional regex every new flag name in this project must match.
    async fn feature_naming_pattern(&self, project: &str)
        -> Result<Option<String>, StoreError>;

    /// The project's configured default strategy for an environment, used
    /// when enabling a feature that has no strategies. `None` falls back to
    /// the engine's built-in default.
    async fn default_strategy(
        &self,
        project: &str,
        environment: &str,
    ) -> Result<Option<StrategyCreate>, StoreError>;
}
