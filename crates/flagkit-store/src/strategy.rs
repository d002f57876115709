use async_trait::async_trait;
use flagkit_types::Strategy;
use uuid::Uuid;

use crate::error::StoreError;

/// Persistence for activation strategies.
#[async_trait]
pub trait StrategyStore: Send + Sync {
    /// Fetch a strategy by id.
    async fn get(&self, id: Uuid) -> Result<Option<Strategy>, StoreError>;

    /// Persist a new strategy row.
    ///
    /// Raises [`StoreError::ForeignKeyViolation`] with
    /// [`FK_STRATEGY_ENVIRONMENT`](crate::FK_STRATEGY_ENVIRONMENT) when the
    /// target environment is not connected to the strategy's project.
    async fn create(&self, strategy: Strategy) -> Result<Strategy, StoreError>;

    /// Overwrite an existing strategy row.
    async fn update(&self, strategy: &Strategy) -> Result<(), StoreError>;

    /// Remove a strategy row; absent ids are not an error.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Strategies for one (project, feature, environment) triple, ordered by
    /// `sort_order` with ties broken by insertion.
    async fn list_for(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
    ) -> Result<Vec<Strategy>, StoreError>;

    /// Update a single strategy's sort order.
    async fn set_sort_order(&self, id: Uuid, sort_order: i32) -> Result<(), StoreError>;

    /// Remove every strategy for a (feature, environment) pair.
    async fn delete_all_for(&self, feature: &str, environment: &str) -> Result<(), StoreError>;

    /// True when a strategy type with this name is registered.
    async fn has_strategy_type(&self, name: &str) -> Result<bool, StoreError>;
}
