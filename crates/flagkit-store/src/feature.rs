use async_trait::async_trait;
use flagkit_types::Feature;

use crate::error::StoreError;

/// Persistence for feature flags.
///
/// `create` is also responsible for materializing one environment binding
/// per project environment; the engine never enumerates environments itself.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Fetch a feature by name, archived or not.
    async fn get(&self, name: &str) -> Result<Option<Feature>, StoreError>;

    /// True when a feature with this name exists (including archived).
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Owning project id for a feature name.
    async fn project_id(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Persist a new feature and its environment bindings.
    async fn create(&self, feature: Feature) -> Result<Feature, StoreError>;

    /// Overwrite mutable feature columns.
    async fn update(&self, feature: &Feature) -> Result<(), StoreError>;

    /// Soft-delete a feature.
    async fn archive(&self, name: &str) -> Result<(), StoreError>;

    /// Bring an archived feature back; revived flags come back disabled.
    async fn revive(&self, name: &str) -> Result<(), StoreError>;

    /// Physically remove a feature and its bindings.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;

    /// Toggle the staleness marker.
    async fn set_stale(&self, name: &str, stale: bool) -> Result<(), StoreError>;

    /// Move a feature to another project.
    async fn set_project(&self, name: &str, project: &str) -> Result<(), StoreError>;

    /// Count of non-archived flags across all projects, for the flag quota.
    async fn count_active(&self) -> Result<usize, StoreError>;
}
