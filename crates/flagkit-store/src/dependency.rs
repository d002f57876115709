use async_trait::async_trait;

use crate::error::StoreError;

/// Read model over the feature dependency graph.
///
/// Edges point child → parent ("feature depends on parent"). The engine
/// only reads the graph; dependency mutation happens elsewhere.
#[async_trait]
pub trait DependencyReadModel: Send + Sync {
    /// Names of features `feature` depends on.
    async fn parents(&self, feature: &str) -> Result<Vec<String>, StoreError>;

    /// Names of features that depend on any of `features`.
    async fn children(&self, features: &[String]) -> Result<Vec<String>, StoreError>;

    /// Features outside `removed` whose parent is inside `removed`.
    ///
    /// A non-empty result means removing `removed` would orphan someone.
    async fn orphan_parents(&self, removed: &[String]) -> Result<Vec<String>, StoreError>;

    /// True when any of `features` participates in a dependency, as child
    /// or parent.
    async fn have_dependencies(&self, features: &[String]) -> Result<bool, StoreError>;
}
