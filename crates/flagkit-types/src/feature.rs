use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feature flag.
///
/// Identified by `name`, which is globally unique and immutable once the
/// flag is created. A feature belongs to exactly one project and is archived
/// (soft-deleted) rather than physically removed until a separate purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Globally unique, URL-friendly flag name.
    pub name: String,
    /// Owning project id.
    pub project: String,
    pub description: Option<String>,
    /// Marked stale by the staleness toggle; informational only.
    pub stale: bool,
    /// Soft-deleted. Archived flags reject further mutation.
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new feature flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Sparse update for feature metadata. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureMetadataUpdate {
    pub description: Option<String>,
    pub stale: Option<bool>,
}

impl FeatureMetadataUpdate {
    /// Apply this sparse update to a snapshot, returning the merged feature.
    #[must_use]
    pub fn apply(&self, mut feature: Feature) -> Feature {
        if let Some(description) = &self.description {
            feature.description = Some(description.clone());
        }
        if let Some(stale) = self.stale {
            feature.stale = stale;
        }
        feature
    }
}

/// A (feature, environment) pair with its activation state.
///
/// One binding exists per project environment; it is created with the
/// feature and removed with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentBinding {
    pub feature_name: String,
    pub environment: String,
    pub enabled: bool,
}

/// A directed "feature depends on parent" edge.
///
/// A feature with existing dependents cannot be archived or deleted, and a
/// removal set must not leave any surviving feature pointing at a parent
/// that is gone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// The dependent (child) feature.
    pub feature: String,
    /// The feature it depends on.
    pub parent: String,
}
