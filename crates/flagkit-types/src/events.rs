use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constraint::Constraint;
use crate::strategy::{Parameters, Strategy};
use crate::variant::Variant;

/// The acting identity recorded on every audit event.
///
/// Callers normalize whatever identity they hold (session user, API token,
/// system actor) into this shape before invoking the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditIdentity {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl AuditIdentity {
    /// Identity for a named user with no source address.
    #[must_use]
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ip: None,
        }
    }

    /// Identity for internal callers (migrations, approved change requests).
    #[must_use]
    pub fn system() -> Self {
        Self::named("system")
    }
}

/// Audit event types emitted by the engine, one per mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    FeatureCreated,
    FeatureMetadataUpdated,
    FeatureArchived,
    FeatureRevived,
    FeatureDeleted,
    FeatureStaleOn,
    FeatureStaleOff,
    FeatureProjectChange,
    FeatureStrategyAdd,
    FeatureStrategyUpdate,
    FeatureStrategyRemove,
    FeatureEnvironmentEnabled,
    FeatureEnvironmentDisabled,
    StrategiesReordered,
}

impl EventType {
    /// Wire name, as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeatureCreated => "feature-created",
            Self::FeatureMetadataUpdated => "feature-metadata-updated",
            Self::FeatureArchived => "feature-archived",
            Self::FeatureRevived => "feature-revived",
            Self::FeatureDeleted => "feature-deleted",
            Self::FeatureStaleOn => "feature-stale-on",
            Self::FeatureStaleOff => "feature-stale-off",
            Self::FeatureProjectChange => "feature-project-change",
            Self::FeatureStrategyAdd => "feature-strategy-add",
            Self::FeatureStrategyUpdate => "feature-strategy-update",
            Self::FeatureStrategyRemove => "feature-strategy-remove",
            Self::FeatureEnvironmentEnabled => "feature-environment-enabled",
            Self::FeatureEnvironmentDisabled => "feature-environment-disabled",
            Self::StrategiesReordered => "strategies-reordered",
        }
    }
}

/// An immutable audit record with paired before/after snapshots.
///
/// `pre_data` and `post_data` hold the public projection of the mutated
/// resource; either side may be absent (creations have no `pre_data`,
/// deletions no `post_data`). Events are append-only and never mutated by
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub created_by: AuditIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// New event with a fresh id and no scope or snapshots.
    #[must_use]
    pub fn new(event_type: EventType, created_by: &AuditIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            created_by: created_by.clone(),
            project: None,
            feature_name: None,
            environment: None,
            pre_data: None,
            post_data: None,
            created_at: Utc::now(),
        }
    }

    /// Scope the event to a project.
    #[must_use]
    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Scope the event to a feature.
    #[must_use]
    pub fn for_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature_name = Some(feature.into());
        self
    }

    /// Scope the event to an environment.
    #[must_use]
    pub fn in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Attach the before snapshot.
    #[must_use]
    pub fn with_pre_data(mut self, pre: impl Serialize) -> Self {
        self.pre_data = serde_json::to_value(pre).ok();
        self
    }

    /// Attach the after snapshot.
    #[must_use]
    pub fn with_post_data(mut self, post: impl Serialize) -> Self {
        self.post_data = serde_json::to_value(post).ok();
        self
    }
}

/// Public projection of a strategy, used in audit snapshots.
///
/// Strips row bookkeeping (feature/project/environment ownership columns,
/// creation timestamp) that an audit consumer resolves from the event scope
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStrategy {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub disabled: bool,
    pub parameters: Parameters,
    pub constraints: Vec<Constraint>,
    pub variants: Vec<Variant>,
    pub segments: Vec<u64>,
    pub sort_order: i32,
}

impl From<&Strategy> for PublicStrategy {
    fn from(strategy: &Strategy) -> Self {
        Self {
            id: strategy.id,
            name: strategy.strategy_name.clone(),
            title: strategy.title.clone(),
            disabled: strategy.disabled,
            parameters: strategy.parameters.clone(),
            constraints: strategy.constraints.clone(),
            variants: strategy.variants.clone(),
            segments: strategy.segments.clone(),
            sort_order: strategy.sort_order,
        }
    }
}
