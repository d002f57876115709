use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constraint::Constraint;
use crate::variant::Variant;

/// Type-specific strategy parameters.
///
/// Insertion order is preserved; parameter values are strings on the wire
/// (e.g. `rollout = "100"`).
pub type Parameters = IndexMap<String, String>;

/// An activation strategy attached to one (feature, project, environment)
/// triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub id: Uuid,
    pub feature_name: String,
    pub project_id: String,
    pub environment: String,
    /// Strategy-type name, e.g. `"flexibleRollout"` or `"default"`.
    pub strategy_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Disabled strategies stay attached but never activate the feature.
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    /// Referenced segment ids; segment contents live elsewhere.
    #[serde(default)]
    pub segments: Vec<u64>,
    /// Evaluation order among sibling strategies; ties break by insertion.
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCreate {
    /// Strategy-type name.
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub segments: Vec<u64>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl StrategyCreate {
    /// A bare strategy of the given type with no parameters.
    #[must_use]
    pub fn of_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Sparse update for an existing strategy. `None` fields are left unchanged.
///
/// Project, feature, and environment of an existing strategy are immutable
/// and therefore absent here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyUpdate {
    /// Replace the strategy-type name.
    pub name: Option<String>,
    pub title: Option<String>,
    pub disabled: Option<bool>,
    pub parameters: Option<Parameters>,
    pub constraints: Option<Vec<Constraint>>,
    pub variants: Option<Vec<Variant>>,
    pub segments: Option<Vec<u64>>,
    pub sort_order: Option<i32>,
}

impl StrategyUpdate {
    /// Apply this sparse update to a snapshot, returning the merged strategy.
    #[must_use]
    pub fn apply(&self, mut strategy: Strategy) -> Strategy {
        if let Some(name) = &self.name {
            strategy.strategy_name = name.clone();
        }
        if let Some(title) = &self.title {
            strategy.title = Some(title.clone());
        }
        if let Some(disabled) = self.disabled {
            strategy.disabled = disabled;
        }
        if let Some(parameters) = &self.parameters {
            strategy.parameters = parameters.clone();
        }
        if let Some(constraints) = &self.constraints {
            strategy.constraints = constraints.clone();
        }
        if let Some(variants) = &self.variants {
            strategy.variants = variants.clone();
        }
        if let Some(segments) = &self.segments {
            strategy.segments = segments.clone();
        }
        if let Some(sort_order) = self.sort_order {
            strategy.sort_order = sort_order;
        }
        strategy
    }
}
