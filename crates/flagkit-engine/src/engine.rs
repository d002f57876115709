//! Strategy & variant lifecycle engine
//!
//! The orchestrating core. Every mutation follows the same sequence:
//! change-request gate → structural lookups → validation (constraints,
//! limits, variants) → persist through the store seams → dependency guard
//! on removal paths → audit event emission.
//!
//! Compound operations issue sequential store writes with no surrounding
//! transaction; a failure partway through leaves earlier writes in place.
//! The store calls are individually durable and the audit trail plus
//! idempotent re-reads converge the state, so atomicity is deliberately
//! not provided here.

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flagkit_store::{
    AccessService, ChangeRequestAccess, ContextFieldStore, DependencyReadModel,
    EnvironmentBindingStore, EventSink, FeatureStore, ProjectReadModel, ResourceLimitProvider,
    SegmentService, StrategyStore,
};
use flagkit_types::{
    AuditIdentity, Event, EventType, Feature, FeatureCreate, FeatureMetadataUpdate, Parameters,
    PublicStrategy, Strategy, StrategyCreate, StrategyUpdate,
};

use crate::change_request::ChangeRequestGate;
use crate::constraint::ConstraintValidator;
use crate::dependency::DependencyGuard;
use crate::error::EngineError;
use crate::limits::{check_before_add, check_constraint_limits};
use crate::variant::fix_variant_weights;

/// Capability required to create strategies through the protected path.
pub const CREATE_FEATURE_STRATEGY: &str = "CREATE_FEATURE_STRATEGY";

/// Strategy type that receives gradual-rollout parameter defaults.
pub const FLEXIBLE_ROLLOUT: &str = "flexibleRollout";

static FLAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._~-]+$").expect("flag name pattern is valid"));

/// Engine-local configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Stickiness applied to synthesized rollout strategies when the
    /// caller provides none.
    pub default_stickiness: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_stickiness: "default".to_string(),
        }
    }
}

/// The store and service seams the engine consumes, injected once at
/// construction. No ambient singletons.
pub struct EngineStores {
    /// Feature flag persistence.
    pub features: Arc<dyn FeatureStore>,
    /// Strategy persistence.
    pub strategies: Arc<dyn StrategyStore>,
    /// (feature, environment) activation state.
    pub bindings: Arc<dyn EnvironmentBindingStore>,
    /// Context field definitions for constraint validation.
    pub context_fields: Arc<dyn ContextFieldStore>,
    /// Segment lookups and attachment.
    pub segments: Arc<dyn SegmentService>,
    /// Append-only audit log.
    pub events: Arc<dyn EventSink>,
    /// Feature dependency graph read model.
    pub dependencies: Arc<dyn DependencyReadModel>,
    /// Change-request enablement and bypass read model.
    pub change_requests: Arc<dyn ChangeRequestAccess>,
    /// Capability checks.
    pub access: Arc<dyn AccessService>,
    /// Per-project configuration read model.
    pub projects: Arc<dyn ProjectReadModel>,
    /// Quota configuration.
    pub limits: Arc<dyn ResourceLimitProvider>,
}

/// A single strategy's new position, for reorder operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrderUpdate {
    /// Strategy to move.
    pub id: Uuid,
    /// New sort order; ties break by insertion.
    pub sort_order: i32,
}

/// The feature-flag configuration mutation engine.
///
/// Holds interface-typed collaborators and sequences the guard layers
/// around every mutation. Public operations come in pairs: the plain form
/// consults the change-request gate (and, for strategy creation, the
/// access service); the `*_unprotected` form skips both and is meant for
/// internal callers and the change-request execution pipeline.
pub struct FlagEngine {
    features: Arc<dyn FeatureStore>,
    strategies: Arc<dyn StrategyStore>,
    bindings: Arc<dyn EnvironmentBindingStore>,
    segments: Arc<dyn SegmentService>,
    events: Arc<dyn EventSink>,
    access: Arc<dyn AccessService>,
    projects: Arc<dyn ProjectReadModel>,
    limits: Arc<dyn ResourceLimitProvider>,
    constraints: ConstraintValidator,
    dependency_guard: DependencyGuard,
    gate: ChangeRequestGate,
    config: EngineConfig,
}

impl FlagEngine {
    /// Wire up the engine from its collaborator seams.
    #[must_use]
    pub fn new(config: EngineConfig, stores: EngineStores) -> Self {
        Self {
            features: stores.features,
            strategies: stores.strategies,
            bindings: stores.bindings,
            segments: stores.segments,
            events: stores.events,
            access: stores.access,
            projects: stores.projects,
            limits: stores.limits,
            constraints: ConstraintValidator::new(stores.context_fields),
            dependency_guard: DependencyGuard::new(stores.dependencies),
            gate: ChangeRequestGate::new(stores.change_requests),
            config,
        }
    }

    // ============================================================
    // Feature lifecycle
    // ============================================================

    /// Create a feature flag in a project.
    ///
    /// The name must be a URL-friendly slug, globally unique, and match the
    /// project's naming pattern when one is configured. Environment
    /// bindings are materialized by the feature store.
    pub async fn create_feature(
        &self,
        project: &str,
        input: FeatureCreate,
        user: &AuditIdentity,
    ) -> Result<Feature, EngineError> {
        tracing::info!(project, feature = %input.name, "creating feature flag");

        if !FLAG_NAME.is_match(&input.name) {
            return Err(EngineError::bad_data(format!(
                "feature name '{}' must be URL friendly",
                input.name
            )));
        }
        if !self.projects.exists(project).await? {
            return Err(EngineError::not_found("project", project));
        }
        if let Some(pattern) = self.projects.feature_naming_pattern(project).await? {
            // Project patterns are stored unanchored.
            let anchored = Regex::new(&format!("^{pattern}$")).map_err(|_| {
                EngineError::bad_data(format!(
                    "project naming pattern '{pattern}' is not a valid pattern"
                ))
            })?;
            if !anchored.is_match(&input.name) {
                return Err(EngineError::Pattern {
                    name: input.name.clone(),
                    pattern,
                });
            }
        }
        if self.features.exists(&input.name).await? {
            return Err(EngineError::NameExists(input.name));
        }

        let limits = self.limits.resource_limits().await?;
        let current = self.features.count_active().await?;
        check_before_add("feature flag", current, limits.feature_flags)?;

        let feature = Feature {
            name: input.name,
            project: project.to_string(),
            description: input.description,
            stale: false,
            archived: false,
            created_at: Utc::now(),
        };
        let stored = self.features.create(feature).await?;

        self.emit(
            Event::new(EventType::FeatureCreated, user)
                .in_project(project)
                .for_feature(&stored.name)
                .with_post_data(&stored),
        )
        .await;
        Ok(stored)
    }

    /// Apply a sparse metadata update to a feature.
    pub async fn update_feature_metadata(
        &self,
        project: &str,
        feature: &str,
        update: FeatureMetadataUpdate,
        user: &AuditIdentity,
    ) -> Result<Feature, EngineError> {
        let existing = self.feature_in_project(project, feature).await?;
        require_active(&existing)?;

        let merged = update.apply(existing.clone());
        self.features.update(&merged).await?;

        self.emit(
            Event::new(EventType::FeatureMetadataUpdated, user)
                .in_project(project)
                .for_feature(feature)
                .with_pre_data(&existing)
                .with_post_data(&merged),
        )
        .await;
        Ok(merged)
    }

    /// Toggle the staleness marker. Unchanged state is a no-op that writes
    /// and emits nothing.
    pub async fn set_stale(
        &self,
        project: &str,
        feature: &str,
        stale: bool,
        user: &AuditIdentity,
    ) -> Result<Feature, EngineError> {
        let existing = self.feature_in_project(project, feature).await?;
        require_active(&existing)?;
        if existing.stale == stale {
            return Ok(existing);
        }

        self.features.set_stale(feature, stale).await?;
        let mut updated = existing.clone();
        updated.stale = stale;

        let event_type = match stale {
            true => EventType::FeatureStaleOn,
            false => EventType::FeatureStaleOff,
        };
        self.emit(
            Event::new(event_type, user)
                .in_project(project)
                .for_feature(feature)
                .with_pre_data(&existing)
                .with_post_data(&updated),
        )
        .await;
        Ok(updated)
    }

    /// Archive a feature, after the project-wide change-request gate.
    pub async fn archive_feature(
        &self,
        project: &str,
        feature: &str,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        self.gate.stop_when_enabled(project, None, user).await?;
        self.archive_feature_unprotected(project, feature, user)
            .await
    }

    /// Archive a feature without consulting the gate. Already-archived and
    /// already-gone features are success.
    pub async fn archive_feature_unprotected(
        &self,
        project: &str,
        feature: &str,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        let Some(existing) = self.features.get(feature).await? else {
            return Ok(());
        };
        if existing.project != project {
            return Err(EngineError::not_found("feature", feature));
        }
        if existing.archived {
            return Ok(());
        }

        self.dependency_guard
            .guard_removal(std::slice::from_ref(&existing.name))
            .await?;
        self.features.archive(feature).await?;
        tracing::info!(project, feature, "feature archived");

        self.emit(
            Event::new(EventType::FeatureArchived, user)
                .in_project(project)
                .for_feature(feature)
                .with_pre_data(&existing),
        )
        .await;
        Ok(())
    }

    /// Archive a batch of features together. Dependencies wholly inside the
    /// batch are allowed; edges crossing the batch boundary block it.
    pub async fn archive_features(
        &self,
        project: &str,
        features: &[String],
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        self.gate.stop_when_enabled(project, None, user).await?;
        self.archive_features_unprotected(project, features, user)
            .await
    }

    /// Batch archive without the gate.
    pub async fn archive_features_unprotected(
        &self,
        project: &str,
        features: &[String],
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        let mut targets = Vec::with_capacity(features.len());
        for name in features {
            let feature = self.feature_in_project(project, name).await?;
            if !feature.archived {
                targets.push(feature);
            }
        }
        let names: Vec<String> = targets.iter().map(|f| f.name.clone()).collect();
        self.dependency_guard.guard_removal(&names).await?;

        let mut events = Vec::with_capacity(targets.len());
        for feature in &targets {
            self.features.archive(&feature.name).await?;
            events.push(
                Event::new(EventType::FeatureArchived, user)
                    .in_project(project)
                    .for_feature(&feature.name)
                    .with_pre_data(feature),
            );
        }
        self.emit_all(events).await;
        Ok(())
    }

    /// Bring an archived feature back. Revived flags come back disabled in
    /// every environment (store-level behavior).
    pub async fn revive_feature(
        &self,
        project: &str,
        feature: &str,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        let existing = self.feature_in_project(project, feature).await?;
        if !existing.archived {
            return Ok(());
        }

        self.features.revive(feature).await?;
        let mut revived = existing.clone();
        revived.archived = false;

        self.emit(
            Event::new(EventType::FeatureRevived, user)
                .in_project(project)
                .for_feature(feature)
                .with_pre_data(&existing)
                .with_post_data(&revived),
        )
        .await;
        Ok(())
    }

    /// Physically delete a feature, after the project-wide gate.
    pub async fn delete_feature(
        &self,
        project: &str,
        feature: &str,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        self.gate.stop_when_enabled(project, None, user).await?;
        self.delete_feature_unprotected(project, feature, user).await
    }

    /// Delete without the gate; "already gone" is success.
    pub async fn delete_feature_unprotected(
        &self,
        project: &str,
        feature: &str,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        let Some(existing) = self.features.get(feature).await? else {
            return Ok(());
        };
        if existing.project != project {
            return Err(EngineError::not_found("feature", feature));
        }

        self.dependency_guard
            .guard_removal(std::slice::from_ref(&existing.name))
            .await?;
        self.features.delete(feature).await?;
        tracing::info!(project, feature, "feature deleted");

        self.emit(
            Event::new(EventType::FeatureDeleted, user)
                .in_project(project)
                .for_feature(feature)
                .with_pre_data(&existing),
        )
        .await;
        Ok(())
    }

    /// Delete a batch of features together, mirroring
    /// [`archive_features`](Self::archive_features) semantics.
    pub async fn delete_features(
        &self,
        project: &str,
        features: &[String],
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        self.gate.stop_when_enabled(project, None, user).await?;
        self.delete_features_unprotected(project, features, user)
            .await
    }

    /// Batch delete without the gate.
    pub async fn delete_features_unprotected(
        &self,
        project: &str,
        features: &[String],
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        let mut targets = Vec::new();
        for name in features {
            if let Some(feature) = self.features.get(name).await? {
                if feature.project != project {
                    return Err(EngineError::not_found("feature", name.clone()));
                }
                targets.push(feature);
            }
        }
        let names: Vec<String> = targets.iter().map(|f| f.name.clone()).collect();
        self.dependency_guard.guard_removal(&names).await?;

        let mut events = Vec::with_capacity(targets.len());
        for feature in &targets {
            self.features.delete(&feature.name).await?;
            events.push(
                Event::new(EventType::FeatureDeleted, user)
                    .in_project(project)
                    .for_feature(&feature.name)
                    .with_pre_data(feature),
            );
        }
        self.emit_all(events).await;
        Ok(())
    }

    /// Move a feature to another project.
    ///
    /// Blocked when the feature participates in any dependency, and
    /// forbidden outright when the target project enforces change requests
    /// (the move would bypass its approval flow).
    pub async fn change_project(
        &self,
        project: &str,
        feature: &str,
        new_project: &str,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        self.gate.stop_when_enabled(project, None, user).await?;
        self.change_project_unprotected(project, feature, new_project, user)
            .await
    }

    /// Project move without the source-project gate. The target-project
    /// change-request check still applies.
    pub async fn change_project_unprotected(
        &self,
        project: &str,
        feature: &str,
        new_project: &str,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        let existing = self.feature_in_project(project, feature).await?;
        require_active(&existing)?;
        if !self.projects.exists(new_project).await? {
            return Err(EngineError::not_found("project", new_project));
        }
        if self.gate.enabled_for_project(new_project).await? {
            return Err(EngineError::Forbidden(format!(
                "cannot move feature to project '{new_project}': change requests are enabled there"
            )));
        }
        self.dependency_guard
            .validate_no_dependencies(std::slice::from_ref(&existing.name))
            .await?;

        self.features.set_project(feature, new_project).await?;
        tracing::info!(feature, from = project, to = new_project, "feature moved");

        self.emit(
            Event::new(EventType::FeatureProjectChange, user)
                .in_project(new_project)
                .for_feature(feature)
                .with_pre_data(serde_json::json!({ "project": project }))
                .with_post_data(serde_json::json!({ "project": new_project })),
        )
        .await;
        Ok(())
    }

    // ============================================================
    // Strategy lifecycle
    // ============================================================

    /// Create a strategy on a (feature, environment), after the capability
    /// check and the change-request gate.
    pub async fn create_strategy(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        input: StrategyCreate,
        user: &AuditIdentity,
    ) -> Result<Strategy, EngineError> {
        let permitted = self
            .access
            .has_permission(user, CREATE_FEATURE_STRATEGY, project, Some(environment))
            .await?;
        if !permitted {
            return Err(EngineError::Permission {
                capability: CREATE_FEATURE_STRATEGY.to_string(),
                project: project.to_string(),
                environment: Some(environment.to_string()),
            });
        }
        self.gate
            .stop_when_enabled(project, Some(environment), user)
            .await?;
        self.create_strategy_unprotected(project, feature, environment, input, user)
            .await
    }

    /// Create a strategy without the gate.
    pub async fn create_strategy_unprotected(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        input: StrategyCreate,
        user: &AuditIdentity,
    ) -> Result<Strategy, EngineError> {
        tracing::info!(
            project,
            feature,
            environment,
            strategy_type = %input.name,
            "creating strategy"
        );

        let flag = self.feature_in_project(project, feature).await?;
        require_active(&flag)?;
        if !self.strategies.has_strategy_type(&input.name).await? {
            return Err(EngineError::not_found("strategy type", &input.name));
        }
        self.validate_segments(project, &input.segments).await?;

        let limits = self.limits.resource_limits().await?;
        let existing = self
            .strategies
            .list_for(project, feature, environment)
            .await?;
        check_before_add(
            "strategy",
            existing.len(),
            limits.feature_environment_strategies,
        )?;
        check_constraint_limits(
            &[],
            &input.constraints,
            limits.constraints,
            limits.constraint_values,
        )?;

        let constraints = self.constraints.validate_all(&input.constraints).await?;
        let variants = fix_variant_weights(input.variants)?;
        let parameters = self.normalize_parameters(&input.name, feature, input.parameters);
        let sort_order = input.sort_order.unwrap_or(existing.len() as i32);

        let strategy = Strategy {
            id: Uuid::new_v4(),
            feature_name: feature.to_string(),
            project_id: project.to_string(),
            environment: environment.to_string(),
            strategy_name: input.name,
            title: input.title,
            disabled: input.disabled,
            parameters,
            constraints,
            variants,
            segments: input.segments,
            sort_order,
            created_at: Utc::now(),
        };

        let stored = match self.strategies.create(strategy).await {
            Ok(stored) => stored,
            Err(error) if error.is_environment_fk() => {
                return Err(EngineError::bad_data(format!(
                    "environment '{environment}' is not connected to project '{project}'"
                )));
            }
            Err(error) => return Err(error.into()),
        };
        if !stored.segments.is_empty() {
            self.segments
                .set_strategy_segments(stored.id, &stored.segments)
                .await?;
        }

        self.emit(
            Event::new(EventType::FeatureStrategyAdd, user)
                .in_project(project)
                .for_feature(feature)
                .in_environment(environment)
                .with_post_data(PublicStrategy::from(&stored)),
        )
        .await;
        Ok(stored)
    }

    /// Update a strategy, after the change-request gate.
    pub async fn update_strategy(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        id: Uuid,
        update: StrategyUpdate,
        user: &AuditIdentity,
    ) -> Result<Strategy, EngineError> {
        self.gate
            .stop_when_enabled(project, Some(environment), user)
            .await?;
        self.update_strategy_unprotected(project, feature, environment, id, update, user)
            .await
    }

    /// Update a strategy without the gate.
    ///
    /// Project, feature, and environment of an existing strategy are
    /// immutable; a strategy addressed through the wrong triple is treated
    /// as absent.
    pub async fn update_strategy_unprotected(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        id: Uuid,
        update: StrategyUpdate,
        user: &AuditIdentity,
    ) -> Result<Strategy, EngineError> {
        let existing = self
            .strategy_in_context(project, feature, environment, id)
            .await?;

        if let Some(name) = &update.name {
            if !self.strategies.has_strategy_type(name).await? {
                return Err(EngineError::not_found("strategy type", name));
            }
        }
        if let Some(segments) = &update.segments {
            self.validate_segments(project, segments).await?;
        }
        if let Some(constraints) = &update.constraints {
            let limits = self.limits.resource_limits().await?;
            check_constraint_limits(
                &existing.constraints,
                constraints,
                limits.constraints,
                limits.constraint_values,
            )?;
            self.constraints.validate_all(constraints).await?;
        }

        let mut merged = update.apply(existing.clone());
        // Always re-run normalization on the merged list, not just when the
        // update carries variants; stored weights self-heal on any edit.
        merged.variants = fix_variant_weights(merged.variants)?;
        let strategy_type = merged.strategy_name.clone();
        merged.parameters = self.normalize_parameters(&strategy_type, feature, merged.parameters);

        self.strategies.update(&merged).await?;
        if let Some(segments) = &update.segments {
            self.segments.set_strategy_segments(id, segments).await?;
        }
        self.auto_disable_if_all_disabled(project, feature, environment)
            .await?;

        self.emit(
            Event::new(EventType::FeatureStrategyUpdate, user)
                .in_project(project)
                .for_feature(feature)
                .in_environment(environment)
                .with_pre_data(PublicStrategy::from(&existing))
                .with_post_data(PublicStrategy::from(&merged)),
        )
        .await;
        Ok(merged)
    }

    /// Overwrite a single strategy parameter, after the gate.
    pub async fn update_strategy_parameter(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        id: Uuid,
        name: &str,
        value: &str,
        user: &AuditIdentity,
    ) -> Result<Strategy, EngineError> {
        self.gate
            .stop_when_enabled(project, Some(environment), user)
            .await?;
        self.update_strategy_parameter_unprotected(
            project,
            feature,
            environment,
            id,
            name,
            value,
            user,
        )
        .await
    }

    /// Overwrite a single strategy parameter without the gate.
    pub async fn update_strategy_parameter_unprotected(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        id: Uuid,
        name: &str,
        value: &str,
        user: &AuditIdentity,
    ) -> Result<Strategy, EngineError> {
        let existing = self
            .strategy_in_context(project, feature, environment, id)
            .await?;
        let mut merged = existing.clone();
        merged
            .parameters
            .insert(name.to_string(), value.to_string());

        self.strategies.update(&merged).await?;
        self.auto_disable_if_all_disabled(project, feature, environment)
            .await?;

        self.emit(
            Event::new(EventType::FeatureStrategyUpdate, user)
                .in_project(project)
                .for_feature(feature)
                .in_environment(environment)
                .with_pre_data(PublicStrategy::from(&existing))
                .with_post_data(PublicStrategy::from(&merged)),
        )
        .await;
        Ok(merged)
    }

    /// Delete a strategy, after the change-request gate.
    pub async fn delete_strategy(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        id: Uuid,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        self.gate
            .stop_when_enabled(project, Some(environment), user)
            .await?;
        self.delete_strategy_unprotected(project, feature, environment, id, user)
            .await
    }

    /// Delete a strategy without the gate. Deletion is idempotent: an
    /// absent id is success and emits nothing. Removing the last strategy
    /// of the pair disables the environment binding at the store level.
    pub async fn delete_strategy_unprotected(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        id: Uuid,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        let Some(existing) = self.strategies.get(id).await? else {
            tracing::debug!(%id, "strategy already gone, nothing to delete");
            return Ok(());
        };
        if existing.project_id != project
            || existing.feature_name != feature
            || existing.environment != environment
        {
            return Err(EngineError::not_found("strategy", id.to_string()));
        }

        self.strategies.delete(id).await?;
        let auto_disabled = self
            .bindings
            .disable_if_no_strategies(feature, environment)
            .await?;
        if auto_disabled {
            tracing::info!(
                feature,
                environment,
                "environment auto-disabled after last strategy removal"
            );
        }

        self.emit(
            Event::new(EventType::FeatureStrategyRemove, user)
                .in_project(project)
                .for_feature(feature)
                .in_environment(environment)
                .with_pre_data(PublicStrategy::from(&existing)),
        )
        .await;
        Ok(())
    }

    /// Reorder strategies within a (feature, environment), after the gate.
    pub async fn set_strategy_sort_orders(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        orders: &[SortOrderUpdate],
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        self.gate
            .stop_when_enabled(project, Some(environment), user)
            .await?;
        self.set_strategy_sort_orders_unprotected(project, feature, environment, orders, user)
            .await
    }

    /// Reorder strategies without the gate. Every id must resolve within
    /// the (project, feature, environment) triple before any order is
    /// written.
    pub async fn set_strategy_sort_orders_unprotected(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        orders: &[SortOrderUpdate],
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        for order in orders {
            self.strategy_in_context(project, feature, environment, order.id)
                .await?;
        }
        for order in orders {
            self.strategies
                .set_sort_order(order.id, order.sort_order)
                .await?;
        }

        self.emit(
            Event::new(EventType::StrategiesReordered, user)
                .in_project(project)
                .for_feature(feature)
                .in_environment(environment)
                .with_post_data(orders),
        )
        .await;
        Ok(())
    }

    // ============================================================
    // Environment activation
    // ============================================================

    /// Flip a feature's activation in one environment, after the gate.
    pub async fn update_enabled(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        enabled: bool,
        activate_disabled_strategies: bool,
        user: &AuditIdentity,
    ) -> Result<bool, EngineError> {
        self.gate
            .stop_when_enabled(project, Some(environment), user)
            .await?;
        self.update_enabled_unprotected(
            project,
            feature,
            environment,
            enabled,
            activate_disabled_strategies,
            user,
        )
        .await
    }

    /// Flip activation without the gate.
    ///
    /// Enabling requires at least one enabled-capable strategy: with zero
    /// strategies, or with only disabled strategies and
    /// `activate_disabled_strategies` unset, a default strategy is
    /// synthesized (the project's configured default, falling back to
    /// [`FLEXIBLE_ROLLOUT`] at 100%). With `activate_disabled_strategies`
    /// set, existing disabled strategies are re-enabled instead.
    /// Disabling flips the binding directly and never touches strategies.
    pub async fn update_enabled_unprotected(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        enabled: bool,
        activate_disabled_strategies: bool,
        user: &AuditIdentity,
    ) -> Result<bool, EngineError> {
        if !self.bindings.has_environment(feature, environment).await? {
            return Err(EngineError::not_found("environment", environment));
        }
        let flag = self.feature_in_project(project, feature).await?;
        require_active(&flag)?;

        if enabled {
            let strategies = self
                .strategies
                .list_for(project, feature, environment)
                .await?;
            let all_disabled = !strategies.is_empty() && strategies.iter().all(|s| s.disabled);

            if all_disabled && activate_disabled_strategies {
                for strategy in &strategies {
                    let mut activated = strategy.clone();
                    activated.disabled = false;
                    self.strategies.update(&activated).await?;
                    self.emit(
                        Event::new(EventType::FeatureStrategyUpdate, user)
                            .in_project(project)
                            .for_feature(feature)
                            .in_environment(environment)
                            .with_pre_data(PublicStrategy::from(strategy))
                            .with_post_data(PublicStrategy::from(&activated)),
                    )
                    .await;
                }
            } else if strategies.is_empty() || all_disabled {
                let input = match self
                    .projects
                    .default_strategy(project, environment)
                    .await?
                {
                    Some(configured) => configured,
                    None => StrategyCreate::of_type(FLEXIBLE_ROLLOUT),
                };
                // Parameter defaults (rollout, stickiness, groupId) are
                // filled by the create path.
                self.create_strategy_unprotected(project, feature, environment, input, user)
                    .await?;
            }
        }

        self.bindings
            .set_enabled(feature, environment, enabled)
            .await?;
        tracing::info!(project, feature, environment, enabled, "environment toggled");

        let event_type = match enabled {
            true => EventType::FeatureEnvironmentEnabled,
            false => EventType::FeatureEnvironmentDisabled,
        };
        self.emit(
            Event::new(event_type, user)
                .in_project(project)
                .for_feature(feature)
                .in_environment(environment),
        )
        .await;
        Ok(enabled)
    }

    // ============================================================
    // Reads
    // ============================================================

    /// Fetch a feature, scoped to its project.
    pub async fn get_feature(&self, project: &str, name: &str) -> Result<Feature, EngineError> {
        self.feature_in_project(project, name).await
    }

    /// Fetch a strategy, scoped to its (project, feature, environment).
    pub async fn get_strategy(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        id: Uuid,
    ) -> Result<Strategy, EngineError> {
        self.strategy_in_context(project, feature, environment, id)
            .await
    }

    /// List strategies for a (project, feature, environment) triple.
    pub async fn get_strategies(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
    ) -> Result<Vec<Strategy>, EngineError> {
        Ok(self
            .strategies
            .list_for(project, feature, environment)
            .await?)
    }

    // ============================================================
    // Internals
    // ============================================================

    async fn feature_in_project(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Feature, EngineError> {
        let feature = self
            .features
            .get(name)
            .await?
            .ok_or_else(|| EngineError::not_found("feature", name))?;
        if feature.project != project {
            return Err(EngineError::not_found("feature", name));
        }
        Ok(feature)
    }

    async fn strategy_in_context(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        id: Uuid,
    ) -> Result<Strategy, EngineError> {
        let strategy = self
            .strategies
            .get(id)
            .await?
            .ok_or_else(|| EngineError::not_found("strategy", id.to_string()))?;
        if strategy.project_id != project
            || strategy.feature_name != feature
            || strategy.environment != environment
        {
            return Err(EngineError::not_found("strategy", id.to_string()));
        }
        Ok(strategy)
    }

    async fn validate_segments(
        &self,
        project: &str,
        segments: &[u64],
    ) -> Result<(), EngineError> {
        for id in segments {
            let segment = self
                .segments
                .get(*id)
                .await?
                .ok_or_else(|| EngineError::not_found("segment", id.to_string()))?;
            if !segment.usable_from(project) {
                return Err(EngineError::InvalidOperation(format!(
                    "segment {id} belongs to project '{}' and cannot be used from project '{project}'",
                    segment.project.unwrap_or_default()
                )));
            }
        }
        Ok(())
    }

    fn normalize_parameters(
        &self,
        strategy_type: &str,
        feature: &str,
        mut parameters: Parameters,
    ) -> Parameters {
        if strategy_type == FLEXIBLE_ROLLOUT {
            parameters
                .entry("rollout".to_string())
                .or_insert_with(|| "100".to_string());
            parameters
                .entry("stickiness".to_string())
                .or_insert_with(|| self.config.default_stickiness.clone());
            parameters
                .entry("groupId".to_string())
                .or_insert_with(|| feature.to_string());
        }
        parameters
    }

    async fn auto_disable_if_all_disabled(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
    ) -> Result<(), EngineError> {
        let strategies = self
            .strategies
            .list_for(project, feature, environment)
            .await?;
        if !strategies.is_empty() && strategies.iter().all(|s| s.disabled) {
            self.bindings
                .set_enabled(feature, environment, false)
                .await?;
            tracing::info!(
                feature,
                environment,
                "environment auto-disabled: all strategies disabled"
            );
        }
        Ok(())
    }

    /// Append an audit event. Emission failures are logged and swallowed so
    /// a sink outage never reverses a business-data write.
    async fn emit(&self, event: Event) {
        let event_type = event.event_type;
        if let Err(error) = self.events.store_event(event).await {
            tracing::warn!(
                %error,
                event_type = event_type.as_str(),
                "audit event emission failed; mutation result is unaffected"
            );
        }
    }

    async fn emit_all(&self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        if let Err(error) = self.events.store_events(events).await {
            tracing::warn!(%error, "audit event batch emission failed");
        }
    }
}

fn require_active(feature: &Feature) -> Result<(), EngineError> {
    if feature.archived {
        return Err(EngineError::ArchivedFeature(feature.name.clone()));
    }
    Ok(())
}
