use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use flagkit_store::{
    AccessService, ChangeRequestAccess, ContextFieldStore, DependencyReadModel,
    EnvironmentBindingStore, EventSink, FeatureStore, ProjectReadModel, ResourceLimitProvider,
    SegmentService, StoreError, StrategyStore, FK_STRATEGY_ENVIRONMENT,
};
use flagkit_types::{
    AuditIdentity, ContextField, Dependency, EnvironmentBinding, Event, Feature, ResourceLimits,
    Segment, Strategy, StrategyCreate,
};

#[derive(Debug, Clone, Default)]
struct ProjectConfig {
    naming_pattern: Option<String>,
    default_strategies: HashMap<String, StrategyCreate>,
}

#[derive(Default)]
struct State {
    features: HashMap<String, Feature>,
    bindings: HashMap<(String, String), EnvironmentBinding>,
    strategies: HashMap<Uuid, Strategy>,
    strategy_seq: HashMap<Uuid, u64>,
    next_seq: u64,
    strategy_types: HashSet<String>,
    strategy_segments: HashMap<Uuid, Vec<u64>>,
    segments: HashMap<u64, Segment>,
    context_fields: HashMap<String, ContextField>,
    dependencies: Vec<Dependency>,
    events: Vec<Event>,
    environments: Vec<String>,
    projects: HashMap<String, ProjectConfig>,
    cr_enabled: HashSet<(String, String)>,
    cr_env_bypass: HashSet<(String, String, String)>,
    cr_project_bypass: HashSet<(String, String)>,
    denied_permissions: HashSet<(String, String)>,
    limits: ResourceLimits,
    fail_events: bool,
}

/// In-memory implementation of every flagkit store seam, backed by one
/// shared state so cross-store invariants (bindings created with features,
/// strategies deleted with them) behave like a real backend.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<RwLock<State>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Empty backend with the built-in strategy types registered.
    #[must_use]
    pub fn new() -> Self {
        let mut state = State::default();
        for ty in [
            "default",
            "flexibleRollout",
            "userWithId",
            "remoteAddress",
            "applicationHostname",
        ] {
            state.strategy_types.insert(ty.to_string());
        }
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    // ---------- setup knobs ----------

    pub fn add_project(&self, project: &str) {
        self.state
            .write()
            .projects
            .insert(project.to_string(), ProjectConfig::default());
    }

    pub fn set_naming_pattern(&self, project: &str, pattern: &str) {
        if let Some(config) = self.state.write().projects.get_mut(project) {
            config.naming_pattern = Some(pattern.to_string());
        }
    }

    pub fn set_default_strategy(&self, project: &str, environment: &str, input: StrategyCreate) {
        if let Some(config) = self.state.write().projects.get_mut(project) {
            config
                .default_strategies
                .insert(environment.to_string(), input);
        }
    }

    pub fn add_environment(&self, environment: &str) {
        let mut state = self.state.write();
        if !state.environments.iter().any(|e| e == environment) {
            state.environments.push(environment.to_string());
        }
        let names: Vec<String> = state.features.keys().cloned().collect();
        for feature in names {
            state
                .bindings
                .entry((feature.clone(), environment.to_string()))
                .or_insert(EnvironmentBinding {
                    feature_name: feature,
                    environment: environment.to_string(),
                    enabled: false,
                });
        }
    }

    pub fn add_context_field(&self, field: ContextField) {
        self.state
            .write()
            .context_fields
            .insert(field.name.clone(), field);
    }

    pub fn add_segment(&self, segment: Segment) {
        self.state.write().segments.insert(segment.id, segment);
    }

    pub fn add_dependency(&self, feature: &str, parent: &str) {
        self.state.write().dependencies.push(Dependency {
            feature: feature.to_string(),
            parent: parent.to_string(),
        });
    }

    pub fn enable_change_requests(&self, project: &str, environment: &str) {
        self.state
            .write()
            .cr_enabled
            .insert((project.to_string(), environment.to_string()));
    }

    pub fn allow_bypass(&self, project: &str, environment: &str, username: &str) {
        self.state.write().cr_env_bypass.insert((
            project.to_string(),
            environment.to_string(),
            username.to_string(),
        ));
    }

    pub fn allow_project_bypass(&self, project: &str, username: &str) {
        self.state
            .write()
            .cr_project_bypass
            .insert((project.to_string(), username.to_string()));
    }

    pub fn deny_permission(&self, username: &str, capability: &str) {
        self.state
            .write()
            .denied_permissions
            .insert((username.to_string(), capability.to_string()));
    }

    pub fn set_limits(&self, limits: ResourceLimits) {
        self.state.write().limits = limits;
    }

    /// Make the event sink fail, for fire-and-forget tests.
    pub fn fail_events(&self, fail: bool) {
        self.state.write().fail_events = fail;
    }

    // ---------- inspection ----------

    pub fn events(&self) -> Vec<Event> {
        self.state.read().events.clone()
    }

    pub fn binding(&self, feature: &str, environment: &str) -> Option<EnvironmentBinding> {
        self.state
            .read()
            .bindings
            .get(&(feature.to_string(), environment.to_string()))
            .cloned()
    }

    pub fn stored_feature(&self, name: &str) -> Option<Feature> {
        self.state.read().features.get(name).cloned()
    }

    pub fn stored_strategy(&self, id: Uuid) -> Option<Strategy> {
        self.state.read().strategies.get(&id).cloned()
    }

    pub fn segments_for(&self, strategy_id: Uuid) -> Vec<u64> {
        self.state
            .read()
            .strategy_segments
            .get(&strategy_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl FeatureStore for InMemoryBackend {
    async fn get(&self, name: &str) -> Result<Option<Feature>, StoreError> {
        Ok(self.state.read().features.get(name).cloned())
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().features.contains_key(name))
    }

    async fn project_id(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .state
            .read()
            .features
            .get(name)
            .map(|f| f.project.clone()))
    }

    async fn create(&self, feature: Feature) -> Result<Feature, StoreError> {
        let mut state = self.state.write();
        if state.features.contains_key(&feature.name) {
            return Err(StoreError::DuplicateKey {
                kind: "feature",
                id: feature.name,
            });
        }
        for environment in state.environments.clone() {
            state.bindings.insert(
                (feature.name.clone(), environment.clone()),
                EnvironmentBinding {
                    feature_name: feature.name.clone(),
                    environment,
                    enabled: false,
                },
            );
        }
        state.features.insert(feature.name.clone(), feature.clone());
        Ok(feature)
    }

    async fn update(&self, feature: &Feature) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.features.contains_key(&feature.name) {
            return Err(StoreError::not_found("feature", &feature.name));
        }
        state.features.insert(feature.name.clone(), feature.clone());
        Ok(())
    }

    async fn archive(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.write();
        match state.features.get_mut(name) {
            Some(feature) => {
                feature.archived = true;
                Ok(())
            }
            None => Err(StoreError::not_found("feature", name)),
        }
    }

    async fn revive(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.write();
        match state.features.get_mut(name) {
            Some(feature) => feature.archived = false,
            None => return Err(StoreError::not_found("feature", name)),
        }
        // Revived flags come back disabled everywhere.
        for binding in state.bindings.values_mut() {
            if binding.feature_name == name {
                binding.enabled = false;
            }
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.write();
        state.features.remove(name);
        state.bindings.retain(|(feature, _), _| feature != name);
        let removed: Vec<Uuid> = state
            .strategies
            .values()
            .filter(|s| s.feature_name == name)
            .map(|s| s.id)
            .collect();
        for id in removed {
            state.strategies.remove(&id);
            state.strategy_seq.remove(&id);
            state.strategy_segments.remove(&id);
        }
        state
            .dependencies
            .retain(|d| d.feature != name && d.parent != name);
        Ok(())
    }

    async fn set_stale(&self, name: &str, stale: bool) -> Result<(), StoreError> {
        let mut state = self.state.write();
        match state.features.get_mut(name) {
            Some(feature) => {
                feature.stale = stale;
                Ok(())
            }
            None => Err(StoreError::not_found("feature", name)),
        }
    }

    async fn set_project(&self, name: &str, project: &str) -> Result<(), StoreError> {
        let mut state = self.state.write();
        match state.features.get_mut(name) {
            Some(feature) => {
                feature.project = project.to_string();
                Ok(())
            }
            None => Err(StoreError::not_found("feature", name)),
        }
    }

    async fn count_active(&self) -> Result<usize, StoreError> {
        Ok(self
            .state
            .read()
            .features
            .values()
            .filter(|f| !f.archived)
            .count())
    }
}

#[async_trait]
impl StrategyStore for InMemoryBackend {
    async fn get(&self, id: Uuid) -> Result<Option<Strategy>, StoreError> {
        Ok(self.state.read().strategies.get(&id).cloned())
    }

    async fn create(&self, strategy: Strategy) -> Result<Strategy, StoreError> {
        let mut state = self.state.write();
        let key = (
            strategy.feature_name.clone(),
            strategy.environment.clone(),
        );
        if !state.bindings.contains_key(&key) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: FK_STRATEGY_ENVIRONMENT.to_string(),
            });
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.strategy_seq.insert(strategy.id, seq);
        state.strategies.insert(strategy.id, strategy.clone());
        Ok(strategy)
    }

    async fn update(&self, strategy: &Strategy) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.strategies.contains_key(&strategy.id) {
            return Err(StoreError::not_found("strategy", strategy.id.to_string()));
        }
        state.strategies.insert(strategy.id, strategy.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write();
        state.strategies.remove(&id);
        state.strategy_seq.remove(&id);
        state.strategy_segments.remove(&id);
        Ok(())
    }

    async fn list_for(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
    ) -> Result<Vec<Strategy>, StoreError> {
        let state = self.state.read();
        let mut matching: Vec<Strategy> = state
            .strategies
            .values()
            .filter(|s| {
                s.project_id == project
                    && s.feature_name == feature
                    && s.environment == environment
            })
            .cloned()
            .collect();
        matching.sort_by_key(|s| {
            (
                s.sort_order,
                state.strategy_seq.get(&s.id).copied().unwrap_or(u64::MAX),
            )
        });
        Ok(matching)
    }

    async fn set_sort_order(&self, id: Uuid, sort_order: i32) -> Result<(), StoreError> {
        let mut state = self.state.write();
        match state.strategies.get_mut(&id) {
            Some(strategy) => {
                strategy.sort_order = sort_order;
                Ok(())
            }
            None => Err(StoreError::not_found("strategy", id.to_string())),
        }
    }

    async fn delete_all_for(&self, feature: &str, environment: &str) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let removed: Vec<Uuid> = state
            .strategies
            .values()
            .filter(|s| s.feature_name == feature && s.environment == environment)
            .map(|s| s.id)
            .collect();
        for id in removed {
            state.strategies.remove(&id);
            state.strategy_seq.remove(&id);
            state.strategy_segments.remove(&id);
        }
        Ok(())
    }

    async fn has_strategy_type(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().strategy_types.contains(name))
    }
}

#[async_trait]
impl EnvironmentBindingStore for InMemoryBackend {
    async fn get(
        &self,
        feature: &str,
        environment: &str,
    ) -> Result<Option<EnvironmentBinding>, StoreError> {
        Ok(self
            .state
            .read()
            .bindings
            .get(&(feature.to_string(), environment.to_string()))
            .cloned())
    }

    async fn set_enabled(
        &self,
        feature: &str,
        environment: &str,
        enabled: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        match state
            .bindings
            .get_mut(&(feature.to_string(), environment.to_string()))
        {
            Some(binding) => {
                binding.enabled = enabled;
                Ok(())
            }
            None => Err(StoreError::not_found("environment binding", environment)),
        }
    }

    async fn has_environment(
        &self,
        feature: &str,
        environment: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .state
            .read()
            .bindings
            .contains_key(&(feature.to_string(), environment.to_string())))
    }

    async fn disable_if_no_strategies(
        &self,
        feature: &str,
        environment: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        let any_left = state
            .strategies
            .values()
            .any(|s| s.feature_name == feature && s.environment == environment);
        if any_left {
            return Ok(false);
        }
        match state
            .bindings
            .get_mut(&(feature.to_string(), environment.to_string()))
        {
            Some(binding) if binding.enabled => {
                binding.enabled = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ContextFieldStore for InMemoryBackend {
    async fn get(&self, name: &str) -> Result<Option<ContextField>, StoreError> {
        Ok(self.state.read().context_fields.get(name).cloned())
    }
}

#[async_trait]
impl SegmentService for InMemoryBackend {
    async fn get(&self, id: u64) -> Result<Option<Segment>, StoreError> {
        Ok(self.state.read().segments.get(&id).cloned())
    }

    async fn get_for_strategy(&self, strategy_id: Uuid) -> Result<Vec<Segment>, StoreError> {
        let state = self.state.read();
        let ids = state
            .strategy_segments
            .get(&strategy_id)
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| state.segments.get(id).cloned())
            .collect())
    }

    async fn set_strategy_segments(
        &self,
        strategy_id: Uuid,
        segments: &[u64],
    ) -> Result<(), StoreError> {
        self.state
            .write()
            .strategy_segments
            .insert(strategy_id, segments.to_vec());
        Ok(())
    }
}

#[async_trait]
impl EventSink for InMemoryBackend {
    async fn store_event(&self, event: Event) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if state.fail_events {
            return Err(StoreError::Backend("event sink unavailable".to_string()));
        }
        state.events.push(event);
        Ok(())
    }

    async fn store_events(&self, events: Vec<Event>) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if state.fail_events {
            return Err(StoreError::Backend("event sink unavailable".to_string()));
        }
        state.events.extend(events);
        Ok(())
    }
}

#[async_trait]
impl DependencyReadModel for InMemoryBackend {
    async fn parents(&self, feature: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .state
            .read()
            .dependencies
            .iter()
            .filter(|d| d.feature == feature)
            .map(|d| d.parent.clone())
            .collect())
    }

    async fn children(&self, features: &[String]) -> Result<Vec<String>, StoreError> {
        let state = self.state.read();
        let mut children: Vec<String> = state
            .dependencies
            .iter()
            .filter(|d| features.contains(&d.parent))
            .map(|d| d.feature.clone())
            .collect();
        children.sort();
        children.dedup();
        Ok(children)
    }

    async fn orphan_parents(&self, removed: &[String]) -> Result<Vec<String>, StoreError> {
        let state = self.state.read();
        let mut orphaned: Vec<String> = state
            .dependencies
            .iter()
            .filter(|d| removed.contains(&d.parent) && !removed.contains(&d.feature))
            .map(|d| d.feature.clone())
            .collect();
        orphaned.sort();
        orphaned.dedup();
        Ok(orphaned)
    }

    async fn have_dependencies(&self, features: &[String]) -> Result<bool, StoreError> {
        Ok(self
            .state
            .read()
            .dependencies
            .iter()
            .any(|d| features.contains(&d.feature) || features.contains(&d.parent)))
    }
}

#[async_trait]
impl ChangeRequestAccess for InMemoryBackend {
    async fn enabled_for(&self, project: &str, environment: &str) -> Result<bool, StoreError> {
        Ok(self
            .state
            .read()
            .cr_enabled
            .contains(&(project.to_string(), environment.to_string())))
    }

    async fn enabled_for_project(&self, project: &str) -> Result<bool, StoreError> {
        Ok(self
            .state
            .read()
            .cr_enabled
            .iter()
            .any(|(p, _)| p == project))
    }

    async fn can_bypass(
        &self,
        project: &str,
        environment: &str,
        user: &AuditIdentity,
    ) -> Result<bool, StoreError> {
        let state = self.state.read();
        Ok(state.cr_env_bypass.contains(&(
            project.to_string(),
            environment.to_string(),
            user.username.clone(),
        )) || state
            .cr_project_bypass
            .contains(&(project.to_string(), user.username.clone())))
    }

    async fn can_bypass_for_project(
        &self,
        project: &str,
        user: &AuditIdentity,
    ) -> Result<bool, StoreError> {
        Ok(self
            .state
            .read()
            .cr_project_bypass
            .contains(&(project.to_string(), user.username.clone())))
    }
}

#[async_trait]
impl AccessService for InMemoryBackend {
    async fn has_permission(
        &self,
        user: &AuditIdentity,
        capability: &str,
        _project: &str,
        _environment: Option<&str>,
    ) -> Result<bool, StoreError> {
        Ok(!self
            .state
            .read()
            .denied_permissions
            .contains(&(user.username.clone(), capability.to_string())))
    }
}

#[async_trait]
impl ProjectReadModel for InMemoryBackend {
    async fn exists(&self, project: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().projects.contains_key(project))
    }

    async fn feature_naming_pattern(
        &self,
        project: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .state
            .read()
            .projects
            .get(project)
            .and_then(|c| c.naming_pattern.clone()))
    }

    async fn default_strategy(
        &self,
        project: &str,
        environment: &str,
    ) -> Result<Option<StrategyCreate>, StoreError> {
        Ok(self
            .state
            .read()
            .projects
            .get(project)
            .and_then(|c| c.default_strategies.get(environment).cloned()))
    }
}

#[async_trait]
impl ResourceLimitProvider for InMemoryBackend {
    async fn resource_limits(&self) -> Result<ResourceLimits, StoreError> {
        Ok(self.state.read().limits)
    }
}
