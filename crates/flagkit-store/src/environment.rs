use async_trait::async_trait;
use flagkit_types::EnvironmentBinding;

use crate::error::StoreError;

/// Persistence for (feature, environment) activation state.
#[async_trait]
pub trait EnvironmentBindingStore: Send + Sync {
    /// Fetch the binding for a (feature, environment) pair.
    async fn get(
        &self,
        feature: &str,
        environment: &str,
    ) -> Result<Option<EnvironmentBinding>, StoreError>;

    /// Flip the binding's enabled flag.
    async fn set_enabled(
        &self,
        feature: &str,
        environment: &str,
        enabled: bool,
    ) -> Result<(), StoreError>;

    /// True when the feature has a binding for this environment.
    async fn has_environment(&self, feature: &str, environment: &str)
        -> Result<bool, StoreError>;

    /// Disable the binding when no strategies remain for the pair.
    /// Returns whether the binding was disabled by this call.
    async fn disable_if_no_strategies(
        &self,
        feature: &str,
        environment: &str,
    ) -> Result<bool, StoreError>;
}
