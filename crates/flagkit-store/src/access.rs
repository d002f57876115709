use async_trait::async_trait;
use flagkit_types::AuditIdentity;

use crate::error::StoreError;

/// Permission checks for capability-gated operations.
#[async_trait]
pub trait AccessService: Send + Sync {
    /// True when `user` holds `capability` in the given project scope,
    /// optionally narrowed to one environment.
    async fn has_permission(
        &self,
        user: &AuditIdentity,
        capability: &str,
        project: &str,
        environment: Option<&str>,
    ) -> Result<bool, StoreError>;
}

/// Read model backing the change-request gate.
#[async_trait]
pub trait ChangeRequestAccess: Send + Sync {
    /// True when change requests are enforced for (project, environment).
    async fn enabled_for(&self, project: &str, environment: &str) -> Result<bool, StoreError>;

    /// True when change requests are enforced for any environment of the
    /// project.
    async fn enabled_for_project(&self, project: &str) -> Result<bool, StoreError>;

    /// True when `user` may mutate (project, environment) directly despite
    /// change requests being enabled there.
    async fn can_bypass(
        &self,
        project: &str,
        environment: &str,
        user: &AuditIdentity,
    ) -> Result<bool, StoreError>;

    /// Project-wide bypass, used by operations spanning all environments
    /// (archive, delete, project move).
    async fn can_bypass_for_project(
        &self,
        project: &str,
        user: &AuditIdentity,
    ) -> Result<bool, StoreError>;
}
