//! Change request gate
//!
//! When a project (or one of its environments) has change-request approval
//! enabled, direct mutations are rejected unless the caller holds the skip
//! capability. Internal callers and the change-request execution pipeline
//! use the engine's `*_unprotected` operations, which never consult this
//! gate.

use std::sync::Arc;

use flagkit_store::ChangeRequestAccess;
use flagkit_types::AuditIdentity;

use crate::error::EngineError;

/// Capability that lets a caller mutate directly despite change requests
/// being enabled.
pub const SKIP_CHANGE_REQUEST: &str = "SKIP_CHANGE_REQUEST";

/// Advisory gate for callers that want protected semantics.
pub struct ChangeRequestGate {
    access: Arc<dyn ChangeRequestAccess>,
}

impl ChangeRequestGate {
    /// New gate over the given access read model.
    #[must_use]
    pub fn new(access: Arc<dyn ChangeRequestAccess>) -> Self {
        Self { access }
    }

    /// True when change requests are enforced for any environment of the
    /// project. Used by operations that refuse to proceed regardless of
    /// bypass rights (e.g. moving a feature into such a project).
    pub async fn enabled_for_project(&self, project: &str) -> Result<bool, EngineError> {
        Ok(self.access.enabled_for_project(project).await?)
    }

    /// Reject the mutation when change requests are enforced for the target
    /// scope and the caller cannot bypass them.
    ///
    /// With an environment, the check is scoped to (project, environment);
    /// without one, the broader project-wide check applies (archive,
    /// delete, project move).
    pub async fn stop_when_enabled(
        &self,
        project: &str,
        environment: Option<&str>,
        user: &AuditIdentity,
    ) -> Result<(), EngineError> {
        let blocked = match environment {
            Some(env) => {
                self.access.enabled_for(project, env).await?
                    && !self.access.can_bypass(project, env, user).await?
            }
            None => {
                self.access.enabled_for_project(project).await?
                    && !self.access.can_bypass_for_project(project, user).await?
            }
        };

        if blocked {
            tracing::debug!(
                project,
                environment,
                user = %user.username,
                "mutation blocked by change request policy"
            );
            return Err(EngineError::Permission {
                capability: SKIP_CHANGE_REQUEST.to_string(),
                project: project.to_string(),
                environment: environment.map(str::to_string),
            });
        }
        Ok(())
    }
}
