//! Dependency graph guard
//!
//! Features form a child → parent dependency graph. Archiving, deleting, or
//! moving a feature must not strand the graph: a parent with surviving
//! children cannot go away, and no surviving feature may be left pointing
//! at a parent that was removed.

use std::sync::Arc;

use flagkit_store::DependencyReadModel;

use crate::error::EngineError;

/// Structural guard over the feature dependency graph.
pub struct DependencyGuard {
    dependencies: Arc<dyn DependencyReadModel>,
}

impl DependencyGuard {
    /// New guard over the given read model.
    #[must_use]
    pub fn new(dependencies: Arc<dyn DependencyReadModel>) -> Self {
        Self { dependencies }
    }

    /// Fail when removing `removed` would leave a surviving feature with a
    /// dangling parent reference.
    pub async fn validate_no_orphan_parents(&self, removed: &[String]) -> Result<(), EngineError> {
        let orphans = self.dependencies.orphan_parents(removed).await?;
        if orphans.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidOperation(format!(
                "cannot remove features [{}]: features [{}] would keep a dependency on them",
                removed.join(", "),
                orphans.join(", ")
            )))
        }
    }

    /// Guard a removal set (archive, delete, or project move).
    ///
    /// Children inside the removal set are fine; a child outside it blocks
    /// the removal, as does any orphaned parent reference.
    pub async fn guard_removal(&self, features: &[String]) -> Result<(), EngineError> {
        let children = self.dependencies.children(features).await?;
        let outside: Vec<&String> = children
            .iter()
            .filter(|child| !features.contains(child))
            .collect();
        if !outside.is_empty() {
            return Err(EngineError::InvalidOperation(format!(
                "cannot remove features [{}]: features [{}] depend on them",
                features.join(", "),
                outside
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        self.validate_no_orphan_parents(features).await
    }

    /// Fail when any of `features` participates in a dependency; used by
    /// project moves, which cannot carry edges across projects.
    pub async fn validate_no_dependencies(&self, features: &[String]) -> Result<(), EngineError> {
        if self.dependencies.have_dependencies(features).await? {
            return Err(EngineError::InvalidOperation(format!(
                "features [{}] have dependencies and cannot change project",
                features.join(", ")
            )));
        }
        Ok(())
    }
}
