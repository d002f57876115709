//! Error types for the flagkit engine
//!
//! One taxonomy covers every mutation path:
//! - structural lookups that miss raise [`EngineError::NotFound`]
//! - schema/semantic validation failures raise [`EngineError::BadData`]
//! - structurally disallowed mutations raise [`EngineError::InvalidOperation`]
//! - gate denials raise [`EngineError::Permission`] / [`EngineError::Forbidden`]
//!
//! All validation errors are raised before the first persistent write of the
//! mutation that produced them.

use flagkit_store::StoreError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A referenced entity is absent (feature, strategy, environment,
    /// project, segment, strategy type).
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind.
        kind: &'static str,
        /// Identifier that missed.
        id: String,
    },

    /// Schema or semantic validation failure.
    #[error("bad data: {0}")]
    BadData(String),

    /// Structurally disallowed mutation (dependency violations,
    /// cross-project mismatches).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The caller lacks a required capability.
    #[error("permission denied: missing {capability} for project {project}")]
    Permission {
        /// The denied capability.
        capability: String,
        /// Project scope of the check.
        project: String,
        /// Environment scope, when the check was environment-specific.
        environment: Option<String>,
    },

    /// A feature with this name already exists.
    #[error("a feature named '{0}' already exists")]
    NameExists(String),

    /// The feature name violates the project naming pattern.
    #[error("feature name '{name}' does not match project pattern '{pattern}'")]
    Pattern {
        /// The rejected name.
        name: String,
        /// The pattern it must match.
        pattern: String,
    },

    /// Blocked by change-request policy at a level the caller cannot bypass.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Mutation attempted on an archived feature.
    #[error("feature '{0}' is archived and cannot be modified")]
    ArchivedFeature(String),

    /// A configured resource quota is reached.
    #[error("{resource} limit of {limit} reached")]
    LimitExceeded {
        /// Quota kind, e.g. `"strategy"` or `"constraint value"`.
        resource: &'static str,
        /// The configured limit.
        limit: usize,
    },

    /// Untranslated store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Missing-entity error for the given kind and id.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Validation failure with a caller-facing message.
    #[must_use]
    pub fn bad_data(message: impl Into<String>) -> Self {
        Self::BadData(message.into())
    }

    /// True for errors raised before any write (safe to retry with fixed
    /// input).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BadData(_)
                | Self::Pattern { .. }
                | Self::NameExists(_)
                | Self::LimitExceeded { .. }
        )
    }

    /// True when the caller was denied rather than the input rejected.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Permission { .. } | Self::Forbidden(_))
    }
}
