/// Constraint name raised when a strategy is written against an environment
/// not connected to its project. The engine matches on this to produce a
/// specific domain error.
pub const FK_STRATEGY_ENVIRONMENT: &str = "feature_strategies_environment_fkey";

/// Errors raised by store implementations.
///
/// Store errors are infrastructure-level; the engine either translates them
/// (known foreign-key constraints become `BadData` with a specific message)
/// or wraps them unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A row the operation targeted does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Row kind, e.g. `"feature"` or `"strategy"`.
        kind: &'static str,
        /// Identifier of the missing row.
        id: String,
    },

    /// A referential-integrity constraint rejected the write.
    #[error("foreign key violation: {constraint}")]
    ForeignKeyViolation {
        /// Database constraint name.
        constraint: String,
    },

    /// A uniqueness constraint rejected the write.
    #[error("duplicate {kind}: {id}")]
    DuplicateKey {
        /// Row kind.
        kind: &'static str,
        /// Conflicting identifier.
        id: String,
    },

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Missing-row error for the given kind and id.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True when this error is the environment-connection foreign key.
    #[must_use]
    pub fn is_environment_fk(&self) -> bool {
        matches!(
            self,
            Self::ForeignKeyViolation { constraint } if constraint == FK_STRATEGY_ENVIRONMENT
        )
    }
}
