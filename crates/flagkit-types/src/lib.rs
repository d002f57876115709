//! flagkit domain model
//!
//! Shared types for the feature-flag configuration core:
//!
//! - [`Feature`]: a project-scoped flag with per-environment activation state
//! - [`Strategy`]: an activation rule attached to a (feature, environment)
//! - [`Constraint`]: a context-field predicate gating a strategy
//! - [`Variant`]: a weighted traffic split within a strategy
//! - [`Event`]: an immutable pre/post audit snapshot pair
//! - [`ResourceLimits`]: configured quotas on flags, strategies, constraints
//!
//! These types are persistence-agnostic; store traits live in
//! `flagkit-store` and all mutation logic in `flagkit-engine`.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod constraint;
mod context;
mod events;
mod feature;
mod limits;
mod segment;
mod strategy;
mod variant;

pub use constraint::{Constraint, ConstraintValueSpec, Operator};
pub use context::{ContextField, LegalValue};
pub use events::{AuditIdentity, Event, EventType, PublicStrategy};
pub use feature::{
    Dependency, EnvironmentBinding, Feature, FeatureCreate, FeatureMetadataUpdate,
};
pub use limits::ResourceLimits;
pub use segment::Segment;
pub use strategy::{Parameters, Strategy, StrategyCreate, StrategyUpdate};
pub use variant::{Payload, PayloadType, Variant, WeightType, WEIGHT_TOTAL};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
