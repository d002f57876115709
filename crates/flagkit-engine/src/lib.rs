//! flagkit mutation engine
//!
//! The orchestrating core of the feature-flag configuration system.
//!
//! # Core Concepts
//!
//! - [`FlagEngine`]: sequences every mutation as gate → validation →
//!   persistence → audit emission
//! - [`ConstraintValidator`]: operator-family and legal-value checks
//! - [`fix_variant_weights`]: deterministic 1000-total weight normalization
//! - [`DependencyGuard`]: keeps the feature dependency graph intact across
//!   archive/delete/move
//! - [`ChangeRequestGate`]: per-project/environment approval-workflow gating
//! - [`EngineError`]: the single error taxonomy every operation raises
//!
//! # Example
//!
//! ```rust,ignore
//! use flagkit_engine::{EngineConfig, EngineStores, FlagEngine};
//!
//! let engine = FlagEngine::new(EngineConfig::default(), stores);
//! let feature = engine.create_feature("default", input, &user).await?;
//! engine.update_enabled("default", &feature.name, "production", true, false, &user).await?;
//! ```
//!
//! The engine holds `Arc<dyn Trait>` collaborators from `flagkit-store` and
//! issues a strict sequence of awaited calls; there is no internal
//! parallelism and no cross-call transaction (see `engine` module docs).

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod change_request;
mod constraint;
mod dependency;
mod engine;
mod error;
mod limits;
mod variant;

pub use change_request::{ChangeRequestGate, SKIP_CHANGE_REQUEST};
pub use constraint::ConstraintValidator;
pub use dependency::DependencyGuard;
pub use engine::{
    EngineConfig, EngineStores, FlagEngine, SortOrderUpdate, CREATE_FEATURE_STRATEGY,
    FLEXIBLE_ROLLOUT,
};
pub use error::EngineError;
pub use limits::{check_before_add, check_constraint_limits, check_total};
pub use variant::fix_variant_weights;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
