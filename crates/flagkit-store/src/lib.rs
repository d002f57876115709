//! flagkit store abstraction
//!
//! Async trait seams between the mutation engine and its collaborators.
//! The engine never talks to a database; it holds `Arc<dyn Trait>` handles
//! to these interfaces and issues a strict sequence of awaited calls:
//!
//! - [`FeatureStore`] / [`StrategyStore`] / [`EnvironmentBindingStore`]:
//!   the persisted aggregates
//! - [`ContextFieldStore`] / [`SegmentService`]: reference data consumed by
//!   validation
//! - [`DependencyReadModel`] / [`ChangeRequestAccess`] / [`AccessService`] /
//!   [`ProjectReadModel`] / [`ResourceLimitProvider`]: read models backing
//!   the guard layers
//! - [`EventSink`]: the append-only audit log
//!
//! Implementations raise [`StoreError`]; the engine translates known
//! foreign-key constraint names into domain errors.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod access;
mod context;
mod dependency;
mod environment;
mod error;
mod events;
mod feature;
mod limits;
mod project;
mod segments;
mod strategy;

pub use access::{AccessService, ChangeRequestAccess};
pub use context::ContextFieldStore;
pub use dependency::DependencyReadModel;
pub use environment::EnvironmentBindingStore;
pub use error::{StoreError, FK_STRATEGY_ENVIRONMENT};
pub use events::EventSink;
pub use feature::FeatureStore;
pub use limits::ResourceLimitProvider;
pub use project::ProjectReadModel;
pub use segments::SegmentService;
pub use strategy::StrategyStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
