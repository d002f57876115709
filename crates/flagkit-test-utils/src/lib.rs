//! Testing utilities for the flagkit workspace
//!
//! Shared in-memory store backend, fixtures, and engine setup helpers.

#![allow(missing_docs)]

mod backend;

use std::sync::Arc;

use flagkit_engine::{EngineConfig, EngineStores, FlagEngine};
use flagkit_types::{
    AuditIdentity, Constraint, ContextField, FeatureCreate, LegalValue, Operator,
};

pub use backend::InMemoryBackend;

/// Install a tracing subscriber for test output once; later calls are
/// no-ops. Honors `RUST_LOG`.
pub fn init_tracing() {
    static INIT: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
    INIT.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// The audit identity used by most tests.
pub fn test_user() -> AuditIdentity {
    AuditIdentity::named("test-user")
}

/// Backend seeded with a "default" project and the default/development/
/// production environments.
pub fn setup_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    backend.add_project("default");
    backend.add_environment("default");
    backend.add_environment("development");
    backend.add_environment("production");
    backend
}

/// Engine wired to every seam of the given backend.
pub fn setup_engine(backend: &InMemoryBackend) -> FlagEngine {
    FlagEngine::new(
        EngineConfig::default(),
        EngineStores {
            features: Arc::new(backend.clone()),
            strategies: Arc::new(backend.clone()),
            bindings: Arc::new(backend.clone()),
            context_fields: Arc::new(backend.clone()),
            segments: Arc::new(backend.clone()),
            events: Arc::new(backend.clone()),
            dependencies: Arc::new(backend.clone()),
            change_requests: Arc::new(backend.clone()),
            access: Arc::new(backend.clone()),
            projects: Arc::new(backend.clone()),
            limits: Arc::new(backend.clone()),
        },
    )
}

/// Backend plus engine, the common starting point.
pub fn setup() -> (InMemoryBackend, FlagEngine) {
    init_tracing();
    let backend = setup_backend();
    let engine = setup_engine(&backend);
    (backend, engine)
}

pub fn feature_input(name: &str) -> FeatureCreate {
    FeatureCreate {
        name: name.to_string(),
        description: None,
    }
}

/// An IN constraint over the given context field.
pub fn in_constraint(context: &str, values: &[&str]) -> Constraint {
    Constraint {
        context_name: context.to_string(),
        operator: Operator::In,
        value: None,
        values: Some(values.iter().map(|v| (*v).to_string()).collect()),
        case_insensitive: false,
        inverted: false,
    }
}

/// A context field restricted to the given legal values.
pub fn restricted_field(name: &str, legal: &[&str]) -> ContextField {
    ContextField {
        name: name.to_string(),
        description: None,
        legal_values: legal
            .iter()
            .map(|v| LegalValue {
                value: (*v).to_string(),
                description: None,
            })
            .collect(),
    }
}
