use async_trait::async_trait;
use flagkit_types::ContextField;

use crate::error::StoreError;

/// Read access to context field definitions, consumed by constraint
/// validation.
#[async_trait]
pub trait ContextFieldStore: Send + Sync {
    /// Fetch a context field by name; `None` when the field is undeclared.
    async fn get(&self, name: &str) -> Result<Option<ContextField>, StoreError>;
}
