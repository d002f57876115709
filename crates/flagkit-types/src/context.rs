use serde::{Deserialize, Serialize};

/// A single legal value for a context field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A context field definition, consumed by constraint validation.
///
/// When `legal_values` is non-empty, every constraint value targeting this
/// field must be a member of the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub legal_values: Vec<LegalValue>,
}

impl ContextField {
    /// A field with no legal-value restriction.
    #[must_use]
    pub fn unrestricted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            legal_values: Vec::new(),
        }
    }

    /// True when `value` is allowed for this field.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        self.legal_values.is_empty() || self.legal_values.iter().any(|lv| lv.value == value)
    }
}
