use serde::{Deserialize, Serialize};

/// Total weight a variant list sums to after normalization.
pub const WEIGHT_TOTAL: u16 = 1000;

/// Whether a variant's weight is pinned or redistributed by normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightType {
    /// Weight is set by the caller and never adjusted.
    Fix,
    /// Weight is recomputed so the list totals [`WEIGHT_TOTAL`].
    Variable,
}

/// Payload content type for a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    String,
    Json,
    Csv,
    Number,
}

/// Typed payload delivered to clients that receive this variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    #[serde(rename = "type")]
    pub payload_type: PayloadType,
    pub value: String,
}

/// A named traffic split within a strategy, weighted out of 1000.
///
/// Names are unique within the owning strategy. Weight normalization keeps
/// the sum of all weights in a list at exactly [`WEIGHT_TOTAL`]; see the
/// engine's weight fixer for the redistribution rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub name: String,
    /// Weight out of [`WEIGHT_TOTAL`].
    pub weight: u16,
    pub weight_type: WeightType,
    /// Stickiness field used for consistent assignment; `None` inherits the
    /// strategy default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stickiness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Variant {
    /// A variable-weight variant with no payload, weight assigned later by
    /// normalization.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 0,
            weight_type: WeightType::Variable,
            stickiness: None,
            payload: None,
        }
    }

    /// A fixed-weight variant.
    #[must_use]
    pub fn fixed(name: impl Into<String>, weight: u16) -> Self {
        Self {
            name: name.into(),
            weight,
            weight_type: WeightType::Fix,
            stickiness: None,
            payload: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&WeightType::Fix).unwrap(), "\"fix\"");
        assert_eq!(
            serde_json::to_string(&WeightType::Variable).unwrap(),
            "\"variable\""
        );
    }

    #[test]
    fn payload_uses_type_key() {
        let payload = Payload {
            payload_type: PayloadType::Json,
            value: "{}".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "json");
        assert_eq!(json["value"], "{}");
    }
}
