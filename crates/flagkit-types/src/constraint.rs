use serde::{Deserialize, Serialize};

/// Constraint operator taxonomy.
///
/// The operator determines which of [`Constraint::value`] /
/// [`Constraint::values`] is populated and how it is validated: the
/// string-set family reads `values`, the numeric/semver/date families read
/// the single `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Context value is a member of `values` (legacy string-set).
    #[serde(rename = "IN")]
    In,
    /// Context value is not a member of `values` (legacy string-set).
    #[serde(rename = "NOT_IN")]
    NotIn,
    #[serde(rename = "STR_ENDS_WITH")]
    StrEndsWith,
    #[serde(rename = "STR_STARTS_WITH")]
    StrStartsWith,
    #[serde(rename = "STR_CONTAINS")]
    StrContains,
    #[serde(rename = "NUM_EQ")]
    NumEq,
    #[serde(rename = "NUM_GT")]
    NumGt,
    #[serde(rename = "NUM_GTE")]
    NumGte,
    #[serde(rename = "NUM_LT")]
    NumLt,
    #[serde(rename = "NUM_LTE")]
    NumLte,
    #[serde(rename = "DATE_AFTER")]
    DateAfter,
    #[serde(rename = "DATE_BEFORE")]
    DateBefore,
    #[serde(rename = "SEMVER_EQ")]
    SemverEq,
    #[serde(rename = "SEMVER_GT")]
    SemverGt,
    #[serde(rename = "SEMVER_LT")]
    SemverLt,
}

/// Which side of the `value` / `values` split an operator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintValueSpec {
    /// Single `value`, parsed as a number.
    Number,
    /// Single `value`, parsed as a semantic version.
    Semver,
    /// Single `value`, parsed as an RFC 3339 date.
    Date,
    /// `values` set of non-empty strings.
    StringSet,
    /// `values` set, passed through unvalidated (legacy membership operators).
    Membership,
}

impl Operator {
    /// The value family this operator belongs to.
    #[must_use]
    pub fn value_spec(self) -> ConstraintValueSpec {
        match self {
            Self::In | Self::NotIn => ConstraintValueSpec::Membership,
            Self::StrEndsWith | Self::StrStartsWith | Self::StrContains => {
                ConstraintValueSpec::StringSet
            }
            Self::NumEq | Self::NumGt | Self::NumGte | Self::NumLt | Self::NumLte => {
                ConstraintValueSpec::Number
            }
            Self::DateAfter | Self::DateBefore => ConstraintValueSpec::Date,
            Self::SemverEq | Self::SemverGt | Self::SemverLt => ConstraintValueSpec::Semver,
        }
    }

    /// True when the operator reads the plural `values` list.
    #[must_use]
    pub fn is_multi_value(self) -> bool {
        matches!(
            self.value_spec(),
            ConstraintValueSpec::StringSet | ConstraintValueSpec::Membership
        )
    }

    /// Wire name, as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::StrEndsWith => "STR_ENDS_WITH",
            Self::StrStartsWith => "STR_STARTS_WITH",
            Self::StrContains => "STR_CONTAINS",
            Self::NumEq => "NUM_EQ",
            Self::NumGt => "NUM_GT",
            Self::NumGte => "NUM_GTE",
            Self::NumLt => "NUM_LT",
            Self::NumLte => "NUM_LTE",
            Self::DateAfter => "DATE_AFTER",
            Self::DateBefore => "DATE_BEFORE",
            Self::SemverEq => "SEMVER_EQ",
            Self::SemverGt => "SEMVER_GT",
            Self::SemverLt => "SEMVER_LT",
        }
    }
}

/// A predicate on a context field, gating whether a strategy applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    /// The context field this constraint reads.
    pub context_name: String,
    pub operator: Operator,
    /// Single comparison value for numeric/semver/date operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Value set for string-set and membership operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub inverted: bool,
}

impl Constraint {
    /// All values this constraint carries, regardless of operator family.
    #[must_use]
    pub fn all_values(&self) -> Vec<&str> {
        match (&self.value, &self.values) {
            (Some(v), _) => vec![v.as_str()],
            (None, Some(vs)) => vs.iter().map(String::as_str).collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Number of values carried, used by the constraint-values quota.
    #[must_use]
    pub fn value_count(&self) -> usize {
        match self.operator.is_multi_value() {
            true => self.values.as_ref().map_or(0, Vec::len),
            false => usize::from(self.value.is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_wire_names_round_trip() {
        for op in [
            Operator::In,
            Operator::NumGte,
            Operator::SemverLt,
            Operator::DateAfter,
            Operator::StrContains,
        ] {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
            let back: Operator = serde_json::from_str(&json).unwrap();
            assert_eq!(back, op);
        }
    }

    #[test]
    fn value_count_follows_operator_family() {
        let multi = Constraint {
            context_name: "userId".into(),
            operator: Operator::In,
            value: None,
            values: Some(vec!["a".into(), "b".into(), "c".into()]),
            case_insensitive: false,
            inverted: false,
        };
        assert_eq!(multi.value_count(), 3);

        let single = Constraint {
            context_name: "appVersion".into(),
            operator: Operator::SemverGt,
            value: Some("1.2.3".into()),
            values: None,
            case_insensitive: false,
            inverted: false,
        };
        assert_eq!(single.value_count(), 1);
    }
}
