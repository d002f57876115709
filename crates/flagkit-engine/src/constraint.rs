//! Constraint validation
//!
//! Pure validation of a single constraint: structural checks first, then
//! operator-family dispatch (numeric, semver, date, string-set), then legal
//! value membership against the declared context field. Returns the
//! constraint unchanged on success; never writes.

use std::sync::Arc;

use chrono::DateTime;
use flagkit_store::ContextFieldStore;
use flagkit_types::{Constraint, ConstraintValueSpec, ContextField};
use futures::future::try_join_all;

use crate::error::EngineError;

/// Validates constraints against operator rules and context-field legal
/// values.
pub struct ConstraintValidator {
    context_fields: Arc<dyn ContextFieldStore>,
}

impl ConstraintValidator {
    /// New validator reading context fields from the given store.
    #[must_use]
    pub fn new(context_fields: Arc<dyn ContextFieldStore>) -> Self {
        Self { context_fields }
    }

    /// Validate one constraint.
    ///
    /// # Errors
    ///
    /// `BadData` naming the offending value(s) on any rule violation.
    pub async fn validate(&self, constraint: &Constraint) -> Result<Constraint, EngineError> {
        validate_shape(constraint)?;

        let field = self.context_fields.get(&constraint.context_name).await?;
        if let Some(field) = field {
            validate_legal_values(constraint, &field)?;
        }
        Ok(constraint.clone())
    }

    /// Validate a list of constraints. Checks are read-only and
    /// order-independent, so they are dispatched concurrently.
    pub async fn validate_all(
        &self,
        constraints: &[Constraint],
    ) -> Result<Vec<Constraint>, EngineError> {
        try_join_all(constraints.iter().map(|c| self.validate(c))).await
    }
}

fn validate_shape(constraint: &Constraint) -> Result<(), EngineError> {
    if constraint.context_name.is_empty() {
        return Err(EngineError::bad_data(
            "constraint is missing a context field name",
        ));
    }

    let operator = constraint.operator;
    match operator.value_spec() {
        ConstraintValueSpec::Number => {
            let value = require_single_value(constraint)?;
            value.parse::<f64>().map_err(|_| {
                EngineError::bad_data(format!(
                    "value '{value}' is not a number (operator {})",
                    operator.as_str()
                ))
            })?;
        }
        ConstraintValueSpec::Semver => {
            let value = require_single_value(constraint)?;
            semver::Version::parse(value).map_err(|_| {
                EngineError::bad_data(format!(
                    "value '{value}' is not a valid semver (operator {})",
                    operator.as_str()
                ))
            })?;
        }
        ConstraintValueSpec::Date => {
            let value = require_single_value(constraint)?;
            DateTime::parse_from_rfc3339(value).map_err(|_| {
                EngineError::bad_data(format!(
                    "value '{value}' is not a valid date (operator {})",
                    operator.as_str()
                ))
            })?;
        }
        ConstraintValueSpec::StringSet => {
            let values = require_values(constraint)?;
            if values.iter().any(String::is_empty) {
                return Err(EngineError::bad_data(format!(
                    "operator {} requires non-empty string values",
                    operator.as_str()
                )));
            }
        }
        // Legacy membership operators carry opaque values; they are only
        // checked against legal values below.
        ConstraintValueSpec::Membership => {
            require_values(constraint)?;
        }
    }
    Ok(())
}

fn require_single_value(constraint: &Constraint) -> Result<&str, EngineError> {
    constraint.value.as_deref().ok_or_else(|| {
        EngineError::bad_data(format!(
            "operator {} requires a single value",
            constraint.operator.as_str()
        ))
    })
}

fn require_values(constraint: &Constraint) -> Result<&[String], EngineError> {
    constraint
        .values
        .as_deref()
        .ok_or_else(|| {
            EngineError::bad_data(format!(
                "operator {} requires a list of values",
                constraint.operator.as_str()
            ))
        })
}

fn validate_legal_values(constraint: &Constraint, field: &ContextField) -> Result<(), EngineError> {
    if field.legal_values.is_empty() {
        return Ok(());
    }

    let illegal: Vec<&str> = constraint
        .all_values()
        .into_iter()
        .filter(|value| !field.allows(value))
        .collect();

    if illegal.is_empty() {
        Ok(())
    } else {
        Err(EngineError::bad_data(format!(
            "constraint values [{}] are not legal values for context field '{}'",
            illegal.join(", "),
            field.name
        )))
    }
}
