//! Resource limit guard
//!
//! Quota checks run before the write they protect, against a count read
//! from the store. The check-then-write pair is not transactional; a limit
//! may be transiently exceeded under concurrent creates, which is accepted
//! (soft quota).

use flagkit_types::Constraint;

use crate::error::EngineError;

/// Reject adding one more resource when `current` has reached `limit`.
pub fn check_before_add(
    resource: &'static str,
    current: usize,
    limit: usize,
) -> Result<(), EngineError> {
    if current >= limit {
        return Err(EngineError::LimitExceeded { resource, limit });
    }
    Ok(())
}

/// Reject a replacement collection whose size exceeds `limit`.
pub fn check_total(resource: &'static str, total: usize, limit: usize) -> Result<(), EngineError> {
    if total > limit {
        return Err(EngineError::LimitExceeded { resource, limit });
    }
    Ok(())
}

/// Check a replacement constraint list against the constraint and
/// constraint-value quotas.
///
/// Edits that do not grow a constraint keep working even when the stored
/// value count is already over quota: when the incoming list is the same
/// length as the existing one and the existing constraint at that position
/// already carried at least as many values, the per-constraint value check
/// is skipped.
pub fn check_constraint_limits(
    existing: &[Constraint],
    incoming: &[Constraint],
    constraint_limit: usize,
    value_limit: usize,
) -> Result<(), EngineError> {
    check_total("constraint", incoming.len(), constraint_limit)?;

    let positional_edit = existing.len() == incoming.len();
    for (position, constraint) in incoming.iter().enumerate() {
        let grandfathered = positional_edit
            && existing[position].value_count() >= constraint.value_count();
        if !grandfathered {
            check_total("constraint value", constraint.value_count(), value_limit)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagkit_types::Operator;

    fn with_values(count: usize) -> Constraint {
        Constraint {
            context_name: "userId".into(),
            operator: Operator::In,
            value: None,
            values: Some((0..count).map(|i| i.to_string()).collect()),
            case_insensitive: false,
            inverted: false,
        }
    }

    #[test]
    fn add_at_limit_is_rejected() {
        assert!(check_before_add("strategy", 1, 2).is_ok());
        let err = check_before_add("strategy", 2, 2).unwrap_err();
        assert!(matches!(
            err,
            EngineError::LimitExceeded {
                resource: "strategy",
                limit: 2
            }
        ));
    }

    #[test]
    fn growing_constraint_list_past_limit_is_rejected() {
        let incoming = vec![with_values(1), with_values(1), with_values(1)];
        let err = check_constraint_limits(&[with_values(1)], &incoming, 2, 10).unwrap_err();
        assert!(matches!(
            err,
            EngineError::LimitExceeded {
                resource: "constraint",
                ..
            }
        ));
    }

    #[test]
    fn shrinking_never_trips_the_limit() {
        // Stored list is already over the constraint quota of 2; reducing
        // it to 2 must pass.
        let existing = vec![with_values(5), with_values(5), with_values(5)];
        let incoming = vec![with_values(5), with_values(5)];
        assert!(check_constraint_limits(&existing, &incoming, 2, 10).is_ok());
    }

    #[test]
    fn same_position_equal_or_smaller_value_count_is_grandfathered() {
        let existing = vec![with_values(30)];
        let incoming = vec![with_values(30)];
        assert!(check_constraint_limits(&existing, &incoming, 5, 10).is_ok());

        let grown = vec![with_values(31)];
        assert!(check_constraint_limits(&existing, &grown, 5, 10).is_err());
    }
}
