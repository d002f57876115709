//! Variant weight normalization
//!
//! Keeps the invariant that a non-empty variant list always sums to exactly
//! [`WEIGHT_TOTAL`]: fixed weights are taken as-is, the remaining budget is
//! split evenly over the variable variants, and leftover units go one each
//! to the earliest variable variants in input order.

use flagkit_types::{Variant, WeightType, WEIGHT_TOTAL};

use crate::error::EngineError;

/// Normalize a variant list so its weights total [`WEIGHT_TOTAL`].
///
/// The empty list passes through unchanged. Identity members (name,
/// payload, stickiness) are preserved; only `weight` changes, and only on
/// variable variants. Output is sorted by name ascending.
///
/// # Errors
///
/// - `BadData("There must be at least one variable variant")` when the
///   input is non-empty and every variant is fixed
/// - `BadData("traffic distribution total must equal 100%")` when fixed
///   weights alone exceed the total
pub fn fix_variant_weights(variants: Vec<Variant>) -> Result<Vec<Variant>, EngineError> {
    if variants.is_empty() {
        return Ok(variants);
    }

    let (mut variable, fixed): (Vec<Variant>, Vec<Variant>) = variants
        .into_iter()
        .partition(|v| v.weight_type == WeightType::Variable);

    if variable.is_empty() {
        return Err(EngineError::bad_data(
            "There must be at least one variable variant",
        ));
    }

    let fixed_sum: u32 = fixed.iter().map(|v| u32::from(v.weight)).sum();
    if fixed_sum > u32::from(WEIGHT_TOTAL) {
        return Err(EngineError::bad_data(
            "traffic distribution total must equal 100%",
        ));
    }

    let budget = u32::from(WEIGHT_TOTAL) - fixed_sum;
    let count = variable.len() as u32;
    let average = budget / count;
    let remainder = budget % count;

    for (position, variant) in variable.iter_mut().enumerate() {
        let extra = u32::from((position as u32) < remainder);
        // budget / count <= 1000 so the cast cannot truncate
        variant.weight = (average + extra) as u16;
    }

    let mut normalized = variable;
    normalized.extend(fixed);
    normalized.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(normalized)
}
