//! Validation utilities for the wine lots storefront
//!
//! Field rules used by the `validator` derives on the input models, plus
//! plain checks reused by the admin panel through WASM.

use std::collections::BTreeMap;

use validator::ValidationError;

/// Most units of one case a single submission may request
pub const MAX_UNITS_PER_CASE: i64 = 24;

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a case slug: 1-60 chars of lowercase ascii, digits and dashes,
/// not starting or ending with a dash
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let well_formed = !slug.is_empty()
        && slug.len() <= 60
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if well_formed {
        Ok(())
    } else {
        let mut error = ValidationError::new("slug");
        error.message = Some("Slug must be lowercase letters, digits and dashes".into());
        Err(error)
    }
}

/// Validate a lot threshold; 1 (direct order) is the smallest valid value
pub fn validate_min_participants(min: i32) -> Result<(), &'static str> {
    if min < 1 {
        return Err("Minimum participants must be at least 1");
    }
    if min > 1000 {
        return Err("Minimum participants is unreasonably large");
    }
    Ok(())
}

// ============================================================================
// Submission Validations
// ============================================================================

/// Validate requested quantities: at most [`MAX_UNITS_PER_CASE`] per case.
/// Zero and negative quantities are allowed here; they mean "not selected".
pub fn validate_case_quantities(cases: &BTreeMap<String, i64>) -> Result<(), ValidationError> {
    if cases.values().any(|qty| *qty > MAX_UNITS_PER_CASE) {
        let mut error = ValidationError::new("quantity");
        error.message = Some(
            format!("At most {} cases of each kind per request", MAX_UNITS_PER_CASE).into(),
        );
        return Err(error);
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format");
    }
    Ok(())
}
