//! Shared range-checking helpers.
//!
//! Input shape is normally checked at the API boundary; these helpers guard
//! the numeric invariants the simulator relies on before anything is written.

use crate::error::CoreError;

/// Validate that a value falls within `[0.0, 1.0]`.
///
/// Returns a `CoreError::Validation` naming the field if out of range.
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a value falls within `[min, max]`.
pub fn validate_range(value: f64, min: f64, max: f64, name: &str) -> Result<(), CoreError> {
    if !(min..=max).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a value is finite and not negative.
pub fn validate_non_negative(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a string is not blank.
pub fn validate_not_blank(value: &str, name: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_values() {
        assert!(validate_unit_range(0.0, "test").is_ok());
        assert!(validate_unit_range(0.5, "test").is_ok());
        assert!(validate_unit_range(1.0, "test").is_ok());
    }

    #[test]
    fn rejects_below_zero() {
        assert!(validate_unit_range(-0.01, "test").is_err());
    }

    #[test]
    fn rejects_above_one() {
        assert!(validate_unit_range(1.01, "test").is_err());
    }

    #[test]
    fn range_message_names_field() {
        let err = validate_range(101.0, 1.0, 100.0, "initial_life").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: initial_life must be between 1 and 100, got 101"
        );
    }

    #[test]
    fn non_negative_rejects_nan() {
        assert!(validate_non_negative(f64::NAN, "cost").is_err());
        assert!(validate_non_negative(-1.0, "cost").is_err());
        assert!(validate_non_negative(0.0, "cost").is_ok());
    }

    #[test]
    fn blank_strings_rejected() {
        assert!(validate_not_blank("   ", "name").is_err());
        assert!(validate_not_blank("Lathe 1", "name").is_ok());
    }
}
