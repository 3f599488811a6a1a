//! Validation utilities for the pharmacy ledger
//!
//! Custom validators plugged into `#[derive(Validate)]` on request schemas,
//! plus helpers for turning `validator` errors into a single field message.

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

/// Largest money value accepted by `NUMERIC(12,2)`
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

// ============================================================================
// Field validators
// ============================================================================

/// Reject strings made only of whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "must not be blank"));
    }
    Ok(())
}

/// Money must be non-negative, have at most 2 decimal places and fit NUMERIC(12,2)
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(error("negative", "must not be negative"));
    }
    if value.normalize().scale() > 2 {
        return Err(error("scale", "must have at most 2 decimal places"));
    }
    if *value > MAX_MONEY {
        return Err(error("too_large", "exceeds the maximum amount"));
    }
    Ok(())
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

// ============================================================================
// Error summaries
// ============================================================================

/// First failing field and a readable message, ordered by field name so the
/// same input always reports the same field.
pub fn summarize(errors: &ValidationErrors) -> (String, String) {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    match fields.first() {
        Some((field, errs)) => {
            let message = errs
                .first()
                .map(describe)
                .unwrap_or_else(|| "is invalid".to_string());
            (field.to_string(), format!("{field} {message}"))
        }
        None => ("request".to_string(), "request is invalid".to_string()),
    }
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    match err.code.as_ref() {
        "range" => match (err.params.get("min"), err.params.get("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be at least {min}"),
            (None, Some(max)) => format!("must be at most {max}"),
            _ => "is out of range".to_string(),
        },
        "length" => match (err.params.get("min"), err.params.get("max")) {
            (Some(min), Some(max)) => format!("length must be between {min} and {max}"),
            (Some(min), None) => format!("length must be at least {min}"),
            (None, Some(max)) => format!("length must be at most {max}"),
            _ => "has an invalid length".to_string(),
        },
        other => format!("is invalid ({other})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use validator::Validate;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("阿莫西林").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t ").is_err());
    }

    #[test]
    fn test_money_bounds() {
        assert!(validate_money(&Decimal::ZERO).is_ok());
        assert!(validate_money(&Decimal::from_str("12.50").unwrap()).is_ok());
        assert!(validate_money(&Decimal::from_str("9999999999.99").unwrap()).is_ok());
        assert!(validate_money(&Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_money(&Decimal::from_str("1.005").unwrap()).is_err());
        assert!(validate_money(&Decimal::from_str("10000000000").unwrap()).is_err());
    }

    #[test]
    fn test_money_trailing_zeros_allowed() {
        assert!(validate_money(&Decimal::from_str("3.1000").unwrap()).is_ok());
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(range(min = 1))]
        quantity: i32,
        #[validate(custom = "validate_not_blank")]
        reason: String,
    }

    #[test]
    fn test_summarize_reports_first_field_alphabetically() {
        let sample = Sample {
            quantity: 0,
            reason: " ".into(),
        };
        let errors = sample.validate().unwrap_err();
        let (field, message) = summarize(&errors);
        assert_eq!(field, "quantity");
        assert!(message.starts_with("quantity must be at least 1"));
    }

    #[test]
    fn test_summarize_uses_custom_message() {
        let sample = Sample {
            quantity: 3,
            reason: "".into(),
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(summarize(&errors).1, "reason must not be blank");
    }
}
