//! Input validation for ledger records
//!
//! Every create/update input is checked in full before anything is written,
//! and the caller gets the complete list of offending fields rather than
//! the first one. Structural limits (lengths, ranges) are declared with
//! `validator` derives on the input types; the business rules that need
//! more context (required text that is only whitespace, positive amounts,
//! uniqueness) are added through [`FieldChecks`].

use std::fmt;

use core_kernel::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single invalid field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears in the serialized record
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field that failed validation, sorted by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding a single field error
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn push(&mut self, error: FieldError) {
        if !self.0.contains(&error) {
            self.0.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns true if `field` is among the offending fields
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Folds the errors reported by a `validator` derive into this list
    pub fn absorb(&mut self, errors: validator::ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| describe_code(&error.code));
                self.push(FieldError::new(field.to_string(), message));
            }
        }
    }

    /// Returns `Ok(())` when no errors were collected
    pub fn into_result(mut self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            self.0.sort_by(|a, b| a.field.cmp(&b.field));
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        let mut list = ValidationErrors::new();
        for error in errors {
            list.push(error);
        }
        list
    }
}

fn describe_code(code: &str) -> String {
    match code {
        "length" => "has an invalid length".to_string(),
        "range" => "is out of range".to_string(),
        other => format!("failed check '{other}'"),
    }
}

/// Accumulator for the context-dependent checks
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: ValidationErrors,
}

impl FieldChecks {
    /// Starts from the structural errors of a `validator` derive
    pub fn from_derive<T: validator::Validate>(input: &T) -> Self {
        let mut checks = Self::default();
        if let Err(errors) = input.validate() {
            checks.errors.absorb(errors);
        }
        checks
    }

    /// Adds the errors of an earlier validation pass
    pub fn merge(&mut self, result: Result<(), ValidationErrors>) -> &mut Self {
        if let Err(errors) = result {
            for error in errors.0 {
                self.errors.push(error);
            }
        }
        self
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn require_text(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "is required");
        }
        self
    }

    pub fn require_positive_id(&mut self, field: &str, value: i64) -> &mut Self {
        if value <= 0 {
            self.fail(field, "must be a positive number");
        }
        self
    }

    pub fn require_positive(&mut self, field: &str, value: Money) -> &mut Self {
        if !value.is_positive() {
            self.fail(field, "must be greater than zero");
        }
        self
    }

    pub fn require_non_negative(&mut self, field: &str, value: Money) -> &mut Self {
        if value.is_negative() {
            self.fail(field, "must not be negative");
        }
        self
    }

    pub fn require_non_negative_measure(&mut self, field: &str, value: Decimal) -> &mut Self {
        if value.is_sign_negative() && !value.is_zero() {
            self.fail(field, "must not be negative");
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }
}

/// Tracks the required keys a request body left out
///
/// Drafts pull each required value through [`Presence::take`]; an absent
/// value is recorded and replaced by a placeholder so the complete input can
/// still be validated. [`Presence::conclude`] then reports the absent keys as
/// "is required" in place of whatever the placeholder triggered.
#[derive(Debug, Default)]
pub struct Presence {
    missing: Vec<&'static str>,
}

impl Presence {
    pub fn take_or<T>(&mut self, field: &'static str, value: Option<T>, placeholder: T) -> T {
        match value {
            Some(value) => value,
            None => {
                self.missing.push(field);
                placeholder
            }
        }
    }

    pub fn take<T: Default>(&mut self, field: &'static str, value: Option<T>) -> T {
        self.take_or(field, value, T::default())
    }

    /// Validates `input` and merges in the absent keys
    pub fn conclude<T>(
        self,
        input: T,
        validate: impl FnOnce(&T) -> Result<(), ValidationErrors>,
    ) -> Result<T, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(found) = validate(&input) {
            for error in found.0 {
                if !self.missing.contains(&error.field.as_str()) {
                    errors.push(error);
                }
            }
        }
        for field in self.missing {
            errors.push(FieldError::new(field, "is required"));
        }
        errors.into_result().map(|()| input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_collects_every_field() {
        let mut checks = FieldChecks::default();
        checks
            .require_text("mobile_number", "  ")
            .require_text("buyer_name", "")
            .require_positive("amount", Money::zero());

        let errors = checks.finish().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.to_string(),
            "amount: must be greater than zero, buyer_name: is required, mobile_number: is required"
        );
    }

    #[test]
    fn test_no_errors_is_ok() {
        let mut checks = FieldChecks::default();
        checks
            .require_text("buyer_name", "Ali")
            .require_non_negative("remaining_amount", Money::zero())
            .require_non_negative_measure("area", dec!(0));
        assert!(checks.finish().is_ok());
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let mut errors = ValidationErrors::new();
        errors.push(FieldError::new("phase", "is out of range"));
        errors.push(FieldError::new("phase", "is out of range"));
        assert_eq!(errors.len(), 1);
        assert!(errors.has_field("phase"));
    }

    #[test]
    fn test_absent_keys_replace_placeholder_errors() {
        let mut presence = Presence::default();
        let name: String = presence.take("buyer_name", None);
        let amount = presence.take_or("amount", Some(Money::zero()), Money::from_units(1));

        let errors = presence
            .conclude((name, amount), |(name, amount)| {
                let mut checks = FieldChecks::default();
                checks.require_text("buyer_name", name).require_positive("amount", *amount);
                checks.finish()
            })
            .unwrap_err();

        assert_eq!(
            errors.to_string(),
            "amount: must be greater than zero, buyer_name: is required"
        );
    }

    #[test]
    fn test_complete_input_passes_through() {
        let mut presence = Presence::default();
        let phase = presence.take("phase", Some(2u8));
        assert_eq!(presence.conclude(phase, |_| Ok(())), Ok(2));
    }
}
