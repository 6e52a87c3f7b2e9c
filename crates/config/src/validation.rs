//! Validation for configuration values

pub use crate::error::ValidationError;

/// A configuration section that can validate and merge itself
pub trait ConfigSection: Default {
    /// Returns every problem found; `Ok` means valid
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another section into this one, `other` wins
    fn merge(&mut self, other: Self);

    /// Returns the section name for error reporting
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a value is within an inclusive range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates a similarity score threshold
    ///
    /// NaN fails the range comparison, so it is rejected explicitly.
    pub fn unit_interval(value: f64, field: &str) -> Result<(), ValidationError> {
        if value.is_nan() {
            return Err(ValidationError::with_value(field, "must be a number", value));
        }
        Self::in_range(value, 0.0, 1.0, field)
    }

    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
