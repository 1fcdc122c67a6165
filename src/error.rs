//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while loading country rule sets
//! and running a gross-to-net calculation.

use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the payroll engine.
///
/// Malformed rule data is never reported through this type: it is clamped to a
/// zero contribution at load time. Only missing configuration, invalid input at
/// the employee boundary and internal inconsistencies surface as errors.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::CountryConfigNotFound {
///     country: "Atlantis".to_string(),
/// };
/// assert_eq!(error.to_string(), "Country configuration not found for Atlantis");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file or directory was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A country rule set parsed but violates a load-time invariant.
    #[error("Invalid configuration for country '{country}': {message}")]
    InvalidConfig {
        /// The country key of the offending rule set.
        country: String,
        /// A description of the violated invariant.
        message: String,
    },

    /// No rule set exists for the requested country.
    #[error("Country configuration not found for {country}")]
    CountryConfigNotFound {
        /// The country that was requested.
        country: String,
    },

    /// An employee record was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// Computed totals do not match the sum of their components.
    #[error("Integrity check '{check}' failed: expected {expected}, got {actual}")]
    IntegrityViolation {
        /// The name of the failed check.
        check: String,
        /// The sum of the components.
        expected: Decimal,
        /// The total that was computed.
        actual: Decimal,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/countries".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/countries"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/spain.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/spain.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_invalid_config_displays_country_and_message() {
        let error = EngineError::InvalidConfig {
            country: "Spain".to_string(),
            message: "periods_per_year must be at least 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration for country 'Spain': periods_per_year must be at least 1"
        );
    }

    #[test]
    fn test_country_config_not_found_displays_country() {
        let error = EngineError::CountryConfigNotFound {
            country: "Narnia".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Country configuration not found for Narnia"
        );
    }

    #[test]
    fn test_invalid_employee_displays_field_and_message() {
        let error = EngineError::InvalidEmployee {
            field: "country".to_string(),
            message: "Country is required".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid employee field 'country': Country is required"
        );
    }

    #[test]
    fn test_integrity_violation_displays_amounts() {
        let error = EngineError::IntegrityViolation {
            check: "total_deductions".to_string(),
            expected: Decimal::new(10000, 2),
            actual: Decimal::new(10001, 2),
        };
        assert_eq!(
            error.to_string(),
            "Integrity check 'total_deductions' failed: expected 100.00, got 100.01"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_country_not_found() -> EngineResult<()> {
            Err(EngineError::CountryConfigNotFound {
                country: "Nowhere".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_country_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
