//! # Error Types
//!
//! Structured error types for calc_engine. These cover the *engine* channel:
//! unknown calculators, raw input that does not match a field's schema,
//! broken configurations and unreadable resources.
//!
//! Domain-level problems (a VLSM request that does not fit, a RAID array
//! below its minimum drive count) are not errors. Compute functions report
//! them through [`CalculatorResults::is_valid`](crate::results::CalculatorResults).
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::errors::{CalcError, CalcResult};
//!
//! fn validate_page_views(page_views: f64) -> CalcResult<()> {
//!     if page_views < 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "pageViews".to_string(),
//!             value: page_views.to_string(),
//!             reason: "Page views cannot be negative".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_engine operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for engine operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A raw input value does not satisfy its field schema
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No calculator registered under this id
    #[error("Unknown calculator: {calculator_id}")]
    UnknownCalculator { calculator_id: String },

    /// The calculator has no preset with this id
    #[error("Unknown preset '{preset_id}' for calculator '{calculator_id}'")]
    UnknownPreset {
        calculator_id: String,
        preset_id: String,
    },

    /// A calculator configuration violates the schema contract
    #[error("Invalid configuration for '{calculator_id}': {}", .issues.join("; "))]
    InvalidConfig {
        calculator_id: String,
        issues: Vec<String>,
    },

    /// A locale bundle lacks keys present in the reference locale
    #[error("Missing translations in '{calculator_id}' [{locale}]: {}", .keys.join(", "))]
    MissingTranslation {
        calculator_id: String,
        locale: String,
        keys: Vec<String>,
    },

    /// A locale resource could not be read or parsed
    #[error("Locale resource error: '{path}' - {reason}")]
    LocaleError { path: String, reason: String },

    /// Engine settings could not be loaded
    #[error("Settings error: '{path}' - {reason}")]
    SettingsError { path: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UnknownCalculator error
    pub fn unknown_calculator(calculator_id: impl Into<String>) -> Self {
        CalcError::UnknownCalculator {
            calculator_id: calculator_id.into(),
        }
    }

    /// Create an UnknownPreset error
    pub fn unknown_preset(calculator_id: impl Into<String>, preset_id: impl Into<String>) -> Self {
        CalcError::UnknownPreset {
            calculator_id: calculator_id.into(),
            preset_id: preset_id.into(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(calculator_id: impl Into<String>, issues: Vec<String>) -> Self {
        CalcError::InvalidConfig {
            calculator_id: calculator_id.into(),
            issues,
        }
    }

    /// Create a LocaleError
    pub fn locale_error(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::LocaleError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SettingsError
    pub fn settings_error(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::SettingsError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller can fix this by changing the request alone
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidInput { .. }
                | CalcError::MissingField { .. }
                | CalcError::UnknownCalculator { .. }
                | CalcError::UnknownPreset { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnknownCalculator { .. } => "UNKNOWN_CALCULATOR",
            CalcError::UnknownPreset { .. } => "UNKNOWN_PRESET",
            CalcError::InvalidConfig { .. } => "INVALID_CONFIG",
            CalcError::MissingTranslation { .. } => "MISSING_TRANSLATION",
            CalcError::LocaleError { .. } => "LOCALE_ERROR",
            CalcError::SettingsError { .. } => "SETTINGS_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("pageViews", "-5", "Page views cannot be negative");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("test").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::unknown_calculator("mortgage").error_code(), "UNKNOWN_CALCULATOR");
        assert_eq!(CalcError::unknown_preset("raid", "x").error_code(), "UNKNOWN_PRESET");
    }

    #[test]
    fn test_request_errors() {
        assert!(CalcError::unknown_calculator("x").is_request_error());
        assert!(!CalcError::invalid_config("x", vec!["bad".into()]).is_request_error());
    }

    #[test]
    fn test_display_joins_issues() {
        let err = CalcError::invalid_config("vlsm", vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Invalid configuration for 'vlsm': a; b");
    }
}
