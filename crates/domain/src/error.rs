//! Unified error types for the domain layer
//!
//! Authoring data is validated into domain types at load time; every rejection
//! surfaces as a `DomainError` so loaders never deal with raw strings.

use thiserror::Error;

use crate::value_objects::{DiceParseError, FormulaError};

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Rule violation (e.g., stage already at maximum)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A damage, heal or duration formula was rejected
    #[error("Invalid formula '{formula}': {source}")]
    Formula {
        formula: String,
        #[source]
        source: FormulaError,
    },
}

impl DomainError {
    /// Creates a validation error for authoring data that breaks a rule.
    ///
    /// # Example
    /// ```ignore
    /// if reach == 0 {
    ///     return Err(DomainError::validation("reach_steps must be positive"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a formula error, keeping the offending source text
    pub fn formula(formula: impl Into<String>, source: FormulaError) -> Self {
        Self::Formula {
            formula: formula.into(),
            source,
        }
    }
}

impl From<DiceParseError> for DomainError {
    fn from(err: DiceParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_formats_message() {
        let err = DomainError::validation("reach_steps must be positive");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation failed: reach_steps must be positive"
        );
    }

    #[test]
    fn not_found_error_names_entity() {
        let err = DomainError::not_found("Weapon", "rusty_saber");
        assert!(err.to_string().contains("Weapon"));
        assert!(err.to_string().contains("rusty_saber"));
    }

    #[test]
    fn from_dice_parse_error() {
        let domain_err: DomainError = DiceParseError::Empty.into();
        assert!(matches!(domain_err, DomainError::Parse(_)));
        assert!(domain_err.to_string().contains("Empty dice formula"));
    }

    #[test]
    fn formula_error_keeps_source_text() {
        let err = DomainError::formula("1d6+POW", FormulaError::ForbiddenToken("POW".into()));
        assert!(err.to_string().contains("1d6+POW"));
        assert!(err.to_string().contains("POW"));
    }
}
