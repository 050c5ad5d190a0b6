//! Record validation
//!
//! Checks applied to incoming payloads and to rows read back from the store.

use chrono::NaiveDate;
use rusqlite::types::Type;
use thiserror::Error;

/// A payload or stored row that does not satisfy its schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be greater than 0 (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown meal type '{0}': expected breakfast, lunch, dinner or snack")]
    UnknownMealType(String),

    #[error("Unknown role '{0}': expected athlete or coach")]
    UnknownRole(String),
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO calendar date
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// Trimmed value, or `Empty` if nothing is left
pub fn require_non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed)
}

pub fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value < 0.0 || value.is_nan() {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

pub fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}

/// Wrap a validation failure on column `idx` as a row conversion error
pub(crate) fn invalid_column(idx: usize, err: ValidationError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-01-09"), Ok(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()));
        assert_eq!(parse_date(" 2025-01-09 "), Ok(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()));
        assert!(parse_date("2025-13-01").is_err());
        assert!(parse_date("09/01/2025").is_err());
    }

    #[test]
    fn test_require_non_empty() {
        assert_eq!(require_non_empty("name", "  Oats "), Ok("Oats"));
        assert_eq!(require_non_empty("name", "   "), Err(ValidationError::Empty { field: "name" }));
    }

    #[test]
    fn test_numeric_checks() {
        assert!(require_non_negative("fat", 0.0).is_ok());
        assert!(require_non_negative("fat", -0.1).is_err());
        assert!(require_non_negative("fat", f64::NAN).is_err());
        assert!(require_positive("amount", 0.0).is_err());
        assert!(require_positive("amount", 0.5).is_ok());
    }
}
