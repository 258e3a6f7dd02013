//! Identifier validation and quoting.
//!
//! Table and column names come from file names and header lines, so they are
//! untrusted. They cannot be bound as statement parameters, so every
//! identifier is checked against an allow-list before it is quoted and
//! interpolated into DDL or DML.
//!
//! # Rules
//!
//! - Must not be empty
//! - Must not exceed [`MAX_IDENTIFIER_LENGTH`] characters
//! - May contain letters, digits, spaces and `_ - . ( ) $ # @ & +`

use thiserror::Error;

pub use crate::naming::MAX_IDENTIFIER_LENGTH;

/// Punctuation accepted inside identifiers, besides letters and digits
const ALLOWED_PUNCTUATION: &[char] = &['_', ' ', '-', '.', '(', ')', '$', '#', '@', '&', '+'];

/// Errors that can occur during identifier validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} '{name}' contains invalid character: {invalid:?}")]
    InvalidCharacter {
        field: &'static str,
        name: String,
        invalid: char,
    },
}

/// Validate a table or column name against the allow-list.
///
/// ```
/// use csv_table_importer::validation::validate_identifier;
///
/// assert!(validate_identifier("table name", "sales_2024").is_ok());
/// assert!(validate_identifier("column name", "unit price").is_ok());
/// assert!(validate_identifier("column name", "").is_err());
/// assert!(validate_identifier("table name", "x\"; DROP TABLE y; --").is_err());
/// ```
pub fn validate_identifier(field: &'static str, name: &str) -> Result<(), IdentifierError> {
    if name.is_empty() {
        return Err(IdentifierError::Empty(field));
    }

    let length = name.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong {
            field,
            max: MAX_IDENTIFIER_LENGTH,
            actual: length,
        });
    }

    if let Some(invalid) = name
        .chars()
        .find(|c| !c.is_alphanumeric() && !ALLOWED_PUNCTUATION.contains(c))
    {
        return Err(IdentifierError::InvalidCharacter {
            field,
            name: name.to_string(),
            invalid,
        });
    }

    Ok(())
}

/// Quote an identifier with double quotes, doubling any internal quote
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Render a string as a SQL literal, doubling single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_names() {
        for name in ["id", "amount", "Unit Price", "q1-2024", "data_(1)", "naïve"] {
            assert!(
                validate_identifier("column name", name).is_ok(),
                "{name} should be accepted"
            );
        }
        assert!(validate_identifier("column name", "tax%").is_err());
    }

    #[test]
    fn test_reserved_words_are_allowed() {
        // Quoting makes these safe.
        assert!(validate_identifier("column name", "select").is_ok());
        assert!(validate_identifier("column name", "order").is_ok());
    }

    #[test]
    fn test_rejects_injection_characters() {
        for name in ["a\"b", "a;b", "a'b", "a\\b", "a\nb", "a\rb", "a/b", "a*b"] {
            assert!(
                matches!(
                    validate_identifier("table name", name),
                    Err(IdentifierError::InvalidCharacter { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_empty_and_long() {
        assert_eq!(
            validate_identifier("column name", ""),
            Err(IdentifierError::Empty("column name"))
        );

        let long = "c".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(matches!(
            validate_identifier("column name", &long),
            Err(IdentifierError::TooLong { actual, .. }) if actual == MAX_IDENTIFIER_LENGTH + 1
        ));
        assert!(validate_identifier("column name", &long[1..]).is_ok());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("sales"), "\"sales\"");
        assert_eq!(quote_identifier("unit price"), "\"unit price\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_literal(""), "''");
        assert_eq!(quote_literal("''"), "''''''");
    }
}
