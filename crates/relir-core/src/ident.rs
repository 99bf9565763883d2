//! Validation for operator-supplied table identifiers.
//!
//! Table names are the only values interpolated into SQL text. Everything
//! caller-influenced (query text, vectors, limits, weights) is bound as a
//! parameter. A name is accepted only if it matches
//! `^[A-Za-z_][A-Za-z0-9_]{0,62}$`, and it is double-quoted on use.

use crate::error::{Result, RetrievalError};
use regex::Regex;
use std::sync::OnceLock;

/// Longest identifier accepted (matches the Postgres `NAMEDATALEN - 1` limit).
pub const MAX_IDENTIFIER_LEN: usize = 63;

#[allow(clippy::expect_used)]
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern compiles")
    })
}

/// Validate a table identifier and return it unchanged.
///
/// # Errors
///
/// Returns [`RetrievalError::InvalidIdentifier`] when `name` does not match
/// the safe identifier pattern.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if identifier_pattern().is_match(name) {
        Ok(name)
    } else {
        Err(RetrievalError::InvalidIdentifier(name.to_string()))
    }
}

/// Validate `name` and render it as a double-quoted SQL identifier.
///
/// # Errors
///
/// Same as [`validate_identifier`].
pub fn quoted(name: &str) -> Result<String> {
    validate_identifier(name).map(|valid| format!("\"{valid}\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["corpus", "_tmp", "msmarco_v1_dense", "T1"] {
            assert_eq!(validate_identifier(name).expect("valid"), name);
        }
    }

    #[test]
    fn rejects_injection_attempts() {
        for name in [
            "",
            "1corpus",
            "corpus; DROP TABLE x",
            "corpus\"",
            "my-table",
            "corpus name",
            "na\u{ef}ve",
        ] {
            let err = validate_identifier(name).expect_err("should reject");
            assert!(matches!(err, RetrievalError::InvalidIdentifier(_)));
        }
    }

    #[test]
    fn enforces_length_limit() {
        let longest = "a".repeat(MAX_IDENTIFIER_LEN);
        assert!(validate_identifier(&longest).is_ok());
        let too_long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(validate_identifier(&too_long).is_err());
    }

    #[test]
    fn quoted_wraps_in_double_quotes() {
        assert_eq!(quoted("corpus").expect("valid"), "\"corpus\"");
    }

    proptest! {
        #[test]
        fn accepted_names_never_contain_sql_metacharacters(name in "\\PC{0,80}") {
            if validate_identifier(&name).is_ok() {
                prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
                prop_assert!(!name.is_empty() && name.len() <= MAX_IDENTIFIER_LEN);
            }
        }
    }
}
