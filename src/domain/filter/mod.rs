//! Filter-query grammar and evaluation
//!
//! An optional boolean expression evaluated against an entity's attributes
//! and custom properties, e.g.
//! `"project = 'nlp' AND budget.double_value > 12000"`. Supported are the
//! six comparison operators, `LIKE`/`ILIKE` with `%`/`_` wildcards,
//! `AND`/`OR` with parentheses, and property references with an optional
//! type suffix. The grammar is identical regardless of the storage engine
//! backing the repository.

mod eval;
mod lexer;
mod parser;

pub use eval::matches;
pub use parser::{CompareOp, Expr, Literal, PropertyRef, TypeSuffix};

use crate::domain::error::RegistryError;

/// Internal parse failure, carrying the offending detail
#[derive(Debug)]
pub struct FilterParseError {
    detail: String,
}

impl FilterParseError {
    pub(crate) fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for FilterParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail)
    }
}

impl std::error::Error for FilterParseError {}

/// Parse a filter query, surfacing failures as `BadRequest`.
pub fn parse_filter_query(query: &str) -> Result<Expr, RegistryError> {
    parser::parse(query)
        .map_err(|err| RegistryError::bad_request(format!("invalid filter query: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_query_is_bad_request() {
        let err = parse_filter_query("name >").unwrap_err();
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("invalid filter query"));
    }

    #[test]
    fn test_valid_query_parses() {
        assert!(parse_filter_query("name ILIKE '%model%' OR id = 3").is_ok());
    }
}
