//! # Error Types — Schema Errors vs. Validation Errors
//!
//! Two very different failure families live in this system:
//!
//! - **Schema-authoring errors** ([`SyntaxError`]): a malformed validator
//!   expression, an unregistered tag, a keyword whose value cannot be
//!   converted to its declared type. Detected eagerly while the schema is
//!   built, and fatal for that schema.
//! - **Data errors**: produced per failing field during traversal and
//!   always collected into a [`ValidationResult`] — never fatal
//!   individually. A batch of invalid results surfaces as
//!   [`YamletError::Validating`].
//!
//! A referenced-but-undefined include is deliberately a field-level data
//! error, not a schema error: the include registry may be assembled from
//! several documents and the reference is only wrong for the data that
//! exercises it.

use thiserror::Error;
use yamlet_core::reader::ReaderError;

use crate::result::ValidationResult;

/// A schema-authoring error: the schema text itself is wrong.
///
/// Carries the offending expression and, once known, the schema node the
/// expression was found at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxError {
    /// Human-readable description, including the offending expression.
    pub message: String,
}

impl SyntaxError {
    /// Build a syntax error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// A keyword whose value could not be converted to its declared type.
    pub fn keyword(keyword: &str, expected: &str) -> Self {
        Self::new(format!("'{keyword}' is not a {expected}"))
    }

    /// Wrap a parser failure with the expression it occurred in.
    pub fn in_expression(expression: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "Invalid validation syntax in '{expression}': {detail}"
        ))
    }

    /// Append the schema node the failing expression was found at.
    pub fn at_node(self, path: impl std::fmt::Display) -> Self {
        Self::new(format!("{} at node '{path}'", self.message))
    }
}

/// Top-level error type for the yamlet workspace.
#[derive(Error, Debug)]
pub enum YamletError {
    /// The schema could not be built.
    #[error("schema syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// A schema or data source could not be read or decoded.
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// One or more data documents failed validation. Wraps every result in
    /// the batch, valid and invalid alike.
    #[error("{}", format_results(.0))]
    Validating(Vec<ValidationResult>),
}

impl YamletError {
    /// The per-document results of a failed batch, when present.
    pub fn results(&self) -> Option<&[ValidationResult]> {
        match self {
            YamletError::Validating(results) => Some(results),
            _ => None,
        }
    }
}

fn format_results(results: &[ValidationResult]) -> String {
    results
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
