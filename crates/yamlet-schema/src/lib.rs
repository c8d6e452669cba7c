//! # yamlet-schema — Schema Validation for YAML/JSON Documents
//!
//! Validates structured data against declarative schemas written as small
//! validator expressions:
//!
//! ```yaml
//! name: str(min=2)
//! age: int(min=0, max=150)
//! addresses: list(include('address'))
//! ---
//! address:
//!   street: str()
//!   city: str()
//! ```
//!
//! The first document of a schema source is the root schema; documents
//! after it define named includes. Validation collects every error as a
//! path-tagged message (`addresses.0.city: Required field missing`) rather
//! than stopping at the first.
//!
//! ## Entry points
//!
//! [`make_schema`] / [`make_schema_from_str`] build a [`Schema`];
//! [`make_data`] / [`make_data_from_str`] load data documents; [`validate`]
//! runs a batch and returns per-document [`ValidationResult`]s;
//! [`validate_or_error`] additionally fails with
//! [`YamletError::Validating`] when any document is invalid.

pub mod constraint;
mod engine;
pub mod error;
pub mod parser;
pub mod result;
pub mod schema;
pub mod validator;

use std::path::Path;

use yamlet_core::{read_file, read_str, Value};

pub use crate::error::{SyntaxError, YamletError};
pub use crate::result::ValidationResult;
pub use crate::schema::{IncludeDefinition, Schema};
pub use crate::validator::{Validator, ValidatorRegistry};

/// Build a schema from source text. The first document is the root schema;
/// any following documents define includes.
pub fn make_schema_from_str(
    source: &str,
    name: &str,
    registry: ValidatorRegistry,
) -> Result<Schema, YamletError> {
    let documents = read_str(source, name)?;
    schema_from_documents(&documents, name, registry)
}

/// Build a schema from a file, dispatching YAML/JSON on extension.
pub fn make_schema(path: &Path, registry: ValidatorRegistry) -> Result<Schema, YamletError> {
    let documents = read_file(path)?;
    schema_from_documents(&documents, &path.display().to_string(), registry)
}

fn schema_from_documents(
    documents: &[Value],
    name: &str,
    registry: ValidatorRegistry,
) -> Result<Schema, YamletError> {
    let (root, includes) = documents
        .split_first()
        .ok_or_else(|| SyntaxError::new(format!("schema '{name}' contains no documents")))?;

    let mut schema = Schema::build(root, name, registry)?;
    for include in includes {
        schema.add_include(include)?;
    }
    Ok(schema)
}

/// Load data documents from a file. Each document pairs with a display
/// name; multi-document files get a positional suffix.
pub fn make_data(path: &Path) -> Result<Vec<(Value, String)>, YamletError> {
    let documents = read_file(path)?;
    Ok(name_documents(documents, &path.display().to_string()))
}

/// Load data documents from source text.
pub fn make_data_from_str(source: &str, name: &str) -> Result<Vec<(Value, String)>, YamletError> {
    let documents = read_str(source, name)?;
    Ok(name_documents(documents, name))
}

fn name_documents(documents: Vec<Value>, name: &str) -> Vec<(Value, String)> {
    if documents.len() <= 1 {
        documents
            .into_iter()
            .map(|doc| (doc, name.to_string()))
            .collect()
    } else {
        documents
            .into_iter()
            .enumerate()
            .map(|(i, doc)| (doc, format!("{name}#{i}")))
            .collect()
    }
}

/// Validate every data document against `schema`, never failing fast: the
/// result list always covers the whole batch.
pub fn validate(
    schema: &Schema,
    data: &[(Value, String)],
    strict: bool,
) -> Vec<ValidationResult> {
    data.iter()
        .map(|(doc, name)| schema.validate(doc, name, strict))
        .collect()
}

/// Like [`validate`], but returns [`YamletError::Validating`] carrying the
/// full batch when any document is invalid.
pub fn validate_or_error(
    schema: &Schema,
    data: &[(Value, String)],
    strict: bool,
) -> Result<Vec<ValidationResult>, YamletError> {
    let results = validate(schema, data, strict);
    if results.iter().all(ValidationResult::is_valid) {
        Ok(results)
    } else {
        Err(YamletError::Validating(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_schema_with_includes() {
        let schema = make_schema_from_str(
            "home: include('address')\n---\naddress:\n  street: str()\n",
            "schema.yaml",
            ValidatorRegistry::default(),
        )
        .unwrap();
        assert!(schema.include("address").is_some());
    }

    #[test]
    fn test_empty_schema_source_is_rejected() {
        let err =
            make_schema_from_str("", "empty.yaml", ValidatorRegistry::default()).unwrap_err();
        assert!(err.to_string().contains("contains no documents"));
    }

    #[test]
    fn test_multi_document_data_gets_positional_names() {
        let data = make_data_from_str("a: 1\n---\na: 2\n", "data.yaml").unwrap();
        assert_eq!(data[0].1, "data.yaml#0");
        assert_eq!(data[1].1, "data.yaml#1");

        let single = make_data_from_str("a: 1\n", "data.yaml").unwrap();
        assert_eq!(single[0].1, "data.yaml");
    }

    #[test]
    fn test_validate_or_error_aggregates() {
        let schema = make_schema_from_str(
            "age: int()\n",
            "schema.yaml",
            ValidatorRegistry::default(),
        )
        .unwrap();
        let data = make_data_from_str("age: 1\n---\nage: x\n", "data.yaml").unwrap();

        let err = validate_or_error(&schema, &data, false).unwrap_err();
        let results = err.results().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_valid());
        assert!(!results[1].is_valid());
    }
}
