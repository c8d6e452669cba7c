//! # Readers — YAML and JSON Document Sources
//!
//! Turns source text or files into sequences of [`Value`] documents. YAML
//! sources may contain multiple documents separated by `---`; the first
//! document of a schema source is the root schema and the rest define named
//! includes. JSON sources hold a single document.
//!
//! The schema and engine layers never parse text themselves; everything
//! flows through these readers.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::value::Value;

/// Error while reading or decoding a document source.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The source file could not be read.
    #[error("cannot read '{path}': {reason}")]
    Io {
        /// Path to the unreadable source.
        path: String,
        /// Underlying I/O failure.
        reason: String,
    },

    /// The source text is not valid YAML or JSON.
    #[error("cannot parse '{source_name}': {reason}")]
    Parse {
        /// Human-readable source identifier.
        source_name: String,
        /// Underlying decode failure.
        reason: String,
    },
}

/// Parse a (possibly multi-document) YAML string into a list of values.
///
/// `source_name` identifies the source in parse errors; it is usually a
/// file path but may be any label for in-memory sources.
pub fn read_str(source: &str, source_name: &str) -> Result<Vec<Value>, ReaderError> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(source) {
        let yaml = serde_yaml::Value::deserialize(document).map_err(|e| ReaderError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
        documents.push(Value::from(&yaml));
    }
    Ok(documents)
}

/// Parse a JSON string into a single-document list.
pub fn read_json_str(source: &str, source_name: &str) -> Result<Vec<Value>, ReaderError> {
    let json: serde_json::Value =
        serde_json::from_str(source).map_err(|e| ReaderError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(vec![Value::from(&json)])
}

/// Read a document file, dispatching on extension: `.json` parses as JSON,
/// anything else as YAML.
pub fn read_file(path: &Path) -> Result<Vec<Value>, ReaderError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReaderError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let name = path.display().to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => read_json_str(&content, &name),
        _ => read_str(&content, &name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_single_document() {
        let docs = read_str("a: 1\nb: two", "<test>").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("a"), Some(&Value::Int(1)));
        assert_eq!(docs[0].get("b"), Some(&Value::Str("two".into())));
    }

    #[test]
    fn test_read_multi_document() {
        let docs = read_str("a: str()\n---\nb: int()\n---\nc: bool()", "<test>").unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs[2].get("c").is_some());
    }

    #[test]
    fn test_read_invalid_yaml_is_parse_error() {
        let err = read_str("a: [unclosed", "<test>").unwrap_err();
        assert!(matches!(err, ReaderError::Parse { .. }));
    }

    #[test]
    fn test_read_json() {
        let docs = read_json_str(r#"{"a": [1, 2]}"#, "<test>").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("a").unwrap().len(), Some(2));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_file(Path::new("/nonexistent/x.yaml")).unwrap_err();
        assert!(matches!(err, ReaderError::Io { .. }));
    }
}
