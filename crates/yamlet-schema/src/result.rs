//! # Validation Results
//!
//! A [`ValidationResult`] ties the ordered error list produced by the
//! engine to the data source and schema it was produced from. The `Display`
//! form is part of the compatibility surface: tools diff this output.

use std::fmt;

/// Outcome of validating one data document against one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Human-readable identifier of the data source (usually a file path).
    pub data_name: String,
    /// Human-readable identifier of the schema.
    pub schema_name: String,
    /// Ordered, path-tagged error messages. Empty means valid.
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Build a result from its parts.
    pub fn new(
        data_name: impl Into<String>,
        schema_name: impl Into<String>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            data_name: data_name.into(),
            schema_name: schema_name.into(),
            errors,
        }
    }

    /// True when no errors were collected.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "'{}' is Valid", self.data_name)
        } else {
            write!(
                f,
                "Error validating data '{}' with schema '{}'\n\t{}",
                self.data_name,
                self.schema_name,
                self.errors.join("\n\t")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_display() {
        let result = ValidationResult::new("data.yaml", "schema.yaml", vec![]);
        assert!(result.is_valid());
        assert_eq!(result.to_string(), "'data.yaml' is Valid");
    }

    #[test]
    fn test_invalid_display_header_and_tabs() {
        let result = ValidationResult::new(
            "data.yaml",
            "schema.yaml",
            vec![
                "a: Required field missing".to_string(),
                "b: '5' is not a str.".to_string(),
            ],
        );
        assert_eq!(
            result.to_string(),
            "Error validating data 'data.yaml' with schema 'schema.yaml'\n\
             \ta: Required field missing\n\
             \tb: '5' is not a str."
        );
    }
}
