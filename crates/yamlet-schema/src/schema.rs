//! # Schema — Flattened Validator Fields Plus Includes
//!
//! A schema document is a nested map whose leaves are validator
//! expressions. [`Schema::build`] flattens it into ordered
//! `(DataPath, Validator)` pairs — list positions become numeric
//! segments — and records the declared shape for strict-mode checks.
//!
//! Documents after the first in a schema file define **includes**: named
//! schema fragments referenced by `include('<name>')`. An include body is
//! either a nested document (a child [`Schema`]) or a bare expression leaf
//! (a reusable custom validator). All includes live in one registry on the
//! root schema; includes may reference each other, cycles included —
//! recursion terminates because data documents are finite.

use std::collections::HashMap;

use yamlet_core::{DataPath, PathSegment, Value};

use crate::engine::Engine;
use crate::error::SyntaxError;
use crate::parser;
use crate::result::ValidationResult;
use crate::validator::{Validator, ValidatorRegistry};

/// A named schema fragment referenced via `include('<name>')`.
#[derive(Debug, Clone)]
pub enum IncludeDefinition {
    /// A nested document: validated field-by-field like a root schema.
    Schema(Schema),
    /// A bare expression leaf: a reusable custom validator.
    Validator(Validator),
}

/// Declared shape of a schema document, used by strict mode to flag data
/// elements with no declared counterpart.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShapeNode {
    children: Vec<(String, ShapeNode)>,
    /// True when a validator is declared exactly at this node.
    terminal: bool,
}

impl ShapeNode {
    fn insert(&mut self, segments: &[PathSegment]) {
        match segments.split_first() {
            None => self.terminal = true,
            Some((first, rest)) => {
                let name = first.as_str();
                let idx = match self.children.iter().position(|(n, _)| *n == name) {
                    Some(idx) => idx,
                    None => {
                        self.children.push((name, ShapeNode::default()));
                        self.children.len() - 1
                    }
                };
                self.children[idx].1.insert(rest);
            }
        }
    }

    pub(crate) fn child(&self, name: &str) -> Option<&ShapeNode> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal
    }
}

/// A compiled schema: ordered validator fields, declared shape, and the
/// include registry. Immutable once built (includes added), safely shared
/// across threads.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<(DataPath, Validator)>,
    shape: ShapeNode,
    includes: HashMap<String, IncludeDefinition>,
    registry: ValidatorRegistry,
}

impl Schema {
    /// Flatten `raw` and parse every leaf into a validator.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] when the root is not a mapping or any leaf
    /// expression fails to parse; the error names the offending node.
    pub fn build(
        raw: &Value,
        name: impl Into<String>,
        registry: ValidatorRegistry,
    ) -> Result<Self, SyntaxError> {
        if !raw.is_map() {
            return Err(SyntaxError::new("schema root must be a map"));
        }
        Self::build_fragment(raw, name, registry)
    }

    /// Like [`build`](Self::build) but without the map-root restriction;
    /// include bodies may be lists.
    fn build_fragment(
        raw: &Value,
        name: impl Into<String>,
        registry: ValidatorRegistry,
    ) -> Result<Self, SyntaxError> {
        let mut leaves = Vec::new();
        flatten(raw, &DataPath::root(), &mut leaves);

        let mut fields = Vec::with_capacity(leaves.len());
        let mut shape = ShapeNode::default();
        for (path, expression) in leaves {
            let validator = parser::parse(&expression, &registry)
                .map_err(|e| e.at_node(&path))?;
            shape.insert(path.segments());
            fields.push((path, validator));
        }

        Ok(Self {
            name: name.into(),
            fields,
            shape,
            includes: HashMap::new(),
            registry,
        })
    }

    /// Register the includes defined by one document: every top-level key
    /// names a fragment.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] when the document is not a mapping or a
    /// fragment body fails to build.
    pub fn add_include(&mut self, raw: &Value) -> Result<(), SyntaxError> {
        let Value::Map(entries) = raw else {
            return Err(SyntaxError::new("include document must be a map"));
        };

        for (name, body) in entries {
            let definition = if body.is_map() || body.is_list() {
                let child =
                    Schema::build_fragment(body, name.clone(), self.registry.clone())?;
                IncludeDefinition::Schema(child)
            } else {
                let expression = canonicalize(body);
                let validator = parser::parse(&expression, &self.registry)
                    .map_err(|e| e.at_node(name))?;
                IncludeDefinition::Validator(validator)
            };
            self.includes.insert(name.clone(), definition);
        }
        Ok(())
    }

    /// The schema's display name (usually its file path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered flattened fields.
    pub fn fields(&self) -> &[(DataPath, Validator)] {
        &self.fields
    }

    /// Look up an include fragment by name.
    pub fn include(&self, name: &str) -> Option<&IncludeDefinition> {
        self.includes.get(name)
    }

    pub(crate) fn shape(&self) -> &ShapeNode {
        &self.shape
    }

    /// Validate one data document, collecting every error.
    pub fn validate(&self, data: &Value, data_name: &str, strict: bool) -> ValidationResult {
        let engine = Engine::new(self, strict);
        let errors = engine.validate_document(data);
        ValidationResult::new(data_name, self.name.clone(), errors)
    }
}

fn flatten(node: &Value, path: &DataPath, out: &mut Vec<(DataPath, String)>) {
    match node {
        Value::Map(entries) => {
            for (key, child) in entries {
                flatten(child, &path.join_key(key.clone()), out);
            }
        }
        // A list of expression strings or nested documents declares
        // positional validators; a list of plain literals is an enum
        // shorthand (literals can never be expressions).
        Value::List(items) => {
            let is_literal_list = !items.is_empty()
                && items
                    .iter()
                    .all(|item| !item.is_str() && !item.is_map() && !item.is_list());
            if is_literal_list {
                out.push((path.clone(), canonicalize(node)));
            } else {
                for (i, child) in items.iter().enumerate() {
                    flatten(child, &path.join_index(i), out);
                }
            }
        }
        leaf => out.push((path.clone(), canonicalize(leaf))),
    }
}

/// Render a non-string schema leaf as the equivalent validator expression.
/// A YAML author writing `answer: 42` means "this field must equal 42".
fn canonicalize(leaf: &Value) -> String {
    match leaf {
        Value::Str(s) => s.clone(),
        Value::Null => "null()".to_string(),
        Value::Date(d) => format!("day('{d}')"),
        Value::DateTime(dt) => format!("timestamp('{}')", dt.format("%Y-%m-%d %H:%M:%S")),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(literal_expr).collect();
            format!("enum({})", rendered.join(", "))
        }
        scalar => format!("enum({})", literal_expr(scalar)),
    }
}

fn literal_expr(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("'{}'", s.replace('\\', r"\\").replace('\'', r"\'")),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn val(source: &str) -> Value {
        let de: serde_yaml::Value = serde_yaml::from_str(source).unwrap();
        Value::from(&de)
    }

    fn schema(source: &str) -> Schema {
        Schema::build(&val(source), "schema.yaml", ValidatorRegistry::default()).unwrap()
    }

    #[test]
    fn test_flatten_preserves_document_order() {
        let s = schema(
            "name: str()\n\
             age: int()\n\
             address:\n  street: str()\n  city: str()\n",
        );
        let paths: Vec<String> = s.fields().iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["name", "age", "address.street", "address.city"]);
    }

    #[test]
    fn test_flatten_lists_use_numeric_segments() {
        let s = schema("pair:\n- str()\n- int()\n");
        let paths: Vec<String> = s.fields().iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["pair.0", "pair.1"]);
        assert_eq!(s.fields()[0].1.tag(), "str");
        assert_eq!(s.fields()[1].1.tag(), "int");
    }

    #[test]
    fn test_non_string_leaves_canonicalize() {
        let s = schema(
            "flag: true\n\
             answer: 42\n\
             ratio: 1.5\n\
             nothing: null\n\
             choice:\n- 1\n- 2\n",
        );
        let flag = &s.fields()[0].1;
        assert!(flag.is_valid(&Value::Bool(true)));
        assert!(!flag.is_valid(&Value::Bool(false)));

        let answer = &s.fields()[1].1;
        assert!(answer.is_valid(&Value::Int(42)));
        assert!(!answer.is_valid(&Value::Int(41)));

        let ratio = &s.fields()[2].1;
        assert!(ratio.is_valid(&Value::Float(1.5)));

        let nothing = &s.fields()[3].1;
        assert_eq!(nothing.tag(), "null");

        let choice = &s.fields()[4].1;
        assert!(choice.is_valid(&Value::Int(1)));
        assert!(choice.is_valid(&Value::Int(2)));
        assert!(!choice.is_valid(&Value::Int(3)));
    }

    #[test]
    fn test_parse_error_names_the_node() {
        let err = Schema::build(
            &val("outer:\n  inner: bogus()\n"),
            "schema.yaml",
            ValidatorRegistry::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("at node 'outer.inner'"), "{err}");
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_root_must_be_a_map() {
        let err = Schema::build(
            &val("- str()\n"),
            "schema.yaml",
            ValidatorRegistry::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "schema root must be a map");
    }

    #[test]
    fn test_add_include_nested_schema_and_leaf_validator() {
        let mut s = schema("thing: include('address')\nid: include('ident')\n");
        s.add_include(&val(
            "address:\n  street: str()\n\
             ident: str(min=2)\n",
        ))
        .unwrap();

        match s.include("address").unwrap() {
            IncludeDefinition::Schema(child) => {
                assert_eq!(child.fields().len(), 1);
                assert_eq!(child.fields()[0].0.to_string(), "street");
            }
            IncludeDefinition::Validator(_) => panic!("expected a child schema"),
        }
        match s.include("ident").unwrap() {
            IncludeDefinition::Validator(v) => assert_eq!(v.tag(), "str"),
            IncludeDefinition::Schema(_) => panic!("expected a bare validator"),
        }
        assert!(s.include("missing").is_none());
    }

    #[test]
    fn test_shape_records_declared_nodes() {
        let s = schema("a:\n  b: str()\nc: int()\n");
        let shape = s.shape();
        assert!(shape.child("a").is_some());
        assert!(shape.child("a").unwrap().child("b").unwrap().is_terminal());
        assert!(shape.child("c").unwrap().is_terminal());
        assert!(shape.child("z").is_none());
    }
}
