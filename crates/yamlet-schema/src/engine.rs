//! # Validation Engine
//!
//! Walks one data document against a compiled [`Schema`], collecting every
//! error as a path-tagged string. No short-circuiting across fields; a
//! document with five problems reports five errors.
//!
//! ## Union semantics
//!
//! `map`/`list` sub-validators and `any` branches are alternatives: an
//! element is valid when ANY of them accepts it, and fails with the
//! concatenated errors of every branch otherwise.
//!
//! ## Includes
//!
//! `include('<name>')` is resolved against the root schema's include
//! registry at validation time, so includes can reference each other in
//! cycles; recursion terminates because data documents are finite. A
//! reference to an undefined include is a field-level error on the data,
//! not a schema-build failure.

use yamlet_core::{DataPath, Value};

use crate::schema::{IncludeDefinition, Schema, ShapeNode};
use crate::validator::{Validator, ValidatorKind};

/// One validation pass: a root schema plus the strictness flag.
pub(crate) struct Engine<'a> {
    root: &'a Schema,
    strict: bool,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(root: &'a Schema, strict: bool) -> Self {
        Self { root, strict }
    }

    pub(crate) fn validate_document(&self, data: &Value) -> Vec<String> {
        self.validate_fragment(self.root, data, &DataPath::root())
    }

    /// Validate `data` against a schema fragment rooted at `base`.
    /// Strict-mode shape errors come first, then field errors in schema
    /// order.
    fn validate_fragment(&self, schema: &Schema, data: &Value, base: &DataPath) -> Vec<String> {
        let mut errors = Vec::new();
        if self.strict {
            self.unexpected_elements(schema.shape(), data, base, &mut errors);
        }
        for (rel_path, validator) in schema.fields() {
            let full = base.concat(rel_path);
            match rel_path.resolve(data) {
                None => {
                    if validator.is_required() {
                        errors.push(full.tag("Required field missing"));
                    }
                }
                Some(Value::Null) if validator.is_optional() && validator.can_be_none() => {}
                Some(value) => errors.extend(self.validate_value(validator, value, &full)),
            }
        }
        errors
    }

    /// Validate one value against one validator, recursing into structure.
    /// A failure at this node stops the descent: there is no point walking
    /// the children of a value that is the wrong shape.
    fn validate_value(&self, validator: &Validator, value: &Value, path: &DataPath) -> Vec<String> {
        let own = validator.validate(value);
        if !own.is_empty() {
            return own.iter().map(|e| path.tag(e)).collect();
        }

        match validator.kind() {
            ValidatorKind::Include { name } => match self.root.include(name) {
                None => vec![path.tag(&format!("Include '{name}' has not been defined."))],
                Some(IncludeDefinition::Schema(child)) => {
                    self.validate_fragment(child, value, path)
                }
                Some(IncludeDefinition::Validator(custom)) => {
                    self.validate_value(custom, value, path)
                }
            },
            ValidatorKind::Map { validators } if !validators.is_empty() => {
                let Value::Map(entries) = value else { return vec![] };
                let mut errors = Vec::new();
                for (key, item) in entries {
                    errors.extend(self.validate_union(
                        validators,
                        item,
                        &path.join_key(key.clone()),
                    ));
                }
                errors
            }
            ValidatorKind::List { validators } if !validators.is_empty() => {
                let Value::List(items) = value else { return vec![] };
                let mut errors = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    errors.extend(self.validate_union(validators, item, &path.join_index(i)));
                }
                errors
            }
            ValidatorKind::Any { validators } if !validators.is_empty() => {
                self.validate_union(validators, value, path)
            }
            _ => vec![],
        }
    }

    /// OR semantics: valid when any branch accepts; otherwise every
    /// branch's errors, in branch order.
    fn validate_union(
        &self,
        validators: &[Validator],
        value: &Value,
        path: &DataPath,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        for validator in validators {
            let branch = self.validate_value(validator, value, path);
            if branch.is_empty() {
                return vec![];
            }
            errors.extend(branch);
        }
        errors
    }

    /// Flag data elements with no declared schema counterpart. Terminal
    /// shape nodes hand control to their validator (an include's own field
    /// set governs what lives below it).
    fn unexpected_elements(
        &self,
        node: &ShapeNode,
        data: &Value,
        base: &DataPath,
        errors: &mut Vec<String>,
    ) {
        match data {
            Value::Map(entries) => {
                for (key, item) in entries {
                    let child_path = base.join_key(key.clone());
                    match node.child(key) {
                        None => errors.push(child_path.tag("Unexpected element")),
                        Some(child) if child.is_terminal() => {}
                        Some(child) => {
                            self.unexpected_elements(child, item, &child_path, errors)
                        }
                    }
                }
            }
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    let child_path = base.join_index(i);
                    match node.child(&i.to_string()) {
                        None => errors.push(child_path.tag("Unexpected element")),
                        Some(child) if child.is_terminal() => {}
                        Some(child) => {
                            self.unexpected_elements(child, item, &child_path, errors)
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidatorRegistry;

    fn val(source: &str) -> Value {
        let de: serde_yaml::Value = serde_yaml::from_str(source).unwrap();
        Value::from(&de)
    }

    fn schema(source: &str) -> Schema {
        Schema::build(&val(source), "schema.yaml", ValidatorRegistry::default()).unwrap()
    }

    fn schema_with_includes(source: &str, includes: &str) -> Schema {
        let mut s = schema(source);
        s.add_include(&val(includes)).unwrap();
        s
    }

    fn errors(schema: &Schema, data: &str, strict: bool) -> Vec<String> {
        schema.validate(&val(data), "data.yaml", strict).errors
    }

    #[test]
    fn test_valid_document_has_no_errors() {
        let s = schema("name: str()\nage: int(min=0)\n");
        assert!(errors(&s, "name: Bill\nage: 26\n", false).is_empty());
    }

    #[test]
    fn test_required_field_missing() {
        let s = schema("name: str()\nage: int()\n");
        assert_eq!(
            errors(&s, "name: Bill\n", false),
            vec!["age: Required field missing"]
        );
    }

    #[test]
    fn test_optional_field_may_be_absent_or_null() {
        let s = schema("nick: str(required=False)\n");
        assert!(errors(&s, "{}", false).is_empty());
        assert!(errors(&s, "nick: null\n", false).is_empty());
        assert_eq!(
            errors(&s, "nick: 7\n", false),
            vec!["nick: '7' is not a str."]
        );
    }

    #[test]
    fn test_optional_none_false_rejects_null() {
        let s = schema("nick: str(required=False, none=False)\n");
        assert_eq!(
            errors(&s, "nick: null\n", false),
            vec!["nick: 'None' is not a str."]
        );
    }

    #[test]
    fn test_required_null_is_a_type_error() {
        let s = schema("name: str()\n");
        assert_eq!(
            errors(&s, "name: null\n", false),
            vec!["name: 'None' is not a str."]
        );
    }

    #[test]
    fn test_list_union_accepts_any_branch() {
        let s = schema("mixed: list(str(), int())\n");
        assert!(errors(&s, "mixed:\n- a\n- 1\n- b\n", false).is_empty());
        let errs = errors(&s, "mixed:\n- a\n- 1.5\n", false);
        assert_eq!(
            errs,
            vec![
                "mixed.1: '1.5' is not a str.",
                "mixed.1: '1.5' is not a int."
            ]
        );
    }

    #[test]
    fn test_map_sub_validators_apply_to_values() {
        let s = schema("scores: map(int(min=0))\n");
        assert!(errors(&s, "scores:\n  math: 90\n  art: 75\n", false).is_empty());
        assert_eq!(
            errors(&s, "scores:\n  math: bad\n", false),
            vec!["scores.math: 'bad' is not a int."]
        );
    }

    #[test]
    fn test_map_key_constraint() {
        let s = schema("scores: map(int(), key=regex('^[a-z]+$'))\n");
        let errs = errors(&s, "scores:\n  math: 1\n  BAD: 2\n", false);
        assert_eq!(errs, vec!["scores: Key error - 'BAD' is not a regex match."]);
    }

    #[test]
    fn test_untyped_containers_accept_anything() {
        let s = schema("blob: map()\nitems: list()\n");
        assert!(errors(&s, "blob:\n  x: 1\n  y: [a]\nitems:\n- 1\n- z\n", false).is_empty());
    }

    #[test]
    fn test_constraint_failure_stops_descent() {
        let s = schema("items: list(int(), min=3)\n");
        // Length failure reported; elements are not individually checked.
        assert_eq!(
            errors(&s, "items:\n- a\n- b\n", false),
            vec!["items: Length of ['a', 'b'] is less than 3"]
        );
    }

    #[test]
    fn test_include_delegates_to_fragment() {
        let s = schema_with_includes(
            "home: include('address')\n",
            "address:\n  street: str()\n  city: str()\n",
        );
        assert!(errors(&s, "home:\n  street: Main\n  city: Springfield\n", false).is_empty());
        assert_eq!(
            errors(&s, "home:\n  street: 5\n", false),
            vec![
                "home.street: '5' is not a str.",
                "home.city: Required field missing"
            ]
        );
    }

    #[test]
    fn test_missing_include_is_a_field_error() {
        let s = schema("thing: include('missing')\n");
        assert_eq!(
            errors(&s, "thing:\n  a: 1\n", false),
            vec!["thing: Include 'missing' has not been defined."]
        );
    }

    #[test]
    fn test_include_custom_validator_leaf() {
        let s = schema_with_includes("code: include('ident')\n", "ident: int(min=10)\n");
        assert!(errors(&s, "code: 11\n", false).is_empty());
        assert_eq!(errors(&s, "code: 3\n", false), vec!["code: 3 is less than 10"]);
    }

    #[test]
    fn test_recursive_include_terminates() {
        let s = schema_with_includes(
            "root: include('node')\n",
            "node:\n  value: int()\n  next: include('node', required=False)\n",
        );
        let data = "root:\n  value: 1\n  next:\n    value: 2\n    next:\n      value: 3\n";
        assert!(errors(&s, data, false).is_empty());
        assert_eq!(
            errors(&s, "root:\n  value: 1\n  next:\n    value: x\n", false),
            vec!["root.next.value: 'x' is not a int."]
        );
    }

    #[test]
    fn test_any_accepts_first_matching_branch() {
        let s = schema("v: any(int(), str(equals='auto'))\n");
        assert!(errors(&s, "v: 5\n", false).is_empty());
        assert!(errors(&s, "v: auto\n", false).is_empty());
        let errs = errors(&s, "v: manual\n", false);
        assert_eq!(
            errs,
            vec![
                "v: 'manual' is not a int.",
                "v: 'manual' does not equal 'auto'"
            ]
        );
    }

    #[test]
    fn test_strict_flags_unexpected_elements_first() {
        let s = schema("a: int()\nb: str()\n");
        let errs = errors(&s, "a: x\nb: y\nextra: 1\n", true);
        assert_eq!(
            errs,
            vec!["extra: Unexpected element", "a: 'x' is not a int."]
        );
    }

    #[test]
    fn test_strict_recurses_into_nested_maps() {
        let s = schema("outer:\n  inner: int()\n");
        assert_eq!(
            errors(&s, "outer:\n  inner: 1\n  stray: 2\n", true),
            vec!["outer.stray: Unexpected element"]
        );
    }

    #[test]
    fn test_strict_include_governed_by_fragment() {
        let s = schema_with_includes(
            "home: include('address')\n",
            "address:\n  street: str()\n",
        );
        assert_eq!(
            errors(&s, "home:\n  street: Main\n  zip: 12345\n", true),
            vec!["home.zip: Unexpected element"]
        );
        assert!(errors(&s, "home:\n  street: Main\n  zip: 12345\n", false).is_empty());
    }

    #[test]
    fn test_strict_allows_untyped_map_contents() {
        let s = schema("blob: map()\n");
        assert!(errors(&s, "blob:\n  anything: goes\n", true).is_empty());
    }

    #[test]
    fn test_strict_flags_excess_list_positions() {
        let s = schema("pair:\n- str()\n- int()\n");
        assert_eq!(
            errors(&s, "pair:\n- a\n- 1\n- extra\n", true),
            vec!["pair.2: Unexpected element"]
        );
    }

    #[test]
    fn test_errors_accumulate_across_fields() {
        let s = schema("a: int()\nb: str()\nc: bool()\n");
        let errs = errors(&s, "a: x\nb: 1\nc: maybe\n", false);
        assert_eq!(errs.len(), 3);
    }
}
