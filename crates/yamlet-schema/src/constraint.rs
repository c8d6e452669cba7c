//! # Constraints — Keyword-Driven Value Checks
//!
//! A constraint is a small, independent check a validator can carry on top
//! of its type predicate: `min=`/`max=` bounds, length bounds, character
//! exclusion, string predicates, IP version, map-key validation. Each
//! validator variant declares a fixed, ordered set of constraint tags; the
//! set is instantiated once at schema-build time from the expression's
//! keyword arguments.
//!
//! A constraint whose keyword was absent is **inactive** and always passes.
//! A keyword whose value cannot be converted to the constraint's declared
//! type is a [`SyntaxError`] — a schema-authoring mistake caught while the
//! schema is built, never a runtime validation error.

use std::net::IpAddr;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use yamlet_core::Value;

use crate::error::SyntaxError;
use crate::validator::{Kwargs, Validator};

/// The comparison type `min=`/`max=` bounds coerce to, declared by the
/// owning validator (`num` compares floats, `day` compares dates, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// `i64` comparisons (`int`).
    Int,
    /// `f64` comparisons (`num`).
    Float,
    /// Calendar-date comparisons (`day`).
    Date,
    /// Date-time comparisons (`timestamp`).
    DateTime,
}

/// Constraint tags a validator variant may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintTag {
    /// `min=` ordering bound.
    Min,
    /// `max=` ordering bound.
    Max,
    /// `min=` length bound.
    LengthMin,
    /// `max=` length bound.
    LengthMax,
    /// `exclude=` forbidden characters.
    CharacterExclude,
    /// `equals=` exact string match.
    StringEquals,
    /// `starts_with=` string prefix.
    StringStartsWith,
    /// `ends_with=` string suffix.
    StringEndsWith,
    /// `matches=` regex match.
    StringMatches,
    /// `version=` IP version.
    IpVersion,
    /// `key=` sub-validator applied to every map key.
    Key,
}

/// A typed ordering bound for `Min`/`Max`.
#[derive(Debug, Clone)]
pub enum Bound {
    /// Integer bound.
    Int(i64),
    /// Float bound.
    Float(f64),
    /// Date bound.
    Date(NaiveDate),
    /// Date-time bound.
    DateTime(NaiveDateTime),
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Int(i) => write!(f, "{}", Value::Int(*i)),
            Bound::Float(x) => write!(f, "{}", Value::Float(*x)),
            Bound::Date(d) => write!(f, "{}", Value::Date(*d)),
            Bound::DateTime(dt) => write!(f, "{}", Value::DateTime(*dt)),
        }
    }
}

/// The active payload of a configured constraint.
#[derive(Debug, Clone)]
pub enum ConstraintKind {
    /// Value must be `>= bound`.
    Min(Bound),
    /// Value must be `<= bound`.
    Max(Bound),
    /// `len(value) >= n`.
    LengthMin(usize),
    /// `len(value) <= n`.
    LengthMax(usize),
    /// No excluded character may occur in the string.
    CharacterExclude {
        /// Characters that must not appear.
        chars: String,
        /// Case-insensitive comparison.
        ignore_case: bool,
    },
    /// String equality.
    StringEquals {
        /// Expected string.
        expected: String,
        /// Case-insensitive comparison.
        ignore_case: bool,
    },
    /// String prefix.
    StringStartsWith {
        /// Required prefix.
        prefix: String,
        /// Case-insensitive comparison.
        ignore_case: bool,
    },
    /// String suffix.
    StringEndsWith {
        /// Required suffix.
        suffix: String,
        /// Case-insensitive comparison.
        ignore_case: bool,
    },
    /// Regex match.
    StringMatches {
        /// Compiled pattern (inline flags applied).
        pattern: Regex,
        /// Pattern as written in the schema, for error messages.
        source: String,
    },
    /// IP address version (4 or 6).
    IpVersion(u8),
    /// Every map key must satisfy the sub-validator.
    Key(Box<Validator>),
}

/// One constraint slot on a validator. Inactive slots (keyword absent in
/// the expression) always pass.
#[derive(Debug, Clone)]
pub struct Constraint {
    active: Option<ConstraintKind>,
}

impl Constraint {
    /// True when the constraint's keyword was supplied.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Apply the constraint. Returns one message per failure; an empty
    /// vector means the value passed (or the constraint is inactive).
    pub fn check(&self, value: &Value) -> Vec<String> {
        let Some(kind) = &self.active else {
            return Vec::new();
        };

        match kind {
            ConstraintKind::Min(bound) => {
                check_bound(bound, value, true).into_iter().collect()
            }
            ConstraintKind::Max(bound) => {
                check_bound(bound, value, false).into_iter().collect()
            }
            ConstraintKind::LengthMin(min) => match value.len() {
                Some(len) if len < *min => {
                    vec![format!("Length of {value} is less than {min}")]
                }
                _ => Vec::new(),
            },
            ConstraintKind::LengthMax(max) => match value.len() {
                Some(len) if len > *max => {
                    vec![format!("Length of {value} is greater than {max}")]
                }
                _ => Vec::new(),
            },
            ConstraintKind::CharacterExclude { chars, ignore_case } => {
                let Some(s) = value.as_str() else {
                    return Vec::new();
                };
                let haystack = if *ignore_case { s.to_lowercase() } else { s.to_string() };
                for c in chars.chars() {
                    let needle = if *ignore_case {
                        c.to_lowercase().to_string()
                    } else {
                        c.to_string()
                    };
                    if haystack.contains(&needle) {
                        return vec![format!(
                            "'{value}' contains excluded character '{c}'"
                        )];
                    }
                }
                Vec::new()
            }
            ConstraintKind::StringEquals { expected, ignore_case } => {
                match value.as_str() {
                    Some(s) if string_eq(s, expected, *ignore_case) => Vec::new(),
                    Some(_) => vec![format!("'{value}' does not equal '{expected}'")],
                    None => Vec::new(),
                }
            }
            ConstraintKind::StringStartsWith { prefix, ignore_case } => {
                match value.as_str() {
                    Some(s) if fold(s, *ignore_case).starts_with(&fold(prefix, *ignore_case)) => {
                        Vec::new()
                    }
                    Some(_) => vec![format!("'{value}' does not start with '{prefix}'")],
                    None => Vec::new(),
                }
            }
            ConstraintKind::StringEndsWith { suffix, ignore_case } => {
                match value.as_str() {
                    Some(s) if fold(s, *ignore_case).ends_with(&fold(suffix, *ignore_case)) => {
                        Vec::new()
                    }
                    Some(_) => vec![format!("'{value}' does not end with '{suffix}'")],
                    None => Vec::new(),
                }
            }
            ConstraintKind::StringMatches { pattern, source } => {
                match value.as_str() {
                    Some(s) if pattern.is_match(s) => Vec::new(),
                    Some(_) => vec![format!("'{value}' does not match regex '{source}'")],
                    None => Vec::new(),
                }
            }
            ConstraintKind::IpVersion(version) => {
                let Some(s) = value.as_str() else {
                    return Vec::new();
                };
                match parse_ip(s) {
                    Some((IpAddr::V4(_), _)) if *version == 4 => Vec::new(),
                    Some((IpAddr::V6(_), _)) if *version == 6 => Vec::new(),
                    _ => vec![format!("IP version of '{value}' is not {version}")],
                }
            }
            ConstraintKind::Key(validator) => {
                let Value::Map(entries) = value else {
                    return Vec::new();
                };
                let mut errors = Vec::new();
                for (key, _) in entries {
                    let key_value = Value::Str(key.clone());
                    for error in validator.validate(&key_value) {
                        errors.push(format!("Key error - {error}"));
                    }
                }
                errors
            }
        }
    }
}

fn fold(s: &str, ignore_case: bool) -> String {
    if ignore_case {
        s.to_lowercase()
    } else {
        s.to_string()
    }
}

fn string_eq(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

/// Ordering check shared by `Min` (`lower = true`) and `Max`.
///
/// A value the bound cannot be compared against passes silently; the
/// type predicate has already rejected it with a clearer message.
fn check_bound(bound: &Bound, value: &Value, lower: bool) -> Option<String> {
    let ok = match bound {
        Bound::Int(b) => value.as_i64().map(|v| if lower { *b <= v } else { *b >= v }),
        Bound::Float(b) => value.as_f64().map(|v| if lower { *b <= v } else { *b >= v }),
        Bound::Date(b) => value.as_date().map(|v| if lower { *b <= v } else { *b >= v }),
        Bound::DateTime(b) => value
            .as_datetime()
            .map(|v| if lower { *b <= v } else { *b >= v }),
    };
    match ok {
        Some(true) | None => None,
        Some(false) if lower => Some(format!("{value} is less than {bound}")),
        Some(false) => Some(format!("{value} is greater than {bound}")),
    }
}

/// Parse an IP address, optionally with a `/prefix` suffix.
pub(crate) fn parse_ip(s: &str) -> Option<(IpAddr, Option<u8>)> {
    let (addr_part, prefix) = match s.split_once('/') {
        Some((addr, prefix_str)) => {
            let prefix: u8 = prefix_str.parse().ok()?;
            (addr, Some(prefix))
        }
        None => (s, None),
    };

    let addr: IpAddr = addr_part.parse().ok()?;
    if let Some(prefix) = prefix {
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix > max {
            return None;
        }
    }
    Some((addr, prefix))
}

/// Instantiate a validator's declared constraint set from its keyword
/// arguments. Slots whose keyword is absent come back inactive.
pub(crate) fn build_constraints(
    tags: &[ConstraintTag],
    value_type: ValueType,
    kwargs: &Kwargs,
) -> Result<Vec<Constraint>, SyntaxError> {
    let ignore_case = kwargs.bool_kw("ignore_case")?.unwrap_or(false);

    let mut constraints = Vec::with_capacity(tags.len());
    for tag in tags {
        let active = match tag {
            ConstraintTag::Min => bound_kw(kwargs, "min", value_type)?.map(ConstraintKind::Min),
            ConstraintTag::Max => bound_kw(kwargs, "max", value_type)?.map(ConstraintKind::Max),
            ConstraintTag::LengthMin => kwargs.usize_kw("min")?.map(ConstraintKind::LengthMin),
            ConstraintTag::LengthMax => kwargs.usize_kw("max")?.map(ConstraintKind::LengthMax),
            ConstraintTag::CharacterExclude => kwargs.str_kw("exclude")?.map(|chars| {
                ConstraintKind::CharacterExclude { chars, ignore_case }
            }),
            ConstraintTag::StringEquals => kwargs.str_kw("equals")?.map(|expected| {
                ConstraintKind::StringEquals { expected, ignore_case }
            }),
            ConstraintTag::StringStartsWith => kwargs.str_kw("starts_with")?.map(|prefix| {
                ConstraintKind::StringStartsWith { prefix, ignore_case }
            }),
            ConstraintTag::StringEndsWith => kwargs.str_kw("ends_with")?.map(|suffix| {
                ConstraintKind::StringEndsWith { suffix, ignore_case }
            }),
            ConstraintTag::StringMatches => match kwargs.str_kw("matches")? {
                Some(source) => {
                    let pattern = compile_pattern(&source, kwargs)?;
                    Some(ConstraintKind::StringMatches { pattern, source })
                }
                None => None,
            },
            ConstraintTag::IpVersion => match kwargs.i64_kw("version")? {
                Some(4) => Some(ConstraintKind::IpVersion(4)),
                Some(6) => Some(ConstraintKind::IpVersion(6)),
                Some(_) => return Err(SyntaxError::keyword("version", "4 or 6")),
                None => None,
            },
            ConstraintTag::Key => match kwargs.validator_kw("key")? {
                Some(validator) => Some(ConstraintKind::Key(Box::new(validator))),
                None => None,
            },
        };
        constraints.push(Constraint { active });
    }
    Ok(constraints)
}

fn bound_kw(
    kwargs: &Kwargs,
    key: &str,
    value_type: ValueType,
) -> Result<Option<Bound>, SyntaxError> {
    Ok(match value_type {
        ValueType::Int => kwargs.i64_kw(key)?.map(Bound::Int),
        ValueType::Float => kwargs.f64_kw(key)?.map(Bound::Float),
        ValueType::Date => kwargs.date_kw(key)?.map(Bound::Date),
        ValueType::DateTime => kwargs.datetime_kw(key)?.map(Bound::DateTime),
    })
}

/// Compile a `matches=` pattern, honoring the `ignore_case=`, `multiline=`
/// and `dotall=` flag keywords as inline regex flags.
pub(crate) fn compile_pattern(source: &str, kwargs: &Kwargs) -> Result<Regex, SyntaxError> {
    let mut flags = String::new();
    if kwargs.bool_kw("ignore_case")?.unwrap_or(false) {
        flags.push('i');
    }
    if kwargs.bool_kw("multiline")?.unwrap_or(false) {
        flags.push('m');
    }
    if kwargs.bool_kw("dotall")?.unwrap_or(false) {
        flags.push('s');
    }

    let full = if flags.is_empty() {
        source.to_string()
    } else {
        format!("(?{flags}){source}")
    };

    Regex::new(&full)
        .map_err(|e| SyntaxError::new(format!("invalid regex '{source}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Arg;

    fn kwargs(pairs: &[(&str, Value)]) -> Kwargs {
        let mut kw = Kwargs::default();
        for (k, v) in pairs {
            kw.insert(k.to_string(), Arg::Value(v.clone()));
        }
        kw
    }

    #[test]
    fn test_min_max_float_bounds() {
        let kw = kwargs(&[("min", Value::Float(0.5)), ("max", Value::Int(1))]);
        let set = build_constraints(
            &[ConstraintTag::Min, ConstraintTag::Max],
            ValueType::Float,
            &kw,
        )
        .unwrap();
        assert!(set[0].check(&Value::Float(0.7)).is_empty());
        assert_eq!(set[0].check(&Value::Float(0.1)), vec!["0.1 is less than 0.5"]);
        assert_eq!(set[1].check(&Value::Float(1.5)), vec!["1.5 is greater than 1"]);
    }

    #[test]
    fn test_min_date_bound_from_string_keyword() {
        let kw = kwargs(&[("min", Value::Str("2010-01-01".into()))]);
        let set = build_constraints(&[ConstraintTag::Min], ValueType::Date, &kw).unwrap();
        let before = Value::Date(NaiveDate::from_ymd_opt(2009, 6, 1).unwrap());
        let after = Value::Date(NaiveDate::from_ymd_opt(2011, 6, 1).unwrap());
        assert_eq!(set[0].check(&before).len(), 1);
        assert!(set[0].check(&after).is_empty());
    }

    #[test]
    fn test_inactive_constraint_always_passes() {
        let set =
            build_constraints(&[ConstraintTag::Min], ValueType::Float, &Kwargs::default())
                .unwrap();
        assert!(!set[0].is_active());
        assert!(set[0].check(&Value::Float(-1e9)).is_empty());
    }

    #[test]
    fn test_bad_keyword_type_is_syntax_error() {
        let kw = kwargs(&[("min", Value::Str("abc".into()))]);
        let err = build_constraints(&[ConstraintTag::Min], ValueType::Float, &kw).unwrap_err();
        assert_eq!(err.to_string(), "'min' is not a num");
    }

    #[test]
    fn test_length_bounds() {
        let kw = kwargs(&[("min", Value::Int(2)), ("max", Value::Int(3))]);
        let set = build_constraints(
            &[ConstraintTag::LengthMin, ConstraintTag::LengthMax],
            ValueType::Int,
            &kw,
        )
        .unwrap();
        assert!(set[0].check(&Value::Str("ab".into())).is_empty());
        assert_eq!(
            set[0].check(&Value::Str("a".into())),
            vec!["Length of a is less than 2"]
        );
        assert_eq!(
            set[1].check(&Value::Str("abcd".into())),
            vec!["Length of abcd is greater than 3"]
        );
    }

    #[test]
    fn test_character_exclude() {
        let kw = kwargs(&[("exclude", Value::Str("abcd".into()))]);
        let set =
            build_constraints(&[ConstraintTag::CharacterExclude], ValueType::Int, &kw).unwrap();
        assert!(set[0].check(&Value::Str("efg".into())).is_empty());
        assert_eq!(
            set[0].check(&Value::Str("xaz".into())),
            vec!["'xaz' contains excluded character 'a'"]
        );
    }

    #[test]
    fn test_character_exclude_ignore_case() {
        let kw = kwargs(&[
            ("exclude", Value::Str("abcd".into())),
            ("ignore_case", Value::Bool(true)),
        ]);
        let set =
            build_constraints(&[ConstraintTag::CharacterExclude], ValueType::Int, &kw).unwrap();
        assert_eq!(set[0].check(&Value::Str("xAz".into())).len(), 1);
    }

    #[test]
    fn test_string_predicates() {
        let kw = kwargs(&[
            ("equals", Value::Str("abc".into())),
            ("starts_with", Value::Str("ab".into())),
            ("ends_with", Value::Str("bc".into())),
        ]);
        let set = build_constraints(
            &[
                ConstraintTag::StringEquals,
                ConstraintTag::StringStartsWith,
                ConstraintTag::StringEndsWith,
            ],
            ValueType::Int,
            &kw,
        )
        .unwrap();
        let good = Value::Str("abc".into());
        let bad = Value::Str("xyz".into());
        for c in &set {
            assert!(c.check(&good).is_empty());
            assert_eq!(c.check(&bad).len(), 1);
        }
    }

    #[test]
    fn test_matches_with_flags() {
        let kw = kwargs(&[
            ("matches", Value::Str("^ab.*z$".into())),
            ("ignore_case", Value::Bool(true)),
        ]);
        let set =
            build_constraints(&[ConstraintTag::StringMatches], ValueType::Int, &kw).unwrap();
        assert!(set[0].check(&Value::Str("AByz".into())).is_empty());
        assert_eq!(
            set[0].check(&Value::Str("nope".into())),
            vec!["'nope' does not match regex '^ab.*z$'"]
        );
    }

    #[test]
    fn test_invalid_regex_is_syntax_error() {
        let kw = kwargs(&[("matches", Value::Str("(unclosed".into()))]);
        let err =
            build_constraints(&[ConstraintTag::StringMatches], ValueType::Int, &kw).unwrap_err();
        assert!(err.to_string().contains("invalid regex"));
    }

    #[test]
    fn test_ip_version() {
        let kw = kwargs(&[("version", Value::Int(4))]);
        let set = build_constraints(&[ConstraintTag::IpVersion], ValueType::Int, &kw).unwrap();
        assert!(set[0].check(&Value::Str("192.168.1.1".into())).is_empty());
        assert_eq!(
            set[0].check(&Value::Str("2001:db8::1".into())),
            vec!["IP version of '2001:db8::1' is not 4"]
        );
    }

    #[test]
    fn test_parse_ip_with_prefix() {
        assert!(parse_ip("192.168.1.0/24").is_some());
        assert!(parse_ip("192.168.1.0/33").is_none());
        assert!(parse_ip("2001:db8::/64").is_some());
        assert!(parse_ip("not-an-ip").is_none());
    }
}
