//! # Validators — The Typed Validator Tree
//!
//! A [`Validator`] is one node of a parsed schema expression: a type
//! predicate (`str`, `int`, `map`, ...) plus the ordered constraint set its
//! variant declares, plus any nested validators (`list(str())`,
//! `map(key=str())`, `any(int(), null())`).
//!
//! Validators are built once while the schema is constructed and are
//! immutable afterwards; a single `Validator` tree is safely shared across
//! any number of concurrent validations.
//!
//! ## Registry
//!
//! The expression parser resolves call names through a
//! [`ValidatorRegistry`]: an explicit, statically enumerated map from tag
//! (`str`) and type name (`String`) to a constructor function. There is no
//! reflection or subclass discovery; extending the language means
//! registering another constructor.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use yamlet_core::value::resolve_timestamp;
use yamlet_core::Value;

use crate::constraint::{
    build_constraints, compile_pattern, parse_ip, Constraint, ConstraintTag, ValueType,
};
use crate::error::SyntaxError;

/// A positional or keyword argument of a validator expression: either a
/// constant literal or a nested validator.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A constant literal (`2`, `'abc'`, `True`, `None`, a date, ...).
    Value(Value),
    /// A nested validator (`str()`, `include('address')`, ...).
    Validator(Validator),
}

/// Keyword arguments of a validator expression, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs(BTreeMap<String, Arg>);

impl Kwargs {
    /// Insert a keyword argument, returning any previous value.
    pub fn insert(&mut self, key: String, value: Arg) -> Option<Arg> {
        self.0.insert(key, value)
    }

    /// Look up a keyword argument.
    pub fn get(&self, key: &str) -> Option<&Arg> {
        self.0.get(key)
    }

    /// True when the keyword was supplied.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    fn literal(&self, key: &str, expected: &str) -> Result<Option<&Value>, SyntaxError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Arg::Value(v)) => Ok(Some(v)),
            Some(Arg::Validator(_)) => Err(SyntaxError::keyword(key, expected)),
        }
    }

    /// Boolean keyword.
    pub fn bool_kw(&self, key: &str) -> Result<Option<bool>, SyntaxError> {
        match self.literal(key, "bool")? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(SyntaxError::keyword(key, "bool")),
        }
    }

    /// Float keyword; integers and numeric strings convert.
    pub fn f64_kw(&self, key: &str) -> Result<Option<f64>, SyntaxError> {
        match self.literal(key, "num")? {
            None => Ok(None),
            Some(Value::Int(i)) => Ok(Some(*i as f64)),
            Some(Value::Float(f)) => Ok(Some(*f)),
            Some(Value::Str(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| SyntaxError::keyword(key, "num")),
            Some(_) => Err(SyntaxError::keyword(key, "num")),
        }
    }

    /// Integer keyword; floats truncate, numeric strings convert.
    pub fn i64_kw(&self, key: &str) -> Result<Option<i64>, SyntaxError> {
        match self.literal(key, "int")? {
            None => Ok(None),
            Some(Value::Int(i)) => Ok(Some(*i)),
            Some(Value::Float(f)) => Ok(Some(*f as i64)),
            Some(Value::Str(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| SyntaxError::keyword(key, "int")),
            Some(_) => Err(SyntaxError::keyword(key, "int")),
        }
    }

    /// Non-negative integer keyword.
    pub fn usize_kw(&self, key: &str) -> Result<Option<usize>, SyntaxError> {
        match self.i64_kw(key)? {
            None => Ok(None),
            Some(i) if i >= 0 => Ok(Some(i as usize)),
            Some(_) => Err(SyntaxError::keyword(key, "int")),
        }
    }

    /// String keyword.
    pub fn str_kw(&self, key: &str) -> Result<Option<String>, SyntaxError> {
        match self.literal(key, "str")? {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(_) => Err(SyntaxError::keyword(key, "str")),
        }
    }

    /// Date keyword; accepts a date scalar or an ISO date string.
    pub fn date_kw(&self, key: &str) -> Result<Option<NaiveDate>, SyntaxError> {
        match self.literal(key, "day")? {
            None => Ok(None),
            Some(v) => literal_date(v).map(Some).ok_or_else(|| SyntaxError::keyword(key, "day")),
        }
    }

    /// Date-time keyword; accepts a timestamp scalar, a date (midnight), or
    /// an ISO timestamp string.
    pub fn datetime_kw(&self, key: &str) -> Result<Option<NaiveDateTime>, SyntaxError> {
        match self.literal(key, "timestamp")? {
            None => Ok(None),
            Some(v) => literal_datetime(v)
                .map(Some)
                .ok_or_else(|| SyntaxError::keyword(key, "timestamp")),
        }
    }

    /// Keyword whose value must be a nested validator (`key=str()`).
    pub fn validator_kw(&self, key: &str) -> Result<Option<Validator>, SyntaxError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Arg::Validator(v)) => Ok(Some(v.clone())),
            Some(Arg::Value(_)) => Err(SyntaxError::keyword(key, "validator")),
        }
    }
}

fn literal_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(_) | Value::DateTime(_) => value.as_date(),
        Value::Str(s) => resolve_timestamp(s)?.as_date(),
        _ => None,
    }
}

fn literal_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Date(d) => d.and_hms_opt(0, 0, 0),
        Value::Str(s) => match resolve_timestamp(s)? {
            Value::DateTime(dt) => Some(dt),
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            _ => None,
        },
        _ => None,
    }
}

/// The variant of a validator: its type predicate and any nested structure.
#[derive(Debug, Clone)]
pub enum ValidatorKind {
    /// Text scalar; non-empty `literals` restrict the accepted values.
    Str {
        /// Optional literal-set restriction from positional args.
        literals: Vec<Value>,
    },
    /// Integer or float scalar.
    Num,
    /// Integer scalar.
    Int,
    /// Boolean scalar.
    Bool,
    /// One of the positional literals.
    Enum {
        /// The accepted literal values.
        literals: Vec<Value>,
    },
    /// Date scalar; non-empty `literals` restrict the accepted dates.
    Day {
        /// Optional allowed dates from positional args.
        literals: Vec<NaiveDate>,
    },
    /// Date-time scalar; non-empty `literals` restrict the accepted values.
    Timestamp {
        /// Optional allowed timestamps from positional args.
        literals: Vec<NaiveDateTime>,
    },
    /// Mapping; sub-validators apply to every value (OR semantics).
    Map {
        /// Sub-validators for the map's values; empty = untyped map.
        validators: Vec<Validator>,
    },
    /// Sequence; sub-validators apply to every element (OR semantics).
    List {
        /// Sub-validators for the list's elements; empty = untyped list.
        validators: Vec<Validator>,
    },
    /// Delegation to a named include schema.
    Include {
        /// Name of the include to resolve at validation time.
        name: String,
    },
    /// At least one sub-validator must accept the value.
    Any {
        /// The candidate validators.
        validators: Vec<Validator>,
    },
    /// Exactly null.
    Null,
    /// String matching at least one of the positional patterns.
    Regex {
        /// Compiled patterns with their schema-text sources.
        patterns: Vec<(Regex, String)>,
        /// Optional display name for failure messages (`name=`).
        name: Option<String>,
    },
    /// IPv4/IPv6 address, optionally with a `/prefix`.
    Ip,
    /// MAC address (colon or dash separated).
    Mac,
}

impl ValidatorKind {
    /// The expression-language tag of this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            ValidatorKind::Str { .. } => "str",
            ValidatorKind::Num => "num",
            ValidatorKind::Int => "int",
            ValidatorKind::Bool => "bool",
            ValidatorKind::Enum { .. } => "enum",
            ValidatorKind::Day { .. } => "day",
            ValidatorKind::Timestamp { .. } => "timestamp",
            ValidatorKind::Map { .. } => "map",
            ValidatorKind::List { .. } => "list",
            ValidatorKind::Include { .. } => "include",
            ValidatorKind::Any { .. } => "any",
            ValidatorKind::Null => "null",
            ValidatorKind::Regex { .. } => "regex",
            ValidatorKind::Ip => "ip",
            ValidatorKind::Mac => "mac",
        }
    }
}

static MAC_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^([0-9a-fA-F]{2}:){5}[0-9a-fA-F]{2}$").expect("valid pattern"),
        Regex::new(r"^([0-9a-fA-F]{2}-){5}[0-9a-fA-F]{2}$").expect("valid pattern"),
    ]
});

/// One node of the validator tree.
///
/// Equality compares variant, positional args, and keyword args — two
/// validators parsed from the same expression are equal.
#[derive(Debug, Clone)]
pub struct Validator {
    kind: ValidatorKind,
    args: Vec<Arg>,
    kwargs: Kwargs,
    is_required: bool,
    can_be_none: bool,
    constraints: Vec<Constraint>,
}

impl Validator {
    /// Shared assembly: flags, constraint set, retained args/kwargs.
    fn assemble(
        kind: ValidatorKind,
        args: Vec<Arg>,
        kwargs: Kwargs,
        constraint_tags: &[ConstraintTag],
        value_type: ValueType,
    ) -> Result<Self, SyntaxError> {
        let is_required = kwargs.bool_kw("required")?.unwrap_or(true);
        let can_be_none = kwargs.bool_kw("none")?.unwrap_or(true);
        let constraints = build_constraints(constraint_tags, value_type, &kwargs)?;
        Ok(Self {
            kind,
            args,
            kwargs,
            is_required,
            can_be_none,
            constraints,
        })
    }

    /// The variant of this validator.
    pub fn kind(&self) -> &ValidatorKind {
        &self.kind
    }

    /// The expression-language tag (`str`, `int`, ...).
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// True unless `required=False` was supplied.
    pub fn is_required(&self) -> bool {
        self.is_required
    }

    /// Negation of [`is_required`](Self::is_required).
    pub fn is_optional(&self) -> bool {
        !self.is_required
    }

    /// True unless `none=False` was supplied: a null value is acceptable
    /// for an optional field.
    pub fn can_be_none(&self) -> bool {
        self.can_be_none
    }

    /// The retained positional arguments.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// The retained keyword arguments.
    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    /// Nested validators of `map`/`list`/`any` variants.
    pub fn sub_validators(&self) -> &[Validator] {
        match &self.kind {
            ValidatorKind::Map { validators }
            | ValidatorKind::List { validators }
            | ValidatorKind::Any { validators } => validators,
            _ => &[],
        }
    }

    /// The name used in failure messages: the include name for `include`,
    /// the `name=` keyword (default `regex match`) for `regex`, otherwise
    /// the tag.
    pub fn name(&self) -> String {
        match &self.kind {
            ValidatorKind::Include { name } => name.clone(),
            ValidatorKind::Regex { name, .. } => {
                name.clone().unwrap_or_else(|| "regex match".to_string())
            }
            other => other.tag().to_string(),
        }
    }

    /// Check `value` against this node in isolation (no include/container
    /// recursion — the engine handles structure).
    ///
    /// Runs the type predicate first; on mismatch the single failure
    /// message is returned and no constraints run. Otherwise every active
    /// constraint runs and all failures are collected.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        if !self.type_check(value) {
            return vec![self.fail(value)];
        }

        let mut errors = Vec::new();
        for constraint in &self.constraints {
            errors.extend(constraint.check(value));
        }
        errors
    }

    /// True when [`validate`](Self::validate) returns no errors.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.validate(value).is_empty()
    }

    fn type_check(&self, value: &Value) -> bool {
        match &self.kind {
            ValidatorKind::Str { literals } => {
                value.is_str()
                    && (literals.is_empty() || literals.iter().any(|l| l.loose_eq(value)))
            }
            ValidatorKind::Num => value.is_number(),
            ValidatorKind::Int => value.is_int(),
            ValidatorKind::Bool => value.is_bool(),
            ValidatorKind::Enum { literals } => literals.iter().any(|l| l.loose_eq(value)),
            ValidatorKind::Day { literals } => match value.as_date() {
                Some(d) if value.is_date() || value.is_datetime() => {
                    literals.is_empty() || literals.contains(&d)
                }
                _ => false,
            },
            ValidatorKind::Timestamp { literals } => match value.as_datetime() {
                Some(dt) => literals.is_empty() || literals.contains(&dt),
                None => false,
            },
            ValidatorKind::Map { .. } => value.is_map(),
            ValidatorKind::List { .. } => value.is_list(),
            // An include may name a custom scalar validator, so only text
            // scalars are rejected outright here.
            ValidatorKind::Include { .. } => !value.is_str(),
            ValidatorKind::Any { .. } => true,
            ValidatorKind::Null => value.is_null(),
            ValidatorKind::Regex { patterns, .. } => match value.as_str() {
                Some(s) => patterns.iter().any(|(re, _)| re.is_match(s)),
                None => false,
            },
            ValidatorKind::Ip => value.as_str().is_some_and(|s| parse_ip(s).is_some()),
            ValidatorKind::Mac => value
                .as_str()
                .is_some_and(|s| MAC_PATTERNS.iter().any(|re| re.is_match(s))),
        }
    }

    /// The type-mismatch failure message.
    fn fail(&self, value: &Value) -> String {
        match &self.kind {
            ValidatorKind::Enum { literals } => {
                format!("'{value}' not in {}", enum_tuple(literals))
            }
            _ => format!("'{value}' is not a {}.", self.name()),
        }
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag() && self.args == other.args && self.kwargs == other.kwargs
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(...)", self.tag())
    }
}

/// Render enum literals the way the failure message format expects:
/// `('a', 1)`, with the single-element form `('a',)`.
fn enum_tuple(literals: &[Value]) -> String {
    let items: Vec<String> = literals.iter().map(repr).collect();
    if items.len() == 1 {
        format!("({},)", items[0])
    } else {
        format!("({})", items.join(", "))
    }
}

fn repr(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

fn literal_args(args: &[Arg]) -> Vec<Value> {
    args.iter()
        .filter_map(|a| match a {
            Arg::Value(v) => Some(v.clone()),
            Arg::Validator(_) => None,
        })
        .collect()
}

fn validator_args(args: &[Arg]) -> Vec<Validator> {
    args.iter()
        .filter_map(|a| match a {
            Arg::Validator(v) => Some(v.clone()),
            Arg::Value(_) => None,
        })
        .collect()
}

/// Constructor function for one validator tag.
pub type BuilderFn = fn(Vec<Arg>, Kwargs) -> Result<Validator, SyntaxError>;

/// Explicit name → constructor map used by the expression parser.
///
/// Every tag is registered under both its tag and its type name
/// (`str`/`String`, `int`/`Integer`, ...). Custom validators extend the
/// default set through [`register`](Self::register).
#[derive(Debug, Clone)]
pub struct ValidatorRegistry {
    builders: BTreeMap<String, BuilderFn>,
}

impl ValidatorRegistry {
    /// A registry with no validators at all.
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Register a constructor under one or more names.
    pub fn register(&mut self, names: &[&str], builder: BuilderFn) {
        for name in names {
            self.builders.insert((*name).to_string(), builder);
        }
    }

    /// Look up a constructor by name.
    pub fn get(&self, name: &str) -> Option<BuilderFn> {
        self.builders.get(name).copied()
    }

    /// True when `name` is a registered validator.
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(&["str", "String"], build_str);
        registry.register(&["num", "Number"], build_num);
        registry.register(&["int", "Integer"], build_int);
        registry.register(&["bool", "Boolean"], build_bool);
        registry.register(&["enum", "Enum"], build_enum);
        registry.register(&["day", "Day"], build_day);
        registry.register(&["timestamp", "Timestamp"], build_timestamp);
        registry.register(&["map", "Map"], build_map);
        registry.register(&["list", "List"], build_list);
        registry.register(&["include", "Include"], build_include);
        registry.register(&["any", "Any"], build_any);
        registry.register(&["null", "Null"], build_null);
        registry.register(&["regex", "Regex"], build_regex);
        registry.register(&["ip", "Ip"], build_ip);
        registry.register(&["mac", "Mac"], build_mac);
        registry
    }
}

const STR_CONSTRAINTS: &[ConstraintTag] = &[
    ConstraintTag::LengthMin,
    ConstraintTag::LengthMax,
    ConstraintTag::CharacterExclude,
    ConstraintTag::StringEquals,
    ConstraintTag::StringStartsWith,
    ConstraintTag::StringEndsWith,
    ConstraintTag::StringMatches,
];

fn build_str(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    let kind = ValidatorKind::Str {
        literals: literal_args(&args),
    };
    Validator::assemble(kind, args, kwargs, STR_CONSTRAINTS, ValueType::Int)
}

fn build_num(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    Validator::assemble(
        ValidatorKind::Num,
        args,
        kwargs,
        &[ConstraintTag::Min, ConstraintTag::Max],
        ValueType::Float,
    )
}

fn build_int(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    Validator::assemble(
        ValidatorKind::Int,
        args,
        kwargs,
        &[ConstraintTag::Min, ConstraintTag::Max],
        ValueType::Int,
    )
}

fn build_bool(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    Validator::assemble(ValidatorKind::Bool, args, kwargs, &[], ValueType::Int)
}

fn build_enum(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    let kind = ValidatorKind::Enum {
        literals: literal_args(&args),
    };
    Validator::assemble(kind, args, kwargs, &[], ValueType::Int)
}

fn build_day(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    let mut literals = Vec::new();
    for literal in literal_args(&args) {
        let date = literal_date(&literal)
            .ok_or_else(|| SyntaxError::new(format!("'{literal}' is not a day")))?;
        literals.push(date);
    }
    Validator::assemble(
        ValidatorKind::Day { literals },
        args,
        kwargs,
        &[ConstraintTag::Min, ConstraintTag::Max],
        ValueType::Date,
    )
}

fn build_timestamp(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    let mut literals = Vec::new();
    for literal in literal_args(&args) {
        let dt = literal_datetime(&literal)
            .ok_or_else(|| SyntaxError::new(format!("'{literal}' is not a timestamp")))?;
        literals.push(dt);
    }
    Validator::assemble(
        ValidatorKind::Timestamp { literals },
        args,
        kwargs,
        &[ConstraintTag::Min, ConstraintTag::Max],
        ValueType::DateTime,
    )
}

fn build_map(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    let kind = ValidatorKind::Map {
        validators: validator_args(&args),
    };
    Validator::assemble(
        kind,
        args,
        kwargs,
        &[
            ConstraintTag::LengthMin,
            ConstraintTag::LengthMax,
            ConstraintTag::Key,
        ],
        ValueType::Int,
    )
}

fn build_list(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    let kind = ValidatorKind::List {
        validators: validator_args(&args),
    };
    Validator::assemble(
        kind,
        args,
        kwargs,
        &[ConstraintTag::LengthMin, ConstraintTag::LengthMax],
        ValueType::Int,
    )
}

fn build_include(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    let name = match args.first() {
        Some(Arg::Value(Value::Str(name))) => name.clone(),
        _ => return Err(SyntaxError::new("include() requires an include name")),
    };
    Validator::assemble(
        ValidatorKind::Include { name },
        args,
        kwargs,
        &[],
        ValueType::Int,
    )
}

fn build_any(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    // Literal arguments are shorthand for single-value enums:
    // any('a', int()) accepts the string 'a' or any integer.
    let mut validators = Vec::new();
    for arg in &args {
        match arg {
            Arg::Validator(v) => validators.push(v.clone()),
            Arg::Value(v) => {
                let enum_arg = vec![Arg::Value(v.clone())];
                validators.push(build_enum(enum_arg, Kwargs::default())?);
            }
        }
    }
    Validator::assemble(
        ValidatorKind::Any { validators },
        args,
        kwargs,
        &[],
        ValueType::Int,
    )
}

fn build_null(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    Validator::assemble(ValidatorKind::Null, args, kwargs, &[], ValueType::Int)
}

fn build_regex(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    let mut patterns = Vec::new();
    for literal in literal_args(&args) {
        let Value::Str(source) = literal else {
            return Err(SyntaxError::new(format!(
                "'{literal}' is not a regex pattern"
            )));
        };
        let compiled = compile_pattern(&source, &kwargs)?;
        patterns.push((compiled, source));
    }
    let name = kwargs.str_kw("name")?;
    Validator::assemble(
        ValidatorKind::Regex { patterns, name },
        args,
        kwargs,
        &[],
        ValueType::Int,
    )
}

fn build_ip(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    Validator::assemble(
        ValidatorKind::Ip,
        args,
        kwargs,
        &[ConstraintTag::IpVersion],
        ValueType::Int,
    )
}

fn build_mac(args: Vec<Arg>, kwargs: Kwargs) -> Result<Validator, SyntaxError> {
    Validator::assemble(ValidatorKind::Mac, args, kwargs, &[], ValueType::Int)
}
