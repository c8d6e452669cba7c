//! # Value — Generic Nested Document Model
//!
//! `Value` is the single representation for every document the system
//! touches: raw schema documents, include documents, and the data documents
//! being validated. Readers convert the underlying parser's value tree into
//! `Value` at the boundary; the schema and engine layers never see
//! `serde_yaml`/`serde_json` types.
//!
//! ## YAML 1.1 Scalar Resolution
//!
//! The YAML 1.2 core schema (what `serde_yaml` implements) leaves
//! `2001-01-01` as a plain string, while the YAML 1.1 loaders the original
//! tooling ecosystem grew up with resolve it to a date. Date and timestamp
//! validators operate on typed scalars, so the conversion from
//! `serde_yaml::Value` applies the YAML 1.1 timestamp resolution pattern to
//! plain strings. JSON has no date type and JSON documents get no such
//! resolution.
//!
//! ## Display
//!
//! `Display` renders scalars exactly the way error messages must show them
//! (`None`, `True`/`False`, `5.0` for whole floats), since validator
//! failure strings are part of the compatibility surface.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

/// A parsed document node: scalar, sequence, or mapping.
///
/// Mappings preserve insertion order so validation errors are reported in
/// document order. Key lookup is a linear scan; documents in this system
/// are human-authored and small.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// YAML `null` / JSON `null` / absent marker.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// Text scalar.
    Str(String),
    /// Date scalar (`YYYY-MM-DD`), resolved from YAML 1.1 plain scalars.
    Date(NaiveDate),
    /// Date-time scalar, normalized to UTC when an offset was present.
    DateTime(NaiveDateTime),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Insertion-ordered mapping.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// True for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `Bool`.
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// True for `Int`.
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// True for `Int` or `Float`. Booleans are not numbers.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// True for `Str`.
    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// True for `Date`.
    pub fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    /// True for `DateTime`.
    pub fn is_datetime(&self) -> bool {
        matches!(self, Value::DateTime(_))
    }

    /// True for `List`.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// True for `Map`.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// True for `Map` or `List` — the container types.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Map(_) | Value::List(_))
    }

    /// The text of a `Str` scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The inner boolean of a `Bool` scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of an `Int` scalar.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of an `Int` or `Float` scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Date view: the date itself, or the date part of a date-time.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    /// Date-time view of a `DateTime` scalar.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Look up a map key or a numeric list index.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Length of a text scalar (in characters), sequence, or mapping.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// True when `len()` is `Some(0)`.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Loose equality for enum membership: `1 == 1.0`, mirroring the
    /// comparison semantics the expression language inherited.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Top-level strings render without quotes; the surrounding
            // error message supplies them.
            Value::Str(s) => write!(f, "{s}"),
            other => write!(f, "{}", repr(other)),
        }
    }
}

/// Render a value the way it appears inside containers: strings quoted,
/// other scalars in their message form.
fn repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => format_float(*x),
        Value::Str(s) => format!("'{s}'"),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Map(entries) => {
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("'{k}': {}", repr(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

/// Whole floats keep one fractional digit (`5.0`, not `5`) so a float
/// never renders like an integer in error messages.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if x == x.trunc() && x.abs() < 1e16 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

// YAML 1.1 timestamp resolution pattern (core resolver grammar): a date
// `YYYY-MM-DD`, optionally followed by a time with optional fraction and
// optional timezone.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^
        (?P<year>[0-9]{4})-(?P<month>[0-9]{1,2})-(?P<day>[0-9]{1,2})
        (?:
            (?:[Tt]|[\ \t]+)
            (?P<hour>[0-9]{1,2}):(?P<minute>[0-9]{2}):(?P<second>[0-9]{2})
            (?:\.(?P<fraction>[0-9]*))?
            (?:[\ \t]*
                (?:(?P<utc>Z)|(?P<tzsign>[-+])(?P<tzhour>[0-9]{1,2})(?::(?P<tzminute>[0-9]{2}))?)
            )?
        )?$",
    )
    .expect("timestamp pattern is valid")
});

/// Resolve a plain string scalar as a YAML 1.1 date or timestamp.
///
/// Returns `None` when the string does not match the timestamp grammar or
/// names an impossible calendar date. Offset timestamps are normalized to
/// UTC so comparisons between scalars are well-defined.
pub fn resolve_timestamp(s: &str) -> Option<Value> {
    let caps = TIMESTAMP_RE.captures(s)?;

    let year: i32 = caps.name("year")?.as_str().parse().ok()?;
    let month: u32 = caps.name("month")?.as_str().parse().ok()?;
    let day: u32 = caps.name("day")?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let Some(hour) = caps.name("hour") else {
        return Some(Value::Date(date));
    };

    let hour: u32 = hour.as_str().parse().ok()?;
    let minute: u32 = caps.name("minute")?.as_str().parse().ok()?;
    let second: u32 = caps.name("second")?.as_str().parse().ok()?;

    let micros: u32 = match caps.name("fraction") {
        Some(frac) if !frac.as_str().is_empty() => {
            let mut digits = frac.as_str().to_string();
            digits.truncate(6);
            while digits.len() < 6 {
                digits.push('0');
            }
            digits.parse().ok()?
        }
        _ => 0,
    };

    let mut dt = date.and_hms_micro_opt(hour, minute, second, micros)?;

    // Normalize offset timestamps to UTC.
    if let Some(sign) = caps.name("tzsign") {
        let tz_hour: i64 = caps.name("tzhour")?.as_str().parse().ok()?;
        let tz_minute: i64 = caps
            .name("tzminute")
            .map(|m| m.as_str().parse().ok())
            .unwrap_or(Some(0))?;
        let mut delta = Duration::hours(tz_hour) + Duration::minutes(tz_minute);
        if sign.as_str() == "+" {
            delta = -delta;
        }
        dt = dt.checked_add_signed(delta)?;
    }

    Some(Value::DateTime(dt))
}

impl From<&serde_yaml::Value> for Value {
    fn from(yaml: &serde_yaml::Value) -> Self {
        match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(*b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => {
                resolve_timestamp(s).unwrap_or_else(|| Value::Str(s.clone()))
            }
            serde_yaml::Value::Sequence(seq) => {
                Value::List(seq.iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| (yaml_key_to_string(k), Value::from(v)))
                    .collect();
                Value::Map(entries)
            }
            // Ignore YAML tags, just convert the inner value.
            serde_yaml::Value::Tagged(tagged) => Value::from(&tagged.value),
        }
    }
}

/// Render a YAML mapping key as a path-compatible string. Non-scalar keys
/// are not addressable by dotted paths and collapse to their debug form.
fn yaml_key_to_string(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => format!("{other:?}"),
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            // JSON has no date type; strings stay strings.
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect();
                Value::Map(entries)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
