//! # DataPath — Dotted Paths Into Nested Documents
//!
//! A `DataPath` addresses a node inside a [`Value`] tree: map keys and list
//! indices joined with `.` (`employees.0.name`). Paths prefix every
//! validation error and drive both schema flattening and data resolution.

use std::fmt;

use crate::value::Value;

/// One step of a [`DataPath`]: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

impl PathSegment {
    /// The segment as a path string.
    pub fn as_str(&self) -> String {
        match self {
            PathSegment::Key(k) => k.clone(),
            PathSegment::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{k}"),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// An ordered list of segments addressing a node in a document.
///
/// Empty paths address the document root and render as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: Vec<PathSegment>,
}

impl DataPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from a single key.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(key.into())],
        }
    }

    /// True when this path addresses the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// A new path with `segment` appended.
    pub fn join(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// A new path with a key segment appended.
    pub fn join_key(&self, key: impl Into<String>) -> Self {
        self.join(PathSegment::Key(key.into()))
    }

    /// A new path with an index segment appended.
    pub fn join_index(&self, index: usize) -> Self {
        self.join(PathSegment::Index(index))
    }

    /// Concatenate two paths.
    pub fn concat(&self, other: &DataPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Resolve this path against a document, returning the addressed node.
    ///
    /// A key segment also resolves against a list when it parses as an
    /// index, matching how flattened schema paths address sequences.
    pub fn resolve<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        let mut node = data;
        for segment in &self.segments {
            node = match segment {
                PathSegment::Key(k) => node.get(k)?,
                PathSegment::Index(i) => match node {
                    Value::List(items) => items.get(*i)?,
                    other => other.get(&i.to_string())?,
                },
            };
        }
        Some(node)
    }

    /// Prefix an error message with this path: `"<path>: <message>"`.
    /// Root-level errors carry no prefix.
    pub fn tag(&self, message: &str) -> String {
        if self.is_root() {
            message.to_string()
        } else {
            format!("{self}: {message}")
        }
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for DataPath {
    /// Parse a dotted path string; numeric segments become indices.
    fn from(s: &str) -> Self {
        if s.is_empty() {
            return Self::root();
        }
        let segments = s
            .split('.')
            .map(|part| match part.parse::<usize>() {
                Ok(i) => PathSegment::Index(i),
                Err(_) => PathSegment::Key(part.to_string()),
            })
            .collect();
        Self { segments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_with_dots() {
        let path = DataPath::root().join_key("a").join_index(0).join_key("b");
        assert_eq!(path.to_string(), "a.0.b");
    }

    #[test]
    fn test_root_is_empty() {
        assert_eq!(DataPath::root().to_string(), "");
        assert!(DataPath::root().is_root());
    }

    #[test]
    fn test_resolve_mixed_map_and_list() {
        let data = Value::Map(vec![(
            "items".to_string(),
            Value::List(vec![Value::Str("x".into()), Value::Str("y".into())]),
        )]);
        let path = DataPath::from("items.1");
        assert_eq!(path.resolve(&data), Some(&Value::Str("y".into())));
        assert_eq!(DataPath::from("items.2").resolve(&data), None);
        assert_eq!(DataPath::from("missing").resolve(&data), None);
    }

    #[test]
    fn test_tag_prefixes_message() {
        let path = DataPath::from("a.b");
        assert_eq!(path.tag("Required field missing"), "a.b: Required field missing");
        assert_eq!(DataPath::root().tag("oops"), "oops");
    }

    #[test]
    fn test_from_str_round_trip() {
        let path = DataPath::from("a.0.b");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("a".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("b".to_string()),
            ]
        );
    }
}
