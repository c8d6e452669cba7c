//! # Schema Cache
//!
//! Many data files in one invocation usually share a handful of schema
//! files. The cache parses each schema path once and hands out shared
//! references; it is owned by the single run, never global.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use yamlet_schema::{make_schema, Schema, ValidatorRegistry, YamletError};

/// Parsed schemas keyed by file path.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: HashMap<PathBuf, Schema>,
}

impl SchemaCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The schema at `path`, parsing it on first use.
    ///
    /// # Errors
    ///
    /// Returns the read or build failure of a schema seen for the first
    /// time; cached schemas never fail again.
    pub fn get(&mut self, path: &Path) -> Result<&Schema, YamletError> {
        if !self.schemas.contains_key(path) {
            tracing::debug!(schema = %path.display(), "parsing schema");
            let schema = make_schema(path, ValidatorRegistry::default())?;
            self.schemas.insert(path.to_path_buf(), schema);
        }
        Ok(&self.schemas[path])
    }

    /// Number of distinct schemas parsed so far.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True when nothing has been parsed yet.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_schema(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("yamlet-cache-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, "a: int()\n").unwrap();
        path
    }

    #[test]
    fn test_cache_parses_once_per_path() {
        let path = temp_schema("once.yaml");
        let mut cache = SchemaCache::new();
        assert!(cache.is_empty());

        cache.get(&path).unwrap();
        cache.get(&path).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_propagates_missing_schema() {
        let mut cache = SchemaCache::new();
        let err = cache.get(Path::new("/nonexistent/schema.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
        assert!(cache.is_empty());
    }
}
