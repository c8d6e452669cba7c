//! # Run — Discovery, Schema Resolution, Execution
//!
//! Turns the parsed command line into validated documents: walk the given
//! paths for data files, resolve each file's governing schema, validate,
//! print every result.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use yamlet_schema::{make_data, validate};

use crate::cache::SchemaCache;

/// Validate YAML/JSON data files against yamlet schemas.
#[derive(Parser, Debug)]
#[command(name = "yamlet", version, about)]
pub struct Cli {
    /// Data files or directories to validate.
    #[arg(default_value = "./")]
    pub paths: Vec<PathBuf>,

    /// Schema: an explicit file applied to all data, or a filename
    /// resolved against each data file's directory and its parents.
    #[arg(short = 's', long = "schema", default_value = "schema.yaml")]
    pub schema: String,

    /// Accept data elements the schema does not declare.
    #[arg(long = "no-strict")]
    pub no_strict: bool,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute one invocation. Returns whether every document was valid.
pub fn run(cli: &Cli) -> anyhow::Result<bool> {
    let schema_filename = Path::new(&cli.schema);
    let explicit_schema = schema_filename.is_file().then(|| schema_filename.to_path_buf());

    let data_files = discover(&cli.paths, &cli.schema)?;
    if data_files.is_empty() {
        bail!("no data files found under the given paths");
    }
    tracing::debug!(count = data_files.len(), "discovered data files");

    let mut cache = SchemaCache::new();
    let mut all_valid = true;
    for file in &data_files {
        let schema_path = match &explicit_schema {
            Some(path) => path.clone(),
            None => find_schema(file, &cli.schema).with_context(|| {
                format!("no schema '{}' found for '{}'", cli.schema, file.display())
            })?,
        };

        let schema = cache.get(&schema_path)?;
        let data = make_data(file)?;
        for result in validate(schema, &data, !cli.no_strict) {
            println!("{result}");
            all_valid &= result.is_valid();
        }
    }
    Ok(all_valid)
}

/// Collect data files: given files are taken as-is, directories are walked
/// recursively for `*.yaml`/`*.yml`/`*.json`, skipping schema files.
/// Sorted for stable output.
pub fn discover(paths: &[PathBuf], schema_name: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, schema_name, &mut files)
                .with_context(|| format!("cannot walk '{}'", path.display()))?;
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("'{}' is not a file or directory", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, schema_name: &str, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, schema_name, out)?;
        } else if is_data_file(&path, schema_name) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_data_file(path: &Path, schema_name: &str) -> bool {
    if path.file_name().and_then(|n| n.to_str()) == Some(schema_name) {
        return false;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

/// Resolve the governing schema for a data file: `<name>` in the file's
/// directory, or the nearest ancestor directory that has one.
pub fn find_schema(data_file: &Path, schema_name: &str) -> Option<PathBuf> {
    let mut dir = data_file.parent();
    while let Some(current) = dir {
        let candidate = current.join(schema_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_tree(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join("yamlet-run-tests").join(name);
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("schema.yaml"), "n: int()\n").unwrap();
        std::fs::write(root.join("good.yaml"), "n: 1\n").unwrap();
        std::fs::write(root.join("sub/also.yml"), "n: 2\n").unwrap();
        std::fs::write(root.join("sub/data.json"), "{\"n\": 3}\n").unwrap();
        std::fs::write(root.join("notes.txt"), "ignored\n").unwrap();
        root
    }

    #[test]
    fn test_discover_walks_and_filters() {
        let root = fixture_tree("discover");
        let files = discover(&[root.clone()], "schema.yaml").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["good.yaml", "sub/also.yml", "sub/data.json"]);
    }

    #[test]
    fn test_discover_rejects_missing_path() {
        let err = discover(&[PathBuf::from("/nonexistent-path")], "schema.yaml").unwrap_err();
        assert!(err.to_string().contains("not a file or directory"));
    }

    #[test]
    fn test_find_schema_walks_upward() {
        let root = fixture_tree("upward");
        let data = root.join("sub/also.yml");
        let found = find_schema(&data, "schema.yaml").unwrap();
        assert_eq!(found, root.join("schema.yaml"));
        assert!(find_schema(&data, "no-such-schema.yaml")
            .map(|p| !p.starts_with(&root))
            .unwrap_or(true));
    }

    #[test]
    fn test_run_validates_tree() {
        let root = fixture_tree("run-ok");
        let cli = Cli {
            paths: vec![root],
            schema: "schema.yaml".to_string(),
            no_strict: false,
            verbose: false,
        };
        assert!(run(&cli).unwrap());
    }

    #[test]
    fn test_run_reports_invalid_documents() {
        let root = fixture_tree("run-bad");
        std::fs::write(root.join("bad.yaml"), "n: not-a-number\n").unwrap();
        let cli = Cli {
            paths: vec![root],
            schema: "schema.yaml".to_string(),
            no_strict: false,
            verbose: false,
        };
        assert!(!run(&cli).unwrap());
    }

    #[test]
    fn test_strict_flag_controls_unexpected_elements() {
        let root = fixture_tree("strictness");
        std::fs::write(root.join("extra.yaml"), "n: 1\nstray: true\n").unwrap();
        let strict = Cli {
            paths: vec![root.clone()],
            schema: "schema.yaml".to_string(),
            no_strict: false,
            verbose: false,
        };
        assert!(!run(&strict).unwrap());

        let lax = Cli {
            paths: vec![root],
            schema: "schema.yaml".to_string(),
            no_strict: true,
            verbose: false,
        };
        assert!(run(&lax).unwrap());
    }
}
