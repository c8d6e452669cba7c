//! # yamlet-cli — Command-Line Schema Validation
//!
//! Validates YAML/JSON data files against yamlet schemas:
//!
//! ```text
//! yamlet data/ -s schema.yaml
//! yamlet config.yaml deploy.yaml --no-strict
//! ```
//!
//! Directories are walked recursively for `*.yaml`/`*.yml`/`*.json` data
//! files; each file's governing schema is the `-s` filename resolved
//! against the file's own directory and its parents, so one invocation can
//! cover a tree of differently-schemed subdirectories. Every result is
//! printed; the process exits 1 when any document is invalid.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from execution ([`run`]).
//! - All validation semantics live in `yamlet-schema`; this crate only
//!   discovers files, caches schemas, and formats process-level output.

pub mod cache;
pub mod run;

pub use crate::run::{run, Cli};
