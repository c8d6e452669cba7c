//! # yamlet-core — Foundational Types for yamlet
//!
//! This crate is the bedrock of the yamlet workspace. It defines the generic
//! nested document model that both schema sources and data documents are
//! parsed into, along with the dotted-path type used to address nodes inside
//! a document and the readers that produce documents from YAML/JSON text.
//! Every other crate in the workspace depends on `yamlet-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One `Value` type for everything.** Schema documents and data
//!    documents share the same representation. The schema layer never sees
//!    `serde_yaml` or `serde_json` types directly.
//!
//! 2. **Scalar resolution happens at the boundary.** YAML 1.1 dates and
//!    timestamps are resolved into `Date`/`DateTime` scalars while
//!    converting from the underlying parser's value tree, so validators only
//!    ever inspect typed scalars.
//!
//! 3. **Insertion order is preserved.** Mappings are stored as ordered
//!    key/value pairs so error reports follow document order.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `yamlet-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod path;
pub mod reader;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use path::{DataPath, PathSegment};
pub use reader::{read_file, read_json_str, read_str, ReaderError};
pub use value::Value;
