//! # ifcjson-schema: Schema Linting & Validation
//!
//! Library half of the ifcJSON validation runner. All I/O here is
//! synchronous; the CLI decides how checks are scheduled.
//!
//! ## Lint (`lint`)
//!
//! Strict JSON well-formedness checks for schema and data documents.
//! Failures carry a line/column diagnostic instead of a bare boolean.
//!
//! ## Registry (`registry`)
//!
//! [`SchemaRegistry`] holds schema documents under fixed identifiers
//! (`IFC4x2`, `types`, `entities`, ...) and compiles validators with
//! cross-schema `$ref`s resolved against the registered set only.
//! Validation against an identifier that was never registered fails with
//! [`SchemaError::UnregisteredSchema`].
//!
//! ## Documents (`document`)
//!
//! Reading, parsing and discovery of ifcJSON data files.

pub mod document;
pub mod error;
pub mod lint;
pub mod registry;
pub mod validate;

pub use document::{find_json_files, parse_json, read_json};
pub use error::SchemaError;
pub use lint::{
    lint_bytes, lint_file, lint_schema_bytes, lint_schema_str, lint_str, LintCategory,
    LintDiagnostic, LintVerdict,
};
pub use registry::{SchemaDraft, SchemaReference, SchemaRegistry};
pub use validate::{ValidationOutcome, ValidationViolations, Violation};
