//! # JSON Lint
//!
//! Strict well-formedness checks. Trailing commas, comments, single quotes,
//! `NaN` and truncated input are all rejected; the first problem is
//! reported with its position.

use std::fmt;
use std::path::Path;

use serde::de::IgnoredAny;
use serde::Serialize;
use serde_json::error::Category;
use serde_json::Value;

use crate::SchemaError;

/// Class of the first lint problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LintCategory {
    /// Invalid JSON syntax.
    Syntax,
    /// Input ended before the document was complete.
    Eof,
    /// Well-formed JSON of a shape that cannot be used here.
    Data,
}

/// Position and description of the first lint problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintDiagnostic {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// Problem class.
    pub category: LintCategory,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for LintDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl LintDiagnostic {
    fn from_json_error(err: &serde_json::Error) -> Self {
        let category = match err.classify() {
            Category::Eof => LintCategory::Eof,
            Category::Data => LintCategory::Data,
            Category::Syntax | Category::Io => LintCategory::Syntax,
        };
        Self {
            line: err.line(),
            column: err.column(),
            category,
            message: err.to_string(),
        }
    }
}

/// Lint verdict for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintVerdict {
    /// The document is well-formed.
    Valid,
    /// The document is malformed; the diagnostic points at the first problem.
    Invalid(LintDiagnostic),
}

impl LintVerdict {
    /// Returns true for [`LintVerdict::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Lint raw document bytes. JSON text is UTF-8, so invalid UTF-8 is a lint
/// failure like any other syntax error.
pub fn lint_bytes(bytes: &[u8]) -> LintVerdict {
    match serde_json::from_slice::<IgnoredAny>(bytes) {
        Ok(_) => LintVerdict::Valid,
        Err(e) => LintVerdict::Invalid(LintDiagnostic::from_json_error(&e)),
    }
}

/// Lint arbitrary JSON text.
pub fn lint_str(text: &str) -> LintVerdict {
    lint_bytes(text.as_bytes())
}

/// Lint raw bytes that are meant to be a JSON Schema.
///
/// On top of [`lint_bytes`], the root must be an object or a boolean, the
/// only two shapes a schema can take.
pub fn lint_schema_bytes(bytes: &[u8]) -> LintVerdict {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => return LintVerdict::Invalid(LintDiagnostic::from_json_error(&e)),
    };

    match value {
        Value::Object(_) | Value::Bool(_) => LintVerdict::Valid,
        other => LintVerdict::Invalid(LintDiagnostic {
            line: 1,
            column: 1,
            category: LintCategory::Data,
            message: format!(
                "schema root must be an object or a boolean, found {}",
                json_type_name(&other)
            ),
        }),
    }
}

/// Lint JSON text that is meant to be a JSON Schema.
pub fn lint_schema_str(text: &str) -> LintVerdict {
    lint_schema_bytes(text.as_bytes())
}

/// Read a file and lint it as generic JSON.
///
/// # Errors
///
/// Returns [`SchemaError::Read`] if the file cannot be read. A malformed
/// document, including one that is not UTF-8, is not an error; it yields
/// [`LintVerdict::Invalid`].
pub fn lint_file(path: &Path) -> Result<LintVerdict, SchemaError> {
    let bytes = std::fs::read(path).map_err(|e| SchemaError::read(path, e))?;
    Ok(lint_bytes(&bytes))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
