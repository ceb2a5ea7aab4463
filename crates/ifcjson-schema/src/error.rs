//! # Error Types
//!
//! Every failure a single check can hit, from reading a file to compiling
//! a validator. A document that does not conform to its schema is not an
//! error; see [`crate::ValidationOutcome`].

use std::path::PathBuf;

use thiserror::Error;

/// Error raised while loading, registering or compiling schemas and documents.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The file is missing or unreadable.
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file content is not valid JSON.
    #[error("invalid JSON in '{}': {reason}", path.display())]
    Parse {
        /// Path of the malformed document.
        path: PathBuf,
        /// 1-based line of the first syntax error.
        line: usize,
        /// 1-based column of the first syntax error.
        column: usize,
        /// Parser message.
        reason: String,
    },

    /// A schema identifier is empty or contains a fragment separator.
    #[error("invalid schema identifier '{id}': {reason}")]
    InvalidIdentifier {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A schema was already registered under this identifier.
    #[error("schema '{id}' is already registered")]
    DuplicateSchema {
        /// The conflicting identifier.
        id: String,
    },

    /// Validation referenced an identifier that was never registered.
    #[error("schema '{id}' is not registered")]
    UnregisteredSchema {
        /// The missing identifier.
        id: String,
    },

    /// The schema could not be compiled (bad keyword, unresolvable `$ref`, ...).
    #[error("cannot compile schema '{reference}': {reason}")]
    ValidatorBuild {
        /// Schema reference that was being compiled.
        reference: String,
        /// Compiler message.
        reason: String,
    },
}

impl SchemaError {
    /// Stable machine-readable name of the error class, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read_error",
            Self::Parse { .. } => "parse_error",
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::DuplicateSchema { .. } => "duplicate_schema",
            Self::UnregisteredSchema { .. } => "unregistered_schema",
            Self::ValidatorBuild { .. } => "validator_build_error",
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, err: &serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            line: err.line(),
            column: err.column(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_path() {
        let err = SchemaError::read(
            "schemas/IFC4x2.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        );
        let msg = err.to_string();
        assert!(msg.contains("schemas/IFC4x2.json"), "{msg}");
        assert!(msg.contains("No such file"), "{msg}");
        assert_eq!(err.kind(), "read_error");
    }

    #[test]
    fn parse_error_keeps_position() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": 1,\n}").unwrap_err();
        let err = SchemaError::parse("data.json", &json_err);
        match err {
            SchemaError::Parse { line, column, .. } => {
                assert_eq!(line, 3);
                assert!(column >= 1);
            }
            other => panic!("Expected Parse, got: {other}"),
        }
    }

    #[test]
    fn kinds_are_distinct() {
        let kinds = [
            SchemaError::DuplicateSchema { id: "a".into() }.kind(),
            SchemaError::UnregisteredSchema { id: "a".into() }.kind(),
            SchemaError::ValidatorBuild {
                reference: "a".into(),
                reason: "x".into(),
            }
            .kind(),
        ];
        assert_eq!(kinds, ["duplicate_schema", "unregistered_schema", "validator_build_error"]);
    }
}
