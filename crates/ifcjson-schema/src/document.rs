//! # Documents
//!
//! Loading and discovery of ifcJSON data files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::SchemaError;

/// Parse document bytes that were read from `path`.
///
/// # Errors
///
/// Returns [`SchemaError::Parse`] with the position of the first syntax
/// error. Bytes that are not UTF-8 are a syntax error too.
pub fn parse_json(path: &Path, bytes: &[u8]) -> Result<Value, SchemaError> {
    serde_json::from_slice(bytes).map_err(|e| SchemaError::parse(path, &e))
}

/// Read and parse a JSON document.
///
/// # Errors
///
/// Returns [`SchemaError::Read`] if the file cannot be read and
/// [`SchemaError::Parse`] if it is not valid JSON.
pub fn read_json(path: &Path) -> Result<Value, SchemaError> {
    let bytes = std::fs::read(path).map_err(|e| SchemaError::read(path, e))?;
    parse_json(path, &bytes)
}

/// Recursively find every `*.json` file (case-insensitive extension) under `dir`.
///
/// Results are sorted and free of duplicates. Unreadable subdirectories
/// are logged and skipped.
///
/// # Errors
///
/// Returns [`SchemaError::Read`] if `dir` itself cannot be read.
pub fn find_json_files(dir: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SchemaError::read(dir, e))?;
    let mut seen = HashSet::new();
    let mut acc = Vec::new();
    collect_entries(entries, dir, &mut acc, &mut seen);
    acc.sort();
    Ok(acc)
}

fn walk(dir: &Path, acc: &mut Vec<PathBuf>, seen: &mut HashSet<PathBuf>) {
    match std::fs::read_dir(dir) {
        Ok(entries) => collect_entries(entries, dir, acc, seen),
        Err(e) => {
            tracing::warn!(
                dir = %dir.display(),
                error = %e,
                "failed to read directory during file walk"
            );
        }
    }
}

fn collect_entries(
    entries: std::fs::ReadDir,
    dir: &Path,
    acc: &mut Vec<PathBuf>,
    seen: &mut HashSet<PathBuf>,
) {
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            walk(&path, acc, seen);
        } else if is_json_file(&path) && seen.insert(path.clone()) {
            acc.push(path);
        }
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
