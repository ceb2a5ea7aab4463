//! # ifcjson-cli: ifcJSON Validation Runner
//!
//! Provides the `ifcjson-validate` command-line interface.
//!
//! ## Subcommands
//!
//! - `ifcjson-validate check`: lint the schema set, register it, validate
//!   data documents against it.
//! - `ifcjson-validate validate`: validate data documents only.
//! - `ifcjson-validate lint`: lint arbitrary JSON files.
//!
//! ```bash
//! ifcjson-validate check --schema-dir schemas --data 7m900_tue_hello_wall_with_door_4.json
//! ifcjson-validate check --manifest fixtures/ifc4x2/ifc4x2.manifest.yaml
//! ifcjson-validate validate --schema-dir schemas samples/IFC_4.0
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: every check passed.
//! - `1`: at least one check failed or errored.
//! - `2`: operational error (bad manifest, bad arguments).
//!
//! ## Crate Policy
//!
//! - Argument parsing lives next to each handler; `main` only dispatches.
//! - Lint/registry/validation logic lives in `ifcjson-schema`.
//! - A failure inside one check never stops the other checks.

pub mod check;
pub mod config;
pub mod lint;
pub mod report;
pub mod validate;

use std::path::{Path, PathBuf};

/// Resolve a path that may be relative to a base directory.
///
/// Absolute paths are returned as-is; relative paths are joined onto `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_path_keeps_absolute() {
        let abs = std::env::temp_dir().join("IFC4x2.json");
        assert_eq!(resolve_path(&abs, Path::new("schemas")), abs);
    }

    #[test]
    fn resolve_path_joins_relative() {
        assert_eq!(
            resolve_path(Path::new("IFC4x2.json"), Path::new("schemas")),
            PathBuf::from("schemas/IFC4x2.json")
        );
    }
}
