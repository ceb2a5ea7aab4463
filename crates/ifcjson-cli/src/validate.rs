//! # Validate Subcommand
//!
//! Validates data documents against the registered schema set without
//! linting the schemas themselves. Directories are searched for `*.json`
//! files, each of which becomes its own check.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::check::{block_on, run_manifest};
use crate::config::SchemaSourceArgs;
use crate::report::OutputFormat;

/// Arguments for the `ifcjson-validate validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SchemaSourceArgs,

    /// Schema reference to validate against (default: first schema).
    #[arg(long, value_name = "REF")]
    pub schema: Option<String>,

    /// Data documents or directories of data documents.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 if every document conforms, 1 otherwise.
pub fn run_validate(args: &ValidateArgs, format: OutputFormat, cwd: &Path) -> Result<u8> {
    let mut manifest = args.source.load(cwd)?;
    manifest.lint_schemas = false;
    // Documents listed in a manifest are replaced by the command line paths.
    manifest.documents.clear();
    manifest.document_dirs.clear();

    let schema = args
        .schema
        .clone()
        .or_else(|| manifest.default_schema().map(str::to_string))
        .context("no schema reference to validate against")?;

    for path in &args.paths {
        manifest.add_data(crate::resolve_path(path, cwd), &schema);
    }

    let report = block_on(run_manifest(&manifest))?;
    report.print(format)?;
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_root() -> PathBuf {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop(); // crates
        dir.pop(); // repo root
        dir
    }

    fn args(paths: Vec<PathBuf>, schema: Option<&str>) -> ValidateArgs {
        ValidateArgs {
            source: SchemaSourceArgs {
                manifest: Some(PathBuf::from("fixtures/ifc4x2/ifc4x2.manifest.yaml")),
                schema_dir: PathBuf::from("."),
                prefix: "IFC4x2".to_string(),
                draft: None,
            },
            schema: schema.map(str::to_string),
            paths,
        }
    }

    #[test]
    fn conforming_fixture_exits_zero() {
        let root = repo_root();
        let a = args(vec![PathBuf::from("fixtures/ifc4x2/hello-wall.json")], None);
        assert_eq!(run_validate(&a, OutputFormat::Text, &root).unwrap(), 0);
    }

    #[test]
    fn missing_global_id_exits_one() {
        let root = repo_root();
        let a = args(
            vec![PathBuf::from("fixtures/ifc4x2/hello-wall-missing-globalid.json")],
            Some("IFC4x2"),
        );
        assert_eq!(run_validate(&a, OutputFormat::Json, &root).unwrap(), 1);
    }

    #[test]
    fn subschema_reference() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("wall.json"),
            br#"{"Class": "IfcWall", "GlobalId": "0meHXtOwHDhwxSDf2okNDz"}"#,
        )
        .unwrap();
        let mut a = args(
            vec![dir.path().join("wall.json")],
            Some("entities#/definitions/IfcWall"),
        );
        a.source.manifest = Some(repo_root().join("fixtures/ifc4x2/ifc4x2.manifest.yaml"));
        assert_eq!(run_validate(&a, OutputFormat::Text, dir.path()).unwrap(), 0);
    }

    #[test]
    fn missing_manifest_is_operational_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(vec![PathBuf::from("x.json")], None);
        assert!(run_validate(&a, OutputFormat::Text, dir.path()).is_err());
    }
}
