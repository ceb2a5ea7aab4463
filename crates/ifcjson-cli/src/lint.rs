//! # Lint Subcommand
//!
//! Strict JSON well-formedness check for arbitrary files, one report line
//! per file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use ifcjson_schema::{lint_file, LintVerdict};

use crate::report::{CheckKind, CheckOutcome, CheckReport, OutputFormat, RunReport};

/// Arguments for the `ifcjson-validate lint` subcommand.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// JSON files to lint.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

/// Execute the lint subcommand.
///
/// Returns exit code: 0 if every file is well-formed, 1 otherwise.
pub fn run_lint(args: &LintArgs, format: OutputFormat, cwd: &Path) -> Result<u8> {
    let report = lint_paths(&args.paths, cwd);
    report.print(format)?;
    Ok(report.exit_code())
}

fn lint_paths(paths: &[PathBuf], cwd: &Path) -> RunReport {
    let checks = paths
        .iter()
        .map(|path| {
            let resolved = crate::resolve_path(path, cwd);
            let label = path.display().to_string();
            match lint_file(&resolved) {
                Ok(LintVerdict::Valid) => CheckReport {
                    label,
                    kind: CheckKind::FileLint,
                    path: resolved,
                    outcome: CheckOutcome::Passed,
                },
                Ok(LintVerdict::Invalid(diagnostic)) => CheckReport {
                    label,
                    kind: CheckKind::FileLint,
                    path: resolved,
                    outcome: CheckOutcome::LintFailed { diagnostic },
                },
                Err(e) => CheckReport::errored(label, CheckKind::FileLint, resolved, &e),
            }
        })
        .collect();
    RunReport::new(checks)
}
