//! # Check Subcommand
//!
//! The validation runner: lint every schema document, register the schema
//! set, validate every data document, report one line per check.
//!
//! ## Scheduling
//!
//! Registration happens synchronously, before any check task exists. The
//! registry is then shared read-only (`Arc<SchemaRegistry>`) with one task
//! per check on a single-threaded runtime; file reads are the suspension
//! points. Reports are collected after every task finished and printed in
//! plan order: schemas first, then documents, then directory contents.
//!
//! ## Failure Policy
//!
//! A read, parse, registration or lookup failure ends only the check it
//! belongs to, as an errored report. Every other check still runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use ifcjson_schema::{
    document, find_json_files, lint_schema_bytes, LintVerdict, SchemaError, SchemaRegistry,
};

use crate::config::{DocumentDirEntry, DocumentEntry, RunManifest, SchemaSourceArgs};
use crate::report::{CheckKind, CheckOutcome, CheckReport, OutputFormat, RunReport};

/// Arguments for the `ifcjson-validate check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SchemaSourceArgs,

    /// Data document to validate (repeatable).
    #[arg(long = "data", value_name = "FILE")]
    pub data: Vec<PathBuf>,

    /// Directory of data documents to validate (repeatable).
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dirs: Vec<PathBuf>,

    /// Schema reference for --data/--data-dir (default: first schema).
    #[arg(long, value_name = "REF")]
    pub schema: Option<String>,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 if every check passed, 1 otherwise.
pub fn run_check(args: &CheckArgs, format: OutputFormat, cwd: &Path) -> Result<u8> {
    let mut manifest = args.source.load(cwd)?;
    let schema = args
        .schema
        .clone()
        .or_else(|| manifest.default_schema().map(str::to_string))
        .context("no schema reference for data documents")?;

    for path in &args.data {
        manifest.documents.push(DocumentEntry {
            path: crate::resolve_path(path, cwd),
            schema: schema.clone(),
            label: None,
        });
    }
    for dir in &args.data_dirs {
        manifest.document_dirs.push(DocumentDirEntry {
            path: crate::resolve_path(dir, cwd),
            schema: schema.clone(),
            label: None,
        });
    }

    if manifest.documents.is_empty() && manifest.document_dirs.is_empty() {
        tracing::warn!("no data documents given; only schema checks will run");
    }

    let report = block_on(run_manifest(&manifest))?;
    report.print(format)?;
    Ok(report.exit_code())
}

/// Run a future to completion on a fresh single-threaded runtime.
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// Register every schema in the manifest.
///
/// Failures are logged and skipped: the schema's lint check reports the
/// problem, and data checks that need it report an unregistered schema.
pub fn build_registry(manifest: &RunManifest) -> SchemaRegistry {
    let mut registry = match manifest.draft {
        Some(draft) => SchemaRegistry::with_draft(draft),
        None => SchemaRegistry::new(),
    };

    for entry in &manifest.schemas {
        if let Err(e) = registry.register_file(&entry.id, &entry.path) {
            tracing::warn!(schema = %entry.id, error = %e, "schema not registered");
        }
    }

    tracing::info!(
        registered = registry.len(),
        declared = manifest.schemas.len(),
        "loaded schema registry"
    );
    registry
}

/// Build the registry and run every check the manifest describes.
pub async fn run_manifest(manifest: &RunManifest) -> RunReport {
    let registry = Arc::new(build_registry(manifest));
    run_checks(manifest, registry).await
}

/// Run every check against an already built registry.
pub async fn run_checks(manifest: &RunManifest, registry: Arc<SchemaRegistry>) -> RunReport {
    let plan = plan_checks(manifest);
    tracing::debug!(checks = plan.len(), "scheduling checks");

    let mut handles = Vec::with_capacity(plan.len());
    for check in plan {
        let label = check.label.clone();
        let kind = check.kind();
        let path = check.path.clone();
        let registry = Arc::clone(&registry);
        let handle = tokio::spawn(async move { check.execute(&registry).await });
        handles.push((label, kind, path, handle));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for (label, kind, path, handle) in handles {
        let report = match handle.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(check = %label, error = %e, "check task failed");
                CheckReport {
                    label,
                    kind,
                    path,
                    outcome: CheckOutcome::Errored {
                        kind: "internal_error".to_string(),
                        reason: format!("check task failed: {e}"),
                    },
                }
            }
        };
        tracing::debug!(check = %report.label, passed = report.passed(), "check finished");
        reports.push(report);
    }

    RunReport::new(reports)
}

enum CheckTask {
    LintSchema,
    Validate { schema: String },
    Resolved(CheckOutcome),
}

struct PlannedCheck {
    label: String,
    path: PathBuf,
    task: CheckTask,
}

impl PlannedCheck {
    fn kind(&self) -> CheckKind {
        match self.task {
            CheckTask::LintSchema => CheckKind::SchemaLint,
            CheckTask::Validate { .. } | CheckTask::Resolved(_) => CheckKind::DataValidation,
        }
    }

    async fn execute(self, registry: &SchemaRegistry) -> CheckReport {
        let kind = self.kind();
        let outcome = match &self.task {
            CheckTask::LintSchema => lint_schema(&self.path).await,
            CheckTask::Validate { schema } => validate_document(registry, &self.path, schema).await,
            CheckTask::Resolved(outcome) => Ok(outcome.clone()),
        };
        match outcome {
            Ok(outcome) => CheckReport {
                label: self.label,
                kind,
                path: self.path,
                outcome,
            },
            Err(e) => CheckReport::errored(self.label, kind, self.path, &e),
        }
    }
}

fn plan_checks(manifest: &RunManifest) -> Vec<PlannedCheck> {
    let mut plan = Vec::new();

    if manifest.lint_schemas {
        for entry in &manifest.schemas {
            plan.push(PlannedCheck {
                label: format!("Schema {}", entry.display_name()),
                path: entry.path.clone(),
                task: CheckTask::LintSchema,
            });
        }
    }

    for doc in &manifest.documents {
        plan.push(PlannedCheck {
            label: doc.label().to_string(),
            path: doc.path.clone(),
            task: CheckTask::Validate {
                schema: doc.schema.clone(),
            },
        });
    }

    for dir in &manifest.document_dirs {
        match find_json_files(&dir.path) {
            Ok(files) => {
                if files.is_empty() {
                    tracing::warn!(dir = %dir.path.display(), "no JSON files found");
                }
                for file in files {
                    let rel = file.strip_prefix(&dir.path).unwrap_or(&file);
                    plan.push(PlannedCheck {
                        label: format!("{} {}", dir.label(), rel.display()),
                        path: file.clone(),
                        task: CheckTask::Validate {
                            schema: dir.schema.clone(),
                        },
                    });
                }
            }
            Err(e) => plan.push(PlannedCheck {
                label: format!("{} {}", dir.label(), dir.path.display()),
                path: dir.path.clone(),
                task: CheckTask::Resolved(CheckOutcome::Errored {
                    kind: e.kind().to_string(),
                    reason: e.to_string(),
                }),
            }),
        }
    }

    plan
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>, SchemaError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SchemaError::Read {
            path: path.to_path_buf(),
            source: e,
        })
}

async fn lint_schema(path: &Path) -> Result<CheckOutcome, SchemaError> {
    let bytes = read_bytes(path).await?;
    Ok(match lint_schema_bytes(&bytes) {
        LintVerdict::Valid => CheckOutcome::Passed,
        LintVerdict::Invalid(diagnostic) => CheckOutcome::LintFailed { diagnostic },
    })
}

async fn validate_document(
    registry: &SchemaRegistry,
    path: &Path,
    schema: &str,
) -> Result<CheckOutcome, SchemaError> {
    let bytes = read_bytes(path).await?;
    let instance = document::parse_json(path, &bytes)?;
    let outcome = registry.validate(schema, &instance)?;

    if outcome.is_valid() {
        return Ok(CheckOutcome::Passed);
    }
    for violation in outcome.violations().violations() {
        tracing::debug!(
            document = %path.display(),
            instance_path = %violation.field_path(),
            schema_path = %violation.schema_path,
            "{}",
            violation.message
        );
    }
    Ok(CheckOutcome::ValidationFailed {
        schema: schema.to_string(),
        violations: outcome.into_violations(),
    })
}
