//! # Reports
//!
//! One [`CheckReport`] per check, collected into a [`RunReport`].
//!
//! Text lines keep the established console format:
//!
//! ```text
//! Schema ifcJSON Valid!
//! Schema types Invalid
//!   line 12, column 3: trailing comma at line 12 column 3
//! IFC JSON file Invalid: /data/0/GlobalId "GlobalId" is a required property
//! IFC JSON file Error: cannot read 'wall.json': No such file or directory (os error 2)
//! Checks: 2/4 passed
//! ```

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use ifcjson_schema::{LintDiagnostic, SchemaError, ValidationViolations};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per check plus a summary.
    #[default]
    Text,
    /// A single pretty-printed JSON run report.
    Json,
}

/// What a check does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// JSON well-formedness of a schema document.
    SchemaLint,
    /// JSON well-formedness of an arbitrary file.
    FileLint,
    /// Conformance of a data document to a schema reference.
    DataValidation,
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Lint clean, or the document conforms.
    Passed,
    /// The file is not well-formed.
    LintFailed {
        /// First lint problem.
        diagnostic: LintDiagnostic,
    },
    /// The document does not conform to its schema.
    ValidationFailed {
        /// Schema reference validated against.
        schema: String,
        /// Every violation found.
        violations: ValidationViolations,
    },
    /// The check could not run to a verdict.
    Errored {
        /// Error class (`read_error`, `parse_error`, `unregistered_schema`, ...).
        kind: String,
        /// Human-readable reason.
        reason: String,
    },
}

/// Outcome of one check with the label it is reported under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    /// Report label (`Schema types`, `IFC JSON file`, ...).
    pub label: String,
    /// Check kind.
    pub kind: CheckKind,
    /// File the check looked at.
    pub path: PathBuf,
    /// Verdict.
    pub outcome: CheckOutcome,
}

impl CheckReport {
    /// Report for a check that ended in an error.
    pub fn errored(label: String, kind: CheckKind, path: PathBuf, error: &SchemaError) -> Self {
        Self {
            label,
            kind,
            path,
            outcome: CheckOutcome::Errored {
                kind: error.kind().to_string(),
                reason: error.to_string(),
            },
        }
    }

    /// True if the check passed.
    pub fn passed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Passed)
    }

    /// True if the check could not reach a verdict.
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Errored { .. })
    }

    /// Console rendering; may span several lines.
    pub fn render_text(&self) -> String {
        match &self.outcome {
            CheckOutcome::Passed => format!("{} Valid!", self.label),
            CheckOutcome::LintFailed { diagnostic } => {
                format!("{} Invalid\n  {diagnostic}", self.label)
            }
            CheckOutcome::ValidationFailed { violations, .. } => {
                format!("{} Invalid: {}", self.label, violations.errors_text())
            }
            CheckOutcome::Errored { reason, .. } => format!("{} Error: {reason}", self.label),
        }
    }
}

/// All checks of one run, in plan order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Individual check reports.
    pub checks: Vec<CheckReport>,
    /// Number of checks.
    pub total: usize,
    /// Checks that passed.
    pub passed: usize,
    /// Checks with a lint or validation failure.
    pub failed: usize,
    /// Checks that errored.
    pub errored: usize,
}

impl RunReport {
    /// Tally a list of check reports.
    pub fn new(checks: Vec<CheckReport>) -> Self {
        let total = checks.len();
        let passed = checks.iter().filter(|c| c.passed()).count();
        let errored = checks.iter().filter(|c| c.is_error()).count();
        Self {
            checks,
            total,
            passed,
            failed: total - passed - errored,
            errored,
        }
    }

    /// 0 when every check passed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.passed == self.total {
            0
        } else {
            1
        }
    }

    /// Text rendering: every check followed by a summary line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for check in &self.checks {
            out.push_str(&check.render_text());
            out.push('\n');
        }
        out.push_str(&format!("Checks: {}/{} passed", self.passed, self.total));
        if self.errored > 0 {
            out.push_str(&format!(" ({} errored)", self.errored));
        }
        out
    }

    /// Print to stdout in the requested format.
    pub fn print(&self, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Text => println!("{}", self.render_text()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(self)?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifcjson_schema::{lint_str, LintVerdict, Violation};

    fn report(label: &str, kind: CheckKind, outcome: CheckOutcome) -> CheckReport {
        CheckReport {
            label: label.to_string(),
            kind,
            path: PathBuf::from("IFC4x2.json"),
            outcome,
        }
    }

    fn global_id_violations() -> ValidationViolations {
        ValidationViolations::from(vec![Violation {
            instance_path: "/data/0".to_string(),
            schema_path: "/allOf/0/then/required".to_string(),
            message: "\"GlobalId\" is a required property".to_string(),
            missing_property: Some("GlobalId".to_string()),
        }])
    }

    #[test]
    fn passed_lines() {
        let lint = report("Schema IFC4x2", CheckKind::SchemaLint, CheckOutcome::Passed);
        assert_eq!(lint.render_text(), "Schema IFC4x2 Valid!");
        let data = report("IFC JSON file", CheckKind::DataValidation, CheckOutcome::Passed);
        assert_eq!(data.render_text(), "IFC JSON file Valid!");
    }

    #[test]
    fn lint_failure_line_has_diagnostic() {
        let diagnostic = match lint_str("{\"a\": 1,}") {
            LintVerdict::Invalid(d) => d,
            LintVerdict::Valid => panic!("Expected Invalid"),
        };
        let r = report(
            "Schema types",
            CheckKind::SchemaLint,
            CheckOutcome::LintFailed { diagnostic },
        );
        let text = r.render_text();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Schema types Invalid"));
        assert!(lines.next().unwrap().starts_with("  line 1, column"));
    }

    #[test]
    fn validation_failure_line() {
        let r = report(
            "IFC JSON file",
            CheckKind::DataValidation,
            CheckOutcome::ValidationFailed {
                schema: "IFC4x2".to_string(),
                violations: global_id_violations(),
            },
        );
        assert_eq!(
            r.render_text(),
            r#"IFC JSON file Invalid: /data/0/GlobalId "GlobalId" is a required property"#
        );
    }

    #[test]
    fn errored_line_and_kind() {
        let err = SchemaError::UnregisteredSchema {
            id: "IFC4x2".to_string(),
        };
        let r = CheckReport::errored(
            "IFC JSON file".to_string(),
            CheckKind::DataValidation,
            PathBuf::from("wall.json"),
            &err,
        );
        assert!(r.is_error());
        assert_eq!(r.render_text(), "IFC JSON file Error: schema 'IFC4x2' is not registered");
    }

    #[test]
    fn run_report_tally_and_exit_code() {
        let all_good = RunReport::new(vec![
            report("Schema IFC4x2", CheckKind::SchemaLint, CheckOutcome::Passed),
            report("IFC JSON file", CheckKind::DataValidation, CheckOutcome::Passed),
        ]);
        assert_eq!(all_good.exit_code(), 0);
        assert!(all_good.render_text().ends_with("Checks: 2/2 passed"));

        let mixed = RunReport::new(vec![
            report("Schema IFC4x2", CheckKind::SchemaLint, CheckOutcome::Passed),
            report(
                "IFC JSON file",
                CheckKind::DataValidation,
                CheckOutcome::ValidationFailed {
                    schema: "IFC4x2".to_string(),
                    violations: global_id_violations(),
                },
            ),
            report(
                "Schema types",
                CheckKind::SchemaLint,
                CheckOutcome::Errored {
                    kind: "read_error".to_string(),
                    reason: "cannot read".to_string(),
                },
            ),
        ]);
        assert_eq!((mixed.total, mixed.passed, mixed.failed, mixed.errored), (3, 1, 1, 1));
        assert_eq!(mixed.exit_code(), 1);
        assert!(mixed.render_text().ends_with("Checks: 1/3 passed (1 errored)"));
    }

    #[test]
    fn empty_run_passes() {
        let empty = RunReport::new(Vec::new());
        assert_eq!(empty.exit_code(), 0);
    }

    #[test]
    fn json_shape() {
        let run = RunReport::new(vec![report(
            "IFC JSON file",
            CheckKind::DataValidation,
            CheckOutcome::ValidationFailed {
                schema: "IFC4x2".to_string(),
                violations: global_id_violations(),
            },
        )]);
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["failed"], 1);
        let check = &value["checks"][0];
        assert_eq!(check["kind"], "data_validation");
        assert_eq!(check["outcome"]["status"], "validation_failed");
        assert_eq!(check["outcome"]["violations"][0]["missing_property"], "GlobalId");
    }
}
