//! # Validation Results
//!
//! Structured outcome of checking one document against one schema
//! reference. A failed validation is data, not an error: callers get the
//! verdict and the full violation list from a single validator pass.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use serde::Serialize;
use serde_json::Value;

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
    /// Name of the absent property for `required` violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_property: Option<String>,
}

impl Violation {
    pub(crate) fn from_error(error: &ValidationError<'_>) -> Self {
        let missing_property = match &error.kind {
            ValidationErrorKind::Required { property } => Some(match property {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            _ => None,
        };
        Self {
            instance_path: error.instance_path.to_string(),
            schema_path: error.schema_path.to_string(),
            message: error.to_string(),
            missing_property,
        }
    }

    /// Path of the offending field.
    ///
    /// Same as `instance_path`, except that a missing required property
    /// points at where the property should have been
    /// (`/data/0` + `GlobalId` → `/data/0/GlobalId`).
    pub fn field_path(&self) -> String {
        match &self.missing_property {
            Some(property) => format!("{}/{}", self.instance_path, escape_pointer_token(property)),
            None => self.instance_path.clone(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.field_path();
        if path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", path, self.message)
        }
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Collection of validation violations, in validator order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Single-line rendering: `<field path> <message>` joined by `, `.
    pub fn errors_text(&self) -> String {
        self.violations
            .iter()
            .map(|v| {
                let path = v.field_path();
                if path.is_empty() {
                    format!("(root) {}", v.message)
                } else {
                    format!("{path} {}", v.message)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Outcome of validating one document against one schema reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    reference: String,
    violations: ValidationViolations,
}

impl ValidationOutcome {
    pub(crate) fn new(reference: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self {
            reference: reference.into(),
            violations: violations.into(),
        }
    }

    /// True when the document conforms (no violations).
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Schema reference the document was validated against.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Violations in validator order; empty when valid.
    pub fn violations(&self) -> &ValidationViolations {
        &self.violations
    }

    /// Consumes self and returns the violations.
    pub fn into_violations(self) -> ValidationViolations {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(path: &str, property: &str) -> Violation {
        Violation {
            instance_path: path.to_string(),
            schema_path: "/required".to_string(),
            message: format!("\"{property}\" is a required property"),
            missing_property: Some(property.to_string()),
        }
    }

    #[test]
    fn field_path_appends_missing_property() {
        assert_eq!(required("/data/0", "GlobalId").field_path(), "/data/0/GlobalId");
        assert_eq!(required("", "data").field_path(), "/data");
    }

    #[test]
    fn field_path_escapes_pointer_characters() {
        assert_eq!(required("", "a/b~c").field_path(), "/a~1b~0c");
    }

    #[test]
    fn test_violation_display_format() {
        let v = Violation {
            instance_path: "/data/0/GlobalId".to_string(),
            schema_path: "/definitions/IfcGloballyUniqueId/pattern".to_string(),
            message: r#""short" does not match "^[0-9A-Za-z_$]{22}$""#.to_string(),
            missing_property: None,
        };
        let display = v.to_string();
        assert!(display.contains("/data/0/GlobalId"));
        assert!(display.contains("does not match"));
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/type".to_string(),
            message: r#"[] is not of type "object""#.to_string(),
            missing_property: None,
        };
        assert!(v.to_string().contains("(root)"));
    }

    #[test]
    fn errors_text_joins_with_commas() {
        let violations = ValidationViolations::from(vec![
            required("/data/0", "GlobalId"),
            required("/data/1", "Class"),
        ]);
        let text = violations.errors_text();
        assert_eq!(
            text,
            r#"/data/0/GlobalId "GlobalId" is a required property, /data/1/Class "Class" is a required property"#
        );
    }

    #[test]
    fn outcome_validity_follows_violations() {
        assert!(ValidationOutcome::new("IFC4x2", vec![]).is_valid());
        let invalid = ValidationOutcome::new("IFC4x2", vec![required("", "data")]);
        assert!(!invalid.is_valid());
        assert_eq!(invalid.reference(), "IFC4x2");
        assert_eq!(invalid.into_violations().len(), 1);
    }
}
