//! # Run Manifest
//!
//! Which schemas to lint and register, and which data documents to validate
//! against which schema reference. Loaded from a YAML (or JSON) file, or
//! built from the conventional `<prefix>.json`, `<prefix>-types.json`,
//! `<prefix>-entities.json` layout of a schema directory.
//!
//! ```yaml
//! draft: draft7
//! schemas:
//!   - id: IFC4x2
//!     path: IFC4x2.json
//!     name: ifcJSON
//!   - id: types
//!     path: IFC4x2-types.json
//!   - id: entities
//!     path: IFC4x2-entities.json
//! documents:
//!   - path: 7m900_tue_hello_wall_with_door_4.json
//!     schema: IFC4x2
//! document_dirs:
//!   - path: samples/IFC_4.0
//!     schema: IFC4x2
//! ```
//!
//! Relative paths resolve against the manifest's own directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use ifcjson_schema::SchemaDraft;

use crate::resolve_path;

/// Label used for data document checks when the manifest names none.
pub const DEFAULT_DOCUMENT_LABEL: &str = "IFC JSON file";

/// Default schema set prefix.
pub const DEFAULT_PREFIX: &str = "IFC4x2";

/// One schema document to lint and register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaEntry {
    /// Registry identifier.
    pub id: String,
    /// Schema file.
    pub path: PathBuf,
    /// Name shown in lint lines; defaults to `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SchemaEntry {
    /// Name shown in `Schema <name> Valid!` lines.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// One data document to validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentEntry {
    /// Data file.
    pub path: PathBuf,
    /// Schema reference (`IFC4x2`, `entities#/definitions/IfcWall`, ...).
    pub schema: String,
    /// Report label; defaults to [`DEFAULT_DOCUMENT_LABEL`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DocumentEntry {
    /// Label shown in report lines.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_DOCUMENT_LABEL)
    }
}

/// A directory whose `*.json` files are each validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentDirEntry {
    /// Directory searched recursively.
    pub path: PathBuf,
    /// Schema reference applied to every file found.
    pub schema: String,
    /// Label prefix; each file's relative path is appended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DocumentDirEntry {
    /// Label prefix shown in report lines.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_DOCUMENT_LABEL)
    }
}

fn default_lint_schemas() -> bool {
    true
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunManifest {
    /// JSON Schema draft override for every schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<SchemaDraft>,
    /// Whether schema documents get their own lint checks.
    #[serde(default = "default_lint_schemas")]
    pub lint_schemas: bool,
    /// Schema set, in report order.
    pub schemas: Vec<SchemaEntry>,
    /// Individual data documents.
    #[serde(default)]
    pub documents: Vec<DocumentEntry>,
    /// Directories of data documents.
    #[serde(default)]
    pub document_dirs: Vec<DocumentDirEntry>,
}

impl RunManifest {
    /// The conventional three-file schema set in `schema_dir`:
    /// `<prefix>.json` as `<prefix>`, `<prefix>-types.json` as `types`,
    /// `<prefix>-entities.json` as `entities`.
    pub fn standard(schema_dir: &Path, prefix: &str) -> Self {
        Self {
            draft: None,
            lint_schemas: true,
            schemas: vec![
                SchemaEntry {
                    id: prefix.to_string(),
                    path: schema_dir.join(format!("{prefix}.json")),
                    name: None,
                },
                SchemaEntry {
                    id: "types".to_string(),
                    path: schema_dir.join(format!("{prefix}-types.json")),
                    name: None,
                },
                SchemaEntry {
                    id: "entities".to_string(),
                    path: schema_dir.join(format!("{prefix}-entities.json")),
                    name: None,
                },
            ],
            documents: Vec::new(),
            document_dirs: Vec::new(),
        }
    }

    /// Load a manifest file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read manifest {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base).with_context(|| format!("invalid manifest {}", path.display()))
    }

    /// Parse manifest text, resolving relative paths against `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Self> {
        let mut manifest: Self = serde_yaml::from_str(text).context("malformed manifest")?;
        manifest.resolve_paths(base);
        manifest.check()?;
        Ok(manifest)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for schema in &mut self.schemas {
            schema.path = resolve_path(&schema.path, base);
        }
        for doc in &mut self.documents {
            doc.path = resolve_path(&doc.path, base);
        }
        for dir in &mut self.document_dirs {
            dir.path = resolve_path(&dir.path, base);
        }
    }

    /// Reject manifests that cannot describe a run.
    ///
    /// Unknown schema references on documents are allowed here; they
    /// surface as errored checks so the rest of the run still happens.
    pub fn check(&self) -> Result<()> {
        ensure!(!self.schemas.is_empty(), "manifest declares no schemas");

        let mut seen = HashSet::new();
        for schema in &self.schemas {
            ensure!(!schema.id.is_empty(), "schema at {} has an empty id", schema.path.display());
            if !seen.insert(schema.id.as_str()) {
                bail!("schema id '{}' is declared more than once", schema.id);
            }
        }

        for doc in &self.documents {
            ensure!(
                !doc.schema.is_empty(),
                "document {} has an empty schema reference",
                doc.path.display()
            );
        }
        for dir in &self.document_dirs {
            ensure!(
                !dir.schema.is_empty(),
                "document directory {} has an empty schema reference",
                dir.path.display()
            );
        }
        Ok(())
    }

    /// Reference used for data documents added from the command line:
    /// the first schema in the set.
    pub fn default_schema(&self) -> Option<&str> {
        self.schemas.first().map(|s| s.id.as_str())
    }

    /// Add a data path: directories are searched, anything else is a single
    /// document (a missing path becomes a read error at check time).
    pub fn add_data(&mut self, path: PathBuf, schema: &str) {
        if path.is_dir() {
            self.document_dirs.push(DocumentDirEntry {
                path,
                schema: schema.to_string(),
                label: None,
            });
        } else {
            self.documents.push(DocumentEntry {
                path,
                schema: schema.to_string(),
                label: None,
            });
        }
    }
}

/// Where the schema set comes from.
#[derive(Args, Debug, Clone)]
pub struct SchemaSourceArgs {
    /// Run manifest (YAML or JSON) listing schemas and documents.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Directory holding the schema set when no manifest is given.
    #[arg(long, value_name = "DIR", default_value = ".", conflicts_with = "manifest")]
    pub schema_dir: PathBuf,

    /// File name prefix of the schema set.
    #[arg(long, default_value = DEFAULT_PREFIX, conflicts_with = "manifest")]
    pub prefix: String,

    /// JSON Schema draft for every schema (draft4 ... draft2020-12).
    #[arg(long, value_name = "DRAFT")]
    pub draft: Option<SchemaDraft>,
}

impl SchemaSourceArgs {
    /// Build the manifest these arguments describe.
    pub fn load(&self, cwd: &Path) -> Result<RunManifest> {
        let mut manifest = match &self.manifest {
            Some(path) => RunManifest::load(&resolve_path(path, cwd))?,
            None => {
                let manifest = RunManifest::standard(&resolve_path(&self.schema_dir, cwd), &self.prefix);
                manifest.check()?;
                manifest
            }
        };
        if self.draft.is_some() {
            manifest.draft = self.draft;
        }
        Ok(manifest)
    }
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

    #[test]
    fn standard_layout_uses_fixed_ids() {
        let manifest = RunManifest::standard(Path::new("schemas"), "IFC4x2");
        let ids: Vec<&str> = manifest.schemas.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["IFC4x2", "types", "entities"]);
        assert_eq!(manifest.schemas[1].path, PathBuf::from("schemas/IFC4x2-types.json"));
        assert_eq!(manifest.default_schema(), Some("IFC4x2"));
        assert!(manifest.lint_schemas);
        manifest.check().unwrap();
    }

    #[test]
    fn parse_resolves_relative_paths() {
        let text = r#"
schemas:
  - id: IFC4x2
    path: IFC4x2.json
    name: ifcJSON
documents:
  - path: data/wall.json
    schema: IFC4x2
document_dirs:
  - path: /abs/samples
    schema: IFC4x2
    label: Sample
"#;
        let manifest = RunManifest::parse(text, Path::new("/repo/schemas")).unwrap();
        assert_eq!(manifest.schemas[0].path, PathBuf::from("/repo/schemas/IFC4x2.json"));
        assert_eq!(manifest.schemas[0].display_name(), "ifcJSON");
        assert_eq!(manifest.documents[0].path, PathBuf::from("/repo/schemas/data/wall.json"));
        assert_eq!(manifest.documents[0].label(), DEFAULT_DOCUMENT_LABEL);
        assert_eq!(manifest.document_dirs[0].path, PathBuf::from("/abs/samples"));
        assert_eq!(manifest.document_dirs[0].label(), "Sample");
        assert!(manifest.lint_schemas);
        assert_eq!(manifest.draft, None);
    }

    #[test]
    fn parse_accepts_json_manifest() {
        let text = r#"{"draft": "draft7", "lint_schemas": false,
            "schemas": [{"id": "types", "path": "t.json"}]}"#;
        let manifest = RunManifest::parse(text, Path::new(".")).unwrap();
        assert_eq!(manifest.draft, Some(SchemaDraft::Draft7));
        assert!(!manifest.lint_schemas);
        assert!(manifest.documents.is_empty());
    }

    #[test]
    fn unknown_keys_rejected() {
        let text = "schemas: []\nvalidators: []\n";
        assert!(RunManifest::parse(text, Path::new(".")).is_err());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let text = r#"
schemas:
  - id: types
    path: a.json
  - id: types
    path: b.json
"#;
        let err = RunManifest::parse(text, Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains("more than once"), "{err:#}");
    }

    #[test]
    fn empty_schema_list_rejected() {
        assert!(RunManifest::parse("schemas: []\n", Path::new(".")).is_err());
    }

    #[test]
    fn add_data_splits_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = RunManifest::standard(dir.path(), "IFC4x2");
        manifest.add_data(dir.path().to_path_buf(), "IFC4x2");
        manifest.add_data(dir.path().join("wall.json"), "entities#/definitions/IfcWall");
        assert_eq!(manifest.document_dirs.len(), 1);
        assert_eq!(manifest.documents.len(), 1);
        assert_eq!(manifest.documents[0].schema, "entities#/definitions/IfcWall");
    }

    #[test]
    fn load_fixture_manifest() {
        let path = repo_root().join("fixtures/ifc4x2/ifc4x2.manifest.yaml");
        let manifest = RunManifest::load(&path).unwrap();
        assert_eq!(manifest.schemas.len(), 3);
        assert_eq!(manifest.draft, Some(SchemaDraft::Draft7));
        assert!(manifest.schemas.iter().all(|s| s.path.is_file()), "{manifest:?}");
        assert!(manifest.documents[0].path.is_file());
    }

    #[test]
    fn load_missing_manifest_names_path() {
        let err = RunManifest::load(Path::new("/tmp/ifcjson-no-such-manifest.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("ifcjson-no-such-manifest.yaml"));
    }
}
