//! # Schema Registry
//!
//! Holds schema documents under fixed identifiers and compiles validators
//! against them.
//!
//! ## Registration
//!
//! Registration takes `&mut self`, validation takes `&self`. Build the
//! registry first, then share it (`Arc<SchemaRegistry>`) with whatever
//! runs the checks; from that point on it is read-only.
//!
//! ## Schema Resolution
//!
//! Schemas refer to each other the way the ifcJSON schema set does:
//! `"$ref": "types#/definitions/IfcLabel"`, by file name
//! (`"IFC4x2-types.json#/..."`), or through an absolute `$id`. Relative
//! references resolve against the default base URI and reach the local
//! retriever as `json-schema:///types`; the retriever matches the full
//! URI, then its last path segment, then that segment without `.json`,
//! against every registered identifier, source file name and `$id`.
//!
//! Nothing is fetched over the network. A reference that matches no
//! registered schema fails compilation with
//! [`SchemaError::ValidatorBuild`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use jsonschema::{Draft, Retrieve, Uri, Validator};
use parking_lot::RwLock;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validate::{ValidationOutcome, Violation};
use crate::{document, SchemaError};

/// JSON Schema draft override. Without one, the draft is detected from
/// each schema's `$schema` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaDraft {
    /// Draft 4.
    #[serde(rename = "draft4")]
    Draft4,
    /// Draft 6.
    #[serde(rename = "draft6")]
    Draft6,
    /// Draft 7 (ifcJSON schemas).
    #[serde(rename = "draft7")]
    Draft7,
    /// Draft 2019-09.
    #[serde(rename = "draft2019-09")]
    Draft201909,
    /// Draft 2020-12.
    #[serde(rename = "draft2020-12")]
    Draft202012,
}

impl From<SchemaDraft> for Draft {
    fn from(draft: SchemaDraft) -> Self {
        match draft {
            SchemaDraft::Draft4 => Draft::Draft4,
            SchemaDraft::Draft6 => Draft::Draft6,
            SchemaDraft::Draft7 => Draft::Draft7,
            SchemaDraft::Draft201909 => Draft::Draft201909,
            SchemaDraft::Draft202012 => Draft::Draft202012,
        }
    }
}

impl FromStr for SchemaDraft {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft4" => Ok(Self::Draft4),
            "draft6" => Ok(Self::Draft6),
            "draft7" => Ok(Self::Draft7),
            "draft2019-09" => Ok(Self::Draft201909),
            "draft2020-12" => Ok(Self::Draft202012),
            other => Err(format!(
                "unknown draft '{other}' (expected draft4, draft6, draft7, draft2019-09 or draft2020-12)"
            )),
        }
    }
}

/// A schema reference: `<identifier>` or `<identifier>#<json-pointer>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaReference<'a> {
    /// Registered identifier.
    pub id: &'a str,
    /// JSON Pointer into the registered schema, if any.
    pub pointer: Option<&'a str>,
}

impl<'a> SchemaReference<'a> {
    /// Split a reference string. An empty fragment (`"IFC4x2#"`) selects
    /// the whole schema.
    pub fn parse(reference: &'a str) -> Self {
        match reference.split_once('#') {
            Some((id, pointer)) if !pointer.is_empty() => Self {
                id,
                pointer: Some(pointer),
            },
            Some((id, _)) => Self { id, pointer: None },
            None => Self {
                id: reference,
                pointer: None,
            },
        }
    }
}

#[derive(Debug)]
struct RegisteredSchema {
    value: Value,
    source: Option<PathBuf>,
}

/// Identifier-keyed set of schema documents.
pub struct SchemaRegistry {
    schemas: BTreeMap<String, RegisteredSchema>,
    draft: Option<SchemaDraft>,
    compiled: RwLock<HashMap<String, Arc<Validator>>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("ids", &self.ids())
            .field("draft", &self.draft)
            .field("compiled", &self.compiled.read().len())
            .finish()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Empty registry; drafts are detected from `$schema`.
    pub fn new() -> Self {
        Self {
            schemas: BTreeMap::new(),
            draft: None,
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Empty registry that compiles every schema under `draft`.
    pub fn with_draft(draft: SchemaDraft) -> Self {
        Self {
            draft: Some(draft),
            ..Self::new()
        }
    }

    /// Register a parsed schema under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidIdentifier`] for an empty identifier or
    /// one containing `#`, `/`, `\` or whitespace, and
    /// [`SchemaError::DuplicateSchema`] if `id` is already taken.
    pub fn register(&mut self, id: &str, schema: Value) -> Result<(), SchemaError> {
        self.insert(id, schema, None)
    }

    /// Read, parse and register the schema file at `path` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Read`] or [`SchemaError::Parse`] if the file
    /// cannot be loaded, otherwise the same errors as [`register`](Self::register).
    pub fn register_file(&mut self, id: &str, path: &Path) -> Result<(), SchemaError> {
        check_identifier(id)?;
        if self.schemas.contains_key(id) {
            return Err(SchemaError::DuplicateSchema { id: id.to_string() });
        }
        let value = document::read_json(path)?;
        self.insert(id, value, Some(path.to_path_buf()))
    }

    fn insert(
        &mut self,
        id: &str,
        value: Value,
        source: Option<PathBuf>,
    ) -> Result<(), SchemaError> {
        check_identifier(id)?;
        if self.schemas.contains_key(id) {
            return Err(SchemaError::DuplicateSchema { id: id.to_string() });
        }
        tracing::debug!(
            schema = id,
            source = ?source,
            "registered schema"
        );
        self.schemas
            .insert(id.to_string(), RegisteredSchema { value, source });
        // A new schema can change how existing references resolve.
        self.compiled.get_mut().clear();
        Ok(())
    }

    /// Returns true if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Look up a registered schema document.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.schemas.get(id).map(|s| &s.value)
    }

    /// File a schema was registered from, if it came from disk.
    pub fn source(&self, id: &str) -> Option<&Path> {
        self.schemas.get(id).and_then(|s| s.source.as_deref())
    }

    /// Compile (or fetch from cache) the validator for a schema reference.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnregisteredSchema`] if the identifier is not
    /// registered and [`SchemaError::ValidatorBuild`] if the pointer does
    /// not exist or the schema does not compile.
    pub fn compile(&self, reference: &str) -> Result<Arc<Validator>, SchemaError> {
        let parsed = SchemaReference::parse(reference);
        let entry = self
            .schemas
            .get(parsed.id)
            .ok_or_else(|| SchemaError::UnregisteredSchema {
                id: parsed.id.to_string(),
            })?;

        if let Some(validator) = self.compiled.read().get(reference) {
            return Ok(Arc::clone(validator));
        }

        let root = match parsed.pointer {
            None => entry.value.clone(),
            Some(pointer) => pointer_wrapper(parsed.id, pointer, &entry.value).ok_or_else(|| {
                SchemaError::ValidatorBuild {
                    reference: reference.to_string(),
                    reason: format!("pointer '{pointer}' does not exist in schema '{}'", parsed.id),
                }
            })?,
        };

        let mut opts = jsonschema::options();
        if let Some(draft) = self.draft {
            opts.with_draft(draft.into());
        }
        opts.with_retriever(self.retriever());

        let validator = opts.build(&root).map_err(|e| SchemaError::ValidatorBuild {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;
        let validator = Arc::new(validator);

        tracing::debug!(reference, "compiled schema validator");
        self.compiled
            .write()
            .insert(reference.to_string(), Arc::clone(&validator));
        Ok(validator)
    }

    /// Validate `instance` against a schema reference, collecting every
    /// violation in one pass.
    ///
    /// # Errors
    ///
    /// Same as [`compile`](Self::compile). Non-conformance is reported
    /// through the returned [`ValidationOutcome`], not as an error.
    pub fn validate(
        &self,
        reference: &str,
        instance: &Value,
    ) -> Result<ValidationOutcome, SchemaError> {
        let validator = self.compile(reference)?;
        let violations: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation::from_error(&e))
            .collect();
        Ok(ValidationOutcome::new(reference, violations))
    }

    fn retriever(&self) -> LocalSchemaRetriever {
        let mut schemas_by_uri: HashMap<String, Value> = HashMap::new();

        for (id, entry) in &self.schemas {
            if let Some(filename) = entry
                .source
                .as_deref()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
            {
                schemas_by_uri.insert(filename.to_string(), entry.value.clone());
            }
            if let Some(id_uri) = entry.value.get("$id").and_then(Value::as_str) {
                let id_uri = id_uri.split('#').next().unwrap_or(id_uri);
                schemas_by_uri.insert(id_uri.to_string(), entry.value.clone());
            }
            // Identifiers win over file names and `$id`s that collide with them.
            schemas_by_uri.insert(id.clone(), entry.value.clone());
        }

        LocalSchemaRetriever { schemas_by_uri }
    }
}

fn check_identifier(id: &str) -> Result<(), SchemaError> {
    let reason = if id.is_empty() {
        "identifier is empty"
    } else if id.contains('#') {
        "identifier must not contain '#'"
    } else if id.contains(['/', '\\']) {
        "identifier must not contain path separators"
    } else if id.chars().any(char::is_whitespace) {
        "identifier must not contain whitespace"
    } else {
        return Ok(());
    };
    Err(SchemaError::InvalidIdentifier {
        id: id.to_string(),
        reason,
    })
}

/// Characters a JSON Pointer may carry through a URI fragment unescaped.
const POINTER_FRAGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Root schema selecting `pointer` inside the registered schema `id`,
/// resolved through the retriever so that the target's own relative
/// references keep working. `None` if the pointer does not exist.
fn pointer_wrapper(id: &str, pointer: &str, target: &Value) -> Option<Value> {
    if !pointer.starts_with('/') {
        return None;
    }
    target.pointer(pointer)?;

    let mut wrapper = serde_json::Map::new();
    if let Some(dialect) = target.get("$schema") {
        wrapper.insert("$schema".to_string(), dialect.clone());
    }
    let fragment = utf8_percent_encode(pointer, POINTER_FRAGMENT);
    wrapper.insert("$ref".to_string(), Value::String(format!("{id}#{fragment}")));
    Some(Value::Object(wrapper))
}

/// Resolves `$ref` URIs to registered schemas without network access.
struct LocalSchemaRetriever {
    /// Map from identifier, file name or `$id` to schema value.
    schemas_by_uri: HashMap<String, Value>,
}

impl LocalSchemaRetriever {
    fn lookup(&self, uri: &str) -> Option<Value> {
        let uri = uri.split('#').next().unwrap_or(uri);

        if let Some(value) = self.schemas_by_uri.get(uri) {
            return Some(value.clone());
        }

        let segment = uri.rsplit('/').next().unwrap_or(uri);
        if let Some(value) = self.schemas_by_uri.get(segment) {
            return Some(value.clone());
        }

        segment
            .strip_suffix(".json")
            .and_then(|stem| self.schemas_by_uri.get(stem))
            .cloned()
    }
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        self.lookup(uri_str).ok_or_else(|| {
            format!("'{uri_str}' does not match any registered schema").into()
        })
    }
}
