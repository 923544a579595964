use crate::{FieldSpec, SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A named model as declared in a schema document.
///
/// `fields` are the model's own fields exactly as written; inherited and
/// referenced fields only appear in the output of [`crate::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSpec>,
    /// Parent models whose resolved fields are appended, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl ModelConfig {
    pub fn new(name: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_extends<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extends = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Parses a single model document.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        serde_json::from_str(json).map_err(|source| SchemaError::Parse {
            location: "<inline>".into(),
            source,
        })
    }

    /// Reads and parses a single model document, remembering its path.
    pub fn from_file(path: &Path) -> SchemaResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&data).map_err(|source| SchemaError::Parse {
            location: path.display().to_string(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        debug!(file = %path.display(), model = %config.name, "schema parsed");
        Ok(config)
    }

    /// The file this config was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, path: impl Into<PathBuf>) {
        self.source = Some(path.into());
    }

    /// Source path for diagnostics; `<inline>` when parsed from a string.
    pub fn location(&self) -> String {
        self.source
            .as_ref()
            .map_or_else(|| "<inline>".to_string(), |p| p.display().to_string())
    }

    /// Pretty-printed original (pre-resolution) schema.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// A bundle document: `{"models": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsDocument {
    pub models: Vec<ModelConfig>,
}

/// Parses either a single model document or a `{"models": [...]}` bundle.
pub fn parse_models(json: &str, location: &str) -> SchemaResult<Vec<ModelConfig>> {
    let parse_err = |source| SchemaError::Parse {
        location: location.into(),
        source,
    };

    let raw: serde_json::Value = serde_json::from_str(json).map_err(parse_err)?;
    if raw.get("models").is_some() {
        let doc: ModelsDocument = serde_json::from_value(raw).map_err(parse_err)?;
        Ok(doc.models)
    } else {
        let config: ModelConfig = serde_json::from_value(raw).map_err(parse_err)?;
        Ok(vec![config])
    }
}
