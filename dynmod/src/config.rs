//! Loader configuration read from `dynmod.toml`.
//!
//! ```toml
//! schema_dirs = ["schemas"]
//! schema_files = ["extra/audit.json"]
//!
//! [types]
//! money = "float64"
//! uuid = "string"
//! ```
//!
//! Relative paths are taken relative to the directory holding the file.

use crate::builder::NamedType;
use dynmod_types::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directories scanned recursively for `.json` schema documents.
    #[serde(default)]
    pub schema_dirs: Vec<PathBuf>,
    /// Individual schema documents.
    #[serde(default)]
    pub schema_files: Vec<PathBuf>,
    /// Custom type names mapped onto built-in type names.
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

impl LoaderConfig {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads configuration from `path`.
    /// Falls back to an empty configuration when the file is missing or
    /// fails to parse.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No loader config found at {:?}, using defaults", path);
            return Self::default();
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read loader config {:?}: {}. Using defaults.", path, e);
                return Self::default();
            }
        };

        match Self::from_toml(&contents) {
            Ok(config) => {
                info!("Loaded loader config from {:?}", path);
                match path.parent() {
                    Some(base) => config.relative_to(base),
                    None => config,
                }
            }
            Err(e) => {
                warn!("Failed to parse loader config {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    /// Anchors relative schema paths at `base`.
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        let anchor = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.schema_dirs = self.schema_dirs.into_iter().map(anchor).collect();
        self.schema_files = self.schema_files.into_iter().map(anchor).collect();
        self
    }

    /// The `[types]` table as builder registrations. Entries naming an
    /// unknown built-in are skipped with a warning.
    pub fn named_types(&self) -> Vec<NamedType> {
        self.types
            .iter()
            .filter_map(|(alias, target)| match TypeRef::builtin(target) {
                Some(ty) => Some(NamedType::new(alias, ty)),
                None => {
                    warn!(alias = %alias, target = %target, "unknown built-in type in [types]");
                    None
                }
            })
            .collect()
    }
}
