//! Error types for schema parsing and resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while reading or resolving schema documents.
///
/// Unknown targets and cycles are configuration errors: they abort the
/// whole batch being resolved.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A field's `ref` names a model that is not in the config set.
    #[error("ref model not found: model '{model}', field '{field}', path {location}, ref '{target}'")]
    UnknownRef {
        model: String,
        field: String,
        location: String,
        target: String,
    },

    /// An `extends` entry names a model that is not in the config set.
    #[error("extends model not found: model '{model}', path {location}, extends '{target}'")]
    UnknownExtends {
        model: String,
        location: String,
        target: String,
    },

    /// A `ref` or `extends` chain leads back to a model already on the chain.
    #[error("cyclic {kind} chain: {}", chain.join(" -> "))]
    CyclicReference { kind: &'static str, chain: Vec<String> },

    /// The document is not a valid model schema.
    #[error("invalid schema document {location}: {source}")]
    Parse {
        location: String,
        source: serde_json::Error,
    },

    /// A schema file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
