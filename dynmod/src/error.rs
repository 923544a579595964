//! Error types for model building, instantiation and the registry.

use dynmod_schema::SchemaError;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned from field callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type BuildResult<T> = Result<T, BuildError>;
pub type ModelResult<T> = Result<T, ModelError>;
pub type FieldResult<T> = Result<T, FieldError>;
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("type {type_name:?} not registered (field {field})")]
    TypeNotRegistered { field: String, type_name: String },

    #[error("injected member at {path} has an unnamed type")]
    UnnamedInjection { path: String },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    #[error("source value {index} is not a record")]
    InvalidSource { index: usize },

    #[error("cannot copy member {member}: {source}")]
    Copy {
        member: String,
        source: dynmod_types::Error,
    },

    #[error("cannot inject at {path}: {source}")]
    Injection {
        path: String,
        source: dynmod_types::Error,
    },
}

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("field {0} is not valid")]
    Invalid(String),

    #[error("cannot assign {from} to field {field} of type {to}")]
    TypeMismatch {
        field: String,
        from: String,
        to: String,
    },

    #[error("cannot decode field {field}: {source}")]
    Decode {
        field: String,
        source: serde_json::Error,
    },

    #[error("callback on field {field} failed: {source}")]
    Callback { field: String, source: BoxError },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model name is empty")]
    EmptyName,

    #[error("model {0} already exists")]
    AlreadyExists(String),

    #[error("model {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("failed to build model {model}: {source}")]
    Build { model: String, source: ModelError },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
