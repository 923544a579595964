//! Schema layer for dynmod.
//!
//! Defines the declarative side of a model, before any runtime type exists:
//! - [`FieldSpec`]: one schema node (leaf type, nested children, or `ref` to another model)
//! - [`ModelConfig`]: a named model: ordered fields plus the models it `extends`
//! - [`resolve`]: expands every `ref` and `extends` across a full set of configs
//! - [`insert_field`], [`update_field`], [`delete_field`]: dotted-path edits on a field list
//!
//! Configs are kept exactly as parsed. Resolution never mutates them; it
//! returns fresh resolved field lists, so re-resolving a merged superset of
//! configs after a new batch arrives is always clean and non-duplicating.

mod config;
mod error;
mod field;
mod path;
mod resolver;

pub use config::{ModelConfig, ModelsDocument, parse_models};
pub use error::{SchemaError, SchemaResult};
pub use field::FieldSpec;
pub use path::{delete_field, insert_field, normalize_path, split_path, update_field};
pub use resolver::{ResolvedFields, resolve};
