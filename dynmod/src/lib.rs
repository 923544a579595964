//! Runtime model registry.
//!
//! Models are declared as JSON schema documents, resolved against each
//! other (`ref` embeds another model's fields, `extends` inherits them),
//! and built into composite types at runtime. Instances are produced from
//! a model, optionally seeded from existing values, and read or written
//! through dotted field paths.
//!
//! Per-model combine mappers inject prototype values as leading anonymous
//! members of the root or of any nested composite field.

mod builder;
mod config;
mod error;
mod field;
mod mapper;
mod model;
mod registry;

pub use builder::{Builder, InjectedMembers, NamedType, TypeBuilder, normalize_injected};
pub use config::LoaderConfig;
pub use error::{
    BoxError, BuildError, BuildResult, FieldError, FieldResult, ModelError, ModelResult, RegistryError,
    RegistryResult,
};
pub use field::{IntoCallResult, ModelField};
pub use mapper::{BasicMapper, CombineMapper, MapperFn, mapper_fn};
pub use model::Model;
pub use registry::Models;

pub use dynmod_schema::{FieldSpec, ModelConfig, SchemaError};
pub use dynmod_types::{CompositeType, Member, Record, TypeRef, Value};
