//! Turns resolved field lists into runtime composite types.

use crate::error::{BuildError, BuildResult};
use dynmod_schema::{FieldSpec, normalize_path};
use dynmod_types::{CompositeType, Member, TypeRef, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Prototype values to embed, keyed by dotted path (`"."` is the root).
pub type InjectedMembers = BTreeMap<String, Value>;

/// Re-keys an injected map onto normalized paths (`"Address"` becomes
/// `".Address"`, `""` becomes `"."`).
pub fn normalize_injected(injected: InjectedMembers) -> InjectedMembers {
    injected
        .into_iter()
        .map(|(path, value)| (normalize_path(&path), value))
        .collect()
}

/// A custom type name registered with a builder.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub name: String,
    pub ty: TypeRef,
}

impl NamedType {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Registers the type of an example value under `name`.
    pub fn from_example(name: impl Into<String>, example: &Value) -> Self {
        Self::new(name, example.type_ref())
    }
}

/// Produces composite types from field lists.
pub trait TypeBuilder: Send + Sync {
    /// Builds the member layout for `fields`. Every entry of `injected`
    /// whose path names the root or a nested composite field becomes a
    /// leading anonymous member of that composite.
    fn build(&self, fields: &[FieldSpec], injected: &InjectedMembers) -> BuildResult<CompositeType>;

    /// Adds custom type names; later registrations replace earlier ones.
    fn register_types(&self, types: Vec<NamedType>);
}

/// The default builder: built-in type names plus whatever was registered.
#[derive(Debug, Default)]
pub struct Builder {
    registered: RwLock<HashMap<String, TypeRef>>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a schema type name up, registered names first.
    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        let registered = self.registered.read().unwrap_or_else(PoisonError::into_inner);
        registered.get(name).cloned().or_else(|| TypeRef::builtin(name))
    }

    fn build_member(
        &self,
        parent: &str,
        field: &FieldSpec,
        injected: &BTreeMap<String, &Value>,
    ) -> BuildResult<Member> {
        let path = format!("{parent}.{}", field.name);

        let mut ty = if field.is_leaf() {
            let type_name = field.ty.as_deref().unwrap_or_default();
            self.lookup(type_name).ok_or_else(|| BuildError::TypeNotRegistered {
                field: path.clone(),
                type_name: type_name.to_string(),
            })?
        } else {
            let mut members = Vec::with_capacity(field.children.len() + 1);
            if let Some(proto) = injected.get(&path) {
                members.push(injected_member(&path, proto)?);
            }
            for child in &field.children {
                members.push(self.build_member(&path, child, injected)?);
            }
            TypeRef::Struct(Arc::new(CompositeType::new(members)))
        };

        if field.array {
            ty = TypeRef::sequence(ty);
        }

        Ok(Member::new(&field.name, ty)
            .with_tag(&field.tag)
            .with_anonymous(field.anonymous))
    }
}

impl TypeBuilder for Builder {
    fn build(&self, fields: &[FieldSpec], injected: &InjectedMembers) -> BuildResult<CompositeType> {
        let injected: BTreeMap<String, &Value> = injected
            .iter()
            .map(|(path, value)| (normalize_path(path), value))
            .collect();

        let mut members = Vec::with_capacity(fields.len() + 1);
        if let Some(proto) = injected.get(".") {
            members.push(injected_member(".", proto)?);
        }
        for field in fields {
            members.push(self.build_member("", field, &injected)?);
        }
        Ok(CompositeType::new(members))
    }

    fn register_types(&self, types: Vec<NamedType>) {
        let mut registered = self.registered.write().unwrap_or_else(PoisonError::into_inner);
        for named in types {
            debug!(name = %named.name, ty = %named.ty, "type registered");
            registered.insert(named.name, named.ty);
        }
    }
}

/// The embedded member carrying an injected prototype, named after the
/// prototype's type.
fn injected_member(path: &str, proto: &Value) -> BuildResult<Member> {
    let ty = proto.type_ref();
    let name = ty.name();
    if name.is_empty() {
        return Err(BuildError::UnnamedInjection {
            path: path.to_string(),
        });
    }
    Ok(Member::embedded(name, ty))
}
