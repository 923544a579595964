//! A built model: resolved fields, the composite type built from them and
//! the injected prototypes.

use crate::builder::{InjectedMembers, TypeBuilder, normalize_injected};
use crate::error::{ModelError, ModelResult};
use crate::field::ModelField;
use dynmod_schema::{FieldSpec, ModelConfig, delete_field, insert_field, split_path, update_field};
use dynmod_types::{CompositeType, Record, TypeRef, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct ModelState {
    fields: Vec<FieldSpec>,
    ty: Arc<CompositeType>,
    injected: InjectedMembers,
}

/// A runtime model.
///
/// Schema edits ([`insert`](Self::insert), [`update`](Self::update),
/// [`delete`](Self::delete), [`combine`](Self::combine)) rebuild the type
/// and only commit when the rebuild succeeds. Instances produced before an
/// edit keep the type they were built with.
pub struct Model {
    name: String,
    config: ModelConfig,
    builder: Arc<dyn TypeBuilder>,
    state: RwLock<ModelState>,
}

impl Model {
    /// Builds a model from its resolved fields.
    pub fn build(
        config: ModelConfig,
        fields: Vec<FieldSpec>,
        injected: InjectedMembers,
        builder: Arc<dyn TypeBuilder>,
    ) -> ModelResult<Self> {
        let name = config.name.clone();
        let injected = normalize_injected(injected);
        let ty = Self::build_type(&name, builder.as_ref(), &fields, &injected)?;
        Ok(Self {
            name,
            config,
            builder,
            state: RwLock::new(ModelState {
                fields,
                ty,
                injected,
            }),
        })
    }

    fn build_type(
        name: &str,
        builder: &dyn TypeBuilder,
        fields: &[FieldSpec],
        injected: &InjectedMembers,
    ) -> ModelResult<Arc<CompositeType>> {
        let ty = builder.build(fields, injected)?;
        Ok(Arc::new(ty.with_name(name)))
    }

    fn read(&self) -> RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema document as loaded, before resolution.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Current resolved fields.
    pub fn fields(&self) -> Vec<FieldSpec> {
        self.read().fields.clone()
    }

    pub fn composite_type(&self) -> Arc<CompositeType> {
        Arc::clone(&self.read().ty)
    }

    pub fn injected(&self) -> InjectedMembers {
        self.read().injected.clone()
    }

    /// Pretty JSON of the original schema document.
    pub fn dump(&self) -> String {
        self.config.dump()
    }

    /// Rebuilds with `fields`/`injected` and commits both on success.
    fn rebuild(
        &self,
        state: &mut ModelState,
        fields: Vec<FieldSpec>,
        injected: InjectedMembers,
    ) -> ModelResult<()> {
        match Self::build_type(&self.name, self.builder.as_ref(), &fields, &injected) {
            Ok(ty) => {
                state.fields = fields;
                state.injected = injected;
                state.ty = ty;
                debug!(model = %self.name, members = state.ty.len(), "model rebuilt");
                Ok(())
            }
            Err(err) => {
                warn!(model = %self.name, error = %err, "rebuild failed, keeping previous type");
                Err(err)
            }
        }
    }

    /// Replaces the injected prototypes and rebuilds.
    pub fn combine(&self, injected: InjectedMembers) -> ModelResult<()> {
        let mut state = self.write();
        let fields = state.fields.clone();
        self.rebuild(&mut state, fields, normalize_injected(injected))
    }

    /// Appends `new_fields` under `path` (the root when empty).
    ///
    /// Returns how many fields were placed; nothing is rebuilt when that
    /// is zero.
    pub fn insert(&self, path: &str, new_fields: Vec<FieldSpec>) -> ModelResult<usize> {
        let mut state = self.write();
        let mut fields = state.fields.clone();
        let inserted = new_fields
            .into_iter()
            .filter(|field| insert_field(&mut fields, path, field.clone()))
            .count();
        if inserted == 0 {
            return Ok(0);
        }
        let injected = state.injected.clone();
        self.rebuild(&mut state, fields, injected)?;
        Ok(inserted)
    }

    /// Replaces the field at `path`. Returns `false` if nothing matched.
    pub fn update(&self, path: &str, field: FieldSpec) -> ModelResult<bool> {
        let mut state = self.write();
        let mut fields = state.fields.clone();
        if !update_field(&mut fields, path, field) {
            return Ok(false);
        }
        let injected = state.injected.clone();
        self.rebuild(&mut state, fields, injected)?;
        Ok(true)
    }

    /// Removes the field at `path`, along with ancestors left empty.
    pub fn delete(&self, path: &str) -> ModelResult<bool> {
        let mut state = self.write();
        let mut fields = state.fields.clone();
        if !delete_field(&mut fields, path) {
            return Ok(false);
        }
        let injected = state.injected.clone();
        self.rebuild(&mut state, fields, injected)?;
        Ok(true)
    }

    /// Produces a fresh instance.
    ///
    /// 1. members of `values[0]` are copied onto same-named instance members
    /// 2. each later value is copied into the instance member named after
    ///    its type, one level deep
    /// 3. injected prototypes are written into their embedded members
    /// 4. every sequence, at any depth, is reset to empty
    pub fn new_instance(&self, values: &[Value]) -> ModelResult<Record> {
        let (ty, injected) = {
            let state = self.read();
            (Arc::clone(&state.ty), state.injected.clone())
        };

        let mut record = Record::zero(ty);
        copy_values(&mut record, values)?;
        for (path, proto) in &injected {
            inject(&mut record, path, proto)?;
        }
        reset_sequences(&mut record);
        Ok(record)
    }

    /// Opens a field handle on `instance` at a dotted path.
    pub fn field<'a>(&self, instance: &'a mut Record, path: &str) -> ModelField<'a> {
        ModelField::bind(instance, path)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("type", &state.ty.to_string())
            .field("injected", &state.injected.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn copy_values(record: &mut Record, values: &[Value]) -> ModelResult<()> {
    let Some((first, rest)) = values.split_first() else {
        return Ok(());
    };

    let first = first
        .as_record()
        .ok_or(ModelError::InvalidSource { index: 0 })?;
    copy_members(record, first)?;

    for (offset, value) in rest.iter().enumerate() {
        let source = value
            .as_record()
            .ok_or(ModelError::InvalidSource { index: offset + 1 })?;
        let Some(type_name) = source.type_name() else {
            debug!(index = offset + 1, "unnamed source value skipped");
            continue;
        };
        match record.get_mut(type_name).and_then(Value::as_record_mut) {
            Some(target) => copy_members(target, source)?,
            None => debug!(member = %type_name, "no composite member for source value"),
        }
    }
    Ok(())
}

/// Copies every member of `source` whose name also exists on `target`.
fn copy_members(target: &mut Record, source: &Record) -> ModelResult<()> {
    for (member, value) in source.iter() {
        let Some((ty, slot)) = target.slot_mut(&member.name) else {
            continue;
        };
        *slot = ty.coerce(value.clone()).map_err(|source| ModelError::Copy {
            member: member.name.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Writes a prototype into the leading embedded member of the composite at
/// `path`. Paths that don't reach a composite instance are skipped.
fn inject(record: &mut Record, path: &str, proto: &Value) -> ModelResult<()> {
    let mut target = Some(record);
    for segment in split_path(path) {
        target = target
            .and_then(|r| r.get_mut(segment))
            .and_then(Value::as_record_mut);
    }
    let Some(target) = target else {
        debug!(path = %path, "injection target not reachable");
        return Ok(());
    };

    let embedded = target
        .composite_type()
        .members()
        .first()
        .is_some_and(|m| m.anonymous && m.name == proto.type_ref().name());
    if !embedded {
        debug!(path = %path, "no embedded member for injected prototype");
        return Ok(());
    }
    let Some((ty, slot)) = target.slot_at_mut(0) else {
        return Ok(());
    };
    *slot = ty.coerce(proto.clone()).map_err(|source| ModelError::Injection {
        path: path.to_string(),
        source,
    })?;
    Ok(())
}

fn reset_sequences(record: &mut Record) {
    for (member, value) in record.iter_mut() {
        match &member.ty {
            TypeRef::Sequence(_) => *value = Value::Seq(Vec::new()),
            TypeRef::Struct(_) | TypeRef::Optional(_) => {
                if let Some(nested) = value.as_record_mut() {
                    reset_sequences(nested);
                }
            }
            _ => {}
        }
    }
}
