//! Dotted-path access into a model instance.

use crate::error::{BoxError, FieldError, FieldResult};
use dynmod_schema::split_path;
use dynmod_types::{Record, TypeRef, Value};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// What a callback passed to [`ModelField::call`] may return.
pub trait IntoCallResult {
    fn into_call_result(self) -> Result<(), BoxError>;
}

impl IntoCallResult for () {
    fn into_call_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> IntoCallResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_call_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

enum Slot<'a> {
    Root(&'a mut Record),
    Member { ty: TypeRef, value: &'a mut Value },
    Invalid,
}

/// A handle on one slot of an instance.
///
/// Navigation never fails: a path that leaves the instance yields an
/// invalid handle, and every accessor on it reports
/// [`FieldError::Invalid`].
pub struct ModelField<'a> {
    name: String,
    slot: Slot<'a>,
}

impl<'a> ModelField<'a> {
    /// Binds to `instance` and walks `path` from its root.
    pub fn bind(instance: &'a mut Record, path: &str) -> Self {
        let root = Self {
            name: ".".to_string(),
            slot: Slot::Root(instance),
        };
        root.field(path)
    }

    /// The dotted path of this handle, `"."` for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.slot, Slot::Invalid)
    }

    /// Declared type of the slot. The root reports its composite type.
    pub fn type_ref(&self) -> Option<TypeRef> {
        match &self.slot {
            Slot::Root(record) => Some(TypeRef::Struct(Arc::clone(record.composite_type()))),
            Slot::Member { ty, .. } => Some(ty.clone()),
            Slot::Invalid => None,
        }
    }

    /// Descends through `path`, relative to this handle.
    pub fn field(self, path: &str) -> ModelField<'a> {
        split_path(path)
            .into_iter()
            .fold(self, |current, segment| current.child(segment))
    }

    fn child(self, segment: &str) -> ModelField<'a> {
        let name = if self.name == "." {
            format!(".{segment}")
        } else {
            format!("{}.{segment}", self.name)
        };

        let record = match self.slot {
            Slot::Root(record) => Some(record),
            Slot::Member { value, .. } => value.as_record_mut(),
            Slot::Invalid => None,
        };
        let slot = record
            .and_then(|r| r.slot_mut(segment))
            .map_or(Slot::Invalid, |(ty, value)| Slot::Member { ty, value });

        ModelField { name, slot }
    }

    /// The current value of the slot.
    pub fn get(&self) -> Option<Value> {
        match &self.slot {
            Slot::Root(record) => Some(Value::Record((**record).clone())),
            Slot::Member { value, .. } => Some((**value).clone()),
            Slot::Invalid => None,
        }
    }

    fn to_json(&self) -> FieldResult<serde_json::Value> {
        match &self.slot {
            Slot::Root(record) => Ok(record.to_json()),
            Slot::Member { value, .. } => Ok(value.to_json()),
            Slot::Invalid => Err(self.invalid()),
        }
    }

    /// Decodes a detached copy of the slot into `T`.
    pub fn value<T: DeserializeOwned>(&self) -> FieldResult<T> {
        let json = self.to_json()?;
        serde_json::from_value(json).map_err(|source| FieldError::Decode {
            field: self.name.clone(),
            source,
        })
    }

    /// Stores `value` in the slot.
    ///
    /// `Null` resets the slot to its zero value. Otherwise the value is
    /// converted directly; an optional slot gets its layer filled and the
    /// inner type tried once more (see [`TypeRef::coerce`]).
    pub fn set(&mut self, value: Value) -> FieldResult<()> {
        let from = value.kind_name();
        let field = self.name.clone();
        match &mut self.slot {
            Slot::Invalid => Err(FieldError::Invalid(field)),
            Slot::Root(record) => {
                let ty = TypeRef::Struct(Arc::clone(record.composite_type()));
                if value.is_null() {
                    **record = Record::zero(Arc::clone(record.composite_type()));
                    return Ok(());
                }
                match ty.convert(value) {
                    Ok(Value::Record(converted)) => {
                        **record = converted;
                        Ok(())
                    }
                    _ => Err(FieldError::TypeMismatch {
                        field,
                        from,
                        to: ty.to_string(),
                    }),
                }
            }
            Slot::Member { ty, value: slot } => {
                if value.is_null() {
                    **slot = ty.zero();
                    return Ok(());
                }
                **slot = ty.coerce(value).map_err(|_| FieldError::TypeMismatch {
                    field,
                    from,
                    to: ty.to_string(),
                })?;
                Ok(())
            }
        }
    }

    /// Runs `f` with this handle.
    pub fn call<F, R>(&mut self, f: F) -> FieldResult<()>
    where
        F: FnOnce(&mut Self) -> R,
        R: IntoCallResult,
    {
        self.ensure_valid()?;
        let result = f(self).into_call_result();
        result.map_err(|source| self.callback_failed(source))
    }

    /// Runs `f` with a decoded copy of the slot.
    pub fn call_snapshot<T, F, R>(&mut self, f: F) -> FieldResult<()>
    where
        T: DeserializeOwned,
        F: FnOnce(T) -> R,
        R: IntoCallResult,
    {
        let snapshot = self.value::<T>()?;
        f(snapshot)
            .into_call_result()
            .map_err(|source| self.callback_failed(source))
    }

    /// Runs `f` with a decoded copy of the slot and the handle itself.
    pub fn call_with<T, F, R>(&mut self, f: F) -> FieldResult<()>
    where
        T: DeserializeOwned,
        F: FnOnce(T, &mut Self) -> R,
        R: IntoCallResult,
    {
        let snapshot = self.value::<T>()?;
        let result = f(snapshot, self).into_call_result();
        result.map_err(|source| self.callback_failed(source))
    }

    /// Same as [`call_with`](Self::call_with) with the handle passed first.
    pub fn call_handle_first<T, F, R>(&mut self, f: F) -> FieldResult<()>
    where
        T: DeserializeOwned,
        F: FnOnce(&mut Self, T) -> R,
        R: IntoCallResult,
    {
        self.call_with(|snapshot: T, field: &mut Self| f(field, snapshot))
    }

    fn ensure_valid(&self) -> FieldResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.invalid())
        }
    }

    fn invalid(&self) -> FieldError {
        FieldError::Invalid(self.name.clone())
    }

    fn callback_failed(&self, source: BoxError) -> FieldError {
        FieldError::Callback {
            field: self.name.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for ModelField<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelField")
            .field("name", &self.name)
            .field("type", &self.type_ref().map(|ty| ty.to_string()))
            .finish()
    }
}
