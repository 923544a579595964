use crate::{CompositeType, Error, Member, Result, TypeRef, Value};
use std::sync::Arc;

/// One instance of a [`CompositeType`].
///
/// Holds a shared handle to its type and one value slot per member, in
/// member order. Name lookups see members promoted through anonymous
/// struct members the same way [`CompositeType::locate`] does.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: Arc<CompositeType>,
    values: Vec<Value>,
}

impl Record {
    /// Allocates a record with every slot at its zero value.
    pub fn zero(ty: Arc<CompositeType>) -> Self {
        let values = ty.members().iter().map(|m| m.ty.zero()).collect();
        Self { ty, values }
    }

    /// Allocates a record and assigns the given members, converting each
    /// value into its member type.
    pub fn from_pairs<I, K, V>(ty: Arc<CompositeType>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Self::zero(ty);
        for (name, value) in pairs {
            record.set(name.as_ref(), value.into())?;
        }
        Ok(record)
    }

    pub fn composite_type(&self) -> &Arc<CompositeType> {
        &self.ty
    }

    pub fn type_name(&self) -> Option<&str> {
        self.ty.name()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterates members alongside their current values.
    pub fn iter(&self) -> impl Iterator<Item = (&Member, &Value)> {
        self.ty.members().iter().zip(&self.values)
    }

    /// Iterates members alongside mutable access to their slots.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Member, &mut Value)> {
        self.ty.members().iter().zip(self.values.iter_mut())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let path = self.ty.locate(name)?;
        self.value_at(&path)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.slot_mut(name).map(|(_, slot)| slot)
    }

    /// Returns the slot for `name` together with its declared member type.
    pub fn slot_mut(&mut self, name: &str) -> Option<(TypeRef, &mut Value)> {
        let path = self.ty.locate(name)?;
        let ty = self.ty.member_at(&path)?.ty.clone();
        let slot = self.value_at_mut(&path)?;
        Some((ty, slot))
    }

    /// Returns the slot at a member index together with its declared type.
    pub fn slot_at_mut(&mut self, index: usize) -> Option<(TypeRef, &mut Value)> {
        let ty = self.ty.members().get(index)?.ty.clone();
        let slot = self.values.get_mut(index)?;
        Some((ty, slot))
    }

    /// Coerces `value` into the member's type and stores it.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let (ty, slot) = self
            .slot_mut(name)
            .ok_or_else(|| Error::UnknownMember(name.to_string()))?;
        *slot = ty.coerce(value)?;
        Ok(())
    }

    pub(crate) fn replace_at(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    /// Rebinds this record to a structurally identical type.
    pub(crate) fn retyped(self, ty: &Arc<CompositeType>) -> Result<Self> {
        if Arc::ptr_eq(&self.ty, ty) || self.ty.same_shape(ty) {
            Ok(Self {
                ty: Arc::clone(ty),
                values: self.values,
            })
        } else {
            Err(Error::NotConvertible {
                from: Value::Record(self).kind_name(),
                to: TypeRef::Struct(Arc::clone(ty)).to_string(),
            })
        }
    }

    fn value_at(&self, path: &[usize]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let value = self.values.get(*first)?;
        if rest.is_empty() {
            Some(value)
        } else {
            value.as_record()?.value_at(rest)
        }
    }

    fn value_at_mut(&mut self, path: &[usize]) -> Option<&mut Value> {
        let (first, rest) = path.split_first()?;
        let value = self.values.get_mut(*first)?;
        if rest.is_empty() {
            Some(value)
        } else {
            value.as_record_mut()?.value_at_mut(rest)
        }
    }

    /// Renders the record as a JSON object keyed by member name.
    ///
    /// Anonymous record members are flattened; declared members win over
    /// promoted ones with the same name.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        for (member, value) in self.iter() {
            match (member.anonymous, value) {
                (true, Value::Record(embedded)) => {
                    if let serde_json::Value::Object(inner) = embedded.to_json() {
                        for (k, v) in inner {
                            obj.entry(k).or_insert(v);
                        }
                    }
                }
                _ => {
                    obj.insert(member.name.clone(), value.to_json());
                }
            }
        }
        serde_json::Value::Object(obj)
    }
}
