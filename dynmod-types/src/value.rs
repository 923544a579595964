use crate::{Record, TypeRef};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A tagged value occupying one member slot.
///
/// Which variants a slot may hold is decided by the slot's [`TypeRef`];
/// all signed integer kinds share `Int`, all unsigned kinds share `Uint`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent optional, nil error, or an unset `any`.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Error(String),
    Map(BTreeMap<String, Value>),
    Seq(Vec<Value>),
    Record(Record),
}

impl Value {
    /// Short name of the variant, used in conversion errors.
    pub fn kind_name(&self) -> String {
        match self {
            Self::Null => "null".into(),
            Self::Bool(_) => "bool".into(),
            Self::Int(_) => "int".into(),
            Self::Uint(_) => "uint".into(),
            Self::Float(_) => "float".into(),
            Self::String(_) => "string".into(),
            Self::Timestamp(_) => "timestamp".into(),
            Self::Error(_) => "error".into(),
            Self::Map(_) => "map".into(),
            Self::Seq(_) => "sequence".into(),
            Self::Record(r) => match r.type_name() {
                Some(name) => format!("record {name}"),
                None => "record".into(),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub(crate) fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Uint(_) | Self::Float(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(i) => Some(i),
            Self::Uint(u) => i64::try_from(u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Uint(u) => Some(u),
            Self::Int(i) => u64::try_from(i).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(f) => Some(f),
            Self::Int(i) => Some(i as f64),
            Self::Uint(u) => Some(u as f64),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Infers the type of an example value.
    ///
    /// `Null` infers `any`; a map whose values are all strings infers the
    /// string map; a sequence takes its element type from the first item.
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Self::Null => TypeRef::Any,
            Self::Bool(_) => TypeRef::Bool,
            Self::Int(_) => TypeRef::Int,
            Self::Uint(_) => TypeRef::Uint,
            Self::Float(_) => TypeRef::Float64,
            Self::String(_) => TypeRef::String,
            Self::Timestamp(_) => TypeRef::Timestamp,
            Self::Error(_) => TypeRef::Error,
            Self::Map(entries) => {
                if !entries.is_empty() && entries.values().all(|v| matches!(v, Self::String(_))) {
                    TypeRef::StringMap
                } else {
                    TypeRef::AnyMap
                }
            }
            Self::Seq(items) => {
                TypeRef::sequence(items.first().map_or(TypeRef::Any, Self::type_ref))
            }
            Self::Record(r) => TypeRef::Struct(Arc::clone(r.composite_type())),
        }
    }

    /// Untyped decode: JSON objects become maps, arrays become sequences.
    pub fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Uint(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or_default())
                }
            }
            Json::String(s) => Self::String(s.clone()),
            Json::Array(items) => Self::Seq(items.iter().map(Self::from_json).collect()),
            Json::Object(obj) => Self::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as JSON. Records become objects keyed by member
    /// name, with anonymous record members flattened into their parent.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Uint(u) => Json::from(*u),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::String(s) | Self::Error(s) => Json::String(s.clone()),
            Self::Timestamp(t) => Json::String(t.to_rfc3339()),
            Self::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Seq(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Record(r) => r.to_json(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Self::Uint(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Seq(items)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}
