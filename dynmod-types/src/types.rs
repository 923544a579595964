//! Type descriptors for runtime-built composite types.

use crate::{Error, Record, Result, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The type of a single member slot.
///
/// Leaf variants correspond one-to-one with the built-in schema type names
/// (see [`TypeRef::builtin`]). `Optional` is the nullable qualification
/// written as a `*` prefix in schema documents.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    String,
    Int,
    Int8,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Bool,
    Byte,
    Error,
    Timestamp,
    Any,
    /// Dynamic map of string to string.
    StringMap,
    /// Dynamic map of string to any value.
    AnyMap,
    Optional(Box<TypeRef>),
    Sequence(Box<TypeRef>),
    Struct(Arc<CompositeType>),
}

impl TypeRef {
    /// Looks up a built-in type by its schema name.
    ///
    /// A single leading `*` yields the optional variant of the named type.
    /// The legacy spellings `time.Time`, `interface{}`, `map[string]string`
    /// and `map[string]interface{}` are accepted as aliases.
    pub fn builtin(name: &str) -> Option<Self> {
        if let Some(inner) = name.strip_prefix('*') {
            if inner.starts_with('*') {
                return None;
            }
            return Self::builtin(inner).map(Self::optional);
        }

        let ty = match name {
            "string" => Self::String,
            "int" => Self::Int,
            "int8" => Self::Int8,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint" => Self::Uint,
            "uint8" => Self::Uint8,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "bool" => Self::Bool,
            "byte" => Self::Byte,
            "error" => Self::Error,
            "struct" => Self::Struct(Arc::new(CompositeType::default())),
            "timestamp" | "time.Time" => Self::Timestamp,
            "any" | "interface{}" => Self::Any,
            "map[string]string" => Self::StringMap,
            "map[string]any" | "map[string]interface{}" => Self::AnyMap,
            _ => return None,
        };
        Some(ty)
    }

    /// Wraps a type in the optional qualification.
    #[must_use]
    pub fn optional(inner: TypeRef) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Wraps a type as an ordered sequence of it.
    #[must_use]
    pub fn sequence(elem: TypeRef) -> Self {
        Self::Sequence(Box::new(elem))
    }

    /// Canonical type name. Anonymous composites have an empty name.
    pub fn name(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Int => "int".into(),
            Self::Int8 => "int8".into(),
            Self::Int32 => "int32".into(),
            Self::Int64 => "int64".into(),
            Self::Uint => "uint".into(),
            Self::Uint8 => "uint8".into(),
            Self::Uint32 => "uint32".into(),
            Self::Uint64 => "uint64".into(),
            Self::Float32 => "float32".into(),
            Self::Float64 => "float64".into(),
            Self::Bool => "bool".into(),
            Self::Byte => "byte".into(),
            Self::Error => "error".into(),
            Self::Timestamp => "timestamp".into(),
            Self::Any => "any".into(),
            Self::StringMap => "map[string]string".into(),
            Self::AnyMap => "map[string]any".into(),
            Self::Optional(inner) => format!("*{}", inner.name()),
            Self::Sequence(elem) => format!("[]{}", elem.name()),
            Self::Struct(ct) => ct.name().unwrap_or_default().to_string(),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Returns the composite behind a struct type.
    pub fn as_struct(&self) -> Option<&Arc<CompositeType>> {
        match self {
            Self::Struct(ct) => Some(ct),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Int8
                | Self::Int32
                | Self::Int64
                | Self::Uint
                | Self::Uint8
                | Self::Uint32
                | Self::Uint64
                | Self::Float32
                | Self::Float64
                | Self::Byte
        )
    }

    /// The zero value held by a freshly allocated slot of this type.
    pub fn zero(&self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Int | Self::Int8 | Self::Int32 | Self::Int64 => Value::Int(0),
            Self::Uint | Self::Uint8 | Self::Uint32 | Self::Uint64 | Self::Byte => Value::Uint(0),
            Self::Float32 | Self::Float64 => Value::Float(0.0),
            Self::Bool => Value::Bool(false),
            Self::Timestamp => Value::Timestamp(DateTime::<Utc>::default()),
            Self::Error | Self::Any | Self::Optional(_) => Value::Null,
            Self::StringMap | Self::AnyMap => Value::Map(BTreeMap::new()),
            Self::Sequence(_) => Value::Seq(Vec::new()),
            Self::Struct(ct) => Value::Record(Record::zero(Arc::clone(ct))),
        }
    }

    /// Converts a value into this slot type if it is directly convertible.
    ///
    /// - numeric kinds interconvert with truncating casts
    /// - strings, bools, timestamps and errors convert only from themselves
    /// - `Any` accepts every value unchanged
    /// - sequences and maps convert element-wise
    /// - records convert when their member layout matches (tags and type names ignored)
    /// - `Null` converts only into optional, `any` and `error` slots
    ///
    /// An `Optional` slot accepts only `Null` here; filling the optional
    /// layer is the caller's decision (see `ModelField::set`).
    pub fn convert(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (Self::Any, v) => Ok(v),
            (Self::Optional(_) | Self::Error, Value::Null) => Ok(Value::Null),
            (Self::Error, Value::Error(msg)) => Ok(Value::Error(msg)),
            (Self::String, Value::String(s)) => Ok(Value::String(s)),
            (Self::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (Self::Timestamp, Value::Timestamp(t)) => Ok(Value::Timestamp(t)),
            (t, v) if t.is_numeric() && v.is_numeric() => Ok(t.cast_numeric(&v)),
            (Self::Sequence(elem), Value::Seq(items)) => items
                .into_iter()
                .map(|item| elem.coerce(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Seq),
            (Self::StringMap, Value::Map(entries)) => entries
                .into_iter()
                .map(|(k, v)| Self::String.convert(v).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Map),
            (Self::AnyMap, Value::Map(entries)) => Ok(Value::Map(entries)),
            (Self::Struct(ct), Value::Record(record)) => record.retyped(ct).map(Value::Record),
            (t, v) => Err(Error::NotConvertible {
                from: v.kind_name(),
                to: t.to_string(),
            }),
        }
    }

    /// Converts directly; when that fails on an optional slot, fills the
    /// optional layer and retries once against the inner type.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match self {
            Self::Optional(inner) if !value.is_null() => match self.convert(value.clone()) {
                Ok(v) => Ok(v),
                Err(_) => inner.convert(value),
            },
            _ => self.convert(value),
        }
    }

    fn cast_numeric(&self, v: &Value) -> Value {
        let (i, u, f) = match *v {
            Value::Int(i) => (i, i as u64, i as f64),
            Value::Uint(u) => (u as i64, u, u as f64),
            Value::Float(f) => (f as i64, f as u64, f),
            _ => (0, 0, 0.0),
        };
        match self {
            Self::Int | Self::Int64 => Value::Int(i),
            Self::Int8 => Value::Int(i64::from(i as i8)),
            Self::Int32 => Value::Int(i64::from(i as i32)),
            Self::Uint | Self::Uint64 => Value::Uint(u),
            Self::Uint8 | Self::Byte => Value::Uint(u64::from(u as u8)),
            Self::Uint32 => Value::Uint(u64::from(u as u32)),
            Self::Float32 => Value::Float(f64::from(f as f32)),
            _ => Value::Float(f),
        }
    }

    /// Decodes a JSON document into a value of this type.
    ///
    /// Missing object keys decode to the member's zero value; anonymous
    /// struct members read their members from the enclosing object.
    pub fn decode_json(&self, json: &serde_json::Value) -> Result<Value> {
        use serde_json::Value as Json;

        let mismatch = || Error::NotConvertible {
            from: format!("json {json}"),
            to: self.to_string(),
        };

        match (self, json) {
            (Self::Any, j) => Ok(Value::from_json(j)),
            (Self::Optional(_) | Self::Error, Json::Null) => Ok(Value::Null),
            (Self::Optional(inner), j) => inner.decode_json(j),
            (Self::Error, Json::String(s)) => Ok(Value::Error(s.clone())),
            (Self::String, Json::String(s)) => Ok(Value::String(s.clone())),
            (Self::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
            (Self::Timestamp, Json::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .map_err(|e| Error::InvalidTimestamp(format!("{s}: {e}"))),
            (t, Json::Number(n)) if t.is_numeric() => {
                let raw = if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                };
                Ok(t.cast_numeric(&raw))
            }
            (Self::Sequence(elem), Json::Array(items)) => items
                .iter()
                .map(|item| elem.decode_json(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Seq),
            (Self::StringMap | Self::AnyMap, Json::Object(obj)) => {
                let value_ty = if *self == Self::StringMap { Self::String } else { Self::Any };
                obj.iter()
                    .map(|(k, v)| value_ty.decode_json(v).map(|v| (k.clone(), v)))
                    .collect::<Result<BTreeMap<_, _>>>()
                    .map(Value::Map)
            }
            (Self::Struct(ct), Json::Object(_)) => {
                let mut record = Record::zero(Arc::clone(ct));
                for (index, member) in ct.members().iter().enumerate() {
                    let decoded = if member.anonymous && member.ty.as_struct().is_some() {
                        member.ty.decode_json(json)?
                    } else {
                        match json.get(&member.name) {
                            Some(field) => member.ty.decode_json(field)?,
                            None => continue,
                        }
                    };
                    record.replace_at(index, decoded);
                }
                Ok(Value::Record(record))
            }
            _ => Err(mismatch()),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optional(inner) => write!(f, "*{inner}"),
            Self::Sequence(elem) => write!(f, "[]{elem}"),
            Self::Struct(ct) => match ct.name() {
                Some(name) => f.write_str(name),
                None => write!(f, "{ct}"),
            },
            other => f.write_str(&other.name()),
        }
    }
}

/// One member of a [`CompositeType`].
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: TypeRef,
    /// Opaque metadata carried over from the schema.
    pub tag: String,
    /// Embedded member whose own members are promoted into the parent.
    pub anonymous: bool,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: String::new(),
            anonymous: false,
        }
    }

    /// An anonymous member, named after its type.
    pub fn embedded(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            anonymous: true,
            ..Self::new(name, ty)
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = anonymous;
        self
    }
}

/// An ordered, named, tagged member list.
///
/// Built from a resolved field tree by the type builder; nested struct
/// fields get their own anonymous `CompositeType`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeType {
    name: Option<String>,
    members: Vec<Member>,
}

impl CompositeType {
    /// Creates an anonymous composite.
    pub fn new(members: Vec<Member>) -> Self {
        Self { name: None, members }
    }

    /// Creates a named composite, usable as an injected prototype type.
    pub fn named(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: Some(name.into()),
            members,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Finds a direct member by name.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }

    /// Locates a member by name, including members promoted through
    /// anonymous struct members. Returns the index at each level.
    pub fn locate(&self, name: &str) -> Option<Vec<usize>> {
        if let Some(index) = self.index_of(name) {
            return Some(vec![index]);
        }
        self.members.iter().enumerate().find_map(|(index, member)| {
            if !member.anonymous {
                return None;
            }
            let nested = member.ty.as_struct()?.locate(name)?;
            let mut path = Vec::with_capacity(nested.len() + 1);
            path.push(index);
            path.extend(nested);
            Some(path)
        })
    }

    /// Resolves a located index path to the member it points at.
    pub fn member_at(&self, path: &[usize]) -> Option<&Member> {
        let (first, rest) = path.split_first()?;
        let member = self.members.get(*first)?;
        if rest.is_empty() {
            Some(member)
        } else {
            member.ty.as_struct()?.member_at(rest)
        }
    }

    /// Structural identity: same member names, embedding and types, in order.
    /// Tags and composite names are ignored.
    pub fn same_shape(&self, other: &CompositeType) -> bool {
        self.members.len() == other.members.len()
            && self.members.iter().zip(&other.members).all(|(a, b)| {
                a.name == b.name && a.anonymous == b.anonymous && same_type_shape(&a.ty, &b.ty)
            })
    }
}

fn same_type_shape(a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::Struct(x), TypeRef::Struct(y)) => x.same_shape(y),
        (TypeRef::Optional(x), TypeRef::Optional(y)) | (TypeRef::Sequence(x), TypeRef::Sequence(y)) => {
            same_type_shape(x, y)
        }
        _ => a == b,
    }
}

impl fmt::Display for CompositeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("struct {")?;
        for (i, member) in self.members.iter().enumerate() {
            let sep = if i == 0 { " " } else { "; " };
            if member.anonymous {
                write!(f, "{sep}{}", member.ty)?;
            } else {
                write!(f, "{sep}{} {}", member.name, member.ty)?;
            }
            if !member.tag.is_empty() {
                write!(f, " `{}`", member.tag)?;
            }
        }
        if self.members.is_empty() {
            f.write_str("}")
        } else {
            f.write_str(" }")
        }
    }
}
