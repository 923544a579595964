use serde::{Deserialize, Serialize};

/// One node of a model schema.
///
/// A leaf carries a type name (built-in or registered with the type
/// builder). A group carries ordered `children` instead. A field with
/// `ref` set takes its children from another model's resolved fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub array: bool,
    /// Opaque metadata copied onto the built member.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub anonymous: bool,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldSpec>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl FieldSpec {
    /// Shorthand for a leaf field of the given type.
    pub fn leaf(name: &str, ty: &str) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    /// Shorthand for a nested struct field.
    pub fn group(name: &str, children: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            children,
            ..Self::default()
        }
    }

    /// Shorthand for a field composed from another model.
    pub fn reference(name: &str, model: &str) -> Self {
        Self {
            name: name.into(),
            ref_model: Some(model.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether new children may be inserted under this field: it must not
    /// be an array and must not declare a primitive type (`struct` is fine).
    pub fn accepts_children(&self) -> bool {
        !self.array && matches!(self.ty.as_deref(), None | Some("") | Some("struct"))
    }
}
