//! canonical type descriptors
//!
//! every type reference in the schema (named type, field, argument, return
//! type) flattens into a [`TypeDescriptor`]: one leaf kind plus the wrapping
//! flags accumulated while unwrapping list/non-null combinators.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// ordered `name -> descriptor` map (fields, arguments)
pub type DescriptorMap = IndexMap<String, TypeDescriptor>;

/// language-independent class of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Numeric,
    Text,
    Boolean,
    Unknown,
}

impl Primitive {
    /// fixed scalar table; `None` for scalars outside it
    pub fn for_scalar(name: &str) -> Option<Self> {
        match name {
            "Int" | "Float" | "BigInt" => Some(Primitive::Numeric),
            "String" | "ID" => Some(Primitive::Text),
            "Boolean" => Some(Primitive::Boolean),
            _ => None,
        }
    }
}

/// leaf kind of a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "leaf", rename_all = "camelCase")]
pub enum Leaf {
    Primitive { class: Primitive },
    Enum { values: Vec<String> },
    Object,
    Input,
    /// kind the normalizer could not classify (interface, union, ...)
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub gql_type: String,
    #[serde(flatten)]
    pub leaf: Leaf,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub sub_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<DescriptorMap>,
}

impl TypeDescriptor {
    /// bare, unwrapped descriptor for a named type
    pub fn leaf(gql_type: impl Into<String>, leaf: Leaf) -> Self {
        Self {
            name: None,
            gql_type: gql_type.into(),
            leaf,
            list: false,
            required: false,
            sub_required: false,
            fields: None,
        }
    }

    pub fn primitive(gql_type: impl Into<String>, class: Primitive) -> Self {
        Self::leaf(gql_type, Leaf::Primitive { class })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.leaf, Leaf::Primitive { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.leaf, Leaf::Enum { .. })
    }

    pub fn primitive_class(&self) -> Option<Primitive> {
        match self.leaf {
            Leaf::Primitive { class } => Some(class),
            _ => None,
        }
    }

    /// declared enum literals, empty for non-enums
    pub fn values(&self) -> &[String] {
        match &self.leaf {
            Leaf::Enum { values } => values,
            _ => &[],
        }
    }

    /// field map, empty when the type declares none
    pub fn field_iter(&self) -> impl Iterator<Item = (&String, &TypeDescriptor)> {
        self.fields.iter().flat_map(|fields| fields.iter())
    }

    /// graphql spelling of the reference, e.g. `[ID!]!`
    pub fn gql_signature(&self) -> String {
        let mut out = self.gql_type.clone();
        if self.list {
            if self.sub_required {
                out.push('!');
            }
            out = format!("[{out}]");
        }
        if self.required {
            out.push('!');
        }
        out
    }

    /// name used in messages and map keys
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.gql_type)
    }
}
