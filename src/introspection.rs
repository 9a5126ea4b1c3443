//! introspection document
//!
//! serde model of the standard `__schema` payload plus the graphql response
//! envelope it usually arrives in.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// graphql response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
    /// response data or null if errors
    pub data: Option<T>,
    /// graphql errors array
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl<T> GraphQlResponse<T> {
    /// true if the response contains graphql errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// graphql error entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlError {
    /// error message
    pub message: String,
    /// error locations in the query
    #[serde(default)]
    pub locations: Vec<GraphQlLocation>,
    /// response path
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

/// graphql error location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlLocation {
    pub line: i64,
    pub column: i64,
}

/// `__TypeKind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
    #[serde(other)]
    Other,
}

/// `__schema` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    #[serde(default)]
    pub query_type: Option<RootType>,
    #[serde(default)]
    pub mutation_type: Option<RootType>,
    #[serde(default)]
    pub subscription_type: Option<RootType>,
    #[serde(default)]
    pub types: Vec<FullType>,
}

/// root operation type reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootType {
    pub name: String,
}

/// named type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldDef>>,
    #[serde(default)]
    pub input_fields: Option<Vec<InputValue>>,
    #[serde(default)]
    pub enum_values: Option<Vec<EnumValue>>,
}

/// output field of an object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// argument or input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// possibly wrapped type reference (`kind`, `name`, `ofType` chain)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            of_type: None,
        }
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    pub fn list(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    /// innermost named type, if the chain ends in one
    pub fn base_name(&self) -> Option<&str> {
        match &self.of_type {
            Some(inner) if self.name.is_none() => inner.base_name(),
            _ => self.name.as_deref(),
        }
    }
}

#[derive(Deserialize)]
struct SchemaContainer {
    #[serde(rename = "__schema")]
    schema: IntrospectionSchema,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Bare(SchemaContainer),
    Response(GraphQlResponse<SchemaContainer>),
}

impl IntrospectionSchema {
    /// parse either `{"data": {"__schema": ..}}` or a bare `{"__schema": ..}`
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str::<Envelope>(text)? {
            Envelope::Bare(container) => Ok(container.schema),
            Envelope::Response(response) => Self::from_response(response, text),
        }
    }

    fn from_response(response: GraphQlResponse<SchemaContainer>, body: &str) -> Result<Self> {
        if response.has_errors() {
            let message = response
                .errors
                .first()
                .map(|err| err.message.clone())
                .unwrap_or_else(|| "graphql error".to_string());
            return Err(Error::GraphQl {
                status: None,
                errors: response.errors,
                body: body.to_string(),
                message,
            });
        }

        response
            .data
            .map(|container| container.schema)
            .ok_or_else(|| Error::Config("introspection response has no data".to_string()))
    }

    /// look up a named type definition
    pub fn type_named(&self, name: &str) -> Option<&FullType> {
        self.types.iter().find(|ty| ty.name == name)
    }

    pub fn query_root(&self) -> Option<&str> {
        self.query_type.as_ref().map(|root| root.name.as_str())
    }

    pub fn mutation_root(&self) -> Option<&str> {
        self.mutation_type.as_ref().map(|root| root.name.as_str())
    }
}
