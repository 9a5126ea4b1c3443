//! type normalizer
//!
//! resolves introspection type references into the closed [`GraphQlType`]
//! union, then folds that union into a [`TypeDescriptor`]. normalization never
//! fails: kinds it cannot classify degrade to an `unknown` leaf and a warning.

use crate::descriptor::{DescriptorMap, Leaf, Primitive, TypeDescriptor};
use crate::introspection::{FieldDef, FullType, InputValue, IntrospectionSchema, TypeKind, TypeRef};
use std::collections::BTreeMap;
use tracing::warn;

/// one resolved node of the type-reference graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphQlType<'s> {
    Scalar {
        name: &'s str,
    },
    Enum {
        name: &'s str,
        values: Vec<&'s str>,
    },
    /// `fields` is `None` for references and `Some` for definitions
    Object {
        name: &'s str,
        fields: Option<&'s [FieldDef]>,
    },
    Input {
        name: &'s str,
        fields: Option<&'s [InputValue]>,
    },
    NonNull(Box<GraphQlType<'s>>),
    List(Box<GraphQlType<'s>>),
    /// interfaces, unions and anything newer; interface definitions keep their fields
    Other {
        name: &'s str,
        kind: TypeKind,
        fields: Option<&'s [FieldDef]>,
    },
}

/// name -> definition lookup over an introspection schema
#[derive(Debug)]
pub struct SchemaIndex<'s> {
    schema: &'s IntrospectionSchema,
    types: BTreeMap<&'s str, &'s FullType>,
}

impl<'s> SchemaIndex<'s> {
    pub fn new(schema: &'s IntrospectionSchema) -> Self {
        let types = schema
            .types
            .iter()
            .map(|ty| (ty.name.as_str(), ty))
            .collect();
        Self { schema, types }
    }

    pub fn query_root(&self) -> Option<&'s str> {
        self.schema.query_root()
    }

    pub fn mutation_root(&self) -> Option<&'s str> {
        self.schema.mutation_root()
    }

    pub fn get(&self, name: &str) -> Option<&'s FullType> {
        self.types.get(name).copied()
    }

    /// named definitions in key order
    pub fn definitions(&self) -> impl Iterator<Item = &'s FullType> + '_ {
        self.types.values().copied()
    }

    /// resolve a (possibly wrapped) reference; object leaves stay shallow
    pub fn reference(&self, type_ref: &'s TypeRef) -> GraphQlType<'s> {
        let name = type_ref.name.as_deref().unwrap_or("");
        match type_ref.kind {
            TypeKind::NonNull | TypeKind::List => match &type_ref.of_type {
                Some(inner) if type_ref.kind == TypeKind::NonNull => {
                    GraphQlType::NonNull(Box::new(self.reference(inner)))
                }
                Some(inner) => GraphQlType::List(Box::new(self.reference(inner))),
                None => GraphQlType::Other {
                    name,
                    kind: type_ref.kind,
                    fields: None,
                },
            },
            TypeKind::Scalar => GraphQlType::Scalar { name },
            TypeKind::Enum => GraphQlType::Enum {
                name,
                values: self.enum_values(name),
            },
            TypeKind::Object => GraphQlType::Object { name, fields: None },
            TypeKind::InputObject => GraphQlType::Input { name, fields: None },
            kind => GraphQlType::Other {
                name,
                kind,
                fields: None,
            },
        }
    }

    /// resolve a named definition, including its declared fields
    pub fn definition(&self, ty: &'s FullType) -> GraphQlType<'s> {
        let name = ty.name.as_str();
        match ty.kind {
            TypeKind::Scalar => GraphQlType::Scalar { name },
            TypeKind::Enum => GraphQlType::Enum {
                name,
                values: enum_literals(ty),
            },
            TypeKind::Object => GraphQlType::Object {
                name,
                fields: ty.fields.as_deref(),
            },
            TypeKind::InputObject => GraphQlType::Input {
                name,
                fields: ty.input_fields.as_deref(),
            },
            kind => GraphQlType::Other {
                name,
                kind,
                fields: ty.fields.as_deref(),
            },
        }
    }

    fn enum_values(&self, name: &str) -> Vec<&'s str> {
        match self.get(name) {
            Some(ty) => enum_literals(ty),
            None => {
                warn!(type_name = name, "enum reference without a definition");
                Vec::new()
            }
        }
    }

    /// normalize a reference in one step
    pub fn normalize_ref(&self, type_ref: &'s TypeRef) -> TypeDescriptor {
        normalize(&self.reference(type_ref), self)
    }

    /// normalized `name -> descriptor` map of object fields
    pub fn field_map(&self, fields: &'s [FieldDef]) -> DescriptorMap {
        fields
            .iter()
            .map(|field| {
                let ty = self.normalize_ref(&field.type_ref).with_name(&field.name);
                (field.name.clone(), ty)
            })
            .collect()
    }

    /// normalized `name -> descriptor` map of arguments or input fields
    pub fn input_map(&self, values: &'s [InputValue]) -> DescriptorMap {
        values
            .iter()
            .map(|value| {
                let ty = self.normalize_ref(&value.type_ref).with_name(&value.name);
                (value.name.clone(), ty)
            })
            .collect()
    }
}

fn enum_literals(ty: &FullType) -> Vec<&str> {
    ty.enum_values
        .iter()
        .flatten()
        .map(|value| value.name.as_str())
        .collect()
}

/// fold a resolved type into its descriptor
pub fn normalize<'s>(ty: &GraphQlType<'s>, index: &SchemaIndex<'s>) -> TypeDescriptor {
    match ty {
        GraphQlType::Scalar { name } => scalar(name),
        GraphQlType::Enum { name, values } => TypeDescriptor::leaf(
            *name,
            Leaf::Enum {
                values: values.iter().map(|value| value.to_string()).collect(),
            },
        ),
        GraphQlType::Object { name, fields } => {
            let mut out = TypeDescriptor::leaf(*name, Leaf::Object);
            out.fields = fields
                .filter(|fields| !fields.is_empty())
                .map(|fields| index.field_map(fields));
            out
        }
        GraphQlType::Input { name, fields } => {
            let mut out = TypeDescriptor::leaf(*name, Leaf::Input);
            out.fields = fields
                .filter(|fields| !fields.is_empty())
                .map(|fields| index.input_map(fields));
            out
        }
        GraphQlType::NonNull(inner) => {
            let mut out = normalize(inner, index);
            out.required = true;
            out
        }
        GraphQlType::List(inner) => {
            let mut out = normalize(inner, index);
            out.sub_required = out.required;
            out.required = false;
            out.list = true;
            out
        }
        GraphQlType::Other { name, kind, fields } => {
            warn!(type_name = *name, ?kind, "unknown graphql type kind, keeping its name and fields");
            let mut out = TypeDescriptor::leaf(*name, Leaf::Unknown);
            out.fields = fields
                .filter(|fields| !fields.is_empty())
                .map(|fields| index.field_map(fields));
            out
        }
    }
}

fn scalar(name: &str) -> TypeDescriptor {
    match Primitive::for_scalar(name) {
        Some(class) => TypeDescriptor::primitive(name, class),
        None => {
            warn!(type_name = name, "unknown graphql scalar type");
            TypeDescriptor::primitive(name, Primitive::Unknown)
        }
    }
}
