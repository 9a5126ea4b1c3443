//! sdl schema source
//!
//! converts a schema document into the introspection model so a checked-in
//! `.graphql` file can drive generation without a live endpoint.

use crate::error::{Error, Result};
use crate::introspection::{
    EnumValue, FieldDef, FullType, InputValue, IntrospectionSchema, RootType, TypeKind, TypeRef,
};
use graphql_parser::schema::{self, parse_schema, Definition, Type, TypeDefinition};
use std::collections::BTreeMap;
use tracing::warn;

const BUILTIN_SCALARS: &[&str] = &["Boolean", "Float", "ID", "Int", "String"];

/// parse sdl text into an introspection schema
pub fn schema_from_sdl(text: &str) -> Result<IntrospectionSchema> {
    let document = parse_schema::<String>(text).map_err(|err| Error::Sdl(err.to_string()))?;

    let mut definitions = Vec::new();
    let mut roots = None;
    for definition in &document.definitions {
        match definition {
            Definition::TypeDefinition(ty) => definitions.push(ty),
            Definition::SchemaDefinition(schema) => roots = Some(schema),
            Definition::TypeExtension(_) => warn!("type extensions are not merged, skipping"),
            Definition::DirectiveDefinition(_) => {}
        }
    }

    let mut kinds: BTreeMap<&str, TypeKind> = BTreeMap::new();
    for name in BUILTIN_SCALARS {
        kinds.insert(*name, TypeKind::Scalar);
    }
    for ty in &definitions {
        let (name, kind) = name_and_kind(ty);
        kinds.insert(name, kind);
    }

    let mut types = Vec::with_capacity(definitions.len() + BUILTIN_SCALARS.len());
    for ty in &definitions {
        types.push(convert_type(ty, &kinds)?);
    }
    for name in BUILTIN_SCALARS {
        if !types.iter().any(|ty: &FullType| ty.name == *name) {
            types.push(FullType {
                kind: TypeKind::Scalar,
                name: name.to_string(),
                description: None,
                fields: None,
                input_fields: None,
                enum_values: None,
            });
        }
    }

    let root = |declared: Option<&String>, fallback: &str| -> Option<RootType> {
        match (roots, declared) {
            (Some(_), Some(name)) => Some(name.clone()),
            (Some(_), None) => None,
            (None, _) => kinds.contains_key(fallback).then(|| fallback.to_string()),
        }
        .map(|name| RootType { name })
    };

    Ok(IntrospectionSchema {
        query_type: root(roots.and_then(|s| s.query.as_ref()), "Query"),
        mutation_type: root(roots.and_then(|s| s.mutation.as_ref()), "Mutation"),
        subscription_type: root(roots.and_then(|s| s.subscription.as_ref()), "Subscription"),
        types,
    })
}

fn name_and_kind<'d>(ty: &'d TypeDefinition<'_, String>) -> (&'d str, TypeKind) {
    match ty {
        TypeDefinition::Scalar(ty) => (ty.name.as_str(), TypeKind::Scalar),
        TypeDefinition::Object(ty) => (ty.name.as_str(), TypeKind::Object),
        TypeDefinition::Interface(ty) => (ty.name.as_str(), TypeKind::Interface),
        TypeDefinition::Union(ty) => (ty.name.as_str(), TypeKind::Union),
        TypeDefinition::Enum(ty) => (ty.name.as_str(), TypeKind::Enum),
        TypeDefinition::InputObject(ty) => (ty.name.as_str(), TypeKind::InputObject),
    }
}

fn convert_type(ty: &TypeDefinition<'_, String>, kinds: &BTreeMap<&str, TypeKind>) -> Result<FullType> {
    let (name, kind) = name_and_kind(ty);
    let mut out = FullType {
        kind,
        name: name.to_string(),
        description: None,
        fields: None,
        input_fields: None,
        enum_values: None,
    };

    match ty {
        TypeDefinition::Scalar(ty) => out.description = ty.description.clone(),
        TypeDefinition::Union(ty) => out.description = ty.description.clone(),
        TypeDefinition::Object(ty) => {
            out.description = ty.description.clone();
            out.fields = Some(convert_fields(&ty.fields, kinds)?);
        }
        TypeDefinition::Interface(ty) => {
            out.description = ty.description.clone();
            out.fields = Some(convert_fields(&ty.fields, kinds)?);
        }
        TypeDefinition::Enum(ty) => {
            out.description = ty.description.clone();
            out.enum_values = Some(
                ty.values
                    .iter()
                    .map(|value| EnumValue {
                        name: value.name.clone(),
                        description: value.description.clone(),
                    })
                    .collect(),
            );
        }
        TypeDefinition::InputObject(ty) => {
            out.description = ty.description.clone();
            out.input_fields = Some(convert_inputs(&ty.fields, kinds)?);
        }
    }
    Ok(out)
}

fn convert_fields(
    fields: &[schema::Field<'_, String>],
    kinds: &BTreeMap<&str, TypeKind>,
) -> Result<Vec<FieldDef>> {
    fields
        .iter()
        .map(|field| {
            Ok(FieldDef {
                name: field.name.clone(),
                description: field.description.clone(),
                args: convert_inputs(&field.arguments, kinds)?,
                type_ref: convert_ref(&field.field_type, kinds)?,
            })
        })
        .collect()
}

fn convert_inputs(
    values: &[schema::InputValue<'_, String>],
    kinds: &BTreeMap<&str, TypeKind>,
) -> Result<Vec<InputValue>> {
    values
        .iter()
        .map(|value| {
            Ok(InputValue {
                name: value.name.clone(),
                description: value.description.clone(),
                type_ref: convert_ref(&value.value_type, kinds)?,
                default_value: value.default_value.as_ref().map(ToString::to_string),
            })
        })
        .collect()
}

fn convert_ref(ty: &Type<'_, String>, kinds: &BTreeMap<&str, TypeKind>) -> Result<TypeRef> {
    match ty {
        Type::NamedType(name) => match kinds.get(name.as_str()) {
            Some(kind) => Ok(TypeRef::named(*kind, name.clone())),
            None => Err(Error::Sdl(format!("unknown type '{name}'"))),
        },
        Type::ListType(inner) => Ok(TypeRef::list(convert_ref(inner, kinds)?)),
        Type::NonNullType(inner) => Ok(TypeRef::non_null(convert_ref(inner, kinds)?)),
    }
}
