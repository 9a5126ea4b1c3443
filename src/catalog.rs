//! operation catalog
//!
//! walks the query and mutation roots and records every root field twice: as
//! a `queries` entry (for query-string assembly) and as a `methods` entry (for
//! callable signatures).

use crate::descriptor::{DescriptorMap, TypeDescriptor};
use crate::error::{Error, Result};
use crate::flatten::SchemaModel;
use crate::introspection::{FieldDef, TypeKind};
use crate::normalize::SchemaIndex;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// operation seen from the query-string side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEntry {
    pub name: String,
    pub kind: OperationKind,
    pub args: DescriptorMap,
    /// selectable fields of the return type, one level deep
    pub fields: DescriptorMap,
}

/// operation seen from the callable-signature side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    pub args: DescriptorMap,
    pub return_type: TypeDescriptor,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub kind: OperationKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationCatalog {
    pub queries: IndexMap<String, QueryEntry>,
    pub methods: IndexMap<String, Method>,
}

impl OperationCatalog {
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    fn insert<'s>(
        &mut self,
        field: &'s FieldDef,
        kind: OperationKind,
        index: &SchemaIndex<'s>,
        model: &SchemaModel,
    ) {
        let args = index.input_map(&field.args);
        let return_type = index.normalize_ref(&field.type_ref);
        let fields = model
            .get(&return_type.gql_type)
            .and_then(|ty| ty.fields.clone())
            .unwrap_or_default();

        self.queries.insert(
            field.name.clone(),
            QueryEntry {
                name: field.name.clone(),
                kind,
                args: args.clone(),
                fields,
            },
        );
        self.methods.insert(
            field.name.clone(),
            Method {
                name: field.name.clone(),
                args,
                return_type,
                is_async: true,
                kind,
            },
        );
    }
}

/// build the catalog from the query root and the optional mutation root
pub fn build_catalog(index: &SchemaIndex<'_>, model: &SchemaModel) -> Result<OperationCatalog> {
    let mut catalog = OperationCatalog::default();

    let query_root = index.query_root().unwrap_or("Query");
    for field in root_fields(index, query_root)? {
        catalog.insert(field, OperationKind::Query, index, model);
    }

    if let Some(mutation_root) = index.mutation_root() {
        for field in root_fields(index, mutation_root)? {
            catalog.insert(field, OperationKind::Mutation, index, model);
        }
    }

    debug!(operations = catalog.len(), "built operation catalog");
    Ok(catalog)
}

fn root_fields<'s>(index: &SchemaIndex<'s>, root: &str) -> Result<&'s [FieldDef]> {
    match index.get(root) {
        Some(ty) if ty.kind == TypeKind::Object => Ok(ty.fields.as_deref().unwrap_or_default()),
        _ => Err(Error::MissingRoot {
            root: root.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{flatten, IgnoreList};
    use crate::introspection::{FullType, InputValue, IntrospectionSchema, RootType, TypeRef};

    fn object(name: &str, fields: Vec<FieldDef>) -> FullType {
        FullType {
            kind: TypeKind::Object,
            name: name.to_string(),
            description: None,
            fields: Some(fields),
            input_fields: None,
            enum_values: None,
        }
    }

    fn scalar(name: &str) -> FullType {
        FullType {
            kind: TypeKind::Scalar,
            name: name.to_string(),
            description: None,
            fields: None,
            input_fields: None,
            enum_values: None,
        }
    }

    fn field(name: &str, type_ref: TypeRef, args: Vec<InputValue>) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            description: None,
            args,
            type_ref,
        }
    }

    fn arg(name: &str, type_ref: TypeRef) -> InputValue {
        InputValue {
            name: name.to_string(),
            description: None,
            type_ref,
            default_value: None,
        }
    }

    fn schema(with_mutation: bool) -> IntrospectionSchema {
        let id = || TypeRef::non_null(TypeRef::named(TypeKind::Scalar, "ID"));
        let user = object(
            "User",
            vec![
                field("id", id(), vec![]),
                field("name", TypeRef::named(TypeKind::Scalar, "String"), vec![]),
            ],
        );
        let query = object(
            "Query",
            vec![
                field(
                    "getUser",
                    TypeRef::named(TypeKind::Object, "User"),
                    vec![arg("id", id())],
                ),
                field("version", TypeRef::named(TypeKind::Scalar, "String"), vec![]),
            ],
        );
        let mutation = object(
            "Mutation",
            vec![field(
                "deleteUser",
                TypeRef::named(TypeKind::Scalar, "Boolean"),
                vec![arg("id", id())],
            )],
        );
        let mut types = vec![user, query, scalar("ID"), scalar("String"), scalar("Boolean")];
        if with_mutation {
            types.push(mutation);
        }
        IntrospectionSchema {
            query_type: Some(RootType {
                name: "Query".to_string(),
            }),
            mutation_type: Some(RootType {
                name: "Mutation".to_string(),
            }),
            subscription_type: None,
            types,
        }
    }

    #[test]
    fn test_catalog_entries() {
        let schema = schema(true);
        let index = SchemaIndex::new(&schema);
        let model = flatten(&index, &IgnoreList::builtin());
        let catalog = build_catalog(&index, &model).unwrap();

        assert_eq!(
            catalog.queries.keys().collect::<Vec<_>>(),
            ["getUser", "version", "deleteUser"]
        );

        let get_user = &catalog.queries["getUser"];
        assert_eq!(get_user.kind, OperationKind::Query);
        assert_eq!(get_user.fields.keys().collect::<Vec<_>>(), ["id", "name"]);
        assert!(get_user.args["id"].required);

        let method = &catalog.methods["getUser"];
        assert!(method.is_async);
        assert_eq!(method.return_type.gql_type, "User");
        assert_eq!(method.args, get_user.args);

        assert!(catalog.queries["version"].fields.is_empty());
        assert_eq!(catalog.methods["deleteUser"].kind, OperationKind::Mutation);
    }

    #[test]
    fn test_missing_mutation_root_is_named() {
        let schema = schema(false);
        let index = SchemaIndex::new(&schema);
        let model = flatten(&index, &IgnoreList::builtin());
        let err = build_catalog(&index, &model).unwrap_err();
        assert!(matches!(err, Error::MissingRoot { ref root } if root == "Mutation"));
    }

    #[test]
    fn test_absent_mutation_root_is_allowed() {
        let mut schema = schema(false);
        schema.mutation_type = None;
        let index = SchemaIndex::new(&schema);
        let model = flatten(&index, &IgnoreList::builtin());
        let catalog = build_catalog(&index, &model).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog
            .methods
            .values()
            .all(|method| method.kind == OperationKind::Query));
    }
}
