//! service definition pipeline
//!
//! `flatten -> build_catalog -> track_required`, each stage handing a new value
//! to the next. the result is the full intermediate model a synthesizer reads.

use crate::catalog::{build_catalog, OperationCatalog};
use crate::error::Result;
use crate::flatten::{flatten, IgnoreList, SchemaModel};
use crate::introspection::IntrospectionSchema;
use crate::normalize::SchemaIndex;
use crate::required::{track_required, RequiredModelSet};
use serde::{Deserialize, Serialize};
use tracing::info;

/// everything derived from one introspection snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    #[serde(flatten)]
    pub model: SchemaModel,
    #[serde(flatten)]
    pub catalog: OperationCatalog,
    pub required_models: RequiredModelSet,
}

impl ServiceDefinition {
    /// required model names that are not inputs, in key order
    pub fn required_models(&self) -> impl Iterator<Item = &str> {
        self.required_models
            .iter()
            .filter(|name| self.model.models.contains(*name))
    }

    /// required input names, in key order
    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.required_models
            .iter()
            .filter(|name| self.model.inputs.contains(*name))
    }
}

/// run every compute stage over one schema
pub fn build_definition(
    schema: &IntrospectionSchema,
    ignored: &IgnoreList,
) -> Result<ServiceDefinition> {
    let index = SchemaIndex::new(schema);
    let model = flatten(&index, ignored);
    let catalog = build_catalog(&index, &model)?;
    let (model, required_models) = track_required(model, &catalog);

    info!(
        types = model.types.len(),
        operations = catalog.len(),
        required = required_models.len(),
        "built service definition"
    );

    Ok(ServiceDefinition {
        model,
        catalog,
        required_models,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{"data": {"__schema": {
        "queryType": {"name": "Query"},
        "mutationType": {"name": "Mutation"},
        "types": [
            {"kind": "OBJECT", "name": "Query", "fields": [
                {"name": "getUser", "args": [
                    {"name": "id", "type": {"kind": "NON_NULL", "ofType": {"kind": "SCALAR", "name": "ID"}}}
                ], "type": {"kind": "OBJECT", "name": "User"}}
            ]},
            {"kind": "OBJECT", "name": "Mutation", "fields": [
                {"name": "createUser", "args": [
                    {"name": "input", "type": {"kind": "INPUT_OBJECT", "name": "CreateUserInput"}}
                ], "type": {"kind": "OBJECT", "name": "User"}}
            ]},
            {"kind": "OBJECT", "name": "User", "fields": [
                {"name": "id", "args": [], "type": {"kind": "SCALAR", "name": "ID"}}
            ]},
            {"kind": "INPUT_OBJECT", "name": "CreateUserInput", "inputFields": [
                {"name": "name", "type": {"kind": "SCALAR", "name": "String"}}
            ]},
            {"kind": "SCALAR", "name": "ID"},
            {"kind": "SCALAR", "name": "String"}
        ]
    }}}"#;

    #[test]
    fn test_pipeline_splits_required_models_and_inputs() {
        let schema = IntrospectionSchema::from_json(SCHEMA).unwrap();
        let definition = build_definition(&schema, &IgnoreList::builtin()).unwrap();

        assert_eq!(definition.required_models().collect::<Vec<_>>(), ["User"]);
        assert_eq!(
            definition.required_inputs().collect::<Vec<_>>(),
            ["CreateUserInput"]
        );
        assert!(definition.model.types["User"].required);
        assert!(!definition.model.types["Query"].required);
    }

    #[test]
    fn test_definition_serializes_flat() {
        let schema = IntrospectionSchema::from_json(SCHEMA).unwrap();
        let definition = build_definition(&schema, &IgnoreList::builtin()).unwrap();
        let json = serde_json::to_value(&definition).unwrap();

        for key in [
            "types",
            "models",
            "inputs",
            "ignoredModels",
            "queries",
            "methods",
            "requiredModels",
        ] {
            assert!(json.get(key).is_some(), "{key}");
        }
        assert_eq!(json["methods"]["createUser"]["async"], true);
        assert_eq!(json["models"]["User"]["fields"]["id"]["gqlType"], "ID");
        assert_eq!(json["requiredModels"]["User"]["name"], "User");
        assert_eq!(json["queries"]["getUser"]["kind"], "query");
    }
}
