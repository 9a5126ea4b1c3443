//! schema flattener
//!
//! turns the whole named-type map into key-sorted dictionaries and splits the
//! names into models and inputs. the split is a naming contract: a type whose
//! name ends with `Input` is an input, everything else is a model.

use crate::descriptor::TypeDescriptor;
use crate::normalize::{normalize, SchemaIndex};
use serde::de::IgnoredAny;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const INPUT_SUFFIX: &str = "Input";

/// well-known scalar names that never count as models
const BUILTIN_SCALARS: &[&str] = &[
    "BigInt", "Boolean", "Int", "String", "Float", "ID", "Date", "Time", "DateTime", "Timestamp",
    "UtcOffset", "Duration", "ISO8601Duration", "LocalDate", "LocalTime", "LocalEndTime",
    "EmailAddress", "NegativeFloat", "NegativeInt", "NonEmptyString", "NonNegativeFloat",
    "NonNegativeInt", "NonPositiveFloat", "NonPositiveInt", "PhoneNumber", "PositiveFloat",
    "PositiveInt", "PostalCode", "UnsignedFloat", "UnsignedInt", "URL", "Byte", "Long", "SafeInt",
    "UUID", "GUID", "Hexadecimal", "HexColorCode", "HSL", "HSLA", "IPv4", "IPv6", "ISBN", "JWT",
    "Latitude", "Longitude", "MAC", "Port", "RGB", "RGBA", "USCurrency", "Currency", "JSON",
    "JSONObject", "IBAN", "ObjectID", "Void", "DID", "TimeZone", "CountryCode", "Locale",
    "RoutingNumber", "AccountNumber", "Cuid", "Upload",
];

/// set of type names excluded from model/input classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnoreList(BTreeSet<String>);

impl IgnoreList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// the stock list of graphql and graphql-scalars names
    pub fn builtin() -> Self {
        Self::new(BUILTIN_SCALARS.iter().copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into());
        self
    }
}

/// flattened whole-schema view
///
/// serializes `models` and `inputs` as `name -> descriptor` maps so templates
/// can reach the fields of each entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaModel {
    /// every named type, key-sorted
    pub types: BTreeMap<String, TypeDescriptor>,
    /// names of model types (keys into `types`)
    #[serde(deserialize_with = "map_keys")]
    pub models: BTreeSet<String>,
    /// names of input types (keys into `types`)
    #[serde(deserialize_with = "map_keys")]
    pub inputs: BTreeSet<String>,
    pub ignored_models: IgnoreList,
}

impl Serialize for SchemaModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SchemaModel", 4)?;
        state.serialize_field("types", &self.types)?;
        state.serialize_field("models", &self.subset(&self.models))?;
        state.serialize_field("inputs", &self.subset(&self.inputs))?;
        state.serialize_field("ignoredModels", &self.ignored_models)?;
        state.end()
    }
}

/// keys of a serialized name map
pub(crate) fn map_keys<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
    let map = BTreeMap::<String, IgnoredAny>::deserialize(deserializer)?;
    Ok(map.into_keys().collect())
}

impl SchemaModel {
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn models(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.models.iter().filter_map(|name| self.types.get(name))
    }

    pub fn inputs(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.inputs.iter().filter_map(|name| self.types.get(name))
    }

    fn subset<'a>(&'a self, names: &'a BTreeSet<String>) -> BTreeMap<&'a str, &'a TypeDescriptor> {
        names
            .iter()
            .filter_map(|name| Some((name.as_str(), self.types.get(name)?)))
            .collect()
    }
}

pub fn is_input_name(name: &str) -> bool {
    name.len() > INPUT_SUFFIX.len() && name.ends_with(INPUT_SUFFIX)
}

fn is_meta_type(name: &str) -> bool {
    name.starts_with("__")
}

/// flatten every named type of the schema
pub fn flatten(index: &SchemaIndex<'_>, ignored: &IgnoreList) -> SchemaModel {
    let mut types = BTreeMap::new();
    let mut models = BTreeSet::new();
    let mut inputs = BTreeSet::new();

    for definition in index.definitions() {
        let name = definition.name.clone();
        let ty = normalize(&index.definition(definition), index).with_name(&name);

        if is_input_name(&name) {
            inputs.insert(name.clone());
        } else if !ignored.contains(&name) && !is_meta_type(&name) {
            models.insert(name.clone());
        }
        types.insert(name, ty);
    }

    debug!(
        types = types.len(),
        models = models.len(),
        inputs = inputs.len(),
        "flattened schema"
    );

    SchemaModel {
        types,
        models,
        inputs,
        ignored_models: ignored.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::{FieldDef, FullType, IntrospectionSchema, TypeKind, TypeRef};

    fn named(kind: TypeKind, name: &str) -> FullType {
        FullType {
            kind,
            name: name.to_string(),
            description: None,
            fields: None,
            input_fields: None,
            enum_values: None,
        }
    }

    fn schema() -> IntrospectionSchema {
        IntrospectionSchema {
            types: vec![
                named(TypeKind::Object, "User"),
                named(TypeKind::Scalar, "String"),
                named(TypeKind::InputObject, "CreateUserInput"),
                named(TypeKind::Object, "Account"),
                named(TypeKind::Object, "__Schema"),
                named(TypeKind::Scalar, "DateTime"),
                named(TypeKind::Object, "Input"),
                named(TypeKind::InputObject, "AccountInput"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_input_name_pattern() {
        assert!(is_input_name("CreateUserInput"));
        assert!(!is_input_name("Input"));
        assert!(!is_input_name("InputUser"));
    }

    #[test]
    fn test_flatten_orders_and_splits() {
        let schema = schema();
        let index = SchemaIndex::new(&schema);
        let model = flatten(&index, &IgnoreList::builtin());

        let keys: Vec<_> = model.types.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 8);

        assert_eq!(
            model.models.iter().collect::<Vec<_>>(),
            ["Account", "Input", "User"]
        );
        assert_eq!(
            model.inputs.iter().collect::<Vec<_>>(),
            ["AccountInput", "CreateUserInput"]
        );
        assert!(model.models.is_disjoint(&model.inputs));
        for name in model.models.iter().chain(model.inputs.iter()) {
            assert!(model.types.contains_key(name));
        }

        // ignored names stay in `types`
        assert!(model.types.contains_key("DateTime"));
        assert_eq!(model.types["User"].name.as_deref(), Some("User"));
    }

    #[test]
    fn test_custom_ignore_list() {
        let schema = schema();
        let index = SchemaIndex::new(&schema);
        let model = flatten(&index, &IgnoreList::builtin().with("Account"));
        assert!(!model.models.contains("Account"));
        assert!(model.ignored_models.contains("Account"));
        assert!(model.types.contains_key("Account"));
    }

    #[test]
    fn test_interface_is_a_model_with_fields() {
        let mut schema = schema();
        let mut node = named(TypeKind::Interface, "Node");
        node.fields = Some(vec![FieldDef {
            name: "id".to_string(),
            description: None,
            args: vec![],
            type_ref: TypeRef::named(TypeKind::Scalar, "String"),
        }]);
        schema.types.push(node);
        let index = SchemaIndex::new(&schema);
        let model = flatten(&index, &IgnoreList::builtin());

        assert!(model.models.contains("Node"));
        let fields = model.types["Node"].fields.as_ref().unwrap();
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["id"]);
    }

    #[test]
    fn test_models_serialize_as_descriptor_maps() {
        let schema = schema();
        let index = SchemaIndex::new(&schema);
        let model = flatten(&index, &IgnoreList::builtin());

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["models"]["User"]["gqlType"], "User");
        assert_eq!(json["inputs"]["CreateUserInput"]["leaf"], "input");
        assert!(json["models"].get("DateTime").is_none());
        assert!(json["ignoredModels"].is_array());

        let back: SchemaModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, model);
    }
}
