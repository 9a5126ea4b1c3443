//! required-model closure
//!
//! marks every non-primitive type that an operation takes as an argument or
//! returns directly. nested fields of those types are not chased.

use crate::catalog::OperationCatalog;
use crate::descriptor::TypeDescriptor;
use crate::flatten::SchemaModel;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// names of the types reachable from the public api surface
///
/// serialized as `{name: {name}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredModelSet(BTreeSet<String>);

#[derive(Serialize)]
struct Marker<'a> {
    name: &'a str,
}

impl Serialize for RequiredModelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for name in &self.0 {
            map.serialize_entry(name, &Marker { name })?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RequiredModelSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::flatten::map_keys(deserializer).map(Self)
    }
}

impl RequiredModelSet {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// return the model with `required` set on every directly referenced type
pub fn track_required(
    mut model: SchemaModel,
    catalog: &OperationCatalog,
) -> (SchemaModel, RequiredModelSet) {
    let mut required = BTreeSet::new();

    for method in catalog.methods.values() {
        let references = method
            .args
            .values()
            .chain(std::iter::once(&method.return_type));
        for ty in references {
            mark(&mut model, &mut required, &method.name, ty);
        }
    }

    debug!(required = required.len(), "tracked required models");
    (model, RequiredModelSet(required))
}

fn mark(
    model: &mut SchemaModel,
    required: &mut BTreeSet<String>,
    operation: &str,
    ty: &TypeDescriptor,
) {
    if ty.is_primitive() || required.contains(&ty.gql_type) {
        return;
    }

    match model.types.get_mut(&ty.gql_type) {
        Some(entry) => {
            entry.required = true;
            required.insert(ty.gql_type.clone());
        }
        None => warn!(
            operation,
            type_name = %ty.gql_type,
            "operation references a type the schema does not define"
        ),
    }
}
