//! naming-convention dispatch
//!
//! classifies operations by the literal verb prefix of their name. the plan
//! carries the call-metadata tag plus the lookup hints a synthesizer embeds in
//! the generated method body.

use crate::catalog::{Method, OperationCatalog, OperationKind, QueryEntry};
use serde::Serialize;

pub const TAG_RETRIEVE: &str = "document_retrieve";
pub const TAG_FIND: &str = "documents_find";
pub const TAG_CREATE: &str = "document_creation";
pub const TAG_UPDATE: &str = "document_update";
pub const TAG_DELETE: &str = "document_delete";

const OFFSET_ARG: &str = "offset";
const PAGE_SUFFIX: &str = "Page";

/// body-synthesis strategy for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Template {
    /// `get*` query
    Retrieve,
    /// `find*` query
    Find,
    /// any other query
    Query,
    Create,
    Update,
    Delete,
    /// any other mutation
    Mutation,
}

impl Template {
    pub fn classify(name: &str, kind: OperationKind) -> Self {
        match kind {
            OperationKind::Query if name.starts_with("get") => Template::Retrieve,
            OperationKind::Query if name.starts_with("find") => Template::Find,
            OperationKind::Query => Template::Query,
            OperationKind::Mutation if name.starts_with("delete") => Template::Delete,
            OperationKind::Mutation if name.starts_with("create") => Template::Create,
            OperationKind::Mutation if name.starts_with("update") => Template::Update,
            OperationKind::Mutation => Template::Mutation,
        }
    }

    /// call-metadata tag
    pub fn tag(&self) -> &'static str {
        match self {
            Template::Retrieve | Template::Query => TAG_RETRIEVE,
            Template::Find => TAG_FIND,
            Template::Create => TAG_CREATE,
            Template::Update | Template::Mutation => TAG_UPDATE,
            Template::Delete => TAG_DELETE,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Template::Create | Template::Update | Template::Delete | Template::Mutation
        )
    }
}

/// dispatch result for one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallPlan<'m> {
    pub template: Template,
    pub tag: &'static str,
    /// result-type tag carried in the call metadata
    pub model: &'m str,
    /// argument used as lookup key (`get*` only)
    pub key: Option<&'m str>,
    /// first non-`offset` argument (`find*` only)
    pub by: Option<&'m str>,
}

pub fn plan(method: &Method) -> CallPlan<'_> {
    let template = Template::classify(&method.name, method.kind);
    let model = method.return_type.gql_type.as_str();

    let (model, key, by) = match template {
        Template::Retrieve => (model, method.args.keys().next().map(String::as_str), None),
        Template::Find => (
            strip_page(model),
            None,
            method
                .args
                .keys()
                .map(String::as_str)
                .find(|name| *name != OFFSET_ARG),
        ),
        _ => (model, None, None),
    };

    CallPlan {
        template,
        tag: template.tag(),
        model,
        key,
        by,
    }
}

fn strip_page(name: &str) -> &str {
    match name.strip_suffix(PAGE_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

/// one catalog operation seen from both sides, with its plan
#[derive(Debug, Clone, Serialize)]
pub struct Operation<'c> {
    pub query: &'c QueryEntry,
    pub method: &'c Method,
    pub plan: CallPlan<'c>,
}

/// catalog operations, queries before mutations, then by name (byte order)
pub fn ordered(catalog: &OperationCatalog) -> Vec<Operation<'_>> {
    let mut operations: Vec<_> = catalog
        .queries
        .values()
        .filter_map(|query| {
            let method = catalog.methods.get(&query.name)?;
            Some(Operation {
                query,
                method,
                plan: plan(method),
            })
        })
        .collect();
    operations.sort_by(|a, b| {
        (a.query.kind, a.query.name.as_str()).cmp(&(b.query.kind, b.query.name.as_str()))
    });
    operations
}
