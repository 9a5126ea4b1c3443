//! go sources
//!
//! hand-assembled go package: query strings with a selection placeholder,
//! model/input structs for the required types, and one typed sdk method per
//! operation whose body follows the dispatch plan.

use crate::definition::ServiceDefinition;
use crate::descriptor::{Leaf, TypeDescriptor};
use crate::dispatch::{ordered, CallPlan, Operation, Template};
use crate::targets::{Primitives, TargetSpec};
use std::collections::BTreeSet;
use std::fmt::Write as _;

pub const DEFAULT_MODULE: &str = "sdk";
pub const SELECTIONS: &str = "@selections@";
/// selection used when the result type offers no primitive field (unions)
pub const TYPENAME: &str = "__typename";

const HEADER: &str = "// Code generated by gql-sdkgen. DO NOT EDIT.\n\n";
const TYPES_QUALIFIER: &str = "types.";

const GO_RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
    // names the generated method bodies use
    "ctx", "err", "meta", "request", "response", "s", "selections",
];

/// `(path, text)` for every synthesized go file
pub fn sources(definition: &ServiceDefinition, target: &TargetSpec, module: &str) -> Vec<(String, String)> {
    let operations = ordered(&definition.catalog);
    let emitted = emitted_types(definition);
    let (inputs, models): (Vec<&str>, Vec<&str>) = emitted
        .into_iter()
        .partition(|name| definition.model.inputs.contains(*name));
    vec![
        ("cmd/main/queries.go".to_string(), queries_file(&operations)),
        (
            "cmd/main/types/inputs.go".to_string(),
            types_file(definition, inputs, &target.primitives),
        ),
        (
            "cmd/main/types/models.go".to_string(),
            types_file(definition, models, &target.primitives),
        ),
        (
            "cmd/main/sdk.go".to_string(),
            sdk_file(&operations, &target.primitives, module),
        ),
    ]
}

fn queries_file(operations: &[Operation<'_>]) -> String {
    let mut out = String::from(HEADER);
    out.push_str("package sdk\n\nimport \"strings\"\n\n");
    out.push_str("// QueryAndFields pairs an operation with its default selection.\n");
    out.push_str("type QueryAndFields struct {\n");
    push_aligned(
        &mut out,
        &[
            vec!["Query".to_string(), "string".to_string()],
            vec!["Fields".to_string(), "[]string".to_string()],
        ],
    );
    out.push_str("}\n\n");
    out.push_str("// Render fills the selection placeholder, using Fields when none are given.\n");
    out.push_str("func (q QueryAndFields) Render(selections ...string) string {\n");
    out.push_str("\tif len(selections) == 0 {\n\t\tselections = q.Fields\n\t}\n");
    let _ = writeln!(
        out,
        "\treturn strings.Replace(q.Query, {}, strings.Join(selections, \" \"), 1)",
        go_string(SELECTIONS)
    );
    out.push_str("}\n");

    for operation in operations {
        let fields = default_fields(operation)
            .into_iter()
            .map(go_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            out,
            "\nvar {} = QueryAndFields{{{}, []string{{{}}}}}\n",
            query_var(&operation.query.name),
            go_string(&query_string(operation)),
            fields
        );
    }
    out
}

/// parametrized operation text with the selection placeholder
pub fn query_string(operation: &Operation<'_>) -> String {
    let query = operation.query;
    let mut out = query.kind.as_str().to_string();

    if !query.args.is_empty() {
        let defs = query
            .args
            .iter()
            .map(|(name, ty)| format!("${name}: {}", ty.gql_signature()))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "({defs})");
    }

    let _ = write!(out, " {{ {}", query.name);
    if !query.args.is_empty() {
        let args = query
            .args
            .keys()
            .map(|name| format!("{name}: ${name}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "({args})");
    }
    if has_selection(&operation.method.return_type) {
        let _ = write!(out, " {{ {SELECTIONS} }}");
    }
    out.push_str(" }");
    out
}

/// primitive result fields, or `__typename` when the result has none
fn default_fields<'c>(operation: &Operation<'c>) -> Vec<&'c str> {
    let fields: Vec<&'c str> = operation
        .query
        .fields
        .iter()
        .filter(|(_, ty)| ty.is_primitive())
        .map(|(name, _)| name.as_str())
        .collect();
    if fields.is_empty() && has_selection(&operation.method.return_type) {
        vec![TYPENAME]
    } else {
        fields
    }
}

fn has_selection(ty: &TypeDescriptor) -> bool {
    !ty.is_primitive() && !ty.is_enum()
}

/// required types plus every type their fields reference, transitively
///
/// the required set itself stays single-pass; go needs each named field type
/// declared in package `types` to compile.
fn emitted_types(definition: &ServiceDefinition) -> BTreeSet<&str> {
    let mut emitted = BTreeSet::new();
    let mut pending: Vec<&str> = definition.required_models.iter().collect();

    while let Some(name) = pending.pop() {
        let Some(ty) = definition.model.get(name) else {
            continue;
        };
        if ty.is_primitive() || !emitted.insert(name) {
            continue;
        }
        pending.extend(
            ty.field_iter()
                .filter(|(_, field)| !field.is_primitive())
                .map(|(_, field)| field.gql_type.as_str()),
        );
    }
    emitted
}

fn types_file(definition: &ServiceDefinition, names: Vec<&str>, primitives: &Primitives) -> String {
    let mut out = String::from(HEADER);
    out.push_str("package types\n");

    for name in names {
        let Some(ty) = definition.model.get(name) else {
            continue;
        };
        out.push('\n');
        out.push_str(&type_decl(name, ty, primitives));
    }
    out
}

/// one required type: struct, enum constants, or an opaque alias
pub fn type_decl(name: &str, ty: &TypeDescriptor, primitives: &Primitives) -> String {
    let ident = exported(name);
    let mut out = String::new();

    match &ty.leaf {
        Leaf::Enum { values } => {
            let _ = writeln!(out, "type {ident} string");
            if !values.is_empty() {
                out.push_str("\nconst (\n");
                let rows: Vec<_> = values
                    .iter()
                    .map(|value| {
                        vec![
                            format!("{ident}{}", exported(value)),
                            ident.clone(),
                            format!("= {}", go_string(value)),
                        ]
                    })
                    .collect();
                push_aligned(&mut out, &rows);
                out.push_str(")\n");
            }
        }
        Leaf::Unknown if ty.fields.is_none() => {
            let _ = writeln!(out, "type {ident} {}", primitives.unknown);
        }
        Leaf::Object | Leaf::Input | Leaf::Unknown => {
            let _ = writeln!(out, "type {ident} struct {{");
            let rows: Vec<_> = ty
                .field_iter()
                .map(|(field, field_ty)| {
                    vec![
                        exported(field),
                        go_type(field_ty, primitives, "", Some(name)),
                        json_tag(field),
                    ]
                })
                .collect();
            push_aligned(&mut out, &rows);
            out.push_str("}\n");
        }
        Leaf::Primitive { .. } => {
            let _ = writeln!(out, "type {ident} {}", primitives.unknown);
        }
    }
    out
}

fn sdk_file(operations: &[Operation<'_>], primitives: &Primitives, module: &str) -> String {
    let mut body = String::new();
    for operation in operations {
        body.push('\n');
        body.push_str(&method_decl(operation, primitives));
    }

    let mut out = String::from(HEADER);
    out.push_str("package sdk\n\nimport (\n\t\"context\"\n");
    if body.contains(TYPES_QUALIFIER) {
        let _ = writeln!(out, "\n\t{}", go_string(&format!("{module}/cmd/main/types")));
    }
    out.push_str(")\n\n");

    out.push_str("// CallMeta describes one sdk call to the executor.\n");
    out.push_str("type CallMeta struct {\n");
    push_aligned(
        &mut out,
        &[
            vec!["Name".to_string(), "string".to_string()],
            vec!["Type".to_string(), "string".to_string()],
            vec!["Model".to_string(), "string".to_string()],
            vec!["Key".to_string(), "string".to_string()],
            vec!["Value".to_string(), "interface{}".to_string()],
            vec!["By".to_string(), "string".to_string()],
        ],
    );
    out.push_str("}\n\n");

    out.push_str("// Executor sends a rendered operation and decodes the response data into out.\n");
    out.push_str("type Executor interface {\n");
    out.push_str("\tQuery(ctx context.Context, query string, variables interface{}, meta CallMeta, out interface{}) error\n");
    out.push_str("\tMutate(ctx context.Context, query string, variables interface{}, meta CallMeta, out interface{}) error\n");
    out.push_str("}\n\n");

    out.push_str("type Sdk struct {\n");
    push_aligned(
        &mut out,
        &[
            vec!["Env".to_string(), "string".to_string()],
            vec!["Executor".to_string(), "Executor".to_string()],
        ],
    );
    out.push_str("}\n\n");
    out.push_str("func NewSdk(env string, executor Executor) *Sdk {\n");
    out.push_str("\treturn &Sdk{Env: env, Executor: executor}\n}\n");

    out.push_str(&body);
    out
}

/// request/response structs plus the typed method
pub fn method_decl(operation: &Operation<'_>, primitives: &Primitives) -> String {
    let method = operation.method;
    let plan = &operation.plan;
    let ident = exported(&method.name);
    let return_type = go_type(&method.return_type, primitives, TYPES_QUALIFIER, None);
    let mut out = String::new();

    let _ = writeln!(out, "type {ident}Request struct {{");
    let rows: Vec<_> = method
        .args
        .iter()
        .map(|(name, ty)| {
            vec![
                exported(name),
                go_type(ty, primitives, TYPES_QUALIFIER, None),
                json_tag(name),
            ]
        })
        .collect();
    push_aligned(&mut out, &rows);
    out.push_str("}\n\n");

    let _ = writeln!(out, "type {ident}Response struct {{");
    push_aligned(
        &mut out,
        &[vec![ident.clone(), return_type.clone(), json_tag(&method.name)]],
    );
    out.push_str("}\n\n");

    let mut params = vec!["ctx context.Context".to_string()];
    params.extend(method.args.iter().map(|(name, ty)| {
        format!(
            "{} {}",
            param(name),
            go_type(ty, primitives, TYPES_QUALIFIER, None)
        )
    }));
    params.push("selections ...string".to_string());

    let _ = writeln!(
        out,
        "func (s *Sdk) {ident}({}) ({return_type}, error) {{",
        params.join(", ")
    );
    let assignments = method
        .args
        .keys()
        .map(|name| format!("{}: {}", exported(name), param(name)))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "\trequest := {ident}Request{{{assignments}}}");
    let _ = writeln!(out, "\tmeta := {}", call_meta(&method.name, plan));
    let _ = writeln!(out, "\tvar response {ident}Response");
    let call = if plan.template.is_mutation() {
        "Mutate"
    } else {
        "Query"
    };
    let _ = writeln!(
        out,
        "\terr := s.Executor.{call}(ctx, {}.Render(selections...), request, meta, &response)",
        query_var(&method.name)
    );
    let _ = writeln!(out, "\treturn response.{ident}, err");
    out.push_str("}\n");
    out
}

fn call_meta(name: &str, plan: &CallPlan<'_>) -> String {
    let mut parts = vec![
        format!("Name: {}", go_string(name)),
        format!("Type: {}", go_string(plan.tag)),
        format!("Model: {}", go_string(plan.model)),
    ];
    match plan.template {
        Template::Retrieve => {
            if let Some(key) = plan.key {
                parts.push(format!("Key: {}", go_string(key)));
                parts.push(format!("Value: {}", param(key)));
            }
        }
        Template::Find => {
            if let Some(by) = plan.by {
                parts.push(format!("By: {}", go_string(by)));
            }
        }
        _ => {}
    }
    format!("CallMeta{{{}}}", parts.join(", "))
}

/// go spelling of a descriptor; `owner` turns direct self references into pointers
pub fn go_type(ty: &TypeDescriptor, primitives: &Primitives, qualifier: &str, owner: Option<&str>) -> String {
    let element = if ty.is_primitive() {
        primitives.get(&ty.gql_type).to_string()
    } else {
        format!("{qualifier}{}", exported(&ty.gql_type))
    };

    if ty.list {
        format!("[]{element}")
    } else if owner == Some(ty.gql_type.as_str()) {
        format!("*{element}")
    } else {
        element
    }
}

fn json_tag(name: &str) -> String {
    format!("`json:\"{name}\"`")
}

fn query_var(name: &str) -> String {
    format!("Build{}", exported(name))
}

/// exported go identifier: first letter upper-cased
pub fn exported(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            first.to_ascii_uppercase().to_string() + chars.as_str()
        }
        Some(_) => format!("X{name}"),
        None => String::new(),
    }
}

/// parameter identifier that cannot collide with keywords or body locals
fn param(name: &str) -> String {
    if GO_RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

fn go_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            ch => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// tab-indented rows with every column but the last padded to its widest cell
fn push_aligned(out: &mut String, rows: &[Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    for row in rows {
        out.push('\t');
        for (col, cell) in row.iter().enumerate() {
            if col + 1 == row.len() {
                out.push_str(cell);
            } else {
                let _ = write!(out, "{cell:<width$} ", width = widths[col]);
            }
        }
        out.push('\n');
    }
}
