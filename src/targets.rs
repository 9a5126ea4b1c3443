//! target languages
//!
//! one data table drives every target: primitive spellings, the files rendered
//! from templates, the files copied verbatim, and whether a richer strategy
//! synthesizes sources directly.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// template family every built-in target belongs to
pub const TEMPLATE_FAMILY: &str = "graphql";
const DEFAULT_TEMPLATE: &str = "default";

/// target spelling of the primitive classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Primitives {
    pub int: &'static str,
    pub float: &'static str,
    pub text: &'static str,
    pub boolean: &'static str,
    pub unknown: &'static str,
}

impl Primitives {
    /// target type for a scalar name, `unknown` outside the fixed table
    pub fn get(&self, gql_type: &str) -> &'static str {
        match gql_type {
            "Int" | "BigInt" => self.int,
            "Float" => self.float,
            "String" | "ID" => self.text,
            "Boolean" => self.boolean,
            _ => self.unknown,
        }
    }
}

/// how file contents are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// every file comes from a template
    Templates,
    /// templates plus synthesized go sources
    Go,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    pub language: &'static str,
    pub primitives: Primitives,
    /// paths rendered from `<path>.hbs`
    pub rendered: &'static [&'static str],
    /// paths copied verbatim from the template directory
    pub copied: &'static [&'static str],
    pub strategy: Strategy,
    /// npm packaging, for targets that render a `package.json`
    #[serde(skip)]
    pub npm: Option<&'static NpmPackage>,
}

/// npm package layout and the dependencies every generated package starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpmPackage {
    pub main: &'static str,
    pub types: Option<&'static str>,
    /// shipped source directory
    pub dir: &'static str,
    /// `build` script
    pub build: &'static str,
    pub dependencies: &'static [(&'static str, &'static str)],
    pub peer_dependencies: &'static [(&'static str, &'static str)],
    pub dev_dependencies: &'static [(&'static str, &'static str)],
}

const TYPESCRIPT_PACKAGE: NpmPackage = NpmPackage {
    main: "lib/index.js",
    types: Some("lib/index.d.ts"),
    dir: "lib",
    build: "tsc",
    dependencies: &[("jwt-decode", "^3.1.2"), ("@genstackio/retry", "^0.1.1")],
    peer_dependencies: &[("cross-fetch", "^3.1.5")],
    dev_dependencies: &[
        ("@babel/core", "^7.18.10"),
        ("@babel/preset-env", "^7.18.10"),
        ("@babel/preset-typescript", "^7.18.6"),
        ("babel-loader", "^8.2.5"),
        ("cross-fetch", "^3.1.5"),
        ("source-map-loader", "^4.0.0"),
        ("jest", "^28.1.3"),
        ("typescript", "^4.7.4"),
        ("@types/node", "^16.11.51"),
        ("@types/jest", "^28.1.7"),
        ("ts-jest", "^28.0.8"),
        ("webpack", "^5.74.0"),
    ],
};

const JAVASCRIPT_PACKAGE: NpmPackage = NpmPackage {
    main: "src/index.js",
    types: None,
    dir: "src",
    build: "true",
    dependencies: &[("jwt-decode", "^3.1.2")],
    peer_dependencies: &[("cross-fetch", "^3.1.5")],
    dev_dependencies: &[
        ("@babel/core", "^7.18.10"),
        ("@babel/preset-env", "^7.18.10"),
        ("babel-loader", "^8.2.5"),
        ("cross-fetch", "^3.1.5"),
        ("source-map-loader", "^4.0.0"),
        ("jest", "^28.1.3"),
        ("webpack", "^5.74.0"),
    ],
};

impl TargetSpec {
    /// template directory relative to the template root
    pub fn template_path(&self) -> String {
        format!("sdk/{TEMPLATE_FAMILY}/{}", self.language)
    }
}

const fn primitives(
    int: &'static str,
    float: &'static str,
    text: &'static str,
    boolean: &'static str,
    unknown: &'static str,
) -> Primitives {
    Primitives {
        int,
        float,
        text,
        boolean,
        unknown,
    }
}

const DOCS: &[&str] = &["LICENSE.md", "README.md"];

const fn templates(language: &'static str, primitives: Primitives, rendered: &'static [&'static str]) -> TargetSpec {
    TargetSpec {
        language,
        primitives,
        rendered,
        copied: &[],
        strategy: Strategy::Templates,
        npm: None,
    }
}

/// built-in targets, sorted by language
pub const TARGETS: &[TargetSpec] = &[
    templates("cpp", primitives("int", "double", "std::string", "bool", "void*"), DOCS),
    templates("csharp", primitives("int", "double", "string", "bool", "object"), DOCS),
    templates("dart", primitives("int", "double", "String", "bool", "dynamic"), DOCS),
    templates("elixir", primitives("integer()", "float()", "String.t()", "boolean()", "any()"), DOCS),
    templates("erlang", primitives("integer()", "float()", "binary()", "boolean()", "term()"), DOCS),
    TargetSpec {
        language: "go",
        primitives: primitives("int", "float64", "string", "bool", "interface{}"),
        rendered: &["LICENSE.md", "README.md", ".gitignore", "go.mod"],
        copied: &[],
        strategy: Strategy::Go,
        npm: None,
    },
    templates("haskell", primitives("Int", "Double", "Text", "Bool", "Value"), DOCS),
    templates("java", primitives("Integer", "Double", "String", "Boolean", "Object"), DOCS),
    TargetSpec {
        language: "javascript",
        primitives: primitives("number", "number", "string", "boolean", "any"),
        rendered: &[
            "src/index.js",
            "src/Sdk.js",
            "src/BaseSdk.js",
            "src/config.js",
            "src/queries.js",
            "LICENSE.md",
            "package.json",
            "README.md",
            ".nvmrc",
        ],
        copied: &["__tests__/index.test.js"],
        strategy: Strategy::Templates,
        npm: Some(&JAVASCRIPT_PACKAGE),
    },
    templates("kotlin", primitives("Int", "Double", "String", "Boolean", "Any"), DOCS),
    templates("lua", primitives("number", "number", "string", "boolean", "any"), DOCS),
    templates("objc", primitives("NSInteger", "double", "NSString*", "BOOL", "id"), DOCS),
    templates(
        "php",
        primitives("int", "float", "string", "bool", "mixed"),
        &["LICENSE.md", "README.md", "composer.json"],
    ),
    templates("r", primitives("integer", "numeric", "character", "logical", "ANY"), DOCS),
    templates(
        "ruby",
        primitives("Integer", "Float", "String", "Boolean", "Object"),
        &["LICENSE.md", "README.md", "Gemfile"],
    ),
    templates(
        "rust",
        primitives("i64", "f64", "String", "bool", "serde_json::Value"),
        &["LICENSE.md", "README.md", "Cargo.toml"],
    ),
    templates("scala", primitives("Int", "Double", "String", "Boolean", "Any"), DOCS),
    templates(
        "swift",
        primitives("Int", "Double", "String", "Bool", "Any"),
        &["LICENSE.md", "README.md", "Package.swift"],
    ),
    TargetSpec {
        language: "typescript",
        primitives: primitives("number", "number", "string", "boolean", "unknown"),
        rendered: &[
            "src/index.ts",
            "src/Sdk.ts",
            "src/BaseSdk.ts",
            "src/types/input.ts",
            "src/types/model.ts",
            "src/config.ts",
            "src/queries.ts",
            "LICENSE.md",
            "package.json",
            "README.md",
            "tsconfig.json",
            ".nvmrc",
        ],
        copied: &["src/types/index.ts", "__tests__/index.spec.ts"],
        strategy: Strategy::Templates,
        npm: Some(&TYPESCRIPT_PACKAGE),
    },
];

/// `<template>__<language>` lookup over the target table
#[derive(Debug, Clone)]
pub struct Registry {
    entries: BTreeMap<String, &'static TargetSpec>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        for target in TARGETS {
            for template in [TEMPLATE_FAMILY, DEFAULT_TEMPLATE] {
                entries.insert(registry_key(template, target.language), target);
            }
        }
        Self { entries }
    }

    /// registered keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// resolve a generator, falling back to the default template family
    pub fn resolve(&self, template: &str, language: &str) -> Result<&'static TargetSpec> {
        [
            registry_key(template, language),
            registry_key(DEFAULT_TEMPLATE, language),
        ]
        .iter()
        .find_map(|key| self.entries.get(key).copied())
        .ok_or_else(|| Error::UnknownGenerator {
            template: template.to_string(),
            language: language.to_string(),
        })
    }
}

fn registry_key(template: &str, language: &str) -> String {
    format!("{template}__{language}").replace('-', "_")
}
