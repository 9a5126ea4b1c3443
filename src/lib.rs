//! graphql sdk generator
//!
//! this crate turns a graphql schema (live introspection, an introspection
//! json dump, or sdl) into the source tree of a client sdk. the schema is
//! normalized into a [`ServiceDefinition`] (models, inputs, queries, methods
//! and the set of models the operations need), a [`FileSet`] is synthesized
//! for the chosen target language, and [`materialize`] writes it to disk.
//!
//! ## quick start
//!
//! ```no_run
//! use gql_sdkgen::{generate, GeneratorConfig, Registry, SchemaSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeneratorConfig::new()
//!     .with_language("go")
//!     .with_target("./sdk")
//!     .with_env("prod", "https://api.acme.io/graphql");
//! let schema = SchemaSource::Endpoint(config.endpoint()?).load().await?;
//! let run = generate(&config, &schema, &Registry::builtin(), None).await?;
//! println!("{} files written", run.report.written.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## pieces
//!
//! the pipeline stages are public so callers can stop early: [`build_definition`]
//! for the model alone, [`synthesize`] for the in-memory file set.

mod catalog;
mod client;
mod config;
mod definition;
mod descriptor;
mod dispatch;
mod error;
mod flatten;
mod generate;
mod introspection;
mod normalize;
mod package_json;
mod required;
mod sdl;
mod sink;
mod source;
pub mod synth;
mod targets;

pub use catalog::{build_catalog, Method, OperationCatalog, OperationKind, QueryEntry};
pub use client::{IntrospectionClient, TransportConfig, INTROSPECTION_QUERY};
pub use config::{
    EnvConfig, GeneratorConfig, DEFAULT_CONFIG_FILE, DEFAULT_ENDPOINT, DEFAULT_LANGUAGE,
    DEFAULT_SOURCE,
};
pub use definition::{build_definition, ServiceDefinition};
pub use descriptor::{DescriptorMap, Leaf, Primitive, TypeDescriptor};
pub use dispatch::{ordered, plan, CallPlan, Operation, Template};
pub use error::{Error, Result};
pub use flatten::{flatten, IgnoreList, SchemaModel};
pub use generate::{generate, ignore_list, Generation};
pub use introspection::{
    EnumValue, FieldDef, FullType, GraphQlError, GraphQlLocation, GraphQlResponse, InputValue,
    IntrospectionSchema, RootType, TypeKind, TypeRef,
};
pub use normalize::{normalize, GraphQlType, SchemaIndex};
pub use required::{track_required, RequiredModelSet};
pub use sdl::schema_from_sdl;
pub use sink::{materialize, MaterializeReport, TemplateStore, BUILTIN_TEMPLATE_LANGUAGES};
pub use source::{schema_from_file, SchemaSource};
pub use synth::{synthesize, FileContent, FileScope, FileSet};
pub use targets::{
    NpmPackage, Primitives, Registry, Strategy, TargetSpec, TARGETS, TEMPLATE_FAMILY,
};
