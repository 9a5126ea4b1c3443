//! schema sources
//!
//! a schema comes from a local file (introspection json or sdl) or from a live
//! endpoint via [`IntrospectionClient`].

use crate::client::{IntrospectionClient, TransportConfig};
use crate::error::{Error, Result};
use crate::introspection::IntrospectionSchema;
use crate::sdl::schema_from_sdl;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// `.json` introspection response or `.graphql`/`.graphqls`/`.gql` sdl
    File(PathBuf),
    Endpoint(Url),
}

impl SchemaSource {
    pub async fn load(&self) -> Result<IntrospectionSchema> {
        match self {
            SchemaSource::File(path) => schema_from_file(path),
            SchemaSource::Endpoint(url) => {
                IntrospectionClient::new(TransportConfig::new(url.clone()))?
                    .fetch()
                    .await
            }
        }
    }
}

/// read a schema file, picking the parser from its extension
pub fn schema_from_file(path: impl AsRef<Path>) -> Result<IntrospectionSchema> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let text = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;

    match extension.as_str() {
        "json" => IntrospectionSchema::from_json(&text),
        "graphql" | "graphqls" | "gql" => schema_from_sdl(&text),
        other => Err(Error::Config(format!(
            "unknown schema file format '{other}'"
        ))),
    }
}
