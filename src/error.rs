//! error types
//!
//! structured errors for config, schema loading, transport, and synthesis.

use crate::introspection::GraphQlError;
use std::fmt;
use std::path::PathBuf;

/// library result type
pub type Result<T> = std::result::Result<T, Error>;

/// error type for the schema compiler, sink, and transport
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sdl error: {0}")]
    Sdl(String),

    #[error("graphql error: {message}")]
    GraphQl {
        /// http status if available
        status: Option<u16>,
        /// graphql error list
        errors: Vec<GraphQlError>,
        /// raw response body
        body: String,
        /// top-level message
        message: String,
    },

    #[error("schema has no {root} root type")]
    MissingRoot {
        /// name of the missing root (or its declared type name)
        root: String,
    },

    #[error("unknown code generator '{template}' for language '{language}'")]
    UnknownGenerator { template: String, language: String },

    #[error("failed to render {path}: {message}")]
    Render { path: String, message: String },
}

impl Error {
    /// true if the error looks like an auth failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::GraphQl { status: Some(401 | 403), .. })
            || matches!(self, Error::Http(err) if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
