//! introspection client
//!
//! posts the standard introspection query to a graphql endpoint and parses the
//! answer into an [`IntrospectionSchema`].

use crate::error::{Error, Result};
use crate::introspection::{GraphQlResponse, IntrospectionSchema};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// the introspection document sent to every endpoint
pub const INTROSPECTION_QUERY: &str = include_str!("../resources/introspection.graphql");
const OPERATION_NAME: &str = "IntrospectionQuery";
const JSON_UTF8: &str = "application/json;charset=utf-8";

/// transport settings for [`IntrospectionClient`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    endpoint: Url,
    timeout: Duration,
    user_agent: String,
    extra_headers: HeaderMap,
}

impl TransportConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(30),
            user_agent: format!("gql-sdkgen/{}", env!("CARGO_PKG_VERSION")),
            extra_headers: HeaderMap::new(),
        }
    }

    /// set the request timeout
    ///
    /// default: 30 seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// add a header to the request (auth tokens, tenant ids, ...)
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.insert(name, value);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// fetches introspection documents over http
#[derive(Debug, Clone)]
pub struct IntrospectionClient {
    config: TransportConfig,
    http: reqwest::Client,
}

impl IntrospectionClient {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_UTF8));
        headers.extend(config.extra_headers.clone());

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// run the introspection query against the configured endpoint
    pub async fn fetch(&self) -> Result<IntrospectionSchema> {
        self.fetch_with(|url, body| async move {
            let response = self.http.post(url).json(&body).send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok((status, text))
        })
        .await
    }

    pub(crate) async fn fetch_with<F, Fut>(&self, send: F) -> Result<IntrospectionSchema>
    where
        F: FnOnce(Url, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let body = serde_json::json!({
            "operationName": OPERATION_NAME,
            "variables": {},
            "query": INTROSPECTION_QUERY,
        });

        info!(endpoint = %self.config.endpoint, "fetching introspection schema");
        let (status, text) = send(self.config.endpoint.clone(), body).await?;
        debug!(status = status.as_u16(), bytes = text.len(), "introspection response");
        parse_introspection_response(status, text)
    }
}

fn parse_introspection_response(status: StatusCode, text: String) -> Result<IntrospectionSchema> {
    if !status.is_success() {
        let errors = serde_json::from_str::<GraphQlResponse<serde_json::Value>>(&text)
            .map(|response| response.errors)
            .unwrap_or_default();
        return Err(Error::GraphQl {
            status: Some(status.as_u16()),
            errors,
            body: text,
            message: format!("introspection http error: {}", status),
        });
    }

    IntrospectionSchema::from_json(&text).map_err(|err| match err {
        Error::GraphQl {
            errors,
            body,
            message,
            ..
        } => Error::GraphQl {
            status: Some(status.as_u16()),
            errors,
            body,
            message,
        },
        other => other,
    })
}
