//! generator configuration
//!
//! build a [`GeneratorConfig`] in code with the `with_*` setters, or load one
//! from a `.json`/`.yaml`/`.yml` file. values set on the command line are laid
//! over the file with [`GeneratorConfig::overlay`].

use crate::definition::ServiceDefinition;
use crate::error::{Error, Result};
use crate::package_json::{previous_version, PackageJson};
use crate::targets::TargetSpec;
use crate::targets::TEMPLATE_FAMILY;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// config file looked up in the target directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = ".sdkgen.yml";
pub const DEFAULT_SOURCE: &str = "prod";
pub const DEFAULT_LANGUAGE: &str = "go";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000";
const DEFAULT_ENV_KEY: &str = "default";
const SOURCE_PLACEHOLDER: &str = "{{source}}";
const DEFAULT_VERSION: &str = "0.0.0";

/// endpoints of one environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// graphql endpoint, may contain `{{source}}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphql: Option<String>,
    /// anything else templates may want (rest endpoints, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// configuration for one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// generator family (default: "graphql")
    pub template: Option<String>,
    /// environment to introspect (default: "prod")
    pub source: Option<String>,
    /// output directory (default: ".")
    pub target: Option<PathBuf>,
    /// target language (default: "go")
    pub language: Option<String>,
    /// extra template variables
    pub vars: Map<String, Value>,
    /// endpoints per environment
    pub envs: BTreeMap<String, EnvConfig>,
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    pub package_description: Option<String>,
    pub repository: Option<Value>,
    pub publish_config: Option<Value>,
    pub dependencies: Option<Map<String, Value>>,
    pub peer_dependencies: Option<Map<String, Value>>,
    pub dev_dependencies: Option<Map<String, Value>>,
    pub repo_type: Option<String>,
    /// type names added to the built-in ignore-list
    pub ignored_models: Vec<String>,
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// load a config file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;

        match extension.as_str() {
            "json" => Ok(serde_json::from_str(&text)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(&text)?),
            other => Err(Error::Config(format!(
                "unknown config file format '{other}'"
            ))),
        }
    }

    /// `<target>/.sdkgen.yml`
    pub fn default_path(target: impl AsRef<Path>) -> PathBuf {
        target.as_ref().join(DEFAULT_CONFIG_FILE)
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    /// set one template variable
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// set the graphql endpoint of an environment
    pub fn with_env(mut self, name: impl Into<String>, graphql: impl Into<String>) -> Self {
        self.envs.entry(name.into()).or_default().graphql = Some(graphql.into());
        self
    }

    /// lay `other` over `self`; every value `other` sets wins
    pub fn overlay(mut self, other: GeneratorConfig) -> Self {
        take(&mut self.template, other.template);
        take(&mut self.source, other.source);
        take(&mut self.target, other.target);
        take(&mut self.language, other.language);
        take(&mut self.package_name, other.package_name);
        take(&mut self.package_version, other.package_version);
        take(&mut self.package_description, other.package_description);
        take(&mut self.repository, other.repository);
        take(&mut self.publish_config, other.publish_config);
        take(&mut self.dependencies, other.dependencies);
        take(&mut self.peer_dependencies, other.peer_dependencies);
        take(&mut self.dev_dependencies, other.dev_dependencies);
        take(&mut self.repo_type, other.repo_type);
        self.vars.extend(other.vars);
        self.envs.extend(other.envs);
        self.ignored_models.extend(other.ignored_models);
        self
    }

    pub fn template(&self) -> &str {
        self.template.as_deref().unwrap_or(TEMPLATE_FAMILY)
    }

    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or(DEFAULT_SOURCE)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn target(&self) -> &Path {
        self.target.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// graphql endpoint of the selected source
    ///
    /// `envs[source]`, then `envs["default"]`, then the local default; every
    /// `{{source}}` is replaced by the source name.
    pub fn endpoint(&self) -> Result<Url> {
        let source = self.source();
        let endpoint = [source, DEFAULT_ENV_KEY]
            .iter()
            .find_map(|name| self.envs.get(*name))
            .and_then(|env| env.graphql.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT)
            .replace(SOURCE_PLACEHOLDER, source);

        let url = Url::parse(&endpoint)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "invalid url scheme: {}. must be http or https",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// variables every template renders against
    ///
    /// npm targets also get `packageJson`, and keep the version of a
    /// `package.json` already in the target directory unless one is configured.
    pub fn template_vars(&self, definition: &ServiceDefinition, target: &TargetSpec) -> Result<Value> {
        let mut vars = Map::new();
        vars.insert("defaultEnv".to_string(), Value::from(DEFAULT_SOURCE));
        vars.insert("envs".to_string(), serde_json::to_value(&self.envs)?);
        vars.insert("language".to_string(), Value::from(target.language));
        vars.insert(
            "primitives".to_string(),
            serde_json::to_value(target.primitives)?,
        );
        let version = self
            .package_version
            .clone()
            .or_else(|| target.npm.and_then(|_| previous_version(self.target())))
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        vars.insert("packageVersion".to_string(), Value::from(version.as_str()));

        let package = serde_json::to_value(PackageVars {
            package_name: self.package_name.as_deref(),
            package_description: self.package_description.as_deref(),
            repository: self.repository.as_ref(),
            publish_config: self.publish_config.as_ref(),
            dependencies: self.dependencies.as_ref(),
            peer_dependencies: self.peer_dependencies.as_ref(),
            dev_dependencies: self.dev_dependencies.as_ref(),
        })?;
        if let Value::Object(package) = package {
            vars.extend(package);
        }

        vars.extend(self.vars.clone());

        if let Value::Object(definition) = serde_json::to_value(definition)? {
            vars.extend(definition);
        }
        vars.insert(
            "repoType".to_string(),
            Value::from(self.repo_type.as_deref().unwrap_or("default")),
        );
        if let Some(npm) = target.npm {
            vars.insert(
                "packageJson".to_string(),
                serde_json::to_value(PackageJson::new(npm, self, &version))?,
            );
        }

        Ok(Value::Object(vars))
    }
}

fn take<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageVars<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    package_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_config: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependencies: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer_dependencies: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dev_dependencies: Option<&'a Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::build_definition;
    use crate::flatten::IgnoreList;
    use crate::introspection::IntrospectionSchema;
    use crate::targets::Registry;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            ".sdkgen.yml",
            "language: go\npackageName: github.com/acme/sdk\nenvs:\n  prod:\n    graphql: https://{{source}}.acme.io/graphql\n    rest: https://acme.io\nvars:\n  author: acme\n",
        );
        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.language(), "go");
        assert_eq!(config.package_name.as_deref(), Some("github.com/acme/sdk"));
        assert_eq!(config.vars["author"], "acme");
        assert_eq!(config.envs["prod"].extra["rest"], "https://acme.io");
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://prod.acme.io/graphql"
        );
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "sdk.JSON",
            r#"{"template": "graphql", "language": "rust", "repoType": "standalone"}"#,
        );
        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.language(), "rust");
        assert_eq!(config.repo_type.as_deref(), Some("standalone"));
    }

    #[test]
    fn test_load_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "sdkgen.js", "module.exports = {}");
        let err = GeneratorConfig::load(&path).unwrap_err();
        assert_eq!(err.to_string(), "config error: unknown config file format 'js'");
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeneratorConfig::load("/nonexistent/.sdkgen.yml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::new();
        assert_eq!(config.template(), "graphql");
        assert_eq!(config.source(), "prod");
        assert_eq!(config.language(), "go");
        assert_eq!(config.target(), Path::new("."));
        assert_eq!(config.endpoint().unwrap().as_str(), "http://localhost:4000/");
        assert_eq!(
            GeneratorConfig::default_path("out"),
            Path::new("out/.sdkgen.yml")
        );
    }

    #[test]
    fn test_endpoint_falls_back_to_default_env() {
        let config = GeneratorConfig::new()
            .with_source("staging")
            .with_env("default", "https://api.{{source}}.acme.io/graphql")
            .with_env("prod", "https://api.acme.io/graphql");
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://api.staging.acme.io/graphql"
        );
    }

    #[test]
    fn test_endpoint_validation() {
        let config = GeneratorConfig::new().with_env("prod", "not a url");
        assert!(matches!(config.endpoint(), Err(Error::Url(_))));

        let config = GeneratorConfig::new().with_env("prod", "ftp://acme.io/graphql");
        assert!(matches!(config.endpoint(), Err(Error::Config(_))));
    }

    #[test]
    fn test_overlay_prefers_other() {
        let file = GeneratorConfig::new()
            .with_language("typescript")
            .with_package_name("acme")
            .with_var("author", "file");
        let cli = GeneratorConfig::new()
            .with_language("go")
            .with_var("author", "cli");
        let merged = file.overlay(cli);
        assert_eq!(merged.language(), "go");
        assert_eq!(merged.package_name.as_deref(), Some("acme"));
        assert_eq!(merged.vars["author"], "cli");
    }

    fn ping_definition() -> ServiceDefinition {
        let schema = IntrospectionSchema::from_json(
            r#"{"__schema": {"queryType": {"name": "Query"}, "types": [
                {"kind": "OBJECT", "name": "Query", "fields": [
                    {"name": "ping", "args": [], "type": {"kind": "SCALAR", "name": "String"}}
                ]}
            ]}}"#,
        )
        .unwrap();
        build_definition(&schema, &IgnoreList::builtin()).unwrap()
    }

    #[test]
    fn test_template_vars() {
        let definition = ping_definition();
        let target = Registry::builtin().resolve("graphql", "go").unwrap();
        let config = GeneratorConfig::new()
            .with_package_name("github.com/acme/sdk")
            .with_var("defaultEnv", "dev");

        let vars = config.template_vars(&definition, target).unwrap();
        assert_eq!(vars["defaultEnv"], "dev");
        assert_eq!(vars["packageName"], "github.com/acme/sdk");
        assert_eq!(vars["packageVersion"], "0.0.0");
        assert_eq!(vars["repoType"], "default");
        assert_eq!(vars["language"], "go");
        assert_eq!(vars["primitives"]["float"], "float64");
        assert!(vars["queries"]["ping"].is_object());
        assert!(vars.get("packageDescription").is_none());
        assert!(vars.get("packageJson").is_none());
    }

    #[test]
    fn test_npm_vars_keep_existing_version() {
        let out = tempfile::tempdir().unwrap();
        write(out.path(), "package.json", r#"{"version": "3.1.0"}"#);
        let definition = ping_definition();
        let target = Registry::builtin().resolve("graphql", "typescript").unwrap();
        let config = GeneratorConfig::new()
            .with_package_name("@acme/sdk")
            .with_target(out.path());

        let vars = config.template_vars(&definition, target).unwrap();
        assert_eq!(vars["packageVersion"], "3.1.0");
        assert_eq!(vars["packageJson"]["version"], "3.1.0");
        assert_eq!(vars["packageJson"]["name"], "@acme/sdk");

        let pinned = GeneratorConfig {
            package_version: Some("4.0.0".to_string()),
            publish_config: Some(Value::from("github")),
            ..config
        };
        let vars = pinned.template_vars(&definition, target).unwrap();
        assert_eq!(vars["packageJson"]["version"], "4.0.0");
        assert_eq!(vars["packageJson"]["publishConfig"]["access"], "restricted");

        let go = Registry::builtin().resolve("graphql", "go").unwrap();
        let vars = GeneratorConfig::new()
            .with_target(out.path())
            .template_vars(&definition, go)
            .unwrap();
        assert_eq!(vars["packageVersion"], "0.0.0");
    }
}
