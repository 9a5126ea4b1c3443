//! package.json for npm targets
//!
//! the manifest handed to the javascript and typescript templates as
//! `packageJson`. the version of an already generated package is kept so a
//! regeneration does not reset it.

use crate::config::GeneratorConfig;
use crate::targets::NpmPackage;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

pub const PACKAGE_JSON: &str = "package.json";
pub const GITHUB_REGISTRY: &str = "https://npm.pkg.github.com/";
const STANDALONE: &str = "standalone";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    license: &'static str,
    main: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    types: Option<&'static str>,
    directories: BTreeMap<&'static str, &'static str>,
    files: [&'static str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_config: Option<Value>,
    scripts: BTreeMap<&'static str, &'static str>,
    dependencies: Map<String, Value>,
    peer_dependencies: Map<String, Value>,
    dev_dependencies: Map<String, Value>,
}

impl<'a> PackageJson<'a> {
    pub(crate) fn new(npm: &NpmPackage, config: &'a GeneratorConfig, version: &'a str) -> Self {
        Self {
            name: config.package_name.as_deref(),
            version,
            description: config.package_description.as_deref(),
            license: "ISC",
            main: npm.main,
            types: npm.types,
            directories: BTreeMap::from([(npm.dir, npm.dir), ("test", "__tests__")]),
            files: [npm.dir],
            repository: config.repository.as_ref(),
            publish_config: publish_config(config.publish_config.as_ref()),
            scripts: scripts(config.repo_type.as_deref().unwrap_or_default(), npm.build),
            dependencies: merged(npm.dependencies, config.dependencies.as_ref()),
            peer_dependencies: merged(npm.peer_dependencies, config.peer_dependencies.as_ref()),
            dev_dependencies: merged(npm.dev_dependencies, config.dev_dependencies.as_ref()),
        }
    }
}

/// npm scripts for a repo layout; anything but `standalone` is a monorepo member
fn scripts(repo_type: &str, build: &'static str) -> BTreeMap<&'static str, &'static str> {
    if repo_type == STANDALONE {
        BTreeMap::from([
            ("preversion", "yarn test"),
            ("version", "yarn --silent build && git add -A ."),
            ("postversion", "git push && git push --tags"),
            ("build", build),
            ("test", "jest --config jest.config.js"),
        ])
    } else {
        BTreeMap::from([
            ("build", build),
            (
                "test",
                "../../node_modules/.bin/jest -c ../../jest.config.js --rootDir=`pwd`",
            ),
        ])
    }
}

/// `"github"` names the github package registry; other strings mean nothing
fn publish_config(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::String(name) if name == "github" => Some(json!({
            "access": "restricted",
            "registry": GITHUB_REGISTRY,
        })),
        Value::String(_) => None,
        other => Some(other.clone()),
    }
}

fn merged(defaults: &[(&str, &str)], extra: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut out: Map<String, Value> = defaults
        .iter()
        .map(|(name, version)| (name.to_string(), Value::from(*version)))
        .collect();
    if let Some(extra) = extra {
        out.extend(extra.clone());
    }
    out
}

/// version of the `package.json` already in `target`, if any
pub(crate) fn previous_version(target: &Path) -> Option<String> {
    let path = target.join(PACKAGE_JSON);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read existing package.json");
            return None;
        }
    };
    let manifest: Value = match serde_json::from_str(&text) {
        Ok(manifest) => manifest,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "existing package.json is not json");
            return None;
        }
    };
    let version = manifest.get("version")?.as_str()?.to_string();
    debug!(path = %path.display(), version = %version, "keeping existing package version");
    Some(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::Registry;

    fn npm(language: &str) -> &'static NpmPackage {
        Registry::builtin()
            .resolve("graphql", language)
            .unwrap()
            .npm
            .unwrap()
    }

    fn manifest(language: &str, config: &GeneratorConfig) -> Value {
        serde_json::to_value(PackageJson::new(npm(language), config, "1.2.3")).unwrap()
    }

    #[test]
    fn test_default_repo_uses_workspace_jest() {
        let value = manifest("typescript", &GeneratorConfig::new().with_package_name("@acme/sdk"));
        assert_eq!(value["name"], "@acme/sdk");
        assert_eq!(value["version"], "1.2.3");
        assert_eq!(value["license"], "ISC");
        assert_eq!(value["main"], "lib/index.js");
        assert_eq!(value["types"], "lib/index.d.ts");
        assert_eq!(value["files"], json!(["lib"]));
        assert_eq!(value["directories"], json!({"lib": "lib", "test": "__tests__"}));
        assert_eq!(
            value["scripts"],
            json!({
                "build": "tsc",
                "test": "../../node_modules/.bin/jest -c ../../jest.config.js --rootDir=`pwd`",
            })
        );
        assert!(value.get("description").is_none());
        assert!(value.get("publishConfig").is_none());
    }

    #[test]
    fn test_standalone_repo_scripts() {
        let config = GeneratorConfig {
            repo_type: Some("standalone".to_string()),
            ..Default::default()
        };
        let value = manifest("javascript", &config);
        assert_eq!(value["scripts"]["preversion"], "yarn test");
        assert_eq!(value["scripts"]["postversion"], "git push && git push --tags");
        assert_eq!(value["scripts"]["build"], "true");
        assert_eq!(value["scripts"]["test"], "jest --config jest.config.js");
        assert_eq!(value["main"], "src/index.js");
        assert!(value.get("types").is_none());

        let config = GeneratorConfig {
            repo_type: Some("monorepo".to_string()),
            ..Default::default()
        };
        assert!(manifest("javascript", &config)["scripts"].get("preversion").is_none());
    }

    #[test]
    fn test_publish_config() {
        assert_eq!(
            publish_config(Some(&json!("github"))),
            Some(json!({"access": "restricted", "registry": "https://npm.pkg.github.com/"}))
        );
        assert_eq!(publish_config(Some(&json!("npm"))), None);
        assert_eq!(
            publish_config(Some(&json!({"access": "public"}))),
            Some(json!({"access": "public"}))
        );
        assert_eq!(publish_config(None), None);
    }

    #[test]
    fn test_user_dependencies_extend_defaults() {
        let mut extra = Map::new();
        extra.insert("jwt-decode".to_string(), json!("^4.0.0"));
        extra.insert("graphql".to_string(), json!("^16.0.0"));
        let config = GeneratorConfig {
            dependencies: Some(extra),
            ..Default::default()
        };
        let value = manifest("typescript", &config);
        assert_eq!(
            value["dependencies"],
            json!({
                "@genstackio/retry": "^0.1.1",
                "graphql": "^16.0.0",
                "jwt-decode": "^4.0.0",
            })
        );
        assert_eq!(value["peerDependencies"], json!({"cross-fetch": "^3.1.5"}));
        assert_eq!(value["devDependencies"]["typescript"], "^4.7.4");
    }

    #[test]
    fn test_previous_version() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(previous_version(dir.path()), None);

        std::fs::write(dir.path().join(PACKAGE_JSON), "not json").unwrap();
        assert_eq!(previous_version(dir.path()), None);

        std::fs::write(
            dir.path().join(PACKAGE_JSON),
            r#"{"name": "@acme/sdk", "version": "2.4.1"}"#,
        )
        .unwrap();
        assert_eq!(previous_version(dir.path()).as_deref(), Some("2.4.1"));
    }
}
