//! end-to-end generation
//!
//! resolve the target, build the service definition, synthesize the file set
//! and hand it to the sink.

use crate::config::GeneratorConfig;
use crate::definition::{build_definition, ServiceDefinition};
use crate::error::Result;
use crate::flatten::IgnoreList;
use crate::introspection::IntrospectionSchema;
use crate::sink::{materialize, MaterializeReport, TemplateStore};
use crate::synth::synthesize;
use crate::targets::{Registry, TargetSpec};
use std::path::Path;
use tracing::info;

/// result of one run
#[derive(Debug)]
pub struct Generation {
    pub target: &'static TargetSpec,
    pub definition: ServiceDefinition,
    pub report: MaterializeReport,
}

/// built-in ignore-list extended with the configured names
pub fn ignore_list(config: &GeneratorConfig) -> IgnoreList {
    config
        .ignored_models
        .iter()
        .fold(IgnoreList::builtin(), |list, name| list.with(name.as_str()))
}

/// generate the sdk for `config` from an already loaded schema
///
/// `templates` overrides the built-in template set with a directory
pub async fn generate(
    config: &GeneratorConfig,
    schema: &IntrospectionSchema,
    registry: &Registry,
    templates: Option<&Path>,
) -> Result<Generation> {
    let target = registry.resolve(config.template(), config.language())?;
    let definition = build_definition(schema, &ignore_list(config))?;
    let vars = config.template_vars(&definition, target)?;
    let files = synthesize(&definition, target, vars);

    info!(
        language = target.language,
        files = files.len(),
        target = %config.target().display(),
        "generating sdk"
    );
    let store = TemplateStore::for_target(templates, target);
    let report = materialize(&files, config.target(), &store).await;

    Ok(Generation {
        target,
        definition,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_ignore_list_extends_builtin() {
        let config = GeneratorConfig {
            ignored_models: vec!["Node".to_string()],
            ..Default::default()
        };
        let list = ignore_list(&config);
        assert!(list.contains("Node"));
        assert!(list.contains("DateTime"));
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_unknown_language_fails_before_writing() {
        let out = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new()
            .with_language("cobol")
            .with_target(out.path());
        let err = generate(
            &config,
            &IntrospectionSchema::default(),
            &Registry::builtin(),
            Some(Path::new("/nonexistent")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::UnknownGenerator { .. }));
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }
}
