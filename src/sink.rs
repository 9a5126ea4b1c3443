//! file sink
//!
//! resolves every file of a [`FileSet`] against the target's templates, then
//! writes the results concurrently. a file that fails to render or write is
//! logged and reported; its siblings still land on disk.
//!
//! go and rust templates are compiled into the binary. a template directory
//! passed at runtime replaces them for every language.

use crate::error::{Error, Result};
use crate::synth::{FileContent, FileScope, FileSet};
use crate::targets::TargetSpec;
use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

type Embedded = &'static [(&'static str, &'static str)];

const GO_TEMPLATES: Embedded = &[
    (".gitignore.hbs", include_str!("../templates/sdk/graphql/go/.gitignore.hbs")),
    ("LICENSE.md.hbs", include_str!("../templates/sdk/graphql/go/LICENSE.md.hbs")),
    ("README.md.hbs", include_str!("../templates/sdk/graphql/go/README.md.hbs")),
    ("go.mod.hbs", include_str!("../templates/sdk/graphql/go/go.mod.hbs")),
];

const RUST_TEMPLATES: Embedded = &[
    ("Cargo.toml.hbs", include_str!("../templates/sdk/graphql/rust/Cargo.toml.hbs")),
    ("LICENSE.md.hbs", include_str!("../templates/sdk/graphql/rust/LICENSE.md.hbs")),
    ("README.md.hbs", include_str!("../templates/sdk/graphql/rust/README.md.hbs")),
];

/// languages whose templates ship inside the binary
pub const BUILTIN_TEMPLATE_LANGUAGES: &[&str] = &["go", "rust"];

fn embedded(language: &str) -> Embedded {
    match language {
        "go" => GO_TEMPLATES,
        "rust" => RUST_TEMPLATES,
        _ => &[],
    }
}

handlebars_helper!(json: |value: Json| serde_json::to_string_pretty(value).unwrap_or_default());

enum Source {
    Dir(PathBuf),
    Builtin {
        prefix: String,
        files: Embedded,
    },
}

/// one target's templates plus the renderer
pub struct TemplateStore {
    source: Source,
    handlebars: Handlebars<'static>,
}

impl TemplateStore {
    /// templates read from `root` on every call
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_source(Source::Dir(root.into()))
    }

    /// the templates compiled in for `target`; empty for most languages
    pub fn builtin(target: &TargetSpec) -> Self {
        Self::with_source(Source::Builtin {
            prefix: target.template_path(),
            files: embedded(target.language),
        })
    }

    /// `<templates>/sdk/graphql/<language>`, or the built-in set without a directory
    pub fn for_target(templates: Option<&Path>, target: &TargetSpec) -> Self {
        match templates {
            Some(dir) => Self::new(dir.join(target.template_path())),
            None => Self::builtin(target),
        }
    }

    fn with_source(source: Source) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("json", Box::new(json));
        Self { source, handlebars }
    }

    /// the template directory; `None` for built-in templates
    pub fn root(&self) -> Option<&Path> {
        match &self.source {
            Source::Dir(root) => Some(root),
            Source::Builtin { .. } => None,
        }
    }

    /// read a template file verbatim
    pub fn read(&self, name: &str) -> Result<String> {
        match &self.source {
            Source::Dir(root) => {
                let path = root.join(name);
                std::fs::read_to_string(&path).map_err(|err| Error::io(path, err))
            }
            Source::Builtin { prefix, files } => files
                .iter()
                .find(|(file, _)| *file == name)
                .map(|(_, text)| text.to_string())
                .ok_or_else(|| {
                    Error::io(
                        format!("builtin:{prefix}/{name}"),
                        io::Error::new(io::ErrorKind::NotFound, "no built-in template"),
                    )
                }),
        }
    }

    /// render a template file against `data`
    pub fn render(&self, name: &str, data: &Value) -> Result<String> {
        let template = self.read(name)?;
        self.handlebars
            .render_template(&template, data)
            .map_err(|err| Error::Render {
                path: name.to_string(),
                message: err.to_string(),
            })
    }
}

impl fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("TemplateStore");
        match &self.source {
            Source::Dir(root) => out.field("root", root),
            Source::Builtin { prefix, .. } => out.field("builtin", prefix),
        };
        out.finish()
    }
}

/// outcome of one materialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// relative paths written
    pub written: Vec<String>,
    /// relative paths that failed to render or write
    pub failed: Vec<String>,
    /// relative paths whose content came out empty
    pub skipped: Vec<String>,
}

impl MaterializeReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// resolve and write every file under `target_dir`
pub async fn materialize(
    files: &FileSet,
    target_dir: &Path,
    templates: &TemplateStore,
) -> MaterializeReport {
    let mut report = MaterializeReport::default();
    let mut writes = JoinSet::new();
    let mut pending = BTreeSet::new();

    for (path, content) in files.iter() {
        let text = match content {
            FileContent::Text(text) => Ok(text.clone()),
            FileContent::Produce(produce) => produce(&FileScope::new(path, templates)),
        };
        let text = match text {
            Ok(text) => text,
            Err(err) => {
                error!(path, error = %err, "failed to produce file content");
                report.failed.push(path.to_string());
                continue;
            }
        };
        if text.is_empty() {
            debug!(path, "empty content, not written");
            report.skipped.push(path.to_string());
            continue;
        }

        let relative = path.to_string();
        let full = target_dir.join(path);
        pending.insert(relative.clone());
        writes.spawn(async move {
            let result = write_file(&full, text).await;
            (relative, result)
        });
    }

    collect_writes(writes, pending, &mut report).await;

    report.written.sort();
    report.failed.sort();
    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        target = %target_dir.display(),
        "materialized files"
    );
    report
}

/// join every write task; a task that panicked or was cancelled leaves its
/// path in `pending`, which then counts as failed
async fn collect_writes(
    mut writes: JoinSet<(String, Result<()>)>,
    mut pending: BTreeSet<String>,
    report: &mut MaterializeReport,
) {
    while let Some(joined) = writes.join_next().await {
        match joined {
            Ok((path, result)) => {
                pending.remove(&path);
                match result {
                    Ok(()) => report.written.push(path),
                    Err(err) => {
                        error!(path = %path, error = %err, "failed to write file");
                        report.failed.push(path);
                    }
                }
            }
            Err(err) => error!(error = %err, "file write task failed"),
        }
    }
    for path in pending {
        error!(path = %path, "file write task did not finish");
        report.failed.push(path);
    }
}

async fn write_file(path: &Path, content: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| Error::io(parent, err))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|err| Error::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::Registry;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let store = TemplateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_render_does_not_escape() {
        let (_dir, store) = store_with(&[("README.md.hbs", "# {{packageName}} <{{url}}>")]);
        let text = store
            .render(
                "README.md.hbs",
                &serde_json::json!({"packageName": "acme-sdk", "url": "a&b"}),
            )
            .unwrap();
        assert_eq!(text, "# acme-sdk <a&b>");
    }

    #[test]
    fn test_missing_template_is_io_error() {
        let (_dir, store) = store_with(&[]);
        let err = store.read("nope.hbs").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_for_target_layout() {
        let target = Registry::builtin().resolve("graphql", "rust").unwrap();
        let store = TemplateStore::for_target(Some(Path::new("/templates")), target);
        assert_eq!(store.root(), Some(Path::new("/templates/sdk/graphql/rust")));
        assert_eq!(TemplateStore::for_target(None, target).root(), None);
    }

    #[test]
    fn test_builtin_templates_are_embedded() {
        let registry = Registry::builtin();
        for language in BUILTIN_TEMPLATE_LANGUAGES {
            let target = registry.resolve("graphql", language).unwrap();
            let store = TemplateStore::builtin(target);
            for path in target.rendered {
                let text = store.read(&format!("{path}.hbs")).unwrap();
                assert!(!text.is_empty(), "{language}/{path}");
            }
        }

        let kotlin = registry.resolve("graphql", "kotlin").unwrap();
        let err = TemplateStore::builtin(kotlin).read("README.md.hbs").unwrap_err();
        match err {
            Error::Io { path, source } => {
                assert_eq!(path, Path::new("builtin:sdk/graphql/kotlin/README.md.hbs"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_helper_renders_objects() {
        let (_dir, store) = store_with(&[("package.json.hbs", "{{{json packageJson}}}")]);
        let text = store
            .render(
                "package.json.hbs",
                &serde_json::json!({"packageJson": {"name": "acme", "private": true}}),
            )
            .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, serde_json::json!({"name": "acme", "private": true}));
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_unfinished_write_task_is_reported() {
        let mut writes: JoinSet<(String, Result<()>)> = JoinSet::new();
        writes.spawn(async { ("a.txt".to_string(), Ok(())) });
        let stuck = writes.spawn(async {
            std::future::pending::<()>().await;
            ("b.txt".to_string(), Ok(()))
        });
        stuck.abort();
        let pending = BTreeSet::from(["a.txt".to_string(), "b.txt".to_string()]);

        let mut report = MaterializeReport::default();
        collect_writes(writes, pending, &mut report).await;

        assert_eq!(report.written, ["a.txt"]);
        assert_eq!(report.failed, ["b.txt"]);
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_materialize_isolates_failures() {
        let (_templates, store) = store_with(&[
            ("go.mod.hbs", "module {{packageName}}\n"),
            ("static/notes.txt", "verbatim {{not rendered}}"),
        ]);
        let out = tempfile::tempdir().unwrap();

        let mut files = FileSet::new();
        files.insert_text("cmd/main/sdk.go", "package sdk\n");
        files.insert_text("empty.txt", "");
        files.insert_producer("go.mod", |scope| {
            scope.render(&serde_json::json!({"packageName": "example.com/sdk"}))
        });
        files.insert_producer("notes.txt", |scope| scope.read("static/notes.txt"));
        files.insert_producer("README.md", |scope| scope.render(&Value::Null));

        let report = materialize(&files, out.path(), &store).await;

        assert_eq!(report.written, ["cmd/main/sdk.go", "go.mod", "notes.txt"]);
        assert_eq!(report.failed, ["README.md"]);
        assert_eq!(report.skipped, ["empty.txt"]);
        assert!(!report.is_success());

        let go_mod = std::fs::read_to_string(out.path().join("go.mod")).unwrap();
        assert_eq!(go_mod, "module example.com/sdk\n");
        let notes = std::fs::read_to_string(out.path().join("notes.txt")).unwrap();
        assert_eq!(notes, "verbatim {{not rendered}}");
        assert!(out.path().join("cmd/main/sdk.go").exists());
        assert!(!out.path().join("empty.txt").exists());
    }
}
