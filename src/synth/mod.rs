//! source synthesizer
//!
//! maps a finished [`ServiceDefinition`] onto a [`TargetSpec`] and returns the
//! file set handed to the sink. content is either literal text or a producer
//! that renders/reads templates once the sink provides a [`FileScope`].

pub mod go;

use crate::definition::ServiceDefinition;
use crate::error::Result;
use crate::sink::TemplateStore;
use crate::targets::{Strategy, TargetSpec};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// deferred content, resolved by the sink
pub type Producer = Box<dyn Fn(&FileScope<'_>) -> Result<String> + Send + Sync>;

pub enum FileContent {
    Text(String),
    Produce(Producer),
}

impl fmt::Debug for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileContent::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            FileContent::Produce(_) => f.write_str("Produce(..)"),
        }
    }
}

/// template capabilities offered to a producer
#[derive(Debug, Clone, Copy)]
pub struct FileScope<'a> {
    path: &'a str,
    templates: &'a TemplateStore,
}

impl<'a> FileScope<'a> {
    pub fn new(path: &'a str, templates: &'a TemplateStore) -> Self {
        Self { path, templates }
    }

    pub fn path(&self) -> &str {
        self.path
    }

    /// render `<path>.hbs` against `data`
    pub fn render(&self, data: &Value) -> Result<String> {
        self.templates.render(&format!("{}.hbs", self.path), data)
    }

    /// read a companion template verbatim
    pub fn read(&self, name: &str) -> Result<String> {
        self.templates.read(name)
    }
}

/// relative path -> content, in path order
#[derive(Debug, Default)]
pub struct FileSet {
    files: BTreeMap<String, FileContent>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), FileContent::Text(text.into()));
    }

    pub fn insert_producer<F>(&mut self, path: impl Into<String>, produce: F)
    where
        F: Fn(&FileScope<'_>) -> Result<String> + Send + Sync + 'static,
    {
        self.files
            .insert(path.into(), FileContent::Produce(Box::new(produce)));
    }

    pub fn get(&self, path: &str) -> Option<&FileContent> {
        self.files.get(path)
    }

    /// literal text of a file, `None` for producers
    pub fn text(&self, path: &str) -> Option<&str> {
        match self.files.get(path)? {
            FileContent::Text(text) => Some(text),
            FileContent::Produce(_) => None,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileContent)> {
        self.files.iter().map(|(path, content)| (path.as_str(), content))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// build the file set of one target
pub fn synthesize(definition: &ServiceDefinition, target: &TargetSpec, vars: Value) -> FileSet {
    let mut files = FileSet::new();

    for path in target.copied {
        files.insert_producer(*path, move |scope| scope.read(path));
    }

    let vars = Arc::new(vars);
    for path in target.rendered {
        let vars = Arc::clone(&vars);
        files.insert_producer(*path, move |scope| scope.render(&vars));
    }

    if target.strategy == Strategy::Go {
        let module = vars
            .get("packageName")
            .and_then(Value::as_str)
            .unwrap_or(go::DEFAULT_MODULE);
        for (path, text) in go::sources(definition, target, module) {
            files.insert_text(path, text);
        }
    }

    debug!(language = target.language, files = files.len(), "synthesized file set");
    files
}
