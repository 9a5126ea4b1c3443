//! generate an sdk source tree from a graphql schema
//!
//! the schema is introspected from the configured endpoint unless `--schema`
//! points at an introspection json dump or an sdl file. settings come from
//! `<target>/.sdkgen.yml` (or `--config`), flags win over file values.

use clap::Parser;
use gql_sdkgen::{
    generate, Error, GeneratorConfig, IntrospectionClient, IntrospectionSchema, Registry,
    SchemaSource, ServiceDefinition, TransportConfig,
};
use reqwest::header::{HeaderName, HeaderValue};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Generate an SDK package from a GraphQL schema.
///
/// Examples:
///   gql-sdkgen --target ./sdk --language go --env staging
///   gql-sdkgen --target ./sdk --schema schema.graphql --language rust
#[derive(Debug, Parser)]
#[command(name = "gql-sdkgen", version)]
#[command(about = "Generate an SDK package from a GraphQL schema", long_about = None)]
struct Cli {
    /// Output directory; `.sdkgen.yml` is looked up here.
    #[arg(short, long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// Explicit config file (.yml, .yaml or .json).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Environment to introspect.
    #[arg(short, long = "env", alias = "source", value_name = "NAME")]
    source: Option<String>,

    /// Target language.
    #[arg(short, long)]
    language: Option<String>,

    /// Generator family.
    #[arg(long)]
    template: Option<String>,

    /// Read the schema from a file instead of introspecting.
    #[arg(long, value_name = "FILE", conflicts_with = "endpoint")]
    schema: Option<PathBuf>,

    /// Introspect this endpoint instead of the configured one.
    #[arg(long, value_name = "URL")]
    endpoint: Option<Url>,

    /// Extra request header, `name: value`.
    #[arg(long = "header", value_name = "HEADER", value_parser = parse_header)]
    headers: Vec<(HeaderName, HeaderValue)>,

    /// Template root directory, replacing the built-in go and rust templates.
    #[arg(long, value_name = "DIR")]
    templates: Option<PathBuf>,

    /// Package name handed to the templates.
    #[arg(long)]
    package_name: Option<String>,

    /// Extra template variable, `key=value`.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Also write the service definition as json (`-` for stdout).
    #[arg(long, value_name = "FILE")]
    dump_model: Option<PathBuf>,

    /// List the registered generators and exit.
    #[arg(long)]
    list_targets: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("gql-sdkgen: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,gql_sdkgen=info".to_string(),
            _ => "info,gql_sdkgen=debug".to_string(),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, Error> {
    let registry = Registry::builtin();
    if cli.list_targets {
        for key in registry.keys() {
            println!("{key}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    // fail on an unknown generator before any network round-trip
    registry.resolve(config.template(), config.language())?;

    let schema = load_schema(&cli, &config).await?;

    let run = generate(&config, &schema, &registry, cli.templates.as_deref()).await?;
    if let Some(path) = &cli.dump_model {
        dump_model(&run.definition, path)?;
    }

    println!(
        "{}: {} written, {} skipped, {} failed ({} models, {} operations)",
        run.target.language,
        run.report.written.len(),
        run.report.skipped.len(),
        run.report.failed.len(),
        run.definition.required_models.len(),
        run.definition.catalog.len(),
    );
    if run.report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        for path in &run.report.failed {
            eprintln!("failed: {path}");
        }
        Ok(ExitCode::from(2))
    }
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig, Error> {
    let file = match &cli.config {
        Some(path) => Some(GeneratorConfig::load(path)?),
        None => {
            let path = GeneratorConfig::default_path(cli.target.as_deref().unwrap_or(Path::new(".")));
            if path.is_file() {
                debug!(path = %path.display(), "using config file");
                Some(GeneratorConfig::load(&path)?)
            } else {
                None
            }
        }
    };

    let mut flags = GeneratorConfig::new();
    flags.target = cli.target.clone();
    flags.template = cli.template.clone();
    flags.source = cli.source.clone();
    flags.language = cli.language.clone();
    flags.package_name = cli.package_name.clone();
    for (key, value) in &cli.vars {
        flags = flags.with_var(key.clone(), value.clone());
    }

    Ok(file.unwrap_or_default().overlay(flags))
}

async fn load_schema(cli: &Cli, config: &GeneratorConfig) -> Result<IntrospectionSchema, Error> {
    if let Some(path) = &cli.schema {
        info!(path = %path.display(), "reading schema file");
        return SchemaSource::File(path.clone()).load().await;
    }

    let endpoint = match &cli.endpoint {
        Some(url) => url.clone(),
        None => config.endpoint()?,
    };
    let transport = cli
        .headers
        .iter()
        .cloned()
        .fold(TransportConfig::new(endpoint), |transport, (name, value)| {
            transport.with_header(name, value)
        });
    IntrospectionClient::new(transport)?.fetch().await
}

fn dump_model(definition: &ServiceDefinition, path: &Path) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(definition)?;
    if path == Path::new("-") {
        println!("{json}");
        return Ok(());
    }
    std::fs::write(path, json + "\n").map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote model dump");
    Ok(())
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `name: value`, got `{raw}`"))?;
    let name = HeaderName::try_from(name.trim()).map_err(|err| err.to_string())?;
    let value = HeaderValue::try_from(value.trim()).map_err(|err| err.to_string())?;
    Ok((name, value))
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected `key=value`, got `{raw}`"))
}
