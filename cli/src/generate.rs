#![deny(missing_docs)]

//! # Generate Command
//!
//! Runs the whole pipeline: parse type declarations, register the operations
//! manifest, dump the database schema, then write the JSON documentation and
//! the OpenAPI YAML.

use crate::manifest::{load_manifest, register_all};
use apidoc_core::database::dump_schema;
use apidoc_core::document::{build_openapi, write_outputs, ApiInfo, ApiServer};
use apidoc_core::error::{AppError, AppResult};
use apidoc_core::parser::parse_directory;
use apidoc_core::registry::ApiRegistry;
use apidoc_core::type_mapping::{ExternalType, RustToJsonMapper};
use std::path::PathBuf;
use tracing::info;

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Directory of Rust type declarations.
    #[clap(long, env = "APIDOC_TYPES_DIR")]
    pub types_dir: PathBuf,

    /// Operations manifest (.yaml, .yml or .json).
    #[clap(long, env = "APIDOC_OPERATIONS")]
    pub operations: Option<PathBuf>,

    /// Directory of SQL migrations to dump the schema from.
    #[clap(long, env = "APIDOC_MIGRATIONS_DIR")]
    pub migrations_dir: Option<PathBuf>,

    /// Output path of the JSON documentation.
    #[clap(long, env = "APIDOC_JSON_OUTPUT", default_value = "docs/api.json")]
    pub json_output: PathBuf,

    /// Output path of the OpenAPI YAML document.
    #[clap(long, env = "APIDOC_YAML_OUTPUT", default_value = "docs/openapi.yaml")]
    pub yaml_output: PathBuf,

    /// API title.
    #[clap(long, env = "APIDOC_TITLE", default_value = "API")]
    pub title: String,

    /// API version.
    #[clap(long, env = "APIDOC_API_VERSION", default_value = "0.1.0")]
    pub api_version: String,

    /// API description.
    #[clap(long, env = "APIDOC_DESCRIPTION")]
    pub description: Option<String>,

    /// Server URLs to list in the OpenAPI document.
    #[clap(long = "server", env = "APIDOC_SERVERS", value_delimiter = ',')]
    pub servers: Vec<String>,

    /// Extra allow-listed external types, as `Name=type[:format]`
    /// (e.g. `Money=string:decimal`).
    #[clap(long = "external-type", value_delimiter = ',')]
    pub external_types: Vec<String>,
}

/// Executes the generation.
pub fn execute(args: &GenerateArgs) -> AppResult<()> {
    if !args.types_dir.is_dir() {
        return Err(AppError::General(format!(
            "Types directory not found: {:?}",
            args.types_dir
        )));
    }

    let mapper = build_mapper(&args.external_types)?;
    let catalog = parse_directory(&args.types_dir, &mapper)?;
    let mut registry = ApiRegistry::with_mapper(catalog, Box::new(mapper));

    if let Some(path) = &args.operations {
        register_all(&mut registry, load_manifest(path)?)?;
    }

    let database = match &args.migrations_dir {
        Some(dir) => Some(dump_schema(dir)?),
        None => None,
    };

    let mut info = ApiInfo::new(&args.title, &args.api_version);
    if let Some(desc) = &args.description {
        info = info.with_description(desc);
    }
    for url in &args.servers {
        info = info.with_server(ApiServer::new(url));
    }

    let documentation = registry.finalize(&info, database)?;
    let openapi = build_openapi(&registry, &info)?;
    write_outputs(&documentation, &openapi, &args.json_output, &args.yaml_output)?;

    info!(
        types = documentation.types.len(),
        routes = documentation.http.len(),
        "Documentation generated"
    );
    Ok(())
}

fn build_mapper(external_types: &[String]) -> AppResult<RustToJsonMapper> {
    let mut mapper = RustToJsonMapper::new();
    for entry in external_types {
        let (name, spec) = entry.split_once('=').ok_or_else(|| {
            AppError::General(format!(
                "External type '{}' must look like Name=type[:format]",
                entry
            ))
        })?;
        mapper = mapper.with_external(name.trim(), ExternalType::parse(spec)?);
    }
    Ok(mapper)
}
