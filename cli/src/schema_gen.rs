#![deny(missing_docs)]

//! # Schema Command
//!
//! Renders the OpenAPI schema of a single documented type, without
//! registering any operation.

use apidoc_core::catalog::TypeCatalog;
use apidoc_core::error::{AppError, AppResult};
use apidoc_core::parser::{parse_directory, CatalogBuilder};
use apidoc_core::schema_generator::render_type_schema;
use apidoc_core::type_mapping::RustToJsonMapper;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the schema command.
#[derive(clap::Args, Debug, Clone)]
pub struct SchemaGenArgs {
    /// Rust source file, or directory of source files, declaring the type.
    #[clap(long)]
    pub source_path: PathBuf,

    /// Name of the type to render.
    #[clap(long)]
    pub name: String,

    /// Output path for the schema file.
    /// Supports .json and .yaml/.yml extensions.
    /// If not provided, prints JSON to stdout.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

/// Executes the schema rendering.
pub fn execute(args: &SchemaGenArgs) -> AppResult<()> {
    if !args.source_path.exists() {
        return Err(AppError::General(format!(
            "Source path not found: {:?}",
            args.source_path
        )));
    }

    let catalog = load_catalog(&args.source_path)?;
    let info = catalog
        .get(&args.name)
        .ok_or_else(|| AppError::General(format!("Type '{}' not found", args.name)))?;
    let schema = render_type_schema(info)?;

    match &args.output {
        Some(out_path) => {
            if let Some(parent) = out_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(out_path, format_schema(&schema, out_path)?)?;
            println!("Schema generated at {:?}", out_path);
        }
        None => println!("{}", serde_json::to_string_pretty(&schema)?),
    }

    Ok(())
}

fn load_catalog(source_path: &Path) -> AppResult<TypeCatalog> {
    let mapper = RustToJsonMapper::new();
    if source_path.is_dir() {
        return parse_directory(source_path, &mapper);
    }
    let content = fs::read_to_string(source_path)?;
    let mut builder = CatalogBuilder::new(&mapper);
    builder.add_source(&content, &source_path.display().to_string());
    builder.finish()
}

fn format_schema(schema: &Value, out_path: &Path) -> AppResult<String> {
    let ext = out_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("json");
    Ok(match ext {
        "yaml" | "yml" => serde_yaml::to_string(schema)?,
        _ => serde_json::to_string_pretty(schema)?,
    })
}
