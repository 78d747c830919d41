#![deny(missing_docs)]

//! # apidoc CLI
//!
//! Command Line Interface for the API documentation generator.
//!
//! Supported Commands:
//! - `generate`: Types + operations manifest + migrations -> api.json and openapi.yaml.
//! - `schema`: Renders the OpenAPI schema of a single type.

use apidoc_core::AppResult;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod generate;
mod manifest;
mod schema_gen;

#[derive(Parser, Debug)]
#[clap(author, version, about = "API documentation generator")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generates the JSON documentation and the OpenAPI document.
    Generate(generate::GenerateArgs),
    /// Renders the schema of one type.
    Schema(schema_gen::SchemaGenArgs),
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate(args) => generate::execute(args)?,
        Commands::Schema(args) => schema_gen::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "apidoc",
            "generate",
            "--types-dir",
            "src/types",
            "--server",
            "https://a.test,https://b.test",
            "--external-type",
            "Money=string:decimal",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.servers.len(), 2);
                assert_eq!(args.external_types, vec!["Money=string:decimal"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
