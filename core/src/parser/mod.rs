#![deny(missing_docs)]

//! # Parser Module
//!
//! Handles parsing of Rust source code using `syn`.
//! Extracts structs, enums, aliases, const blocks, documentation and serde
//! attributes into a [`TypeCatalog`].

pub mod attributes;
pub mod docs;
pub mod enums;
pub mod extractors;

pub use attributes::{extract_attributes, AttrInfo, RenameRule};
pub use docs::{documentation, extract_doc_comment, split_deprecation, Documentation};
pub use enums::{apply_const_block, extract_const_block, ConstBlock, ConstDecl};
pub use extractors::{extract_alias, extract_enum, extract_struct};

use crate::catalog::TypeCatalog;
use crate::error::{AppError, AppResult};
use crate::type_mapping::TypeMapper;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Accumulates declarations from any number of source files.
///
/// Errors of independent types are collected; [`CatalogBuilder::finish`]
/// reports all of them at once.
#[derive(Debug)]
pub struct CatalogBuilder<'a> {
    mapper: &'a dyn TypeMapper,
    catalog: TypeCatalog,
    const_blocks: Vec<ConstBlock>,
    errors: Vec<AppError>,
}

impl<'a> CatalogBuilder<'a> {
    /// Creates a builder mapping field types with `mapper`.
    pub fn new(mapper: &'a dyn TypeMapper) -> Self {
        Self {
            mapper,
            catalog: TypeCatalog::new(),
            const_blocks: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Parses one source file. `origin` names it in syntax errors.
    pub fn add_source(&mut self, code: &str, origin: &str) {
        match syn::parse_file(code) {
            Ok(file) => {
                debug!(origin, items = file.items.len(), "Parsed source file");
                self.visit_items(&file.items);
            }
            Err(e) => self.errors.push(AppError::Syntax {
                path: origin.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn visit_items(&mut self, items: &[syn::Item]) {
        for item in items {
            match item {
                syn::Item::Struct(s) if is_public(&s.vis) => {
                    let result = extract_struct(s, self.mapper);
                    self.record(result, item);
                }
                syn::Item::Enum(e) if is_public(&e.vis) => {
                    let result = extract_enum(e);
                    self.record(result, item);
                }
                syn::Item::Type(t) if is_public(&t.vis) => {
                    let result = extract_alias(t, self.mapper);
                    self.record(result, item);
                }
                syn::Item::Impl(imp) => {
                    if let Some(block) = extract_const_block(imp) {
                        self.const_blocks.push(block);
                    }
                }
                syn::Item::Mod(module) if !attributes::is_test_only(&module.attrs) => {
                    if let Some((_, inner)) = &module.content {
                        self.visit_items(inner);
                    }
                }
                _ => {}
            }
        }
    }

    fn record(&mut self, result: AppResult<crate::catalog::TypeInfo>, item: &syn::Item) {
        match result {
            Ok(info) => {
                let name = info.name.clone();
                match self.catalog.insert(info) {
                    Ok(()) => self.catalog.record_source(&name, item.clone()),
                    Err(e) => self.errors.push(e),
                }
            }
            Err(e) => self.errors.push(e),
        }
    }

    /// Applies const blocks, resolves references and returns the catalog or
    /// every error encountered.
    pub fn finish(mut self) -> AppResult<TypeCatalog> {
        for block in std::mem::take(&mut self.const_blocks) {
            if let Err(e) = apply_const_block(&mut self.catalog, &block) {
                self.errors.push(e);
            }
        }

        if self.errors.is_empty() {
            if let Err(e) = self.catalog.resolve_references() {
                self.errors.push(e);
            }
        }

        let errors: Vec<AppError> = self
            .errors
            .into_iter()
            .flat_map(|e| match e {
                AppError::Multiple(inner) => inner,
                other => vec![other],
            })
            .collect();
        AppError::join(errors)?;

        info!(types = self.catalog.len(), "Type catalog built");
        Ok(self.catalog)
    }
}

/// Parses a single source file into a catalog.
pub fn parse_source(code: &str, mapper: &dyn TypeMapper) -> AppResult<TypeCatalog> {
    let mut builder = CatalogBuilder::new(mapper);
    builder.add_source(code, "<source>");
    builder.finish()
}

/// Parses every `*.rs` file below `dir`, in path order.
pub fn parse_directory(dir: &Path, mapper: &dyn TypeMapper) -> AppResult<TypeCatalog> {
    info!(dir = %dir.display(), "Parsing type declarations");
    let mut builder = CatalogBuilder::new(mapper);

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| AppError::General(format!("Failed to walk directory: {}", e)))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("rs")
        {
            continue;
        }
        let code = fs::read_to_string(path)?;
        builder.add_source(&code, &path.display().to_string());
    }

    builder.finish()
}

fn is_public(vis: &syn::Visibility) -> bool {
    matches!(vis, syn::Visibility::Public(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{TypeKind, TypeShape};
    use crate::type_mapping::RustToJsonMapper;

    #[test]
    fn test_config_constants_do_not_fail_parse() {
        let code = r#"
            pub struct Config { pub port: u16 }

            impl Config {
                pub const DEFAULT_PORT: u16 = 8080;
                pub const NAME: &'static str = "svc";
                const RETRIES: u8 = 3;
            }
        "#;
        let catalog = parse_source(code, &RustToJsonMapper::new()).unwrap();
        assert_eq!(catalog.get("Config").unwrap().kind, TypeKind::Object);
    }

    #[test]
    fn test_map_keys_checked_after_resolution() {
        let code = r#"
            use std::collections::HashMap;

            pub struct Point { pub x: i32 }
            pub enum Region { North, South }
            pub struct Sku(pub String);

            pub struct ByRegion { pub totals: HashMap<Region, i32>, pub stock: HashMap<Sku, u32> }
            pub struct ByPoint { pub hits: HashMap<Point, i32> }
        "#;
        let err = parse_source(code, &RustToJsonMapper::new()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("'ByPoint'"));
        assert!(text.contains("uses 'Point' as a map key"));
        assert!(!text.contains("ByRegion"));
    }

    #[test]
    fn test_parse_source_builds_catalog() {
        let code = r#"
            use serde::{Deserialize, Serialize};

            /// Outcome of a call.
            #[derive(Serialize, Deserialize)]
            pub struct Status(pub String);

            impl Status {
                pub const OK: Status = Status("OK");
                pub const NOT_FOUND: Status = Status("NotFound");
                pub const ERROR: Status = Status("Error");
            }

            #[derive(Serialize)]
            pub struct Reply {
                pub status: Status,
                pub detail: Option<String>,
            }

            struct Hidden { x: i32 }

            #[cfg(test)]
            mod tests {
                pub struct Fixture { pub x: i32 }
            }

            pub mod nested {
                pub type Tags = Vec<String>;
            }
        "#;

        let catalog = parse_source(code, &RustToJsonMapper::new()).unwrap();
        assert_eq!(catalog.names(), vec!["Reply", "Status", "Tags"]);

        let status = catalog.get("Status").unwrap();
        assert_eq!(status.kind, TypeKind::StringEnum);
        assert_eq!(status.enum_values.len(), 3);
        assert_eq!(catalog.sources("Status").unwrap().len(), 2);

        let reply = catalog.get("Reply").unwrap();
        assert_eq!(
            reply.fields[0].field_type.shape,
            TypeShape::Enum {
                name: "Status".into()
            }
        );
    }

    #[test]
    fn test_errors_are_collected() {
        let code = r#"
            pub struct A { pub f: fn() }
            pub struct B { pub missing: Unknown }
            pub enum C { Data(i32) }
        "#;
        let err = parse_source(code, &RustToJsonMapper::new()).unwrap_err();
        match err {
            AppError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected joined errors, got {}", other),
        }
    }

    #[test]
    fn test_unknown_reference_reported() {
        let err = parse_source("pub struct B { pub missing: Unknown }", &RustToJsonMapper::new())
            .unwrap_err();
        assert!(err.to_string().contains("unknown type 'Unknown'"));
    }

    #[test]
    fn test_syntax_error_names_origin() {
        let err = parse_source("pub struct {", &RustToJsonMapper::new()).unwrap_err();
        assert!(matches!(err, AppError::Syntax { ref path, .. } if path == "<source>"));
    }

    #[test]
    fn test_parse_directory_walks_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "pub struct Alpha { pub beta: Beta }").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.rs"), "pub enum Beta { One, Two }").unwrap();
        fs::write(dir.path().join("notes.txt"), "pub struct Ignored;").unwrap();

        let catalog = parse_directory(dir.path(), &RustToJsonMapper::new()).unwrap();
        assert_eq!(catalog.names(), vec!["Alpha", "Beta"]);
    }
}
