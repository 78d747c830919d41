//! # Representations
//!
//! Human-readable renderings of every cataloged type: the Rust declaration,
//! a TypeScript declaration, an example value and the JSON Schema. They are
//! computed once and cached on the [`TypeInfo`](crate::catalog::TypeInfo).

pub mod example;
pub mod typescript;

pub use example::{select_example, zero_value};
pub use typescript::{typescript_declaration, typescript_type};

use crate::catalog::{Representations, TypeCatalog};
use crate::error::{AppError, AppResult};
use crate::schema_generator::render_type_schema;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Fills the representations of every type that has none yet.
///
/// `examples` maps a type name to the examples registered for bodies of
/// exactly that type.
pub fn generate_representations(
    catalog: &mut TypeCatalog,
    examples: &BTreeMap<String, Vec<Value>>,
) -> AppResult<()> {
    for name in catalog.names() {
        let Some(info) = catalog.get(&name) else {
            continue;
        };
        if info.representations.is_some() {
            continue;
        }

        let source = render_source(catalog, &name)?;
        let typescript = typescript_declaration(info)?;
        let json_schema = serde_json::to_string_pretty(&render_type_schema(info)?)?;
        let example = examples
            .get(&name)
            .and_then(|candidates| select_example(candidates))
            .unwrap_or_else(|| zero_value(catalog, &name));

        debug!(type_name = %name, "Generated representations");
        if let Some(info) = catalog.get_mut(&name) {
            info.representations = Some(Representations {
                source,
                typescript,
                example,
                json_schema,
            });
        }
    }
    Ok(())
}

/// Pretty-prints the declaration items recorded for `name`.
pub fn render_source(catalog: &TypeCatalog, name: &str) -> AppResult<String> {
    let items = catalog
        .sources(name)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| AppError::Render(format!("no declaration recorded for '{}'", name)))?;

    let file = syn::File {
        shebang: None,
        attrs: Vec::new(),
        items: items.to_vec(),
    };
    Ok(prettyplease::unparse(&file).trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{TypeInfo, TypeKind};
    use crate::parser::parse_source;
    use crate::type_mapping::RustToJsonMapper;
    use serde_json::json;

    const TYPES: &str = r#"
        /// Outcome.
        pub struct Status(pub String);

        impl Status {
            pub const OK: Status = Status("OK");
            pub const FAILED: Status = Status("Failed");
        }

        pub struct Reply { pub status: Status, pub count: u32 }
    "#;

    #[test]
    fn test_generates_all_representations() {
        let mut catalog = parse_source(TYPES, &RustToJsonMapper::new()).unwrap();
        let mut examples = BTreeMap::new();
        examples.insert(
            "Reply".to_string(),
            vec![json!({ "status": "OK" }), json!({ "status": "Failed", "count": 3 })],
        );

        generate_representations(&mut catalog, &examples).unwrap();

        let status = catalog.get("Status").unwrap().representations.clone().unwrap();
        assert!(status.source.contains("pub struct Status(pub String);"));
        assert!(status.source.contains("pub const FAILED: Status = Status(\"Failed\");"));
        assert_eq!(status.typescript, "/** Outcome. */\nexport type Status = \"OK\" | \"Failed\";");
        assert_eq!(status.example, json!("OK"));
        assert!(status.json_schema.contains("\"enum\""));

        let reply = catalog.get("Reply").unwrap().representations.clone().unwrap();
        assert_eq!(reply.example, json!({ "status": "Failed", "count": 3 }));
    }

    #[test]
    fn test_representations_are_not_recomputed() {
        let mut catalog = parse_source(TYPES, &RustToJsonMapper::new()).unwrap();
        generate_representations(&mut catalog, &BTreeMap::new()).unwrap();
        let first = catalog.get("Reply").unwrap().representations.clone();

        let mut examples = BTreeMap::new();
        examples.insert("Reply".to_string(), vec![json!({ "status": "OK", "count": 1 })]);
        generate_representations(&mut catalog, &examples).unwrap();
        assert_eq!(catalog.get("Reply").unwrap().representations, first);
    }

    #[test]
    fn test_missing_source_is_render_error() {
        let mut catalog = TypeCatalog::new();
        catalog.insert(TypeInfo::new("Ghost", TypeKind::Object)).unwrap();
        let err = generate_representations(&mut catalog, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
    }
}
