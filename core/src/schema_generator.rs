#![deny(missing_docs)]

//! # Schema Generator
//!
//! Utilities for converting cataloged types into OpenAPI 3.0 schema objects.
//! Named types are referenced through `#/components/schemas/<Name>`; nullable
//! values use the 3.0 `nullable` keyword.

use crate::catalog::{FieldInfo, FieldType, TypeInfo, TypeKind, TypeShape};
use crate::error::{AppError, AppResult};
use serde_json::{json, Map, Value};

/// Prefix of every component reference.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Renders a type descriptor.
pub fn render_field_type(ft: &FieldType) -> Value {
    let mut schema = match &ft.shape {
        TypeShape::Primitive { json_type, format } => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), json!(json_type.as_str()));
            if let Some(format) = format {
                obj.insert("format".to_string(), json!(format));
            }
            obj
        }
        TypeShape::Array { items } => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), json!("array"));
            obj.insert("items".to_string(), render_field_type(items));
            obj
        }
        TypeShape::Map { values, .. } => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), json!("object"));
            obj.insert("additionalProperties".to_string(), render_field_type(values));
            obj
        }
        TypeShape::Reference { name } | TypeShape::Enum { name } => {
            let reference = json!({ "$ref": format!("{}{}", SCHEMA_REF_PREFIX, name) });
            if !ft.nullable {
                return reference;
            }
            let mut obj = Map::new();
            obj.insert("allOf".to_string(), json!([reference]));
            obj
        }
    };

    if ft.nullable {
        schema.insert("nullable".to_string(), json!(true));
    }
    Value::Object(schema)
}

/// Renders a descriptor carrying its own documentation.
///
/// `$ref` siblings are ignored in OpenAPI 3.0, so annotated references are
/// wrapped in `allOf`.
pub fn render_annotated(ft: &FieldType, description: Option<&str>, deprecated: bool) -> Value {
    let rendered = render_field_type(ft);
    if description.is_none() && !deprecated {
        return rendered;
    }

    let mut obj = match rendered {
        Value::Object(obj) if !obj.contains_key("$ref") => obj,
        reference => {
            let mut obj = Map::new();
            obj.insert("allOf".to_string(), json!([reference]));
            obj
        }
    };
    if let Some(desc) = description {
        obj.insert("description".to_string(), json!(desc));
    }
    if deprecated {
        obj.insert("deprecated".to_string(), json!(true));
    }
    Value::Object(obj)
}

/// Renders the component schema of a cataloged type.
pub fn render_type_schema(info: &TypeInfo) -> AppResult<Value> {
    let mut schema = match info.kind {
        TypeKind::Object => render_object(info),
        TypeKind::Alias => {
            let target = info.alias_of.as_ref().ok_or_else(|| {
                AppError::Render(format!("alias '{}' has no target type", info.name))
            })?;
            match render_field_type(target) {
                Value::Object(obj) if !obj.contains_key("$ref") => obj,
                reference => {
                    let mut obj = Map::new();
                    obj.insert("allOf".to_string(), json!([reference]));
                    obj
                }
            }
        }
        TypeKind::StringEnum | TypeKind::NumberEnum => return render_enum(info),
    };

    if let Some(desc) = &info.description {
        schema.insert("description".to_string(), json!(desc));
    }
    if info.deprecated.is_some() {
        schema.insert("deprecated".to_string(), json!(true));
    }
    Ok(Value::Object(schema))
}

fn render_object(info: &TypeInfo) -> Map<String, Value> {
    let mut properties = Map::new();
    for field in &info.fields {
        properties.insert(field.name.clone(), render_property(field));
    }
    let required: Vec<&str> = info
        .fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.as_str())
        .collect();

    let mut obj = Map::new();
    obj.insert("type".to_string(), json!("object"));
    obj.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        obj.insert("required".to_string(), json!(required));
    }
    obj.insert("additionalProperties".to_string(), json!(false));
    obj
}

fn render_property(field: &FieldInfo) -> Value {
    let description = match (&field.description, &field.deprecated) {
        (Some(desc), Some(dep)) => Some(format!("{}\n\nDeprecated: {}", desc, dep)),
        (None, Some(dep)) => Some(format!("Deprecated: {}", dep)),
        (desc, None) => desc.clone(),
    };
    render_annotated(
        &field.field_type,
        description.as_deref(),
        field.deprecated.is_some(),
    )
}

fn render_enum(info: &TypeInfo) -> AppResult<Value> {
    if info.enum_values.is_empty() {
        return Err(AppError::Render(format!(
            "enum '{}' has no values",
            info.name
        )));
    }
    let json_type = match info.kind {
        TypeKind::StringEnum => "string",
        _ => "integer",
    };
    let values: Vec<Value> = info.enum_values.iter().map(|v| v.value.to_json()).collect();

    let mut obj = Map::new();
    obj.insert("type".to_string(), json!(json_type));
    obj.insert("enum".to_string(), Value::Array(values));
    obj.insert("description".to_string(), json!(enum_description(info)));
    if info.deprecated.is_some() {
        obj.insert("deprecated".to_string(), json!(true));
    }
    Ok(Value::Object(obj))
}

/// OpenAPI 3.0 has no per-value metadata; values are listed in the description.
fn enum_description(info: &TypeInfo) -> String {
    let mut lines = Vec::new();
    if let Some(desc) = &info.description {
        lines.push(desc.clone());
        lines.push(String::new());
    }
    if let Some(dep) = &info.deprecated {
        lines.push(format!("Deprecated: {}", dep));
        lines.push(String::new());
    }
    lines.push("Possible values:".to_string());
    for value in &info.enum_values {
        let mut line = format!("- `{}`", value.value);
        if let Some(desc) = &value.description {
            line.push_str(": ");
            line.push_str(&desc.replace('\n', " "));
        }
        if let Some(dep) = &value.deprecated {
            line.push_str(&format!(" (Deprecated: {})", dep));
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Renders the `components.schemas` map for the given types.
pub fn render_components<'a>(
    types: impl IntoIterator<Item = &'a TypeInfo>,
) -> AppResult<Map<String, Value>> {
    let mut schemas = Map::new();
    for info in types {
        schemas.insert(info.name.clone(), render_type_schema(info)?);
    }
    Ok(schemas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JsonType;
    use crate::parser::parse_source;
    use crate::type_mapping::RustToJsonMapper;

    fn schema_of(code: &str, name: &str) -> AppResult<Value> {
        let catalog = parse_source(code, &RustToJsonMapper::new())?;
        render_type_schema(catalog.get(name).expect("type"))
    }

    #[test]
    fn test_object_schema_required_matches_fields() {
        let schema = schema_of(
            r#"
            /// A device.
            pub struct Device {
                pub id: String,
                pub name: Option<String>,
                #[serde(default)]
                pub tags: Vec<String>,
                /// Deprecated: use id
                pub legacy_id: i64,
            }
            "#,
            "Device",
        )
        .unwrap();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["description"], "A device.");
        assert_eq!(schema["required"], json!(["id", "legacy_id"]));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(
            schema["properties"]["name"],
            json!({ "type": "string", "nullable": true })
        );
        assert_eq!(
            schema["properties"]["tags"],
            json!({ "type": "array", "items": { "type": "string" } })
        );
        assert_eq!(schema["properties"]["legacy_id"]["deprecated"], json!(true));
        assert_eq!(
            schema["properties"]["legacy_id"]["description"],
            "Deprecated: use id"
        );
    }

    #[test]
    fn test_required_omitted_when_empty() {
        let schema = schema_of("pub struct Patch { pub name: Option<String> }", "Patch").unwrap();
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_references_and_nullable_wrapping() {
        let plain = render_field_type(&FieldType::reference("Sensor"));
        assert_eq!(plain, json!({ "$ref": "#/components/schemas/Sensor" }));

        let nullable = render_field_type(&FieldType::reference("Sensor").into_nullable());
        assert_eq!(
            nullable,
            json!({ "allOf": [{ "$ref": "#/components/schemas/Sensor" }], "nullable": true })
        );

        let annotated = render_annotated(&FieldType::reference("Sensor"), Some("The sensor"), false);
        assert_eq!(
            annotated,
            json!({ "allOf": [{ "$ref": "#/components/schemas/Sensor" }], "description": "The sensor" })
        );
    }

    #[test]
    fn test_map_alias_schema() {
        let schema = schema_of(
            "pub type Counters = std::collections::BTreeMap<String, u32>;",
            "Counters",
        )
        .unwrap();
        assert_eq!(
            schema,
            json!({ "type": "object", "additionalProperties": { "type": "integer", "format": "int32" } })
        );
    }

    #[test]
    fn test_string_enum_schema() {
        let schema = schema_of(
            r#"
            /// Outcome.
            pub enum Status {
                /// Success.
                OK,
                NotFound,
                /// Deprecated: use NotFound
                Error,
            }
            "#,
            "Status",
        )
        .unwrap();
        assert_eq!(schema["type"], "string");
        assert_eq!(schema["enum"], json!(["OK", "NotFound", "Error"]));
        assert_eq!(
            schema["description"],
            "Outcome.\n\nPossible values:\n- `OK`: Success.\n- `NotFound`\n- `Error` (Deprecated: use NotFound)"
        );
    }

    #[test]
    fn test_number_enum_schema() {
        let schema = schema_of("pub enum Level { Low = 1, High = 5 }", "Level").unwrap();
        assert_eq!(schema["type"], "integer");
        assert_eq!(schema["enum"], json!([1, 5]));
    }

    #[test]
    fn test_empty_enum_is_render_error() {
        let info = TypeInfo::new("Empty", TypeKind::StringEnum);
        assert!(matches!(render_type_schema(&info), Err(AppError::Render(_))));
    }

    #[test]
    fn test_components_map() {
        let mut alias = TypeInfo::new("Id", TypeKind::Alias);
        alias.alias_of = Some(FieldType::primitive(JsonType::String, Some("uuid")));
        let components = render_components([&alias]).unwrap();
        assert_eq!(
            components["Id"],
            json!({ "type": "string", "format": "uuid" })
        );
    }
}
