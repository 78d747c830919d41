//! # Examples
//!
//! Picks a registered example or synthesizes a zero value for a type.

use crate::catalog::{FieldType, JsonType, TypeCatalog, TypeKind, TypeShape};
use serde_json::{json, Map, Value};

/// The most complete candidate: the longest once serialized. Ties keep the first.
pub fn select_example(candidates: &[Value]) -> Option<Value> {
    let mut best: Option<(usize, &Value)> = None;
    for candidate in candidates {
        let len = serde_json::to_string(candidate).map(|s| s.len()).unwrap_or(0);
        if best.map_or(true, |(best_len, _)| len > best_len) {
            best = Some((len, candidate));
        }
    }
    best.map(|(_, value)| value.clone())
}

/// The zero value of a cataloged type. Reference cycles are cut with `null`.
pub fn zero_value(catalog: &TypeCatalog, name: &str) -> Value {
    let mut visiting = Vec::new();
    zero_of_named(catalog, name, &mut visiting)
}

fn zero_of_named(catalog: &TypeCatalog, name: &str, visiting: &mut Vec<String>) -> Value {
    let Some(info) = catalog.get(name) else {
        return Value::Null;
    };
    if visiting.iter().any(|v| v == name) {
        return Value::Null;
    }
    if let Some(first) = info.enum_values.first() {
        return first.value.to_json();
    }

    visiting.push(name.to_string());
    let value = match info.kind {
        TypeKind::Object => {
            let mut obj = Map::new();
            for field in &info.fields {
                obj.insert(
                    field.name.clone(),
                    zero_of_field(catalog, &field.field_type, visiting),
                );
            }
            Value::Object(obj)
        }
        _ => info
            .alias_of
            .as_ref()
            .map(|target| zero_of_field(catalog, target, visiting))
            .unwrap_or(Value::Null),
    };
    visiting.pop();
    value
}

fn zero_of_field(catalog: &TypeCatalog, ft: &FieldType, visiting: &mut Vec<String>) -> Value {
    if ft.nullable {
        return Value::Null;
    }
    match &ft.shape {
        TypeShape::Primitive { json_type, format } => zero_primitive(*json_type, format.as_deref()),
        TypeShape::Array { .. } => json!([]),
        TypeShape::Map { .. } => json!({}),
        TypeShape::Reference { name } | TypeShape::Enum { name } => {
            zero_of_named(catalog, name, visiting)
        }
    }
}

fn zero_primitive(json_type: JsonType, format: Option<&str>) -> Value {
    match (json_type, format) {
        (JsonType::String, Some("date-time")) => json!("0001-01-01T00:00:00Z"),
        (JsonType::String, Some("date")) => json!("0001-01-01"),
        (JsonType::String, Some("time")) => json!("00:00:00"),
        (JsonType::String, Some("uuid")) => json!("00000000-0000-0000-0000-000000000000"),
        (JsonType::String, _) => json!(""),
        (JsonType::Integer, _) => json!(0),
        (JsonType::Number, _) => json!(0.0),
        (JsonType::Boolean, _) => json!(false),
    }
}
