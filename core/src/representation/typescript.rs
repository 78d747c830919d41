//! # TypeScript
//!
//! TypeScript declarations for cataloged types.

use crate::catalog::{FieldType, JsonType, TypeInfo, TypeKind, TypeShape};
use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

/// Renders the TypeScript declaration of a type.
pub fn typescript_declaration(info: &TypeInfo) -> AppResult<String> {
    let mut out = jsdoc(info.description.as_deref(), info.deprecated.as_deref(), "");

    match info.kind {
        TypeKind::Object => {
            out.push_str(&format!("export interface {} {{\n", info.name));
            for field in &info.fields {
                out.push_str(&jsdoc(
                    field.description.as_deref(),
                    field.deprecated.as_deref(),
                    "  ",
                ));
                let optional = if field.required { "" } else { "?" };
                out.push_str(&format!(
                    "  {}{}: {};\n",
                    property_key(&field.name),
                    optional,
                    typescript_type(&field.field_type)
                ));
            }
            out.push('}');
        }
        TypeKind::StringEnum | TypeKind::NumberEnum => {
            if info.enum_values.is_empty() {
                return Err(AppError::Render(format!(
                    "enum '{}' has no values",
                    info.name
                )));
            }
            let members: Vec<String> = info
                .enum_values
                .iter()
                .map(|v| v.value.to_json().to_string())
                .collect();
            out.push_str(&format!("export type {} = {};", info.name, members.join(" | ")));
        }
        TypeKind::Alias => {
            let target = info.alias_of.as_ref().ok_or_else(|| {
                AppError::Render(format!("alias '{}' has no target type", info.name))
            })?;
            out.push_str(&format!(
                "export type {} = {};",
                info.name,
                typescript_type(target)
            ));
        }
    }

    Ok(out)
}

/// Renders a type descriptor as a TypeScript type expression.
pub fn typescript_type(ft: &FieldType) -> String {
    let base = match &ft.shape {
        TypeShape::Primitive { json_type, .. } => match json_type {
            JsonType::String => "string".to_string(),
            JsonType::Integer | JsonType::Number => "number".to_string(),
            JsonType::Boolean => "boolean".to_string(),
        },
        TypeShape::Array { items } => {
            let inner = typescript_type(items);
            if inner.contains(' ') {
                format!("({})[]", inner)
            } else {
                format!("{}[]", inner)
            }
        }
        TypeShape::Map { values, .. } => format!("Record<string, {}>", typescript_type(values)),
        TypeShape::Reference { name } | TypeShape::Enum { name } => name.clone(),
    };

    if ft.nullable {
        format!("{} | null", base)
    } else {
        base
    }
}

fn jsdoc(description: Option<&str>, deprecated: Option<&str>, indent: &str) -> String {
    let mut lines: Vec<String> = description
        .map(|d| d.lines().map(str::to_string).collect())
        .unwrap_or_default();
    if let Some(dep) = deprecated {
        lines.push(format!("@deprecated {}", dep));
    }

    match lines.len() {
        0 => String::new(),
        1 => format!("{}/** {} */\n", indent, lines[0]),
        _ => {
            let mut out = format!("{}/**\n", indent);
            for line in lines {
                if line.is_empty() {
                    out.push_str(&format!("{} *\n", indent));
                } else {
                    out.push_str(&format!("{} * {}\n", indent, line));
                }
            }
            out.push_str(&format!("{} */\n", indent));
            out
        }
    }
}

fn property_key(name: &str) -> String {
    static IDENT_RE: OnceLock<Regex> = OnceLock::new();
    let ident_re =
        IDENT_RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("Invalid regex"));

    if ident_re.is_match(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}
