//! # Extraction Logic
//!
//! Turns `pub` struct, enum and type alias items into [`TypeInfo`] entries.

use crate::catalog::{EnumLiteral, EnumValue, FieldInfo, TypeInfo, TypeKind};
use crate::error::{AppError, AppResult};
use crate::parser::attributes::{extract_attributes, RenameRule};
use crate::parser::docs::documentation;
use crate::type_mapping::{mapping_message, type_display, TypeMapper};
use syn::ext::IdentExt;

/// Extracts an object (named fields) or alias (single-field tuple struct).
pub fn extract_struct(item: &syn::ItemStruct, mapper: &dyn TypeMapper) -> AppResult<TypeInfo> {
    let name = item.ident.unraw().to_string();
    reject_generics(&name, &item.generics)?;
    let docs = documentation(&item.attrs).map_err(|msg| AppError::type_error(&name, msg))?;

    let mut info = match &item.fields {
        syn::Fields::Named(named) => {
            let mut info = TypeInfo::new(&name, TypeKind::Object);
            let rename_all = container_rename_rule(&name, &item.attrs)?;
            let mut errors = Vec::new();

            for field in &named.named {
                match extract_field(&name, field, rename_all, mapper) {
                    Ok(Some(f)) => info.fields.push(f),
                    Ok(None) => {}
                    Err(e) => errors.push(e),
                }
            }
            AppError::join(errors)?;
            info
        }
        syn::Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            let inner = &unnamed.unnamed[0].ty;
            let mut info = TypeInfo::new(&name, TypeKind::Alias);
            info.alias_of = Some(
                mapper
                    .map_type(inner)
                    .map_err(|e| AppError::type_error(&name, mapping_message(e)))?,
            );
            info
        }
        syn::Fields::Unnamed(unnamed) => {
            return Err(AppError::type_error(
                &name,
                format!(
                    "tuple structs with {} fields are not supported",
                    unnamed.unnamed.len()
                ),
            ))
        }
        syn::Fields::Unit => {
            return Err(AppError::type_error(
                &name,
                "unit structs have no wire representation",
            ))
        }
    };

    info.description = docs.description;
    info.deprecated = docs.deprecated;
    Ok(info)
}

/// Extracts `pub type Name = Target;`.
pub fn extract_alias(item: &syn::ItemType, mapper: &dyn TypeMapper) -> AppResult<TypeInfo> {
    let name = item.ident.unraw().to_string();
    reject_generics(&name, &item.generics)?;
    let docs = documentation(&item.attrs).map_err(|msg| AppError::type_error(&name, msg))?;

    let mut info = TypeInfo::new(&name, TypeKind::Alias);
    info.alias_of = Some(
        mapper
            .map_type(&item.ty)
            .map_err(|e| AppError::type_error(&name, mapping_message(e)))?,
    );
    info.description = docs.description;
    info.deprecated = docs.deprecated;
    Ok(info)
}

/// Extracts a unit-only enum as a string enum, or a number enum when any
/// variant carries an explicit discriminant.
pub fn extract_enum(item: &syn::ItemEnum) -> AppResult<TypeInfo> {
    let name = item.ident.unraw().to_string();
    reject_generics(&name, &item.generics)?;
    let docs = documentation(&item.attrs).map_err(|msg| AppError::type_error(&name, msg))?;
    let rename_all = container_rename_rule(&name, &item.attrs)?;

    if let Some(variant) = item
        .variants
        .iter()
        .find(|v| !matches!(v.fields, syn::Fields::Unit))
    {
        return Err(AppError::type_error(
            &name,
            format!(
                "variant '{}' carries data; only unit variants are supported",
                variant.ident
            ),
        ));
    }

    let numeric = item.variants.iter().any(|v| v.discriminant.is_some());
    let kind = if numeric {
        TypeKind::NumberEnum
    } else {
        TypeKind::StringEnum
    };
    let mut info = TypeInfo::new(&name, kind);
    let mut next_discriminant: Option<i64> = Some(0);

    for variant in &item.variants {
        let variant_name = variant.ident.unraw().to_string();
        let attrs = extract_attributes(&variant.attrs);
        let variant_docs = documentation(&variant.attrs).map_err(|msg| {
            AppError::type_error(&name, format!("variant '{}': {}", variant_name, msg))
        })?;

        let value = if numeric {
            let value = match &variant.discriminant {
                Some((_, expr)) => integer_literal(expr).ok_or_else(|| {
                    AppError::type_error(
                        &name,
                        format!(
                            "discriminant of variant '{}' is not an integer literal",
                            variant_name
                        ),
                    )
                })?,
                None => next_discriminant.ok_or_else(|| {
                    AppError::type_error(
                        &name,
                        format!(
                            "implicit discriminant of variant '{}' overflows i64",
                            variant_name
                        ),
                    )
                })?,
            };
            next_discriminant = value.checked_add(1);
            EnumLiteral::Integer(value)
        } else {
            EnumLiteral::String(
                attrs
                    .rename
                    .clone()
                    .or_else(|| rename_all.map(|rule| rule.apply(&variant_name)))
                    .unwrap_or_else(|| variant_name.clone()),
            )
        };

        if attrs.is_skipped {
            continue;
        }

        info.enum_values.push(EnumValue {
            value,
            name: variant_name,
            description: variant_docs.description,
            deprecated: variant_docs.deprecated,
        });
    }

    info.description = docs.description;
    info.deprecated = docs.deprecated;
    Ok(info)
}

/// Evaluates an integer literal, optionally negated or parenthesized.
pub fn integer_literal(expr: &syn::Expr) -> Option<i64> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int),
            ..
        }) => int.base10_parse::<i64>().ok(),
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => integer_literal(expr).and_then(i64::checked_neg),
        syn::Expr::Paren(paren) => integer_literal(&paren.expr),
        syn::Expr::Group(group) => integer_literal(&group.expr),
        _ => None,
    }
}

fn extract_field(
    type_name: &str,
    field: &syn::Field,
    rename_all: Option<RenameRule>,
    mapper: &dyn TypeMapper,
) -> AppResult<Option<FieldInfo>> {
    let Some(ident) = &field.ident else {
        return Ok(None);
    };
    let rust_name = ident.unraw().to_string();
    let attrs = extract_attributes(&field.attrs);

    if attrs.is_skipped {
        return Ok(None);
    }
    if attrs.is_flattened {
        return Err(AppError::type_error(
            type_name,
            format!("field '{}': #[serde(flatten)] is not supported", rust_name),
        ));
    }

    let field_type = mapper.map_type(&field.ty).map_err(|e| {
        AppError::type_error(
            type_name,
            format!("field '{}': {}", rust_name, mapping_message(e)),
        )
    })?;
    let docs = documentation(&field.attrs).map_err(|msg| {
        AppError::type_error(type_name, format!("field '{}': {}", rust_name, msg))
    })?;

    let name = attrs
        .rename
        .or_else(|| rename_all.map(|rule| rule.apply(&rust_name)))
        .unwrap_or_else(|| rust_name.clone());
    let nullable = field_type.nullable;

    Ok(Some(FieldInfo {
        name,
        rust_name,
        display: type_display(&field.ty),
        field_type,
        description: docs.description,
        deprecated: docs.deprecated,
        required: !nullable && !attrs.is_optional,
        nullable,
    }))
}

fn container_rename_rule(
    type_name: &str,
    attrs: &[syn::Attribute],
) -> AppResult<Option<RenameRule>> {
    match extract_attributes(attrs).rename_all {
        None => Ok(None),
        Some(raw) => RenameRule::parse(&raw).map(Some).ok_or_else(|| {
            AppError::type_error(type_name, format!("unknown rename_all rule '{}'", raw))
        }),
    }
}

fn reject_generics(type_name: &str, generics: &syn::Generics) -> AppResult<()> {
    let has_type_params = generics
        .params
        .iter()
        .any(|p| !matches!(p, syn::GenericParam::Lifetime(_)));
    if has_type_params {
        return Err(AppError::type_error(
            type_name,
            "generic type declarations are not supported",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{JsonType, TypeShape};
    use crate::type_mapping::RustToJsonMapper;

    fn parse_struct(code: &str) -> AppResult<TypeInfo> {
        let item: syn::ItemStruct = syn::parse_str(code).expect("struct");
        extract_struct(&item, &RustToJsonMapper::new())
    }

    fn parse_enum(code: &str) -> AppResult<TypeInfo> {
        let item: syn::ItemEnum = syn::parse_str(code).expect("enum");
        extract_enum(&item)
    }

    #[test]
    fn test_struct_fields_and_required() {
        let info = parse_struct(
            r#"
            /// A sensor reading.
            #[serde(rename_all = "camelCase")]
            pub struct Reading {
                /// Device identifier.
                pub device_id: String,
                pub value: Option<f64>,
                #[serde(default)]
                pub tags: Vec<String>,
                #[serde(rename = "ts")]
                pub timestamp: DateTime<Utc>,
                #[serde(skip)]
                pub cache: Vec<u8>,
                pub r#type: String,
            }
            "#,
        )
        .unwrap();

        assert_eq!(info.kind, TypeKind::Object);
        assert_eq!(info.description.as_deref(), Some("A sensor reading."));
        let names: Vec<_> = info.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["deviceId", "value", "tags", "ts", "type"]);

        let required: Vec<_> = info
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(required, vec!["deviceId", "ts", "type"]);

        assert!(info.fields[1].nullable);
        assert_eq!(info.fields[1].display, "Option<f64>");
        assert_eq!(
            info.fields[0].description.as_deref(),
            Some("Device identifier.")
        );
        assert_eq!(
            info.fields[3].field_type.shape,
            TypeShape::Primitive {
                json_type: JsonType::String,
                format: Some("date-time".into())
            }
        );
    }

    #[test]
    fn test_newtype_is_alias() {
        let info = parse_struct("pub struct Labels(pub HashMap<String, String>);").unwrap();
        assert_eq!(info.kind, TypeKind::Alias);
        assert!(matches!(
            info.alias_of.as_ref().unwrap().shape,
            TypeShape::Map { .. }
        ));
    }

    #[test]
    fn test_struct_rejections() {
        let err = parse_struct("pub struct Page<T> { items: Vec<T> }").unwrap_err();
        assert!(err.to_string().contains("generic type declarations"));

        let err = parse_struct("pub struct Marker;").unwrap_err();
        assert!(err.to_string().contains("unit structs"));

        let err = parse_struct(
            "pub struct Bad { callback: fn(), #[serde(flatten)] extra: Other, any: Box<dyn Any> }",
        )
        .unwrap_err();
        match err {
            AppError::Multiple(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors[0].to_string().contains("field 'callback'"));
                assert!(errors[1].to_string().contains("flatten"));
                assert!(errors[2].to_string().contains("trait objects"));
            }
            other => panic!("expected joined errors, got {}", other),
        }
    }

    #[test]
    fn test_lifetimes_allowed() {
        let info = parse_struct("pub struct Borrowed<'a> { name: &'a str }").unwrap();
        assert_eq!(info.fields[0].name, "name");
    }

    #[test]
    fn test_string_enum() {
        let info = parse_enum(
            r#"
            #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
            pub enum Status {
                /// Everything worked.
                Ok,
                #[serde(rename = "missing")]
                NotFound,
                /// Deprecated: use Ok
                LegacyOk,
            }
            "#,
        )
        .unwrap();
        assert_eq!(info.kind, TypeKind::StringEnum);
        let values: Vec<_> = info.enum_values.iter().map(|v| v.value.to_string()).collect();
        assert_eq!(values, vec!["OK", "missing", "LEGACY_OK"]);
        assert_eq!(
            info.enum_values[0].description.as_deref(),
            Some("Everything worked.")
        );
        assert_eq!(info.enum_values[2].deprecated.as_deref(), Some("use Ok"));
    }

    #[test]
    fn test_number_enum_discriminants() {
        let info = parse_enum("pub enum Code { Low = -1, Mid, High = 10, Max }").unwrap();
        assert_eq!(info.kind, TypeKind::NumberEnum);
        let values: Vec<_> = info
            .enum_values
            .iter()
            .map(|v| match v.value {
                EnumLiteral::Integer(i) => i,
                _ => panic!("integer expected"),
            })
            .collect();
        assert_eq!(values, vec![-1, 0, 10, 11]);
    }

    #[test]
    fn test_discriminant_at_i64_max() {
        let info = parse_enum("pub enum Big { Max = 9223372036854775807 }").unwrap();
        assert!(matches!(info.enum_values[0].value, EnumLiteral::Integer(i64::MAX)));

        let err = parse_enum("pub enum Big { Max = 9223372036854775807, Next }").unwrap_err();
        assert!(err.to_string().contains("implicit discriminant of variant 'Next' overflows"));
    }

    #[test]
    fn test_data_enum_rejected() {
        let err = parse_enum("pub enum Shape { Circle(f64), Square }").unwrap_err();
        assert!(err.to_string().contains("variant 'Circle' carries data"));
    }
}
