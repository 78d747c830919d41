//! # Constant Blocks
//!
//! Inherent `impl` blocks of associated constants turn an alias into an enum:
//!
//! ```ignore
//! pub struct Color(pub String);
//!
//! impl Color {
//!     pub const RED: Color = Color("red");
//!     pub const BLUE: Self = Self("blue");
//! }
//! ```

use crate::catalog::{EnumLiteral, EnumValue, JsonType, TypeCatalog, TypeInfo, TypeKind, TypeShape};
use crate::error::{AppError, AppResult};
use crate::parser::docs::documentation;
use crate::parser::extractors::integer_literal;
use crate::type_mapping::type_display;
use syn::ext::IdentExt;
use tracing::debug;

/// One associated constant of a const block.
#[derive(Debug, Clone)]
pub struct ConstDecl {
    /// Constant identifier.
    pub name: String,
    /// Whether the constant is `pub`.
    pub is_public: bool,
    /// Declared type with `Self` resolved to the block's self type.
    pub type_name: String,
    /// Initializer expression.
    pub value: syn::Expr,
    /// Attributes (docs, deprecation).
    pub attrs: Vec<syn::Attribute>,
}

/// An inherent `impl` block that declares associated constants.
#[derive(Debug, Clone)]
pub struct ConstBlock {
    /// The implementing type.
    pub self_ty: String,
    /// Constants in declaration order.
    pub consts: Vec<ConstDecl>,
    /// The block itself, kept for source rendering.
    pub item: syn::ItemImpl,
}

/// Collects the constants of an inherent `impl`. Trait impls and blocks
/// without constants yield `None`.
pub fn extract_const_block(item: &syn::ItemImpl) -> Option<ConstBlock> {
    if item.trait_.is_some() {
        return None;
    }
    let self_ty = match item.self_ty.as_ref() {
        syn::Type::Path(path) => path.path.segments.last()?.ident.unraw().to_string(),
        _ => return None,
    };

    let consts: Vec<ConstDecl> = item
        .items
        .iter()
        .filter_map(|member| match member {
            syn::ImplItem::Const(c) => Some(ConstDecl {
                name: c.ident.unraw().to_string(),
                is_public: matches!(c.vis, syn::Visibility::Public(_)),
                type_name: resolve_type_name(&c.ty, &self_ty),
                value: c.expr.clone(),
                attrs: c.attrs.clone(),
            }),
            _ => None,
        })
        .collect();

    if consts.is_empty() {
        return None;
    }
    Some(ConstBlock {
        self_ty,
        consts,
        item: item.clone(),
    })
}

/// Turns the alias targeted by `block` into a string or number enum.
pub fn apply_const_block(catalog: &mut TypeCatalog, block: &ConstBlock) -> AppResult<()> {
    let public: Vec<&ConstDecl> = block.consts.iter().filter(|c| c.is_public).collect();
    if public.is_empty() {
        debug!(type_name = %block.self_ty, "Skipping const block without pub constants");
        return Ok(());
    }

    if let Some(owner) = catalog.get(&block.self_ty) {
        if !is_alias(owner) {
            debug!(type_name = %block.self_ty, "Skipping associated constants of a non-alias type");
            return Ok(());
        }
    }

    let enum_name = public[0].type_name.clone();
    let Some(target) = catalog.get(&enum_name) else {
        debug!(type_name = %enum_name, "Skipping const block of an uncataloged type");
        return Ok(());
    };
    let Some(alias) = target.alias_of.as_ref().filter(|_| is_alias(target)) else {
        debug!(type_name = %enum_name, "Skipping const block: target is not an alias");
        return Ok(());
    };

    if public.len() != block.consts.len() {
        return Err(AppError::type_error(
            &enum_name,
            "const block mixes pub and private constants",
        ));
    }
    if let Some(other) = public.iter().find(|c| c.type_name != enum_name) {
        return Err(AppError::type_error(
            &enum_name,
            format!(
                "const block mixes types: '{}' is declared as '{}'",
                other.name, other.type_name
            ),
        ));
    }

    let alias_type = match &alias.shape {
        TypeShape::Primitive {
            json_type: json_type @ (JsonType::String | JsonType::Integer),
            ..
        } if !alias.nullable => *json_type,
        _ => {
            return Err(AppError::type_error(
                &enum_name,
                "const block target must alias a string or integer type",
            ))
        }
    };

    let mut values = Vec::with_capacity(public.len());
    let mut errors = Vec::new();
    for decl in &public {
        let Some(literal) = const_literal(&decl.value) else {
            errors.push(AppError::type_error(
                &enum_name,
                format!("constant '{}' has no literal value", decl.name),
            ));
            continue;
        };
        let matches_alias = match alias_type {
            JsonType::String => literal.is_string(),
            _ => !literal.is_string(),
        };
        if !matches_alias {
            errors.push(AppError::type_error(
                &enum_name,
                format!(
                    "constant '{}' is not a {} value like the other constants",
                    decl.name, alias_type
                ),
            ));
            continue;
        }
        let docs = documentation(&decl.attrs).map_err(|msg| {
            AppError::type_error(&enum_name, format!("constant '{}': {}", decl.name, msg))
        })?;
        values.push(EnumValue {
            value: literal,
            name: decl.name.clone(),
            description: docs.description,
            deprecated: docs.deprecated,
        });
    }
    AppError::join(errors)?;

    if let Some(info) = catalog.get_mut(&enum_name) {
        info.kind = match alias_type {
            JsonType::String => TypeKind::StringEnum,
            _ => TypeKind::NumberEnum,
        };
        info.enum_values.extend(values);
    }
    catalog.record_source(&enum_name, syn::Item::Impl(block.item.clone()));
    debug!(type_name = %enum_name, count = public.len(), "Applied const block");
    Ok(())
}

/// Aliases and newtypes, including those already turned into enums by an
/// earlier block. Objects and Rust enums carry no alias target.
fn is_alias(info: &TypeInfo) -> bool {
    info.kind != TypeKind::Object && info.alias_of.is_some()
}

/// Reads the literal of a constant initializer: `"a"`, `-1`, `Self("a")`, `Code::new(1)`.
fn const_literal(expr: &syn::Expr) -> Option<EnumLiteral> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(s),
            ..
        }) => Some(EnumLiteral::String(s.value())),
        syn::Expr::Call(call) if call.args.len() == 1 => const_literal(&call.args[0]),
        syn::Expr::Paren(paren) => const_literal(&paren.expr),
        syn::Expr::Group(group) => const_literal(&group.expr),
        other => integer_literal(other).map(EnumLiteral::Integer),
    }
}

fn resolve_type_name(ty: &syn::Type, self_ty: &str) -> String {
    if let syn::Type::Path(path) = ty {
        if path.qself.is_none() {
            if let Some(last) = path.path.segments.last() {
                if last.arguments.is_empty() {
                    let ident = last.ident.unraw().to_string();
                    return if ident == "Self" {
                        self_ty.to_string()
                    } else {
                        ident
                    };
                }
            }
        }
    }
    type_display(ty)
}
