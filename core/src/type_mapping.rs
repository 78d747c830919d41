#![deny(missing_docs)]

//! # Type Mapping
//!
//! Converts Rust type expressions into [`FieldType`] descriptors.
//! Handles primitives, collections (Vec, maps), nullability (Option),
//! transparent wrappers (Box, Rc, Arc, references) and an allow-list of
//! external types with a fixed wire representation.

use crate::catalog::{FieldType, JsonType, TypeShape};
use crate::error::{AppError, AppResult};
use quote::ToTokens;
use std::collections::BTreeMap;
use std::fmt;

/// Wire representation of an allow-listed external type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalType {
    /// The JSON type.
    pub json_type: JsonType,
    /// Format hint.
    pub format: Option<String>,
}

impl ExternalType {
    /// Creates a new external type mapping.
    pub fn new(json_type: JsonType, format: Option<&str>) -> Self {
        Self {
            json_type,
            format: format.map(str::to_string),
        }
    }

    /// Parses the `type[:format]` notation used on the command line.
    pub fn parse(spec: &str) -> AppResult<Self> {
        let (ty, format) = match spec.split_once(':') {
            Some((ty, format)) => (ty, Some(format)),
            None => (spec, None),
        };
        let json_type = match ty.trim() {
            "string" => JsonType::String,
            "integer" => JsonType::Integer,
            "number" => JsonType::Number,
            "boolean" => JsonType::Boolean,
            other => {
                return Err(AppError::General(format!(
                    "Unknown JSON type '{}' in external type mapping",
                    other
                )))
            }
        };
        Ok(Self::new(json_type, format.map(str::trim)))
    }
}

/// Trait for converting Rust types to [`FieldType`] descriptors.
pub trait TypeMapper: fmt::Debug {
    /// Maps a parsed Rust type.
    fn map_type(&self, ty: &syn::Type) -> AppResult<FieldType>;

    /// Maps a Rust type string (e.g. `Option<Vec<Status>>`).
    fn map(&self, rust_type: &str) -> AppResult<FieldType> {
        let ty: syn::Type = syn::parse_str(rust_type).map_err(|e| {
            AppError::General(format!("Failed to parse type string '{}': {}", rust_type, e))
        })?;
        self.map_type(&ty)
    }
}

/// The standard implementation of `TypeMapper`.
#[derive(Debug, Clone)]
pub struct RustToJsonMapper {
    externals: BTreeMap<String, ExternalType>,
}

impl Default for RustToJsonMapper {
    fn default() -> Self {
        let mut externals = BTreeMap::new();
        let defaults = [
            ("Uuid", JsonType::String, Some("uuid")),
            ("DateTime", JsonType::String, Some("date-time")),
            ("NaiveDateTime", JsonType::String, Some("date-time")),
            ("SystemTime", JsonType::String, Some("date-time")),
            ("NaiveDate", JsonType::String, Some("date")),
            ("NaiveTime", JsonType::String, Some("time")),
            ("Decimal", JsonType::String, Some("decimal")),
            ("Url", JsonType::String, Some("uri")),
        ];
        for (name, json_type, format) in defaults {
            externals.insert(name.to_string(), ExternalType::new(json_type, format));
        }
        Self { externals }
    }
}

impl RustToJsonMapper {
    /// Creates a mapper with the default external allow-list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or overrides) an external type by its last path segment.
    pub fn with_external(mut self, name: impl Into<String>, external: ExternalType) -> Self {
        self.externals.insert(name.into(), external);
        self
    }

    /// Whether `name` is allow-listed.
    pub fn is_external(&self, name: &str) -> bool {
        self.externals.contains_key(name)
    }

    fn map_path(&self, type_path: &syn::TypePath) -> AppResult<FieldType> {
        if type_path.qself.is_some() {
            return Err(unsupported("qualified associated types are not supported"));
        }
        let segment = type_path
            .path
            .segments
            .last()
            .ok_or_else(|| unsupported("empty type path"))?;
        let name = segment.ident.to_string();

        match name.as_str() {
            // Primitives
            "String" | "str" | "char" => Ok(FieldType::primitive(JsonType::String, None)),
            "bool" => Ok(FieldType::primitive(JsonType::Boolean, None)),
            "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => {
                Ok(FieldType::primitive(JsonType::Integer, Some("int32")))
            }
            "i64" | "u64" | "isize" | "usize" => {
                Ok(FieldType::primitive(JsonType::Integer, Some("int64")))
            }
            "i128" | "u128" => Ok(FieldType::primitive(JsonType::Integer, None)),
            "f32" => Ok(FieldType::primitive(JsonType::Number, Some("float"))),
            "f64" => Ok(FieldType::primitive(JsonType::Number, Some("double"))),

            // Containers
            "Option" => Ok(self.map_type(single_type_arg(segment)?)?.into_nullable()),
            "Box" | "Rc" | "Arc" | "Cow" => self.map_type(single_type_arg(segment)?),
            "Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "IndexSet" => {
                Ok(FieldType::array(self.map_type(single_type_arg(segment)?)?))
            }
            "HashMap" | "BTreeMap" | "IndexMap" => {
                let args = type_args(segment);
                if args.len() != 2 {
                    return Err(unsupported(format!(
                        "{} needs exactly two type arguments",
                        name
                    )));
                }
                let key = self.map_type(args[0])?;
                let values = self.map_type(args[1])?;
                match &key.shape {
                    _ if key.nullable => Err(unsupported(format!(
                        "map keys must be strings, found '{}'",
                        type_display(args[0])
                    ))),
                    TypeShape::Primitive {
                        json_type: JsonType::String,
                        ..
                    } => Ok(FieldType::map(values)),
                    TypeShape::Reference { name } => Ok(FieldType::keyed_map(name, values)),
                    _ => Err(unsupported(format!(
                        "map keys must be strings, found '{}'",
                        type_display(args[0])
                    ))),
                }
            }

            "Value" if is_serde_json_value(type_path) => Err(unsupported(
                "untyped JSON values (serde_json::Value) are not supported",
            )),
            "PhantomData" => Err(unsupported("PhantomData has no wire representation")),

            other => {
                if let Some(external) = self.externals.get(other) {
                    return Ok(FieldType::primitive(
                        external.json_type,
                        external.format.as_deref(),
                    ));
                }
                if !segment.arguments.is_empty() {
                    return Err(unsupported(format!(
                        "generic type '{}' is not supported",
                        type_display(&syn::Type::Path(type_path.clone()))
                    )));
                }
                Ok(FieldType::reference(other))
            }
        }
    }
}

impl TypeMapper for RustToJsonMapper {
    fn map_type(&self, ty: &syn::Type) -> AppResult<FieldType> {
        match ty {
            syn::Type::Path(type_path) => self.map_path(type_path),
            syn::Type::Reference(reference) => self.map_type(&reference.elem),
            syn::Type::Paren(paren) => self.map_type(&paren.elem),
            syn::Type::Group(group) => self.map_type(&group.elem),
            syn::Type::Slice(slice) => Ok(FieldType::array(self.map_type(&slice.elem)?)),
            syn::Type::Array(array) => Ok(FieldType::array(self.map_type(&array.elem)?)),
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => {
                Err(unsupported("the unit type has no wire representation"))
            }
            syn::Type::Tuple(_) => Err(unsupported("tuple types are not supported")),
            syn::Type::BareFn(_) => Err(unsupported("function types are not supported")),
            syn::Type::TraitObject(_) => Err(unsupported(
                "trait objects (dyn Trait, dyn Any) are not supported",
            )),
            syn::Type::ImplTrait(_) => Err(unsupported("impl Trait types are not supported")),
            syn::Type::Ptr(_) => Err(unsupported("raw pointers are not supported")),
            other => Err(unsupported(format!(
                "unsupported type structure '{}'",
                type_display(other)
            ))),
        }
    }
}

/// Renders a type as compact Rust text (`Option<Vec<Status>>`).
pub fn type_display(ty: &syn::Type) -> String {
    let raw = ty.to_token_stream().to_string();
    raw.replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" < ", "<")
        .replace("< ", "<")
        .replace(" <", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
        .replace("[ ", "[")
        .replace(" ]", "]")
        .replace(" ;", ";")
}

/// Extracts the message of a mapping error (mapping errors are `General`).
pub fn mapping_message(err: AppError) -> String {
    match err {
        AppError::General(msg) => msg,
        other => other.to_string(),
    }
}

fn unsupported(message: impl Into<String>) -> AppError {
    AppError::General(message.into())
}

fn type_args(segment: &syn::PathSegment) -> Vec<&syn::Type> {
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Helper to handle types like `Option<T>` or `Vec<T>`.
fn single_type_arg(segment: &syn::PathSegment) -> AppResult<&syn::Type> {
    let args = type_args(segment);
    match args.as_slice() {
        [ty] => Ok(ty),
        _ => Err(unsupported(format!(
            "{} needs exactly one type argument",
            segment.ident
        ))),
    }
}

fn is_serde_json_value(type_path: &syn::TypePath) -> bool {
    let segments = &type_path.path.segments;
    segments.len() >= 2 && segments[segments.len() - 2].ident == "serde_json"
}
