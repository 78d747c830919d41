//! # Data Models
//!
//! Normalized in-memory representation of the parsed type declarations.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// The category of a cataloged type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    /// A struct with named fields.
    Object,
    /// A closed set of string literals.
    StringEnum,
    /// A closed set of integer literals.
    NumberEnum,
    /// A newtype or `type` alias of another type expression.
    Alias,
}

/// Simplified JSON primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// A string type.
    String,
    /// An integer type.
    Integer,
    /// A floating point number.
    Number,
    /// A boolean type.
    Boolean,
}

impl JsonType {
    /// The JSON Schema keyword for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structural part of a [`FieldType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeShape {
    /// A JSON primitive with an optional format hint (e.g. `date-time`).
    Primitive {
        /// The JSON type.
        #[serde(rename = "type")]
        json_type: JsonType,
        /// Format hint.
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// A homogeneous list.
    Array {
        /// Element type.
        items: Box<FieldType>,
    },
    /// A string-keyed map.
    Map {
        /// Named key type, when keys are a string enum or string alias.
        #[serde(rename = "keyType", skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        /// Value type.
        values: Box<FieldType>,
    },
    /// A reference to another cataloged type.
    Reference {
        /// Referenced type name.
        name: String,
    },
    /// A reference to a cataloged enum type.
    Enum {
        /// Referenced enum name.
        name: String,
    },
}

/// Recursive type descriptor of a field, parameter or body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldType {
    /// What the value looks like.
    #[serde(flatten)]
    pub shape: TypeShape,
    /// Whether `null` is an accepted value.
    pub nullable: bool,
}

impl FieldType {
    /// A non-nullable primitive.
    pub fn primitive(json_type: JsonType, format: Option<&str>) -> Self {
        Self {
            shape: TypeShape::Primitive {
                json_type,
                format: format.map(str::to_string),
            },
            nullable: false,
        }
    }

    /// A non-nullable array of `items`.
    pub fn array(items: FieldType) -> Self {
        Self {
            shape: TypeShape::Array {
                items: Box::new(items),
            },
            nullable: false,
        }
    }

    /// A non-nullable string-keyed map of `values`.
    pub fn map(values: FieldType) -> Self {
        Self {
            shape: TypeShape::Map {
                key: None,
                values: Box::new(values),
            },
            nullable: false,
        }
    }

    /// A non-nullable map keyed by the named type.
    pub fn keyed_map(key: impl Into<String>, values: FieldType) -> Self {
        Self {
            shape: TypeShape::Map {
                key: Some(key.into()),
                values: Box::new(values),
            },
            nullable: false,
        }
    }

    /// A non-nullable reference to a named type.
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            shape: TypeShape::Reference { name: name.into() },
            nullable: false,
        }
    }

    /// Marks the descriptor as nullable.
    pub fn into_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The referenced type name when this descriptor is itself a named reference.
    pub fn type_name(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Reference { name } | TypeShape::Enum { name } => Some(name),
            _ => None,
        }
    }

    /// All named types reachable inside this descriptor (items, map values included).
    pub fn named_types(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, out: &mut BTreeSet<String>) {
        match &self.shape {
            TypeShape::Primitive { .. } => {}
            TypeShape::Array { items } => items.collect_names(out),
            TypeShape::Map { key, values } => {
                out.extend(key.iter().cloned());
                values.collect_names(out);
            }
            TypeShape::Reference { name } | TypeShape::Enum { name } => {
                out.insert(name.clone());
            }
        }
    }
}

/// A single property of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    /// The wire (JSON) name.
    pub name: String,
    /// The Rust field name.
    pub rust_name: String,
    /// The type descriptor.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// The declared Rust type, as written.
    pub display: String,
    /// Field documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deprecation message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    /// Whether the field must be present.
    pub required: bool,
    /// Whether the field accepts `null`.
    pub nullable: bool,
}

/// A literal enum value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnumLiteral {
    /// String literal.
    String(String),
    /// Integer literal.
    Integer(i64),
}

impl EnumLiteral {
    /// The literal as a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            EnumLiteral::String(s) => Value::String(s.clone()),
            EnumLiteral::Integer(i) => Value::from(*i),
        }
    }

    /// Whether this is a string literal.
    pub fn is_string(&self) -> bool {
        matches!(self, EnumLiteral::String(_))
    }
}

impl fmt::Display for EnumLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumLiteral::String(s) => f.write_str(s),
            EnumLiteral::Integer(i) => write!(f, "{}", i),
        }
    }
}

/// One member of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    /// The wire value.
    pub value: EnumLiteral,
    /// The Rust identifier (variant or constant name).
    pub name: String,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deprecation message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
}

/// The part a type plays in an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageRole {
    /// HTTP request body.
    Request,
    /// HTTP response body.
    Response,
    /// HTTP parameter or MQTT topic parameter.
    Parameter,
    /// MQTT message published by the service.
    Publication,
    /// MQTT message consumed by the service.
    Subscription,
}

/// Back-reference from a type to an operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInfo {
    /// The operation id.
    pub operation_id: String,
    /// The role.
    pub role: UsageRole,
}

/// Rendered views of a type, computed once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Representations {
    /// The pretty-printed Rust declaration (plus any const block).
    pub source: String,
    /// The TypeScript declaration.
    pub typescript: String,
    /// An example JSON value.
    pub example: Value,
    /// The pretty-printed JSON Schema.
    pub json_schema: String,
}

/// A cataloged type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    /// Type name.
    pub name: String,
    /// Kind.
    pub kind: TypeKind,
    /// Documentation (without the deprecation marker).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deprecation message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    /// Fields, in declaration order (objects only).
    pub fields: Vec<FieldInfo>,
    /// Values, in declaration order (enums only).
    pub enum_values: Vec<EnumValue>,
    /// The aliased type (aliases and const-block enums).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<FieldType>,
    /// Sorted names of the types this one references.
    pub references: Vec<String>,
    /// Sorted names of the types referencing this one.
    pub referenced_by: Vec<String>,
    /// Operations using this type.
    pub usages: Vec<UsageInfo>,
    /// Reachable from an HTTP operation.
    pub used_by_http: bool,
    /// Reachable from an MQTT operation.
    pub used_by_mqtt: bool,
    /// Cached representations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representations: Option<Representations>,
}

impl TypeInfo {
    /// Creates an empty type of the given kind.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            deprecated: None,
            fields: Vec::new(),
            enum_values: Vec::new(),
            alias_of: None,
            references: Vec::new(),
            referenced_by: Vec::new(),
            usages: Vec::new(),
            used_by_http: false,
            used_by_mqtt: false,
            representations: None,
        }
    }

    /// Whether the type is one of the enum kinds.
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::StringEnum | TypeKind::NumberEnum)
    }

    /// Whether values serialize as plain strings, so the type can key a JSON map.
    pub fn is_string_keyable(&self) -> bool {
        match self.kind {
            TypeKind::StringEnum => true,
            TypeKind::Alias => matches!(
                &self.alias_of,
                Some(FieldType {
                    shape: TypeShape::Primitive {
                        json_type: JsonType::String,
                        ..
                    },
                    nullable: false,
                })
            ),
            _ => false,
        }
    }

    /// Iterates every type descriptor owned by this type (fields and alias target).
    pub fn field_types(&self) -> impl Iterator<Item = &FieldType> {
        self.fields
            .iter()
            .map(|f| &f.field_type)
            .chain(self.alias_of.iter())
    }

    /// Mutable counterpart of [`TypeInfo::field_types`].
    pub fn field_types_mut(&mut self) -> impl Iterator<Item = &mut FieldType> {
        self.fields
            .iter_mut()
            .map(|f| &mut f.field_type)
            .chain(self.alias_of.iter_mut())
    }
}
