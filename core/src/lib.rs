#![deny(missing_docs)]

//! # apidoc Core
//!
//! Core library of the API documentation generator.
//!
//! Rust type declarations are parsed into a [`TypeCatalog`], HTTP routes and
//! MQTT operations are registered against it through an [`ApiRegistry`], and
//! the result is assembled into a JSON documentation file and an OpenAPI
//! 3.0.3 document.

/// Shared error types.
pub mod error;

/// Data model and the type catalog.
pub mod catalog;

/// Type mapping logic (Rust -> JSON).
pub mod type_mapping;

/// AST Parsing logic.
pub mod parser;

/// Reference graph computation.
pub mod graph;

/// Operation usage tracking.
pub mod usage;

/// Route and MQTT registration.
pub mod registry;

/// OpenAPI schema generation.
pub mod schema_generator;

/// Source, TypeScript, example and JSON Schema renderings.
pub mod representation;

/// Scratch database schema dump.
pub mod database;

/// Documentation and OpenAPI assembly.
pub mod document;

pub use catalog::{FieldInfo, FieldType, TypeCatalog, TypeInfo, TypeKind, UsageInfo, UsageRole};
pub use database::{dump_schema, DatabaseInfo};
pub use document::{
    build_openapi, write_outputs, ApiContact, ApiDocumentation, ApiInfo, ApiServer,
};
pub use error::{AppError, AppResult};
pub use parser::{parse_directory, parse_source, CatalogBuilder};
pub use registry::{
    ApiRegistry, BodySpec, HttpMethod, MessageSpec, ParamSpec, RouteSpec, TopicParamSpec, TypeRef,
};
pub use type_mapping::{ExternalType, RustToJsonMapper, TypeMapper};
pub use usage::Protocol;
